//! Note metadata and its YAML frontmatter form.
//!
//! Evernote's HTML export puts the note title in the first `<h1>` and everything else in a
//! small two-column table under it:
//!
//! ```text
//! | Created: | 03/04/2021 9:15 AM           |
//! | Updated: | 03/05/2021 6:02 PM           |
//! | Tags:    | travel, nb:Personal/Trips     |
//! ```
//!
//! The lowering finds those nodes; this module turns the raw key/value pairs into
//! [`Metadata`] and renders it as a frontmatter block that Joplin and Obsidian both read.
//! A tag starting with `nb:` is not a tag but the notebook path of the note.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Keys of the metadata table, lowercased and without the trailing colon.
pub const METADATA_KEYS: &[&str] = &["created", "updated", "author", "source", "location", "tags"];

const EVERNOTE_DATE: &str = "%m/%d/%Y %I:%M %p";
const FRONTMATTER_DATE: &str = "%Y-%m-%d %H:%M:%SZ";
const NOTEBOOK_TAG: &str = "nb:";

/// Metadata of a note. Field order is the frontmatter key order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Metadata {
    pub fn is_empty(&self) -> bool {
        self == &Metadata::default()
    }

    /// Build metadata from the title and the raw table pairs. Returns the notebook path
    /// found in the tags, if any.
    pub fn from_table(title: Option<String>, pairs: &[(String, String)]) -> (Self, Option<String>) {
        let mut metadata = Metadata {
            title: title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()),
            ..Metadata::default()
        };
        let mut notebook = None;

        for (key, value) in pairs {
            let Some(key) = metadata_key(key) else {
                log::debug!("ignoring metadata row '{key}'");
                continue;
            };
            let value = value.trim().to_string();
            if value.is_empty() {
                continue;
            }
            match key.as_str() {
                "created" => metadata.created = Some(reformat_date(&value)),
                "updated" => metadata.updated = Some(reformat_date(&value)),
                "author" => metadata.author = Some(value),
                "source" => metadata.source = Some(value),
                "location" => metadata.location = Some(value),
                "tags" => {
                    for tag in value.split(", ").map(str::trim).filter(|t| !t.is_empty()) {
                        match tag.strip_prefix(NOTEBOOK_TAG) {
                            Some(path) if notebook.is_none() => notebook = normalize_notebook(path),
                            _ => metadata.tags.push(tag.to_string()),
                        }
                    }
                }
                _ => {}
            }
        }

        (metadata, notebook)
    }
}

/// The canonical key of a metadata table row, if it is one (`"Created:"` gives `created`).
pub fn metadata_key(raw: &str) -> Option<String> {
    let key = raw.trim();
    let key = key.strip_suffix(':')?.trim().to_ascii_lowercase();
    METADATA_KEYS.contains(&key.as_str()).then_some(key)
}

/// Evernote timestamps become `YYYY-MM-DD HH:MM:SSZ`; anything else is kept as written.
pub fn reformat_date(value: &str) -> String {
    match NaiveDateTime::parse_from_str(value.trim(), EVERNOTE_DATE) {
        Ok(date) => date.format(FRONTMATTER_DATE).to_string(),
        Err(_) => value.to_string(),
    }
}

/// Normalize a notebook path: `/`-separated, no empty, `.` or `..` segments.
fn normalize_notebook(path: &str) -> Option<String> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split(['/', '\\']).map(str::trim) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }
    (!segments.is_empty()).then(|| segments.join("/"))
}

/// Render metadata as a frontmatter block. Empty metadata renders nothing.
pub fn render(metadata: &Metadata) -> Result<String, serde_yaml::Error> {
    if metadata.is_empty() {
        return Ok(String::new());
    }
    let yaml = serde_yaml::to_string(metadata)?;
    Ok(format!("---\n{yaml}---\n\n"))
}

/// Read the frontmatter block back from rendered Markdown.
pub fn read(markdown: &str) -> Result<Option<Metadata>, serde_yaml::Error> {
    let Some(rest) = markdown.strip_prefix("---\n") else {
        return Ok(None);
    };
    let Some(end) = rest.find("\n---\n") else {
        return Ok(None);
    };
    serde_yaml::from_str(&rest[..=end]).map(Some)
}
