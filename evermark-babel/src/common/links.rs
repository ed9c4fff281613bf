//! Link classification and resolution against the note index.
//!
//! Every `<a href>` of a note goes through a small state machine:
//!
//! ```text
//!   unresolved ──classify──► external        (URL outside the export)
//!        │                   resource        (attachment next to the note)
//!        └──────resolve────► resolved(id)    (matched a note of the index)
//!                            unresolved      (internal shape, no match: kept verbatim)
//! ```
//!
//! Resolution needs the full [`NoteIndex`], so it can only happen once every note in scope
//! has been scanned. The index is built once and then shared read-only by all conversions.
//!
//! Internal references come in three shapes:
//! - relative `Other Note.html` links written by the HTML exporter (`InternalRef::File`)
//! - `evernote:///view/<user>/<shard>/<guid>/<guid>/` and
//!   `https://www.evernote.com/shard/<shard>/nl/<user>/<guid>` note links (`InternalRef::Guid`)
//! - any other URL painted in the Evernote internal-link green (`InternalRef::Opaque`)
//!
//! Guid and opaque references are matched against registered aliases first, then by
//! correlating the link label with note titles, which is how Evernote writes note links.

use crate::ir::nodes::NoteId;
use std::collections::{BTreeMap, HashMap};
use url::{ParseError, Url};

/// Color Evernote uses to paint links between notes.
pub const INTERNAL_LINK_COLOR: &str = "#69aa35";

/// Where a link points, as written in the source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Reference {
    External(String),
    /// A local attachment path, `/`-separated and percent-decoded
    Resource(String),
    Internal(InternalRef),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InternalRef {
    /// Relative path to a sibling HTML file, percent-decoded
    File(String),
    /// Evernote note guid
    Guid(String),
    /// An internal-looking URL of unknown shape
    Opaque(String),
}

impl Reference {
    pub fn is_internal(&self) -> bool {
        matches!(self, Reference::Internal(_))
    }
}

/// Outcome of resolving a [`Reference`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Resolution {
    Resolved(NoteId),
    External,
    Resource,
    Unresolved,
}

/// A classified and resolved link, as carried by the `Link` style attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkTarget {
    /// The `href` exactly as found in the source
    pub href: String,
    pub reference: Reference,
    pub resolution: Resolution,
}

/// A link found in a note, reported to the caller for layout and graph building.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    pub label: String,
    pub target: LinkTarget,
}

/// Result of looking at an `href` before any index lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classified {
    /// No target at all: an in-page anchor or a bare `<a>`
    Anchor,
    /// A link construct whose URL carries nothing, such as `https:`
    Empty,
    Link(Reference),
}

/// Classify an `href`. `color` is the canonical color of the link element, if any.
pub fn classify(href: &str, color: Option<&str>) -> Classified {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return Classified::Anchor;
    }

    match Url::parse(href) {
        Ok(url) => {
            if let Some(guid) = evernote_guid(&url) {
                return Classified::Link(Reference::Internal(InternalRef::Guid(guid)));
            }
            if url.cannot_be_a_base() && url.path().is_empty() {
                return Classified::Empty;
            }
            if color == Some(INTERNAL_LINK_COLOR) {
                Classified::Link(Reference::Internal(InternalRef::Opaque(href.to_string())))
            } else {
                Classified::Link(Reference::External(href.to_string()))
            }
        }
        Err(ParseError::RelativeUrlWithoutBase) => {
            let path = decode_path(href);
            let without_fragment = path.split('#').next().unwrap_or(&path);
            let lower = without_fragment.to_ascii_lowercase();
            if lower.ends_with(".html") || lower.ends_with(".htm") {
                Classified::Link(Reference::Internal(InternalRef::File(
                    without_fragment.to_string(),
                )))
            } else {
                Classified::Link(Reference::Resource(path))
            }
        }
        Err(ParseError::EmptyHost) => Classified::Empty,
        Err(_) => Classified::Link(Reference::External(href.to_string())),
    }
}

fn evernote_guid(url: &Url) -> Option<String> {
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    match url.scheme() {
        // evernote:///view/<user>/<shard>/<note guid>/<note guid>/
        "evernote" => match segments.as_slice() {
            ["view", _, _, guid, ..] => Some(guid.to_string()),
            _ => None,
        },
        "http" | "https" => {
            let host = url.host_str()?;
            if host != "evernote.com" && !host.ends_with(".evernote.com") {
                return None;
            }
            // /shard/<shard>/nl/<user>/<note guid>/
            let nl = segments.iter().position(|seg| *seg == "nl")?;
            segments.get(nl + 2).map(|guid| guid.to_string())
        }
        _ => None,
    }
}

/// Percent-decode a relative path and normalize Windows separators.
pub fn decode_path(href: &str) -> String {
    let decoded = urlencoding::decode(href)
        .map(|cow| cow.into_owned())
        .unwrap_or_else(|_| href.to_string());
    decoded.replace('\\', "/")
}

/// Percent-encode a `/`-separated path segment by segment.
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[derive(Debug, Clone)]
struct IndexEntry {
    file_name: String,
    title: Option<String>,
}

/// Read-only snapshot of every note in scope, built before any rendering.
#[derive(Debug, Clone, Default)]
pub struct NoteIndex {
    entries: BTreeMap<NoteId, IndexEntry>,
    by_file: HashMap<String, NoteId>,
    by_alias: HashMap<String, NoteId>,
    by_title: HashMap<String, Vec<NoteId>>,
    by_title_folded: HashMap<String, Vec<NoteId>>,
}

impl NoteIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a note under its file name and, if known, its title.
    pub fn insert(&mut self, id: NoteId, file_name: &str, title: Option<&str>) {
        let file_name = file_name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(file_name)
            .to_string();
        self.by_file.insert(file_name.clone(), id.clone());

        if let Some(title) = title.map(str::trim).filter(|t| !t.is_empty()) {
            self.by_title
                .entry(title.to_string())
                .or_default()
                .push(id.clone());
            self.by_title_folded
                .entry(title.to_lowercase())
                .or_default()
                .push(id.clone());
        }

        self.entries.insert(
            id,
            IndexEntry {
                file_name,
                title: title.map(str::to_string),
            },
        );
    }

    /// Register an opaque source identifier (a guid or a full URL) for a note.
    pub fn add_alias(&mut self, alias: impl Into<String>, id: NoteId) {
        self.by_alias.insert(alias.into(), id);
    }

    pub fn contains(&self, id: &NoteId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Note identifiers in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &NoteId> {
        self.entries.keys()
    }

    pub fn file_name(&self, id: &NoteId) -> Option<&str> {
        self.entries.get(id).map(|e| e.file_name.as_str())
    }

    pub fn title(&self, id: &NoteId) -> Option<&str> {
        self.entries.get(id).and_then(|e| e.title.as_deref())
    }

    /// Resolve a reference. `label` is the visible text of the link, used to correlate
    /// note links with titles.
    pub fn resolve(&self, reference: &Reference, label: &str) -> Resolution {
        let found = match reference {
            Reference::External(_) => return Resolution::External,
            Reference::Resource(_) => return Resolution::Resource,
            Reference::Internal(InternalRef::File(path)) => self.lookup_file(path),
            Reference::Internal(InternalRef::Guid(key))
            | Reference::Internal(InternalRef::Opaque(key)) => self
                .by_alias
                .get(key)
                .cloned()
                .or_else(|| self.lookup_title(label)),
        };

        match found {
            Some(id) => Resolution::Resolved(id),
            None => Resolution::Unresolved,
        }
    }

    fn lookup_file(&self, path: &str) -> Option<NoteId> {
        let file_name = path.rsplit('/').next().unwrap_or(path);
        if let Some(id) = self.by_file.get(file_name) {
            return Some(id.clone());
        }
        let stem = NoteId::from_file_name(file_name);
        self.entries.contains_key(&stem).then_some(stem)
    }

    fn lookup_title(&self, label: &str) -> Option<NoteId> {
        let label = label.trim();
        if label.is_empty() {
            return None;
        }
        let unique = |ids: Option<&Vec<NoteId>>| match ids.map(Vec::as_slice) {
            Some([id]) => Some(id.clone()),
            Some(many) if many.len() > 1 => {
                log::debug!("ambiguous title '{label}' matches {} notes", many.len());
                None
            }
            _ => None,
        };
        unique(self.by_title.get(label))
            .or_else(|| unique(self.by_title_folded.get(&label.to_lowercase())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> NoteIndex {
        let mut index = NoteIndex::new();
        index.insert(NoteId::from("Recipes"), "Recipes.html", Some("Recipes"));
        index.insert(NoteId::from("My Trip"), "My Trip.html", Some("Trip to Lisbon"));
        index
    }

    #[test]
    fn classifies_shapes() {
        assert_eq!(classify("#top", None), Classified::Anchor);
        assert_eq!(classify("", None), Classified::Anchor);
        assert_eq!(classify("https:", None), Classified::Empty);
        assert_eq!(
            classify("My%20Trip.html", None),
            Classified::Link(Reference::Internal(InternalRef::File(
                "My Trip.html".to_string()
            )))
        );
        assert_eq!(
            classify("Recipes_files\\scan.pdf", None),
            Classified::Link(Reference::Resource("Recipes_files/scan.pdf".to_string()))
        );
        assert_eq!(
            classify("https://example.com/a", None),
            Classified::Link(Reference::External("https://example.com/a".to_string()))
        );
        assert_eq!(
            classify("https://example.com/a", Some(INTERNAL_LINK_COLOR)),
            Classified::Link(Reference::Internal(InternalRef::Opaque(
                "https://example.com/a".to_string()
            )))
        );
    }

    #[test]
    fn extracts_evernote_guids() {
        let view = "evernote:///view/123/s1/6c1b9a8e-aaaa/6c1b9a8e-aaaa/";
        assert_eq!(
            classify(view, None),
            Classified::Link(Reference::Internal(InternalRef::Guid(
                "6c1b9a8e-aaaa".to_string()
            )))
        );
        let shard = "https://www.evernote.com/shard/s1/nl/123/6c1b9a8e-bbbb/";
        assert_eq!(
            classify(shard, None),
            Classified::Link(Reference::Internal(InternalRef::Guid(
                "6c1b9a8e-bbbb".to_string()
            )))
        );
    }

    #[test]
    fn resolves_files_aliases_and_titles() {
        let mut index = index();
        index.add_alias("guid-1", NoteId::from("Recipes"));

        let file = Reference::Internal(InternalRef::File("My Trip.html".to_string()));
        assert_eq!(
            index.resolve(&file, "whatever"),
            Resolution::Resolved(NoteId::from("My Trip"))
        );

        let alias = Reference::Internal(InternalRef::Guid("guid-1".to_string()));
        assert_eq!(
            index.resolve(&alias, ""),
            Resolution::Resolved(NoteId::from("Recipes"))
        );

        let titled = Reference::Internal(InternalRef::Guid("unknown".to_string()));
        assert_eq!(
            index.resolve(&titled, "trip to lisbon"),
            Resolution::Resolved(NoteId::from("My Trip"))
        );
        assert_eq!(index.resolve(&titled, "Nothing"), Resolution::Unresolved);
    }

    #[test]
    fn missing_file_stays_unresolved() {
        let missing = Reference::Internal(InternalRef::File("Gone.html".to_string()));
        assert_eq!(index().resolve(&missing, "Gone"), Resolution::Unresolved);
    }

    #[test]
    fn ambiguous_titles_do_not_resolve() {
        let mut index = index();
        index.insert(NoteId::from("Recipes 2"), "Recipes 2.html", Some("Recipes"));
        let reference = Reference::Internal(InternalRef::Opaque("x".to_string()));
        assert_eq!(index.resolve(&reference, "Recipes"), Resolution::Unresolved);
    }

    #[test]
    fn encodes_path_segments() {
        assert_eq!(encode_path("My Note.md"), "My%20Note.md");
        assert_eq!(encode_path("a b/c.pdf"), "a%20b/c.pdf");
    }
}
