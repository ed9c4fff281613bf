//! Locates the title and the metadata table of an exported note.
//!
//! The nodes are only recorded, never detached: the lowering skips them.

use super::dom;
use crate::frontmatter::{metadata_key, Metadata};
use markup5ever_rcdom::Handle;

/// Metadata found in a note body, with the nodes that carried it.
#[derive(Debug, Default)]
pub struct Extracted {
    pub metadata: Metadata,
    pub notebook: Option<String>,
    pub skip: Vec<Handle>,
}

pub fn extract(body: &Handle) -> Extracted {
    let mut skip = Vec::new();

    let title = dom::find_first(body, "h1").map(|h1| {
        let title = collapse(&dom::text_content(&h1));
        skip.push(h1);
        title
    });

    let mut pairs = Vec::new();
    if let Some((table, rows)) = dom::find_all(body, "table")
        .into_iter()
        .find_map(|table| metadata_rows(&table).map(|rows| (table, rows)))
    {
        pairs = rows;
        skip.push(table);
    }

    let (metadata, notebook) = Metadata::from_table(title, &pairs);
    Extracted {
        metadata,
        notebook,
        skip,
    }
}

/// Key/value rows of a metadata table: every row has two cells, every key ends in a colon,
/// and at least one key is a known metadata key.
fn metadata_rows(table: &Handle) -> Option<Vec<(String, String)>> {
    let rows = dom::find_all(table, "tr");
    if rows.is_empty() {
        return None;
    }

    let mut pairs = Vec::with_capacity(rows.len());
    for row in &rows {
        let cells: Vec<Handle> = dom::children(row)
            .into_iter()
            .filter(|c| dom::is_tag(c, &["td", "th"]))
            .collect();
        let [key, value] = cells.as_slice() else {
            return None;
        };
        let key = collapse(&dom::text_content(key));
        if !key.ends_with(':') {
            return None;
        }
        pairs.push((key, collapse(&dom::text_content(value))));
    }

    pairs
        .iter()
        .any(|(key, _)| metadata_key(key).is_some())
        .then_some(pairs)
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
