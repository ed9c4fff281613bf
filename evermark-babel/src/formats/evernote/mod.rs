//! Evernote HTML export input
//!
//! Parses one exported note (`<Note title>.html`, with attachments in `<Note title>_files/`)
//! into a [`Note`]: the DOM, the metadata taken from the title and metadata table, and the
//! notebook path. Lowering to the IR happens per conversion, because it needs the
//! [`NoteIndex`](crate::common::links::NoteIndex) of every note in scope.
//!
//! # Library Choice
//!
//! `html5ever` with the `markup5ever_rcdom` tree: a browser-grade parser that recovers from
//! the markup Evernote clients produced over the years (unclosed tags, `<ul>` directly inside
//! `<ul>`, tables without `<tbody>`).
//!
//! # Element Mapping Table
//!
//! | HTML                                   | IR                                   |
//! |----------------------------------------|--------------------------------------|
//! | `div`, `p`, `br`                       | paragraph lines (see [`parser`])     |
//! | `div style="-en-codeblock:true"`       | `CodeBlock { evernote: true }`       |
//! | `pre`                                  | `CodeBlock { evernote: false }`      |
//! | `h1`–`h6`                              | `Heading`                            |
//! | `ul`, `ol`, `li`                       | `List` via the list structurer       |
//! | `table`, `tr`, `td`, `th`              | `Table` with spans                   |
//! | `dl`, `dt`, `dd`                       | `DefinitionList`                     |
//! | `blockquote`                           | `Quote`                              |
//! | `hr`                                   | `Rule`                               |
//! | `a`                                    | `Styled` with a `Link` attribute     |
//! | `img`                                  | `Image`                              |
//! | `b`, `i`, `span style`, `font`, …      | `Styled` via the style normalizer    |
//!
//! The first `h1` is the title and the metadata table is read into frontmatter; both are
//! skipped by the lowering.

pub mod dom;
pub mod metadata;
pub mod parser;

use crate::common::links::{classify, Classified, InternalRef, Reference};
use crate::error::ConvertError;
use crate::frontmatter::Metadata;
use crate::ir::nodes::NoteId;
use markup5ever_rcdom::{Handle, RcDom};
use std::fmt;
use std::rc::Rc;

/// A parsed note, ready to be indexed and converted.
#[derive(Clone)]
pub struct Note {
    pub id: NoteId,
    pub file_name: String,
    pub metadata: Metadata,
    /// Notebook path from an `nb:` tag, `/`-separated
    pub notebook: Option<String>,
    /// Source identifiers other notes may link to this note by: Evernote note URLs found
    /// in the document head, and the note guids they carry
    pub aliases: Vec<String>,
    /// Owns the tree: dropping an `RcDom` detaches every node below the document.
    _dom: Rc<RcDom>,
    body: Handle,
    skip: Vec<Handle>,
}

impl Note {
    /// Parse an exported note. `file_name` is the HTML file name, relative to the export
    /// directory.
    pub fn parse(file_name: &str, html: &str) -> Result<Self, ConvertError> {
        let dom = dom::parse_html(html)?;
        let body = dom::find_first(&dom.document, "body")
            .ok_or_else(|| ConvertError::MissingBody(file_name.to_string()))?;
        let extracted = metadata::extract(&body);

        Ok(Self {
            id: NoteId::from_file_name(file_name),
            file_name: file_name.to_string(),
            metadata: extracted.metadata,
            notebook: extracted.notebook,
            aliases: source_aliases(&dom.document),
            _dom: Rc::new(dom),
            body,
            skip: extracted.skip,
        })
    }

    pub fn title(&self) -> Option<&str> {
        self.metadata.title.as_deref()
    }

    pub(crate) fn body(&self) -> &Handle {
        &self.body
    }

    pub(crate) fn skip(&self) -> &[Handle] {
        &self.skip
    }

    /// Number of top-level nodes in the note body.
    pub fn body_len(&self) -> usize {
        self.body.children.borrow().len()
    }
}

/// Note identifiers in `<meta content>` and `<link href>` of the head, such as the
/// `source-url` some Evernote versions write. A `<meta>` whose name ends in `guid` is taken
/// as a bare guid.
fn source_aliases(document: &Handle) -> Vec<String> {
    let Some(head) = dom::find_first(document, "head") else {
        return Vec::new();
    };
    let mut aliases = Vec::new();
    let mut push = |alias: String| {
        if !alias.is_empty() && !aliases.contains(&alias) {
            aliases.push(alias);
        }
    };

    let meta = dom::find_all(&head, "meta");
    let links = dom::find_all(&head, "link");
    let values = meta
        .iter()
        .filter_map(|node| Some((dom::attr(node, "name"), dom::attr(node, "content")?)))
        .chain(links.iter().filter_map(|node| Some((None, dom::attr(node, "href")?))));

    for (name, value) in values {
        let value = value.trim().to_string();
        let is_guid_field = name.is_some_and(|n| n.to_ascii_lowercase().ends_with("guid"));
        if is_guid_field {
            push(value);
            continue;
        }
        if let Classified::Link(Reference::Internal(InternalRef::Guid(guid))) =
            classify(&value, None)
        {
            push(value);
            push(guid);
        }
    }
    aliases
}

impl fmt::Debug for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Note")
            .field("id", &self.id)
            .field("file_name", &self.file_name)
            .field("metadata", &self.metadata)
            .field("notebook", &self.notebook)
            .field("aliases", &self.aliases)
            .field("body_len", &self.body_len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_note() {
        let note = Note::parse(
            "Trip to Lisbon.html",
            "<html><head><title>Trip to Lisbon</title></head><body><h1>Trip to Lisbon</h1>\
             <div>Hello</div></body></html>",
        )
        .unwrap();
        assert_eq!(note.id, NoteId::from("Trip to Lisbon"));
        assert_eq!(note.title(), Some("Trip to Lisbon"));
        assert_eq!(note.skip().len(), 1);
    }

    #[test]
    fn test_body_outlives_parse() {
        let note = Note::parse(
            "A.html",
            "<html><body><h1>A</h1><div>Hello</div></body></html>",
        )
        .unwrap();
        assert_eq!(note.body_len(), 2);
        assert_eq!(dom::text_content(note.body()), "AHello");

        let copy = note.clone();
        drop(note);
        assert_eq!(dom::text_content(copy.body()), "AHello");
    }

    #[test]
    fn test_source_aliases_from_head() {
        let note = Note::parse(
            "B.html",
            "<html><head>\
             <meta name=\"source-url\" content=\"evernote:///view/1/s1/guid-b/guid-b/\">\
             <meta name=\"note-guid\" content=\" guid-legacy \">\
             <meta name=\"author\" content=\"someone\">\
             </head><body><div>x</div></body></html>",
        )
        .unwrap();
        assert_eq!(
            note.aliases,
            vec![
                "evernote:///view/1/s1/guid-b/guid-b/",
                "guid-b",
                "guid-legacy"
            ]
        );
    }

    #[test]
    fn test_missing_metadata_is_fine() {
        let note = Note::parse("plain.html", "<p>just text</p>").unwrap();
        assert!(note.metadata.is_empty());
        assert_eq!(note.notebook, None);
    }
}
