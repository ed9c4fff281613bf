//! Core data structures for the Intermediate Representation (IR).

use crate::common::style::StyleSet;
use std::fmt;

/// Identifier of a note, derived from the stem of its source file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoteId(String);

impl NoteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive the identifier from a file name such as `My Note.html`.
    pub fn from_file_name(file_name: &str) -> Self {
        let name = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
        let stem = match name.rfind('.') {
            Some(pos) if pos > 0 => &name[..pos],
            _ => name,
        };
        Self(stem.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NoteId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A block-level node of a note body.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(Paragraph),
    Heading(Heading),
    CodeBlock(CodeBlock),
    List(List),
    Table(Table),
    DefinitionList(DefinitionList),
    Quote(Vec<Block>),
    Rule,
}

/// Lines separated by soft breaks. Paragraph breaks separate `Paragraph`s.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Paragraph {
    pub lines: Vec<Vec<Inline>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Heading {
    pub level: usize,
    pub content: Vec<Inline>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CodeBlock {
    /// Evernote code blocks take the configured language, plain `<pre>` blocks have none
    pub evernote: bool,
    pub content: String,
}

/// Represents a list of items.
#[derive(Debug, Clone, PartialEq)]
pub struct List {
    pub items: Vec<ListItem>,
    pub ordered: bool,
}

/// Represents an item in a list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListItem {
    pub content: Vec<Inline>,
    /// Block content that cannot live on the item line (tables, code)
    pub blocks: Vec<Block>,
    pub children: Option<List>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DefinitionList {
    pub entries: Vec<DefinitionEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DefinitionEntry {
    Term(Vec<Inline>),
    Description(Vec<Inline>),
}

/// Represents a table as declared in the source, spans unresolved.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub rows: Vec<TableRow>,
}

/// Represents a table row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

/// Represents a table cell.
#[derive(Debug, Clone, PartialEq)]
pub struct TableCell {
    pub content: Vec<Block>,
    pub header: bool,
    pub align: Alignment,
    pub row_span: usize,
    pub col_span: usize,
}

impl Default for TableCell {
    fn default() -> Self {
        Self {
            content: Vec::new(),
            header: false,
            align: Alignment::Default,
            row_span: 1,
            col_span: 1,
        }
    }
}

/// Horizontal alignment of a block or table cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Alignment {
    #[default]
    Default,
    Left,
    Center,
    Right,
}

impl Alignment {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" | "start" => Alignment::Left,
            "center" | "middle" => Alignment::Center,
            "right" | "end" => Alignment::Right,
            _ => Alignment::Default,
        }
    }
}

/// Inline content before span merging. Styled wrappers may nest arbitrarily.
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    /// Source text, escaped on output
    Text(String),
    /// Text emitted as-is (autolinks)
    Verbatim(String),
    /// A hard line break inside a block
    Break,
    Image(Image),
    Styled {
        style: StyleSet,
        children: Vec<Inline>,
    },
}

impl Inline {
    pub fn text(value: impl Into<String>) -> Self {
        Inline::Text(value.into())
    }

    pub fn styled(style: StyleSet, children: Vec<Inline>) -> Self {
        Inline::Styled { style, children }
    }

    /// Whether this node renders anything besides whitespace.
    pub fn has_content(&self) -> bool {
        match self {
            Inline::Text(text) | Inline::Verbatim(text) => {
                text.chars().any(|c| !c.is_whitespace())
            }
            Inline::Break => false,
            Inline::Image(_) => true,
            Inline::Styled { children, .. } => children.iter().any(Inline::has_content),
        }
    }
}

/// Represents an image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Image {
    pub src: String,
    pub alt: String,
    pub width: Option<String>,
    pub height: Option<String>,
    /// Hosted outside the note's attachment folder
    pub external: bool,
}
