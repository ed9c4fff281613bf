//! Note conversion pipeline.
//!
//! Provides the high-level API the CLI drives: index every note in scope, convert notes one
//! at a time against that index, then build the note graph from the results.
//!
//! ```ignore
//! let notes = vec![Note::parse("A.html", &html_a)?, Note::parse("B.html", &html_b)?];
//! let index = index_notes(&notes);
//! let converter = Converter::new(&options, &index);
//! let converted = notes.iter().map(|n| converter.convert(n)).collect::<Result<Vec<_>, _>>()?;
//! let graph = build_graph(&converted);
//! ```
//!
//! Conversion is a pure function of the note, the index and the options: it never reads or
//! writes files, and every anomaly is returned as a [`Diagnostic`].

use crate::common::graph::NoteGraph;
use crate::common::links::{NoteIndex, Resolution, ResolvedLink};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::ConvertError;
use crate::formats::evernote::{parser, Note};
use crate::formats::markdown::serializer::MarkdownSerializer;
use crate::formats::markdown::RenderOptions;
use crate::frontmatter;
use crate::ir::nodes::NoteId;

/// Directory attachments are relocated to, relative to the output root.
pub const RESOURCE_DIR: &str = "resources";

/// The result of converting one note.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedNote {
    pub id: NoteId,
    /// Frontmatter (if enabled) and body
    pub markdown: String,
    pub diagnostics: Vec<Diagnostic>,
    /// Every link of the note, in document order
    pub links: Vec<ResolvedLink>,
    /// Attachment paths relative to the export directory, deduplicated
    pub resources: Vec<String>,
    /// Notebook path from the `nb:` tag, `/`-separated
    pub notebook: Option<String>,
}

impl ConvertedNote {
    /// Notes this note links to, deduplicated, in first-seen order.
    pub fn linked_notes(&self) -> Vec<&NoteId> {
        let mut ids: Vec<&NoteId> = Vec::new();
        for link in &self.links {
            if let Resolution::Resolved(id) = &link.target.resolution {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
        ids
    }

    /// Internal links that matched no note of the index.
    pub fn unresolved_links(&self) -> impl Iterator<Item = &ResolvedLink> {
        self.links.iter().filter(|link| {
            link.target.reference.is_internal() && link.target.resolution == Resolution::Unresolved
        })
    }

    /// Output path of the Markdown file, relative to the output root.
    pub fn relative_path(&self) -> String {
        match &self.notebook {
            Some(notebook) => format!("{notebook}/{}.md", self.id),
            None => format!("{}.md", self.id),
        }
    }
}

/// Converts notes against a fixed index and options.
pub struct Converter<'a> {
    options: &'a RenderOptions,
    index: &'a NoteIndex,
    relocate_resources: bool,
}

impl<'a> Converter<'a> {
    pub fn new(options: &'a RenderOptions, index: &'a NoteIndex) -> Self {
        Self {
            options,
            index,
            relocate_resources: false,
        }
    }

    /// Point attachment links at [`RESOURCE_DIR`] next to the notebook folders instead of
    /// the original `<note>_files/` folders.
    pub fn relocate_resources(mut self, relocate: bool) -> Self {
        self.relocate_resources = relocate;
        self
    }

    /// Convert one note.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::Frontmatter`] if the metadata cannot be serialized.
    pub fn convert(&self, note: &Note) -> Result<ConvertedNote, ConvertError> {
        log::info!("converting {}", note.file_name);
        let mut diagnostics = Diagnostics::new(note.id.clone());

        let lowered = parser::lower(note.body(), note.skip(), self.index, &mut diagnostics);
        let body = MarkdownSerializer::new(self.options, &mut diagnostics)
            .with_resource_root(self.resource_root(note))
            .serialize(&lowered.blocks);

        let mut markdown = if self.options.frontmatter {
            frontmatter::render(&note.metadata)?
        } else {
            String::new()
        };
        markdown.push_str(&body);

        log::debug!(
            "{}: {} links, {} resources, {} diagnostics",
            note.id,
            lowered.links.len(),
            lowered.resources.len(),
            diagnostics.entries().len()
        );
        Ok(ConvertedNote {
            id: note.id.clone(),
            markdown,
            diagnostics: diagnostics.into_vec(),
            links: lowered.links,
            resources: lowered.resources,
            notebook: note.notebook.clone(),
        })
    }

    fn resource_root(&self, note: &Note) -> String {
        if !self.relocate_resources {
            return String::new();
        }
        let depth = note
            .notebook
            .as_deref()
            .map_or(0, |notebook| notebook.split('/').count());
        format!("{}{RESOURCE_DIR}/", "../".repeat(depth))
    }
}

/// Build the read-only index of every note in scope: file names, titles and the source
/// identifiers found in each note.
pub fn index_notes<'n>(notes: impl IntoIterator<Item = &'n Note>) -> NoteIndex {
    let mut index = NoteIndex::new();
    for note in notes {
        index.insert(note.id.clone(), &note.file_name, note.title());
        for alias in &note.aliases {
            index.add_alias(alias.clone(), note.id.clone());
        }
    }
    index
}

/// Build the note graph: one node per converted note, one edge per resolved link.
pub fn build_graph(converted: &[ConvertedNote]) -> NoteGraph {
    let mut graph = NoteGraph::new();
    for note in converted {
        graph.add_node(note.id.clone());
    }
    for note in converted {
        for target in note.linked_notes() {
            graph.add_edge(&note.id, target);
        }
    }
    graph
}

/// Convert a single HTML export on its own. Links to other notes stay unresolved unless
/// they point at the note itself.
pub fn convert_html(
    file_name: &str,
    html: &str,
    options: &RenderOptions,
) -> Result<ConvertedNote, ConvertError> {
    let note = Note::parse(file_name, html)?;
    let index = index_notes([&note]);
    Converter::new(options, &index).convert(&note)
}
