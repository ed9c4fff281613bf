//! Conversion engine for exported Evernote notes
//!
//!     This crate turns the HTML files Evernote writes for each note (one `<title>.html` per
//!     note, attachments in `<title>_files/`) into Markdown with a YAML frontmatter block.
//!
//!     TLDR:
//!         - Parsing uses html5ever; the engine never matches markup with regexes.
//!         - Notes are lowered once to the IR (./ir), all the heavy lifting happens in ./common.
//!         - Links between notes need the index of every note in scope, so conversion is two
//!           phase: parse and index everything, then convert.
//!         - Anything that cannot be converted faithfully is a diagnostic, not an error.
//!
//! Architecture
//!
//!     HTML ─► Note (DOM + metadata) ─► IR blocks ─► Markdown ─► finalize
//!                                         ▲
//!                          NoteIndex ─────┘   (link resolution)
//!
//!     The format-specific code (./formats) only deals with the shape of the input and output.
//!     The format-independent core (./common) is where the algorithms live and is tested in
//!     isolation.
//!
//!     This is a pure lib: it powers the evermark CLI but never prints, never reads
//!     environment variables and never touches the filesystem. Logging goes through the `log`
//!     facade.
//!
//!     The file structure :
//!     .
//!     ├── error.rs
//!     ├── diagnostics.rs          # Append-only anomaly collector
//!     ├── frontmatter.rs          # Metadata model and YAML frontmatter
//!     ├── convert.rs              # Pipeline: index, convert, graph
//!     ├── formats
//!     │   ├── evernote            # HTML input: DOM helpers, metadata, lowering
//!     │   └── markdown            # Markdown output: serializer, options, finalize
//!     ├── ir                      # Intermediate Representation
//!     └── common                  # Style, merge, lists, tables, links, graph
//!
//! Testing
//!     tests
//!     ├── <area>
//!     │   └── <testname>.rs
//!     └── fixtures
//!         └── <note>.html
//!
//!     Rust does not discover tests in subdirectories, so tests/lib.rs includes them as modules.
//!
//! Core Algorithms
//!
//!     - Style normalization (common/style.rs): every way of saying "bold" maps to one
//!       canonical attribute.
//!     - Span merging (common/merge.rs): redundant and interleaved wrappers collapse into
//!       maximal spans before rendering.
//!     - List structuring (common/lists.rs): nesting follows visual intent, whether the source
//!       nested `<ul>`s or indented with spaces.
//!     - Table transcoding (common/table.rs): row and column spans become a rectangular grid.
//!     - Link resolution and the note graph (common/links.rs, common/graph.rs).

pub mod common;
pub mod convert;
pub mod diagnostics;
pub mod error;
pub mod formats;
pub mod frontmatter;
pub mod ir;

pub use common::graph::{Cluster, NoteGraph, Traversal};
pub use common::links::NoteIndex;
pub use convert::{build_graph, convert_html, index_notes, ConvertedNote, Converter};
pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use error::ConvertError;
pub use formats::evernote::Note;
pub use formats::markdown::RenderOptions;
pub use ir::nodes::NoteId;
