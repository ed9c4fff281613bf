//! Markdown output
//!
//! Writes the block IR as CommonMark with the GFM table and strikethrough extensions, plus a
//! few widely supported extras (wiki links, MultiMarkdown row spans, `: ` definition lists).
//!
//! # Library Choice
//!
//! Output is written as text rather than through a Markdown AST. The dialect needs constructs
//! no CommonMark formatter emits (`[[wiki|links]]`, `^` row-span cells, `![[transclusions]]`)
//! and exact control over escaping. `comrak` is kept as a dev-dependency: tests parse the
//! rendered output with it to check that tables and lists come out as valid GFM.
//!
//! # Element Mapping Table
//!
//! | IR                  | Markdown                                  | Notes                                     |
//! |---------------------|-------------------------------------------|-------------------------------------------|
//! | Paragraph           | lines joined by `\` or `<br>`             | see [`LineBreak`]                         |
//! | Heading             | `#` … `######`                            | levels clamp to 6                         |
//! | CodeBlock           | fenced code                               | Evernote blocks take the configured language |
//! | List                | `- ` / `1. `                              | children indented 2 / 3 spaces            |
//! | Table               | pipe table                                | spans: empty cells and `^`                |
//! | DefinitionList      | `Term` + `: description`                  | or raw `<dl>`                             |
//! | Quote               | `> `                                      |                                           |
//! | Rule                | `---`                                     |                                           |
//! | Bold / Italic       | `**` / `*`                                |                                           |
//! | Strikethrough       | `~~`                                      |                                           |
//! | Underline, sup, sub | `<u>`, `<sup>`, `<sub>`                   | raw HTML                                  |
//! | Color               | `<span style="color: …">`                 | link green dropped by default             |
//! | Align               | `<div align="…">`                         |                                           |
//! | Code                | `` `code` ``                              | `<code>` around other formatting          |
//! | Link                | `[[id]]`, `[label](target)`               | see [`InternalLinkStyle`], [`MediaEmbedding`] |
//! | Image               | `<img>`, `![alt](src)`, `![[src]]`        | see [`ImageRendering`]                    |
//!
//! # Lossy Conversions
//!
//! - Fonts, sizes and background colors are dropped by the style normalizer
//! - Row and column spans only survive in viewers that read MultiMarkdown tables
//! - Block content inside table cells is flattened onto `<br>`-separated lines
//! - Runs of blank lines collapse to a single blank line

pub mod finalize;
pub mod render_options;
pub mod serializer;

pub use render_options::{
    DefinitionListStyle, ImageRendering, InternalLinkStyle, LineBreak, MediaEmbedding,
    RenderOptions,
};
pub use serializer::serialize_to_markdown;
