//! Markdown serialization of the block IR.
//!
//! Blocks are written directly as text. Inline content of every line first goes through
//! [`merge_lines`](crate::common::merge::merge_lines), so each [`FormatSpan`] is decorated once
//! with its differential attributes only.

use crate::common::links::{encode_path, LinkTarget, Reference, Resolution, INTERNAL_LINK_COLOR};
use crate::common::merge::{merge_inline, merge_lines, FormatSpan, SpanContent};
use crate::common::style::{StyleAttr, StyleSet};
use crate::common::table::{layout, render_pipe_table, single_cell};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::formats::markdown::finalize::finalize;
use crate::formats::markdown::render_options::{
    DefinitionListStyle, ImageRendering, InternalLinkStyle, LineBreak, MediaEmbedding,
    RenderOptions,
};
use crate::ir::nodes::{
    Alignment, Block, CodeBlock, DefinitionEntry, DefinitionList, Heading, Image, Inline, List,
    Paragraph, Table,
};
use once_cell::sync::Lazy;
use regex::Regex;

/// Characters with Markdown meaning that are backslash-escaped in text.
const ESCAPED: &[char] = &['\\', '<', '>', '$', '*', '`', '-', '_'];

/// Attachments viewers can preview inline when linked by file name.
const MEDIA_EXTENSIONS: &[&str] = &["pdf", "mp4", "mov", "webm", "mp3", "m4a", "wav", "ogg"];

/// Characters that cannot appear in a wiki link alias.
const WIKI_UNSAFE: &[char] = &['/', '<', '*', '~', '`', '|', '[', ']'];

static ORDERED_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,9})([.)])(\s|$)").expect("valid ordered marker pattern"));

/// Serialize blocks to finalized Markdown.
pub fn serialize_to_markdown(
    blocks: &[Block],
    options: &RenderOptions,
    diagnostics: &mut Diagnostics,
) -> String {
    MarkdownSerializer::new(options, diagnostics).serialize(blocks)
}

pub struct MarkdownSerializer<'a> {
    options: &'a RenderOptions,
    diagnostics: &'a mut Diagnostics,
    /// Prefix for attachment paths, when attachments are relocated
    resource_root: String,
    in_table: bool,
}

impl<'a> MarkdownSerializer<'a> {
    pub fn new(options: &'a RenderOptions, diagnostics: &'a mut Diagnostics) -> Self {
        Self {
            options,
            diagnostics,
            resource_root: String::new(),
            in_table: false,
        }
    }

    /// Write attachment links and image sources relative to `root` (e.g. `../resources/`).
    /// Transclusions keep the bare path.
    pub fn with_resource_root(mut self, root: impl Into<String>) -> Self {
        self.resource_root = root.into();
        self
    }

    /// Serialize and finalize a note body.
    pub fn serialize(&mut self, blocks: &[Block]) -> String {
        finalize(&self.blocks(blocks))
    }

    pub fn blocks(&mut self, blocks: &[Block]) -> String {
        blocks
            .iter()
            .map(|block| self.block(block))
            .filter(|rendered| !rendered.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn block(&mut self, block: &Block) -> String {
        match block {
            Block::Paragraph(paragraph) => self.paragraph(paragraph),
            Block::Heading(heading) => self.heading(heading),
            Block::CodeBlock(code) => self.code_block(code),
            Block::List(list) => self.list(list),
            Block::Table(table) => self.table(table),
            Block::DefinitionList(list) => self.definition_list(list),
            Block::Quote(blocks) => self.quote(blocks),
            Block::Rule => "---".to_string(),
        }
    }

    fn line_separator(&self) -> &'static str {
        if self.in_table {
            return "\n";
        }
        match self.options.line_break {
            LineBreak::Backslash => "\\\n",
            LineBreak::Html => "<br>\n",
        }
    }

    /// Rendered non-empty lines of inline content.
    fn lines(&mut self, inlines: &[Inline]) -> Vec<String> {
        merge_lines(inlines)
            .iter()
            .map(|spans| self.spans(spans))
            .map(|line| escape_line_start(line.trim_start_matches(' ').trim_end()))
            .filter(|line| !line.trim().is_empty())
            .collect()
    }

    fn paragraph(&mut self, paragraph: &Paragraph) -> String {
        let lines: Vec<String> = paragraph
            .lines
            .iter()
            .flat_map(|line| self.lines(line))
            .collect();
        lines.join(self.line_separator())
    }

    fn heading(&mut self, heading: &Heading) -> String {
        let text = self.spans(&merge_inline(&heading.content));
        let text = text.trim();
        if text.is_empty() {
            return String::new();
        }
        format!("{} {}", "#".repeat(heading.level.clamp(1, 6)), text)
    }

    fn code_block(&mut self, code: &CodeBlock) -> String {
        let longest = longest_backtick_run(&code.content);
        let fence = "`".repeat(longest.max(2) + 1);
        let language = if code.evernote {
            self.options.code_block_language.as_str()
        } else {
            ""
        };
        let body = code.content.trim_end_matches('\n');
        format!("{fence}{language}\n{body}\n{fence}")
    }

    fn list(&mut self, list: &List) -> String {
        let marker = if list.ordered { "1. " } else { "- " };
        let indent = " ".repeat(marker.len());
        let separator = format!("{}{}", self.line_separator(), indent);

        let mut items = Vec::with_capacity(list.items.len());
        for item in &list.items {
            let mut entry = format!("{marker}{}", self.lines(&item.content).join(&separator));
            for block in &item.blocks {
                let rendered = self.block(block);
                if !rendered.trim().is_empty() {
                    entry.push_str("\n\n");
                    entry.push_str(&indent_lines(&rendered, &indent));
                }
            }
            if let Some(children) = &item.children {
                let rendered = self.list(children);
                if !rendered.is_empty() {
                    entry.push('\n');
                    entry.push_str(&indent_lines(&rendered, &indent));
                }
            }
            items.push(entry.trim_end().to_string());
        }
        items.join("\n")
    }

    fn table(&mut self, table: &Table) -> String {
        if let Some(cell) = single_cell(table) {
            return self.blocks(&cell.content);
        }

        let grid = layout(table);
        let outer = std::mem::replace(&mut self.in_table, true);
        let rendered = render_pipe_table(&grid, |blocks| self.blocks(blocks));
        self.in_table = outer;
        rendered
    }

    fn definition_list(&mut self, list: &DefinitionList) -> String {
        match self.options.definition_list_style {
            DefinitionListStyle::RawMarkup => self.raw_definition_list(list),
            DefinitionListStyle::Native => match list.entries.first() {
                Some(DefinitionEntry::Description(content)) => {
                    let preview = self.spans(&merge_inline(content));
                    self.diagnostics.push(
                        DiagnosticKind::NonstandardDefinitionList,
                        format!("starts with a definition: '{}'", preview.trim()),
                    );
                    self.raw_definition_list(list)
                }
                _ => self.native_definition_list(list),
            },
        }
    }

    fn native_definition_list(&mut self, list: &DefinitionList) -> String {
        let mut out = String::new();
        for entry in &list.entries {
            match entry {
                DefinitionEntry::Term(content) => {
                    let term = self.spans(&merge_inline(content));
                    if !out.is_empty() {
                        out.push_str("\n\n");
                    }
                    out.push_str(&escape_line_start(term.trim()));
                }
                DefinitionEntry::Description(content) => {
                    let description = self.spans(&merge_inline(content));
                    out.push_str("\n: ");
                    out.push_str(description.trim());
                }
            }
        }
        out
    }

    fn raw_definition_list(&mut self, list: &DefinitionList) -> String {
        let mut out = String::from("<dl>");
        for entry in &list.entries {
            let (tag, content) = match entry {
                DefinitionEntry::Term(content) => ("dt", content),
                DefinitionEntry::Description(content) => ("dd", content),
            };
            let text = self.spans(&merge_inline(content));
            out.push_str(&format!("<{tag}>{}</{tag}>", text.trim()));
        }
        out.push_str("</dl>");
        out
    }

    fn quote(&mut self, blocks: &[Block]) -> String {
        self.blocks(blocks)
            .lines()
            .map(|line| {
                if line.is_empty() {
                    ">".to_string()
                } else {
                    format!("> {line}")
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn spans(&mut self, spans: &[FormatSpan]) -> String {
        spans.iter().map(|span| self.span(span)).collect()
    }

    fn span(&mut self, span: &FormatSpan) -> String {
        let style = &span.style;
        let code_leaf = style.contains(&StyleAttr::Code)
            && matches!(span.content, SpanContent::Text(_) | SpanContent::Verbatim(_));

        if let Some(target) = style.link() {
            if is_autolink(span, target) {
                return target.href.clone();
            }
        }

        let inner = match &span.content {
            SpanContent::Text(text) | SpanContent::Verbatim(text) if code_leaf => {
                text.replace('\u{a0}', " ")
            }
            SpanContent::Text(text) => escape(text),
            SpanContent::Verbatim(text) => text.clone(),
            SpanContent::Image(image) => self.image(image),
            SpanContent::Spans(children) => self.spans(children),
        };
        if style.is_empty() {
            return inner;
        }

        let (leading, core, trailing) = split_padding(&inner);
        if core.is_empty() {
            return inner;
        }

        let mut text = core.to_string();
        if code_leaf {
            text = code_span(&text);
        } else if style.contains(&StyleAttr::Code) {
            text = format!("<code>{text}</code>");
        }
        text = self.decorate(text, style, has_internal_link(span));

        if let Some(target) = style.link() {
            text = self.link(target, &text, &plain_text(span));
        }
        format!("{leading}{text}{trailing}")
    }

    /// Apply formatting wrappers, innermost first.
    fn decorate(&self, mut text: String, style: &StyleSet, internal_link: bool) -> String {
        if let Some(title) = style.abbr() {
            text = format!("<abbr title=\"{}\">{text}</abbr>", escape_attribute(title));
        }
        if style.contains(&StyleAttr::Superscript) {
            text = format!("<sup>{text}</sup>");
        }
        if style.contains(&StyleAttr::Subscript) {
            text = format!("<sub>{text}</sub>");
        }
        if style.contains(&StyleAttr::Underline) {
            text = format!("<u>{text}</u>");
        }
        if style.contains(&StyleAttr::Strikethrough) {
            text = format!("~~{text}~~");
        }
        if let Some(color) = style.color() {
            let link_color = internal_link && color == INTERNAL_LINK_COLOR;
            if !link_color || self.options.color_internal_links {
                text = format!("<span style=\"color: {color}\">{text}</span>");
            }
        }
        if style.contains(&StyleAttr::Italic) {
            text = format!("*{text}*");
        }
        if style.contains(&StyleAttr::Bold) {
            text = format!("**{text}**");
        }
        match style.align() {
            Some(Alignment::Center) => text = format!("<div align=\"center\">{text}</div>"),
            Some(Alignment::Right) => text = format!("<div align=\"right\">{text}</div>"),
            _ => {}
        }
        text
    }

    fn link(&self, target: &LinkTarget, label: &str, plain: &str) -> String {
        match (&target.resolution, &target.reference) {
            (Resolution::Resolved(id), _) => match self.options.internal_link_style {
                InternalLinkStyle::Wiki if label == escape(plain) && !plain.contains(WIKI_UNSAFE) => {
                    if plain.trim() == id.as_str() {
                        format!("[[{id}]]")
                    } else {
                        format!("[[{id}|{}]]", plain.trim())
                    }
                }
                _ => format!("[{label}]({}.md)", encode_path(id.as_str())),
            },
            (Resolution::Resource, Reference::Resource(path)) => self.resource_link(path, label),
            _ => format!("[{label}]({})", destination(&target.href)),
        }
    }

    fn resource_link(&self, path: &str, label: &str) -> String {
        let name = basename(path);
        let media = is_media(path);
        let label = if label.trim().is_empty() { name } else { label };
        let target = format!("{}{path}", self.resource_root);
        let relocated = encode_path(&target);
        match self.options.media_embedding {
            MediaEmbedding::NativeTransclusion if media => format!("![[{target}]]"),
            MediaEmbedding::AutoPreviewLink if media => format!("[{}]({relocated})", escape(name)),
            _ => format!("[{label}]({relocated})"),
        }
    }

    fn image(&self, image: &Image) -> String {
        let src = if image.external {
            image.src.clone()
        } else {
            encode_path(&format!("{}{}", self.resource_root, image.src))
        };
        let alt: String = image.alt.chars().filter(|c| !"[]|".contains(*c)).collect();

        match self.options.image_rendering {
            ImageRendering::RawMarkupTag => {
                let attrs: Vec<String> = [
                    ("src", Some(src.as_str())),
                    ("alt", Some(alt.as_str())),
                    ("width", image.width.as_deref()),
                    ("height", image.height.as_deref()),
                ]
                .into_iter()
                .filter_map(|(name, value)| {
                    value
                        .filter(|v| !v.is_empty())
                        .map(|v| format!("{name}=\"{}\"", escape_attribute(v)))
                })
                .collect();
                format!("<img {}>", attrs.join(" "))
            }
            ImageRendering::NativeTransclusion if !image.external => {
                let target = format!("{}{}", self.resource_root, image.src);
                match &image.width {
                    Some(width) => format!("![[{target}|{width}]]"),
                    None => format!("![[{target}]]"),
                }
            }
            _ => {
                let mut size = String::new();
                if let Some(width) = &image.width {
                    size.push('|');
                    size.push_str(width);
                }
                if let Some(height) = &image.height {
                    size.push('x');
                    size.push_str(height);
                }
                format!("![{alt}{size}]({})", destination(&src))
            }
        }
    }
}

/// Backslash-escape Markdown punctuation in source text.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if ESCAPED.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape markers that would turn a paragraph line into a heading or list item.
fn escape_line_start(line: &str) -> String {
    if line.starts_with('#') || line.starts_with("+ ") || line == "+" {
        return format!("\\{line}");
    }
    ORDERED_MARKER.replace(line, "$1\\$2$3").into_owned()
}

/// A code span with a fence longer than any backtick run inside it.
fn code_span(code: &str) -> String {
    if !code.contains('`') {
        return format!("`{code}`");
    }
    let fence = "`".repeat(longest_backtick_run(code) + 1);
    let pad_start = if code.starts_with('`') { " " } else { "" };
    let pad_end = if code.ends_with('`') { " " } else { "" };
    format!("{fence}{pad_start}{code}{pad_end}{fence}")
}

fn longest_backtick_run(text: &str) -> usize {
    text.split(|c| c != '`').map(str::len).max().unwrap_or(0)
}

fn split_padding(text: &str) -> (&str, &str, &str) {
    let start = text.len() - text.trim_start().len();
    let end = text.trim_end().len().max(start);
    (&text[..start], &text[start..end], &text[end..])
}

fn indent_lines(text: &str, indent: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{indent}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn escape_attribute(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

/// Link destination, bracketed when it would not parse bare.
fn destination(url: &str) -> String {
    if url.contains(|c: char| c.is_whitespace() || c == '(' || c == ')') {
        format!("<{url}>")
    } else {
        url.to_string()
    }
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn is_media(path: &str) -> bool {
    basename(path)
        .rsplit_once('.')
        .is_some_and(|(_, ext)| MEDIA_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Unformatted text of a span: images contribute their alt text.
fn plain_text(span: &FormatSpan) -> String {
    match &span.content {
        SpanContent::Text(text) | SpanContent::Verbatim(text) => text.clone(),
        SpanContent::Image(image) => image.alt.clone(),
        SpanContent::Spans(children) => children.iter().map(plain_text).collect(),
    }
}

fn is_autolink(span: &FormatSpan, target: &LinkTarget) -> bool {
    fn verbatim(span: &FormatSpan, out: &mut String) -> bool {
        match &span.content {
            SpanContent::Verbatim(text) => {
                out.push_str(text);
                true
            }
            SpanContent::Spans(children) => children.iter().all(|child| verbatim(child, out)),
            _ => false,
        }
    }
    let mut text = String::new();
    verbatim(span, &mut text) && text == target.href
}

fn has_internal_link(span: &FormatSpan) -> bool {
    if span
        .style
        .link()
        .is_some_and(|target| target.reference.is_internal())
    {
        return true;
    }
    match &span.content {
        SpanContent::Spans(children) => children.iter().any(has_internal_link),
        _ => false,
    }
}
