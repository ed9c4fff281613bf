//! Lowering of an Evernote note body (HTML DOM) into the IR.
//!
//! # Block Flow
//!
//! Evernote does not write paragraphs. A note body is a run of `<div>`s, each one visual line,
//! with `<div><br></div>` for blank lines, and `<br>` inside a div for soft breaks. The
//! lowering rebuilds paragraphs with a small [`Flow`] builder:
//!
//! - element boundaries of `div`/`p` end the current line
//! - `<br>` ends the current line, or on an empty line ends the paragraph
//! - `p` also ends the paragraph around itself
//! - block constructs (headings, lists, tables, code) close the paragraph and are appended
//!
//! # Inline Styling
//!
//! Inline elements lower to [`Inline::Styled`] nodes carrying their own normalized style; the
//! span merger later threads inheritance through them. An inline element that wraps block
//! content (`<span style="font-weight:bold"><div>…</div></span>`) becomes transparent: its
//! style is passed down explicitly to everything lowered inside it.
//!
//! # Side Channels
//!
//! Links are classified and resolved against the [`NoteIndex`] while lowering, so the
//! converted note can report them for the graph. Local attachment paths are collected as
//! resources, and every anomaly goes to the note's [`Diagnostics`].

use super::dom;
use crate::common::links::{
    classify, decode_path, Classified, LinkTarget, NoteIndex, Reference, Resolution,
    ResolvedLink,
};
use crate::common::lists::{self, ListEntry};
use crate::common::style::{
    indent_level, is_codeblock, normalize_element, parse_declarations, StyleAttr, StyleSet,
};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::ir::nodes::{
    Alignment, Block, CodeBlock, DefinitionEntry, DefinitionList, Heading, Image, Inline, List,
    Paragraph, Table, TableCell, TableRow,
};
use markup5ever_rcdom::Handle;
use std::collections::BTreeSet;

/// Upper bound for `rowspan`/`colspan` values, as browsers clamp them.
const MAX_SPAN: usize = 1000;

/// Elements dropped with their content.
const IGNORED: &[&str] = &[
    "head", "title", "meta", "link", "script", "style", "noscript", "template", "object",
    "embed", "iframe", "svg", "map", "area", "input", "button", "select", "textarea",
    "colgroup", "col",
];

/// Block containers with no meaning of their own.
const TRANSPARENT: &[&str] = &[
    "html", "body", "section", "article", "main", "header", "footer", "nav", "aside", "figure",
    "figcaption", "address", "details", "summary", "form", "label", "fieldset", "legend",
    "caption", "en-note",
];

/// Inline elements lowered through the style normalizer.
const STYLED_INLINE: &[&str] = &[
    "span", "font", "b", "strong", "i", "em", "cite", "dfn", "var", "u", "ins", "s", "strike",
    "del", "sup", "sub", "small", "code", "tt", "kbd", "samp", "abbr", "acronym", "center",
    "mark", "big", "nobr", "wbr", "bdi", "bdo", "time", "data",
];

const HEADINGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// Result of lowering a note body.
#[derive(Debug, Default)]
pub struct Lowered {
    pub blocks: Vec<Block>,
    pub links: Vec<ResolvedLink>,
    pub resources: Vec<String>,
}

/// Lower a note body into IR blocks.
pub fn lower(
    body: &Handle,
    skip: &[Handle],
    index: &NoteIndex,
    diagnostics: &mut Diagnostics,
) -> Lowered {
    let mut lowering = Lowering {
        index,
        skip,
        diagnostics,
        links: Vec::new(),
        resources: Vec::new(),
        unknown: BTreeSet::new(),
    };
    let blocks = lowering.blocks_of(body, &StyleSet::new());
    Lowered {
        blocks,
        links: lowering.links,
        resources: lowering.resources,
    }
}

/// Incremental paragraph builder.
#[derive(Debug, Default)]
struct Flow {
    blocks: Vec<Block>,
    lines: Vec<Vec<Inline>>,
    line: Vec<Inline>,
}

impl Flow {
    fn push_inline(&mut self, inline: Inline) {
        self.line.push(inline);
    }

    /// Close the current line; whitespace-only lines vanish.
    fn end_line(&mut self) {
        let line = std::mem::take(&mut self.line);
        if line.iter().any(Inline::has_content) {
            self.lines.push(line);
        }
    }

    fn line_break(&mut self) {
        if self.line.iter().any(Inline::has_content) {
            self.end_line();
        } else {
            self.line.clear();
            self.end_paragraph();
        }
    }

    fn end_paragraph(&mut self) {
        self.end_line();
        if !self.lines.is_empty() {
            let lines = std::mem::take(&mut self.lines);
            self.blocks.push(Block::Paragraph(Paragraph { lines }));
        }
    }

    fn push_block(&mut self, block: Block) {
        self.end_paragraph();
        self.blocks.push(block);
    }

    fn finish(mut self) -> Vec<Block> {
        self.end_paragraph();
        self.blocks
    }
}

struct Lowering<'a> {
    index: &'a NoteIndex,
    skip: &'a [Handle],
    diagnostics: &'a mut Diagnostics,
    links: Vec<ResolvedLink>,
    resources: Vec<String>,
    /// Unknown tags already reported
    unknown: BTreeSet<String>,
}

impl Lowering<'_> {
    fn skipped(&self, node: &Handle) -> bool {
        self.skip.iter().any(|s| dom::same_node(s, node))
    }

    fn blocks_of(&mut self, node: &Handle, inherited: &StyleSet) -> Vec<Block> {
        let mut flow = Flow::default();
        for child in dom::children(node) {
            self.walk(&child, &mut flow, inherited);
        }
        flow.finish()
    }

    fn walk(&mut self, node: &Handle, flow: &mut Flow, inherited: &StyleSet) {
        if self.skipped(node) {
            return;
        }
        if let Some(text) = dom::text(node) {
            let text = collapse_whitespace(&text);
            if !text.is_empty() {
                flow.push_inline(wrap(inherited, Inline::Text(text)));
            }
            return;
        }
        let Some(tag) = dom::tag(node) else {
            return;
        };

        match tag {
            "br" => flow.line_break(),
            "hr" => flow.push_block(Block::Rule),
            "p" => {
                flow.end_paragraph();
                let style = inherited.inherit(&self.element_style(node));
                self.walk_children(node, flow, &style);
                flow.end_paragraph();
            }
            "div" => {
                let declarations = parse_declarations(&dom::attr(node, "style").unwrap_or_default());
                if is_codeblock(&declarations) {
                    flow.push_block(Block::CodeBlock(CodeBlock {
                        evernote: true,
                        content: code_text(node),
                    }));
                    return;
                }
                flow.end_line();
                let style = inherited.inherit(&self.element_style(node));
                self.walk_children(node, flow, &style);
                flow.end_line();
            }
            "pre" => flow.push_block(Block::CodeBlock(CodeBlock {
                evernote: false,
                content: code_text(node),
            })),
            t if HEADINGS.contains(&t) => {
                let level = t[1..].parse().unwrap_or(1);
                let content = self.inlines(node);
                if content.iter().any(Inline::has_content) {
                    flow.push_block(Block::Heading(Heading {
                        level,
                        content: wrap_all(inherited, content),
                    }));
                }
            }
            "ul" | "ol" => {
                if let Some(list) = self.list(node, inherited) {
                    flow.push_block(Block::List(list));
                }
            }
            "table" => {
                if let Some(table) = self.table(node, inherited) {
                    flow.push_block(Block::Table(table));
                }
            }
            "dl" => {
                let list = self.definition_list(node, inherited);
                if !list.entries.is_empty() {
                    flow.push_block(Block::DefinitionList(list));
                }
            }
            "blockquote" => {
                let blocks = self.blocks_of(node, inherited);
                if !blocks.is_empty() {
                    flow.push_block(Block::Quote(blocks));
                }
            }
            "li" | "dt" | "dd" | "tr" | "td" | "th" | "tbody" | "thead" | "tfoot" => {
                // Stray structural element outside its container
                flow.end_line();
                self.walk_children(node, flow, inherited);
                flow.end_line();
            }
            t if IGNORED.contains(&t) => {}
            t if TRANSPARENT.contains(&t) => self.walk_children(node, flow, inherited),
            "a" | "img" | "q" => {
                let mut out = Vec::new();
                self.inline_node(node, &mut out);
                for inline in out {
                    flow.push_inline(wrap(inherited, inline));
                }
            }
            t if STYLED_INLINE.contains(&t) => {
                if has_block_descendant(node) {
                    let style = inherited.inherit(&self.element_style(node));
                    self.walk_children(node, flow, &style);
                } else {
                    let mut out = Vec::new();
                    self.inline_node(node, &mut out);
                    for inline in out {
                        flow.push_inline(wrap(inherited, inline));
                    }
                }
            }
            t => {
                self.report_unknown(t);
                self.walk_children(node, flow, inherited);
            }
        }
    }

    fn walk_children(&mut self, node: &Handle, flow: &mut Flow, inherited: &StyleSet) {
        for child in dom::children(node) {
            self.walk(&child, flow, inherited);
        }
    }

    fn report_unknown(&mut self, tag: &str) {
        if self.unknown.insert(tag.to_string()) {
            self.diagnostics
                .push(DiagnosticKind::UnknownElement, format!("<{tag}>"));
        }
    }

    /// Normalized style of an element; suspicious values are reported.
    fn element_style(&mut self, node: &Handle) -> StyleSet {
        let tag = dom::tag(node).unwrap_or_default();
        let normalized = normalize_element(tag, |name| dom::attr(node, name));
        for detail in normalized.suspicious {
            self.diagnostics
                .push(DiagnosticKind::UnmappedStyleAttribute, detail);
        }
        normalized.style
    }

    // Inline content

    fn inlines(&mut self, node: &Handle) -> Vec<Inline> {
        let mut out = Vec::new();
        for child in dom::children(node) {
            self.inline_node(&child, &mut out);
        }
        out
    }

    fn inline_node(&mut self, node: &Handle, out: &mut Vec<Inline>) {
        if self.skipped(node) {
            return;
        }
        if let Some(text) = dom::text(node) {
            let text = collapse_whitespace(&text);
            if !text.is_empty() {
                out.push(Inline::Text(text));
            }
            return;
        }
        let Some(tag) = dom::tag(node) else {
            return;
        };

        match tag {
            "br" => out.push(Inline::Break),
            "a" => self.link(node, out),
            "img" => {
                if let Some(image) = self.image(node) {
                    out.push(Inline::Image(image));
                }
            }
            "q" => {
                let style = self.element_style(node);
                let mut children = vec![Inline::text("\"")];
                children.extend(self.inlines(node));
                children.push(Inline::text("\""));
                out.push(Inline::styled(style, children));
            }
            t if IGNORED.contains(&t) => {}
            t if STYLED_INLINE.contains(&t) || t == "div" || t == "p" || HEADINGS.contains(&t) => {
                let style = self.element_style(node);
                let block = matches!(t, "div" | "p") || HEADINGS.contains(&t);
                if block && out.last().is_some_and(|last| *last != Inline::Break) {
                    out.push(Inline::Break);
                }
                let children = self.inlines(node);
                if style.is_empty() {
                    out.extend(children);
                } else {
                    out.push(Inline::styled(style, children));
                }
                if block {
                    out.push(Inline::Break);
                }
            }
            t => {
                if !TRANSPARENT.contains(&t) && !is_structural(t) {
                    self.report_unknown(t);
                }
                out.extend(self.inlines(node));
            }
        }
    }

    fn link(&mut self, node: &Handle, out: &mut Vec<Inline>) {
        let href = dom::attr(node, "href").unwrap_or_default();
        let children = self.inlines(node);
        let mut style = self.element_style(node);
        let label = collapse_whitespace(&plain_text(&children)).trim().to_string();

        if !href.is_empty() && href == label {
            out.push(Inline::styled(style, vec![Inline::Verbatim(href)]));
            return;
        }

        let color = style
            .color()
            .map(str::to_string)
            .or_else(|| first_color(&children));
        match classify(&href, color.as_deref()) {
            Classified::Anchor => {}
            Classified::Empty => {
                self.diagnostics.push(
                    DiagnosticKind::EmptyLink,
                    format!("link '{label}' has no target ({href})"),
                );
            }
            Classified::Link(reference) => {
                let resolution = match &reference {
                    Reference::External(_) => Resolution::External,
                    Reference::Resource(path) => {
                        self.add_resource(path);
                        Resolution::Resource
                    }
                    Reference::Internal(_) => self.index.resolve(&reference, &label),
                };
                if resolution == Resolution::Unresolved {
                    self.diagnostics.push(
                        DiagnosticKind::UnresolvedInternalLink,
                        format!("'{label}' -> {href}"),
                    );
                }
                let target = LinkTarget {
                    href,
                    reference,
                    resolution,
                };
                self.links.push(ResolvedLink {
                    label,
                    target: target.clone(),
                });
                style.insert(StyleAttr::Link(target));
            }
        }

        if style.is_empty() {
            out.extend(children);
        } else {
            out.push(Inline::styled(style, children));
        }
    }

    fn image(&mut self, node: &Handle) -> Option<Image> {
        let raw = dom::attr(node, "src").unwrap_or_default();
        if raw.trim().is_empty() {
            return None;
        }
        let external = raw.contains("://") || raw.starts_with("data:");
        let src = if external {
            self.diagnostics.push(
                DiagnosticKind::ExternalMediaReference,
                truncate(&raw, 120),
            );
            raw
        } else {
            let path = decode_path(&raw);
            self.add_resource(&path);
            path
        };

        let alt = dom::attr(node, "data-filename")
            .filter(|v| !v.trim().is_empty())
            .or_else(|| dom::attr(node, "alt").filter(|v| !v.trim().is_empty()))
            .unwrap_or_else(|| basename(&src).to_string());

        Some(Image {
            alt: strip_extension(alt.trim()).to_string(),
            src,
            width: dom::attr(node, "width").filter(|v| !v.is_empty()),
            height: dom::attr(node, "height").filter(|v| !v.is_empty()),
            external,
        })
    }

    fn add_resource(&mut self, path: &str) {
        if !self.resources.iter().any(|r| r == path) {
            self.resources.push(path.to_string());
        }
    }

    // Lists

    fn list(&mut self, node: &Handle, inherited: &StyleSet) -> Option<List> {
        let mut entries = Vec::new();
        let ordered = dom::tag(node) == Some("ol");
        self.collect_list(node, 0, ordered, inherited, &mut entries);
        lists::structure(entries, &mut *self.diagnostics)
    }

    fn collect_list(
        &mut self,
        node: &Handle,
        depth: usize,
        ordered: bool,
        inherited: &StyleSet,
        entries: &mut Vec<ListEntry>,
    ) {
        let style = inherited.inherit(&self.element_style(node));
        for child in dom::children(node) {
            if self.skipped(&child) || dom::is_blank_text(&child) {
                continue;
            }
            match dom::tag(&child) {
                Some("ul") | Some("ol") => {
                    let nested_ordered = dom::tag(&child) == Some("ol");
                    self.collect_list(&child, depth + 1, nested_ordered, &style, entries);
                }
                _ => self.list_item(&child, depth, ordered, &style, entries),
            }
        }
    }

    /// Lower a `li` (or any stray child of a list container) into entries. Nested lists split
    /// the item: content before them is the item, their items follow one level deeper.
    fn list_item(
        &mut self,
        node: &Handle,
        depth: usize,
        ordered: bool,
        inherited: &StyleSet,
        entries: &mut Vec<ListEntry>,
    ) {
        let margin = dom::attr(node, "style")
            .map(|s| indent_level(&parse_declarations(&s)))
            .unwrap_or(0);

        let (style, parts) = if dom::tag(node) == Some("li") {
            let style = inherited.inherit(&self.element_style(node));
            (style, dom::children(node))
        } else {
            (inherited.clone(), vec![node.clone()])
        };

        let mut flow = Flow::default();
        for part in parts {
            match dom::tag(&part) {
                Some("ul") | Some("ol") => {
                    let finished = std::mem::take(&mut flow);
                    entries.push(list_entry(finished, depth, margin, ordered));
                    let nested_ordered = dom::tag(&part) == Some("ol");
                    self.collect_list(&part, depth + 1, nested_ordered, &style, entries);
                }
                _ => self.walk(&part, &mut flow, &style),
            }
        }
        entries.push(list_entry(flow, depth, margin, ordered));
    }

    // Tables

    fn table(&mut self, node: &Handle, inherited: &StyleSet) -> Option<Table> {
        let mut rows = Vec::new();
        for child in dom::children(node) {
            match dom::tag(&child) {
                Some("thead") | Some("tbody") | Some("tfoot") => {
                    for row in dom::children(&child) {
                        if dom::tag(&row) == Some("tr") {
                            rows.push(self.table_row(&row, inherited));
                        }
                    }
                }
                Some("tr") => rows.push(self.table_row(&child, inherited)),
                _ => {}
            }
        }
        (!rows.is_empty()).then_some(Table { rows })
    }

    fn table_row(&mut self, row: &Handle, inherited: &StyleSet) -> TableRow {
        let row_align = dom::attr(row, "align").map(|a| Alignment::parse(&a));
        let cells = dom::children(row)
            .into_iter()
            .filter(|c| dom::is_tag(c, &["td", "th"]))
            .map(|cell| self.table_cell(&cell, row_align, inherited))
            .collect();
        TableRow { cells }
    }

    fn table_cell(
        &mut self,
        cell: &Handle,
        row_align: Option<Alignment>,
        inherited: &StyleSet,
    ) -> TableCell {
        let declarations = parse_declarations(&dom::attr(cell, "style").unwrap_or_default());
        let align = dom::attr(cell, "align")
            .or_else(|| declarations.get("text-align").map(str::to_string))
            .map(|a| Alignment::parse(&a))
            .or(row_align)
            .unwrap_or_default();

        // Alignment lives on the column; keep the remaining style for the content
        let mut style = self.element_style(cell);
        if let Some(own) = style.align() {
            style.remove(&StyleAttr::Align(own));
        }
        let style = inherited.inherit(&style);

        TableCell {
            content: self.blocks_of(cell, &style),
            header: dom::tag(cell) == Some("th"),
            align,
            row_span: span_attr(cell, "rowspan"),
            col_span: span_attr(cell, "colspan"),
        }
    }

    // Definition lists

    fn definition_list(&mut self, node: &Handle, inherited: &StyleSet) -> DefinitionList {
        let mut entries = Vec::new();
        for child in dom::children(node) {
            if self.skipped(&child) || dom::is_blank_text(&child) {
                continue;
            }
            let content = wrap_all(inherited, self.inlines_or_text(&child));
            match dom::tag(&child) {
                Some("dt") => entries.push(DefinitionEntry::Term(content)),
                _ => entries.push(DefinitionEntry::Description(content)),
            }
        }
        DefinitionList { entries }
    }

    fn inlines_or_text(&mut self, node: &Handle) -> Vec<Inline> {
        if dom::text(node).is_some() {
            let mut out = Vec::new();
            self.inline_node(node, &mut out);
            out
        } else {
            self.inlines(node)
        }
    }
}

/// Turn the flow of one list item into an entry: the first paragraph is the item line.
fn list_entry(flow: Flow, depth: usize, margin: usize, ordered: bool) -> ListEntry {
    let mut blocks = flow.finish().into_iter();
    let mut content = Vec::new();
    let mut rest = Vec::new();
    match blocks.next() {
        Some(Block::Paragraph(paragraph)) => {
            for (i, line) in paragraph.lines.into_iter().enumerate() {
                if i > 0 {
                    content.push(Inline::Break);
                }
                content.extend(line);
            }
        }
        Some(block) => rest.push(block),
        None => {}
    }
    rest.extend(blocks);

    let indent = lists::take_leading_indent(&mut content);
    ListEntry {
        structural_depth: depth,
        indent_level: indent.max(margin),
        ordered,
        content,
        blocks: rest,
    }
}

fn span_attr(cell: &Handle, name: &str) -> usize {
    dom::attr_usize(cell, name).unwrap_or(1).clamp(1, MAX_SPAN)
}

/// Wrap an inline in the style inherited from transparent ancestors.
fn wrap(inherited: &StyleSet, inline: Inline) -> Inline {
    if inherited.is_empty() {
        inline
    } else {
        Inline::styled(inherited.clone(), vec![inline])
    }
}

fn wrap_all(inherited: &StyleSet, inlines: Vec<Inline>) -> Vec<Inline> {
    if inherited.is_empty() {
        inlines
    } else {
        vec![Inline::styled(inherited.clone(), inlines)]
    }
}

fn is_structural(tag: &str) -> bool {
    matches!(
        tag,
        "ul" | "ol" | "li" | "table" | "thead" | "tbody" | "tfoot" | "tr" | "td" | "th" | "dl"
            | "dt" | "dd" | "blockquote" | "pre" | "hr"
    )
}

fn has_block_descendant(node: &Handle) -> bool {
    dom::children(node).iter().any(|child| {
        dom::tag(child).is_some_and(|t| {
            matches!(t, "div" | "p" | "pre") || HEADINGS.contains(&t) || is_structural(t)
        }) || has_block_descendant(child)
    })
}

/// HTML whitespace collapsing. Tabs and non-breaking spaces are kept: they carry indentation.
fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if matches!(c, ' ' | '\n' | '\r' | '\u{c}') {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// Text of a code block: element boundaries become newlines, whitespace is kept.
fn code_text(node: &Handle) -> String {
    let mut out = String::new();
    collect_code(node, &mut out);
    out.replace('\u{a0}', " ").trim_matches('\n').to_string()
}

fn collect_code(node: &Handle, out: &mut String) {
    if let Some(text) = dom::text(node) {
        out.push_str(&text);
        return;
    }
    match dom::tag(node) {
        Some("br") => out.push('\n'),
        Some(t) if matches!(t, "div" | "p" | "li" | "tr") => {
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            for child in dom::children(node) {
                collect_code(&child, out);
            }
            if !out.ends_with('\n') {
                out.push('\n');
            }
        }
        _ => {
            for child in dom::children(node) {
                collect_code(&child, out);
            }
        }
    }
}

fn plain_text(inlines: &[Inline]) -> String {
    let mut out = String::new();
    for inline in inlines {
        match inline {
            Inline::Text(text) | Inline::Verbatim(text) => out.push_str(text),
            Inline::Break => out.push(' '),
            Inline::Image(image) => out.push_str(&image.alt),
            Inline::Styled { children, .. } => out.push_str(&plain_text(children)),
        }
    }
    out
}

fn first_color(inlines: &[Inline]) -> Option<String> {
    inlines.iter().find_map(|inline| match inline {
        Inline::Styled { style, children } => style
            .color()
            .map(str::to_string)
            .or_else(|| first_color(children)),
        _ => None,
    })
}

fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(pos) if pos > 0 => &name[..pos],
        _ => name,
    }
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((pos, _)) => format!("{}…", &text[..pos]),
        None => text.to_string(),
    }
}
