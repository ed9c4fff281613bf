//! Reconstructs list trees from flat list entries.
//!
//! Evernote lists rarely say what they mean. Users indent items by typing spaces or tabs,
//! the editor indents with `margin-left`, and old clients emit `<ul>` directly inside `<ul>`
//! with no `<li>` in between. The lowering therefore does not build lists directly: it
//! collects one [`ListEntry`] per visible item, recording both the depth implied by the
//! markup (`structural_depth`) and the depth implied by the visual indentation
//! (`indent_level`). This module decides the real depth and rebuilds the tree.
//!
//! # The Algorithm
//!
//! 1. Prune entries with no visible content.
//! 2. Resolve each entry's depth with [`resolve_depth`].
//! 3. Clamp the depth to at most one level below the previous entry.
//! 4. Rebuild the tree with a stack of open lists: deeper entries open a new list under the
//!    last item, shallower entries close lists until the stack matches their depth.

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::ir::nodes::{Block, Inline, List, ListItem};

/// Columns per indentation level.
const INDENT_WIDTH: usize = 4;

/// One visible list item, as collected from the DOM.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListEntry {
    /// Nesting depth implied by the list containers around the item (0 = outermost)
    pub structural_depth: usize,
    /// Nesting depth implied by leading whitespace or margins
    pub indent_level: usize,
    pub ordered: bool,
    pub content: Vec<Inline>,
    pub blocks: Vec<Block>,
}

impl ListEntry {
    fn is_empty(&self) -> bool {
        self.blocks.is_empty() && !self.content.iter().any(Inline::has_content)
    }
}

/// The depth chosen for an entry and whether the cues disagreed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDepth {
    pub depth: usize,
    pub ambiguous: bool,
}

/// Decide an item's depth from its structural and indentation cues.
///
/// - no indentation: the markup decides
/// - indentation inside a flat (outermost) list: the indentation decides
/// - both present and disagreeing: the markup decides, flagged as ambiguous
pub fn resolve_depth(structural: usize, indent: usize) -> ResolvedDepth {
    match (structural, indent) {
        (structural, 0) => ResolvedDepth {
            depth: structural,
            ambiguous: false,
        },
        (0, indent) => ResolvedDepth {
            depth: indent,
            ambiguous: false,
        },
        (structural, indent) => ResolvedDepth {
            depth: structural,
            ambiguous: structural != indent,
        },
    }
}

/// Rebuild a list tree from flat entries. Returns `None` when nothing visible remains.
pub fn structure(entries: Vec<ListEntry>, diagnostics: &mut Diagnostics) -> Option<List> {
    let mut stack: Vec<List> = Vec::new();
    let mut previous: Option<usize> = None;

    for entry in entries.into_iter().filter(|entry| !entry.is_empty()) {
        let resolved = resolve_depth(entry.structural_depth, entry.indent_level);
        if resolved.ambiguous {
            diagnostics.push(
                DiagnosticKind::AmbiguousListNesting,
                format!(
                    "item '{}' is nested {} level(s) deep but indented {} level(s)",
                    preview(&entry.content),
                    entry.structural_depth,
                    entry.indent_level
                ),
            );
        }
        let depth = match previous {
            Some(previous) => resolved.depth.min(previous + 1),
            None => 0,
        };
        previous = Some(depth);

        while stack.len() > depth + 1 {
            close_top(&mut stack);
        }
        if stack.len() == depth {
            stack.push(List {
                items: Vec::new(),
                ordered: entry.ordered,
            });
        }
        if let Some(list) = stack.last_mut() {
            list.items.push(ListItem {
                content: entry.content,
                blocks: entry.blocks,
                children: None,
            });
        }
    }

    while stack.len() > 1 {
        close_top(&mut stack);
    }
    stack.pop()
}

/// Pop the innermost open list and attach it under the last item of its parent.
fn close_top(stack: &mut Vec<List>) {
    let Some(child) = stack.pop() else {
        return;
    };
    if let Some(parent) = stack.last_mut() {
        match parent.items.last_mut() {
            Some(item) => match &mut item.children {
                Some(existing) => existing.items.extend(child.items),
                None => item.children = Some(child),
            },
            None => parent.items.push(ListItem {
                children: Some(child),
                ..ListItem::default()
            }),
        }
    }
}

/// Strip the leading whitespace of an item and return the indentation levels it encoded.
///
/// Tabs count four columns, spaces and non-breaking spaces one; every full four columns is a
/// level. Whitespace inside leading styled wrappers counts too.
pub fn take_leading_indent(content: &mut [Inline]) -> usize {
    let mut width = 0;
    strip_leading(content, &mut width);
    width / INDENT_WIDTH
}

/// Returns `true` once visible content is reached.
fn strip_leading(content: &mut [Inline], width: &mut usize) -> bool {
    for inline in content.iter_mut() {
        match inline {
            Inline::Text(text) => {
                let mut consumed = 0;
                for c in text.chars() {
                    match c {
                        '\t' => *width += INDENT_WIDTH,
                        ' ' | '\u{a0}' => *width += 1,
                        _ => break,
                    }
                    consumed += c.len_utf8();
                }
                text.drain(..consumed);
                if !text.is_empty() {
                    return true;
                }
            }
            Inline::Styled { children, .. } => {
                if strip_leading(children, width) {
                    return true;
                }
            }
            Inline::Verbatim(_) | Inline::Image(_) | Inline::Break => return true,
        }
    }
    false
}

fn preview(content: &[Inline]) -> String {
    let mut text = String::new();
    collect_text(content, &mut text);
    let text = text.trim();
    match text.char_indices().nth(30) {
        Some((pos, _)) => format!("{}…", &text[..pos]),
        None => text.to_string(),
    }
}

fn collect_text(content: &[Inline], out: &mut String) {
    for inline in content {
        match inline {
            Inline::Text(text) | Inline::Verbatim(text) => out.push_str(text),
            Inline::Styled { children, .. } => collect_text(children, out),
            Inline::Break => out.push(' '),
            Inline::Image(image) => out.push_str(&image.alt),
        }
    }
}
