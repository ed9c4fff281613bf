//! Format span merging.
//!
//! WYSIWYG editing leaves notes full of redundant wrappers: `<b><i>x</i></b><i><b>y</b></i>`,
//! five nested spans that all say "bold", a bold run interrupted by a superscript. Rendered
//! naively each wrapper becomes its own `**…**`, which Markdown parsers then misread.
//!
//! # The Algorithm
//!
//! 1. **Flatten**: walk the inline tree threading the inherited [`StyleSet`] explicitly
//!    (never a shared "current style"); every leaf comes out with its full effective set.
//! 2. **Split lines**: hard breaks cut the leaf sequence into lines, merged independently.
//! 3. **Coalesce**: an unstyled whitespace gap takes the attributes its two neighbours
//!    share, then adjacent leaves with identical sets are concatenated.
//! 4. **Hoist**: the attributes shared by *all* leaves of a run are promoted to one enclosing
//!    span and stripped from the leaves, which keep only their differential attributes.
//! 5. **Group**: when nothing is shared by the whole run, maximal consecutive runs that do
//!    share something are grouped and hoisted recursively.
//!
//! Step 5 generalizes the classic one-level merge (superscript inside bold) to any depth:
//! `bold`, `bold+sup`, `bold` renders `**a<sup>b</sup>c**`, and a bold run split by an
//! italic word still renders as one bold span.

use crate::common::style::StyleSet;
use crate::ir::nodes::{Image, Inline};

/// A run of inline content sharing one canonical attribute set.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatSpan {
    pub style: StyleSet,
    pub content: SpanContent,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SpanContent {
    Text(String),
    Verbatim(String),
    Image(Image),
    Spans(Vec<FormatSpan>),
}

/// A flattened leaf with its full effective style.
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
    pub kind: LeafKind,
    pub style: StyleSet,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LeafKind {
    Text(String),
    Verbatim(String),
    Image(Image),
    Break,
}

/// Flatten an inline tree into styled leaves.
pub fn flatten(inlines: &[Inline], inherited: &StyleSet) -> Vec<Leaf> {
    let mut leaves = Vec::new();
    flatten_into(inlines, inherited, &mut leaves);
    leaves
}

fn flatten_into(inlines: &[Inline], inherited: &StyleSet, leaves: &mut Vec<Leaf>) {
    for inline in inlines {
        let kind = match inline {
            Inline::Text(text) if text.is_empty() => continue,
            Inline::Text(text) => LeafKind::Text(text.clone()),
            Inline::Verbatim(text) => LeafKind::Verbatim(text.clone()),
            Inline::Image(image) => LeafKind::Image(image.clone()),
            Inline::Break => LeafKind::Break,
            Inline::Styled { style, children } => {
                flatten_into(children, &inherited.inherit(style), leaves);
                continue;
            }
        };
        leaves.push(Leaf {
            kind,
            style: inherited.clone(),
        });
    }
}

/// Merge inline content into spans, one vector per line.
pub fn merge_lines(inlines: &[Inline]) -> Vec<Vec<FormatSpan>> {
    let mut lines = Vec::new();
    let mut current = Vec::new();
    for leaf in flatten(inlines, &StyleSet::new()) {
        if leaf.kind == LeafKind::Break {
            lines.push(merge(std::mem::take(&mut current)));
        } else {
            current.push(leaf);
        }
    }
    lines.push(merge(current));
    lines
}

/// Merge inline content that must stay on one line; hard breaks become spaces.
pub fn merge_inline(inlines: &[Inline]) -> Vec<FormatSpan> {
    let leaves = flatten(inlines, &StyleSet::new())
        .into_iter()
        .map(|leaf| match leaf.kind {
            LeafKind::Break => Leaf {
                kind: LeafKind::Text(" ".to_string()),
                style: leaf.style,
            },
            _ => leaf,
        })
        .collect();
    merge(leaves)
}

/// Merge a sequence of leaves (without breaks) into maximal spans.
pub fn merge(leaves: Vec<Leaf>) -> Vec<FormatSpan> {
    let leaves = coalesce(fold_gaps(leaves));
    if leaves.len() <= 1 {
        return leaves.into_iter().map(leaf_span).collect();
    }

    let (shared, rest) = hoist(&leaves);
    if !shared.is_empty() {
        return vec![FormatSpan {
            style: shared,
            content: SpanContent::Spans(merge(rest)),
        }];
    }

    let mut spans = Vec::new();
    let mut start = 0;
    while start < leaves.len() {
        let mut common = leaves[start].style.clone();
        let mut end = start + 1;
        while end < leaves.len() {
            let next = common.intersection(&leaves[end].style);
            if next.is_empty() {
                break;
            }
            common = next;
            end += 1;
        }

        if end - start == 1 {
            spans.push(leaf_span(leaves[start].clone()));
        } else {
            spans.extend(merge(leaves[start..end].to_vec()));
        }
        start = end;
    }
    spans
}

/// Split off the attributes shared by every leaf. Returns the shared set and the leaves
/// stripped down to their differential attributes.
pub fn hoist(leaves: &[Leaf]) -> (StyleSet, Vec<Leaf>) {
    let Some((first, others)) = leaves.split_first() else {
        return (StyleSet::new(), Vec::new());
    };
    let shared = others
        .iter()
        .fold(first.style.clone(), |acc, leaf| acc.intersection(&leaf.style));

    let rest = leaves
        .iter()
        .map(|leaf| Leaf {
            kind: leaf.kind.clone(),
            style: leaf.style.difference(&shared),
        })
        .collect();
    (shared, rest)
}

/// Give each unstyled whitespace-only text leaf the attributes shared by its neighbours, so
/// `<b>a</b> <b>b</b>` stays one bold run.
fn fold_gaps(mut leaves: Vec<Leaf>) -> Vec<Leaf> {
    for i in 1..leaves.len().saturating_sub(1) {
        let is_gap = leaves[i].style.is_empty()
            && matches!(&leaves[i].kind, LeafKind::Text(t) if t.chars().all(char::is_whitespace));
        if is_gap {
            leaves[i].style = leaves[i - 1].style.intersection(&leaves[i + 1].style);
        }
    }
    leaves
}

/// Concatenate adjacent text leaves that carry identical sets.
fn coalesce(leaves: Vec<Leaf>) -> Vec<Leaf> {
    let mut out: Vec<Leaf> = Vec::with_capacity(leaves.len());
    for leaf in leaves {
        if let Some(last) = out.last_mut() {
            if last.style == leaf.style {
                match (&mut last.kind, &leaf.kind) {
                    (LeafKind::Text(a), LeafKind::Text(b))
                    | (LeafKind::Verbatim(a), LeafKind::Verbatim(b)) => {
                        a.push_str(b);
                        continue;
                    }
                    _ => {}
                }
            }
        }
        out.push(leaf);
    }
    out
}

fn leaf_span(leaf: Leaf) -> FormatSpan {
    let content = match leaf.kind {
        LeafKind::Text(text) => SpanContent::Text(text),
        LeafKind::Verbatim(text) => SpanContent::Verbatim(text),
        LeafKind::Image(image) => SpanContent::Image(image),
        LeafKind::Break => SpanContent::Text(" ".to_string()),
    };
    FormatSpan {
        style: leaf.style,
        content,
    }
}
