//! Small read-only helpers over the `markup5ever_rcdom` tree.

use crate::error::ConvertError;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use std::rc::Rc;

/// Parse an HTML document. A leading byte order mark is ignored.
pub fn parse_html(html: &str) -> Result<RcDom, ConvertError> {
    let html = html.trim_start_matches('\u{feff}');
    parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut html.as_bytes())
        .map_err(|e| ConvertError::ParseError(e.to_string()))
}

/// Local name of an element, `None` for any other node.
pub fn tag(handle: &Handle) -> Option<&str> {
    match &handle.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

pub fn is_tag(handle: &Handle, names: &[&str]) -> bool {
    tag(handle).is_some_and(|t| names.contains(&t))
}

/// Attribute value of an element.
pub fn attr(handle: &Handle, name: &str) -> Option<String> {
    match &handle.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|a| a.name.local.as_ref() == name)
            .map(|a| a.value.to_string()),
        _ => None,
    }
}

/// Numeric attribute such as `rowspan`; absent or unparsable values give `None`.
pub fn attr_usize(handle: &Handle, name: &str) -> Option<usize> {
    attr(handle, name).and_then(|v| v.trim().parse().ok())
}

pub fn children(handle: &Handle) -> Vec<Handle> {
    handle.children.borrow().iter().cloned().collect()
}

/// Text of a text node.
pub fn text(handle: &Handle) -> Option<String> {
    match &handle.data {
        NodeData::Text { contents } => Some(contents.borrow().to_string()),
        _ => None,
    }
}

/// Concatenated text of all descendants.
pub fn text_content(handle: &Handle) -> String {
    let mut out = String::new();
    collect_text(handle, &mut out);
    out
}

fn collect_text(handle: &Handle, out: &mut String) {
    if let Some(text) = text(handle) {
        out.push_str(&text);
    }
    for child in handle.children.borrow().iter() {
        collect_text(child, out);
    }
}

/// First descendant (document order) with the given tag.
pub fn find_first(handle: &Handle, name: &str) -> Option<Handle> {
    find_all(handle, name).into_iter().next()
}

/// All descendants (document order) with the given tag.
pub fn find_all(handle: &Handle, name: &str) -> Vec<Handle> {
    let mut found = Vec::new();
    collect_tagged(handle, name, &mut found);
    found
}

fn collect_tagged(handle: &Handle, name: &str, found: &mut Vec<Handle>) {
    for child in handle.children.borrow().iter() {
        if tag(child) == Some(name) {
            found.push(child.clone());
        }
        collect_tagged(child, name, found);
    }
}

pub fn same_node(a: &Handle, b: &Handle) -> bool {
    Rc::ptr_eq(a, b)
}

/// Whether the text node is only whitespace (non-breaking spaces are content).
pub fn is_blank_text(handle: &Handle) -> bool {
    text(handle).is_some_and(|t| t.chars().all(|c| c.is_ascii_whitespace()))
}
