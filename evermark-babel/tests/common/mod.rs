//! Shared helpers: fixture loading and one-call conversions.

use evermark_babel::{convert_html, index_notes, ConvertedNote, Converter, Note, RenderOptions};
use std::fs;
use std::path::PathBuf;

pub fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {e}", path.display()))
}

/// Wrap a note body in the page skeleton of an export.
pub fn page(body: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"UTF-8\"><title>Note</title></head>\
         <body>{body}</body></html>"
    )
}

/// Default options without the frontmatter block.
pub fn body_options() -> RenderOptions {
    RenderOptions {
        frontmatter: false,
        ..RenderOptions::default()
    }
}

/// Convert a single body with [`body_options`].
pub fn convert_body(body: &str) -> ConvertedNote {
    convert_body_with(body, &body_options())
}

pub fn convert_body_with(body: &str, options: &RenderOptions) -> ConvertedNote {
    convert_html("Note.html", &page(body), options).expect("Failed to convert note")
}

/// Convert several notes against a shared index, in the given order.
pub fn convert_corpus(files: &[(&str, &str)], options: &RenderOptions) -> Vec<ConvertedNote> {
    let notes: Vec<Note> = files
        .iter()
        .map(|(file_name, html)| Note::parse(file_name, html).expect("Failed to parse note"))
        .collect();
    let index = index_notes(&notes);
    let converter = Converter::new(options, &index);
    notes
        .iter()
        .map(|note| converter.convert(note).expect("Failed to convert note"))
        .collect()
}
