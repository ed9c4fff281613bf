use crate::common::{convert_body, fixture};
use evermark_babel::frontmatter::{self, Metadata};
use evermark_babel::{convert_html, Note, RenderOptions};

#[test]
fn test_frontmatter_round_trip() {
    let html = fixture("Kitchen Sink.html");
    let note = Note::parse("Kitchen Sink.html", &html).unwrap();
    let converted = convert_html("Kitchen Sink.html", &html, &RenderOptions::default()).unwrap();

    let metadata = frontmatter::read(&converted.markdown)
        .expect("frontmatter parses")
        .expect("frontmatter present");
    assert_eq!(metadata, note.metadata);
    assert_eq!(
        metadata,
        Metadata {
            title: Some("Kitchen Sink".to_string()),
            updated: Some("2021-03-05 18:30:00Z".to_string()),
            created: Some("2021-03-04 09:15:00Z".to_string()),
            tags: vec!["demo".to_string()],
            ..Metadata::default()
        }
    );
    assert!(converted.markdown.starts_with("---\ntitle: Kitchen Sink\n"));
}

#[test]
fn test_frontmatter_can_be_disabled() {
    let converted = convert_body("<h1>Title</h1><div>Body</div>");
    assert_eq!(converted.markdown, "Body\n");
}

#[test]
fn test_note_without_metadata_has_no_frontmatter() {
    let converted = convert_html(
        "Bare.html",
        "<html><body><div>Body</div></body></html>",
        &RenderOptions::default(),
    )
    .unwrap();
    assert_eq!(converted.markdown, "Body\n");
}
