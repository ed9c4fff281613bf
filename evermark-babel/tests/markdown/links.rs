use crate::common::{body_options, convert_body, convert_body_with, convert_corpus, page};
use evermark_babel::common::links::Resolution;
use evermark_babel::formats::markdown::{ImageRendering, InternalLinkStyle, MediaEmbedding};
use evermark_babel::{DiagnosticKind, NoteId, RenderOptions};

const GUID_LINK: &str = "evernote:///view/1234/s1/0a1b2c3d-guid/0a1b2c3d-guid/";

#[test]
fn test_unresolved_internal_link_is_kept_verbatim() {
    let converted = convert_body(&format!(
        "<div>See <a href=\"{GUID_LINK}\" style=\"color:#69aa35\">Lost Note</a></div>"
    ));

    assert_eq!(converted.markdown, format!("See [Lost Note]({GUID_LINK})\n"));
    let unresolved: Vec<_> = converted
        .diagnostics
        .iter()
        .filter(|d| d.kind == DiagnosticKind::UnresolvedInternalLink)
        .collect();
    assert_eq!(unresolved.len(), 1);
    assert!(unresolved[0].detail.contains("Lost Note"));
    assert_eq!(converted.unresolved_links().count(), 1);
}

#[test]
fn test_guid_link_resolves_by_title() {
    let groceries = page("<h1>Groceries</h1><div>Milk</div>");
    let plan = page(&format!(
        "<h1>Plan</h1><div>Buy <a href=\"{GUID_LINK}\">Groceries</a></div>"
    ));
    let converted = convert_corpus(
        &[("Groceries.html", &groceries), ("Plan.html", &plan)],
        &body_options(),
    );

    assert_eq!(converted[1].markdown, "Buy [[Groceries]]\n");
    assert_eq!(converted[1].linked_notes(), vec![&NoteId::from("Groceries")]);
    assert!(converted[1].diagnostics.is_empty());
}

#[test]
fn test_markdown_link_style() {
    let target = page("<h1>Trip Plan</h1><div>Day one</div>");
    let source = page("<div>Read <a href=\"Trip%20Plan.html\">the plan</a></div>");
    let options = RenderOptions {
        internal_link_style: InternalLinkStyle::Markdown,
        ..body_options()
    };
    let converted = convert_corpus(
        &[("Trip Plan.html", &target), ("Index.html", &source)],
        &options,
    );
    assert_eq!(converted[1].markdown, "Read [the plan](Trip%20Plan.md)\n");
}

#[test]
fn test_formatted_label_falls_back_to_markdown_link() {
    let target = page("<div>x</div>");
    let source = page("<div><a href=\"Target.html\"><b>bold</b> label</a></div>");
    let converted = convert_corpus(
        &[("Target.html", &target), ("Source.html", &source)],
        &body_options(),
    );
    assert_eq!(converted[1].markdown, "[**bold** label](Target.md)\n");
}

#[test]
fn test_external_and_autolinks() {
    let converted = convert_body(
        "<div><a href=\"https://example.com/docs\">the docs</a> or \
         <a href=\"https://example.com\">https://example.com</a></div>",
    );
    assert_eq!(
        converted.markdown,
        "[the docs](https://example.com/docs) or https://example.com\n"
    );
    assert_eq!(converted.links[0].target.resolution, Resolution::External);
}

#[test]
fn test_anchor_and_empty_links() {
    let converted = convert_body(
        "<div><a href=\"#top\">top</a> <a name=\"x\">here</a> <a href=\"https:\">nowhere</a></div>",
    );
    assert_eq!(converted.markdown, "top here nowhere\n");
    assert!(converted.links.is_empty());
    let kinds: Vec<DiagnosticKind> = converted.diagnostics.iter().map(|d| d.kind).collect();
    assert_eq!(kinds, vec![DiagnosticKind::EmptyLink]);
}

#[test]
fn test_attachment_links_follow_media_embedding() {
    let body = "<div><a href=\"Note_files/Q3%20report.pdf\"><img src=\"Note_files/preview.png\"></a></div>";

    let converted = convert_body(body);
    assert_eq!(
        converted.resources,
        vec!["Note_files/preview.png", "Note_files/Q3 report.pdf"]
    );

    let preview = RenderOptions {
        media_embedding: MediaEmbedding::AutoPreviewLink,
        ..body_options()
    };
    assert_eq!(
        convert_body_with(body, &preview).markdown,
        "[Q3 report.pdf](Note_files/Q3%20report.pdf)\n"
    );

    let transclusion = RenderOptions {
        media_embedding: MediaEmbedding::NativeTransclusion,
        ..body_options()
    };
    assert_eq!(
        convert_body_with(body, &transclusion).markdown,
        "![[Note_files/Q3 report.pdf]]\n"
    );
}

#[test]
fn test_image_rendering_modes() {
    let body = "<div><img src=\"Note_files/photo.jpg\" alt=\"Beach [1]\" width=\"640\" height=\"480\"></div>";

    assert_eq!(
        convert_body(body).markdown,
        "<img src=\"Note_files/photo.jpg\" alt=\"Beach 1\" width=\"640\" height=\"480\">\n"
    );

    let markdown = RenderOptions {
        image_rendering: ImageRendering::MarkdownImageSyntax,
        ..body_options()
    };
    assert_eq!(
        convert_body_with(body, &markdown).markdown,
        "![Beach 1|640x480](Note_files/photo.jpg)\n"
    );

    let transclusion = RenderOptions {
        image_rendering: ImageRendering::NativeTransclusion,
        ..body_options()
    };
    assert_eq!(
        convert_body_with(body, &transclusion).markdown,
        "![[Note_files/photo.jpg|640]]\n"
    );
}

#[test]
fn test_external_images_are_reported() {
    let converted = convert_body("<div><img src=\"https://example.com/cat.gif\"></div>");
    assert_eq!(
        converted.markdown,
        "<img src=\"https://example.com/cat.gif\" alt=\"cat\">\n"
    );
    assert!(converted.resources.is_empty());
    assert!(converted
        .diagnostics
        .iter()
        .any(|d| d.kind == DiagnosticKind::ExternalMediaReference));
}
