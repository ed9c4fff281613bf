use crate::common::{body_options, convert_body, convert_body_with, convert_corpus, fixture};
use evermark_babel::formats::markdown::{DefinitionListStyle, LineBreak};
use evermark_babel::{DiagnosticKind, RenderOptions};
use insta::assert_snapshot;

#[test]
fn test_kitchensink() {
    let sink = fixture("Kitchen Sink.html");
    let other = fixture("Other Note.html");
    let converted = convert_corpus(
        &[("Kitchen Sink.html", &sink), ("Other Note.html", &other)],
        &body_options(),
    );

    assert!(converted[0].diagnostics.is_empty(), "{:?}", converted[0].diagnostics);
    assert_eq!(converted[0].notebook.as_deref(), Some("Work/Projects"));
    assert_snapshot!(converted[0].markdown.trim_end(), @r###"
    Plain text with a **bold** word and *italic* one.

    ## Section

    **Bold run <sup>2</sup> continues**

    - First
    - Second

    ```bash
    ls -la
    cd ..
    ```

    Price: \$5 \* 2\_000\
    See [[Other Note]].
    "###);

    assert_eq!(
        converted[1].markdown,
        "Back to [[Kitchen Sink|the sink]].\\\n\
         <img src=\"Other%20Note_files/chart.png\" alt=\"chart\" width=\"320\">\n"
    );
    assert_eq!(converted[1].resources, vec!["Other Note_files/chart.png"]);
}

#[test]
fn test_adjacent_bold_italic_wrappers_merge_into_one_run() {
    let converted = convert_body("<div><b><i>text</i></b><i><b>text</b></i></div>");
    assert_eq!(converted.markdown, "***texttext***\n");
}

#[test]
fn test_nested_redundant_spans_collapse() {
    let converted = convert_body(
        "<div><span style=\"font-weight: bold\"><b><strong>loud</strong></b></span> \
         and <b>loud</b><b> again</b></div>",
    );
    assert_eq!(converted.markdown, "**loud** and **loud again**\n");
}

#[test]
fn test_monospace_font_becomes_code() {
    let converted = convert_body(
        "<div>Run <span style=\"font-family: 'Courier New', monospace\">make_all</span> now</div>",
    );
    assert_eq!(converted.markdown, "Run `make_all` now\n");
}

#[test]
fn test_paragraphs_and_line_breaks() {
    let body = "<div>one</div><div>two</div><div><br/></div><div>three</div>";
    assert_eq!(convert_body(body).markdown, "one\\\ntwo\n\nthree\n");

    let options = RenderOptions {
        line_break: LineBreak::Html,
        ..body_options()
    };
    assert_eq!(
        convert_body_with(body, &options).markdown,
        "one<br>\ntwo\n\nthree\n"
    );
}

#[test]
fn test_leading_non_breaking_spaces_survive() {
    let converted = convert_body("<div>&nbsp;&nbsp;indented&nbsp;text</div>");
    assert_eq!(converted.markdown, "&nbsp;&nbsp;indented text\n");
}

#[test]
fn test_definition_lists() {
    let body = "<dl><dt>Apple</dt><dd>A fruit</dd><dt>Rust</dt><dd>A language</dd></dl>";
    let converted = convert_body(body);
    assert_eq!(converted.markdown, "Apple\n: A fruit\n\nRust\n: A language\n");

    let options = RenderOptions {
        definition_list_style: DefinitionListStyle::RawMarkup,
        ..body_options()
    };
    assert_eq!(
        convert_body_with(body, &options).markdown,
        "<dl><dt>Apple</dt><dd>A fruit</dd><dt>Rust</dt><dd>A language</dd></dl>\n"
    );
}

#[test]
fn test_definition_list_without_term_falls_back_to_markup() {
    let converted = convert_body("<dl><dd>orphan</dd><dt>Term</dt><dd>def</dd></dl>");
    assert_eq!(
        converted.markdown,
        "<dl><dd>orphan</dd><dt>Term</dt><dd>def</dd></dl>\n"
    );
    assert!(converted
        .diagnostics
        .iter()
        .any(|d| d.kind == DiagnosticKind::NonstandardDefinitionList));
}

#[test]
fn test_quotes_rules_and_headings() {
    let converted = convert_body(
        "<h3>Notes</h3><blockquote><div>quoted</div></blockquote><hr/><div>after</div>",
    );
    assert_eq!(converted.markdown, "### Notes\n\n> quoted\n\n---\n\nafter\n");
}

#[test]
fn test_pre_blocks_have_no_language() {
    let converted = convert_body("<pre>let x = 1;\nlet y = 2;</pre>");
    assert_eq!(converted.markdown, "```\nlet x = 1;\nlet y = 2;\n```\n");
}

#[test]
fn test_unknown_style_is_reported() {
    let converted =
        convert_body("<div><span style=\"font-family: 'Comic Sans Deluxe'\">fun</span></div>");
    assert_eq!(converted.markdown, "fun\n");
    assert!(converted
        .diagnostics
        .iter()
        .any(|d| d.kind == DiagnosticKind::UnmappedStyleAttribute));
}
