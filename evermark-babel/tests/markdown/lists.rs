use crate::common::convert_body;
use evermark_babel::DiagnosticKind;

#[test]
fn test_whitespace_indented_item_nests_under_previous() {
    let converted = convert_body(
        "<ul><li>A</li><li>&nbsp;&nbsp;&nbsp;&nbsp;B</li><li>C</li></ul>",
    );
    assert_eq!(converted.markdown, "- A\n  - B\n- C\n");
    assert!(converted.diagnostics.is_empty());
}

#[test]
fn test_tab_indentation_counts_one_level() {
    let converted = convert_body("<ul><li>A</li><li>\tB</li></ul>");
    assert_eq!(converted.markdown, "- A\n  - B\n");
}

#[test]
fn test_margin_indentation() {
    let converted = convert_body(
        "<ul><li>A</li><li style=\"margin-left: 40px\">B</li><li style=\"margin-left: 80px\">C</li></ul>",
    );
    assert_eq!(converted.markdown, "- A\n  - B\n    - C\n");
}

#[test]
fn test_nested_containers() {
    let converted = convert_body(
        "<ol><li>one</li><li>two<ul><li>sub</li></ul></li><li>three</li></ol>",
    );
    assert_eq!(converted.markdown, "1. one\n1. two\n   - sub\n1. three\n");
}

#[test]
fn test_list_directly_inside_list() {
    let converted = convert_body("<ul><li>A</li><ul><li>B</li></ul><li>C</li></ul>");
    assert_eq!(converted.markdown, "- A\n  - B\n- C\n");
}

#[test]
fn test_depth_jumps_are_clamped() {
    let converted = convert_body(
        "<ul><li>A</li><li>&nbsp;&nbsp;&nbsp;&nbsp;&nbsp;&nbsp;&nbsp;&nbsp;&nbsp;&nbsp;&nbsp;&nbsp;B</li></ul>",
    );
    assert_eq!(converted.markdown, "- A\n  - B\n");
}

#[test]
fn test_disagreeing_cues_are_reported() {
    let converted = convert_body(
        "<ul><li>A<ul><li>&nbsp;&nbsp;&nbsp;&nbsp;&nbsp;&nbsp;&nbsp;&nbsp;B</li></ul></li></ul>",
    );
    assert_eq!(converted.markdown, "- A\n  - B\n");
    assert!(converted
        .diagnostics
        .iter()
        .any(|d| d.kind == DiagnosticKind::AmbiguousListNesting));
}

#[test]
fn test_empty_items_are_dropped() {
    let converted = convert_body("<ul><li>A</li><li><br/></li><li>&nbsp;</li><li>B</li></ul>");
    assert_eq!(converted.markdown, "- A\n- B\n");
}

#[test]
fn test_item_with_multiple_lines_and_a_table() {
    let converted = convert_body(
        "<ul><li><div>first line</div><div>second line</div>\
         <table><tr><td>a</td><td>b</td></tr><tr><td>c</td><td>d</td></tr></table></li></ul>",
    );
    assert_eq!(
        converted.markdown,
        "- first line\\\n  second line\n\n  | a | b |\n  | --- | --- |\n  | c | d |\n"
    );
}
