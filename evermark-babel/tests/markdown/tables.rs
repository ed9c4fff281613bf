use crate::common::convert_body;
use comrak::nodes::NodeValue;
use comrak::{parse_document, Arena, ComrakOptions};
use insta::assert_snapshot;

/// Whether the whole output parses as exactly one GFM table.
fn is_single_gfm_table(markdown: &str) -> bool {
    let arena = Arena::new();
    let mut options = ComrakOptions::default();
    options.extension.table = true;
    let root = parse_document(&arena, markdown, &options);
    let children: Vec<_> = root.children().collect();
    children.len() == 1 && matches!(children[0].data.borrow().value, NodeValue::Table(_))
}

#[test]
fn test_row_span_occupies_first_column() {
    let converted = convert_body(
        "<table><tr><td rowspan=\"2\">A</td><td>B</td></tr><tr><td>C</td></tr></table>",
    );
    assert_eq!(converted.markdown, "| A | B |\n| --- | --- |\n| ^ | C |\n");
    assert!(is_single_gfm_table(&converted.markdown));
}

#[test]
fn test_col_span_and_alignment() {
    let converted = convert_body(
        "<table>\
         <thead><tr><th align=\"center\">Item</th><th style=\"text-align: right\">Qty</th><th>Note</th></tr></thead>\
         <tbody><tr><td colspan=\"2\">Flour | sifted</td><td>fresh</td></tr>\
         <tr><td>Eggs</td><td>3</td></tr></tbody></table>",
    );
    assert_snapshot!(converted.markdown.trim_end(), @r###"
    | Item | Qty | Note |
    | :---: | ---: | --- |
    | Flour \| sifted || fresh |
    | Eggs | 3 | |
    "###);
    assert!(is_single_gfm_table(&converted.markdown));
}

#[test]
fn test_cell_lines_become_br() {
    let converted = convert_body(
        "<table><tr><td><div>one</div><div>two</div></td><td><b>bold</b></td></tr>\
         <tr><td>x</td><td>y</td></tr></table>",
    );
    assert_eq!(
        converted.markdown,
        "| one<br>two | **bold** |\n| --- | --- |\n| x | y |\n"
    );
}

#[test]
fn test_single_cell_table_is_unwrapped() {
    let converted = convert_body(
        "<table><tr><td><div>Boxed</div><div>content</div></td></tr></table><div>after</div>",
    );
    assert_eq!(converted.markdown, "Boxed\\\ncontent\n\nafter\n");
}
