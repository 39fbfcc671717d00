//! Integration tests for box tree construction.

use kestrel_css::layout::FloatSide;
use kestrel_css::style::FontWeight;
use kestrel_css::{BoxId, BoxKind, BoxTree, Colour, build_box_tree, ua_stylesheet};
use kestrel_html::parse_document;

fn build(html: &str) -> BoxTree {
    let dom = parse_document(html);
    build_box_tree(&dom, ua_stylesheet()).unwrap()
}

/// The body's block box.
fn body(tree: &BoxTree) -> BoxId {
    let children = tree.children(BoxTree::ROOT);
    assert_eq!(children.len(), 1, "head generates no box");
    children[0]
}

fn kinds(tree: &BoxTree, id: BoxId) -> Vec<BoxKind> {
    tree.children(id).iter().map(|&c| tree[c].kind).collect()
}

fn texts(tree: &BoxTree, id: BoxId) -> Vec<&str> {
    tree.children(id).iter().map(|&c| tree.text(c)).collect()
}

#[test]
fn test_inline_runs_share_one_container() {
    let tree = build("<p>Hello <b>big</b>   world</p>");
    let p = tree.children(body(&tree))[0];
    assert_eq!(kinds(&tree, p), vec![BoxKind::InlineContainer]);
    let line = tree.children(p)[0];
    assert_eq!(texts(&tree, line), vec!["Hello ", "big", " world"]);
    let bold = tree.children(line)[1];
    assert_eq!(tree[bold].style.font_weight, FontWeight::Bold);
}

#[test]
fn test_block_sibling_closes_container() {
    let tree = build("<div>a<p>b</p>c</div>");
    let div = tree.children(body(&tree))[0];
    assert_eq!(
        kinds(&tree, div),
        vec![BoxKind::InlineContainer, BoxKind::Block, BoxKind::InlineContainer]
    );
    let after = tree.children(div)[2];
    assert_eq!(texts(&tree, after), vec!["c"]);
}

#[test]
fn test_whitespace_between_blocks_makes_no_container() {
    let tree = build("<div>\n  <p>x</p>\n  <p>y</p>\n</div>");
    let div = tree.children(body(&tree))[0];
    assert_eq!(kinds(&tree, div), vec![BoxKind::Block, BoxKind::Block]);
}

#[test]
fn test_display_none_skips_subtree() {
    let tree = build(r#"<div style="display: none"><p>hidden</p></div><p>shown</p>"#);
    let b = body(&tree);
    assert_eq!(kinds(&tree, b), vec![BoxKind::Block]);
    assert!(!tree.text_buffer().contains("hidden"));
}

#[test]
fn test_style_attribute_beats_rules() {
    let dom = parse_document(r#"<p id="x" style="color: #00f">t</p>"#);
    let mut sheet = ua_stylesheet().clone();
    sheet.add_css("#x { color: red }");
    let tree = build_box_tree(&dom, &sheet).unwrap();
    let p = tree.children(body(&tree))[0];
    assert_eq!(tree[p].style.color, Colour::rgb(0, 0, 255));
}

#[test]
fn test_float_wraps_block_in_line() {
    let tree = build(r#"<div><span style="float: right">f</span>text</div>"#);
    let div = tree.children(body(&tree))[0];
    let line = tree.children(div)[0];
    assert_eq!(
        kinds(&tree, line),
        vec![BoxKind::Float(FloatSide::Right), BoxKind::Inline]
    );
    let float = tree.children(line)[0];
    assert_eq!(kinds(&tree, float), vec![BoxKind::Block]);
    let inner = tree.children(float)[0];
    assert_eq!(kinds(&tree, inner), vec![BoxKind::InlineContainer]);
}

#[test]
fn test_line_break_starts_new_container() {
    let tree = build("<p>one<br>two</p>");
    let p = tree.children(body(&tree))[0];
    assert_eq!(
        kinds(&tree, p),
        vec![BoxKind::InlineContainer, BoxKind::InlineContainer]
    );
}

#[test]
fn test_image_is_replaced_leaf() {
    let tree = build(r#"<p><img src="a.png" width="40" height="30"></p>"#);
    let p = tree.children(body(&tree))[0];
    let line = tree.children(p)[0];
    let img = tree.children(line)[0];
    assert_eq!(tree[img].kind, BoxKind::Inline);
    assert_eq!(tree[img].replaced, Some((40, 30)));
}

#[test]
fn test_table_structure() {
    let tree = build("<table><tr><td>a</td><td>b</td></tr><tr><td>c</td></tr></table>");
    let table = tree.children(body(&tree))[0];
    assert_eq!(tree[table].kind, BoxKind::Table);
    assert_eq!(kinds(&tree, table), vec![BoxKind::TableRow, BoxKind::TableRow]);
    let first = tree.children(table)[0];
    assert_eq!(kinds(&tree, first), vec![BoxKind::TableCell, BoxKind::TableCell]);
}

#[test]
fn test_stray_cells_get_anonymous_table_and_row() {
    let tree = build(
        r#"<div style="display: table-cell">a</div><div style="display: table-cell">b</div>"#,
    );
    let b = body(&tree);
    assert_eq!(kinds(&tree, b), vec![BoxKind::Table]);
    let table = tree.children(b)[0];
    assert!(tree[table].node.is_none());
    assert_eq!(kinds(&tree, table), vec![BoxKind::TableRow]);
    let row = tree.children(table)[0];
    assert_eq!(kinds(&tree, row), vec![BoxKind::TableCell, BoxKind::TableCell]);
}

#[test]
fn test_text_directly_in_row_gets_anonymous_cell() {
    let tree = build(r#"<div style="display: table-row">loose</div>"#);
    let table = tree.children(body(&tree))[0];
    let row = tree.children(table)[0];
    assert_eq!(tree[row].kind, BoxKind::TableRow);
    assert_eq!(kinds(&tree, row), vec![BoxKind::TableCell]);
}
