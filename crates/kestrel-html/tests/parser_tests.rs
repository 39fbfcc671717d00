//! Tree construction tests.

use kestrel_dom::{DomTree, NodeId};
use kestrel_html::parse_document;

/// Tag names of the element children of `id`.
fn child_tags(tree: &DomTree, id: NodeId) -> Vec<String> {
    tree.children(id)
        .filter_map(|c| tree.element(c).map(|e| e.name.clone()))
        .collect()
}

fn element(tree: &DomTree, tag: &str) -> NodeId {
    tree.find_element(tag)
        .unwrap_or_else(|| panic!("no <{tag}> in tree"))
}

#[test]
fn test_implied_html_head_body() {
    let tree = parse_document("Hello");
    let html = tree.document_element().unwrap();
    assert_eq!(child_tags(&tree, html), vec!["head", "body"]);
    let body = element(&tree, "body");
    assert_eq!(tree.text_content(body), "Hello");
}

#[test]
fn test_empty_input_still_has_body() {
    let tree = parse_document("");
    assert!(tree.find_element("body").is_some());
}

#[test]
fn test_head_elements_routed_to_head() {
    let tree = parse_document(
        "<title>T</title><link rel=stylesheet href=a.css><style>p{}</style><p>x</p>",
    );
    let head = element(&tree, "head");
    assert_eq!(child_tags(&tree, head), vec!["title", "link", "style"]);
    let body = element(&tree, "body");
    assert_eq!(child_tags(&tree, body), vec!["p"]);
}

#[test]
fn test_p_closed_by_block() {
    let tree = parse_document("<body><p>one<div>two</div>");
    let body = element(&tree, "body");
    assert_eq!(child_tags(&tree, body), vec!["p", "div"]);
}

#[test]
fn test_list_items_are_siblings() {
    let tree = parse_document("<ul><li>a<li>b<li>c</ul>");
    let ul = element(&tree, "ul");
    assert_eq!(child_tags(&tree, ul), vec!["li", "li", "li"]);
}

#[test]
fn test_table_cells_implied_end() {
    let tree = parse_document("<table><tr><td>1<td>2<tr><td>3</table>");
    let table = element(&tree, "table");
    assert_eq!(child_tags(&tree, table), vec!["tr", "tr"]);
    let first_row = tree.children(table).next().unwrap();
    assert_eq!(child_tags(&tree, first_row), vec!["td", "td"]);
}

#[test]
fn test_void_elements_do_not_nest() {
    let tree = parse_document("<p>a<br>b<img src=x.png>c</p>");
    let p = element(&tree, "p");
    assert_eq!(child_tags(&tree, p), vec!["br", "img"]);
    assert_eq!(tree.text_content(p), "abc");
}

#[test]
fn test_body_attributes_kept() {
    let tree = parse_document(r#"<html><body class="main" style="color: red"><p>x"#);
    let body = tree.element(element(&tree, "body")).unwrap();
    assert_eq!(body.class_attr(), Some("main"));
    assert_eq!(body.attr("style"), Some("color: red"));
}

#[test]
fn test_unmatched_end_tag_ignored() {
    let tree = parse_document("<div>a</span>b</div>");
    let div = element(&tree, "div");
    assert_eq!(tree.text_content(div), "ab");
}
