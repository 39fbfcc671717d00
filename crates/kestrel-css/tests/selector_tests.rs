//! Integration tests for selector chains and specificity.

use kestrel_css::parser::parse_selector_group;
use kestrel_css::selector::match_chain;
use kestrel_css::{Selector, Specificity};

#[test]
fn test_descendant_chain_skips_unmatched_ancestors() {
    let rule = vec![Selector::tag("div"), Selector::tag("em")];
    let q = vec![
        Selector::tag("html"),
        Selector::tag("body"),
        Selector::tag("div"),
        Selector::tag("p"),
        Selector::tag("em"),
    ];
    assert_eq!(match_chain(&rule, &q), Some(Specificity::new(0, 0, 2)));
}

#[test]
fn test_chain_requires_innermost_match() {
    let rule = vec![Selector::tag("div"), Selector::tag("em")];
    let q = vec![Selector::tag("div"), Selector::tag("em"), Selector::tag("b")];
    assert_eq!(match_chain(&rule, &q), None);
}

#[test]
fn test_chain_longer_than_query_never_matches() {
    let rule = vec![Selector::tag("div"), Selector::tag("div"), Selector::tag("p")];
    let q = vec![Selector::tag("div"), Selector::tag("p")];
    assert_eq!(match_chain(&rule, &q), None);
}

#[test]
fn test_ancestors_are_matched_in_order() {
    // The outer selector may match any ancestor of the subject.
    let rule = vec![Selector::tag("ul"), Selector::tag("li")];
    let q = vec![Selector::tag("li"), Selector::tag("ul"), Selector::tag("li")];
    assert!(match_chain(&rule, &q).is_some());
    let q = vec![Selector::tag("ol"), Selector::tag("li")];
    assert!(match_chain(&rule, &q).is_none());
}

#[test]
fn test_class_and_id_scores_add_up() {
    let rule = vec![
        Selector::default().with_id("nav"),
        Selector::tag("a").with_class("current"),
    ];
    let q = vec![
        Selector::tag("div").with_id("nav"),
        Selector::tag("a").with_class("link current"),
    ];
    assert_eq!(match_chain(&rule, &q), Some(Specificity::new(1, 1, 1)));
}

#[test]
fn test_selector_group_parsing() {
    let group = parse_selector_group("h1, div p.note ,  #x");
    assert_eq!(group.len(), 3);
    assert_eq!(group[0], vec![Selector::tag("h1")]);
    assert_eq!(
        group[1],
        vec![Selector::tag("div"), Selector::tag("p").with_class("note")]
    );
    assert_eq!(group[2], vec![Selector::default().with_id("x")]);
}

#[test]
fn test_unsupported_selector_drops_only_its_chain() {
    let group = parse_selector_group("a:hover, b");
    assert_eq!(group, vec![vec![Selector::tag("b")]]);
}
