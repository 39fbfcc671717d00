//! Integration tests for the cascade.

use kestrel_css::style::{Display, FontWeight, TextAlign, Width};
use kestrel_css::{Colour, ComputedStyle, Selector, Stylesheet, ua_stylesheet};
use quickcheck_macros::quickcheck;

const RED: Colour = Colour::Rgb { r: 255, g: 0, b: 0 };
const GREEN: Colour = Colour::Rgb { r: 0, g: 128, b: 0 };
const BLUE: Colour = Colour::Rgb { r: 0, g: 0, b: 255 };

fn element() -> Vec<Selector> {
    vec![
        Selector::tag("body"),
        Selector::tag("div").with_class("c").with_id("id"),
    ]
}

#[test]
fn test_id_beats_class_beats_element_in_any_order() {
    let orders = [
        "div { color: red } .c { color: green } #id { color: blue }",
        "#id { color: blue } .c { color: green } div { color: red }",
        ".c { color: green } #id { color: blue } div { color: red }",
    ];
    for css in orders {
        let sheet = Stylesheet::parse(css);
        let style = sheet.get_style(&element(), &ComputedStyle::base());
        assert_eq!(style.color, BLUE, "{css}");
    }
}

#[test]
fn test_class_beats_element() {
    let sheet = Stylesheet::parse(".c { color: green } div { color: red }");
    let style = sheet.get_style(&element(), &ComputedStyle::base());
    assert_eq!(style.color, GREEN);
}

#[test]
fn test_later_rule_wins_at_equal_specificity() {
    let sheet = Stylesheet::parse("p { color: red } p { color: blue }");
    let style = sheet.get_style(&[Selector::tag("p")], &ComputedStyle::base());
    assert_eq!(style.color, BLUE);
}

#[test]
fn test_inherit_takes_parent_value_not_earlier_rule() {
    let parent = ComputedStyle {
        color: GREEN,
        ..ComputedStyle::base()
    };
    let sheet = Stylesheet::parse("div { color: red } div.c { color: inherit }");
    let style = sheet.get_style(&element(), &parent);
    assert_eq!(style.color, GREEN);
}

#[test]
fn test_unmatched_element_gets_inline_blank_style() {
    let parent = ComputedStyle {
        color: RED,
        width: Width::Auto,
        text_align: TextAlign::Center,
        ..ComputedStyle::base()
    };
    let sheet = Stylesheet::parse("p { display: block }");
    let style = sheet.get_style(&[Selector::tag("span")], &parent);
    assert_eq!(style.display, Display::Inline);
    assert_eq!(style.background_color, Colour::Transparent);
    assert_eq!(style.color, RED);
    assert_eq!(style.text_align, TextAlign::Center);
}

#[test]
fn test_descendant_rule_only_applies_inside_ancestor() {
    let sheet = Stylesheet::parse("ul li { font-weight: bold }");
    let inside = sheet.get_style(
        &[Selector::tag("ul"), Selector::tag("li")],
        &ComputedStyle::base(),
    );
    let outside = sheet.get_style(
        &[Selector::tag("ol"), Selector::tag("li")],
        &ComputedStyle::base(),
    );
    assert_eq!(inside.font_weight, FontWeight::Bold);
    assert_eq!(outside.font_weight, FontWeight::Normal);
}

#[test]
fn test_duplicate_chain_merges_into_first_rule() {
    let sheet = Stylesheet::parse("p { color: red } h1 { color: green } p { font-weight: bold }");
    assert_eq!(sheet.len(), 2);
    let style = sheet.get_style(&[Selector::tag("p")], &ComputedStyle::base());
    assert_eq!(style.color, RED);
    assert_eq!(style.font_weight, FontWeight::Bold);
}

#[test]
fn test_author_rules_override_ua_defaults() {
    let mut sheet = ua_stylesheet().clone();
    sheet.add_css("h1 { font-weight: normal } div { display: inline }");
    let parent = ComputedStyle::base();
    let h1 = sheet.get_style(&[Selector::tag("h1")], &parent);
    assert_eq!(h1.font_weight, FontWeight::Normal);
    assert!((h1.font_size - parent.font_size * 2.0).abs() < 1e-3);
    let div = sheet.get_style(&[Selector::tag("div")], &parent);
    assert_eq!(div.display, Display::Inline);
}

const TAGS: [&str; 5] = ["div", "p", "span", "em", "li"];
const CLASSES: [&str; 3] = ["a", "b", "a b"];

fn chain_from(seed: &[u8]) -> Vec<Selector> {
    let mut chain: Vec<Selector> = seed
        .iter()
        .take(6)
        .map(|&n| {
            let tag = TAGS[usize::from(n) % TAGS.len()];
            let mut selector = Selector::tag(tag);
            if n % 3 == 0 {
                selector = selector.with_class(CLASSES[usize::from(n / 3) % CLASSES.len()]);
            }
            if n % 7 == 0 {
                selector = selector.with_id("x");
            }
            selector
        })
        .collect();
    if chain.is_empty() {
        chain.push(Selector::tag("div"));
    }
    chain
}

const SHEET: &str = "
    div { color: red; width: 50% }
    div p { color: green }
    .a { font-weight: bold }
    p.b { text-align: right }
    #x { color: inherit; background: blue }
    li em { font-size: 120% }
    * { line-height: 1.5 }
";

#[quickcheck]
fn prop_get_style_is_deterministic(seed: Vec<u8>) -> bool {
    let sheet = Stylesheet::parse(SHEET);
    let chain = chain_from(&seed);
    let parent = ComputedStyle::base();
    sheet.get_style(&chain, &parent) == sheet.get_style(&chain, &parent)
}

#[quickcheck]
fn prop_get_style_ignores_rule_source_order_across_specificity(seed: Vec<u8>) -> bool {
    // Rules of distinct specificity give the same result in any order.
    let forward = Stylesheet::parse("em { color: red } em.a { color: green } #x { color: blue }");
    let backward = Stylesheet::parse("#x { color: blue } em.a { color: green } em { color: red }");
    let chain = chain_from(&seed);
    let parent = ComputedStyle::base();
    forward.get_style(&chain, &parent) == backward.get_style(&chain, &parent)
}
