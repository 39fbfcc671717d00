//! Integration tests for stylesheet parsing.

use kestrel_css::style::{Clear, Display, Float, FontStyle, FontWeight, Height, Width};
use kestrel_css::values::{Length, Unit};
use kestrel_css::{Colour, Declared, Selector, Stylesheet, parse_declarations};

#[test]
fn test_rules_keep_source_order() {
    let sheet = Stylesheet::parse("p { color: red } div, span { color: blue } em { }");
    let rules = sheet.rules();
    let chains: Vec<&[Selector]> = rules.iter().map(|r| r.selectors.as_slice()).collect();
    assert_eq!(
        chains,
        vec![
            &[Selector::tag("p")][..],
            &[Selector::tag("div")][..],
            &[Selector::tag("span")][..],
            &[Selector::tag("em")][..],
        ]
    );
}

#[test]
fn test_at_rules_and_comments_are_skipped() {
    let css = r#"
        @charset "utf-8";
        /* heading */
        @media screen { h1 { color: red } }
        h1 { color: green }
        @import url(x.css);
        p { color: blue }
    "#;
    let sheet = Stylesheet::parse(css);
    assert_eq!(sheet.len(), 2);
    let rules = sheet.rules();
    let h1 = rules[0];
    assert_eq!(h1.selectors, vec![Selector::tag("h1")]);
    assert_eq!(h1.style.color, Declared::Value(Colour::rgb(0, 128, 0)));
}

#[test]
fn test_unterminated_block_still_parses() {
    let sheet = Stylesheet::parse("p { color: red");
    assert_eq!(sheet.len(), 1);
}

#[test]
fn test_declarations() {
    let style = parse_declarations(
        "display: block; float: left; clear: both; width: 50%; height: 2em; \
         font-weight: 700; font-style: italic; background: url(x.png) #fff",
    );
    assert_eq!(style.display, Declared::Value(Display::Block));
    assert_eq!(style.float, Declared::Value(Float::Left));
    assert_eq!(style.clear, Declared::Value(Clear::Both));
    assert_eq!(style.width, Declared::Value(Width::Percent(50.0)));
    assert_eq!(
        style.height,
        Declared::Value(Height::Length(Length {
            value: 2.0,
            unit: Unit::Em
        }))
    );
    assert_eq!(style.font_weight, Declared::Value(FontWeight::Bold));
    assert_eq!(style.font_style, Declared::Value(FontStyle::Italic));
    assert_eq!(style.background_color, Declared::Value(Colour::WHITE));
}

#[test]
fn test_invalid_and_unknown_declarations_are_dropped() {
    let style = parse_declarations("color: notacolour; margin: 4px; width: auto; ; garbage");
    assert_eq!(style.color, Declared::Unset);
    assert_eq!(style.width, Declared::Value(Width::Auto));
}

#[test]
fn test_inherit_keyword() {
    let style = parse_declarations("color: INHERIT; display: inherit");
    assert_eq!(style.color, Declared::Inherit);
    assert_eq!(style.display, Declared::Inherit);
}

#[test]
fn test_colour_forms() {
    assert_eq!(Colour::parse("#f00"), Some(Colour::rgb(255, 0, 0)));
    assert_eq!(Colour::parse("#00FF7f"), Some(Colour::rgb(0, 255, 127)));
    assert_eq!(Colour::parse("rgb(10, 20, 30)"), Some(Colour::rgb(10, 20, 30)));
    assert_eq!(Colour::parse("rgb(100%, 0%, 0%)"), Some(Colour::rgb(255, 0, 0)));
    assert_eq!(Colour::parse("Navy"), Some(Colour::rgb(0, 0, 128)));
    assert_eq!(Colour::parse("transparent"), Some(Colour::Transparent));
    assert_eq!(Colour::parse("#ggg"), None);
}
