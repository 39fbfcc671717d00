//! CSS source parsing.
//!
//! [CSS 2.1 § 4.1 Syntax](https://www.w3.org/TR/CSS2/syndata.html#syntax)
//!
//! A forgiving rule-set parser: comments are stripped, rule sets are split
//! on braces, selector groups on commas and descendant chains on
//! whitespace. Declarations are `name: value` pairs separated by `;`.
//! Anything unsupported is reported once through the warning log and
//! skipped without affecting the rest of the sheet.

use kestrel_common::warning::warn_once;

use crate::selector::Selector;
use crate::style::{
    Clear, Declared, Display, Float, FontSize, FontStyle, FontWeight, Height, LineHeight, Style,
    TextAlign, Width, DEFAULT_FONT_SIZE_PX, FONT_SIZE_STEP,
};
use crate::stylesheet::Stylesheet;
use crate::values::{Colour, Length, parse_number, parse_percentage};

/// [§ 4.1.9 Comments](https://www.w3.org/TR/CSS2/syndata.html#comments)
///
/// "Comments begin with the characters '/*' and end with the characters
/// '*/'." Each comment is replaced by a space.
#[must_use]
pub fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        out.push(' ');
        rest = rest[start + 2..]
            .find("*/")
            .map_or("", |end| &rest[start + 2 + end + 2..]);
    }
    out.push_str(rest);
    out
}

/// Parse a whole stylesheet, adding its rules to `sheet` in source order.
pub fn parse_stylesheet(css: &str, sheet: &mut Stylesheet) {
    let css = strip_comments(css);
    let mut rest = css.as_str();

    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == '}' || c == ';');
        if rest.is_empty() {
            break;
        }

        // [§ 4.1.5 At-rules](https://www.w3.org/TR/CSS2/syndata.html#at-rules)
        //
        // "At-rules start with an at-keyword ... and end with a semicolon or
        // a block, whichever comes first."
        if rest.starts_with('@') {
            let keyword: String = rest
                .chars()
                .take_while(|c| !c.is_whitespace() && !matches!(c, '{' | ';'))
                .collect();
            warn_once("CSS", &format!("ignoring at-rule {keyword}"));
            rest = skip_at_rule(rest);
            continue;
        }

        let Some(open) = rest.find('{') else {
            break;
        };
        let selector_text = &rest[..open];
        let body = &rest[open + 1..];
        let close = body.find('}').unwrap_or(body.len());
        let style = parse_declarations(&body[..close]);
        rest = body.get(close + 1..).unwrap_or_default();

        for chain in parse_selector_group(selector_text) {
            sheet.add_rule(chain, &style);
        }
    }
}

/// Skip an at-rule: up to its `;`, or past its block with nested braces.
fn skip_at_rule(text: &str) -> &str {
    let Some(stop) = text.find([';', '{']) else {
        return "";
    };
    if text[stop..].starts_with(';') {
        return &text[stop + 1..];
    }
    let mut depth = 0usize;
    for (i, c) in text[stop..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return &text[stop + i + 1..];
                }
            }
            _ => {}
        }
    }
    ""
}

/// [§ 5.2.1 Grouping](https://www.w3.org/TR/CSS2/selector.html#grouping)
///
/// Split a comma-separated group into descendant chains, outermost first.
/// A member using unsupported syntax is skipped; the others are kept.
#[must_use]
pub fn parse_selector_group(text: &str) -> Vec<Vec<Selector>> {
    text.split(',')
        .filter_map(|member| {
            let member = member.trim();
            if member.is_empty() {
                return None;
            }
            let chain: Option<Vec<Selector>> =
                member.split_whitespace().map(Selector::parse).collect();
            if chain.is_none() {
                warn_once("CSS", &format!("unsupported selector '{member}'"));
            }
            chain
        })
        .collect()
}

/// Parse a declaration block (without braces) into a [`Style`].
///
/// Also used for `style` attributes.
#[must_use]
pub fn parse_declarations(block: &str) -> Style {
    let mut style = Style::default();
    for declaration in strip_comments(block).split(';') {
        let Some((name, value)) = declaration.split_once(':') else {
            if !declaration.trim().is_empty() {
                warn_once("CSS", &format!("malformed declaration '{}'", declaration.trim()));
            }
            continue;
        };
        let name = name.trim().to_ascii_lowercase();
        let mut value = value.trim();
        // Importance is not part of this cascade; the value still applies.
        if let Some(idx) = value.to_ascii_lowercase().find("!important") {
            value = value[..idx].trim_end();
        }
        apply_declaration(&mut style, &name, value);
    }
    style
}

/// Parse one property value, accepting `inherit` for every property.
fn declared<T>(name: &str, value: &str, parse: impl FnOnce(&str) -> Option<T>) -> Declared<T> {
    if value.eq_ignore_ascii_case("inherit") {
        return Declared::Inherit;
    }
    if let Some(parsed) = parse(value) {
        Declared::Value(parsed)
    } else {
        warn_once("CSS", &format!("invalid value '{value}' for {name}"));
        Declared::Unset
    }
}

/// Store one declaration in `style`.
fn apply_declaration(style: &mut Style, name: &str, value: &str) {
    match name {
        "background-color" => style.background_color = declared(name, value, Colour::parse),
        // [§ 14.2.1 'background'](https://www.w3.org/TR/CSS2/colors.html#propdef-background)
        // Only the colour component of the shorthand is kept.
        "background" => {
            let colour = value.split_whitespace().find_map(Colour::parse);
            style.background_color = if value.eq_ignore_ascii_case("inherit") {
                Declared::Inherit
            } else {
                colour.map_or(Declared::Unset, Declared::Value)
            };
        }
        "clear" => style.clear = declared(name, value, parse_clear),
        "color" => style.color = declared(name, value, Colour::parse),
        "display" => style.display = declared(name, value, parse_display),
        "float" => style.float = declared(name, value, parse_float),
        "font-size" => style.font_size = declared(name, value, parse_font_size),
        "font-weight" => style.font_weight = declared(name, value, parse_font_weight),
        "font-style" => style.font_style = declared(name, value, parse_font_style),
        "height" => style.height = declared(name, value, parse_height),
        "line-height" => style.line_height = declared(name, value, parse_line_height),
        "text-align" => style.text_align = declared(name, value, parse_text_align),
        "width" => style.width = declared(name, value, parse_width),
        _ => {
            warn_once("CSS", &format!("unsupported property '{name}'"));
        }
    }
}

fn parse_clear(value: &str) -> Option<Clear> {
    match value.to_ascii_lowercase().as_str() {
        "none" => Some(Clear::None),
        "left" => Some(Clear::Left),
        "right" => Some(Clear::Right),
        "both" => Some(Clear::Both),
        _ => None,
    }
}

/// [CSS Display § 2](https://www.w3.org/TR/css-display-3/#the-display-properties)
///
/// `list-item` is laid out as a block (no markers). Row groups and
/// `inline-block` fall back to the nearest supported value.
fn parse_display(value: &str) -> Option<Display> {
    let display = match value.to_ascii_lowercase().as_str() {
        "block" | "list-item" => Display::Block,
        "inline" => Display::Inline,
        "none" => Display::None,
        "table" => Display::Table,
        "table-row" => Display::TableRow,
        "table-cell" => Display::TableCell,
        other @ ("inline-block" | "table-row-group" | "table-header-group"
        | "table-footer-group") => {
            warn_once("CSS", &format!("display: {other} treated as inline"));
            Display::Inline
        }
        _ => return None,
    };
    Some(display)
}

fn parse_float(value: &str) -> Option<Float> {
    match value.to_ascii_lowercase().as_str() {
        "none" => Some(Float::None),
        "left" => Some(Float::Left),
        "right" => Some(Float::Right),
        _ => None,
    }
}

/// [§ 15.7 Font size](https://www.w3.org/TR/CSS2/fonts.html#font-size-props)
///
/// "On a computer screen a scaling factor of 1.2 is suggested between
/// adjacent indexes; if the 'medium' font is 12pt, the 'large' font could
/// be 14.4pt."
fn parse_font_size(value: &str) -> Option<FontSize> {
    const KEYWORDS: [&str; 7] = [
        "xx-small", "x-small", "small", "medium", "large", "x-large", "xx-large",
    ];
    let lower = value.to_ascii_lowercase();
    if let Some(index) = KEYWORDS.iter().position(|k| *k == lower) {
        let steps = i32::try_from(index).unwrap_or(3) - 3;
        let px = DEFAULT_FONT_SIZE_PX * FONT_SIZE_STEP.powi(steps);
        return Some(FontSize::Length(Length::px(px)));
    }
    match lower.as_str() {
        "larger" => Some(FontSize::Percent(100.0 * FONT_SIZE_STEP)),
        "smaller" => Some(FontSize::Percent(100.0 / FONT_SIZE_STEP)),
        _ => parse_percentage(value)
            .map(FontSize::Percent)
            .or_else(|| Length::parse(value).map(FontSize::Length)),
    }
}

/// [§ 15.6 Font boldness](https://www.w3.org/TR/CSS2/fonts.html#font-boldness)
fn parse_font_weight(value: &str) -> Option<FontWeight> {
    match value.to_ascii_lowercase().as_str() {
        "normal" | "lighter" => Some(FontWeight::Normal),
        "bold" | "bolder" => Some(FontWeight::Bold),
        numeric => {
            let weight: u16 = numeric.parse().ok()?;
            Some(if weight >= 600 {
                FontWeight::Bold
            } else {
                FontWeight::Normal
            })
        }
    }
}

fn parse_font_style(value: &str) -> Option<FontStyle> {
    match value.to_ascii_lowercase().as_str() {
        "normal" => Some(FontStyle::Normal),
        "italic" | "oblique" => Some(FontStyle::Italic),
        _ => None,
    }
}

fn parse_height(value: &str) -> Option<Height> {
    if value.eq_ignore_ascii_case("auto") {
        return Some(Height::Auto);
    }
    Length::parse(value).map(Height::Length)
}

/// [§ 10.8.1](https://www.w3.org/TR/CSS2/visudet.html#propdef-line-height)
///
/// "normal: Tells user agents to set the used value to a 'reasonable'
/// value based on the font of the element."
fn parse_line_height(value: &str) -> Option<LineHeight> {
    if value.eq_ignore_ascii_case("normal") {
        return Some(LineHeight::Absolute(1.2));
    }
    parse_number(value)
        .map(LineHeight::Absolute)
        .or_else(|| parse_percentage(value).map(LineHeight::Percent))
        .or_else(|| Length::parse(value).map(LineHeight::Length))
}

fn parse_text_align(value: &str) -> Option<TextAlign> {
    match value.to_ascii_lowercase().as_str() {
        "left" | "justify" => Some(TextAlign::Left),
        "right" => Some(TextAlign::Right),
        "center" => Some(TextAlign::Center),
        _ => None,
    }
}

fn parse_width(value: &str) -> Option<Width> {
    if value.eq_ignore_ascii_case("auto") {
        return Some(Width::Auto);
    }
    parse_percentage(value)
        .map(Width::Percent)
        .or_else(|| Length::parse(value).map(Width::Length))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_comments() {
        assert_eq!(strip_comments("a/* x */b"), "a b");
        assert_eq!(strip_comments("a/* unterminated"), "a ");
    }

    #[test]
    fn test_skip_at_rule_with_nested_block() {
        assert_eq!(skip_at_rule("@media print { p { color: red } } div {}"), " div {}");
        assert_eq!(skip_at_rule("@import url(a.css); p {}"), " p {}");
    }

    #[test]
    fn test_font_size_keywords() {
        assert_eq!(
            parse_font_size("medium"),
            Some(FontSize::Length(Length::px(DEFAULT_FONT_SIZE_PX)))
        );
        let Some(FontSize::Length(large)) = parse_font_size("large") else {
            panic!("large should be a length");
        };
        assert!((large.value - DEFAULT_FONT_SIZE_PX * 1.2).abs() < 1e-4);
        assert_eq!(parse_font_size("150%"), Some(FontSize::Percent(150.0)));
    }

    #[test]
    fn test_line_height_forms() {
        assert_eq!(parse_line_height("normal"), Some(LineHeight::Absolute(1.2)));
        assert_eq!(parse_line_height("1.5"), Some(LineHeight::Absolute(1.5)));
        assert_eq!(parse_line_height("120%"), Some(LineHeight::Percent(120.0)));
        assert_eq!(
            parse_line_height("20px"),
            Some(LineHeight::Length(Length::px(20.0)))
        );
    }

    #[test]
    fn test_important_suffix_ignored() {
        let style = parse_declarations("color: red !important");
        assert_eq!(style.color, Declared::Value(Colour::rgb(255, 0, 0)));
    }
}
