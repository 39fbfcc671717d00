//! User-Agent Stylesheet
//!
//! [WHATWG HTML § 15 Rendering](https://html.spec.whatwg.org/multipage/rendering.html)
//!
//! "User agents are expected to have a default style sheet that presents elements
//! of HTML documents in ways consistent with general user expectations."
//!
//! Document sheets start as a copy of this one, so author rules with the same
//! selector chain merge over these declarations and author rules of equal
//! specificity come later in source order.

use std::sync::OnceLock;

use crate::stylesheet::Stylesheet;

/// Default CSS rules for the HTML elements the box builder understands.
const UA_CSS: &str = r"
/* [§ 15.3.1 Hidden elements] */
area, base, basefont, datalist, head, link, meta, noembed,
noframes, noscript, param, rp, script, style, template, title {
    display: none;
}

/* [§ 15.3.3 Flow content] */
address, article, aside, blockquote, body, center, dd, details,
dialog, dir, div, dl, dt, fieldset, figcaption, figure, footer,
form, h1, h2, h3, h4, h5, h6, header, hgroup, hr, html, legend,
listing, main, menu, nav, ol, p, plaintext, pre, section,
summary, ul, xmp, caption {
    display: block;
}

/* [§ 15.3.7 Lists] */
li { display: list-item; }

/* [§ 15.3.8 Tables] row groups are transparent so rows attach to the table */
table { display: table; }
thead, tbody, tfoot { display: inline; }
tr { display: table-row; }
td, th { display: table-cell; }
th { font-weight: bold; text-align: center; }
caption { text-align: center; }

/* [§ 15.3.6 Sections and headings] */
h1 { font-size: 2em; font-weight: bold; }
h2 { font-size: 1.5em; font-weight: bold; }
h3 { font-size: 1.17em; font-weight: bold; }
h4 { font-size: 1em; font-weight: bold; }
h5 { font-size: 0.83em; font-weight: bold; }
h6 { font-size: 0.67em; font-weight: bold; }

/* [§ 15.3.4 Phrasing content] */
b, strong { font-weight: bold; }
i, em, cite, var, dfn, address { font-style: italic; }
big { font-size: larger; }
small { font-size: smaller; }
a { color: #0000ee; }

/* [§ 15.3.2 The page] */
center { text-align: center; }
";

/// The parsed user-agent stylesheet, built once.
#[must_use]
pub fn ua_stylesheet() -> &'static Stylesheet {
    static SHEET: OnceLock<Stylesheet> = OnceLock::new();
    SHEET.get_or_init(|| Stylesheet::parse(UA_CSS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::Selector;
    use crate::style::{ComputedStyle, Display, FontWeight};

    fn style_for(tags: &[&str]) -> ComputedStyle {
        let chain: Vec<Selector> = tags.iter().map(|t| Selector::tag(t)).collect();
        ua_stylesheet().get_style(&chain, &ComputedStyle::base())
    }

    #[test]
    fn test_hidden_and_block_defaults() {
        assert_eq!(style_for(&["html", "head"]).display, Display::None);
        assert_eq!(style_for(&["html", "body", "div"]).display, Display::Block);
        assert_eq!(style_for(&["html", "body", "span"]).display, Display::Inline);
        assert_eq!(style_for(&["li"]).display, Display::Block);
    }

    #[test]
    fn test_th_rules_merge() {
        let th = style_for(&["table", "tr", "th"]);
        assert_eq!(th.display, Display::TableCell);
        assert_eq!(th.font_weight, FontWeight::Bold);
    }

    #[test]
    fn test_heading_font_size() {
        let h1 = style_for(&["html", "body", "h1"]);
        assert!((h1.font_size - 30.0).abs() < 1e-3);
    }
}
