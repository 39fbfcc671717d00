//! Stylesheets, cascade, box construction and layout for the Kestrel document pipeline.
//!
//! # Scope
//!
//! This crate implements:
//! - **CSS Parsing** ([CSS 2.1 § 4 Syntax](https://www.w3.org/TR/CSS2/syndata.html))
//!   - Rule sets with comma-separated selector groups
//!   - Declaration blocks and `style` attributes
//!   - At-rules are skipped
//!
//! - **Selectors** ([CSS 2.1 § 5](https://www.w3.org/TR/CSS2/selector.html))
//!   - Type, universal, class and ID selectors
//!   - Descendant chains
//!   - Specificity calculation
//!
//! - **Cascade** ([CSS Cascading Level 4](https://www.w3.org/TR/css-cascade-4/))
//!   - Rules hashed by element name
//!   - Ascending (specificity, source order) application
//!   - Explicit `inherit`
//!
//! - **Layout** ([CSS 2.1 § 9 Visual formatting model](https://www.w3.org/TR/CSS2/visuren.html))
//!   - Box tree construction with anonymous inline containers and table parts
//!   - Block flow, line breaking around floats, `clear`
//!   - Fixed table layout
//!
//! # Not Yet Implemented
//!
//! - Margins, borders and padding
//! - Attribute selectors, pseudo-classes and child/sibling combinators
//! - `colspan` and `rowspan`
//! - Positioning

/// Box tree construction and layout per [CSS 2.1 § 9](https://www.w3.org/TR/CSS2/visuren.html).
pub mod layout;
/// Stylesheet and declaration parsing per [CSS 2.1 § 4](https://www.w3.org/TR/CSS2/syndata.html).
pub mod parser;
/// Selector matching per [CSS 2.1 § 5](https://www.w3.org/TR/CSS2/selector.html).
pub mod selector;
/// Declared and computed styles per [CSS Cascading Level 4](https://www.w3.org/TR/css-cascade-4/).
pub mod style;
/// The rule hash table and cascade.
pub mod stylesheet;
/// User-agent stylesheet per [WHATWG HTML § 15 Rendering](https://html.spec.whatwg.org/multipage/rendering.html).
pub mod ua_stylesheet;
/// Lengths and colours per [CSS 2.1 § 4.3](https://www.w3.org/TR/CSS2/syndata.html#values).
pub mod values;

pub use layout::{
    ApproximateFontMetrics, BoxBuilder, BoxId, BoxKind, BoxTree, FontMetrics, LayoutBox,
    LayoutEngine, LayoutError, build_box_tree, layout_document,
};
pub use parser::{parse_declarations, parse_stylesheet};
pub use selector::{Selector, Specificity};
pub use style::{ComputedStyle, Declared, Style};
pub use stylesheet::{Rule, Stylesheet};
pub use ua_stylesheet::ua_stylesheet;
pub use values::{Colour, Length, Unit};

use kestrel_dom::{DomTree, NodeId};

/// [§ 6.1 Cascade Sorting Order](https://www.w3.org/TR/css-cascade-4/#cascade-sort)
///
/// "Declarations from style sheets independently linked by the originating
/// document are treated as if they were concatenated in linking order."
///
/// Where one of a document's stylesheets comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StylesheetSource {
    /// [§ 4.2.4 The link element](https://html.spec.whatwg.org/multipage/semantics.html#the-link-element)
    ///
    /// `<link rel="stylesheet" href="...">`; the href is as written.
    External {
        /// The unresolved `href`.
        href: String,
    },
    /// [§ 4.2.6 The style element](https://html.spec.whatwg.org/multipage/semantics.html#the-style-element)
    ///
    /// The text of a `<style>` element.
    Inline(String),
}

/// Every stylesheet the document references, in document order.
#[must_use]
pub fn stylesheet_sources(dom: &DomTree) -> Vec<StylesheetSource> {
    dom.descendants(NodeId::ROOT)
        .filter_map(|id| {
            let element = dom.element(id)?;
            match element.name.as_str() {
                "style" => Some(StylesheetSource::Inline(dom.text_content(id))),
                "link" => {
                    let is_stylesheet = element
                        .attr("rel")
                        .is_some_and(|rel| rel.split_ascii_whitespace().any(|r| r.eq_ignore_ascii_case("stylesheet")));
                    let href = element.attr("href").map(str::trim).filter(|h| !h.is_empty())?;
                    is_stylesheet.then(|| StylesheetSource::External {
                        href: href.to_string(),
                    })
                }
                _ => None,
            }
        })
        .collect()
}
