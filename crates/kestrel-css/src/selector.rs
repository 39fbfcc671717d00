//! Simple selectors, selector chains and specificity.
//!
//! [Selectors Level 3](https://www.w3.org/TR/selectors-3/)
//!
//! A rule's selector is a chain of simple selectors joined by the
//! descendant combinator, stored outermost first. The query side is the
//! same shape: one simple selector per open element, root first.

use std::ops::Add;

use kestrel_dom::ElementData;

/// [§ 9 Calculating a selector's specificity](https://www.w3.org/TR/selectors-3/#specificity)
///
/// "A selector's specificity is calculated as follows:
///  - count the number of ID selectors in the selector (= a)
///  - count the number of class selectors, attributes selectors, and
///    pseudo-classes in the selector (= b)
///  - count the number of type selectors and pseudo-elements in the
///    selector (= c)"
///
/// Compared lexicographically, so any id outweighs any number of classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Specificity(pub u32, pub u32, pub u32);

impl Specificity {
    /// Create a new specificity with (a, b, c) components.
    #[must_use]
    pub const fn new(a: u32, b: u32, c: u32) -> Self {
        Self(a, b, c)
    }
}

impl Add for Specificity {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0, self.1 + rhs.1, self.2 + rhs.2)
    }
}

/// A simple selector: `tag`, `tag.class`, `tag#id`, `.class`, `#id`, `*`.
///
/// On the rule side `element: None` is the universal selector. On the query
/// side the fields describe one element, with `class` holding the element's
/// whole class attribute.
///
/// Two selectors are equal, for rule de-duplication, iff all three fields
/// are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Selector {
    /// Tag name, lower-case.
    pub element: Option<String>,
    /// Class name (rule side) or class attribute (query side).
    pub class: Option<String>,
    /// Id.
    pub id: Option<String>,
}

impl Selector {
    /// A type selector.
    #[must_use]
    pub fn tag(element: &str) -> Self {
        Self {
            element: Some(element.to_ascii_lowercase()),
            ..Self::default()
        }
    }

    /// Builder: add a class.
    #[must_use]
    pub fn with_class(mut self, class: &str) -> Self {
        self.class = Some(class.to_string());
        self
    }

    /// Builder: add an id.
    #[must_use]
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    /// The query-side selector describing `element`.
    #[must_use]
    pub fn from_element(element: &ElementData) -> Self {
        Self {
            element: Some(element.name.clone()),
            class: element.class_attr().map(str::to_string),
            id: element.id().map(str::to_string),
        }
    }

    /// Parse one compound selector.
    ///
    /// Returns `None` for anything beyond an optional type or universal
    /// selector followed by at most one class and one id.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let is_ident = |c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii();
        let name_end = text.find(|c: char| !(is_ident(c) || c == '*')).unwrap_or(text.len());
        let name = &text[..name_end];
        let mut selector = Self::default();
        match name {
            "" | "*" => {}
            _ if name.contains('*') => return None,
            _ => selector.element = Some(name.to_ascii_lowercase()),
        }

        let mut rest = &text[name_end..];
        while let Some(marker) = rest.chars().next() {
            let body = &rest[marker.len_utf8()..];
            let end = body.find(|c: char| !is_ident(c)).unwrap_or(body.len());
            let value = &body[..end];
            if value.is_empty() {
                return None;
            }
            let slot = match marker {
                '.' => &mut selector.class,
                '#' => &mut selector.id,
                _ => return None,
            };
            if slot.is_some() {
                return None;
            }
            *slot = Some(value.to_string());
            rest = &body[end..];
        }

        if name.is_empty() && selector.class.is_none() && selector.id.is_none() {
            return None;
        }
        Some(selector)
    }

    /// Score this rule-side selector against one query element.
    ///
    /// Returns `None` if any field this selector constrains differs.
    #[must_use]
    pub fn match_score(&self, query: &Self) -> Option<Specificity> {
        let mut score = Specificity::default();
        if let Some(element) = &self.element {
            if query.element.as_ref() != Some(element) {
                return None;
            }
            score.2 += 1;
        }
        if let Some(class) = &self.class {
            let classes = query.class.as_deref().unwrap_or_default();
            if !classes.split_ascii_whitespace().any(|c| c == class) {
                return None;
            }
            score.1 += 1;
        }
        if let Some(id) = &self.id {
            if query.id.as_ref() != Some(id) {
                return None;
            }
            score.0 += 1;
        }
        Some(score)
    }

    /// The specificity of this selector on its own.
    #[must_use]
    pub fn specificity(&self) -> Specificity {
        Specificity(
            u32::from(self.id.is_some()),
            u32::from(self.class.is_some()),
            u32::from(self.element.is_some()),
        )
    }
}

/// [§ 8.1 Descendant combinator](https://www.w3.org/TR/selectors-3/#descendant-combinators)
///
/// Match a rule chain against a query chain, both outermost first.
///
/// The innermost selectors must match each other. Each remaining rule
/// selector, walking outward, must then match some query element further
/// out than the previous match; non-matching ancestors are skipped. The
/// score is the sum of the matched selectors' scores.
#[must_use]
pub fn match_chain(rule: &[Selector], query: &[Selector]) -> Option<Specificity> {
    if rule.len() > query.len() {
        return None;
    }
    let (innermost, outer_rule) = rule.split_last()?;
    let (subject, ancestors) = query.split_last()?;
    let mut total = innermost.match_score(subject)?;

    let mut remaining = ancestors.len();
    for selector in outer_rule.iter().rev() {
        loop {
            if remaining == 0 {
                return None;
            }
            remaining -= 1;
            if let Some(score) = selector.match_score(&ancestors[remaining]) {
                total = total + score;
                break;
            }
        }
    }
    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forms() {
        assert_eq!(Selector::parse("P"), Some(Selector::tag("p")));
        assert_eq!(
            Selector::parse("div.note"),
            Some(Selector::tag("div").with_class("note"))
        );
        assert_eq!(
            Selector::parse("span#main"),
            Some(Selector::tag("span").with_id("main"))
        );
        assert_eq!(
            Selector::parse(".x"),
            Some(Selector::default().with_class("x"))
        );
        assert_eq!(Selector::parse("*"), Some(Selector::default()));
        assert_eq!(Selector::parse(""), None);
        assert_eq!(Selector::parse("a:hover"), None);
        assert_eq!(Selector::parse("a.b.c"), None);
        assert_eq!(Selector::parse("a[href]"), None);
    }

    #[test]
    fn test_specificity_ordering() {
        assert!(Specificity::new(1, 0, 0) > Specificity::new(0, 10, 10));
        assert!(Specificity::new(0, 1, 0) > Specificity::new(0, 0, 10));
        assert_eq!(
            Specificity::new(0, 1, 1) + Specificity::new(1, 0, 1),
            Specificity::new(1, 1, 2)
        );
    }

    #[test]
    fn test_match_score_requires_all_fields() {
        let query = Selector::tag("p").with_class("a b").with_id("x");
        assert_eq!(
            Selector::tag("p").with_class("b").match_score(&query),
            Some(Specificity::new(0, 1, 1))
        );
        assert_eq!(Selector::tag("div").match_score(&query), None);
        assert_eq!(Selector::tag("p").with_id("y").match_score(&query), None);
        assert_eq!(
            Selector::default().with_id("x").match_score(&query),
            Some(Specificity::new(1, 0, 0))
        );
    }

    #[test]
    fn test_chain_skips_intervening_ancestors() {
        let query = vec![
            Selector::tag("html"),
            Selector::tag("body"),
            Selector::tag("div").with_class("box"),
            Selector::tag("p"),
            Selector::tag("em"),
        ];
        let rule = vec![Selector::tag("div").with_class("box"), Selector::tag("em")];
        assert_eq!(match_chain(&rule, &query), Some(Specificity::new(0, 1, 2)));
    }

    #[test]
    fn test_chain_preserves_order() {
        let query = vec![Selector::tag("div"), Selector::tag("p"), Selector::tag("em")];
        // "p div em" needs div inside p: wrong order.
        let rule = vec![Selector::tag("p"), Selector::tag("div"), Selector::tag("em")];
        assert_eq!(match_chain(&rule, &query), None);
    }

    #[test]
    fn test_chain_innermost_must_match() {
        let query = vec![Selector::tag("div"), Selector::tag("p")];
        let rule = vec![Selector::tag("div")];
        assert_eq!(match_chain(&rule, &query), None);
    }

    #[test]
    fn test_chain_longer_than_query_fails() {
        let query = vec![Selector::tag("p")];
        let rule = vec![Selector::tag("div"), Selector::tag("p")];
        assert_eq!(match_chain(&rule, &query), None);
    }
}
