//! Rule storage and the cascade query.
//!
//! [CSS Cascading Level 4 § 6](https://www.w3.org/TR/css-cascade-4/#cascading)
//!
//! Rules are bucketed by the tag name of their innermost selector so that a
//! query only scans rules that could possibly match the element itself.
//! Rules whose innermost selector has no tag (`.note`, `#main`, `*`) live in
//! a separate list that every query scans.

use crate::parser;
use crate::selector::{Selector, Specificity, match_chain};
use crate::style::{ComputedStyle, Style};

/// Number of tag-name buckets.
pub const HASH_SIZE: usize = 47;

/// One rule: a descendant chain (outermost first) and its declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    /// The selector chain, outermost first.
    pub selectors: Vec<Selector>,
    /// The merged declarations of every rule with this chain.
    pub style: Style,
    /// Position of the chain's first appearance, for tie-breaks.
    pub order: usize,
}

/// A set of rules answering cascade queries.
#[derive(Debug, Clone)]
pub struct Stylesheet {
    buckets: Vec<Vec<Rule>>,
    universal: Vec<Rule>,
    next_order: usize,
}

/// Bucket index for a tag name.
fn bucket_index(element: &str) -> usize {
    element.bytes().map(usize::from).sum::<usize>() % HASH_SIZE
}

impl Stylesheet {
    /// An empty stylesheet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buckets: vec![Vec::new(); HASH_SIZE],
            universal: Vec::new(),
            next_order: 0,
        }
    }

    /// Parse CSS source into a new stylesheet.
    #[must_use]
    pub fn parse(css: &str) -> Self {
        let mut sheet = Self::new();
        sheet.add_css(css);
        sheet
    }

    /// Parse CSS source and add its rules after the existing ones.
    pub fn add_css(&mut self, css: &str) {
        parser::parse_stylesheet(css, self);
    }

    /// Add a rule. If a rule with an equal chain already exists, `style` is
    /// merged into it and the rule keeps its original position.
    pub fn add_rule(&mut self, selectors: Vec<Selector>, style: &Style) {
        let Some(innermost) = selectors.last() else {
            return;
        };
        let list = match &innermost.element {
            Some(element) => &mut self.buckets[bucket_index(element)],
            None => &mut self.universal,
        };
        if let Some(existing) = list.iter_mut().find(|r| r.selectors == selectors) {
            existing.style.merge(style);
            return;
        }
        list.push(Rule {
            selectors,
            style: style.clone(),
            order: self.next_order,
        });
        self.next_order += 1;
    }

    /// Add every rule of `other`, in its source order, after this sheet's.
    pub fn extend(&mut self, other: &Self) {
        for rule in other.rules() {
            self.add_rule(rule.selectors.clone(), &rule.style);
        }
    }

    /// All rules in source order.
    #[must_use]
    pub fn rules(&self) -> Vec<&Rule> {
        let mut rules: Vec<&Rule> = self
            .buckets
            .iter()
            .flatten()
            .chain(&self.universal)
            .collect();
        rules.sort_by_key(|r| r.order);
        rules
    }

    /// Number of distinct selector chains.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum::<usize>() + self.universal.len()
    }

    /// Whether the sheet has no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every rule matching `chain` with its score, sorted ascending by
    /// (specificity, source order).
    ///
    /// Only rules no longer than the query whose innermost selector matches
    /// the query's innermost element are scored.
    #[must_use]
    pub fn matching_rules(&self, chain: &[Selector]) -> Vec<(Specificity, &Rule)> {
        let Some(subject) = chain.last() else {
            return Vec::new();
        };
        let bucket = subject
            .element
            .as_deref()
            .map_or(&[][..], |element| self.buckets[bucket_index(element)].as_slice());
        let mut matches: Vec<(Specificity, &Rule)> = bucket
            .iter()
            .chain(&self.universal)
            .filter(|rule| rule.selectors.len() <= chain.len())
            .filter_map(|rule| match_chain(&rule.selectors, chain).map(|score| (score, rule)))
            .collect();
        matches.sort_by_key(|(score, rule)| (*score, rule.order));
        matches
    }

    /// The cascaded style for the innermost element of `chain`.
    ///
    /// The accumulator starts from `parent` with [`Style::blank`] applied,
    /// then each matching rule is applied in ascending order so that higher
    /// specificity (and, at equal specificity, later source order) wins.
    /// The result depends only on the arguments.
    #[must_use]
    pub fn get_style(&self, chain: &[Selector], parent: &ComputedStyle) -> ComputedStyle {
        self.matching_rules(chain)
            .into_iter()
            .fold(parent.cascade(&Style::blank(), parent), |acc, (_, rule)| {
                acc.cascade(&rule.style, parent)
            })
    }
}

impl Default for Stylesheet {
    fn default() -> Self {
        Self::new()
    }
}
