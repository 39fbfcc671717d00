//! Box tree construction.
//!
//! [§ 9.2 Controlling box generation](https://www.w3.org/TR/CSS2/visuren.html#box-gen)
//!
//! "The following sections describe the types of boxes that may be
//! generated in CSS 2.1. A box's type affects, in part, its behavior in the
//! visual formatting model."
//!
//! The builder walks the DOM once, cascading each element's style from its
//! parent's and choosing a box from its `display` and `float`. Inline
//! elements get no box of their own: their text is appended to the open
//! inline container of the nearest block, so adjacent inline runs share
//! one container until a block-level sibling closes it.

use kestrel_dom::{DomTree, NodeId, NodeType};

use super::{LayoutError, px};
use super::box_tree::{BoxId, BoxKind, BoxTree};
use super::float::FloatSide;
use crate::parser::parse_declarations;
use crate::selector::Selector;
use crate::style::{ComputedStyle, Display, Float, Height, Width};
use crate::stylesheet::Stylesheet;

/// Builds a [`BoxTree`] from a DOM and a stylesheet.
pub struct BoxBuilder<'a> {
    dom: &'a DomTree,
    sheet: &'a Stylesheet,
    tree: BoxTree,
    /// Selectors of the open elements, outermost first.
    chain: Vec<Selector>,
}

impl<'a> BoxBuilder<'a> {
    /// Start a tree for the document element of `dom`.
    #[must_use]
    pub fn new(dom: &'a DomTree, sheet: &'a Stylesheet) -> Self {
        let base = ComputedStyle::base();
        let mut chain = Vec::new();
        let (style, node) = match dom.document_element() {
            Some(root) => {
                if let Some(element) = dom.element(root) {
                    chain.push(Selector::from_element(element));
                }
                let mut style = sheet.get_style(&chain, &base);
                if let Some(inline) = dom.element(root).and_then(|e| e.attr("style")) {
                    style = style.cascade(&parse_declarations(inline), &base);
                }
                (style, Some(root))
            }
            None => (base, None),
        };
        Self {
            dom,
            sheet,
            tree: BoxTree::new(style, node),
            chain,
        }
    }

    /// Generate boxes for the whole document.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::NoMemory`] if a box could not be allocated.
    pub fn build(mut self) -> Result<BoxTree, LayoutError> {
        if let Some(root) = self.tree[BoxTree::ROOT].node {
            let style = self.tree[BoxTree::ROOT].style.clone();
            self.children(root, BoxTree::ROOT, &style)?;
        }
        Ok(self.tree)
    }

    fn node(
        &mut self,
        node: NodeId,
        parent: BoxId,
        parent_style: &ComputedStyle,
        container: &mut Option<BoxId>,
    ) -> Result<(), LayoutError> {
        let dom = self.dom;
        match dom.node(node).map(|n| &n.data) {
            Some(NodeType::Element(element)) => {
                self.chain.push(Selector::from_element(element));
                let result = self.element(node, parent, parent_style, container);
                let _ = self.chain.pop();
                result
            }
            Some(NodeType::Text(text)) => self.text(node, text, parent, parent_style, container),
            _ => Ok(()),
        }
    }

    fn element(
        &mut self,
        node: NodeId,
        parent: BoxId,
        parent_style: &ComputedStyle,
        container: &mut Option<BoxId>,
    ) -> Result<(), LayoutError> {
        let dom = self.dom;
        let Some(element) = dom.element(node) else {
            return Ok(());
        };
        let mut style = self.sheet.get_style(&self.chain, parent_style);
        // [§ 6.4.3 The 'style' attribute] applies after every rule.
        if let Some(inline) = element.attr("style") {
            style = style.cascade(&parse_declarations(inline), parent_style);
        }

        if style.display == Display::None {
            return Ok(());
        }

        // [§ 9.7 Relationships between 'display', 'position', and 'float']
        //
        // "Otherwise, if 'float' has a value other than 'none', the box is
        // floated and 'display' is set according to the table below."
        if let Some(side) = match style.float {
            Float::None => None,
            Float::Left => Some(FloatSide::Left),
            Float::Right => Some(FloatSide::Right),
        } {
            let line = self.open_container(parent, container)?;
            let float = self
                .tree
                .append(line, BoxKind::Float(side), style.clone(), Some(node))?;
            let style = ComputedStyle {
                display: Display::Block,
                float: Float::None,
                ..style
            };
            let block = self.tree.append(float, BoxKind::Block, style.clone(), Some(node))?;
            return self.children(node, block, &style);
        }

        let kind = match style.display {
            Display::Block => BoxKind::Block,
            Display::Table => BoxKind::Table,
            Display::TableRow => BoxKind::TableRow,
            Display::TableCell => BoxKind::TableCell,
            Display::Inline | Display::None => {
                return self.inline_element(node, parent, &style, container);
            }
        };
        *container = None;
        let parent = self.fit_parent(parent, kind)?;
        let id = self.tree.append(parent, kind, style.clone(), Some(node))?;
        self.children(node, id, &style)
    }

    /// Recurse into `node`'s children with a fresh inline container.
    fn children(&mut self, node: NodeId, parent: BoxId, style: &ComputedStyle) -> Result<(), LayoutError> {
        let dom = self.dom;
        let mut container = None;
        for child in dom.children(node) {
            self.node(child, parent, style, &mut container)?;
        }
        Ok(())
    }

    /// Inline elements add nothing but their content, except for the
    /// replaced `img` and the line-ending `br`.
    fn inline_element(
        &mut self,
        node: NodeId,
        parent: BoxId,
        style: &ComputedStyle,
        container: &mut Option<BoxId>,
    ) -> Result<(), LayoutError> {
        let dom = self.dom;
        let Some(element) = dom.element(node) else {
            return Ok(());
        };
        match element.name.as_str() {
            "br" => {
                *container = None;
                Ok(())
            }
            "img" => {
                let width = dimension(element.attr("width")).or(match style.width {
                    Width::Length(length) => Some(length.to_px(style.font_size)),
                    Width::Auto | Width::Percent(_) => None,
                });
                let height = dimension(element.attr("height")).or(match style.height {
                    Height::Length(length) => Some(length.to_px(style.font_size)),
                    Height::Auto => None,
                });
                match (width, height, element.attr("alt")) {
                    (None, None, Some(alt)) if !alt.trim().is_empty() => {
                        self.text(node, alt, parent, style, container)
                    }
                    (width, height, _) => {
                        let line = self.open_container(parent, container)?;
                        let id = self.tree.append(line, BoxKind::Inline, style.clone(), Some(node))?;
                        self.tree[id].replaced = Some((to_px(width), to_px(height)));
                        Ok(())
                    }
                }
            }
            _ => {
                for child in dom.children(node) {
                    self.node(child, parent, style, container)?;
                }
                Ok(())
            }
        }
    }

    /// [§ 16.6.1 The 'white-space' processing model](https://www.w3.org/TR/CSS2/text.html#white-space-model)
    ///
    /// Runs of white space collapse to one space, and a space directly after
    /// another (or at the start of a container) is dropped.
    fn text(
        &mut self,
        node: NodeId,
        text: &str,
        parent: BoxId,
        style: &ComputedStyle,
        container: &mut Option<BoxId>,
    ) -> Result<(), LayoutError> {
        let collapsed = collapse_whitespace(text);
        if collapsed.is_empty() || (collapsed == " " && container.is_none()) {
            return Ok(());
        }
        let line = self.open_container(parent, container)?;
        let after_space = self
            .tree
            .children(line)
            .last()
            .is_none_or(|&last| self.tree[last].text.is_some() && self.tree.text(last).ends_with(' '));
        let run = if after_space {
            collapsed.trim_start()
        } else {
            collapsed.as_str()
        };
        if run.is_empty() {
            return Ok(());
        }
        let id = self.tree.append(line, BoxKind::Inline, style.clone(), Some(node))?;
        let span = self.tree.push_text(run)?;
        self.tree[id].text = Some(span);
        Ok(())
    }

    /// The open inline container of `parent`, creating one if needed.
    fn open_container(&mut self, parent: BoxId, container: &mut Option<BoxId>) -> Result<BoxId, LayoutError> {
        if let Some(open) = *container {
            return Ok(open);
        }
        let parent = self.fit_parent(parent, BoxKind::InlineContainer)?;
        let style = self.tree[parent].style.clone();
        let id = self.tree.append(parent, BoxKind::InlineContainer, style, None)?;
        *container = Some(id);
        Ok(id)
    }

    /// [§ 17.2.1 Anonymous table objects](https://www.w3.org/TR/CSS2/tables.html#anonymous-boxes)
    ///
    /// "Document languages other than HTML may not contain all the elements
    /// in the CSS 2.1 table model. In these cases, the 'missing' elements
    /// must be assumed in order for the table model to work."
    ///
    /// Returns the box a new box of `kind` should be appended to, creating
    /// anonymous tables, rows and cells around it as needed.
    fn fit_parent(&mut self, parent: BoxId, kind: BoxKind) -> Result<BoxId, LayoutError> {
        let wrapper = match (self.tree[parent].kind, kind) {
            (BoxKind::Table, BoxKind::TableRow) | (BoxKind::TableRow, BoxKind::TableCell) => {
                return Ok(parent);
            }
            (BoxKind::Table, _) => BoxKind::TableRow,
            (BoxKind::TableRow, _) => BoxKind::TableCell,
            (_, BoxKind::TableRow) => BoxKind::Table,
            (_, BoxKind::TableCell) => BoxKind::TableRow,
            _ => return Ok(parent),
        };
        let host = self.fit_parent(parent, wrapper)?;
        let reusable = self
            .tree
            .children(host)
            .last()
            .copied()
            .filter(|&last| self.tree[last].node.is_none() && self.tree[last].kind == wrapper);
        let anonymous = match reusable {
            Some(existing) => existing,
            None => {
                let style = ComputedStyle {
                    display: match wrapper {
                        BoxKind::Table => Display::Table,
                        BoxKind::TableRow => Display::TableRow,
                        _ => Display::TableCell,
                    },
                    width: Width::Auto,
                    height: Height::Auto,
                    ..self.tree[host].style.clone()
                };
                self.tree.append(host, wrapper, style, None)?
            }
        };
        self.fit_parent(anonymous, kind)
    }
}

/// Build the box tree for `dom` styled by `sheet`.
///
/// # Errors
///
/// Returns [`LayoutError::NoMemory`] if a box could not be allocated.
pub fn build_box_tree(dom: &DomTree, sheet: &Stylesheet) -> Result<BoxTree, LayoutError> {
    BoxBuilder::new(dom, sheet).build()
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_ascii_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// An HTML dimension attribute: `120` or `120px`.
fn dimension(value: Option<&str>) -> Option<f32> {
    let value = value?.trim();
    value
        .strip_suffix("px")
        .unwrap_or(value)
        .trim()
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

fn to_px(value: Option<f32>) -> i32 {
    value.map_or(0, px)
}
