//! The render tree.
//!
//! [§ 9.2 Controlling box generation](https://www.w3.org/TR/CSS2/visuren.html#box-gen)
//!
//! Boxes live in one arena and refer to each other by [`BoxId`]. A box owns
//! its `children`; a block that establishes a block formatting context also
//! lists, in `float_children`, the floats placed against it. That list is a
//! side table only: each float is still owned by its parent in `children`.

use std::ops::{Index, IndexMut};

use kestrel_dom::NodeId;
use serde::Serialize;

use super::LayoutError;
use super::float::FloatSide;
use crate::style::ComputedStyle;

/// Index of a box in its [`BoxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BoxId(pub usize);

/// The variants of box the builder creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BoxKind {
    /// A block-level box stacking its children vertically.
    Block,
    /// An inline leaf: a text run or a replaced element.
    Inline,
    /// [§ 9.2.1.1 Anonymous block boxes](https://www.w3.org/TR/CSS2/visuren.html#anonymous-block-level)
    ///
    /// Anonymous block wrapping a run of inline boxes and floats.
    InlineContainer,
    /// A fixed-layout table whose children are rows.
    Table,
    /// A table row whose children are cells.
    TableRow,
    /// A table cell, laid out as a block in its column.
    TableCell,
    /// A floated box wrapping one block child.
    Float(FloatSide),
}

/// A span of the tree's text buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextSpan {
    /// Byte offset into [`BoxTree::text_buffer`].
    pub start: usize,
    /// Length in bytes.
    pub len: usize,
}

/// One node of the render tree.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutBox {
    /// What kind of box this is.
    pub kind: BoxKind,
    /// The cascaded style.
    pub style: ComputedStyle,
    /// Horizontal offset from the parent box.
    pub x: i32,
    /// Vertical offset from the parent box.
    pub y: i32,
    /// Width in px.
    pub width: i32,
    /// Height in px.
    pub height: i32,
    /// The text of an [`BoxKind::Inline`] text run.
    pub text: Option<TextSpan>,
    /// Intrinsic (width, height) of a replaced inline box.
    pub replaced: Option<(i32, i32)>,
    /// The DOM node this box was generated for; `None` for anonymous boxes.
    #[serde(skip)]
    pub node: Option<NodeId>,
    /// The parent box.
    #[serde(skip)]
    pub parent: Option<BoxId>,
    /// Owned children in order.
    pub children: Vec<BoxId>,
    /// Floats placed in this box's block formatting context.
    pub float_children: Vec<BoxId>,
    /// Column widths chosen for a [`BoxKind::Table`].
    pub col_widths: Vec<i32>,
}

/// The runs as the builder left them. Line breaking splits and shortens
/// runs, so each layout starts again from this.
#[derive(Debug, Clone)]
struct BuiltRuns {
    len: usize,
    text: Vec<Option<TextSpan>>,
}

/// The arena of boxes plus the text they reference.
#[derive(Debug, Clone, Serialize)]
pub struct BoxTree {
    boxes: Vec<LayoutBox>,
    text_buffer: String,
    #[serde(skip)]
    built: Option<BuiltRuns>,
}

impl BoxTree {
    /// The root block is always at index 0.
    pub const ROOT: BoxId = BoxId(0);

    /// A tree holding just a root block with `style`.
    #[must_use]
    pub fn new(style: ComputedStyle, node: Option<NodeId>) -> Self {
        let mut tree = Self {
            boxes: Vec::new(),
            text_buffer: String::new(),
            built: None,
        };
        tree.boxes.push(LayoutBox::new(BoxKind::Block, style, node));
        tree
    }

    /// Number of boxes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    /// Always `false`: the root exists from construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Get a box.
    #[must_use]
    pub fn get(&self, id: BoxId) -> Option<&LayoutBox> {
        self.boxes.get(id.0)
    }

    /// Every box id in allocation order.
    pub fn ids(&self) -> impl Iterator<Item = BoxId> {
        (0..self.boxes.len()).map(BoxId)
    }

    /// Children of a box.
    #[must_use]
    pub fn children(&self, id: BoxId) -> &[BoxId] {
        self.get(id).map_or(&[], |b| b.children.as_slice())
    }

    /// The whole text buffer.
    #[must_use]
    pub fn text_buffer(&self) -> &str {
        &self.text_buffer
    }

    /// The text of a box, empty for boxes without text.
    #[must_use]
    pub fn text(&self, id: BoxId) -> &str {
        self.get(id)
            .and_then(|b| b.text)
            .and_then(|span| self.text_buffer.get(span.start..span.start + span.len))
            .unwrap_or_default()
    }

    /// Allocate a detached box.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::NoMemory`] if the arena cannot grow.
    pub fn alloc(
        &mut self,
        kind: BoxKind,
        style: ComputedStyle,
        node: Option<NodeId>,
    ) -> Result<BoxId, LayoutError> {
        self.boxes
            .try_reserve(1)
            .map_err(|_| LayoutError::NoMemory)?;
        let id = BoxId(self.boxes.len());
        self.boxes.push(LayoutBox::new(kind, style, node));
        Ok(id)
    }

    /// Append `child` as the last child of `parent`.
    pub fn append_child(&mut self, parent: BoxId, child: BoxId) {
        self.boxes[parent.0].children.push(child);
        self.boxes[child.0].parent = Some(parent);
    }

    /// Allocate a box and append it to `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::NoMemory`] if the arena cannot grow.
    pub fn append(
        &mut self,
        parent: BoxId,
        kind: BoxKind,
        style: ComputedStyle,
        node: Option<NodeId>,
    ) -> Result<BoxId, LayoutError> {
        let id = self.alloc(kind, style, node)?;
        self.append_child(parent, id);
        Ok(id)
    }

    /// Copy `text` into the buffer.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::NoMemory`] if the buffer cannot grow.
    pub fn push_text(&mut self, text: &str) -> Result<TextSpan, LayoutError> {
        self.text_buffer
            .try_reserve(text.len())
            .map_err(|_| LayoutError::NoMemory)?;
        let start = self.text_buffer.len();
        self.text_buffer.push_str(text);
        Ok(TextSpan {
            start,
            len: text.len(),
        })
    }

    /// Split the text run `id` at byte `head_len`: `id` keeps the first
    /// `head_len` bytes and a new sibling inserted right after it gets the
    /// text from byte `tail_start` on.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::NoMemory`] if the arena cannot grow.
    pub fn split_text(
        &mut self,
        id: BoxId,
        head_len: usize,
        tail_start: usize,
    ) -> Result<BoxId, LayoutError> {
        let original = &self.boxes[id.0];
        let span = original.text.unwrap_or(TextSpan { start: 0, len: 0 });
        let (style, node, parent) = (original.style.clone(), original.node, original.parent);

        let tail = self.alloc(BoxKind::Inline, style, node)?;
        self.boxes[tail.0].text = Some(TextSpan {
            start: span.start + tail_start,
            len: span.len.saturating_sub(tail_start),
        });
        self.boxes[id.0].text = Some(TextSpan {
            start: span.start,
            len: head_len,
        });
        if let Some(parent) = parent {
            let siblings = &mut self.boxes[parent.0].children;
            let position = siblings.iter().position(|&c| c == id).map_or(siblings.len(), |p| p + 1);
            siblings.insert(position, tail);
            self.boxes[tail.0].parent = Some(parent);
        }
        Ok(tail)
    }

    /// Shorten a text run to its first `len` bytes.
    pub fn truncate_text(&mut self, id: BoxId, len: usize) {
        if let Some(span) = self.boxes[id.0].text.as_mut() {
            span.len = span.len.min(len);
        }
    }

    /// Drop the spaces a text run starts with.
    pub fn trim_text_start(&mut self, id: BoxId) {
        let text = self.text(id);
        let trimmed = text.len() - text.trim_start_matches(' ').len();
        if let Some(span) = self.boxes[id.0].text.as_mut() {
            span.start += trimmed;
            span.len -= trimmed;
        }
    }

    /// Undo the previous layout before a fresh one.
    ///
    /// The first call records the runs as built. Later calls drop the
    /// fragments line breaking split off and give every run its built text
    /// back. Every call clears geometry and float lists.
    pub fn reset_geometry(&mut self) {
        let built = self.built.get_or_insert_with(|| BuiltRuns {
            len: self.boxes.len(),
            text: self.boxes.iter().map(|b| b.text).collect(),
        });
        self.boxes.truncate(built.len);
        for (b, &text) in self.boxes.iter_mut().zip(&built.text) {
            b.text = text;
            b.children.retain(|c| c.0 < built.len);
            b.x = 0;
            b.y = 0;
            b.width = 0;
            b.height = 0;
            b.float_children.clear();
            b.col_widths.clear();
        }
    }

    /// Position of a box relative to the root, summing parent offsets.
    #[must_use]
    pub fn absolute_position(&self, id: BoxId) -> (i32, i32) {
        let mut x = 0;
        let mut y = 0;
        let mut current = Some(id);
        while let Some(b) = current.and_then(|c| self.get(c)) {
            x += b.x;
            y += b.y;
            current = b.parent;
        }
        (x, y)
    }

    /// Pre-order walk of the subtree under `id`.
    #[must_use]
    pub fn descendants(&self, id: BoxId) -> Vec<BoxId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev());
        }
        out
    }
}

impl Index<BoxId> for BoxTree {
    type Output = LayoutBox;

    fn index(&self, id: BoxId) -> &LayoutBox {
        &self.boxes[id.0]
    }
}

impl IndexMut<BoxId> for BoxTree {
    fn index_mut(&mut self, id: BoxId) -> &mut LayoutBox {
        &mut self.boxes[id.0]
    }
}

impl LayoutBox {
    fn new(kind: BoxKind, style: ComputedStyle, node: Option<NodeId>) -> Self {
        Self {
            kind,
            style,
            x: 0,
            y: 0,
            width: 0,
            height: 0,
            text: None,
            replaced: None,
            node,
            parent: None,
            children: Vec::new(),
            float_children: Vec::new(),
            col_widths: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_text_inserts_sibling() {
        let mut tree = BoxTree::new(ComputedStyle::base(), None);
        let ic = tree
            .append(BoxTree::ROOT, BoxKind::InlineContainer, ComputedStyle::base(), None)
            .unwrap();
        let run = tree
            .append(ic, BoxKind::Inline, ComputedStyle::base(), None)
            .unwrap();
        let after = tree
            .append(ic, BoxKind::Inline, ComputedStyle::base(), None)
            .unwrap();
        tree[run].text = Some(tree.push_text("hello world").unwrap());

        let tail = tree.split_text(run, 5, 6).unwrap();
        assert_eq!(tree.text(run), "hello");
        assert_eq!(tree.text(tail), "world");
        assert_eq!(tree.children(ic), &[run, tail, after]);
        assert_eq!(tree[tail].parent, Some(ic));
    }

    #[test]
    fn test_reset_geometry_restores_built_runs() {
        let mut tree = BoxTree::new(ComputedStyle::base(), None);
        let ic = tree
            .append(BoxTree::ROOT, BoxKind::InlineContainer, ComputedStyle::base(), None)
            .unwrap();
        let run = tree
            .append(ic, BoxKind::Inline, ComputedStyle::base(), None)
            .unwrap();
        tree[run].text = Some(tree.push_text(" hello world").unwrap());
        tree.reset_geometry();
        let built = tree.len();

        tree.trim_text_start(run);
        assert_eq!(tree.text(run), "hello world");
        let _ = tree.split_text(run, 5, 6).unwrap();
        assert_eq!(tree.len(), built + 1);

        tree.reset_geometry();
        assert_eq!(tree.len(), built);
        assert_eq!(tree.text(run), " hello world");
        assert_eq!(tree.children(ic), &[run]);
    }

    #[test]
    fn test_absolute_position_sums_offsets() {
        let mut tree = BoxTree::new(ComputedStyle::base(), None);
        let a = tree
            .append(BoxTree::ROOT, BoxKind::Block, ComputedStyle::base(), None)
            .unwrap();
        let b = tree.append(a, BoxKind::Block, ComputedStyle::base(), None).unwrap();
        tree[a].x = 3;
        tree[a].y = 10;
        tree[b].x = 4;
        tree[b].y = 5;
        assert_eq!(tree.absolute_position(b), (7, 15));
    }
}
