//! Block flow.
//!
//! [§ 9.4.1 Block formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#block-formatting)
//!
//! "In a block formatting context, boxes are laid out one after the other,
//! vertically, beginning at the top of a containing block."
//!
//! The root, every float and every table cell establish a new context; all
//! other blocks share their ancestor's [`FloatContext`] and pass down their
//! offset from its owner as `(cx, cy)`.

use super::box_tree::{BoxId, BoxKind};
use super::float::FloatContext;
use super::{LayoutEngine, LayoutError, MAX_LAYOUT_HEIGHT, px};
use crate::style::{Clear, Height, Width};

impl LayoutEngine<'_> {
    /// [§ 10.3.3 Block-level, non-replaced elements in normal flow](https://www.w3.org/TR/CSS2/visudet.html#blockwidth)
    ///
    /// Resolve the used width of block `id` against `available` and lay it
    /// out at offset `(cx, cy)` from the owner of `floats`.
    pub(crate) fn layout_block(
        &mut self,
        id: BoxId,
        available: i32,
        floats: &mut FloatContext,
        cx: i32,
        cy: i32,
    ) -> Result<(), LayoutError> {
        let width = self.used_width(id, available).unwrap_or(available);
        self.layout_block_sized(id, width, floats, cx, cy)
    }

    /// Lay out block `id` with a width already decided.
    pub(crate) fn layout_block_sized(
        &mut self,
        id: BoxId,
        width: i32,
        floats: &mut FloatContext,
        cx: i32,
        cy: i32,
    ) -> Result<(), LayoutError> {
        #[cfg(feature = "layout-trace")]
        super::trace(&format!("block #{} width={width} at ({cx}, {cy})", id.0));
        #[cfg(feature = "layout-trace")]
        super::trace_depth(1);

        self.tree[id].width = width.max(0);
        let content = self.layout_block_children(id, width.max(0), floats, cx, cy);

        #[cfg(feature = "layout-trace")]
        super::trace_depth(-1);

        let content = content?;
        // [§ 10.6.3] "If 'height' is 'auto', the height depends on whether
        // the element has any block-level children..."
        let style = &self.tree[id].style;
        self.tree[id].height = match style.height {
            Height::Auto => content,
            Height::Length(length) => px(length.to_px(style.font_size)).max(0),
        };
        Ok(())
    }

    /// Stack the children of `id` vertically and return their total height.
    ///
    /// [§ 9.5.2 The 'clear' property](https://www.w3.org/TR/CSS2/visuren.html#flow-control)
    ///
    /// A child with `clear` starts below the bottom of every float on the
    /// cleared side(s) already placed in this formatting context.
    fn layout_block_children(
        &mut self,
        id: BoxId,
        width: i32,
        floats: &mut FloatContext,
        cx: i32,
        cy: i32,
    ) -> Result<i32, LayoutError> {
        let mut y = 0;
        for child in self.tree[id].children.clone() {
            let kind = self.tree[child].kind;
            let clear = self.tree[child].style.clear;
            if matches!(kind, BoxKind::Block | BoxKind::Table) && clear != Clear::None {
                y = y.max(floats.clear(clear) - cy);
            }
            self.tree[child].x = 0;
            self.tree[child].y = y;
            match kind {
                BoxKind::InlineContainer => {
                    self.layout_inline_container(child, width, floats, cx, cy + y)?;
                }
                BoxKind::Table => self.layout_table(child, width)?,
                _ => self.layout_block(child, width, floats, cx, cy + y)?,
            }
            y += self.tree[child].height;
            if y > MAX_LAYOUT_HEIGHT {
                return Err(LayoutError::TooTall { y });
            }
        }
        Ok(y)
    }

    /// [§ 10.6.7 'Auto' heights for block formatting context roots](https://www.w3.org/TR/CSS2/visudet.html#root-height)
    ///
    /// "If the element has any floating descendants whose bottom margin edge
    /// is below the element's bottom content edge, then the height is
    /// increased to include those edges."
    ///
    /// Record the floats of a finished context on its owner.
    pub(crate) fn close_context(&mut self, floats: FloatContext) {
        let owner = floats.owner;
        let bottom = floats.max_bottom();
        self.tree[owner].float_children = floats.into_ids();
        if self.tree[owner].style.height == Height::Auto {
            let height = &mut self.tree[owner].height;
            *height = (*height).max(bottom);
        }
    }

    /// The used width `id` declares, or `None` for `auto`.
    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn used_width(&self, id: BoxId, available: i32) -> Option<i32> {
        let style = &self.tree[id].style;
        match style.width {
            Width::Auto => None,
            Width::Length(length) => Some(px(length.to_px(style.font_size)).max(0)),
            Width::Percent(percent) => Some(px(available as f32 * percent / 100.0).max(0)),
        }
    }

    /// [§ 10.3.5 Floating, non-replaced elements](https://www.w3.org/TR/CSS2/visudet.html#float-width)
    ///
    /// "Roughly: calculate the preferred width by formatting the content
    /// without breaking lines other than where explicit line breaks occur."
    pub(crate) fn preferred_width(&self, id: BoxId) -> i32 {
        let b = &self.tree[id];
        match b.kind {
            BoxKind::Inline => match b.replaced {
                Some((width, _)) => width,
                None => px(self.font.width(&b.style, self.tree.text(id)).ceil()),
            },
            BoxKind::InlineContainer | BoxKind::TableRow => {
                b.children.iter().map(|&c| self.preferred_width(c)).sum()
            }
            BoxKind::Float(_) => b.children.iter().map(|&c| self.preferred_width(c)).max().unwrap_or(0),
            BoxKind::Block | BoxKind::Table | BoxKind::TableCell => match b.style.width {
                Width::Length(length) => px(length.to_px(b.style.font_size)).max(0),
                Width::Auto | Width::Percent(_) => b
                    .children
                    .iter()
                    .map(|&c| self.preferred_width(c))
                    .max()
                    .unwrap_or(0),
            },
        }
    }
}
