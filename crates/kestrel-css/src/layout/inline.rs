//! Line breaking.
//!
//! [§ 9.4.2 Inline formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#inline-formatting)
//!
//! "In an inline formatting context, boxes are laid out horizontally, one
//! after the other, beginning at the top of a containing block."
//!
//! "In general, the left edge of a line box touches the left edge of its
//! containing block and the right edge touches the right edge of its
//! containing block. However, floating boxes may come between the
//! containing block edge and the line box edge."
//!
//! Each line is measured twice. The first pass takes the band free of
//! floats at the line's top and finds how tall the line will be; the second
//! takes the band over that whole height and places boxes in it, so no box
//! ever overlaps a float beside the line.

use super::box_tree::{BoxId, BoxKind};
use super::float::{FloatContext, FloatSide, Rect};
use super::{LayoutEngine, LayoutError, MAX_FLOAT_ITERATIONS, MAX_LAYOUT_HEIGHT, px};
use crate::style::TextAlign;

/// An inline container being laid out, positioned at `(cx, cy)` in the
/// coordinates of its float context's owner.
struct Frame {
    container: BoxId,
    width: i32,
    cx: i32,
    cy: i32,
}

enum Line {
    /// The line is finished; the next line starts at child `next`, `bottom`
    /// pixels below the container's top.
    Done { next: usize, bottom: i32 },
    /// Floats changed the band; measure the line again.
    Retry { first: usize, y: i32 },
}

impl LayoutEngine<'_> {
    /// Break the children of container `id` into lines `width` pixels wide.
    pub(crate) fn layout_inline_container(
        &mut self,
        id: BoxId,
        width: i32,
        floats: &mut FloatContext,
        cx: i32,
        cy: i32,
    ) -> Result<(), LayoutError> {
        let frame = Frame {
            container: id,
            width,
            cx,
            cy,
        };
        self.tree[id].width = width;
        let mut y = 0;
        let mut index = 0;
        // Splitting text inserts children, so the length is read each time.
        while index < self.tree[id].children.len() {
            let (next, bottom) = self.layout_line(&frame, index, y, floats)?;
            index = next.max(index + 1);
            y = bottom;
            if y > MAX_LAYOUT_HEIGHT {
                return Err(LayoutError::TooTall { y });
            }
        }
        self.tree[id].height = y;
        Ok(())
    }

    /// Lay out one line starting at child `first`, `y` pixels below the
    /// container's top. Returns the next child and the line's bottom.
    fn layout_line(
        &mut self,
        frame: &Frame,
        first: usize,
        y: i32,
        floats: &mut FloatContext,
    ) -> Result<(usize, i32), LayoutError> {
        let (mut first, mut y) = (first, y);
        for _ in 0..MAX_FLOAT_ITERATIONS {
            match self.try_line(frame, first, y, floats)? {
                Line::Done { next, bottom } => return Ok((next, bottom)),
                Line::Retry { first: f, y: retry_y } => {
                    first = f;
                    y = retry_y;
                }
            }
            if frame.cy + y > MAX_LAYOUT_HEIGHT {
                break;
            }
        }
        Err(LayoutError::FloatPlacement {
            iterations: MAX_FLOAT_ITERATIONS,
            y: frame.cy + y,
        })
    }

    #[allow(clippy::cast_precision_loss)]
    fn try_line(
        &mut self,
        frame: &Frame,
        first: usize,
        y: i32,
        floats: &mut FloatContext,
    ) -> Result<Line, LayoutError> {
        let children = self.tree[frame.container].children.clone();
        if first >= children.len() {
            return Ok(Line::Done {
                next: first,
                bottom: y,
            });
        }
        let top = frame.cy + y;
        let (left_edge, right_edge) = (frame.cx, frame.cx + frame.width);

        // STEP 1: Measure the line's height against the band at its top,
        // counting the first box that does not fit.
        let band = floats.find_sides(top, top, left_edge, right_edge);
        let mut used = 0;
        let mut height = 0;
        for &child in &children[first..] {
            if matches!(self.tree[child].kind, BoxKind::Float(_)) {
                continue;
            }
            let (w, h) = self.inline_size(child);
            height = height.max(h);
            used += w;
            if used > band.width() {
                break;
            }
        }

        // STEP 2: Take the band over the full height and place boxes.
        let sides = floats.find_sides(top, top + height, left_edge, right_edge);
        let mut x0 = sides.x0 - frame.cx;
        let mut x1 = sides.x1 - frame.cx;
        let mut x = x0;
        let mut line_height = 0;
        let mut placed: Vec<BoxId> = Vec::new();
        let mut index = first;

        #[cfg(feature = "layout-trace")]
        super::trace(&format!(
            "line #{}[{first}..] y={y} band=[{x0}, {x1}) height={height}",
            frame.container.0
        ));

        while let Some(&child) = children.get(index) {
            // [§ 9.5.1] "A floating box must be placed as high as possible."
            if let BoxKind::Float(side) = self.tree[child].kind {
                let (fw, fh) = self.layout_float(child, frame.width)?;
                let beside = floats.find_sides(top, top + fh, frame.cx + x0, frame.cx + x1);
                let fits = x + fw <= x1 && beside.x0 == frame.cx + x0 && beside.x1 == frame.cx + x1;
                if placed.is_empty() {
                    // Nothing on the line yet, so the line is measured again
                    // around the float wherever it lands.
                    let rect = if fits {
                        let fx = match side {
                            FloatSide::Left => x0,
                            FloatSide::Right => x1 - fw,
                        };
                        Rect {
                            x: frame.cx + fx,
                            y: top,
                            width: fw,
                            height: fh,
                        }
                    } else {
                        floats.place_float_below(side, fw, fh, top, left_edge, right_edge)?
                    };
                    self.register_float(child, side, rect, frame, floats);
                    return Ok(Line::Retry {
                        first: index + 1,
                        y,
                    });
                }
                let rect = if fits {
                    let fx = match side {
                        FloatSide::Left => {
                            for &id in &placed {
                                self.tree[id].x += fw;
                            }
                            let fx = x0;
                            x0 += fw;
                            x += fw;
                            fx
                        }
                        FloatSide::Right => {
                            x1 -= fw;
                            x1
                        }
                    };
                    Rect {
                        x: frame.cx + fx,
                        y: top,
                        width: fw,
                        height: fh,
                    }
                } else {
                    floats.place_float_below(side, fw, fh, top + height, left_edge, right_edge)?
                };
                self.register_float(child, side, rect, frame, floats);
                index += 1;
                continue;
            }

            // [§ 16.6.1] "If a space (U+0020) at the beginning of a line has
            // 'white-space' set to 'normal', 'nowrap', or 'pre-line', it is
            // removed."
            if placed.is_empty() && self.tree[child].text.is_some() {
                self.tree.trim_text_start(child);
            }

            let (w, h) = self.inline_size(child);
            if x + w <= x1 {
                self.place(child, x, y, w, h);
                x += w;
                line_height = line_height.max(h);
                placed.push(child);
                index += 1;
                continue;
            }

            // STEP 3: Split the run at the last space before the edge.
            if self.tree[child].text.is_some() {
                let text = self.tree.text(child);
                let len = text.len();
                let (split, split_width) =
                    self.font
                        .split_position(&self.tree[child].style, text, (x1 - x) as f32);
                if split > 0 {
                    self.break_text(child, split, len)?;
                    let w = if split < len { px(split_width.ceil()) } else { w.min(x1 - x) };
                    self.place(child, x, y, w, h);
                    x += w;
                    line_height = line_height.max(h);
                    placed.push(child);
                    index += 1;
                    break;
                }
            }

            if placed.is_empty() {
                // STEP 4: Nothing fits on an empty line. Drop below the
                // nearest float if one narrows the band...
                if let Some(next) = floats.next_free_row(&sides) {
                    return Ok(Line::Retry {
                        first: index,
                        y: next - frame.cy,
                    });
                }
                // ...otherwise overflow with the first word rather than loop.
                let w = self.force_first_word(child)?;
                self.place(child, x, y, w, h);
                x += w;
                line_height = line_height.max(h);
                placed.push(child);
                index += 1;
            }
            break;
        }

        // [§ 16.2 Alignment] is applied once the line's width is known.
        let free = x1 - x;
        let shift = match self.tree[frame.container].style.text_align {
            TextAlign::Left => 0,
            TextAlign::Right => free,
            TextAlign::Center => free / 2,
        };
        if shift > 0 {
            for &id in &placed {
                self.tree[id].x += shift;
            }
        }

        Ok(Line::Done {
            next: index,
            bottom: y + line_height,
        })
    }

    /// Width and height of an inline leaf.
    fn inline_size(&self, id: BoxId) -> (i32, i32) {
        let b = &self.tree[id];
        let line_height = px(b.style.line_height_px().ceil());
        if let Some(size) = b.replaced {
            return size;
        }
        let width = px(self.font.width(&b.style, self.tree.text(id)).ceil());
        (width, line_height)
    }

    fn place(&mut self, id: BoxId, x: i32, y: i32, width: i32, height: i32) {
        let b = &mut self.tree[id];
        b.x = x;
        b.y = y;
        b.width = width;
        b.height = height;
    }

    /// Keep the first `split` bytes of run `id` on this line, moving the
    /// text after the space at `split` to a new run.
    fn break_text(&mut self, id: BoxId, split: usize, len: usize) -> Result<(), LayoutError> {
        if split + 1 < len {
            let _ = self.tree.split_text(id, split, split + 1)?;
        } else {
            self.tree.truncate_text(id, split);
        }
        Ok(())
    }

    /// Cut run `id` after its first word and return the word's width.
    fn force_first_word(&mut self, id: BoxId) -> Result<i32, LayoutError> {
        if self.tree[id].text.is_none() {
            return Ok(self.inline_size(id).0);
        }
        let text = self.tree.text(id);
        let len = text.len();
        let word = len - text.trim_start_matches(' ').len();
        if let Some(space) = text[word..].find(' ') {
            self.break_text(id, word + space, len)?;
        }
        Ok(self.inline_size(id).0)
    }

    /// [§ 10.3.5 Floating, non-replaced elements](https://www.w3.org/TR/CSS2/visudet.html#float-width)
    ///
    /// "If 'width' is computed as 'auto', the used value is the
    /// 'shrink-to-fit' width."
    ///
    /// Lay out float `id` as a new block formatting context and return its
    /// size.
    fn layout_float(&mut self, id: BoxId, available: i32) -> Result<(i32, i32), LayoutError> {
        let Some(&inner) = self.tree[id].children.first() else {
            self.place(id, 0, 0, 0, 0);
            return Ok((0, 0));
        };
        let width = self
            .used_width(inner, available)
            .unwrap_or_else(|| self.preferred_width(inner).min(available));
        let mut context = FloatContext::new(inner);
        self.tree[inner].x = 0;
        self.tree[inner].y = 0;
        self.layout_block_sized(inner, width, &mut context, 0, 0)?;
        self.close_context(context);
        let (w, h) = (self.tree[inner].width, self.tree[inner].height);
        self.tree[id].width = w;
        self.tree[id].height = h;
        Ok((w, h))
    }

    fn register_float(
        &mut self,
        id: BoxId,
        side: FloatSide,
        rect: Rect,
        frame: &Frame,
        floats: &mut FloatContext,
    ) {
        #[cfg(feature = "layout-trace")]
        super::trace(&format!("float #{} {side:?} at {rect:?}", id.0));

        floats.add(id, side, rect);
        self.tree[id].x = rect.x - frame.cx;
        self.tree[id].y = rect.y - frame.cy;
    }
}
