//! Float placement.
//!
//! [§ 9.5 Floats](https://www.w3.org/TR/CSS2/visuren.html#floats)
//!
//! "A float is a box that is shifted to the left or right on the current line.
//! The most interesting characteristic of a float is that content may flow along
//! its side (or be prohibited from doing so by the 'clear' property)."
//!
//! Every block formatting context owns one [`FloatContext`]. Rectangles in
//! it are relative to the box that established the context, so a query from
//! a nested block must add that block's offset first.

use serde::Serialize;

use super::box_tree::BoxId;
use super::{LayoutError, MAX_FLOAT_ITERATIONS, MAX_LAYOUT_HEIGHT};
use crate::style::Clear;

/// [§ 9.5.1 Positioning the float](https://www.w3.org/TR/CSS2/visuren.html#float-position)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FloatSide {
    /// "The element generates a block box that is floated to the left."
    Left,
    /// "The element generates a block box that is floated to the right."
    Right,
}

/// An axis-aligned rectangle in integer pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Rect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width.
    pub width: i32,
    /// Height.
    pub height: i32,
}

impl Rect {
    /// The first x past the right edge.
    #[must_use]
    pub const fn right(&self) -> i32 {
        self.x + self.width
    }

    /// The first y below the bottom edge.
    #[must_use]
    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Whether this rectangle shares any row with `[y0, y1)`. An empty range
    /// is treated as the single row `y0`.
    #[must_use]
    pub fn overlaps_rows(&self, y0: i32, y1: i32) -> bool {
        let y1 = y1.max(y0 + 1);
        self.y < y1 && y0 < self.bottom()
    }
}

/// A float registered with a block formatting context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedFloat {
    /// The float box.
    pub id: BoxId,
    /// The side it is shifted to.
    pub side: FloatSide,
    /// Its margin box in the context owner's coordinates.
    pub rect: Rect,
}

/// The horizontal band left free by floats at some range of rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sides {
    /// Left edge of the band.
    pub x0: i32,
    /// Right edge of the band.
    pub x1: i32,
    /// Index of the left float narrowing the band, if any.
    pub left: Option<usize>,
    /// Index of the right float narrowing the band, if any.
    pub right: Option<usize>,
}

impl Sides {
    /// Width of the band.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.x1 - self.x0
    }

    /// Whether any float narrows the band.
    #[must_use]
    pub const fn constrained(&self) -> bool {
        self.left.is_some() || self.right.is_some()
    }
}

/// The floats of one block formatting context.
///
/// [§ 9.4.1 Block formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#block-formatting)
///
/// "In a block formatting context, each box's left outer edge touches the
/// left edge of the containing block ... This is true even in the presence
/// of floats (although a box's line boxes may shrink due to the floats)."
#[derive(Debug, Clone)]
pub struct FloatContext {
    /// The box that established the context.
    pub owner: BoxId,
    floats: Vec<PlacedFloat>,
}

impl FloatContext {
    /// An empty context for `owner`.
    #[must_use]
    pub const fn new(owner: BoxId) -> Self {
        Self {
            owner,
            floats: Vec::new(),
        }
    }

    /// Floats in placement order.
    #[must_use]
    pub fn floats(&self) -> &[PlacedFloat] {
        &self.floats
    }

    /// The float boxes in placement order, consuming the context.
    #[must_use]
    pub fn into_ids(self) -> Vec<BoxId> {
        self.floats.into_iter().map(|f| f.id).collect()
    }

    /// Whether no float has been placed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.floats.is_empty()
    }

    /// Register a placed float.
    pub fn add(&mut self, id: BoxId, side: FloatSide, rect: Rect) {
        self.floats.push(PlacedFloat { id, side, rect });
    }

    /// Narrow `[x0, x1)` by every float overlapping rows `[y0, y1)`.
    ///
    /// The band never inverts: when floats overlap each other the right
    /// edge is clamped to the left edge.
    #[must_use]
    pub fn find_sides(&self, y0: i32, y1: i32, x0: i32, x1: i32) -> Sides {
        let mut sides = Sides {
            x0,
            x1,
            left: None,
            right: None,
        };
        for (index, float) in self.floats.iter().enumerate() {
            if !float.rect.overlaps_rows(y0, y1) {
                continue;
            }
            match float.side {
                FloatSide::Left => {
                    if float.rect.right() > sides.x0 {
                        sides.x0 = float.rect.right();
                        sides.left = Some(index);
                    }
                }
                FloatSide::Right => {
                    if float.rect.x < sides.x1 {
                        sides.x1 = float.rect.x;
                        sides.right = Some(index);
                    }
                }
            }
        }
        sides.x1 = sides.x1.max(sides.x0);
        sides
    }

    /// [§ 9.5.2 The 'clear' property](https://www.w3.org/TR/CSS2/visuren.html#flow-control)
    ///
    /// "Requires that the top border edge of the box be below the bottom
    /// outer edge of any left-floating boxes."
    ///
    /// The first row below every float `clear` applies to, or 0.
    #[must_use]
    pub fn clear(&self, clear: Clear) -> i32 {
        self.floats
            .iter()
            .filter(|f| match clear {
                Clear::None => false,
                Clear::Left => f.side == FloatSide::Left,
                Clear::Right => f.side == FloatSide::Right,
                Clear::Both => true,
            })
            .map(|f| f.rect.bottom())
            .max()
            .unwrap_or(0)
    }

    /// The lowest float bottom, or 0.
    #[must_use]
    pub fn max_bottom(&self) -> i32 {
        self.floats.iter().map(|f| f.rect.bottom()).max().unwrap_or(0)
    }

    /// The first row below the floats narrowing `sides`: the nearer of the
    /// two bottoms when both sides are constrained.
    #[must_use]
    pub fn next_free_row(&self, sides: &Sides) -> Option<i32> {
        let bottom = |index: Option<usize>| index.and_then(|i| self.floats.get(i)).map(|f| f.rect.bottom());
        match (bottom(sides.left), bottom(sides.right)) {
            (Some(l), Some(r)) => Some(l.min(r)),
            (Some(b), None) | (None, Some(b)) => Some(b),
            (None, None) => None,
        }
    }

    /// [§ 9.5.1 Positioning the float](https://www.w3.org/TR/CSS2/visuren.html#float-position)
    ///
    /// "A floating box must be placed as high as possible."
    ///
    /// Search downward from `y_start` for the first row where a float of
    /// `width` by `height` fits between the floats already placed, and
    /// return its rectangle. A float wider than `[x0, x1)` is placed at the
    /// first row where nothing else narrows the band.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::FloatPlacement`] when the search exceeds
    /// [`MAX_FLOAT_ITERATIONS`] candidates or [`MAX_LAYOUT_HEIGHT`].
    pub fn place_float_below(
        &self,
        side: FloatSide,
        width: i32,
        height: i32,
        y_start: i32,
        x0: i32,
        x1: i32,
    ) -> Result<Rect, LayoutError> {
        let mut y = y_start;
        for iteration in 0..MAX_FLOAT_ITERATIONS {
            if y > MAX_LAYOUT_HEIGHT {
                return Err(LayoutError::FloatPlacement {
                    iterations: iteration,
                    y,
                });
            }
            let sides = self.find_sides(y, y + height, x0, x1);
            if width <= sides.width() || !sides.constrained() {
                let x = match side {
                    FloatSide::Left => sides.x0,
                    FloatSide::Right => sides.x1 - width,
                };
                return Ok(Rect {
                    x,
                    y,
                    width,
                    height,
                });
            }
            match self.next_free_row(&sides) {
                Some(next) if next > y => y = next,
                _ => y += 1,
            }
        }
        Err(LayoutError::FloatPlacement {
            iterations: MAX_FLOAT_ITERATIONS,
            y,
        })
    }
}
