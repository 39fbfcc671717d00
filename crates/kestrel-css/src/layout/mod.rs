//! Box tree construction and layout.
//!
//! [CSS 2.1 § 9 Visual formatting model](https://www.w3.org/TR/CSS2/visuren.html)
//!
//! [`BoxBuilder`] turns a styled DOM into a [`BoxTree`]; [`layout_document`]
//! then assigns every box its geometry. Layout is recursive descent over
//! the tree:
//! - blocks stack their children vertically ([`block`])
//! - inline containers break their runs into lines around floats ([`inline`])
//! - floats are tracked per block formatting context ([`float`])
//! - tables use the fixed table layout algorithm ([`table`])
//!
//! Geometry is in integer pixels; `x` and `y` are relative to the parent box.

/// Block flow.
pub mod block;
/// The arena box tree.
pub mod box_tree;
/// Building boxes from a styled DOM.
pub mod builder;
/// Float placement.
pub mod float;
/// Text measurement.
pub mod font_metrics;
/// Line breaking.
pub mod inline;
/// Fixed table layout.
pub mod table;

use thiserror::Error;

pub use box_tree::{BoxId, BoxKind, BoxTree, LayoutBox, TextSpan};
pub use builder::{BoxBuilder, build_box_tree};
pub use float::{FloatContext, FloatSide, PlacedFloat, Rect, Sides};
pub use font_metrics::{ApproximateFontMetrics, FontMetrics};
pub use table::{ColumnWidth, fixed_column_widths};

#[cfg(feature = "layout-trace")]
thread_local! {
    static LAYOUT_DEPTH: std::cell::Cell<usize> = const { std::cell::Cell::new(0) };
}

/// Maximum number of candidate positions tried when placing one float.
pub const MAX_FLOAT_ITERATIONS: usize = 10_000;

/// Layout gives up once content is pushed below this many pixels.
pub const MAX_LAYOUT_HEIGHT: i32 = 1_000_000;

/// Why layout of a document was abandoned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// Allocating boxes or text failed.
    #[error("out of memory during layout")]
    NoMemory,
    /// Float or line placement did not converge.
    #[error("float placement gave up after {iterations} attempts at y={y}")]
    FloatPlacement {
        /// Candidate positions tried.
        iterations: usize,
        /// The last candidate y.
        y: i32,
    },
    /// Content extended past [`MAX_LAYOUT_HEIGHT`].
    #[error("layout exceeded the height limit at y={y}")]
    TooTall {
        /// How far down the content had reached.
        y: i32,
    },
}

/// Lays out a [`BoxTree`] with a given text measurer.
///
/// The methods are spread over the [`block`], [`inline`], [`float`] and
/// [`table`] modules.
pub struct LayoutEngine<'a> {
    pub(crate) tree: &'a mut BoxTree,
    pub(crate) font: &'a dyn FontMetrics,
}

impl<'a> LayoutEngine<'a> {
    /// Create an engine over `tree`.
    #[must_use]
    pub fn new(tree: &'a mut BoxTree, font: &'a dyn FontMetrics) -> Self {
        Self { tree, font }
    }

    /// Lay the whole tree out for a viewport `width` pixels wide.
    ///
    /// Existing geometry is discarded first, so this may be called again
    /// after the viewport changes.
    ///
    /// # Errors
    ///
    /// Returns a [`LayoutError`] if the pass had to be abandoned.
    pub fn layout(&mut self, width: i32) -> Result<(), LayoutError> {
        self.tree.reset_geometry();
        let root = BoxTree::ROOT;
        let mut floats = FloatContext::new(root);
        self.layout_block(root, width.max(0), &mut floats, 0, 0)?;
        self.close_context(floats);
        Ok(())
    }
}

/// Round a float length to whole pixels, clamped to the layout height cap.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub(crate) fn px(value: f32) -> i32 {
    if value.is_nan() {
        return 0;
    }
    let cap = MAX_LAYOUT_HEIGHT as f32;
    value.round().clamp(-cap, cap) as i32
}

/// Print a layout decision, indented by the current nesting depth.
#[cfg(feature = "layout-trace")]
pub(crate) fn trace(message: &str) {
    let depth = LAYOUT_DEPTH.with(std::cell::Cell::get);
    eprintln!("{:indent$}[LAYOUT] {message}", "", indent = depth * 2);
}

/// Adjust the trace nesting depth.
#[cfg(feature = "layout-trace")]
pub(crate) fn trace_depth(delta: isize) {
    LAYOUT_DEPTH.with(|d| d.set(d.get().saturating_add_signed(delta)));
}

/// Lay out `tree` for a viewport `width` pixels wide.
///
/// # Errors
///
/// Returns a [`LayoutError`] if the pass had to be abandoned; the tree's
/// geometry is then incomplete.
pub fn layout_document(
    tree: &mut BoxTree,
    width: i32,
    font: &dyn FontMetrics,
) -> Result<(), LayoutError> {
    LayoutEngine::new(tree, font).layout(width)
}
