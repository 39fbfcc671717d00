//! Built-in content handlers, one module per [`ContentType`](crate::ContentType).
//!
//! Each module exposes a `create` factory for the registry table.

use kestrel_css::{ApproximateFontMetrics, BoxTree, Stylesheet, build_box_tree, layout_document};
use kestrel_dom::DomTree;

use crate::content::ContentError;

pub mod css;
pub mod html;
pub mod image;
pub mod other;
pub mod textplain;

/// Append `data` to `buffer`, reporting allocation failure instead of
/// aborting.
fn buffer_data(buffer: &mut Vec<u8>, data: &[u8]) -> Result<(), ContentError> {
    buffer.try_reserve(data.len())?;
    buffer.extend_from_slice(data);
    Ok(())
}

/// Generate boxes for `dom` under `sheet` and lay them out `width` pixels
/// wide.
fn render_document(dom: &DomTree, sheet: &Stylesheet, width: i32) -> Result<BoxTree, ContentError> {
    let mut tree = build_box_tree(dom, sheet)?;
    layout_document(&mut tree, width, &ApproximateFontMetrics)?;
    Ok(tree)
}
