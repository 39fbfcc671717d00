//! Fixed table layout.
//!
//! [§ 17.5.2.1 Fixed table layout](https://www.w3.org/TR/CSS2/tables.html#fixed-table-layout)
//!
//! "With this (fast) algorithm, the horizontal layout of the table does not
//! depend on the contents of the cells; it only depends on the table's
//! width, the width of the columns, and borders or cell spacing."
//!
//! Column widths come from the cells of the first row. Each cell is its own
//! block formatting context; a row is as tall as its tallest cell and every
//! cell in it is stretched to that height.

use kestrel_common::warning::warn_once;

use super::box_tree::{BoxId, BoxKind};
use super::float::FloatContext;
use super::{LayoutEngine, LayoutError, px};
use crate::style::{Height, Width};

/// The width a first-row cell asks for its column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnWidth {
    /// Share the remaining width equally with the other `auto` columns.
    Auto,
    /// A fixed number of pixels.
    Length(i32),
    /// A percentage of the table width.
    Percent(f32),
}

/// [§ 17.5.2.1 Fixed table layout](https://www.w3.org/TR/CSS2/tables.html#fixed-table-layout)
///
/// "Any remaining columns equally divide the remaining horizontal table
/// space (minus borders or cell spacing)."
///
/// "If the table is wider than the columns, the extra space should be
/// distributed over the columns."
///
/// `table_width` is the table's own width, `None` for `auto`; an auto table
/// sizes percentages and auto columns against `available`. Integer
/// remainders go one pixel each to the leftmost columns, so with a fixed
/// table width no narrower than its fixed columns the widths sum exactly
/// to it.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]
pub fn fixed_column_widths(columns: &[ColumnWidth], table_width: Option<i32>, available: i32) -> Vec<i32> {
    let target = table_width.unwrap_or(available).max(0);
    let mut widths: Vec<i32> = columns
        .iter()
        .map(|column| match *column {
            ColumnWidth::Auto => 0,
            ColumnWidth::Length(width) => width.max(0),
            ColumnWidth::Percent(percent) => px(target as f32 * percent / 100.0).max(0),
        })
        .collect();

    let remainder = (target - widths.iter().sum::<i32>()).max(0);
    let auto: Vec<usize> = columns
        .iter()
        .enumerate()
        .filter(|(_, c)| **c == ColumnWidth::Auto)
        .map(|(i, _)| i)
        .collect();

    let receivers: Vec<usize> = if !auto.is_empty() {
        auto
    } else if table_width.is_some() {
        (0..columns.len()).collect()
    } else {
        Vec::new()
    };
    if !receivers.is_empty() {
        let count = receivers.len() as i32;
        let share = remainder / count;
        let extra = (remainder % count) as usize;
        for (n, &i) in receivers.iter().enumerate() {
            widths[i] += share + i32::from(n < extra);
        }
    }
    widths
}

impl LayoutEngine<'_> {
    /// Lay out table `id` within `available` pixels.
    pub(crate) fn layout_table(&mut self, id: BoxId, available: i32) -> Result<(), LayoutError> {
        let table_width = self.used_width(id, available);
        let rows = self.tree[id].children.clone();

        let columns: Vec<ColumnWidth> = rows
            .iter()
            .find(|&&r| self.tree[r].kind == BoxKind::TableRow)
            .map(|&row| {
                self.tree[row]
                    .children
                    .iter()
                    .map(|&cell| {
                        let style = &self.tree[cell].style;
                        match style.width {
                            Width::Auto => ColumnWidth::Auto,
                            Width::Length(length) => ColumnWidth::Length(px(length.to_px(style.font_size))),
                            Width::Percent(percent) => ColumnWidth::Percent(percent),
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        let widths = fixed_column_widths(&columns, table_width, available);
        let width = table_width.unwrap_or_else(|| widths.iter().sum());

        #[cfg(feature = "layout-trace")]
        super::trace(&format!("table #{} width={width} columns={widths:?}", id.0));

        let mut y = 0;
        for row in rows {
            self.tree[row].x = 0;
            self.tree[row].y = y;
            if self.tree[row].kind == BoxKind::TableRow {
                self.layout_row(row, &widths, width)?;
            } else {
                let mut context = FloatContext::new(row);
                self.layout_block(row, width, &mut context, 0, 0)?;
                self.close_context(context);
            }
            y += self.tree[row].height;
        }

        let style = &self.tree[id].style;
        // [§ 17.5.3] "The height of a table is given by the 'height' property
        // for the 'table' or 'inline-table' element."; a shorter height is a
        // minimum, never a clip.
        let height = match style.height {
            Height::Auto => y,
            Height::Length(length) => y.max(px(length.to_px(style.font_size))),
        };
        self.tree[id].width = width;
        self.tree[id].height = height;
        self.tree[id].col_widths = widths;
        Ok(())
    }

    /// [§ 17.5.3 Table height algorithms](https://www.w3.org/TR/CSS2/tables.html#height-layout)
    ///
    /// "The height of a 'table-row' element's box is calculated once the
    /// user agent has all the cells in the row available: it is the maximum
    /// of the row's computed 'height', the computed 'height' of each cell in
    /// the row, and the minimum height (MIN) required by the cells."
    fn layout_row(&mut self, row: BoxId, widths: &[i32], table_width: i32) -> Result<(), LayoutError> {
        let cells = self.tree[row].children.clone();
        if cells.len() > widths.len() {
            warn_once("Layout", "table row has more cells than the first row; extra cells get no width");
        }
        let mut x = 0;
        let mut height = 0;
        for (column, &cell) in cells.iter().enumerate() {
            let width = widths.get(column).copied().unwrap_or(0);
            self.tree[cell].x = x;
            self.tree[cell].y = 0;
            let mut context = FloatContext::new(cell);
            self.layout_block_sized(cell, width, &mut context, 0, 0)?;
            self.close_context(context);
            height = height.max(self.tree[cell].height);
            x += width;
        }
        for &cell in &cells {
            self.tree[cell].height = height;
        }
        self.tree[row].width = table_width;
        self.tree[row].height = height;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_columns_share_remainder() {
        let widths = fixed_column_widths(
            &[ColumnWidth::Length(100), ColumnWidth::Auto, ColumnWidth::Auto],
            Some(401),
            800,
        );
        assert_eq!(widths, vec![100, 151, 150]);
    }

    #[test]
    fn test_slack_spread_when_no_auto_columns() {
        let widths = fixed_column_widths(&[ColumnWidth::Length(100), ColumnWidth::Length(50)], Some(300), 800);
        assert_eq!(widths, vec![175, 125]);
    }

    #[test]
    fn test_auto_table_width_is_column_sum() {
        let widths = fixed_column_widths(&[ColumnWidth::Length(100), ColumnWidth::Percent(10.0)], None, 500);
        assert_eq!(widths, vec![100, 50]);
    }

    #[test]
    fn test_overfull_fixed_columns_keep_their_widths() {
        let widths = fixed_column_widths(&[ColumnWidth::Length(300), ColumnWidth::Auto], Some(200), 800);
        assert_eq!(widths, vec![300, 0]);
    }
}
