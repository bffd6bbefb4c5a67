use geo::{Coord, Rect};
use serde::{Deserialize, Serialize};
use shrinkwraprs::Shrinkwrap;

use crate::components::transforms::GeoTransform;

/// Full raster size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RasterShape {
    pub rows: usize,
    pub cols: usize,
}

impl RasterShape {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// `(rows, cols)`, the ndarray order.
    pub fn dim(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }
}

impl From<(usize, usize)> for RasterShape {
    fn from(value: (usize, usize)) -> Self {
        Self::new(value.0, value.1)
    }
}

/// Rectangular pixel region of a raster.
///
/// - `offset`: `(col, row)` of the top left pixel of the window,
///   counted from the top left pixel of the raster.
/// - `size`: `(width, height)` in pixels.
///
/// Stored as a `Rect` whose `min` is the offset.
#[derive(Shrinkwrap, Debug, Clone, Copy, PartialEq)]
pub struct PixelWindow(Rect<usize>);

impl PixelWindow {
    pub fn new(offset: (usize, usize), size: (usize, usize)) -> Self {
        let offset = Coord::from(offset);
        let max = offset + Coord::from(size);
        Self(Rect::new(offset, max))
    }

    /// Window covering the whole raster.
    pub fn full(shape: RasterShape) -> Self {
        Self::new((0, 0), (shape.cols, shape.rows))
    }

    /// Pixel window covering `bounds`, clipped to the raster.
    ///
    /// Corners are floored (min) and ceiled (max) so every cell the bounds
    /// touch is inside the window. A window lying off the raster collapses to
    /// zero width or height, never negative.
    pub fn from_bounds(bounds: &Rect, transform: &GeoTransform, shape: RasterShape) -> Self {
        let (min, max) = (bounds.min(), bounds.max());
        let corners = [
            transform.to_pixel(min.x, min.y),
            transform.to_pixel(min.x, max.y),
            transform.to_pixel(max.x, min.y),
            transform.to_pixel(max.x, max.y),
        ];
        let (mut col_min, mut row_min) = (f64::INFINITY, f64::INFINITY);
        let (mut col_max, mut row_max) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for (col, row) in corners {
            col_min = col_min.min(col);
            col_max = col_max.max(col);
            row_min = row_min.min(row);
            row_max = row_max.max(row);
        }

        let clip = |value: f64, upper: usize| value.max(0.).min(upper as f64) as usize;
        let (col_start, col_end) = (
            clip(col_min.floor(), shape.cols),
            clip(col_max.ceil(), shape.cols),
        );
        let (row_start, row_end) = (
            clip(row_min.floor(), shape.rows),
            clip(row_max.ceil(), shape.rows),
        );

        Self::new(
            (col_start, row_start),
            (col_end - col_start, row_end - row_start),
        )
    }

    /// `(col, row)` of the top left pixel.
    pub fn offset(&self) -> (usize, usize) {
        self.0.min().x_y()
    }

    /// `(width, height)`
    pub fn size(&self) -> (usize, usize) {
        (self.0.width(), self.0.height())
    }

    /// `(rows, cols)` of the array read through this window.
    pub fn dim(&self) -> (usize, usize) {
        (self.0.height(), self.0.width())
    }

    pub fn is_empty(&self) -> bool {
        self.0.width() == 0 || self.0.height() == 0
    }

    pub fn within(&self, shape: RasterShape) -> bool {
        let max = self.0.max();
        max.x <= shape.cols && max.y <= shape.rows
    }

    /// Same window expressed relative to the top left pixel of `outer`.
    pub fn relative_to(&self, outer: &PixelWindow) -> Self {
        let (col, row) = self.offset();
        let (outer_col, outer_row) = outer.offset();
        Self::new((col - outer_col, row - outer_row), self.size())
    }

    /// `(col, row, width, height)`
    pub fn as_tuple(&self) -> (usize, usize, usize, usize) {
        let (col, row) = self.offset();
        let (width, height) = self.size();
        (col, row, width, height)
    }
}
