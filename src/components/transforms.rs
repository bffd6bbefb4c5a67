use geo::{AffineTransform, Coord, Rect};
use shrinkwraprs::Shrinkwrap;

use crate::components::bounds::PixelWindow;

fn affine_from_gdal(gdal_transform: [f64; 6]) -> AffineTransform {
    AffineTransform::new(
        gdal_transform[1],
        gdal_transform[2],
        gdal_transform[0],
        gdal_transform[4],
        gdal_transform[5],
        gdal_transform[3],
    )
}

/// Affine mapping from pixel `(col, row)` to geographic `(x, y)`.
///
/// Built from GDAL ordered coefficients
/// `(origin_x, pixel_width, row_rotation, origin_y, col_rotation, pixel_height)`.
/// Rotation terms are carried along but pixel arithmetic ignores them.
#[derive(Shrinkwrap, Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform(AffineTransform);

impl From<[f64; 6]> for GeoTransform {
    fn from(value: [f64; 6]) -> Self {
        Self::from_gdal(value)
    }
}

impl GeoTransform {
    /// North up transform without rotation.
    pub fn new(origin_x: f64, pixel_width: f64, origin_y: f64, pixel_height: f64) -> Self {
        Self::from_gdal([origin_x, pixel_width, 0., origin_y, 0., pixel_height])
    }

    pub fn from_gdal(coefficients: [f64; 6]) -> Self {
        Self(affine_from_gdal(coefficients))
    }

    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.0.xoff(),
            self.0.a(),
            self.0.b(),
            self.0.yoff(),
            self.0.d(),
            self.0.e(),
        ]
    }

    pub fn origin(&self) -> (f64, f64) {
        (self.0.xoff(), self.0.yoff())
    }

    pub fn pixel_width(&self) -> f64 {
        self.0.a()
    }

    /// Usually negative for north up rasters.
    pub fn pixel_height(&self) -> f64 {
        self.0.e()
    }

    /// Fractional `(col, row)` of a geographic coordinate.
    pub fn to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let (origin_x, origin_y) = self.origin();
        (
            (x - origin_x) / self.pixel_width(),
            (y - origin_y) / self.pixel_height(),
        )
    }

    /// Geographic coordinate of a (fractional) pixel position.
    pub fn to_geo(&self, col: f64, row: f64) -> (f64, f64) {
        let (origin_x, origin_y) = self.origin();
        (
            origin_x + col * self.pixel_width(),
            origin_y + row * self.pixel_height(),
        )
    }

    pub fn cell_center(&self, col: usize, row: usize) -> Coord {
        Coord::from(self.to_geo(col as f64 + 0.5, row as f64 + 0.5))
    }

    pub fn cell_rect(&self, col: usize, row: usize) -> Rect {
        let min = self.to_geo(col as f64, row as f64);
        let max = self.to_geo(col as f64 + 1., row as f64 + 1.);
        Rect::new(min, max)
    }

    /// Transform of a window whose top left pixel sits at the window offset.
    pub fn window_transform(&self, window: &PixelWindow) -> Self {
        let (col_off, row_off) = window.offset();
        let (origin_x, origin_y) = self.to_geo(col_off as f64, row_off as f64);
        Self::new(origin_x, self.pixel_width(), origin_y, self.pixel_height())
    }
}
