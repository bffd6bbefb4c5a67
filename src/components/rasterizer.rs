use geo::{Geometry, Intersects, Point, Relate};
use ndarray::Array2;

use crate::{components::transforms::GeoTransform, errors::Result};

/// Burns a geometry into a boolean grid aligned with a raster window.
///
/// `transform` is the window transform and `dim` its `(rows, cols)`.
/// Cells inside the geometry under the inclusion policy are `true`.
pub trait Rasterizer: Send + Sync {
    fn rasterize(
        &self,
        geometry: &Geometry,
        transform: &GeoTransform,
        dim: (usize, usize),
        all_touched: bool,
    ) -> Result<Array2<bool>>;
}

/// Rasterizer built on `geo` predicates.
///
/// Center policy keeps cells whose center intersects the geometry,
/// all touched policy keeps cells whose interior the geometry overlaps.
/// Lines have no area to hold a cell center and are always burned
/// along every cell they cross.
#[derive(Debug, Default, Clone, Copy)]
pub struct GeoRasterizer;

fn is_lineal(geometry: &Geometry) -> bool {
    matches!(
        geometry,
        Geometry::Line(_) | Geometry::LineString(_) | Geometry::MultiLineString(_)
    )
}

impl Rasterizer for GeoRasterizer {
    fn rasterize(
        &self,
        geometry: &Geometry,
        transform: &GeoTransform,
        dim: (usize, usize),
        all_touched: bool,
    ) -> Result<Array2<bool>> {
        let lineal = is_lineal(geometry);
        Ok(Array2::from_shape_fn(dim, |(row, col)| {
            let center = Point::from(transform.cell_center(col, row));
            let center_inside = !lineal && geometry.intersects(&center);
            if center_inside || !(all_touched || lineal) {
                return center_inside;
            }
            let cell = transform.cell_rect(col, row).to_polygon();
            geometry.intersects(&cell) && !geometry.relate(&cell).is_touches()
        }))
    }
}
