//! Zonal statistics: summaries of raster values per vector geometry.

mod components;
mod errors;
mod point;
pub mod stats;
mod zonal;

pub use components::{
    geometry, ArraySource, Extent, Feature, GeoRasterizer, GeoTransform, PixelWindow, Properties,
    RasterShape, RasterSource, Rasterizer, Value,
};
#[cfg(feature = "gdal")]
pub use components::backends::gdal_backend::{
    features_from_wkt, read_features, FeatureReader, GdalRaster, GdalRasterizer, LayerSelector,
};
pub use errors::{ReducerError, Result, RusterstatsError};
pub use point::{bilinear, point_query, Interpolation, PointQueryOptions};
pub use stats::{CategoryMap, FeatureStats, MaskedArray, MiniRaster, Stat, StatSet};
pub use zonal::{zonal_stats, ZonalStats, ZonalStatsOptions};

#[cfg(feature = "gdal")]
use num::traits::AsPrimitive;

#[cfg(feature = "gdal")]
fn tuple_to<TO: Copy + 'static, TI: AsPrimitive<TO>>(tuple: (TI, TI)) -> (TO, TO) {
    (tuple.0.as_(), tuple.1.as_())
}
