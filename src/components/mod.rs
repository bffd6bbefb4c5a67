pub mod backends;
pub mod bounds;
pub mod extent;
pub mod features;
pub mod geometry;
pub mod rasterizer;
pub mod reader;
pub mod transforms;

pub use bounds::{PixelWindow, RasterShape};
pub use extent::Extent;
pub use features::{Feature, Properties, Value};
pub use rasterizer::{GeoRasterizer, Rasterizer};
pub use reader::{ArraySource, RasterSource};
pub use transforms::GeoTransform;
