pub type Result<T> = std::result::Result<T, RusterstatsError>;

/// Boxed error returned by user supplied reducers.
pub type ReducerError = Box<dyn std::error::Error + Send + Sync>;

#[derive(thiserror::Error, Debug)]
pub enum RusterstatsError {
    #[cfg(feature = "gdal")]
    #[error(transparent)]
    GdalError(#[from] gdal::errors::GdalError),
    #[error(transparent)]
    NdarrayError(#[from] ndarray::ShapeError),
    #[error("Stat '{0}' is not a valid statistic")]
    UnknownStat(String),
    #[error("Stat '{0}' must be 'percentile_<q>' with q a number between 0 and 100")]
    InvalidPercentile(String),
    #[error("An affine transform is required to use an in memory array as raster")]
    MissingTransform,
    #[error("Band {band} does not exist, raster has {count} band(s)")]
    BandOutOfRange { band: usize, count: usize },
    #[error("Rasterized geometry has shape {mask:?} but the raster window has shape {window:?}")]
    ShapeMismatch {
        mask: (usize, usize),
        window: (usize, usize),
    },
    #[error("Window {window:?} is outside of raster with shape {shape:?}")]
    WindowOutOfBounds {
        window: (usize, usize, usize, usize),
        shape: (usize, usize),
    },
    #[error("Reducer '{name}' failed")]
    Reducer {
        name: String,
        #[source]
        source: ReducerError,
    },
    #[error("Interpolation '{0}' is not supported, use 'nearest' or 'bilinear'")]
    UnknownInterpolation(String),
}
