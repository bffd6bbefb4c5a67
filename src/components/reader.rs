use ndarray::{s, Array2, Array3, Axis};
use num::traits::AsPrimitive;
use std::fmt::Debug;

use crate::{
    components::{
        bounds::{PixelWindow, RasterShape},
        transforms::GeoTransform,
    },
    errors::{Result, RusterstatsError},
};

/// Read access to a georeferenced raster.
///
/// Bands are 1-based, as in GDAL.
pub trait RasterSource: Send + Sync + Debug {
    fn transform(&self) -> Result<GeoTransform>;
    fn shape(&self) -> RasterShape;
    fn band_count(&self) -> usize;
    fn nodata(&self, band: usize) -> Option<f64>;
    /// Whether the whole raster is already held in memory.
    fn in_memory(&self) -> bool {
        false
    }
    /// `(rows, cols)` array of `window` from `band`.
    fn read_window(&self, band: usize, window: &PixelWindow) -> Result<Array2<f64>>;

    fn check_band(&self, band: usize) -> Result<()> {
        let count = self.band_count();
        if band == 0 || band > count {
            return Err(RusterstatsError::BandOutOfRange { band, count });
        }
        Ok(())
    }

    fn check_window(&self, window: &PixelWindow) -> Result<()> {
        let shape = self.shape();
        if !window.within(shape) {
            return Err(RusterstatsError::WindowOutOfBounds {
                window: window.as_tuple(),
                shape: shape.dim(),
            });
        }
        Ok(())
    }
}

/// Raster held in memory as a `(bands, rows, cols)` array.
///
/// Arrays carry no georeferencing, the transform has to be supplied
/// before the source is used for statistics.
#[derive(Debug, Clone)]
pub struct ArraySource {
    array: Array3<f64>,
    transform: Option<GeoTransform>,
    nodata: Option<f64>,
}

impl ArraySource {
    pub fn new<T: AsPrimitive<f64>>(array: Array2<T>) -> Self {
        Self::from_bands(array.insert_axis(Axis(0)))
    }

    pub fn from_bands<T: AsPrimitive<f64>>(array: Array3<T>) -> Self {
        Self {
            array: array.mapv(|value| value.as_()),
            transform: None,
            nodata: None,
        }
    }

    pub fn with_transform(mut self, transform: impl Into<GeoTransform>) -> Self {
        self.transform = Some(transform.into());
        self
    }

    pub fn with_nodata(mut self, nodata: f64) -> Self {
        self.nodata = Some(nodata);
        self
    }
}

impl RasterSource for ArraySource {
    fn transform(&self) -> Result<GeoTransform> {
        self.transform.ok_or(RusterstatsError::MissingTransform)
    }

    fn shape(&self) -> RasterShape {
        let (_, rows, cols) = self.array.dim();
        RasterShape::new(rows, cols)
    }

    fn band_count(&self) -> usize {
        self.array.len_of(Axis(0))
    }

    fn nodata(&self, _band: usize) -> Option<f64> {
        self.nodata
    }

    fn in_memory(&self) -> bool {
        true
    }

    fn read_window(&self, band: usize, window: &PixelWindow) -> Result<Array2<f64>> {
        self.check_band(band)?;
        self.check_window(window)?;
        let (col, row) = window.offset();
        let (width, height) = window.size();
        Ok(self
            .array
            .slice(s![band - 1, row..row + height, col..col + width])
            .to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array};

    #[test]
    fn reads_window_of_band() {
        let array = Array::from_shape_vec((2, 3, 3), (0..18).collect::<Vec<i32>>()).unwrap();
        let source = ArraySource::from_bands(array).with_transform([0., 1., 0., 3., 0., -1.]);
        assert_eq!(source.band_count(), 2);
        assert_eq!(source.shape(), RasterShape::new(3, 3));
        let window = source
            .read_window(2, &PixelWindow::new((1, 1), (2, 1)))
            .unwrap();
        assert_eq!(window, array![[13., 14.]]);
    }

    #[test]
    fn missing_transform_is_an_error() {
        let source = ArraySource::new(array![[1u8, 2], [3, 4]]);
        assert!(matches!(
            source.transform(),
            Err(RusterstatsError::MissingTransform)
        ));
    }

    #[test]
    fn rejects_bad_band_and_window() {
        let source = ArraySource::new(array![[1u8, 2], [3, 4]]).with_nodata(0.);
        assert_eq!(source.nodata(1), Some(0.));
        assert!(matches!(
            source.read_window(2, &PixelWindow::new((0, 0), (1, 1))),
            Err(RusterstatsError::BandOutOfRange { band: 2, count: 1 })
        ));
        assert!(matches!(
            source.read_window(1, &PixelWindow::new((1, 1), (2, 2))),
            Err(RusterstatsError::WindowOutOfBounds { .. })
        ));
    }
}
