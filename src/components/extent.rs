use log::info;
use ndarray::{s, Array2};

use crate::{
    components::{bounds::PixelWindow, reader::RasterSource},
    errors::Result,
};

/// Where per feature arrays come from.
#[derive(Debug)]
pub enum Extent {
    /// Read each feature window from the source.
    Local,
    /// Whole band read once, feature windows are sliced out of it.
    Global {
        window: PixelWindow,
        array: Array2<f64>,
    },
}

impl Extent {
    /// Global extent only pays off for sources that are not in memory already,
    /// in memory sources always use [`Extent::Local`].
    pub fn new<S: RasterSource + ?Sized>(source: &S, band: usize, global: bool) -> Result<Self> {
        if !global || source.in_memory() {
            return Ok(Self::Local);
        }
        let window = PixelWindow::full(source.shape());
        info!("reading global extent {:?} of band {band}", window.as_tuple());
        let array = source.read_window(band, &window)?;
        Ok(Self::Global { window, array })
    }

    pub fn is_global(&self) -> bool {
        matches!(self, Self::Global { .. })
    }

    /// `(rows, cols)` array of `window`.
    pub fn fetch<S: RasterSource + ?Sized>(
        &self,
        source: &S,
        band: usize,
        window: &PixelWindow,
    ) -> Result<Array2<f64>> {
        match self {
            Self::Local => source.read_window(band, window),
            Self::Global {
                window: global_window,
                array,
            } => {
                let (col, row) = window.relative_to(global_window).offset();
                let (width, height) = window.size();
                Ok(array
                    .slice(s![row..row + height, col..col + width])
                    .to_owned())
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::components::{
        bounds::RasterShape, reader::ArraySource, transforms::GeoTransform,
    };
    use ndarray::Array;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Array backed source that pretends to live on disk and counts reads.
    #[derive(Debug)]
    pub struct DiskLikeSource {
        pub inner: ArraySource,
        pub reads: AtomicUsize,
    }

    impl DiskLikeSource {
        pub fn new(inner: ArraySource) -> Self {
            Self {
                inner,
                reads: AtomicUsize::new(0),
            }
        }
    }

    impl RasterSource for DiskLikeSource {
        fn transform(&self) -> Result<GeoTransform> {
            self.inner.transform()
        }
        fn shape(&self) -> RasterShape {
            self.inner.shape()
        }
        fn band_count(&self) -> usize {
            self.inner.band_count()
        }
        fn nodata(&self, band: usize) -> Option<f64> {
            self.inner.nodata(band)
        }
        fn read_window(&self, band: usize, window: &PixelWindow) -> Result<Array2<f64>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.read_window(band, window)
        }
    }

    fn source() -> DiskLikeSource {
        let array = Array::from_shape_vec((6, 5), (0..30).collect::<Vec<u16>>()).unwrap();
        DiskLikeSource::new(ArraySource::new(array).with_transform([0., 1., 0., 6., 0., -1.]))
    }

    #[test]
    fn global_reads_once_and_matches_local() {
        let source = source();
        let global = Extent::new(&source, 1, true).unwrap();
        assert!(global.is_global());
        assert_eq!(source.reads.load(Ordering::SeqCst), 1);

        let windows = [
            PixelWindow::new((0, 0), (5, 6)),
            PixelWindow::new((1, 2), (3, 2)),
            PixelWindow::new((4, 5), (1, 1)),
        ];
        for window in windows {
            let sliced = global.fetch(&source, 1, &window).unwrap();
            let read = Extent::Local.fetch(&source, 1, &window).unwrap();
            assert_eq!(sliced, read);
        }
        assert_eq!(source.reads.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn in_memory_sources_stay_local() {
        let array = Array::from_shape_vec((2, 2), vec![1., 2., 3., 4.]).unwrap();
        let source = ArraySource::new(array).with_transform([0., 1., 0., 2., 0., -1.]);
        assert!(!Extent::new(&source, 1, true).unwrap().is_global());
    }
}
