/// Raster, vector and rasterization support backed by gdal.
#[cfg(feature = "gdal")]
pub mod gdal_backend {
    use geo::Geometry;
    use gdal::{
        raster::{rasterize, RasterizeOptions},
        vector::{FieldValue, Geometry as GdalGeometry, OwnedFeatureIterator, ToGdal},
        Dataset as GdalDataset, DriverManager,
    };
    use log::debug;
    use ndarray::Array2;
    use std::path::{Path, PathBuf};

    use crate::{
        components::{
            bounds::{PixelWindow, RasterShape},
            features::{Feature, Properties, Value},
            rasterizer::Rasterizer,
            reader::RasterSource,
            transforms::GeoTransform,
        },
        errors::Result,
        tuple_to,
    };

    /// Raster file readable by gdal.
    ///
    /// Metadata is read once on [GdalRaster::open], every window read opens
    /// its own dataset handle which is closed when the read returns.
    #[derive(Debug, Clone)]
    pub struct GdalRaster {
        path: PathBuf,
        transform: GeoTransform,
        shape: RasterShape,
        nodata: Box<[Option<f64>]>,
    }

    impl GdalRaster {
        pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
            let dataset = GdalDataset::open(&path)?;
            let transform = GeoTransform::from_gdal(dataset.geo_transform()?);
            let (cols, rows) = dataset.raster_size();
            let nodata = dataset
                .rasterbands()
                .map(|band| band.map(|band| band.no_data_value()))
                .collect::<gdal::errors::Result<Box<[_]>>>()?;
            Ok(Self {
                path: path.as_ref().to_path_buf(),
                transform,
                shape: RasterShape::new(rows, cols),
                nodata,
            })
        }
    }

    impl RasterSource for GdalRaster {
        fn transform(&self) -> Result<GeoTransform> {
            Ok(self.transform)
        }

        fn shape(&self) -> RasterShape {
            self.shape
        }

        fn band_count(&self) -> usize {
            self.nodata.len()
        }

        fn nodata(&self, band: usize) -> Option<f64> {
            self.nodata.get(band.wrapping_sub(1)).copied().flatten()
        }

        fn read_window(&self, band: usize, window: &PixelWindow) -> Result<Array2<f64>> {
            self.check_band(band)?;
            self.check_window(window)?;
            let dataset = GdalDataset::open(&self.path)?;
            let rasterband = dataset.rasterband(band)?;
            let size = window.size();
            let buffer = rasterband.read_as::<f64>(tuple_to(window.offset()), size, size, None)?;
            let (_, data) = buffer.into_shape_and_vec();
            Ok(Array2::from_shape_vec(window.dim(), data)?)
        }
    }

    /// Rasterizer backed by `GDALRasterizeGeometries` on an in memory dataset.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct GdalRasterizer;

    impl Rasterizer for GdalRasterizer {
        fn rasterize(
            &self,
            geometry: &Geometry,
            transform: &GeoTransform,
            dim: (usize, usize),
            all_touched: bool,
        ) -> Result<Array2<bool>> {
            let (rows, cols) = dim;
            let driver = DriverManager::get_driver_by_name("MEM")?;
            let mut dataset = driver.create_with_band_type::<u8, _>("", cols, rows, 1)?;
            dataset.set_geo_transform(&transform.to_gdal())?;
            rasterize(
                &mut dataset,
                &[1],
                &[geometry.to_gdal()?],
                &[1.0],
                Some(RasterizeOptions {
                    all_touched,
                    ..Default::default()
                }),
            )?;
            let buffer = dataset
                .rasterband(1)?
                .read_as::<u8>((0, 0), (cols, rows), (cols, rows), None)?;
            let (_, data) = buffer.into_shape_and_vec();
            Ok(Array2::from_shape_vec(dim, data)?.mapv(|burned| burned != 0))
        }
    }

    /// Layer of a vector dataset.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum LayerSelector {
        Index(usize),
        Name(String),
    }

    impl Default for LayerSelector {
        fn default() -> Self {
            Self::Index(0)
        }
    }

    impl From<usize> for LayerSelector {
        fn from(value: usize) -> Self {
            Self::Index(value)
        }
    }

    impl From<&str> for LayerSelector {
        fn from(value: &str) -> Self {
            Self::Name(value.to_string())
        }
    }

    fn value_from_field(field: Option<FieldValue>) -> Value {
        match field {
            None => Value::Null,
            Some(FieldValue::IntegerValue(value)) => Value::Int(value.into()),
            Some(FieldValue::Integer64Value(value)) => Value::Int(value),
            Some(FieldValue::RealValue(value)) => Value::Float(value),
            Some(FieldValue::StringValue(value)) => Value::Text(value),
            Some(other) => other.into_string().into(),
        }
    }

    /// Lazy reader over the features of one vector layer, in layer order.
    ///
    /// Owns its dataset. The OGR fid becomes the feature id, fields become
    /// properties. Features without geometry are skipped.
    pub struct FeatureReader {
        features: OwnedFeatureIterator,
    }

    impl Iterator for FeatureReader {
        type Item = Result<Feature>;

        fn next(&mut self) -> Option<Self::Item> {
            let mut features = &mut self.features;
            loop {
                let gdal_feature = features.next()?;
                let Some(gdal_geometry) = gdal_feature.geometry() else {
                    debug!("skipping feature {:?} without geometry", gdal_feature.fid());
                    continue;
                };
                let properties: Properties = gdal_feature
                    .fields()
                    .map(|(name, field)| (name, value_from_field(field)))
                    .collect();
                let id = gdal_feature.fid().map(|fid| fid as i64);
                return Some(gdal_geometry.to_geo().map_err(Into::into).map(|geometry| {
                    Feature {
                        geometry,
                        id,
                        properties: Some(properties),
                    }
                }));
            }
        }
    }

    /// Opens a vector layer for lazy reading, see [FeatureReader].
    pub fn read_features<P: AsRef<Path>>(
        path: P,
        layer: impl Into<LayerSelector>,
    ) -> Result<FeatureReader> {
        let dataset = GdalDataset::open(path)?;
        let layer = match layer.into() {
            LayerSelector::Index(index) => dataset.into_layer(index)?,
            LayerSelector::Name(name) => dataset.into_layer_by_name(&name)?,
        };
        Ok(FeatureReader {
            features: layer.owned_features(),
        })
    }

    /// Features parsed from well known text, without ids.
    pub fn features_from_wkt<S: AsRef<str>>(
        wkts: impl IntoIterator<Item = S>,
    ) -> Result<Vec<Feature>> {
        wkts.into_iter()
            .map(|wkt| Ok(Feature::new(GdalGeometry::from_wkt(wkt.as_ref())?.to_geo()?)))
            .collect()
    }

    #[cfg(test)]
    pub(crate) mod tests {
        use super::*;
        use crate::components::rasterizer::GeoRasterizer;
        use geo::Rect;
        use rstest::rstest;

        /// Writes a single band float GeoTIFF to gdal's in memory filesystem.
        pub fn vsimem_raster(
            name: &str,
            array: &Array2<f64>,
            transform: [f64; 6],
            nodata: Option<f64>,
        ) -> PathBuf {
            let path = PathBuf::from(format!("/vsimem/{name}.tif"));
            let (rows, cols) = array.dim();
            let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
            let mut dataset = driver
                .create_with_band_type::<f64, _>(&path, cols, rows, 1)
                .unwrap();
            dataset.set_geo_transform(&transform).unwrap();
            let mut band = dataset.rasterband(1).unwrap();
            band.set_no_data_value(nodata).unwrap();
            let mut buffer = gdal::raster::Buffer::new((cols, rows), array.iter().copied().collect());
            band.write((0, 0), (cols, rows), &mut buffer).unwrap();
            path
        }

        #[test]
        fn reads_raster_windows() {
            let array = Array2::from_shape_fn((4, 5), |(row, col)| (row * 5 + col) as f64);
            let path = vsimem_raster(
                "reads_raster_windows",
                &array,
                [10., 2., 0., 20., 0., -2.],
                Some(-1.),
            );
            let raster = GdalRaster::open(&path).unwrap();
            assert_eq!(raster.shape(), RasterShape::new(4, 5));
            assert_eq!(raster.band_count(), 1);
            assert_eq!(raster.nodata(1), Some(-1.));
            assert_eq!(raster.nodata(2), None);
            assert_eq!(raster.transform().unwrap().to_gdal(), [10., 2., 0., 20., 0., -2.]);
            let window = PixelWindow::new((1, 2), (3, 2));
            assert_eq!(
                raster.read_window(1, &window).unwrap(),
                array.slice(ndarray::s![2..4, 1..4])
            );
        }

        #[rstest]
        fn gdal_and_geo_rasterizers_agree(#[values(true, false)] all_touched: bool) {
            let transform = GeoTransform::new(0., 1., 6., -1.);
            let polygon: Geometry = Rect::new((0.6, 0.6), (4.4, 3.4)).to_polygon().into();
            let gdal_mask = GdalRasterizer
                .rasterize(&polygon, &transform, (6, 6), all_touched)
                .unwrap();
            let geo_mask = GeoRasterizer
                .rasterize(&polygon, &transform, (6, 6), all_touched)
                .unwrap();
            assert_eq!(gdal_mask, geo_mask);
        }

        const ZONES: &str = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "id": 10, "properties": {"name": "north", "weight": 1.5},
                 "geometry": {"type": "Polygon", "coordinates": [[[0, 1], [2, 1], [2, 2], [0, 2], [0, 1]]]}},
                {"type": "Feature", "id": 11, "properties": {"name": "nowhere", "weight": 0.0},
                 "geometry": null},
                {"type": "Feature", "id": 12, "properties": {"name": "point", "weight": null},
                 "geometry": {"type": "Point", "coordinates": [1.5, 0.5]}}
            ]
        }"#;

        fn vsimem_zones(name: &str) -> PathBuf {
            let path = PathBuf::from(format!("/vsimem/{name}.geojson"));
            gdal::vsi::create_mem_file(&path, ZONES.as_bytes().to_vec()).unwrap();
            path
        }

        #[test]
        fn reads_features_lazily() {
            let path = vsimem_zones("reads_features_lazily");
            let mut reader = read_features(&path, 0).unwrap();
            let first = reader.next().unwrap().unwrap();
            assert_eq!(first.id, Some(10));
            let properties = first.properties.unwrap();
            assert_eq!(properties["name"], Value::Text("north".into()));
            assert_eq!(properties["weight"], Value::Float(1.5));

            let rest = reader.collect::<Result<Vec<_>>>().unwrap();
            assert_eq!(rest.len(), 1);
            assert_eq!(rest[0].id, Some(12));
            assert_eq!(rest[0].geometry, Geometry::Point((1.5, 0.5).into()));
        }

        #[test]
        fn layer_by_name() {
            let path = vsimem_zones("layer_by_name");
            assert_eq!(read_features(&path, "layer_by_name").unwrap().count(), 2);
            assert!(read_features(&path, "missing").is_err());
        }

        #[test]
        fn parses_wkt() {
            let features =
                features_from_wkt(["POINT (1 2)", "POLYGON ((0 0, 1 0, 1 1, 0 0))"]).unwrap();
            assert_eq!(features.len(), 2);
            assert_eq!(features[0].geometry, Geometry::Point((1., 2.).into()));
            assert!(features.iter().all(|feature| feature.id.is_none()));
        }
    }
}
