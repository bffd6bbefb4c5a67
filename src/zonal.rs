use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    components::{
        bounds::{PixelWindow, RasterShape},
        extent::Extent,
        features::Feature,
        geometry,
        rasterizer::{GeoRasterizer, Rasterizer},
        reader::RasterSource,
        transforms::GeoTransform,
    },
    errors::{ReducerError, Result},
    stats::{
        output::{FeatureStats, MiniRaster, FID_KEY},
        reducer::{Reducers, StatsReducer},
        CategoryMap, MaskedArray, StatSet,
    },
};

/// Options of a zonal statistics run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZonalStatsOptions {
    /// Stat names, space separated lists are split, `"*"`/`"ALL"` select every stat.
    pub stats: Vec<String>,
    /// Adds the value histogram to the output.
    pub categorical: bool,
    /// Include every cell touched by a geometry instead of only those whose center is inside.
    pub all_touched: bool,
    /// Read the band once instead of once per feature. Ignored for in memory rasters.
    pub global_extent: bool,
    /// Overrides the no-data value of the band.
    pub nodata: Option<f64>,
    /// 1-based band index.
    pub band: usize,
    /// Copy feature properties into the output, they win over stats of the same name.
    pub copy_properties: bool,
    /// Labels for histogram keys.
    pub category_map: Option<CategoryMap>,
    /// Keep the clipped raster window of each feature.
    pub raster_out: bool,
    /// Evaluate features on the rayon thread pool, output order is kept.
    pub parallel: bool,
    #[serde(skip)]
    pub add_stats: Reducers,
}

impl Default for ZonalStatsOptions {
    fn default() -> Self {
        Self {
            stats: Vec::new(),
            categorical: false,
            all_touched: false,
            global_extent: false,
            nodata: None,
            band: 1,
            copy_properties: false,
            category_map: None,
            raster_out: false,
            parallel: false,
            add_stats: Reducers::default(),
        }
    }
}

impl ZonalStatsOptions {
    pub fn stats<S: Into<String>>(mut self, stats: impl IntoIterator<Item = S>) -> Self {
        self.stats = stats.into_iter().map(Into::into).collect();
        self
    }

    pub fn categorical(mut self, categorical: bool) -> Self {
        self.categorical = categorical;
        self
    }

    pub fn all_touched(mut self, all_touched: bool) -> Self {
        self.all_touched = all_touched;
        self
    }

    pub fn global_extent(mut self, global_extent: bool) -> Self {
        self.global_extent = global_extent;
        self
    }

    pub fn nodata(mut self, nodata: f64) -> Self {
        self.nodata = Some(nodata);
        self
    }

    pub fn band(mut self, band: usize) -> Self {
        self.band = band;
        self
    }

    pub fn copy_properties(mut self, copy_properties: bool) -> Self {
        self.copy_properties = copy_properties;
        self
    }

    pub fn category_map(mut self, category_map: CategoryMap) -> Self {
        self.category_map = Some(category_map);
        self
    }

    pub fn raster_out(mut self, raster_out: bool) -> Self {
        self.raster_out = raster_out;
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn add_stat<F>(mut self, name: impl Into<String>, reducer: F) -> Self
    where
        F: Fn(&MaskedArray) -> std::result::Result<f64, ReducerError> + Send + Sync + 'static,
    {
        self.add_stats.insert(name, reducer);
        self
    }
}

/// Validated zonal statistics run over one raster band.
#[derive(Debug)]
pub struct ZonalStats<'a, S: RasterSource + ?Sized, R: Rasterizer = GeoRasterizer> {
    source: &'a S,
    rasterizer: R,
    options: ZonalStatsOptions,
    stats: StatSet,
    transform: GeoTransform,
    shape: RasterShape,
    nodata: Option<f64>,
}

impl<'a, S: RasterSource + ?Sized> ZonalStats<'a, S> {
    pub fn new(source: &'a S, options: ZonalStatsOptions) -> Result<Self> {
        Self::with_rasterizer(source, options, GeoRasterizer)
    }
}

impl<'a, S: RasterSource + ?Sized, R: Rasterizer> ZonalStats<'a, S, R> {
    /// Validates the options against the source, nothing is read yet.
    pub fn with_rasterizer(source: &'a S, options: ZonalStatsOptions, rasterizer: R) -> Result<Self> {
        let stats = StatSet::new(&options.stats, options.categorical)?;
        let transform = source.transform()?;
        source.check_band(options.band)?;
        let nodata = options.nodata.or_else(|| source.nodata(options.band));
        Ok(Self {
            source,
            rasterizer,
            stats,
            transform,
            shape: source.shape(),
            nodata,
            options,
        })
    }

    pub fn stats(&self) -> &StatSet {
        &self.stats
    }

    pub fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    fn reducer(&self) -> StatsReducer<'_> {
        StatsReducer {
            stats: &self.stats,
            category_map: self.options.category_map.as_ref(),
            reducers: &self.options.add_stats,
            nodata: self.nodata,
        }
    }

    /// Statistics of every feature, in input order.
    pub fn run<I: IntoIterator<Item = Feature>>(&self, features: I) -> Result<Vec<FeatureStats>> {
        self.try_run(features.into_iter().map(Ok))
    }

    /// Like [ZonalStats::run] over fallible features, such as a lazy layer
    /// reader. The first failed feature aborts the run.
    pub fn try_run<I: IntoIterator<Item = Result<Feature>>>(
        &self,
        features: I,
    ) -> Result<Vec<FeatureStats>> {
        let extent = Extent::new(self.source, self.options.band, self.options.global_extent)?;
        info!(
            "zonal stats of band {} over {:?} raster, {} extent, stats {:?}",
            self.options.band,
            self.shape.dim(),
            if extent.is_global() { "global" } else { "local" },
            self.stats.iter().map(ToString::to_string).collect::<Vec<_>>(),
        );
        let results = if self.options.parallel {
            let features = features.into_iter().collect::<Result<Vec<_>>>()?;
            features
                .into_par_iter()
                .enumerate()
                .map(|(index, feature)| self.feature_stats(index, feature, &extent))
                .collect::<Result<Vec<_>>>()?
        } else {
            features
                .into_iter()
                .enumerate()
                .map(|(index, feature)| {
                    feature.and_then(|feature| self.feature_stats(index, feature, &extent))
                })
                .collect::<Result<Vec<_>>>()?
        };
        info!("computed stats of {} features", results.len());
        Ok(results)
    }

    fn feature_stats(&self, index: usize, feature: Feature, extent: &Extent) -> Result<FeatureStats> {
        let Feature {
            geometry,
            id,
            properties,
        } = feature;
        let fid = id.unwrap_or(index as i64);
        let geometry = geometry::normalize(geometry, self.transform.pixel_height());
        let window = geometry::bounds(&geometry)
            .map(|bounds| PixelWindow::from_bounds(&bounds, &self.transform, self.shape))
            .filter(|window| !window.is_empty());

        let reducer = self.reducer();
        let mut builder = FeatureStats::builder();
        match window {
            None => {
                debug!("feature {fid} does not overlap the raster");
                reducer.off_raster(&mut builder);
            }
            Some(window) => {
                debug!("feature {fid} reads window {:?}", window.as_tuple());
                let window_transform = self.transform.window_transform(&window);
                let inclusion = self.rasterizer.rasterize(
                    &geometry,
                    &window_transform,
                    window.dim(),
                    self.options.all_touched,
                )?;
                let data = extent.fetch(self.source, self.options.band, &window)?;
                let masked = MaskedArray::from_inclusion(data, &inclusion, self.nodata)?;
                reducer.reduce(&masked, &inclusion, &mut builder)?;
                if self.options.raster_out {
                    builder.mini_raster(MiniRaster {
                        data: masked.filled(self.nodata.unwrap_or(f64::NAN)),
                        mask: masked.mask().clone(),
                        transform: window_transform,
                        nodata: self.nodata,
                    });
                }
            }
        }

        builder.insert(FID_KEY, fid);
        if self.options.copy_properties {
            builder.extend(properties.unwrap_or_default());
        }
        Ok(builder.build())
    }
}

/// Statistics of `source` for each feature, see [ZonalStatsOptions].
pub fn zonal_stats<S: RasterSource + ?Sized>(
    features: impl IntoIterator<Item = Feature>,
    source: &S,
    options: ZonalStatsOptions,
) -> Result<Vec<FeatureStats>> {
    ZonalStats::new(source, options)?.run(features)
}
