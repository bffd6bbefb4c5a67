use itertools::Itertools;
use ndarray::{Array2, Zip};
use std::{fmt::Debug, sync::Arc};

use crate::{
    components::features::Value,
    errors::{ReducerError, Result, RusterstatsError},
    stats::{
        masked::{is_nodata, mean_of, std_of, MaskedArray},
        output::{CategoryMap, FeatureStatsBuilder},
        Stat, StatSet,
    },
};

/// User supplied statistic, computed from the whole masked array.
pub type ReducerFn = Arc<dyn Fn(&MaskedArray) -> std::result::Result<f64, ReducerError> + Send + Sync>;

/// Named user statistics, called in insertion order.
#[derive(Clone, Default)]
pub struct Reducers(Vec<(String, ReducerFn)>);

impl Debug for Reducers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl Reducers {
    pub fn insert<F>(&mut self, name: impl Into<String>, reducer: F)
    where
        F: Fn(&MaskedArray) -> std::result::Result<f64, ReducerError> + Send + Sync + 'static,
    {
        let name = name.into();
        self.0.retain(|(existing, _)| *existing != name);
        self.0.push((name, Arc::new(reducer)));
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// `(value, count)` pairs in ascending value order.
pub fn histogram(values: &[f64]) -> Vec<(f64, usize)> {
    values
        .iter()
        .copied()
        .sorted_by(f64::total_cmp)
        .dedup_with_count()
        .map(|(count, value)| (value, count))
        .collect()
}

/// Most frequent value, lowest value on ties.
pub fn majority(histogram: &[(f64, usize)]) -> Option<f64> {
    histogram
        .iter()
        .copied()
        .reduce(|best, candidate| if candidate.1 > best.1 { candidate } else { best })
        .map(|(value, _)| value)
}

/// Least frequent value, lowest value on ties.
pub fn minority(histogram: &[(f64, usize)]) -> Option<f64> {
    histogram
        .iter()
        .copied()
        .reduce(|best, candidate| if candidate.1 < best.1 { candidate } else { best })
        .map(|(value, _)| value)
}

/// Linearly interpolated percentile of ascending `sorted` values, `q` in `[0, 100]`.
pub fn percentile(sorted: &[f64], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let position = q / 100. * last as f64;
    let (lower, upper) = (position.floor() as usize, position.ceil() as usize);
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Cells inside the geometry that hold the no-data value.
fn nodata_count(masked: &MaskedArray, inclusion: &Array2<bool>, nodata: Option<f64>) -> usize {
    Zip::from(masked.data())
        .and(inclusion)
        .fold(0, |count, value, inside| {
            count + usize::from(*inside && is_nodata(*value, nodata))
        })
}

/// Reduces masked arrays into the statistics of a run.
#[derive(Debug, Clone, Copy)]
pub struct StatsReducer<'a> {
    pub stats: &'a StatSet,
    pub category_map: Option<&'a CategoryMap>,
    pub reducers: &'a Reducers,
    pub nodata: Option<f64>,
}

impl StatsReducer<'_> {
    /// Entries of a feature that does not overlap the raster.
    pub fn off_raster(&self, builder: &mut FeatureStatsBuilder) {
        for stat in self.stats.iter() {
            let value = match stat {
                Stat::Count => Value::Int(0),
                _ => Value::Null,
            };
            builder.insert(stat.name(), value);
        }
    }

    pub fn reduce(
        &self,
        masked: &MaskedArray,
        inclusion: &Array2<bool>,
        builder: &mut FeatureStatsBuilder,
    ) -> Result<()> {
        let values = masked.compressed();
        let counts = self.stats.run_count().then(|| histogram(&values));

        if self.stats.categorical() {
            for (value, count) in counts.iter().flatten() {
                let key = self
                    .category_map
                    .map_or_else(|| value.to_string(), |category_map| category_map.key(*value));
                builder.insert(key, *count);
            }
        }

        let sorted: Vec<f64> = if self.stats.needs_sorted() {
            values.iter().copied().sorted_by(f64::total_cmp).collect()
        } else {
            Vec::new()
        };
        let (min, max) = (
            values.iter().copied().reduce(f64::min),
            values.iter().copied().reduce(f64::max),
        );
        let counts = counts.unwrap_or_default();

        for stat in self.stats.iter() {
            let value: Value = match stat {
                Stat::Count => values.len().into(),
                Stat::Nodata => nodata_count(masked, inclusion, self.nodata).into(),
                _ if values.is_empty() => Value::Null,
                Stat::Min => min.into(),
                Stat::Max => max.into(),
                Stat::Mean => mean_of(&values).into(),
                Stat::Sum => values.iter().sum::<f64>().into(),
                Stat::Std => std_of(&values).into(),
                Stat::Median => percentile(&sorted, 50.).into(),
                Stat::Majority => majority(&counts).into(),
                Stat::Minority => minority(&counts).into(),
                Stat::Unique => counts.len().into(),
                Stat::Range => min.zip(max).map(|(min, max)| max - min).into(),
                Stat::Percentile { q, .. } => percentile(&sorted, *q).into(),
            };
            builder.insert(stat.name(), value);
        }

        for (name, reducer) in &self.reducers.0 {
            let value = reducer(masked).map_err(|source| RusterstatsError::Reducer {
                name: name.clone(),
                source,
            })?;
            builder.insert(name.as_str(), value);
        }
        Ok(())
    }
}
