use ndarray::Array2;
use serde::{ser::SerializeMap, Deserialize, Serialize, Serializer};

use crate::components::{features::Value, transforms::GeoTransform};

/// Key under which the feature identifier is stored.
pub const FID_KEY: &str = "__fid__";

/// Raster value to category label mapping for categorical histograms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryMap(Vec<(f64, String)>);

impl CategoryMap {
    pub fn label(&self, value: f64) -> Option<&str> {
        self.0
            .iter()
            .find(|(category, _)| *category == value)
            .map(|(_, label)| label.as_str())
    }

    /// Output key of a histogram value, its label when mapped.
    pub fn key(&self, value: f64) -> String {
        self.label(value)
            .map_or_else(|| value.to_string(), ToString::to_string)
    }
}

impl<L: Into<String>> FromIterator<(f64, L)> for CategoryMap {
    fn from_iter<I: IntoIterator<Item = (f64, L)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(value, label)| (value, label.into()))
                .collect(),
        )
    }
}

/// Clipped raster window of a feature.
#[derive(Debug, Clone, PartialEq)]
pub struct MiniRaster {
    /// Excluded cells hold the no-data value, or NaN without one.
    pub data: Array2<f64>,
    pub mask: Array2<bool>,
    pub transform: GeoTransform,
    pub nodata: Option<f64>,
}

/// Statistics of a single feature.
///
/// Ordered mapping from stat name, histogram key, `__fid__` and copied
/// property names to values. Copied properties overwrite statistics that
/// share their name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureStats {
    entries: Vec<(String, Value)>,
    mini_raster: Option<MiniRaster>,
}

impl FeatureStats {
    pub fn builder() -> FeatureStatsBuilder {
        FeatureStatsBuilder::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(entry_key, _)| entry_key == key)
            .map(|(_, value)| value)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    /// Identifier of the feature, its own id or its position in the input.
    pub fn fid(&self) -> Option<i64> {
        self.get(FID_KEY).and_then(Value::as_i64)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn mini_raster(&self) -> Option<&MiniRaster> {
        self.mini_raster.as_ref()
    }
}

impl Serialize for FeatureStats {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Assembles a [FeatureStats], later inserts replace earlier ones in place.
#[derive(Debug, Default)]
pub struct FeatureStatsBuilder {
    entries: Vec<(String, Value)>,
    mini_raster: Option<MiniRaster>,
}

impl FeatureStatsBuilder {
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let (key, value) = (key.into(), value.into());
        match self.entries.iter_mut().find(|(entry_key, _)| *entry_key == key) {
            Some((_, entry_value)) => *entry_value = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    pub fn extend<K: Into<String>, V: Into<Value>>(
        &mut self,
        entries: impl IntoIterator<Item = (K, V)>,
    ) -> &mut Self {
        for (key, value) in entries {
            self.insert(key, value);
        }
        self
    }

    pub fn mini_raster(&mut self, mini_raster: MiniRaster) -> &mut Self {
        self.mini_raster = Some(mini_raster);
        self
    }

    pub fn build(self) -> FeatureStats {
        FeatureStats {
            entries: self.entries,
            mini_raster: self.mini_raster,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_inserts_win_in_place() {
        let mut builder = FeatureStats::builder();
        builder
            .insert("count", 3usize)
            .insert("mean", 2.5)
            .insert(FID_KEY, 0i64)
            .insert("count", "from properties");
        let stats = builder.build();
        assert_eq!(stats.keys().collect::<Vec<_>>(), ["count", "mean", FID_KEY]);
        assert_eq!(stats.get("count"), Some(&Value::Text("from properties".into())));
        assert_eq!(stats.get_f64("mean"), Some(2.5));
        assert_eq!(stats.fid(), Some(0));
        assert!(stats.mini_raster().is_none());
    }

    #[test]
    fn category_keys() {
        let categories: CategoryMap = [(1., "low"), (2., "mid")].into_iter().collect();
        assert_eq!(categories.key(1.), "low");
        assert_eq!(categories.key(3.), "3");
        assert_eq!(categories.key(2.5), "2.5");
    }
}
