use geo::Geometry;
use geo_traits::{to_geo::ToGeoGeometry, GeometryTrait};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt::Display};

/// Scalar carried by feature properties and by statistic outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Self::Int(value as i64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Text(value) => write!(f, "{value}"),
        }
    }
}

pub type Properties = BTreeMap<String, Value>;

/// Zone geometry with optional identifier and attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: Geometry,
    pub id: Option<i64>,
    pub properties: Option<Properties>,
}

impl Feature {
    pub fn new(geometry: impl Into<Geometry>) -> Self {
        Self {
            geometry: geometry.into(),
            id: None,
            properties: None,
        }
    }

    /// Feature from any [GeometryTrait] implementation, `None` for
    /// geometries `geo` cannot represent, such as empty points.
    pub fn from_geometry_trait(geometry: &impl GeometryTrait<T = f64>) -> Option<Self> {
        geometry.try_to_geometry().map(Self::new)
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties
            .get_or_insert_with(Properties::new)
            .insert(key.into(), value.into());
        self
    }
}

impl From<Geometry> for Feature {
    fn from(value: Geometry) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{point, Point};

    #[test]
    fn builds_feature() {
        let feature = Feature::new(point!(x: 1., y: 2.))
            .with_id(7)
            .with_property("name", "county")
            .with_property("population", 1200);
        assert_eq!(feature.id, Some(7));
        let properties = feature.properties.unwrap();
        assert_eq!(properties["name"], Value::Text("county".into()));
        assert_eq!(properties["population"].as_i64(), Some(1200));
    }

    #[test]
    fn from_geometry_trait() {
        let point = Point::new(3., 4.);
        let feature = Feature::from_geometry_trait(&point).unwrap();
        assert_eq!(feature.geometry, Geometry::Point(point));
    }

    #[test]
    fn value_conversions() {
        assert_eq!(Value::from(None::<f64>), Value::Null);
        assert_eq!(Value::from(Some(2.5)).as_f64(), Some(2.5));
        assert_eq!(Value::from(3usize).as_f64(), Some(3.));
        assert_eq!(Value::from(1.0).to_string(), "1");
    }
}
