use ndarray::{Array2, Zip};

use crate::errors::{Result, RusterstatsError};

/// Arithmetic mean, `None` without values.
pub fn mean_of(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation, `None` without values.
pub fn std_of(values: &[f64]) -> Option<f64> {
    let mean = mean_of(values)?;
    let variance =
        values.iter().map(|value| (value - mean).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

pub(crate) fn is_nodata(value: f64, nodata: Option<f64>) -> bool {
    match nodata {
        Some(nodata) if nodata.is_nan() => value.is_nan(),
        Some(nodata) => value == nodata,
        None => false,
    }
}

/// Value grid paired with an exclusion grid, `true` meaning excluded.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskedArray {
    data: Array2<f64>,
    mask: Array2<bool>,
}

impl MaskedArray {
    /// Excludes cells outside `inclusion` and cells equal to `nodata`.
    pub fn from_inclusion(
        data: Array2<f64>,
        inclusion: &Array2<bool>,
        nodata: Option<f64>,
    ) -> Result<Self> {
        if data.dim() != inclusion.dim() {
            return Err(RusterstatsError::ShapeMismatch {
                mask: inclusion.dim(),
                window: data.dim(),
            });
        }
        let mask = Zip::from(&data)
            .and(inclusion)
            .map_collect(|value, inside| !inside || is_nodata(*value, nodata));
        Ok(Self { data, mask })
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn mask(&self) -> &Array2<bool> {
        &self.mask
    }

    pub fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Values of the cells that are not excluded, in row major order.
    pub fn compressed(&self) -> Vec<f64> {
        Zip::from(&self.data)
            .and(&self.mask)
            .fold(Vec::new(), |mut values, value, excluded| {
                if !excluded {
                    values.push(*value);
                }
                values
            })
    }

    pub fn count(&self) -> usize {
        self.mask.iter().filter(|excluded| !**excluded).count()
    }

    pub fn is_fully_masked(&self) -> bool {
        self.mask.iter().all(|excluded| *excluded)
    }

    /// Copy of the data with excluded cells set to `fill`.
    pub fn filled(&self, fill: f64) -> Array2<f64> {
        Zip::from(&self.data)
            .and(&self.mask)
            .map_collect(|value, excluded| if *excluded { fill } else { *value })
    }

    pub fn min(&self) -> Option<f64> {
        self.compressed().into_iter().reduce(f64::min)
    }

    pub fn max(&self) -> Option<f64> {
        self.compressed().into_iter().reduce(f64::max)
    }

    pub fn sum(&self) -> f64 {
        self.compressed().into_iter().sum()
    }

    pub fn mean(&self) -> Option<f64> {
        mean_of(&self.compressed())
    }

    /// Population standard deviation.
    pub fn std(&self) -> Option<f64> {
        std_of(&self.compressed())
    }
}
