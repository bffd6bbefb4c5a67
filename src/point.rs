use std::{fmt::Display, str::FromStr};

use geo::CoordsIter;
use log::{debug, info};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::{
    components::{bounds::PixelWindow, features::Feature, reader::RasterSource},
    errors::{Result, RusterstatsError},
    stats::masked::is_nodata,
};

/// How a raster value is sampled at a vertex.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    Nearest,
    #[default]
    Bilinear,
}

impl FromStr for Interpolation {
    type Err = RusterstatsError;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "nearest" => Ok(Self::Nearest),
            "bilinear" => Ok(Self::Bilinear),
            _ => Err(RusterstatsError::UnknownInterpolation(name.to_string())),
        }
    }
}

impl Display for Interpolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Nearest => "nearest",
            Self::Bilinear => "bilinear",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointQueryOptions {
    /// 1-based band index.
    pub band: usize,
    pub interpolation: Interpolation,
    /// Overrides the no-data value of the band.
    pub nodata: Option<f64>,
}

impl Default for PointQueryOptions {
    fn default() -> Self {
        Self {
            band: 1,
            interpolation: Interpolation::default(),
            nodata: None,
        }
    }
}

impl PointQueryOptions {
    pub fn band(mut self, band: usize) -> Self {
        self.band = band;
        self
    }

    pub fn interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    pub fn nodata(mut self, nodata: f64) -> Self {
        self.nodata = Some(nodata);
        self
    }
}

/// Cells of the `dim` block starting at `(row, col)`, `None` outside the
/// raster or on no-data.
fn read_block<S: RasterSource + ?Sized>(
    source: &S,
    band: usize,
    (row, col): (i64, i64),
    dim: (usize, usize),
    nodata: Option<f64>,
) -> Result<Array2<Option<f64>>> {
    let shape = source.shape();
    let clamp = |index: i64, len: usize| index.clamp(0, len as i64) as usize;
    let (row_start, row_end) = (
        clamp(row, shape.rows),
        clamp(row.saturating_add(dim.0 as i64), shape.rows),
    );
    let (col_start, col_end) = (
        clamp(col, shape.cols),
        clamp(col.saturating_add(dim.1 as i64), shape.cols),
    );

    let mut block = Array2::from_elem(dim, None);
    if row_start == row_end || col_start == col_end {
        return Ok(block);
    }
    let window = PixelWindow::new(
        (col_start, row_start),
        (col_end - col_start, row_end - row_start),
    );
    let data = source.read_window(band, &window)?;
    for ((data_row, data_col), value) in data.indexed_iter() {
        let block_row = (row_start + data_row) as i64 - row;
        let block_col = (col_start + data_col) as i64 - col;
        block[[block_row as usize, block_col as usize]] =
            (!is_nodata(*value, nodata)).then_some(*value);
    }
    Ok(block)
}

/// Whether a fractional pixel index can touch a raster axis of `len` cells.
///
/// NaN and far off positions never can, they are rejected before any
/// integer cast.
fn within_reach(index: f64, len: usize) -> bool {
    index.is_finite() && (-2. ..=len as f64 + 2.).contains(&index)
}

/// Bilinear interpolation between the centers of a 2x2 block.
///
/// `frow`/`fcol` locate the point on the unit square spanned by the cell
/// centers, `(0, 0)` being the upper left one. Falls back to the nearest
/// cell when any of the four is missing.
pub fn bilinear(block: &Array2<Option<f64>>, frow: f64, fcol: f64) -> Option<f64> {
    let cells = [block[[0, 0]], block[[0, 1]], block[[1, 0]], block[[1, 1]]];
    let [Some(upper_left), Some(upper_right), Some(lower_left), Some(lower_right)] = cells else {
        let (row, col) = (usize::from(frow >= 0.5), usize::from(fcol >= 0.5));
        return block[[row, col]];
    };
    let (x, y) = (fcol, 1. - frow);
    Some(
        lower_left * (1. - x) * (1. - y)
            + lower_right * x * (1. - y)
            + upper_left * (1. - x) * y
            + upper_right * x * y,
    )
}

/// Raster values at every vertex of each feature, `None` off the raster or on no-data.
pub fn point_query<S: RasterSource + ?Sized>(
    features: impl IntoIterator<Item = Feature>,
    source: &S,
    options: PointQueryOptions,
) -> Result<Vec<Vec<Option<f64>>>> {
    let transform = source.transform()?;
    let shape = source.shape();
    source.check_band(options.band)?;
    let nodata = options.nodata.or_else(|| source.nodata(options.band));
    info!(
        "{} point query of band {}",
        options.interpolation, options.band
    );

    features
        .into_iter()
        .map(|feature| {
            feature
                .geometry
                .coords_iter()
                .map(|coord| -> Result<Option<f64>> {
                    let (fcol, frow) = transform.to_pixel(coord.x, coord.y);
                    if !(within_reach(frow, shape.rows) && within_reach(fcol, shape.cols)) {
                        debug!("vertex {:?} is off the raster", coord.x_y());
                        return Ok(None);
                    }
                    match options.interpolation {
                        Interpolation::Nearest => {
                            let cell = (frow.floor() as i64, fcol.floor() as i64);
                            let block = read_block(source, options.band, cell, (1, 1), nodata)?;
                            Ok(block[[0, 0]])
                        }
                        Interpolation::Bilinear => {
                            let (row, col) = (frow.round(), fcol.round());
                            let origin = (row as i64 - 1, col as i64 - 1);
                            debug!("bilinear block at {origin:?} for {:?}", coord.x_y());
                            let block = read_block(source, options.band, origin, (2, 2), nodata)?;
                            Ok(bilinear(&block, 0.5 - (row - frow), 0.5 - (col - fcol)))
                        }
                    }
                })
                .collect::<Result<Vec<_>>>()
        })
        .collect()
}
