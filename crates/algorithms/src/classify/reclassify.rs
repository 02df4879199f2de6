//! Table-based reclassification
//!
//! Maps each cell value through an ordered table of (min, max, class)
//! breaks. The first matching break wins; interval endpoint handling is
//! selected by a boundary rule.

use crate::maybe_rayon::*;
use ndarray::Array2;
use pozar_core::raster::Raster;
use pozar_core::{Algorithm, Error, Result};

/// One table entry mapping an input interval to an output class
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassBreak {
    pub min: f64,
    pub max: f64,
    pub class: f64,
}

impl ClassBreak {
    pub fn new(min: f64, max: f64, class: f64) -> Self {
        Self { min, max, class }
    }
}

/// Interval endpoint handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RangeBoundaries {
    /// min <= value < max
    #[default]
    MinInMaxEx,
    /// min < value <= max
    MinExMaxIn,
    /// min <= value <= max
    Inclusive,
    /// min < value < max
    Exclusive,
}

impl RangeBoundaries {
    fn matches(self, value: f64, min: f64, max: f64) -> bool {
        match self {
            RangeBoundaries::MinInMaxEx => value >= min && value < max,
            RangeBoundaries::MinExMaxIn => value > min && value <= max,
            RangeBoundaries::Inclusive => value >= min && value <= max,
            RangeBoundaries::Exclusive => value > min && value < max,
        }
    }
}

/// What happens to values no break matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingPolicy {
    /// Keep the input value unchanged
    #[default]
    PassThrough,
    /// Replace with the output nodata marker
    Nodata,
}

/// Parameters for reclassification
#[derive(Debug, Clone, Default)]
pub struct ReclassifyParams {
    /// Ordered break table; earlier entries win
    pub table: Vec<ClassBreak>,
    pub boundaries: RangeBoundaries,
    pub missing: MissingPolicy,
}

/// Reclassify algorithm
#[derive(Debug, Clone, Default)]
pub struct Reclassify;

impl Algorithm for Reclassify {
    type Input = Raster<f64>;
    type Output = Raster<f64>;
    type Params = ReclassifyParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Reclassify"
    }

    fn description(&self) -> &'static str {
        "Map cell values onto classes through an ordered break table"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        reclassify(&input, &params)
    }
}

/// Reclassify a raster through a break table.
///
/// Input nodata cells always come out as nodata. Under the default
/// `MinInMaxEx` rule a value sitting exactly on the final break's upper
/// bound maps to the final class, so a closed-topped table like
/// `[35, 100] -> 5` behaves as written.
pub fn reclassify(raster: &Raster<f64>, params: &ReclassifyParams) -> Result<Raster<f64>> {
    for brk in &params.table {
        if brk.min > brk.max || !brk.min.is_finite() || !brk.max.is_finite() {
            return Err(Error::InvalidParameter {
                name: "table",
                value: format!("[{}, {}] -> {}", brk.min, brk.max, brk.class),
                reason: "break bounds must be finite with min <= max".to_string(),
            });
        }
    }

    let (rows, cols) = raster.shape();
    let out_nodata = raster.nodata().unwrap_or(f64::NAN);
    let table = &params.table;
    let boundaries = params.boundaries;
    let missing = params.missing;

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![out_nodata; cols];
            for col in 0..cols {
                let value = unsafe { raster.get_unchecked(row, col) };

                if raster.is_nodata(value) {
                    continue;
                }

                row_data[col] = classify_value(value, table, boundaries, missing, out_nodata);
            }
            row_data
        })
        .collect();

    let mut output = raster.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(out_nodata));
    *output.data_mut() =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;

    Ok(output)
}

fn classify_value(
    value: f64,
    table: &[ClassBreak],
    boundaries: RangeBoundaries,
    missing: MissingPolicy,
    out_nodata: f64,
) -> f64 {
    for brk in table {
        if boundaries.matches(value, brk.min, brk.max) {
            return brk.class;
        }
    }

    // The terminal break's upper bound counts as inside under the
    // max-exclusive rule
    if boundaries == RangeBoundaries::MinInMaxEx {
        if let Some(last) = table.last() {
            if (value - last.max).abs() < 1e-10 {
                return last.class;
            }
        }
    }

    match missing {
        MissingPolicy::PassThrough => value,
        MissingPolicy::Nodata => out_nodata,
    }
}
