//! Multi-grid raster calculator

use crate::algebra::expr::Expr;
use crate::maybe_rayon::*;
use ndarray::Array2;
use pozar_core::raster::Raster;
use pozar_core::{Error, Result};

/// Parameters for the raster calculator
#[derive(Debug, Clone, Default)]
pub struct CalculatorParams {
    /// Output nodata marker; defaults to the first grid's marker, then NaN
    pub nodata: Option<f64>,
}

/// Evaluate a formula cell-wise over named grids.
///
/// All grids must share one shape; the output inherits the first grid's
/// transform and CRS. A nodata cell in any input yields nodata output, as
/// does a non-finite result (division by zero, overflow).
///
/// # Example
/// ```ignore
/// let index = raster_calculator(
///     "7*vt + 5*(dr + ds) + 3*(a + s)",
///     &[("vt", &vt), ("dr", &dr), ("ds", &ds), ("a", &a), ("s", &s)],
///     &CalculatorParams::default(),
/// )?;
/// ```
pub fn raster_calculator(
    formula: &str,
    grids: &[(&str, &Raster<f64>)],
    params: &CalculatorParams,
) -> Result<Raster<f64>> {
    let Some(((_, first), rest)) = grids.split_first() else {
        return Err(Error::InvalidParameter {
            name: "grids",
            value: "[]".to_string(),
            reason: "at least one grid is required".to_string(),
        });
    };

    let (rows, cols) = first.shape();
    for (_, grid) in rest {
        if grid.shape() != (rows, cols) {
            return Err(Error::size_mismatch((rows, cols), grid.shape()));
        }
    }

    let names: Vec<&str> = grids.iter().map(|(name, _)| *name).collect();
    let expr = Expr::parse(formula, &names)?;

    let out_nodata = params.nodata.or(first.nodata()).unwrap_or(f64::NAN);

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![out_nodata; cols];
            let mut values = vec![0.0; grids.len()];

            'cells: for col in 0..cols {
                for (i, (_, grid)) in grids.iter().enumerate() {
                    let v = unsafe { grid.get_unchecked(row, col) };
                    if grid.is_nodata(v) {
                        continue 'cells;
                    }
                    values[i] = v;
                }

                let result = expr.eval(&values);
                if result.is_finite() {
                    row_data[col] = result;
                }
            }
            row_data
        })
        .collect();

    let mut output = first.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(out_nodata));
    *output.data_mut() =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;

    Ok(output)
}
