//! Raster algebra
//!
//! A cell-wise calculator: arithmetic formulas referencing named grids,
//! evaluated over aligned inputs.

mod calculator;
mod expr;

pub use calculator::{raster_calculator, CalculatorParams};
pub use expr::Expr;
