//! # POZAR Algorithms
//!
//! The processing primitives composed by the susceptibility pipeline:
//!
//! - **conversion**: burn vector features into a grid
//! - **classify**: table-based reclassification of cell values
//! - **algebra**: cell-wise raster calculator over named grids
//!
//! All kernels are row-parallel when the `parallel` feature is enabled
//! (the default) and fall back to sequential iteration otherwise.

pub mod algebra;
pub mod classify;
pub mod conversion;
pub(crate) mod maybe_rayon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::algebra::{raster_calculator, CalculatorParams};
    pub use crate::classify::{
        reclassify, ClassBreak, MissingPolicy, RangeBoundaries, Reclassify, ReclassifyParams,
    };
    pub use crate::conversion::{rasterize, Rasterize, RasterizeParams};
    pub use pozar_core::prelude::*;
}
