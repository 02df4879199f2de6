//! # POZAR Pipeline
//!
//! The fixed forest-fire susceptibility computation: five input layers in,
//! two rasters out.
//!
//! The run is a strict sequence of seven stages — three vector
//! rasterizations, two table reclassifications, one weighted sum and one
//! final classification — with cooperative cancellation checked at every
//! stage boundary. Stage failures abort the run and surface the underlying
//! error unchanged.
//!
//! ```ignore
//! use pozar_pipeline::{run, Silent, SusceptibilityInputs, SusceptibilityParams};
//!
//! let inputs = SusceptibilityInputs { slope, aspect, roads, settlements, vegetation };
//! let output = run(&inputs, &SusceptibilityParams::default(), &Silent)?
//!     .expect("not canceled");
//! println!("index range: {:?}", output.index.statistics());
//! ```

mod feedback;
mod susceptibility;

pub use feedback::{CancelFlag, Feedback, Silent, Stage};
pub use susceptibility::{
    aspect_table, class_breaks, run, run_to_files, slope_table, SusceptibilityInputs,
    SusceptibilityOutput, SusceptibilityParams, INDEX_FORMULA, VALUE_FIELD,
};
