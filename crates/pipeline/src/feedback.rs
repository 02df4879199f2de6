//! Progress reporting and cooperative cancellation

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The seven pipeline stages, in run order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    RasterizeSettlements,
    ReclassifySlope,
    RasterizeRoads,
    RasterizeVegetation,
    ReclassifyAspect,
    WeightedSum,
    ClassifyIndex,
}

impl Stage {
    pub const COUNT: usize = 7;

    /// All stages in run order
    pub fn all() -> [Stage; Stage::COUNT] {
        [
            Stage::RasterizeSettlements,
            Stage::ReclassifySlope,
            Stage::RasterizeRoads,
            Stage::RasterizeVegetation,
            Stage::ReclassifyAspect,
            Stage::WeightedSum,
            Stage::ClassifyIndex,
        ]
    }

    /// Zero-based position in the run order
    pub fn index(self) -> usize {
        match self {
            Stage::RasterizeSettlements => 0,
            Stage::ReclassifySlope => 1,
            Stage::RasterizeRoads => 2,
            Stage::RasterizeVegetation => 3,
            Stage::ReclassifyAspect => 4,
            Stage::WeightedSum => 5,
            Stage::ClassifyIndex => 6,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::RasterizeSettlements => "rasterize settlements",
            Stage::ReclassifySlope => "reclassify slope",
            Stage::RasterizeRoads => "rasterize roads",
            Stage::RasterizeVegetation => "rasterize vegetation",
            Stage::ReclassifyAspect => "reclassify aspect",
            Stage::WeightedSum => "weighted sum",
            Stage::ClassifyIndex => "classify index",
        };
        f.write_str(name)
    }
}

/// Observer for a pipeline run.
///
/// `advance` fires after each completed stage; `is_canceled` is polled at
/// stage boundaries only — a stage in flight is never interrupted.
pub trait Feedback {
    fn advance(&self, _completed: Stage) {}

    fn is_canceled(&self) -> bool {
        false
    }
}

/// No-op feedback for unattended runs
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl Feedback for Silent {}

/// Shareable cancellation token.
///
/// Clone it, hand one copy to the pipeline and keep the other to request
/// cancellation from elsewhere.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation at the next stage boundary
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

impl Feedback for CancelFlag {
    fn is_canceled(&self) -> bool {
        self.is_set()
    }
}
