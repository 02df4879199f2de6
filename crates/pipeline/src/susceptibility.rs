//! The forest-fire susceptibility pipeline
//!
//! Composes the rasterize/reclassify/calculator primitives into the fixed
//! RC-index computation: vegetation type, distance to roads, distance to
//! settlements, slope and aspect are brought onto grids, scored, and folded
//! into a weighted index that is then cut into four susceptibility classes.

use std::path::Path;
use std::time::Instant;

use pozar_algorithms::algebra::{raster_calculator, CalculatorParams};
use pozar_algorithms::classify::{reclassify, ClassBreak, ReclassifyParams};
use pozar_algorithms::conversion::{rasterize, RasterizeParams};
use pozar_core::io::write_geotiff;
use pozar_core::raster::{Extent, Raster};
use pozar_core::vector::FeatureCollection;
use pozar_core::Result;
use tracing::info;

use crate::feedback::{Feedback, Stage};

/// Attribute carrying the per-feature risk category on all vector inputs
pub const VALUE_FIELD: &str = "Vrednost";

/// Weighted index formula: vegetation dominates, distances next, terrain last
pub const INDEX_FORMULA: &str = "7*vt + 5*(dr + ds) + 3*(a + s)";

/// Slope scoring: steeper terrain carries fire faster
pub fn slope_table() -> Vec<ClassBreak> {
    vec![
        ClassBreak::new(0.0, 5.0, 1.0),
        ClassBreak::new(5.0, 10.0, 2.0),
        ClassBreak::new(10.0, 25.0, 3.0),
        ClassBreak::new(25.0, 35.0, 4.0),
        ClassBreak::new(35.0, 100.0, 5.0),
    ]
}

/// Aspect scoring, symmetric about 180°: south-facing exposures score
/// highest, north-facing lowest. The leading hairline interval catches an
/// aspect of exactly zero (flat cells in some aspect conventions).
pub fn aspect_table() -> Vec<ClassBreak> {
    vec![
        ClassBreak::new(0.0, 1e-8, 2.0),
        ClassBreak::new(1e-8, 22.5, 1.0),
        ClassBreak::new(22.5, 67.5, 2.0),
        ClassBreak::new(67.5, 112.5, 3.0),
        ClassBreak::new(112.5, 157.5, 4.0),
        ClassBreak::new(157.5, 202.5, 5.0),
        ClassBreak::new(202.5, 247.5, 4.0),
        ClassBreak::new(247.5, 292.5, 3.0),
        ClassBreak::new(292.5, 337.5, 2.0),
        ClassBreak::new(337.5, 400.0, 1.0),
    ]
}

/// Final discretization of the weighted index into susceptibility bands
/// (1 = low … 4 = high)
pub fn class_breaks() -> Vec<ClassBreak> {
    vec![
        ClassBreak::new(0.0, 60.0, 1.0),
        ClassBreak::new(60.0, 75.0, 2.0),
        ClassBreak::new(75.0, 90.0, 3.0),
        ClassBreak::new(90.0, 1000.0, 4.0),
    ]
}

/// The five required input layers
#[derive(Debug, Clone)]
pub struct SusceptibilityInputs {
    /// Slope raster
    pub slope: Raster<f64>,
    /// Aspect raster, degrees clockwise from north
    pub aspect: Raster<f64>,
    /// Distance-to-roads risk categories
    pub roads: FeatureCollection,
    /// Distance-to-settlements risk categories
    pub settlements: FeatureCollection,
    /// Vegetation-type risk categories
    pub vegetation: FeatureCollection,
}

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct SusceptibilityParams {
    /// Attribute read from every vector layer
    pub field: String,
    /// Cell size of the rasterization grids
    pub cell_size: f64,
    /// Nodata marker for produced rasters
    pub nodata: f64,
    /// Shared grid extent. `None` rasterizes each vector layer over its own
    /// bounds; layers must then cover the same grid or the weighted-sum
    /// stage fails with a shape mismatch.
    pub extent: Option<Extent>,
}

impl Default for SusceptibilityParams {
    fn default() -> Self {
        Self {
            field: VALUE_FIELD.to_string(),
            cell_size: 25.0,
            nodata: -9999.0,
            extent: None,
        }
    }
}

/// The two persisted artifacts of a completed run
#[derive(Debug, Clone)]
pub struct SusceptibilityOutput {
    /// Continuous weighted index
    pub index: Raster<f64>,
    /// 4-class discretization of the index
    pub classes: Raster<f64>,
}

/// Execute the pipeline.
///
/// Stages run strictly in order; after each of the first six the feedback
/// is advanced and polled, and a pending cancellation ends the run with
/// `Ok(None)` — nothing partial is returned. The first stage error aborts
/// the run and is surfaced unchanged.
pub fn run(
    inputs: &SusceptibilityInputs,
    params: &SusceptibilityParams,
    feedback: &dyn Feedback,
) -> Result<Option<SusceptibilityOutput>> {
    let vector_params = RasterizeParams {
        field: Some(params.field.clone()),
        burn: 0.0,
        nodata: params.nodata,
        cell_size: params.cell_size,
        extent: params.extent,
    };

    let settlements = timed(Stage::RasterizeSettlements, || {
        rasterize(&inputs.settlements, &vector_params)
    })?;
    if canceled_at(feedback, Stage::RasterizeSettlements) {
        return Ok(None);
    }

    let slope_scores = timed(Stage::ReclassifySlope, || {
        reclassify(
            &inputs.slope,
            &ReclassifyParams {
                table: slope_table(),
                ..Default::default()
            },
        )
    })?;
    if canceled_at(feedback, Stage::ReclassifySlope) {
        return Ok(None);
    }

    let roads = timed(Stage::RasterizeRoads, || {
        rasterize(&inputs.roads, &vector_params)
    })?;
    if canceled_at(feedback, Stage::RasterizeRoads) {
        return Ok(None);
    }

    let vegetation = timed(Stage::RasterizeVegetation, || {
        rasterize(&inputs.vegetation, &vector_params)
    })?;
    if canceled_at(feedback, Stage::RasterizeVegetation) {
        return Ok(None);
    }

    let aspect_scores = timed(Stage::ReclassifyAspect, || {
        reclassify(
            &inputs.aspect,
            &ReclassifyParams {
                table: aspect_table(),
                ..Default::default()
            },
        )
    })?;
    if canceled_at(feedback, Stage::ReclassifyAspect) {
        return Ok(None);
    }

    let index = timed(Stage::WeightedSum, || {
        raster_calculator(
            INDEX_FORMULA,
            &[
                ("vt", &vegetation),
                ("dr", &roads),
                ("ds", &settlements),
                ("a", &aspect_scores),
                ("s", &slope_scores),
            ],
            &CalculatorParams {
                nodata: Some(params.nodata),
            },
        )
    })?;
    if canceled_at(feedback, Stage::WeightedSum) {
        return Ok(None);
    }

    let classes = timed(Stage::ClassifyIndex, || {
        reclassify(
            &index,
            &ReclassifyParams {
                table: class_breaks(),
                ..Default::default()
            },
        )
    })?;
    feedback.advance(Stage::ClassifyIndex);

    Ok(Some(SusceptibilityOutput { index, classes }))
}

/// Run the pipeline and persist both outputs as GeoTIFF.
///
/// On cancellation nothing is written and `Ok(None)` is returned.
pub fn run_to_files(
    inputs: &SusceptibilityInputs,
    params: &SusceptibilityParams,
    feedback: &dyn Feedback,
    index_path: impl AsRef<Path>,
    classes_path: impl AsRef<Path>,
) -> Result<Option<SusceptibilityOutput>> {
    let Some(output) = run(inputs, params, feedback)? else {
        return Ok(None);
    };

    write_geotiff(&output.index, index_path.as_ref())?;
    write_geotiff(&output.classes, classes_path.as_ref())?;
    info!(
        index = %index_path.as_ref().display(),
        classes = %classes_path.as_ref().display(),
        "outputs written"
    );

    Ok(Some(output))
}

fn timed<T>(stage: Stage, f: impl FnOnce() -> Result<T>) -> Result<T> {
    let start = Instant::now();
    let out = f()?;
    info!(
        stage = %stage,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "stage complete"
    );
    Ok(out)
}

fn canceled_at(feedback: &dyn Feedback, stage: Stage) -> bool {
    feedback.advance(stage);
    if feedback.is_canceled() {
        info!(after = %stage, "cancellation requested, aborting run");
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use pozar_algorithms::classify::reclassify;

    fn score(value: f64, table: Vec<ClassBreak>) -> f64 {
        let raster = Raster::from_vec(vec![value], 1, 1).unwrap();
        let params = ReclassifyParams {
            table,
            ..Default::default()
        };
        reclassify(&raster, &params).unwrap().get(0, 0).unwrap()
    }

    #[test]
    fn slope_scores_follow_the_table() {
        for (value, expected) in [
            (0.0, 1.0),
            (4.9, 1.0),
            (5.0, 2.0),
            (9.0, 2.0),
            (10.0, 3.0),
            (24.9, 3.0),
            (25.0, 4.0),
            (34.0, 4.0),
            (35.0, 5.0),
            (99.0, 5.0),
            (100.0, 5.0),
        ] {
            assert_eq!(score(value, slope_table()), expected, "slope {}", value);
        }
    }

    #[test]
    fn aspect_scores_are_symmetric_about_south() {
        for (value, expected) in [
            (5.0, 1.0),
            (22.4, 1.0),
            (45.0, 2.0),
            (90.0, 3.0),
            (135.0, 4.0),
            (180.0, 5.0),
            (210.0, 4.0),
            (270.0, 3.0),
            (300.0, 2.0),
            (337.5, 1.0),
            (350.0, 1.0),
            (399.0, 1.0),
        ] {
            assert_eq!(score(value, aspect_table()), expected, "aspect {}", value);
        }

        // Exactly-zero aspect hits the hairline guard interval
        assert_eq!(score(0.0, aspect_table()), 2.0);
    }

    #[test]
    fn index_bands_follow_the_breaks() {
        for (value, expected) in [
            (0.0, 1.0),
            (23.0, 1.0),
            (59.9, 1.0),
            (60.0, 2.0),
            (74.9, 2.0),
            (75.0, 3.0),
            (89.9, 3.0),
            (90.0, 4.0),
            (125.0, 4.0),
        ] {
            assert_eq!(score(value, class_breaks()), expected, "index {}", value);
        }
    }

    #[test]
    fn formula_names_match_the_grid_list() {
        // The formula references exactly the five factor grids
        for name in ["vt", "dr", "ds", "a", "s"] {
            assert!(INDEX_FORMULA.contains(name), "missing {}", name);
        }
    }
}
