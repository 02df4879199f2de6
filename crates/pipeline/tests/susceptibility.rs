//! End-to-end pipeline tests

use std::sync::Mutex;

use geo_types::polygon;
use pozar_core::raster::{Extent, Raster};
use pozar_core::vector::{AttributeValue, Feature, FeatureCollection};
use pozar_core::Error;
use pozar_pipeline::{
    run, run_to_files, CancelFlag, Feedback, Silent, Stage, SusceptibilityInputs,
    SusceptibilityParams,
};

const EXTENT: Extent = Extent {
    min_x: 0.0,
    min_y: 0.0,
    max_x: 100.0,
    max_y: 100.0,
};

/// A single-polygon layer covering `extent` with the given risk category
fn category_layer(extent: Extent, value: f64) -> FeatureCollection {
    let poly = polygon![
        (x: extent.min_x, y: extent.min_y),
        (x: extent.max_x, y: extent.min_y),
        (x: extent.max_x, y: extent.max_y),
        (x: extent.min_x, y: extent.max_y),
    ];
    let mut feature = Feature::new(poly.into());
    feature.set_attribute("Vrednost", AttributeValue::Float(value));

    let mut fc = FeatureCollection::new();
    fc.push(feature);
    fc
}

/// A uniform raster on the 4x4 grid matching `EXTENT` at 25 m cells
fn uniform_raster(value: f64) -> Raster<f64> {
    let mut raster = Raster::filled(4, 4, value);
    raster.set_transform(EXTENT.to_transform(25.0));
    raster.set_nodata(Some(-9999.0));
    raster
}

fn uniform_inputs() -> SusceptibilityInputs {
    SusceptibilityInputs {
        slope: uniform_raster(2.0),   // class 1
        aspect: uniform_raster(10.0), // class 1
        roads: category_layer(EXTENT, 1.0),
        settlements: category_layer(EXTENT, 1.0),
        vegetation: category_layer(EXTENT, 1.0),
    }
}

#[test]
fn uniform_low_risk_inputs_score_23_class_1() {
    let output = run(&uniform_inputs(), &SusceptibilityParams::default(), &Silent)
        .unwrap()
        .expect("run was not canceled");

    assert_eq!(output.index.shape(), (4, 4));
    assert_eq!(output.classes.shape(), (4, 4));

    // 7*1 + 5*(1+1) + 3*(1+1) = 23, below the first break
    for row in 0..4 {
        for col in 0..4 {
            assert_eq!(output.index.get(row, col).unwrap(), 23.0);
            assert_eq!(output.classes.get(row, col).unwrap(), 1.0);
        }
    }

    assert_eq!(output.index.nodata(), Some(-9999.0));
    assert_eq!(output.classes.nodata(), Some(-9999.0));
}

#[test]
fn weighted_sum_matches_the_formula_per_cell() {
    let inputs = SusceptibilityInputs {
        slope: uniform_raster(30.0),   // class 4
        aspect: uniform_raster(100.0), // class 3
        roads: category_layer(EXTENT, 2.0),
        settlements: category_layer(EXTENT, 3.0),
        vegetation: category_layer(EXTENT, 4.0),
    };

    let output = run(&inputs, &SusceptibilityParams::default(), &Silent)
        .unwrap()
        .expect("run was not canceled");

    // 7*4 + 5*(2+3) + 3*(3+4) = 74 -> class 2
    assert_eq!(output.index.get(1, 2).unwrap(), 74.0);
    assert_eq!(output.classes.get(1, 2).unwrap(), 2.0);
}

#[test]
fn highest_risk_inputs_reach_class_4() {
    let inputs = SusceptibilityInputs {
        slope: uniform_raster(40.0),   // class 5
        aspect: uniform_raster(180.0), // class 5
        roads: category_layer(EXTENT, 5.0),
        settlements: category_layer(EXTENT, 5.0),
        vegetation: category_layer(EXTENT, 5.0),
    };

    let output = run(&inputs, &SusceptibilityParams::default(), &Silent)
        .unwrap()
        .expect("run was not canceled");

    // 7*5 + 5*(5+5) + 3*(5+5) = 115 -> class 4
    assert_eq!(output.index.get(0, 0).unwrap(), 115.0);
    assert_eq!(output.classes.get(3, 3).unwrap(), 4.0);
}

/// Feedback that records completed stages and cancels after a fixed count
struct CancelAfter {
    after: usize,
    seen: Mutex<Vec<Stage>>,
}

impl CancelAfter {
    fn new(after: usize) -> Self {
        Self {
            after,
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl Feedback for CancelAfter {
    fn advance(&self, completed: Stage) {
        self.seen.lock().unwrap().push(completed);
    }

    fn is_canceled(&self) -> bool {
        self.seen.lock().unwrap().len() >= self.after
    }
}

#[test]
fn cancellation_stops_after_the_requested_stage() {
    for after in 1..=6 {
        let feedback = CancelAfter::new(after);
        let result = run(&uniform_inputs(), &SusceptibilityParams::default(), &feedback).unwrap();

        assert!(result.is_none(), "canceled run must yield no output");

        let seen = feedback.seen.lock().unwrap();
        assert_eq!(seen.len(), after, "no stage beyond the cancellation point");
        assert_eq!(*seen, Stage::all()[..after]);
    }
}

#[test]
fn completed_run_advances_all_stages() {
    let feedback = CancelAfter::new(usize::MAX);
    let result = run(&uniform_inputs(), &SusceptibilityParams::default(), &feedback).unwrap();

    assert!(result.is_some());
    assert_eq!(*feedback.seen.lock().unwrap(), Stage::all());
}

#[test]
fn pre_set_cancel_flag_stops_at_the_first_boundary() {
    let flag = CancelFlag::new();
    flag.cancel();

    let result = run(&uniform_inputs(), &SusceptibilityParams::default(), &flag).unwrap();
    assert!(result.is_none());
}

#[test]
fn mismatched_layer_extents_abort_the_run() {
    let mut inputs = uniform_inputs();
    // Vegetation covering a larger area lands on an 8x8 grid
    inputs.vegetation = category_layer(Extent::new(0.0, 0.0, 200.0, 200.0), 1.0);

    let err = run(&inputs, &SusceptibilityParams::default(), &Silent).unwrap_err();
    assert!(matches!(err, Error::SizeMismatch { .. }));
}

#[test]
fn shared_extent_parameter_forces_alignment() {
    let mut inputs = uniform_inputs();
    inputs.vegetation = category_layer(Extent::new(0.0, 0.0, 200.0, 200.0), 1.0);

    let params = SusceptibilityParams {
        extent: Some(EXTENT),
        ..Default::default()
    };

    let output = run(&inputs, &params, &Silent).unwrap().expect("not canceled");
    assert_eq!(output.index.shape(), (4, 4));
    assert_eq!(output.index.get(2, 2).unwrap(), 23.0);
}

#[test]
fn run_to_files_persists_both_outputs() {
    let dir = std::env::temp_dir();
    let index_path = dir.join(format!("pozar_index_{}.tif", std::process::id()));
    let classes_path = dir.join(format!("pozar_classes_{}.tif", std::process::id()));

    let output = run_to_files(
        &uniform_inputs(),
        &SusceptibilityParams::default(),
        &Silent,
        &index_path,
        &classes_path,
    )
    .unwrap()
    .expect("run was not canceled");

    assert!(index_path.exists());
    assert!(classes_path.exists());

    let index: Raster<f64> = pozar_core::io::read_geotiff(&index_path).unwrap();
    assert_eq!(index.shape(), output.index.shape());
    assert_eq!(index.get(1, 1).unwrap(), 23.0);

    std::fs::remove_file(&index_path).ok();
    std::fs::remove_file(&classes_path).ok();
}

#[test]
fn canceled_run_writes_nothing() {
    let dir = std::env::temp_dir();
    let index_path = dir.join(format!("pozar_canceled_index_{}.tif", std::process::id()));
    let classes_path = dir.join(format!("pozar_canceled_classes_{}.tif", std::process::id()));

    let flag = CancelFlag::new();
    flag.cancel();

    let result = run_to_files(
        &uniform_inputs(),
        &SusceptibilityParams::default(),
        &flag,
        &index_path,
        &classes_path,
    )
    .unwrap();

    assert!(result.is_none());
    assert!(!index_path.exists());
    assert!(!classes_path.exists());
}
