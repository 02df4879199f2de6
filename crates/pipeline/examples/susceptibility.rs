//! Example: susceptibility run over synthetic layers
//!
//! Builds a small synthetic study area (tilted slope, rotating aspect,
//! three category layers), runs the pipeline and prints the resulting
//! index/class distribution.

use geo_types::polygon;
use pozar_core::raster::{Extent, Raster};
use pozar_core::vector::{AttributeValue, Feature, FeatureCollection};
use pozar_pipeline::{run, Silent, SusceptibilityInputs, SusceptibilityParams};

fn main() {
    let cells = 40;
    let cell_size = 25.0;
    let span = cells as f64 * cell_size;
    let extent = Extent::new(0.0, 0.0, span, span);

    // Slope rising toward the east, aspect sweeping the compass
    let mut slope = Raster::new(cells, cells);
    let mut aspect = Raster::new(cells, cells);
    slope.set_transform(extent.to_transform(cell_size));
    aspect.set_transform(extent.to_transform(cell_size));
    for row in 0..cells {
        for col in 0..cells {
            slope.set(row, col, col as f64).unwrap();
            aspect
                .set(row, col, (row * 360 / cells) as f64)
                .unwrap();
        }
    }

    let inputs = SusceptibilityInputs {
        slope,
        aspect,
        roads: category_layer(extent, 2.0),
        settlements: category_layer(extent, 1.0),
        vegetation: category_layer(extent, 4.0),
    };
    let params = SusceptibilityParams {
        extent: Some(extent),
        ..Default::default()
    };

    let output = run(&inputs, &params, &Silent)
        .expect("pipeline failed")
        .expect("run canceled");

    let stats = output.index.statistics();
    println!(
        "RC index over {} cells: min {:.0}, max {:.0}, mean {:.1}",
        stats.valid_count,
        stats.min.unwrap_or(0.0),
        stats.max.unwrap_or(0.0),
        stats.mean.unwrap_or(0.0)
    );

    let mut counts = [0usize; 4];
    for &v in output.classes.data().iter() {
        if (1.0..=4.0).contains(&v) {
            counts[v as usize - 1] += 1;
        }
    }
    for (band, count) in counts.iter().enumerate() {
        println!("class {}: {} cells", band + 1, count);
    }
}

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
