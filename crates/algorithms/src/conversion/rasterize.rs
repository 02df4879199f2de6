//! Vector rasterization
//!
//! Burns feature attribute values into a grid: polygons claim every cell
//! whose center they contain, lines every cell they pass through, points
//! their containing cell. Later features overwrite earlier ones.

use geo::{BoundingRect, Contains};
use geo_types::{Geometry, Line, Point, Polygon};
use pozar_core::raster::{Extent, Raster};
use pozar_core::vector::FeatureCollection;
use pozar_core::{Algorithm, Error, Result};

/// Parameters for rasterization
#[derive(Debug, Clone)]
pub struct RasterizeParams {
    /// Attribute supplying per-feature burn values; `None` burns the fixed value
    pub field: Option<String>,
    /// Fixed burn value, also used when the attribute is absent or non-numeric
    pub burn: f64,
    /// Nodata marker recorded on the output grid
    pub nodata: f64,
    /// Cell size of the output grid
    pub cell_size: f64,
    /// Output extent; defaults to the collection bounds
    pub extent: Option<Extent>,
}

impl Default for RasterizeParams {
    fn default() -> Self {
        Self {
            field: None,
            burn: 0.0,
            nodata: -9999.0,
            cell_size: 25.0,
            extent: None,
        }
    }
}

/// Rasterize algorithm
#[derive(Debug, Clone, Default)]
pub struct Rasterize;

impl Algorithm for Rasterize {
    type Input = FeatureCollection;
    type Output = Raster<f64>;
    type Params = RasterizeParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Rasterize"
    }

    fn description(&self) -> &'static str {
        "Burn vector feature attribute values into a raster grid"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        rasterize(&input, &params)
    }
}

/// Burn a feature collection into a grid.
///
/// Unburned cells keep 0.0; the nodata marker is grid metadata only, so
/// the output participates in raster algebra without masking holes.
///
/// # Errors
/// Fails when the collection has no geometry to derive an extent from,
/// or when the extent/cell size cannot host a grid.
pub fn rasterize(features: &FeatureCollection, params: &RasterizeParams) -> Result<Raster<f64>> {
    let extent = params
        .extent
        .or_else(|| features.bounds())
        .ok_or_else(|| Error::InvalidParameter {
            name: "features",
            value: format!("{} features", features.len()),
            reason: "no geometry to derive an extent from".to_string(),
        })?;

    let (rows, cols) = extent.grid_shape(params.cell_size)?;

    let mut grid: Raster<f64> = Raster::filled(rows, cols, 0.0);
    grid.set_transform(extent.to_transform(params.cell_size));
    grid.set_nodata(Some(params.nodata));

    for feature in features.iter() {
        let Some(geometry) = &feature.geometry else {
            continue;
        };

        let value = match &params.field {
            Some(name) => feature.numeric_attribute(name).unwrap_or(params.burn),
            None => params.burn,
        };

        burn_geometry(&mut grid, geometry, value);
    }

    Ok(grid)
}

fn burn_geometry(grid: &mut Raster<f64>, geometry: &Geometry<f64>, value: f64) {
    match geometry {
        Geometry::Point(p) => burn_point(grid, p.x(), p.y(), value),
        Geometry::MultiPoint(mp) => {
            for p in &mp.0 {
                burn_point(grid, p.x(), p.y(), value);
            }
        }
        Geometry::Line(line) => burn_segment(grid, line, value),
        Geometry::LineString(ls) => {
            for line in ls.lines() {
                burn_segment(grid, &line, value);
            }
        }
        Geometry::MultiLineString(mls) => {
            for ls in &mls.0 {
                for line in ls.lines() {
                    burn_segment(grid, &line, value);
                }
            }
        }
        Geometry::Polygon(poly) => burn_polygon(grid, poly, value),
        Geometry::MultiPolygon(mp) => {
            for poly in &mp.0 {
                burn_polygon(grid, poly, value);
            }
        }
        Geometry::Rect(rect) => burn_polygon(grid, &rect.to_polygon(), value),
        Geometry::Triangle(tri) => burn_polygon(grid, &tri.to_polygon(), value),
        Geometry::GeometryCollection(gc) => {
            for member in &gc.0 {
                burn_geometry(grid, member, value);
            }
        }
    }
}

/// Burn the cell containing a geographic point
fn burn_point(grid: &mut Raster<f64>, x: f64, y: f64, value: f64) {
    let (col_f, row_f) = grid.geo_to_pixel(x, y);
    if !col_f.is_finite() || !row_f.is_finite() {
        return;
    }

    let col = col_f.floor() as isize;
    let row = row_f.floor() as isize;

    if row >= 0 && col >= 0 && (row as usize) < grid.rows() && (col as usize) < grid.cols() {
        unsafe { grid.set_unchecked(row as usize, col as usize, value) };
    }
}

/// Burn every cell a segment passes through, sampling at half-cell steps
fn burn_segment(grid: &mut Raster<f64>, line: &Line<f64>, value: f64) {
    let dx = line.end.x - line.start.x;
    let dy = line.end.y - line.start.y;
    let length = (dx * dx + dy * dy).sqrt();

    let step = grid.cell_size() * 0.5;
    if length < f64::EPSILON || step < f64::EPSILON {
        burn_point(grid, line.start.x, line.start.y, value);
        return;
    }

    let samples = (length / step).ceil() as usize;
    for i in 0..=samples {
        let t = i as f64 / samples as f64;
        burn_point(grid, line.start.x + t * dx, line.start.y + t * dy, value);
    }
}

/// Burn every cell whose center lies inside the polygon
fn burn_polygon(grid: &mut Raster<f64>, polygon: &Polygon<f64>, value: f64) {
    let Some(rect) = polygon.bounding_rect() else {
        return;
    };

    // Pixel window of the polygon bounding box, clamped to the grid
    let (c0, r0) = grid.geo_to_pixel(rect.min().x, rect.max().y);
    let (c1, r1) = grid.geo_to_pixel(rect.max().x, rect.min().y);
    if !c0.is_finite() || !c1.is_finite() {
        return;
    }

    let col_start = (c0.floor() as isize).max(0);
    let row_start = (r0.floor() as isize).max(0);
    let col_end = (c1.ceil() as isize).min(grid.cols() as isize - 1);
    let row_end = (r1.ceil() as isize).min(grid.rows() as isize - 1);

    for row in row_start..=row_end {
        for col in col_start..=col_end {
            let (x, y) = grid.pixel_to_geo(col as usize, row as usize);
            if polygon.contains(&Point::new(x, y)) {
                unsafe { grid.set_unchecked(row as usize, col as usize, value) };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{polygon, LineString};
    use pozar_core::vector::{AttributeValue, Feature};

    fn square(min: f64, max: f64) -> Polygon<f64> {
        polygon![
            (x: min, y: min),
            (x: max, y: min),
            (x: max, y: max),
            (x: min, y: max),
        ]
    }

    fn feature_with_value(geometry: Geometry<f64>, value: f64) -> Feature {
        let mut f = Feature::new(geometry);
        f.set_attribute("Vrednost", AttributeValue::Float(value));
        f
    }

    fn params() -> RasterizeParams {
        RasterizeParams {
            field: Some("Vrednost".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn full_cover_polygon_burns_every_cell() {
        let mut fc = FeatureCollection::new();
        fc.push(feature_with_value(square(0.0, 100.0).into(), 3.0));

        let grid = rasterize(&fc, &params()).unwrap();
        assert_eq!(grid.shape(), (4, 4));
        assert_eq!(grid.nodata(), Some(-9999.0));

        for row in 0..4 {
            for col in 0..4 {
                assert_eq!(grid.get(row, col).unwrap(), 3.0);
            }
        }
    }

    #[test]
    fn partial_polygon_leaves_background_zero() {
        let mut fc = FeatureCollection::new();
        fc.push(feature_with_value(square(0.0, 100.0).into(), 0.0));
        fc.push(feature_with_value(square(0.0, 50.0).into(), 5.0));

        let grid = rasterize(&fc, &params()).unwrap();

        // Lower-left quadrant burned, rest stays 0
        assert_eq!(grid.get(3, 0).unwrap(), 5.0);
        assert_eq!(grid.get(2, 1).unwrap(), 5.0);
        assert_eq!(grid.get(0, 0).unwrap(), 0.0);
        assert_eq!(grid.get(3, 3).unwrap(), 0.0);
    }

    #[test]
    fn missing_attribute_falls_back_to_burn_value() {
        let mut fc = FeatureCollection::new();
        fc.push(Feature::new(square(0.0, 100.0).into()));

        let p = RasterizeParams {
            burn: 9.0,
            ..params()
        };
        let grid = rasterize(&fc, &p).unwrap();
        assert_eq!(grid.get(1, 1).unwrap(), 9.0);
    }

    #[test]
    fn later_features_overwrite_earlier() {
        let mut fc = FeatureCollection::new();
        fc.push(feature_with_value(square(0.0, 100.0).into(), 1.0));
        fc.push(feature_with_value(square(0.0, 100.0).into(), 2.0));

        let grid = rasterize(&fc, &params()).unwrap();
        assert_eq!(grid.get(2, 2).unwrap(), 2.0);
    }

    #[test]
    fn line_burns_traversed_cells() {
        let mut fc = FeatureCollection::new();
        // Horizontal line through the second cell row of a forced extent
        let line: LineString<f64> = vec![(5.0, 62.5), (95.0, 62.5)].into();
        fc.push(feature_with_value(line.into(), 7.0));

        let p = RasterizeParams {
            extent: Some(Extent::new(0.0, 0.0, 100.0, 100.0)),
            ..params()
        };
        let grid = rasterize(&fc, &p).unwrap();

        // y = 62.5 falls in row 1 of a 4-row grid with origin_y = 100
        for col in 0..4 {
            assert_eq!(grid.get(1, col).unwrap(), 7.0, "col {}", col);
        }
        assert_eq!(grid.get(0, 0).unwrap(), 0.0);
        assert_eq!(grid.get(2, 2).unwrap(), 0.0);
    }

    #[test]
    fn point_burns_containing_cell() {
        let mut fc = FeatureCollection::new();
        fc.push(feature_with_value(Point::new(30.0, 80.0).into(), 4.0));

        let p = RasterizeParams {
            extent: Some(Extent::new(0.0, 0.0, 100.0, 100.0)),
            ..params()
        };
        let grid = rasterize(&fc, &p).unwrap();

        // (30, 80) -> col 1, row 0
        assert_eq!(grid.get(0, 1).unwrap(), 4.0);
        assert_eq!(grid.statistics().valid_count, 16);
    }

    #[test]
    fn geometry_outside_extent_is_clipped_away() {
        let mut fc = FeatureCollection::new();
        fc.push(feature_with_value(square(200.0, 300.0).into(), 8.0));

        let p = RasterizeParams {
            extent: Some(Extent::new(0.0, 0.0, 100.0, 100.0)),
            ..params()
        };
        let grid = rasterize(&fc, &p).unwrap();
        assert_eq!(grid.statistics().max, Some(0.0));
    }

    #[test]
    fn empty_collection_is_rejected() {
        let fc = FeatureCollection::new();
        assert!(rasterize(&fc, &params()).is_err());
    }
}
