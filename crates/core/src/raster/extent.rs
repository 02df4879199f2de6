//! Axis-aligned extents and grid layout

use crate::error::{Error, Result};
use crate::raster::GeoTransform;
use serde::{Deserialize, Serialize};

/// An axis-aligned geographic bounding box.
///
/// Used to lay out rasterization grids: an extent plus a cell size fully
/// determines grid shape and georeferencing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// An extent with no area cannot host a grid
    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Smallest extent covering both
    pub fn union(&self, other: &Extent) -> Extent {
        Extent {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Grid shape (rows, cols) covering this extent at the given cell size.
    ///
    /// Partial cells at the top/right edges round up to a full cell.
    pub fn grid_shape(&self, cell_size: f64) -> Result<(usize, usize)> {
        if cell_size <= 0.0 || !cell_size.is_finite() {
            return Err(Error::InvalidParameter {
                name: "cell_size",
                value: cell_size.to_string(),
                reason: "must be finite and positive".to_string(),
            });
        }
        if self.is_degenerate() {
            return Err(Error::InvalidParameter {
                name: "extent",
                value: format!(
                    "({}, {}, {}, {})",
                    self.min_x, self.min_y, self.max_x, self.max_y
                ),
                reason: "degenerate extent".to_string(),
            });
        }

        let rows = (self.height() / cell_size).ceil() as usize;
        let cols = (self.width() / cell_size).ceil() as usize;
        Ok((rows, cols))
    }

    /// North-up transform anchoring this extent's upper-left corner
    pub fn to_transform(&self, cell_size: f64) -> GeoTransform {
        GeoTransform::new(self.min_x, self.max_y, cell_size, -cell_size)
    }
}
