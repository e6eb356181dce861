use crate::core::geo::Point;
use serde::{Deserialize, Serialize};

/// Axis-aligned box in the unit Web Mercator square (y grows southwards)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    /// Builds a box from two corners given in any order
    pub fn from_coords(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            min: Point::new(x1.min(x2), y1.min(y2)),
            max: Point::new(x1.max(x2), y1.max(y2)),
        }
    }

    pub fn contains(&self, point: &Point) -> bool {
        (self.min.x..=self.max.x).contains(&point.x) && (self.min.y..=self.max.y).contains(&point.y)
    }

    /// Envelope corners in the form the R-tree expects
    pub fn corners(&self) -> ([f64; 2], [f64; 2]) {
        ([self.min.x, self.min.y], [self.max.x, self.max.y])
    }
}
