use crate::core::{bounds::Bounds, geo::Point};

use rstar::{PointDistance, RTree, RTreeObject, AABB};

/// A node position stored in one zoom tier's R-tree.
///
/// `slot` points back into the tier's node array, so the tree itself carries
/// no payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialItem {
    pub slot: usize,
    pub position: Point,
}

impl SpatialItem {
    pub fn new(slot: usize, position: Point) -> Self {
        Self { slot, position }
    }
}

// --- rstar integration -------------------------------------------------------------------------

impl RTreeObject for SpatialItem {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.position.x, self.position.y])
    }
}

impl PointDistance for SpatialItem {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.position.x - point[0];
        let dy = self.position.y - point[1];
        dx * dx + dy * dy
    }
}

/// Static R-tree over the node positions of a single zoom tier.
///
/// Bulk-loaded once per build; the same input order always yields the same
/// tree and therefore the same traversal order.
pub struct SpatialIndex {
    rtree: RTree<SpatialItem>,
}

impl SpatialIndex {
    /// Builds the tree with slot `i` at `positions[i]`
    pub fn bulk_load(positions: impl IntoIterator<Item = Point>) -> Self {
        let items = positions
            .into_iter()
            .enumerate()
            .map(|(slot, position)| SpatialItem::new(slot, position))
            .collect();
        Self {
            rtree: RTree::bulk_load(items),
        }
    }

    /// Slots whose position lies inside `bounds` (edges inclusive)
    pub fn query(&self, bounds: &Bounds) -> Vec<usize> {
        let (lower, upper) = bounds.corners();
        let envelope = AABB::from_corners(lower, upper);
        self.rtree
            .locate_in_envelope(&envelope)
            .map(|item| item.slot)
            .collect()
    }

    /// Slots within `radius` of `center`
    pub fn query_radius(&self, center: &Point, radius: f64) -> Vec<usize> {
        // rstar compares against the squared distance
        self.rtree
            .locate_within_distance([center.x, center.y], radius * radius)
            .map(|item| item.slot)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rtree.size() == 0
    }

    pub fn len(&self) -> usize {
        self.rtree.size()
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::bulk_load(std::iter::empty())
    }
}
