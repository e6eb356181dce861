//! Hierarchical greedy clustering of listings across zoom tiers
//!
//! Listings are projected into the unit Web Mercator square. The top tier
//! (`max_zoom`) holds the raw listings; every lower tier is derived from the
//! one above it by merging nodes that fall within the tier's cluster radius
//! into a weighted-centroid cluster. Each tier is kept in its own R-tree so a
//! viewport query only touches what is visible.

use crate::core::{
    bounds::Bounds,
    config::ClusterConfig,
    geo::{lat_to_unit_y, lng_to_unit_x, LatLng, LatLngBounds, Point},
    viewport::{zoom_tier, ViewportState},
};
use crate::data::geojson::{GeoJson, GeoJsonFeature};
use crate::data::listing::ListingPoint;
use crate::layers::marker::MarkerKey;
use crate::prelude::HashMap;
use crate::spatial::index::SpatialIndex;
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

const TIER_BITS: u64 = 5;
const TIER_MASK: u64 = (1 << TIER_BITS) - 1;

/// Identifier of a cluster within one built index.
///
/// Encodes the tier the cluster was formed at and the slot of its seed node
/// in the tier above, so it stays the same at every lower tier where the
/// cluster survives unmerged. Meaningless against any other build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClusterId(u64);

impl ClusterId {
    fn new(tier: u8, seed: usize) -> Self {
        Self(((seed as u64) << TIER_BITS) | tier as u64)
    }

    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }

    /// Tier the cluster was formed at
    pub fn tier(&self) -> u8 {
        (self.0 & TIER_MASK) as u8
    }

    fn seed(&self) -> usize {
        (self.0 >> TIER_BITS) as usize
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A renderable unit returned by a viewport query
#[derive(Debug, Clone, PartialEq)]
pub enum ClusterFeature {
    Cluster {
        id: ClusterId,
        centroid: LatLng,
        point_count: usize,
    },
    Leaf {
        point: Arc<ListingPoint>,
    },
}

impl ClusterFeature {
    pub fn position(&self) -> LatLng {
        match self {
            ClusterFeature::Cluster { centroid, .. } => *centroid,
            ClusterFeature::Leaf { point } => point.position(),
        }
    }

    pub fn is_cluster(&self) -> bool {
        matches!(self, ClusterFeature::Cluster { .. })
    }

    pub fn point_count(&self) -> usize {
        match self {
            ClusterFeature::Cluster { point_count, .. } => *point_count,
            ClusterFeature::Leaf { .. } => 1,
        }
    }

    pub fn marker_key(&self) -> MarkerKey {
        match self {
            ClusterFeature::Cluster { id, .. } => MarkerKey::Cluster(*id),
            ClusterFeature::Leaf { point } => MarkerKey::Point(point.id.clone()),
        }
    }

    /// GeoJSON Point feature; clusters carry `cluster`, `cluster_id`,
    /// `point_count` and `point_count_abbreviated` properties.
    pub fn to_geojson(&self) -> GeoJsonFeature {
        let position = self.position();
        let mut properties = Map::new();
        match self {
            ClusterFeature::Cluster {
                id, point_count, ..
            } => {
                properties.insert("cluster".to_string(), Value::Bool(true));
                properties.insert("cluster_id".to_string(), Value::from(id.raw()));
                properties.insert("point_count".to_string(), Value::from(*point_count));
                properties.insert(
                    "point_count_abbreviated".to_string(),
                    Value::String(abbreviate_count(*point_count)),
                );
                GeoJsonFeature::point(position.lng, position.lat, properties)
            }
            ClusterFeature::Leaf { point } => {
                if let Value::Object(listing) =
                    serde_json::to_value(point.as_ref()).unwrap_or(Value::Null)
                {
                    properties = listing;
                }
                properties.remove("lat");
                properties.remove("lng");
                let mut feature = GeoJsonFeature::point(position.lng, position.lat, properties);
                feature.id = Some(Value::String(point.id.clone()));
                feature
            }
        }
    }
}

/// Short label for a point count: `950`, `1.2k`, `15k`
pub fn abbreviate_count(count: usize) -> String {
    if count >= 10_000 {
        format!("{}k", (count as f64 / 1000.0).round())
    } else if count >= 1000 {
        format!("{}k", (count as f64 / 100.0).round() / 10.0)
    } else {
        count.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum NodeRef {
    Leaf(usize),
    Cluster(ClusterId),
}

#[derive(Debug, Clone)]
struct ClusterNode {
    position: Point,
    count: usize,
    node: NodeRef,
    /// Cluster that absorbed this node one tier down
    parent: Option<ClusterId>,
}

impl ClusterNode {
    fn carried(&self) -> Self {
        Self {
            parent: None,
            ..self.clone()
        }
    }
}

struct Tier {
    nodes: Vec<ClusterNode>,
    index: SpatialIndex,
}

impl Tier {
    fn new(nodes: Vec<ClusterNode>) -> Self {
        let index = SpatialIndex::bulk_load(nodes.iter().map(|node| node.position));
        Self { nodes, index }
    }
}

/// Immutable clustering index over one listing snapshot
pub struct ClusterIndex {
    config: ClusterConfig,
    leaves: Vec<Arc<ListingPoint>>,
    by_id: HashMap<String, usize>,
    /// `tiers[i]` holds zoom tier `config.min_zoom + i`
    tiers: Vec<Tier>,
}

impl ClusterIndex {
    /// Builds every tier from `listings` in the order given.
    ///
    /// Listings must already have valid coordinates and unique ids. Fails
    /// with `InvalidConfig` before touching the listings if `config` is
    /// unusable.
    pub fn build(listings: Vec<ListingPoint>, config: ClusterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build_validated(listings, config))
    }

    /// `build` for a config that already passed `ClusterConfig::validate`
    pub(crate) fn build_validated(listings: Vec<ListingPoint>, config: ClusterConfig) -> Self {
        let leaves: Vec<Arc<ListingPoint>> = listings.into_iter().map(Arc::new).collect();
        let by_id = leaves
            .iter()
            .enumerate()
            .map(|(i, listing)| (listing.id.clone(), i))
            .collect();

        let leaf_nodes = leaves
            .iter()
            .enumerate()
            .map(|(i, listing)| ClusterNode {
                position: listing.position().to_unit(),
                count: 1,
                node: NodeRef::Leaf(i),
                parent: None,
            })
            .collect();

        let mut built = Vec::with_capacity((config.max_zoom - config.min_zoom) as usize + 1);
        let mut current = Tier::new(leaf_nodes);
        for zoom in (config.min_zoom..config.max_zoom).rev() {
            let next = Tier::new(cluster_tier(&mut current, zoom, &config));
            built.push(current);
            current = next;
        }
        built.push(current);
        built.reverse();

        Self {
            config,
            leaves,
            by_id,
            tiers: built,
        }
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Number of indexed listings
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn listings(&self) -> impl Iterator<Item = &ListingPoint> {
        self.leaves.iter().map(|leaf| leaf.as_ref())
    }

    pub fn listing(&self, id: &str) -> Option<&Arc<ListingPoint>> {
        self.by_id.get(id).map(|&i| &self.leaves[i])
    }

    /// Tier answered for a fractional zoom
    pub fn tier_for_zoom(&self, zoom: f64) -> u8 {
        zoom_tier(zoom).clamp(self.config.min_zoom, self.config.max_zoom)
    }

    /// Number of features at a tier, visible or not
    pub fn tier_len(&self, tier: u8) -> usize {
        self.tier(tier).nodes.len()
    }

    /// Features visible in `bounds` at `zoom`.
    ///
    /// Longitudes are wrapped, latitudes clamped, spans of 360 degrees or more
    /// cover the whole world, and boxes crossing the antimeridian are queried
    /// as an eastern part followed by a western part.
    pub fn clusters(&self, bounds: &LatLngBounds, zoom: f64) -> Vec<ClusterFeature> {
        let mut min_lng = LatLng::wrap_lng(bounds.west());
        let min_lat = bounds.south().clamp(-90.0, 90.0);
        let mut max_lng = if bounds.east() == 180.0 {
            180.0
        } else {
            LatLng::wrap_lng(bounds.east())
        };
        let max_lat = bounds.north().clamp(-90.0, 90.0);

        if bounds.east() - bounds.west() >= 360.0 {
            min_lng = -180.0;
            max_lng = 180.0;
        } else if min_lng > max_lng {
            let mut features = self.clusters(
                &LatLngBounds::from_wsen(min_lng, min_lat, 180.0, max_lat),
                zoom,
            );
            features.extend(self.clusters(
                &LatLngBounds::from_wsen(-180.0, min_lat, max_lng, max_lat),
                zoom,
            ));
            return features;
        }

        let tier = self.tier(self.tier_for_zoom(zoom));
        let envelope = Bounds::from_coords(
            lng_to_unit_x(min_lng),
            lat_to_unit_y(max_lat),
            lng_to_unit_x(max_lng),
            lat_to_unit_y(min_lat),
        );

        tier.index
            .query(&envelope)
            .into_iter()
            .map(|slot| self.feature(&tier.nodes[slot]))
            .collect()
    }

    pub fn query(&self, state: &ViewportState) -> Vec<ClusterFeature> {
        self.clusters(&state.bounds, state.zoom)
    }

    /// Features one tier above the cluster's formation tier that merged into it
    pub fn children(&self, id: ClusterId) -> Result<Vec<ClusterFeature>> {
        let children = self.child_nodes(id)?;
        Ok(children.into_iter().map(|node| self.feature(node)).collect())
    }

    /// Smallest zoom at which the cluster splits into two or more features,
    /// capped at `max_zoom`.
    ///
    /// Every cluster merges at least two features of the tier above its
    /// formation tier, so that tier is where it splits.
    pub fn expansion_zoom(&self, id: ClusterId) -> Result<u8> {
        self.child_nodes(id)?;
        Ok(id.tier() + 1)
    }

    /// Every listing under the cluster
    pub fn leaves(&self, id: ClusterId) -> Result<Vec<&ListingPoint>> {
        let mut out = Vec::new();
        self.collect_leaves(id, &mut out)?;
        Ok(out)
    }

    /// GeoJSON FeatureCollection of the features visible in `bounds` at `zoom`
    pub fn to_geojson(&self, bounds: &LatLngBounds, zoom: f64) -> GeoJson {
        GeoJson::FeatureCollection {
            features: self
                .clusters(bounds, zoom)
                .iter()
                .map(ClusterFeature::to_geojson)
                .collect(),
        }
    }

    fn collect_leaves<'a>(&'a self, id: ClusterId, out: &mut Vec<&'a ListingPoint>) -> Result<()> {
        for child in self.child_nodes(id)? {
            match child.node {
                NodeRef::Leaf(i) => out.push(self.leaves[i].as_ref()),
                NodeRef::Cluster(inner) => self.collect_leaves(inner, out)?,
            }
        }
        Ok(())
    }

    fn child_nodes(&self, id: ClusterId) -> Result<Vec<&ClusterNode>> {
        let formed_at = id.tier();
        if formed_at < self.config.min_zoom || formed_at >= self.config.max_zoom {
            return Err(MapError::UnknownCluster(id));
        }

        let above = self.tier(formed_at + 1);
        let seed = above
            .nodes
            .get(id.seed())
            .filter(|node| node.parent == Some(id))
            .ok_or(MapError::UnknownCluster(id))?;

        let radius = self.config.unit_radius(formed_at);
        let mut slots = above.index.query_radius(&seed.position, radius);
        slots.sort_unstable();

        Ok(slots
            .into_iter()
            .map(|slot| &above.nodes[slot])
            .filter(|node| node.parent == Some(id))
            .collect())
    }

    fn tier(&self, zoom: u8) -> &Tier {
        let zoom = zoom.clamp(self.config.min_zoom, self.config.max_zoom);
        &self.tiers[(zoom - self.config.min_zoom) as usize]
    }

    fn feature(&self, node: &ClusterNode) -> ClusterFeature {
        match node.node {
            NodeRef::Leaf(i) => ClusterFeature::Leaf {
                point: Arc::clone(&self.leaves[i]),
            },
            NodeRef::Cluster(id) => ClusterFeature::Cluster {
                id,
                centroid: LatLng::from_unit(node.position),
                point_count: node.count,
            },
        }
    }
}

/// Derives the nodes of tier `zoom` from the tier above it.
///
/// Marks every merged node of `above` with its new parent.
fn cluster_tier(above: &mut Tier, zoom: u8, config: &ClusterConfig) -> Vec<ClusterNode> {
    let radius = config.unit_radius(zoom);
    let mut visited = vec![false; above.nodes.len()];
    let mut out = Vec::new();

    for i in 0..above.nodes.len() {
        if visited[i] {
            continue;
        }
        visited[i] = true;

        let seed_position = above.nodes[i].position;
        let seed_count = above.nodes[i].count;
        let neighbors = above.index.query_radius(&seed_position, radius);

        let merged_count = seed_count
            + neighbors
                .iter()
                .filter(|&&j| !visited[j])
                .map(|&j| above.nodes[j].count)
                .sum::<usize>();

        if merged_count > seed_count && merged_count >= config.min_points {
            let id = ClusterId::new(zoom, i);
            let mut wx = seed_position.x * seed_count as f64;
            let mut wy = seed_position.y * seed_count as f64;
            above.nodes[i].parent = Some(id);

            for &j in &neighbors {
                if visited[j] {
                    continue;
                }
                visited[j] = true;
                let neighbor = &mut above.nodes[j];
                wx += neighbor.position.x * neighbor.count as f64;
                wy += neighbor.position.y * neighbor.count as f64;
                neighbor.parent = Some(id);
            }

            out.push(ClusterNode {
                position: Point::new(wx / merged_count as f64, wy / merged_count as f64),
                count: merged_count,
                node: NodeRef::Cluster(id),
                parent: None,
            });
        } else {
            out.push(above.nodes[i].carried());
            if merged_count > 1 {
                for &j in &neighbors {
                    if visited[j] {
                        continue;
                    }
                    visited[j] = true;
                    out.push(above.nodes[j].carried());
                }
            }
        }
    }

    out
}
