//! Configuration for clustering, marker rendering and camera navigation
//!
//! Every section can be built from a preset, from `Default`, or deserialized
//! from JSON where missing fields fall back to their defaults.

use crate::animation::interpolation::EasingFunction;
use crate::constants::{
    DEFAULT_CLUSTER_DURATION_MS, DEFAULT_CLUSTER_EXTENT, DEFAULT_CLUSTER_RADIUS,
    DEFAULT_LARGE_THRESHOLD, DEFAULT_LOCALITY_DURATION_MS, DEFAULT_LOCALITY_ZOOM,
    DEFAULT_MAX_ZOOM, DEFAULT_MEDIUM_THRESHOLD, DEFAULT_MIN_POINTS, DEFAULT_MIN_ZOOM,
    DEFAULT_REGION_DURATION_MS, MAX_SUPPORTED_ZOOM,
};
use crate::core::geo::LatLng;
use crate::prelude::HashSet;
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub enum ClusteringProfile {
    Balanced,
    /// Smaller radius and deeper clustering for dense urban inventories
    Dense,
    /// Wider radius, clustering stops earlier
    Sparse,
    Custom(ClusterConfig),
}

impl ClusteringProfile {
    pub fn resolve(&self) -> ClusterConfig {
        match self {
            Self::Balanced => ClusterConfig::default(),
            Self::Dense => ClusterConfig {
                radius: 40.0,
                extent: DEFAULT_CLUSTER_EXTENT,
                min_zoom: DEFAULT_MIN_ZOOM,
                max_zoom: 18,
                min_points: DEFAULT_MIN_POINTS,
            },
            Self::Sparse => ClusterConfig {
                radius: 80.0,
                extent: DEFAULT_CLUSTER_EXTENT,
                min_zoom: DEFAULT_MIN_ZOOM,
                max_zoom: 14,
                min_points: 3,
            },
            Self::Custom(config) => config.clone(),
        }
    }
}

impl Default for ClusteringProfile {
    fn default() -> Self {
        Self::Balanced
    }
}

/// Parameters of the hierarchical clustering index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Cluster radius in pixels
    pub radius: f64,
    /// Tile extent the radius is relative to
    pub extent: f64,
    pub min_zoom: u8,
    /// Tier holding raw listings; every tier below is clustered
    pub max_zoom: u8,
    pub min_points: usize,
}

impl ClusterConfig {
    /// Radius in unit Web Mercator space at the given zoom tier
    pub fn unit_radius(&self, zoom: u8) -> f64 {
        self.radius / (self.extent * 2_f64.powi(zoom as i32))
    }

    /// Rejects ranges and radii no index can be built from
    pub fn validate(&self) -> Result<()> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(MapError::InvalidConfig(format!(
                "cluster radius must be positive, got {}",
                self.radius
            )));
        }
        if !(self.extent.is_finite() && self.extent > 0.0) {
            return Err(MapError::InvalidConfig(format!(
                "cluster extent must be positive, got {}",
                self.extent
            )));
        }
        if self.min_zoom > self.max_zoom || self.max_zoom > MAX_SUPPORTED_ZOOM {
            return Err(MapError::InvalidConfig(format!(
                "zoom range {}..={} must satisfy min <= max <= {}",
                self.min_zoom, self.max_zoom, MAX_SUPPORTED_ZOOM
            )));
        }
        if self.min_points < 2 {
            return Err(MapError::InvalidConfig(format!(
                "min_points must be at least 2, got {}",
                self.min_points
            )));
        }
        Ok(())
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            radius: DEFAULT_CLUSTER_RADIUS,
            extent: DEFAULT_CLUSTER_EXTENT,
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            min_points: DEFAULT_MIN_POINTS,
        }
    }
}

/// Cluster badge bucketing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    pub medium_threshold: usize,
    pub large_threshold: usize,
}

impl MarkerConfig {
    fn validate(&self) -> Result<()> {
        if self.medium_threshold == 0 || self.medium_threshold >= self.large_threshold {
            return Err(MapError::InvalidConfig(format!(
                "badge thresholds must satisfy 0 < {} < {}",
                self.medium_threshold, self.large_threshold
            )));
        }
        Ok(())
    }
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            medium_threshold: DEFAULT_MEDIUM_THRESHOLD,
            large_threshold: DEFAULT_LARGE_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    pub region_duration_ms: u64,
    pub locality_duration_ms: u64,
    pub cluster_duration_ms: u64,
    pub easing: EasingFunction,
    pub locality_zoom: f64,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            region_duration_ms: DEFAULT_REGION_DURATION_MS,
            locality_duration_ms: DEFAULT_LOCALITY_DURATION_MS,
            cluster_duration_ms: DEFAULT_CLUSTER_DURATION_MS,
            easing: EasingFunction::EaseInOutCubic,
            locality_zoom: DEFAULT_LOCALITY_ZOOM,
        }
    }
}

/// A predefined area the user can jump to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    pub name: String,
    pub center: LatLng,
    pub zoom: f64,
}

impl Region {
    pub fn new(id: impl Into<String>, name: impl Into<String>, center: LatLng, zoom: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            center,
            zoom,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub clustering: ClusterConfig,
    pub markers: MarkerConfig,
    pub navigation: NavigationConfig,
    pub regions: Vec<Region>,
}

impl EngineConfig {
    /// Default sections with clustering taken from a preset
    pub fn with_profile(profile: ClusteringProfile) -> Self {
        Self {
            clustering: profile.resolve(),
            ..Self::default()
        }
    }

    pub fn with_regions(mut self, regions: Vec<Region>) -> Self {
        self.regions = regions;
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        self.clustering.validate()?;
        self.markers.validate()?;

        let nav = &self.navigation;
        if !(nav.locality_zoom.is_finite() && nav.locality_zoom >= 0.0) {
            return Err(MapError::InvalidConfig(format!(
                "locality zoom must be a non-negative number, got {}",
                nav.locality_zoom
            )));
        }

        let mut seen = HashSet::default();
        for region in &self.regions {
            if !seen.insert(region.id.as_str()) {
                return Err(MapError::InvalidConfig(format!(
                    "duplicate region id '{}'",
                    region.id
                )));
            }
            if !region.center.is_valid() {
                return Err(MapError::InvalidCoordinates(format!(
                    "region '{}' has center ({}, {})",
                    region.id, region.center.lat, region.center.lng
                )));
            }
        }
        Ok(())
    }

    pub fn region(&self, id: &str) -> Option<&Region> {
        self.regions.iter().find(|region| region.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clustering_profile_presets() {
        let balanced = ClusteringProfile::Balanced.resolve();
        let dense = ClusteringProfile::Dense.resolve();
        let sparse = ClusteringProfile::Sparse.resolve();

        assert_eq!(balanced, ClusterConfig::default());
        assert!(dense.radius < balanced.radius);
        assert!(dense.max_zoom > balanced.max_zoom);
        assert!(sparse.radius > balanced.radius);
        assert!(sparse.max_zoom < balanced.max_zoom);

        let custom = ClusterConfig {
            radius: 10.0,
            ..ClusterConfig::default()
        };
        assert_eq!(ClusteringProfile::Custom(custom.clone()).resolve(), custom);
    }

    #[test]
    fn test_unit_radius_halves_per_zoom() {
        let config = ClusterConfig::default();
        let r0 = config.unit_radius(0);
        let r1 = config.unit_radius(1);
        assert!((r0 - 60.0 / 512.0).abs() < 1e-12);
        assert!((r0 / r1 - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EngineConfig::from_json_str(
            r#"{
                "clustering": { "radius": 40 },
                "regions": [
                    { "id": "attica", "name": "Attica", "center": { "lat": 37.98, "lng": 23.72 }, "zoom": 10 }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(config.clustering.radius, 40.0);
        assert_eq!(config.clustering.max_zoom, DEFAULT_MAX_ZOOM);
        assert_eq!(config.markers, MarkerConfig::default());
        assert_eq!(config.region("attica").map(|r| r.zoom), Some(10.0));
        assert!(config.region("crete").is_none());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = EngineConfig::default();
        config.clustering.radius = 0.0;
        assert!(matches!(config.validate(), Err(MapError::InvalidConfig(_))));

        let mut config = EngineConfig::default();
        config.clustering.min_zoom = 10;
        config.clustering.max_zoom = 5;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.clustering.min_points = 1;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.markers.medium_threshold = 100;
        config.markers.large_threshold = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_region_ids_rejected() {
        let region = Region::new("north", "North", LatLng::new(40.0, 22.0), 8.0);
        let config = EngineConfig::default().with_regions(vec![region.clone(), region]);
        assert!(matches!(config.validate(), Err(MapError::InvalidConfig(_))));
    }

    #[test]
    fn test_malformed_json_is_serialization_error() {
        let result = EngineConfig::from_json_str("{ not json");
        assert!(matches!(result, Err(MapError::Serialization(_))));
    }
}
