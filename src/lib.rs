//! # listing-map
//!
//! A clustering and marker-synchronization engine for rendering large sets of
//! geo-located listings on an interactive map surface.
//!
//! The engine keeps a hierarchical clustering index of the current listing
//! set, answers viewport queries as the camera moves, reconciles rendered
//! markers against each query result without recreating unchanged elements,
//! drives a single-popup overlay and coordinates camera navigation requests
//! that may be superseded mid-flight. The basemap itself is an external
//! collaborator reached through the [`rendering::surface::MapSurface`] trait.

pub mod animation;
pub mod core;
pub mod data;
pub mod input;
pub mod layers;
pub mod prelude;
pub mod rendering;
pub mod spatial;
pub mod ui;
pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    config::EngineConfig,
    geo::{LatLng, LatLngBounds, Point},
    map::ListingMap,
    viewport::{Viewport, ViewportState},
};

pub use data::listing::{ListingPoint, PropertyKind, TransactionKind};

pub use spatial::{
    builder::{BuildOutcome, IndexBuilder},
    clustering::{ClusterFeature, ClusterId, ClusterIndex},
};

pub use layers::{
    manager::{MarkerManager, ReconcileReport},
    marker::{GraphicElement, MarkerHandle, MarkerKey, MarkerKind},
    scheduler::ReconcileScheduler,
};

pub use ui::{
    popup::{ListingDetailHandler, PopupController, PopupState},
    style::{StyleResolver, StyleToken},
};

pub use animation::navigation::{NavigationController, NavigationRequest, NavigationToken};

pub use input::events::MapEvent;

pub use rendering::{headless::HeadlessSurface, surface::MapSurface};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown region: {0}")]
    UnknownRegion(String),

    #[error("Unknown cluster: {0}")]
    UnknownCluster(spatial::clustering::ClusterId),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Error type alias for convenience
pub type Error = MapError;
