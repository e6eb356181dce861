//! Prelude module for common listing-map types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use listing_map::prelude::*;`

pub use crate::core::{
    bounds::Bounds,
    config::{ClusterConfig, ClusteringProfile, EngineConfig, MarkerConfig, NavigationConfig, Region},
    geo::{LatLng, LatLngBounds, Point},
    map::ListingMap,
    viewport::{Viewport, ViewportState},
};

pub use crate::data::{
    geojson::{GeoJson, GeoJsonFeature},
    listing::{ListingPoint, PropertyKind, TransactionKind},
};

pub use crate::spatial::{
    builder::{BuildOutcome, IndexBuilder},
    clustering::{ClusterFeature, ClusterId, ClusterIndex},
    index::{SpatialIndex, SpatialItem},
};

pub use crate::layers::{
    manager::{MarkerManager, ReconcileReport},
    marker::{CompactPriceFormatter, GraphicElement, MarkerHandle, MarkerKey, PriceFormatter},
    scheduler::ReconcileScheduler,
};

pub use crate::ui::{
    popup::{ListingDetailHandler, PopupContent, PopupController, PopupState},
    style::{StyleResolver, StyleToken},
};

pub use crate::animation::{
    interpolation::EasingFunction,
    navigation::{Locality, NavigationController, NavigationToken},
    transitions::CameraTransition,
};

pub use crate::input::events::MapEvent;

pub use crate::rendering::{
    headless::HeadlessSurface,
    surface::{CameraMove, ElementId, MapSurface, PopupId},
};

pub use crate::{MapError, Result};

pub use std::{sync::Arc, time::Duration};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet, FxHasher};
