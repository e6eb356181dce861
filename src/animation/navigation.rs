//! Camera navigation requests with last-request-wins semantics
//!
//! Every request gets a fresh, increasing token. Issuing a new request
//! supersedes the one in flight, and a completion report only counts when it
//! carries the token of the newest request.

use crate::core::{
    config::{NavigationConfig, Region},
    geo::LatLng,
};
use crate::rendering::surface::{CameraMove, MapSurface};
use crate::spatial::clustering::ClusterId;
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NavigationToken(u64);

impl NavigationToken {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NavigationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "nav#{}", self.0)
    }
}

/// What asked for the camera to move
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationSource {
    Region(String),
    Locality(String),
    ClusterExpansion(ClusterId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NavigationRequest {
    pub target_center: LatLng,
    pub target_zoom: f64,
    pub token: NavigationToken,
    pub source: NavigationSource,
}

/// A place inside a region, as offered by the search/selection UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Locality {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub center: LatLng,
    /// Overrides the configured locality zoom
    #[serde(default)]
    pub zoom: Option<f64>,
}

impl Locality {
    pub fn new(id: impl Into<String>, center: LatLng) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            center,
            zoom: None,
        }
    }
}

pub struct NavigationController {
    config: NavigationConfig,
    regions: Vec<Region>,
    next_token: u64,
    in_flight: Option<NavigationRequest>,
    selected_region: Option<String>,
    selected_locality: Option<String>,
    completed: u64,
    superseded: u64,
    cancelled: u64,
}

impl NavigationController {
    pub fn new(config: NavigationConfig, regions: Vec<Region>) -> Self {
        Self {
            config,
            regions,
            next_token: 1,
            in_flight: None,
            selected_region: None,
            selected_locality: None,
            completed: 0,
            superseded: 0,
            cancelled: 0,
        }
    }

    /// Starts a camera move, superseding any move still in flight
    pub fn navigate<S: MapSurface + ?Sized>(
        &mut self,
        center: LatLng,
        zoom: f64,
        source: NavigationSource,
        surface: &mut S,
    ) -> NavigationToken {
        let token = NavigationToken::new(self.next_token);
        self.next_token += 1;

        if let Some(previous) = self.in_flight.take() {
            self.superseded += 1;
            log::debug!("{} superseded by {}", previous.token, token);
        }

        let duration_ms = match source {
            NavigationSource::Region(_) => self.config.region_duration_ms,
            NavigationSource::Locality(_) => self.config.locality_duration_ms,
            NavigationSource::ClusterExpansion(_) => self.config.cluster_duration_ms,
        };

        surface.ease_camera(CameraMove {
            center,
            zoom,
            duration: Duration::from_millis(duration_ms),
            easing: self.config.easing,
            token,
        });

        self.in_flight = Some(NavigationRequest {
            target_center: center,
            target_zoom: zoom,
            token,
            source,
        });
        token
    }

    /// Moves to a predefined region.
    ///
    /// Re-selecting the current region is a no-op and returns `Ok(None)`.
    pub fn select_region<S: MapSurface + ?Sized>(
        &mut self,
        region_id: &str,
        surface: &mut S,
    ) -> Result<Option<NavigationToken>> {
        let region = self
            .regions
            .iter()
            .find(|region| region.id == region_id)
            .cloned()
            .ok_or_else(|| MapError::UnknownRegion(region_id.to_string()))?;

        if self.selected_region.as_deref() == Some(region_id) {
            log::debug!("region '{}' already selected", region_id);
            return Ok(None);
        }

        self.selected_region = Some(region.id.clone());
        self.selected_locality = None;
        Ok(Some(self.navigate(
            region.center,
            region.zoom,
            NavigationSource::Region(region.id),
            surface,
        )))
    }

    /// Moves to a locality; re-selecting the current one is a no-op
    pub fn select_locality<S: MapSurface + ?Sized>(
        &mut self,
        locality: &Locality,
        surface: &mut S,
    ) -> Option<NavigationToken> {
        if !locality.center.is_valid() {
            log::warn!(
                "locality '{}' has invalid center ({}, {}), ignoring",
                locality.id,
                locality.center.lat,
                locality.center.lng
            );
            return None;
        }
        if self.selected_locality.as_deref() == Some(locality.id.as_str()) {
            return None;
        }

        self.selected_locality = Some(locality.id.clone());
        let zoom = locality.zoom.unwrap_or(self.config.locality_zoom);
        Some(self.navigate(
            locality.center,
            zoom,
            NavigationSource::Locality(locality.id.clone()),
            surface,
        ))
    }

    /// Zooms into a cluster at its expansion zoom
    pub fn expand_cluster<S: MapSurface + ?Sized>(
        &mut self,
        id: ClusterId,
        centroid: LatLng,
        expansion_zoom: u8,
        surface: &mut S,
    ) -> NavigationToken {
        self.navigate(
            centroid,
            expansion_zoom as f64,
            NavigationSource::ClusterExpansion(id),
            surface,
        )
    }

    /// Completes the in-flight request if `token` is its token
    pub fn on_camera_move_finished(&mut self, token: NavigationToken) -> Option<NavigationRequest> {
        match &self.in_flight {
            Some(request) if request.token == token => {
                self.completed += 1;
                self.in_flight.take()
            }
            _ => {
                log::debug!("ignoring completion of stale {}", token);
                None
            }
        }
    }

    /// Drops the in-flight request if the user interrupted its ease
    pub fn on_camera_move_cancelled(
        &mut self,
        token: NavigationToken,
    ) -> Option<NavigationRequest> {
        match &self.in_flight {
            Some(request) if request.token == token => {
                self.cancelled += 1;
                self.in_flight.take()
            }
            _ => {
                log::debug!("ignoring cancellation of stale {}", token);
                None
            }
        }
    }

    pub fn in_flight(&self) -> Option<&NavigationRequest> {
        self.in_flight.as_ref()
    }

    pub fn selected_region(&self) -> Option<&str> {
        self.selected_region.as_deref()
    }

    pub fn selected_locality(&self) -> Option<&str> {
        self.selected_locality.as_deref()
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Requests that ran to completion
    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// Requests replaced before they completed
    pub fn superseded(&self) -> u64 {
        self.superseded
    }

    /// Requests interrupted by user camera movement
    pub fn cancelled(&self) -> u64 {
        self.cancelled
    }
}
