use crate::animation::navigation::NavigationToken;
use crate::core::{geo::LatLng, viewport::ViewportState};
use crate::layers::marker::MarkerKey;

/// Events the map surface reports back to the engine
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// Visible bounds or zoom changed, by the user or by a camera ease
    ViewportChanged(ViewportState),
    /// A rendered marker was clicked
    MarkerClicked(MarkerKey),
    /// Click on the map background
    MapClicked { lat_lng: Option<LatLng> },
    /// A camera ease ran to completion
    CameraMoveFinished(NavigationToken),
    /// A camera ease was interrupted by user movement before it finished
    CameraMoveCancelled(NavigationToken),
    /// The call-to-action inside the open popup was clicked
    PopupCtaClicked,
}

impl MapEvent {
    pub fn is_viewport_change(&self) -> bool {
        matches!(self, MapEvent::ViewportChanged(_))
    }
}

/// Keeps the last viewport change of a batch and every other event in order
pub fn coalesce_viewport_changes(events: Vec<MapEvent>) -> (Option<ViewportState>, Vec<MapEvent>) {
    let mut latest = None;
    let mut rest = Vec::with_capacity(events.len());
    for event in events {
        match event {
            MapEvent::ViewportChanged(state) => latest = Some(state),
            other => rest.push(other),
        }
    }
    (latest, rest)
}
