//! Contract between the engine and whatever draws the basemap

use crate::animation::{interpolation::EasingFunction, navigation::NavigationToken};
use crate::core::{geo::LatLng, viewport::ViewportState};
use crate::input::events::MapEvent;
use crate::layers::marker::{GraphicElement, MarkerKey};
use crate::ui::popup::PopupContent;
use std::fmt;
use std::time::Duration;

/// Surface-assigned handle of an attached marker element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "element#{}", self.0)
    }
}

/// Surface-assigned handle of an open popup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PopupId(pub u64);

/// An animated camera move the surface should start immediately,
/// replacing any move already in progress.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraMove {
    pub center: LatLng,
    pub zoom: f64,
    pub duration: Duration,
    pub easing: EasingFunction,
    /// Reported back in [`MapEvent::CameraMoveFinished`]
    pub token: NavigationToken,
}

/// The map rendering surface as seen by the engine.
///
/// Marker and popup calls are fire-and-forget; the surface reports user
/// interaction and camera progress through [`MapSurface::drain_events`].
pub trait MapSurface {
    /// Currently visible bounds and zoom
    fn viewport(&self) -> ViewportState;

    fn attach_marker(
        &mut self,
        key: &MarkerKey,
        position: LatLng,
        graphic: &GraphicElement,
    ) -> ElementId;

    fn move_marker(&mut self, element: ElementId, position: LatLng);

    /// Redraws an attached element in place
    fn update_marker(&mut self, element: ElementId, graphic: &GraphicElement);

    fn detach_marker(&mut self, element: ElementId);

    fn open_popup(&mut self, anchor: LatLng, content: &PopupContent) -> PopupId;

    fn close_popup(&mut self, popup: PopupId);

    fn ease_camera(&mut self, camera_move: CameraMove);

    /// Events raised since the last call, oldest first
    fn drain_events(&mut self) -> Vec<MapEvent>;
}
