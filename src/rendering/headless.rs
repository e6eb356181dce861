//! In-memory map surface
//!
//! Keeps the attached markers and open popups in plain collections, runs
//! camera eases against a Web Mercator [`Viewport`] as time is advanced, and
//! lets callers inject clicks. Used by the test suite and the command-line
//! viewer.

use crate::animation::transitions::{CameraTransition, TransitionState};
use crate::core::{
    geo::{LatLng, Point},
    viewport::{Viewport, ViewportState},
};
use crate::input::events::MapEvent;
use crate::layers::marker::{GraphicElement, MarkerKey};
use crate::prelude::HashMap;
use crate::rendering::surface::{CameraMove, ElementId, MapSurface, PopupId};
use crate::ui::popup::PopupContent;

/// Call counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SurfaceStats {
    pub attached: usize,
    pub detached: usize,
    pub moved: usize,
    pub updated: usize,
    pub popups_opened: usize,
    pub popups_closed: usize,
    /// Most popups ever open at once
    pub peak_popups: usize,
    pub camera_moves: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessMarker {
    pub key: MarkerKey,
    pub position: LatLng,
    pub graphic: GraphicElement,
}

#[derive(Debug, Clone, PartialEq)]
struct OpenPopup {
    id: PopupId,
    anchor: LatLng,
    content: PopupContent,
}

pub struct HeadlessSurface {
    camera: Viewport,
    markers: HashMap<ElementId, HeadlessMarker>,
    popups: Vec<OpenPopup>,
    transition: Option<CameraTransition>,
    events: Vec<MapEvent>,
    next_element: u64,
    next_popup: u64,
    stats: SurfaceStats,
}

impl HeadlessSurface {
    pub fn new(camera: Viewport) -> Self {
        Self {
            camera,
            markers: HashMap::default(),
            popups: Vec::new(),
            transition: None,
            events: Vec::new(),
            next_element: 1,
            next_popup: 1,
            stats: SurfaceStats::default(),
        }
    }

    /// Camera model behind [`MapSurface::viewport`]
    pub fn camera(&self) -> &Viewport {
        &self.camera
    }

    /// Jumps the camera as a user pan/zoom would, interrupting any ease
    pub fn set_view(&mut self, center: LatLng, zoom: f64) {
        if let Some(mut transition) = self.transition.take() {
            transition.cancel();
            self.events.push(MapEvent::CameraMoveCancelled(transition.token));
        }
        self.camera.set_center(center);
        self.camera.set_zoom(zoom);
        self.events.push(MapEvent::ViewportChanged(self.camera.state()));
    }

    pub fn set_size(&mut self, size: Point) {
        self.camera.set_size(size);
        self.events.push(MapEvent::ViewportChanged(self.camera.state()));
    }

    /// Advances the running camera ease by `delta_time` seconds
    pub fn advance(&mut self, delta_time: f64) {
        let Some(transition) = self.transition.as_mut() else {
            return;
        };
        if !transition.update(delta_time) {
            return;
        }

        let (center, zoom) = transition.current();
        let finished = transition.state == TransitionState::Completed;
        let token = transition.token;

        self.camera.set_center(center);
        self.camera.set_zoom(zoom);
        self.events.push(MapEvent::ViewportChanged(self.camera.state()));

        if finished {
            self.transition = None;
            self.events.push(MapEvent::CameraMoveFinished(token));
        }
    }

    /// Runs the current ease to its end
    pub fn finish_camera(&mut self) {
        if let Some(remaining) = self
            .transition
            .as_ref()
            .map(|t| (t.duration - t.elapsed_time).max(0.0))
        {
            self.advance(remaining);
        }
    }

    pub fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    pub fn camera_transition(&self) -> Option<&CameraTransition> {
        self.transition.as_ref()
    }

    /// Queues a click on the marker with `key`; false if no such marker is attached
    pub fn click_marker(&mut self, key: &MarkerKey) -> bool {
        if self.marker_by_key(key).is_none() {
            return false;
        }
        self.events.push(MapEvent::MarkerClicked(key.clone()));
        true
    }

    /// Queues a click on empty map
    pub fn click_map(&mut self) {
        self.events.push(MapEvent::MapClicked {
            lat_lng: Some(self.camera.center),
        });
    }

    /// Queues a click on the popup's call-to-action; false if no popup is open
    pub fn click_popup_cta(&mut self) -> bool {
        if self.popups.is_empty() {
            return false;
        }
        self.events.push(MapEvent::PopupCtaClicked);
        true
    }

    /// Queues an arbitrary event
    pub fn push_event(&mut self, event: MapEvent) {
        self.events.push(event);
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn marker(&self, element: ElementId) -> Option<&HeadlessMarker> {
        self.markers.get(&element)
    }

    pub fn marker_by_key(&self, key: &MarkerKey) -> Option<&HeadlessMarker> {
        self.markers.values().find(|marker| &marker.key == key)
    }

    /// Attached markers ordered by key
    pub fn markers(&self) -> Vec<&HeadlessMarker> {
        let mut markers: Vec<_> = self.markers.values().collect();
        markers.sort_by(|a, b| a.key.cmp(&b.key));
        markers
    }

    /// The most recently opened popup still on screen
    pub fn popup(&self) -> Option<(PopupId, &PopupContent)> {
        self.popups.last().map(|popup| (popup.id, &popup.content))
    }

    pub fn popup_anchor(&self) -> Option<LatLng> {
        self.popups.last().map(|popup| popup.anchor)
    }

    pub fn open_popups(&self) -> usize {
        self.popups.len()
    }

    pub fn stats(&self) -> &SurfaceStats {
        &self.stats
    }
}

impl MapSurface for HeadlessSurface {
    fn viewport(&self) -> ViewportState {
        self.camera.state()
    }

    fn attach_marker(
        &mut self,
        key: &MarkerKey,
        position: LatLng,
        graphic: &GraphicElement,
    ) -> ElementId {
        let element = ElementId(self.next_element);
        self.next_element += 1;
        self.markers.insert(
            element,
            HeadlessMarker {
                key: key.clone(),
                position,
                graphic: graphic.clone(),
            },
        );
        self.stats.attached += 1;
        element
    }

    fn move_marker(&mut self, element: ElementId, position: LatLng) {
        match self.markers.get_mut(&element) {
            Some(marker) => {
                marker.position = position;
                self.stats.moved += 1;
            }
            None => log::warn!("move of unknown {}", element),
        }
    }

    fn update_marker(&mut self, element: ElementId, graphic: &GraphicElement) {
        match self.markers.get_mut(&element) {
            Some(marker) => {
                marker.graphic = graphic.clone();
                self.stats.updated += 1;
            }
            None => log::warn!("update of unknown {}", element),
        }
    }

    fn detach_marker(&mut self, element: ElementId) {
        if self.markers.remove(&element).is_some() {
            self.stats.detached += 1;
        } else {
            log::warn!("detach of unknown {}", element);
        }
    }

    fn open_popup(&mut self, anchor: LatLng, content: &PopupContent) -> PopupId {
        let id = PopupId(self.next_popup);
        self.next_popup += 1;
        self.popups.push(OpenPopup {
            id,
            anchor,
            content: content.clone(),
        });
        self.stats.popups_opened += 1;
        self.stats.peak_popups = self.stats.peak_popups.max(self.popups.len());
        id
    }

    fn close_popup(&mut self, popup: PopupId) {
        let before = self.popups.len();
        self.popups.retain(|open| open.id != popup);
        if self.popups.len() < before {
            self.stats.popups_closed += 1;
        }
    }

    fn ease_camera(&mut self, camera_move: CameraMove) {
        if let Some(mut previous) = self.transition.take() {
            previous.cancel();
        }
        self.transition = Some(CameraTransition::new(
            self.camera.center,
            self.camera.zoom,
            &camera_move,
        ));
        self.stats.camera_moves += 1;
    }

    fn drain_events(&mut self) -> Vec<MapEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{interpolation::EasingFunction, navigation::NavigationToken};
    use crate::layers::marker::BadgeSize;
    use std::time::Duration;

    fn surface() -> HeadlessSurface {
        HeadlessSurface::new(Viewport::new(
            LatLng::new(0.0, 0.0),
            4.0,
            Point::new(800.0, 600.0),
        ))
    }

    fn camera_move(token: u64, lat: f64, zoom: f64) -> CameraMove {
        CameraMove {
            center: LatLng::new(lat, 0.0),
            zoom,
            duration: Duration::from_millis(1000),
            easing: EasingFunction::Linear,
            token: NavigationToken::new(token),
        }
    }

    #[test]
    fn test_marker_bookkeeping() {
        let mut surface = surface();
        let badge = GraphicElement::ClusterBadge {
            count: 3,
            size: BadgeSize::Small,
            label: "3".into(),
        };
        let key = MarkerKey::Point("a".into());
        let element = surface.attach_marker(&key, LatLng::new(1.0, 1.0), &badge);

        surface.move_marker(element, LatLng::new(2.0, 2.0));
        assert_eq!(surface.marker(element).map(|m| m.position), Some(LatLng::new(2.0, 2.0)));
        assert!(surface.click_marker(&key));
        assert!(!surface.click_marker(&MarkerKey::Point("zzz".into())));

        surface.detach_marker(element);
        assert_eq!(surface.marker_count(), 0);
        assert_eq!(surface.stats().attached, 1);
        assert_eq!(surface.stats().detached, 1);
        assert_eq!(surface.drain_events(), vec![MapEvent::MarkerClicked(key)]);
    }

    #[test]
    fn test_camera_ease_emits_progress_and_completion() {
        let mut surface = surface();
        surface.ease_camera(camera_move(1, 10.0, 8.0));
        assert!(surface.is_animating());

        surface.advance(0.5);
        assert!((surface.camera().zoom - 6.0).abs() < 1e-9);
        surface.advance(0.5);
        assert!(!surface.is_animating());

        let events = surface.drain_events();
        assert_eq!(events.len(), 3);
        assert!(events[0].is_viewport_change());
        assert_eq!(
            events.last(),
            Some(&MapEvent::CameraMoveFinished(NavigationToken::new(1)))
        );
        assert_eq!(surface.camera().zoom, 8.0);
    }

    #[test]
    fn test_new_ease_replaces_running_one() {
        let mut surface = surface();
        surface.ease_camera(camera_move(1, 10.0, 8.0));
        surface.advance(0.5);
        surface.ease_camera(camera_move(2, -10.0, 5.0));

        let transition = surface.camera_transition().cloned();
        assert_eq!(transition.as_ref().map(|t| t.start_zoom), Some(6.0));

        surface.finish_camera();
        let finished: Vec<_> = surface
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, MapEvent::CameraMoveFinished(_)))
            .collect();
        assert_eq!(finished, vec![MapEvent::CameraMoveFinished(NavigationToken::new(2))]);
        assert_eq!(surface.camera().zoom, 5.0);
    }

    #[test]
    fn test_user_pan_cancels_ease() {
        let mut surface = surface();
        surface.ease_camera(camera_move(1, 10.0, 8.0));
        surface.set_view(LatLng::new(5.0, 5.0), 3.0);
        assert!(!surface.is_animating());
        surface.advance(1.0);

        let events = surface.drain_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], MapEvent::CameraMoveCancelled(NavigationToken::new(1)));
        assert!(events[1].is_viewport_change());
    }
}
