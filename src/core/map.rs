use crate::{
    animation::navigation::{Locality, NavigationController, NavigationToken},
    core::{config::EngineConfig, constants::MAX_SETTLE_PASSES, viewport::ViewportState},
    data::listing::ListingPoint,
    input::events::{coalesce_viewport_changes, MapEvent},
    layers::{
        manager::{MarkerManager, ReconcileReport},
        marker::{MarkerKey, PriceFormatter},
        scheduler::ReconcileScheduler,
    },
    rendering::surface::MapSurface,
    spatial::{
        builder::{BuildOutcome, IndexBuilder},
        clustering::ClusterIndex,
    },
    ui::popup::{ListingDetailHandler, PopupController},
    Result,
};
use std::sync::Arc;

/// Listing map engine bound to one rendering surface.
///
/// Owns the clustering index, the rendered marker registry, the popup and
/// the navigation state. Everything runs on the caller's thread: the surface
/// reports what happened through [`MapSurface::drain_events`] and
/// [`ListingMap::process_surface_events`] reacts to it.
pub struct ListingMap<S: MapSurface> {
    surface: S,
    config: EngineConfig,
    builder: IndexBuilder,
    markers: MarkerManager,
    popup: PopupController,
    navigation: NavigationController,
    scheduler: ReconcileScheduler,
    detail_handler: Option<Box<dyn ListingDetailHandler>>,
    last_report: ReconcileReport,
    /// Non-viewport events drained while a pass was running
    deferred: Vec<MapEvent>,
}

impl<S: MapSurface> ListingMap<S> {
    pub fn new(surface: S, config: EngineConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            builder: IndexBuilder::new(config.clustering.clone())?,
            markers: MarkerManager::new(config.markers.clone()),
            popup: PopupController::new(),
            navigation: NavigationController::new(
                config.navigation.clone(),
                config.regions.clone(),
            ),
            scheduler: ReconcileScheduler::new(),
            detail_handler: None,
            last_report: ReconcileReport::default(),
            deferred: Vec::new(),
            surface,
            config,
        })
    }

    /// Uses `formatter` for marker chips and popups alike
    pub fn with_price_formatter(mut self, formatter: Arc<dyn PriceFormatter>) -> Self {
        self.markers = self.markers.with_formatter(Arc::clone(&formatter));
        self.popup = self.popup.with_formatter(formatter);
        self
    }

    pub fn set_detail_handler(&mut self, handler: impl ListingDetailHandler + 'static) {
        self.detail_handler = Some(Box::new(handler));
    }

    /// Replaces the listing set.
    ///
    /// The index is rebuilt only when the content changed, and a rebuild is
    /// followed by one reconciliation pass against the current viewport.
    pub fn set_listings(&mut self, listings: Vec<ListingPoint>) -> Result<BuildOutcome> {
        let outcome = self.builder.rebuild(listings);
        if outcome.is_rebuilt() {
            self.reconcile_now();
        }
        Ok(outcome)
    }

    /// Reconciles markers against the surface's current viewport
    pub fn reconcile_now(&mut self) -> ReconcileReport {
        let state = self.surface.viewport();
        self.request_pass(state)
    }

    fn request_pass(&mut self, state: ViewportState) -> ReconcileReport {
        let Some(mut state) = self.scheduler.request(state) else {
            return ReconcileReport::default();
        };

        let mut settled = 0;
        loop {
            self.scheduler.begin();
            let report = self.run_pass(&state);
            self.absorb_events_raised_during_pass();
            settled += 1;

            match self.scheduler.finish() {
                Some(next) if settled < MAX_SETTLE_PASSES => state = next,
                Some(next) => {
                    log::warn!(
                        "viewport did not settle after {} passes, dropping z{:.2}",
                        settled,
                        next.zoom
                    );
                    return report;
                }
                None => return report,
            }
        }
    }

    /// Viewport changes the surface raised while markers were being applied
    /// park in the scheduler as the follow-up pass; everything else waits
    /// for the next `process_surface_events`.
    fn absorb_events_raised_during_pass(&mut self) {
        for event in self.surface.drain_events() {
            match event {
                // the pass is still marked running, so this only parks it
                MapEvent::ViewportChanged(state) => {
                    self.scheduler.request(state);
                }
                other => self.deferred.push(other),
            }
        }
    }

    fn run_pass(&mut self, state: &ViewportState) -> ReconcileReport {
        let index = self.builder.snapshot();
        let report = self.markers.reconcile(&index, state, &mut self.surface);

        for key in &report.removed_keys {
            self.popup.on_marker_removed(key, &mut self.surface);
        }

        self.last_report = report.clone();
        report
    }

    pub fn select_region(&mut self, region_id: &str) -> Result<Option<NavigationToken>> {
        self.navigation.select_region(region_id, &mut self.surface)
    }

    pub fn select_locality(&mut self, locality: &Locality) -> Option<NavigationToken> {
        self.navigation.select_locality(locality, &mut self.surface)
    }

    /// Reacts to one surface event
    pub fn handle_event(&mut self, event: MapEvent) -> Result<()> {
        match event {
            MapEvent::ViewportChanged(state) => {
                self.request_pass(state);
            }
            MapEvent::MarkerClicked(key) => self.on_marker_clicked(&key)?,
            MapEvent::MapClicked { .. } => {
                self.popup.close(&mut self.surface);
            }
            MapEvent::CameraMoveFinished(token) => {
                if let Some(request) = self.navigation.on_camera_move_finished(token) {
                    log::debug!(
                        "{} arrived at z{:.2} ({:?})",
                        request.token,
                        request.target_zoom,
                        request.source
                    );
                }
            }
            MapEvent::CameraMoveCancelled(token) => {
                if let Some(request) = self.navigation.on_camera_move_cancelled(token) {
                    log::debug!("{} interrupted by the user ({:?})", request.token, request.source);
                }
            }
            MapEvent::PopupCtaClicked => {
                self.open_active_listing();
            }
        }
        Ok(())
    }

    fn on_marker_clicked(&mut self, key: &MarkerKey) -> Result<()> {
        let Some(handle) = self.markers.get(key).cloned() else {
            log::debug!("click on {} which is no longer rendered", key);
            return Ok(());
        };

        match &handle.key {
            MarkerKey::Point(id) => match self.builder.index().listing(id) {
                Some(listing) => {
                    self.popup.open_for(&handle, listing, &mut self.surface);
                }
                None => log::debug!("listing {} left the index", id),
            },
            MarkerKey::Cluster(id) => {
                let zoom = self.builder.index().expansion_zoom(*id)?;
                self.navigation
                    .expand_cluster(*id, handle.position, zoom, &mut self.surface);
            }
        }
        Ok(())
    }

    /// Drains and handles everything the surface reported.
    ///
    /// Viewport changes within one batch collapse into a single pass against
    /// the latest state, run before the other events of the batch. Returns
    /// the number of events consumed.
    pub fn process_surface_events(&mut self) -> Result<usize> {
        let mut consumed = 0;
        for _ in 0..MAX_SETTLE_PASSES {
            let mut events = std::mem::take(&mut self.deferred);
            events.extend(self.surface.drain_events());
            if events.is_empty() {
                return Ok(consumed);
            }
            consumed += events.len();

            let (latest, rest) = coalesce_viewport_changes(events);
            if let Some(state) = latest {
                self.request_pass(state);
            }
            for event in rest {
                self.handle_event(event)?;
            }
        }

        log::warn!(
            "surface still busy after {} event batches, deferring the rest",
            MAX_SETTLE_PASSES
        );
        Ok(consumed)
    }

    /// Hands the open popup's listing to the detail handler
    pub fn open_active_listing(&mut self) -> Option<String> {
        let Some(handler) = self.detail_handler.as_mut() else {
            log::debug!("no listing detail handler installed");
            return None;
        };
        self.popup.activate_cta(handler.as_mut())
    }

    /// Removes every marker and the popup from the surface
    pub fn teardown(&mut self) -> usize {
        self.popup.close(&mut self.surface);
        let removed = self.markers.clear(&mut self.surface);
        log::info!("listing map torn down, {} markers removed", removed);
        removed
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn markers(&self) -> &MarkerManager {
        &self.markers
    }

    pub fn popup(&self) -> &PopupController {
        &self.popup
    }

    pub fn navigation(&self) -> &NavigationController {
        &self.navigation
    }

    pub fn index(&self) -> Arc<ClusterIndex> {
        self.builder.snapshot()
    }

    pub fn generation(&self) -> u64 {
        self.builder.generation()
    }

    pub fn scheduler(&self) -> &ReconcileScheduler {
        &self.scheduler
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Report of the most recent reconciliation pass
    pub fn last_report(&self) -> &ReconcileReport {
        &self.last_report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        config::Region,
        geo::{LatLng, Point},
        viewport::Viewport,
    };
    use crate::layers::marker::GraphicElement;
    use crate::rendering::{
        headless::HeadlessSurface,
        surface::{CameraMove, ElementId, PopupId},
    };
    use crate::ui::popup::PopupContent;
    use crate::MapError;

    fn map() -> ListingMap<HeadlessSurface> {
        let surface = HeadlessSurface::new(Viewport::new(
            LatLng::new(37.98, 23.72),
            16.0,
            Point::new(1024.0, 768.0),
        ));
        let config = EngineConfig::default().with_regions(vec![Region::new(
            "attica",
            "Attica",
            LatLng::new(37.98, 23.72),
            10.0,
        )]);
        ListingMap::new(surface, config).unwrap()
    }

    fn listings() -> Vec<ListingPoint> {
        vec![
            ListingPoint::new("a", 37.9800, 23.7200).with_price(250_000.0),
            ListingPoint::new("b", 37.9810, 23.7210).with_price(1_200_000.0),
        ]
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = EngineConfig::default();
        config.clustering.radius = 0.0;
        let surface = HeadlessSurface::new(Viewport::default());
        assert!(matches!(
            ListingMap::new(surface, config),
            Err(MapError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_set_listings_renders_and_skips_unchanged() {
        let mut map = map();
        assert!(map.set_listings(listings()).unwrap().is_rebuilt());
        assert_eq!(map.surface().marker_count(), 2);
        assert_eq!(map.generation(), 1);

        let mut reversed = listings();
        reversed.reverse();
        assert_eq!(map.set_listings(reversed).unwrap(), BuildOutcome::Unchanged);
        assert_eq!(map.surface().stats().attached, 2);
    }

    #[test]
    fn test_leaf_click_opens_popup_and_map_click_closes_it() {
        let mut map = map();
        map.set_listings(listings()).unwrap();

        let key = MarkerKey::Point("a".into());
        assert!(map.surface_mut().click_marker(&key));
        map.process_surface_events().unwrap();
        assert_eq!(map.popup().open_key(), Some(&key));

        map.surface_mut().click_map();
        map.process_surface_events().unwrap();
        assert!(!map.popup().is_open());
        assert_eq!(map.surface().open_popups(), 0);
    }

    #[test]
    fn test_stale_marker_click_is_noop() {
        let mut map = map();
        map.set_listings(listings()).unwrap();
        map.surface_mut()
            .push_event(MapEvent::MarkerClicked(MarkerKey::Point("gone".into())));
        assert_eq!(map.process_surface_events().unwrap(), 1);
        assert!(!map.popup().is_open());
    }

    #[test]
    fn test_cta_hands_off_listing_id() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let opened = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&opened);

        let mut map = map();
        map.set_detail_handler(move |id: &str| sink.borrow_mut().push(id.to_string()));
        map.set_listings(listings()).unwrap();

        assert_eq!(map.open_active_listing(), None);
        map.surface_mut().click_marker(&MarkerKey::Point("b".into()));
        map.process_surface_events().unwrap();
        assert!(map.surface_mut().click_popup_cta());
        map.process_surface_events().unwrap();

        assert_eq!(*opened.borrow(), vec!["b".to_string()]);
    }

    #[test]
    fn test_teardown_clears_everything() {
        let mut map = map();
        map.set_listings(listings()).unwrap();
        map.surface_mut().click_marker(&MarkerKey::Point("a".into()));
        map.process_surface_events().unwrap();

        assert_eq!(map.teardown(), 2);
        assert_eq!(map.surface().marker_count(), 0);
        assert_eq!(map.surface().open_popups(), 0);
        assert!(map.markers().is_empty());
    }

    /// Headless surface that pans the camera while markers are being attached
    struct PanningSurface {
        inner: HeadlessSurface,
        pans: Vec<(LatLng, f64)>,
    }

    impl MapSurface for PanningSurface {
        fn viewport(&self) -> ViewportState {
            self.inner.viewport()
        }

        fn attach_marker(
            &mut self,
            key: &MarkerKey,
            position: LatLng,
            graphic: &GraphicElement,
        ) -> ElementId {
            let element = self.inner.attach_marker(key, position, graphic);
            if self.inner.stats().attached == 1 {
                self.inner.push_event(MapEvent::MarkerClicked(key.clone()));
            }
            if !self.pans.is_empty() {
                let (center, zoom) = self.pans.remove(0);
                self.inner.set_view(center, zoom);
            }
            element
        }

        fn move_marker(&mut self, element: ElementId, position: LatLng) {
            self.inner.move_marker(element, position)
        }

        fn update_marker(&mut self, element: ElementId, graphic: &GraphicElement) {
            self.inner.update_marker(element, graphic)
        }

        fn detach_marker(&mut self, element: ElementId) {
            self.inner.detach_marker(element)
        }

        fn open_popup(&mut self, anchor: LatLng, content: &PopupContent) -> PopupId {
            self.inner.open_popup(anchor, content)
        }

        fn close_popup(&mut self, popup: PopupId) {
            self.inner.close_popup(popup)
        }

        fn ease_camera(&mut self, camera_move: CameraMove) {
            self.inner.ease_camera(camera_move)
        }

        fn drain_events(&mut self) -> Vec<MapEvent> {
            self.inner.drain_events()
        }
    }

    #[test]
    fn test_pans_during_a_pass_run_one_follow_up() {
        let surface = PanningSurface {
            inner: HeadlessSurface::new(Viewport::new(
                LatLng::new(37.98, 23.72),
                16.0,
                Point::new(1024.0, 768.0),
            )),
            pans: vec![
                (LatLng::new(0.0, 0.0), 16.0),
                (LatLng::new(37.98, 23.72), 3.0),
            ],
        };
        let mut map = ListingMap::new(surface, EngineConfig::default()).unwrap();
        map.set_listings(listings()).unwrap();

        assert_eq!(map.scheduler().passes(), 2);
        assert_eq!(map.scheduler().coalesced(), 1);
        assert!(!map.scheduler().is_running());
        assert!(!map.scheduler().has_pending());

        let state = map.surface().inner.camera().state();
        let mut expected: Vec<_> = map
            .index()
            .query(&state)
            .iter()
            .map(|f| f.marker_key())
            .collect();
        expected.sort();
        assert_eq!(map.markers().keys(), expected);
        assert_eq!(map.markers().len(), 1);

        // the click raised mid-pass is handled on the next drain, after its
        // marker was clustered away
        assert_eq!(map.process_surface_events().unwrap(), 1);
        assert!(!map.popup().is_open());
        assert_eq!(map.scheduler().passes(), 2);
    }

    #[test]
    fn test_user_pan_cancels_navigation_without_superseding() {
        let mut map = map();
        let token = map.select_region("attica").unwrap().unwrap();
        map.surface_mut().advance(0.1);
        map.surface_mut().set_view(LatLng::new(38.2, 23.9), 12.0);
        map.process_surface_events().unwrap();

        assert!(map.navigation().in_flight().is_none());
        assert_eq!(map.navigation().cancelled(), 1);

        map.surface_mut().push_event(MapEvent::CameraMoveFinished(token));
        map.process_surface_events().unwrap();
        assert_eq!(map.navigation().completed(), 0);
    }
}
