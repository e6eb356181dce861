#[cfg(test)]
mod reconciliation_tests {
    use listing_map::{
        EngineConfig, HeadlessSurface, LatLng, ListingMap, ListingPoint, MapEvent, MarkerKey,
        Point, Viewport, ViewportState,
    };

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn dense_listings(count: usize) -> Vec<ListingPoint> {
        (0..count)
            .map(|i| {
                let row = (i / 15) as f64;
                let col = (i % 15) as f64;
                ListingPoint::new(
                    format!("L{:03}", i),
                    37.975 + row * 0.0006,
                    23.725 + col * 0.0006,
                )
                .with_price(100_000.0 + i as f64 * 1_000.0)
            })
            .collect()
    }

    fn map_at(zoom: f64) -> ListingMap<HeadlessSurface> {
        init_logging();
        let surface = HeadlessSurface::new(Viewport::new(
            LatLng::new(37.9777, 23.7292),
            zoom,
            Point::new(1024.0, 768.0),
        ));
        ListingMap::new(surface, EngineConfig::default()).unwrap()
    }

    fn expected_keys(map: &ListingMap<HeadlessSurface>, state: &ViewportState) -> Vec<MarkerKey> {
        let mut keys: Vec<_> = map
            .index()
            .query(state)
            .iter()
            .map(|f| f.marker_key())
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }

    #[test]
    fn test_rendered_keys_match_query_result() {
        let mut map = map_at(16.0);
        map.set_listings(dense_listings(150)).unwrap();

        let views = [
            (LatLng::new(37.9777, 23.7292), 16.0),
            (LatLng::new(37.9777, 23.7292), 13.3),
            (LatLng::new(37.9760, 23.7260), 17.5),
            (LatLng::new(38.5, 23.0), 6.0),
            (LatLng::new(37.9777, 23.7292), 1.0),
            (LatLng::new(-33.86, 151.2), 12.0),
        ];
        for (center, zoom) in views {
            map.surface_mut().set_view(center, zoom);
            map.process_surface_events().unwrap();

            let state = map.surface().camera().state();
            assert_eq!(map.markers().keys(), expected_keys(&map, &state), "z{}", zoom);
            assert_eq!(map.surface().marker_count(), map.markers().len());
        }
    }

    #[test]
    fn test_same_viewport_twice_causes_no_churn() {
        let mut map = map_at(14.0);
        map.set_listings(dense_listings(150)).unwrap();
        let state = map.surface().camera().state();

        map.handle_event(MapEvent::ViewportChanged(state.clone()))
            .unwrap();
        let attached = map.surface().stats().attached;

        map.handle_event(MapEvent::ViewportChanged(state)).unwrap();
        assert!(map.last_report().is_noop());
        assert_eq!(map.surface().stats().attached, attached);
        assert_eq!(map.surface().stats().detached, 0);
    }

    #[test]
    fn test_shrinking_listing_set_removes_only_dropped_markers() {
        let mut map = map_at(16.0);
        map.set_listings(dense_listings(150)).unwrap();
        assert_eq!(map.surface().marker_count(), 150);
        let before: Vec<_> = map
            .markers()
            .handles()
            .map(|h| (h.key.clone(), h.element))
            .collect();

        assert!(map.set_listings(dense_listings(100)).unwrap().is_rebuilt());

        let report = map.last_report().clone();
        assert_eq!(report.removed, 50);
        assert_eq!(report.removed_keys.len(), 50);
        assert_eq!(report.created, 0);
        assert_eq!(map.surface().marker_count(), 100);
        assert_eq!(map.surface().stats().attached, 150);

        for (key, element) in before {
            if let Some(handle) = map.markers().get(&key) {
                assert_eq!(handle.element, element, "{} was recreated", key);
            }
        }
    }

    #[test]
    fn test_pan_burst_coalesces_into_one_pass() {
        let mut map = map_at(15.0);
        map.set_listings(dense_listings(150)).unwrap();
        let passes = map.scheduler().passes();

        for step in 0..10 {
            let lng = 23.70 + step as f64 * 0.005;
            map.surface_mut().set_view(LatLng::new(37.9777, lng), 15.0);
        }
        assert_eq!(map.process_surface_events().unwrap(), 10);
        assert_eq!(map.scheduler().passes(), passes + 1);

        let state = map.surface().camera().state();
        assert_eq!(map.markers().keys(), expected_keys(&map, &state));
    }

    #[test]
    fn test_queued_pans_settle_in_one_follow_up_pass() {
        let mut map = map_at(15.0);
        map.set_listings(dense_listings(150)).unwrap();
        let passes = map.scheduler().passes();
        let coalesced = map.scheduler().coalesced();

        for step in 0..4 {
            let zoom = 12.0 + step as f64;
            map.surface_mut().set_view(LatLng::new(37.9777, 23.7292), zoom);
        }
        map.reconcile_now();

        assert_eq!(map.scheduler().passes(), passes + 2);
        assert_eq!(map.scheduler().coalesced(), coalesced + 3);
        assert!(!map.scheduler().has_pending());
        assert_eq!(map.process_surface_events().unwrap(), 0);

        let state = map.surface().camera().state();
        assert_eq!(state.zoom, 15.0);
        assert_eq!(map.markers().keys(), expected_keys(&map, &state));
    }

    #[test]
    fn test_clicking_second_listing_swaps_the_popup() {
        let mut map = map_at(16.0);
        map.set_listings(dense_listings(150)).unwrap();

        let first = MarkerKey::Point("L010".into());
        let second = MarkerKey::Point("L020".into());

        assert!(map.surface_mut().click_marker(&first));
        map.process_surface_events().unwrap();
        assert!(map.surface_mut().click_marker(&second));
        map.process_surface_events().unwrap();
        assert!(map.surface_mut().click_marker(&second));
        map.process_surface_events().unwrap();

        assert_eq!(map.surface().open_popups(), 1);
        assert_eq!(map.surface().stats().peak_popups, 1);
        assert_eq!(map.surface().stats().popups_opened, 2);
        assert_eq!(map.popup().open_key(), Some(&second));
        let (_, content) = map.surface().popup().unwrap();
        assert_eq!(content.listing_id, "L020");
        assert_eq!(content.price_label, "120K");
    }

    #[test]
    fn test_popup_closes_when_its_marker_disappears() {
        let mut map = map_at(16.0);
        map.set_listings(dense_listings(150)).unwrap();

        let key = MarkerKey::Point("L005".into());
        map.surface_mut().click_marker(&key);
        map.process_surface_events().unwrap();
        assert!(map.popup().is_open());

        map.surface_mut().set_view(LatLng::new(37.9777, 23.7292), 8.0);
        map.process_surface_events().unwrap();

        assert!(!map.markers().contains(&key));
        assert!(!map.popup().is_open());
        assert_eq!(map.surface().open_popups(), 0);
    }

    #[test]
    fn test_cluster_click_never_opens_a_popup() {
        let mut map = map_at(10.0);
        map.set_listings(dense_listings(150)).unwrap();

        let cluster = map
            .markers()
            .keys()
            .into_iter()
            .find(|key| matches!(key, MarkerKey::Cluster(_)))
            .unwrap();
        map.surface_mut().click_marker(&cluster);
        map.process_surface_events().unwrap();

        assert!(!map.popup().is_open());
        assert_eq!(map.surface().stats().popups_opened, 0);
        assert!(map.navigation().in_flight().is_some());
    }
}
