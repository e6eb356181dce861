use crate::core::{config::MarkerConfig, viewport::ViewportState};
use crate::layers::marker::{
    CompactPriceFormatter, GraphicElement, MarkerHandle, MarkerKey, PriceFormatter,
};
use crate::prelude::{HashMap, HashSet};
use crate::rendering::surface::MapSurface;
use crate::spatial::clustering::{ClusterFeature, ClusterIndex};
use crate::ui::style::StyleResolver;
use std::sync::Arc;

/// What one reconciliation pass changed on the surface
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub created: usize,
    pub moved: usize,
    pub updated: usize,
    pub removed: usize,
    /// Keys detached in this pass, sorted
    pub removed_keys: Vec<MarkerKey>,
}

impl ReconcileReport {
    /// True when the pass touched nothing on the surface
    pub fn is_noop(&self) -> bool {
        self.created == 0 && self.moved == 0 && self.updated == 0 && self.removed == 0
    }
}

/// Keeps the markers on a surface in step with viewport query results.
///
/// Every rendered marker has exactly one handle here, keyed by its
/// [`MarkerKey`]. Markers that survive a pass keep their surface element.
pub struct MarkerManager {
    handles: HashMap<MarkerKey, MarkerHandle>,
    config: MarkerConfig,
    styles: StyleResolver,
    formatter: Arc<dyn PriceFormatter>,
}

impl MarkerManager {
    pub fn new(config: MarkerConfig) -> Self {
        Self {
            handles: HashMap::default(),
            config,
            styles: StyleResolver::new(),
            formatter: Arc::new(CompactPriceFormatter::default()),
        }
    }

    pub fn with_formatter(mut self, formatter: Arc<dyn PriceFormatter>) -> Self {
        self.formatter = formatter;
        self
    }

    /// Queries `index` for `state` and applies the result to `surface`
    pub fn reconcile<S: MapSurface + ?Sized>(
        &mut self,
        index: &ClusterIndex,
        state: &ViewportState,
        surface: &mut S,
    ) -> ReconcileReport {
        let features = index.query(state);
        let report = self.apply(features, surface);

        #[cfg(feature = "debug")]
        log::debug!(
            "reconciled z{:.2}: {} rendered, +{} ~{} moved {} updated -{}",
            state.zoom,
            self.handles.len(),
            report.created,
            report.moved,
            report.updated,
            report.removed
        );

        report
    }

    /// Makes the rendered set match `features` exactly
    pub fn apply<S: MapSurface + ?Sized>(
        &mut self,
        features: Vec<ClusterFeature>,
        surface: &mut S,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        let mut wanted = HashSet::default();
        let mut ordered = Vec::with_capacity(features.len());
        for feature in features {
            let key = feature.marker_key();
            if wanted.insert(key.clone()) {
                ordered.push((key, feature));
            } else {
                log::debug!("query returned {} twice, ignoring the repeat", key);
            }
        }

        let mut stale: Vec<MarkerKey> = self
            .handles
            .keys()
            .filter(|key| !wanted.contains(*key))
            .cloned()
            .collect();
        stale.sort();
        for key in &stale {
            if let Some(handle) = self.handles.remove(key) {
                surface.detach_marker(handle.element);
                report.removed += 1;
            }
        }
        report.removed_keys = stale;

        for (key, feature) in ordered {
            let position = feature.position();
            let graphic = GraphicElement::for_feature(
                &feature,
                &self.config,
                &mut self.styles,
                self.formatter.as_ref(),
            );

            match self.handles.get_mut(&key) {
                Some(handle) => {
                    if handle.position != position {
                        surface.move_marker(handle.element, position);
                        handle.position = position;
                        report.moved += 1;
                    }
                    if handle.graphic != graphic {
                        surface.update_marker(handle.element, &graphic);
                        handle.graphic = graphic;
                        report.updated += 1;
                    }
                }
                None => {
                    let element = surface.attach_marker(&key, position, &graphic);
                    let handle = MarkerHandle {
                        kind: key.kind(),
                        key: key.clone(),
                        position,
                        element,
                        graphic,
                    };
                    self.handles.insert(key, handle);
                    report.created += 1;
                }
            }
        }

        report
    }

    /// Detaches every marker; returns how many were removed
    pub fn clear<S: MapSurface + ?Sized>(&mut self, surface: &mut S) -> usize {
        let count = self.handles.len();
        for (_, handle) in self.handles.drain() {
            surface.detach_marker(handle.element);
        }
        count
    }

    pub fn get(&self, key: &MarkerKey) -> Option<&MarkerHandle> {
        self.handles.get(key)
    }

    pub fn contains(&self, key: &MarkerKey) -> bool {
        self.handles.contains_key(key)
    }

    pub fn handles(&self) -> impl Iterator<Item = &MarkerHandle> {
        self.handles.values()
    }

    /// Rendered keys in sorted order
    pub fn keys(&self) -> Vec<MarkerKey> {
        let mut keys: Vec<_> = self.handles.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn config(&self) -> &MarkerConfig {
        &self.config
    }

    pub fn formatter(&self) -> Arc<dyn PriceFormatter> {
        Arc::clone(&self.formatter)
    }
}

impl Default for MarkerManager {
    fn default() -> Self {
        Self::new(MarkerConfig::default())
    }
}
