use crate::core::geo::LatLng;
use crate::data::listing::ListingPoint;
use crate::layers::marker::{CompactPriceFormatter, MarkerHandle, MarkerKey, PriceFormatter};
use crate::rendering::surface::{MapSurface, PopupId};
use std::sync::Arc;

/// Everything the surface needs to draw a listing popup
#[derive(Debug, Clone, PartialEq)]
pub struct PopupContent {
    pub listing_id: String,
    pub title: String,
    pub price_label: String,
    pub locality: String,
    pub thumbnail: Option<String>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub cta_label: String,
}

impl PopupContent {
    pub fn from_listing(listing: &ListingPoint, formatter: &dyn PriceFormatter) -> Self {
        Self {
            listing_id: listing.id.clone(),
            title: listing.title.clone(),
            price_label: formatter.format(listing.price),
            locality: listing.locality.clone(),
            thumbnail: listing.thumbnail.clone(),
            bedrooms: listing.bedrooms,
            bathrooms: listing.bathrooms,
            cta_label: "View listing".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PopupState {
    Closed,
    Open { key: MarkerKey, popup: PopupId },
}

/// Receives the "open full listing" handoff from a popup
pub trait ListingDetailHandler {
    fn open_listing(&mut self, listing_id: &str);
}

impl<F: FnMut(&str)> ListingDetailHandler for F {
    fn open_listing(&mut self, listing_id: &str) {
        self(listing_id)
    }
}

/// Keeps at most one listing popup open on the surface
pub struct PopupController {
    state: PopupState,
    anchor: Option<LatLng>,
    formatter: Arc<dyn PriceFormatter>,
}

impl PopupController {
    pub fn new() -> Self {
        Self {
            state: PopupState::Closed,
            anchor: None,
            formatter: Arc::new(CompactPriceFormatter::default()),
        }
    }

    pub fn with_formatter(mut self, formatter: Arc<dyn PriceFormatter>) -> Self {
        self.formatter = formatter;
        self
    }

    /// Opens the popup for a listing marker, closing whatever was open.
    ///
    /// Returns `false` without touching the surface for cluster markers and
    /// for the marker whose popup is already showing.
    pub fn open_for<S: MapSurface + ?Sized>(
        &mut self,
        handle: &MarkerHandle,
        listing: &ListingPoint,
        surface: &mut S,
    ) -> bool {
        if handle.is_cluster() {
            log::debug!("{} is a cluster, no popup", handle.key);
            return false;
        }
        if self.open_key() == Some(&handle.key) {
            return false;
        }

        self.close(surface);

        let content = PopupContent::from_listing(listing, self.formatter.as_ref());
        let popup = surface.open_popup(handle.position, &content);
        self.state = PopupState::Open {
            key: handle.key.clone(),
            popup,
        };
        self.anchor = Some(handle.position);
        true
    }

    /// Closes the popup if one is open; returns whether anything closed
    pub fn close<S: MapSurface + ?Sized>(&mut self, surface: &mut S) -> bool {
        match std::mem::replace(&mut self.state, PopupState::Closed) {
            PopupState::Open { popup, .. } => {
                surface.close_popup(popup);
                self.anchor = None;
                true
            }
            PopupState::Closed => false,
        }
    }

    /// Closes the popup if its marker was just removed
    pub fn on_marker_removed<S: MapSurface + ?Sized>(
        &mut self,
        key: &MarkerKey,
        surface: &mut S,
    ) -> bool {
        if self.open_key() == Some(key) {
            log::debug!("marker {} removed, closing its popup", key);
            return self.close(surface);
        }
        false
    }

    /// Hands the open listing to `handler`; returns the listing id, if any
    pub fn activate_cta(&self, handler: &mut dyn ListingDetailHandler) -> Option<String> {
        match self.open_key() {
            Some(MarkerKey::Point(listing_id)) => {
                handler.open_listing(listing_id);
                Some(listing_id.clone())
            }
            _ => None,
        }
    }

    pub fn state(&self) -> &PopupState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, PopupState::Open { .. })
    }

    pub fn open_key(&self) -> Option<&MarkerKey> {
        match &self.state {
            PopupState::Open { key, .. } => Some(key),
            PopupState::Closed => None,
        }
    }

    /// Where the open popup is anchored
    pub fn anchor(&self) -> Option<LatLng> {
        self.anchor
    }
}

impl Default for PopupController {
    fn default() -> Self {
        Self::new()
    }
}
