use crate::core::geo::LatLng;
use crate::Result;
use serde::{Deserialize, Serialize};

/// Transaction category of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Sale,
    Rent,
    #[default]
    #[serde(other)]
    Other,
}

/// Property category of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    Apartment,
    House,
    Land,
    Commercial,
    Parking,
    #[default]
    #[serde(other)]
    Other,
}

/// A single geo-located listing as it enters the clustering index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingPoint {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub property_kind: PropertyKind,
    #[serde(default)]
    pub transaction_kind: TransactionKind,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub locality: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub bedrooms: Option<u32>,
    #[serde(default)]
    pub bathrooms: Option<u32>,
}

impl ListingPoint {
    pub fn new(id: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            id: id.into(),
            lat,
            lng,
            price: 0.0,
            property_kind: PropertyKind::Other,
            transaction_kind: TransactionKind::Other,
            title: String::new(),
            locality: String::new(),
            thumbnail: None,
            bedrooms: None,
            bathrooms: None,
        }
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = price;
        self
    }

    pub fn with_kinds(mut self, transaction: TransactionKind, property: PropertyKind) -> Self {
        self.transaction_kind = transaction;
        self.property_kind = property;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_locality(mut self, locality: impl Into<String>) -> Self {
        self.locality = locality.into();
        self
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }

    /// Finite coordinates inside the valid latitude/longitude ranges
    pub fn has_valid_position(&self) -> bool {
        self.position().is_valid()
    }

    /// Field-wise equality that compares floats by bit pattern, so a NaN
    /// price matches itself
    pub fn same_content(&self, other: &ListingPoint) -> bool {
        self.lat.to_bits() == other.lat.to_bits()
            && self.lng.to_bits() == other.lng.to_bits()
            && self.price.to_bits() == other.price.to_bits()
            && self.id == other.id
            && self.property_kind == other.property_kind
            && self.transaction_kind == other.transaction_kind
            && self.title == other.title
            && self.locality == other.locality
            && self.thumbnail == other.thumbnail
            && self.bedrooms == other.bedrooms
            && self.bathrooms == other.bathrooms
    }
}

/// Wire form of a listing; coordinates may be missing or null
#[derive(Debug, Clone, Deserialize)]
pub struct RawListing {
    pub id: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub property_kind: PropertyKind,
    #[serde(default)]
    pub transaction_kind: TransactionKind,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub locality: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub bedrooms: Option<u32>,
    #[serde(default)]
    pub bathrooms: Option<u32>,
}

impl RawListing {
    /// `None` when either coordinate is absent
    pub fn into_listing(self) -> Option<ListingPoint> {
        let (lat, lng) = (self.lat?, self.lng?);
        Some(ListingPoint {
            id: self.id,
            lat,
            lng,
            price: self.price,
            property_kind: self.property_kind,
            transaction_kind: self.transaction_kind,
            title: self.title,
            locality: self.locality,
            thumbnail: self.thumbnail,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
        })
    }
}

/// Listings decoded from an external payload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingBatch {
    pub listings: Vec<ListingPoint>,
    /// Records dropped because they carried no usable coordinates
    pub rejected: usize,
}

impl ListingBatch {
    pub fn push_raw(&mut self, raw: RawListing) {
        let id = raw.id.clone();
        match raw.into_listing() {
            Some(listing) => self.listings.push(listing),
            None => {
                log::warn!("listing '{}' has no coordinates, skipping", id);
                self.rejected += 1;
            }
        }
    }
}

/// Parses a JSON array of listings
pub fn parse_listings_json(json: &str) -> Result<ListingBatch> {
    let raw: Vec<RawListing> = serde_json::from_str(json)?;
    let mut batch = ListingBatch::default();
    for record in raw {
        batch.push_raw(record);
    }
    Ok(batch)
}
