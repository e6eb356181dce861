pub mod geojson;
pub mod listing;

pub use geojson::{parse_feature_collection, GeoJson, GeoJsonFeature, GeoJsonGeometry};
pub use listing::{parse_listings_json, ListingBatch, ListingPoint, PropertyKind, TransactionKind};
