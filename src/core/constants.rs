//! Core constants for clustering, markers and camera navigation.
//! Keeping them in a single place makes it easier to tweak engine-wide magic numbers.

/// Default square tile size in pixels.
pub const TILE_SIZE: u32 = 256;

/// Highest zoom level any index or camera will accept.
pub const MAX_SUPPORTED_ZOOM: u8 = 24;

/// Cluster radius in pixels, relative to `DEFAULT_CLUSTER_EXTENT`.
pub const DEFAULT_CLUSTER_RADIUS: f64 = 60.0;

/// Tile extent the cluster radius is measured against.
pub const DEFAULT_CLUSTER_EXTENT: f64 = 512.0;

/// Lowest zoom tier that gets clustered.
pub const DEFAULT_MIN_ZOOM: u8 = 0;

/// Tier at which clustering stops and raw listings are returned.
pub const DEFAULT_MAX_ZOOM: u8 = 16;

/// Minimum merged point count to form a cluster.
pub const DEFAULT_MIN_POINTS: usize = 2;

/// Cluster badges below this count are drawn small.
pub const DEFAULT_MEDIUM_THRESHOLD: usize = 10;

/// Cluster badges at or above this count are drawn large.
pub const DEFAULT_LARGE_THRESHOLD: usize = 100;

/// Camera ease duration for region selections.
pub const DEFAULT_REGION_DURATION_MS: u64 = 1200;

/// Camera ease duration for locality selections.
pub const DEFAULT_LOCALITY_DURATION_MS: u64 = 800;

/// Camera ease duration when expanding a cluster.
pub const DEFAULT_CLUSTER_DURATION_MS: u64 = 500;

/// Zoom used when focusing a single locality.
pub const DEFAULT_LOCALITY_ZOOM: f64 = 14.0;

/// Upper bound on follow-up reconciliation passes in one event batch.
pub const MAX_SETTLE_PASSES: usize = 8;
