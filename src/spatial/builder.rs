//! Owns the current clustering index and rebuilds it when the listing set
//! changes by content.

use crate::core::config::ClusterConfig;
use crate::data::listing::ListingPoint;
use crate::prelude::HashSet;
use crate::spatial::clustering::ClusterIndex;
use crate::Result;
use std::sync::Arc;

/// Result of handing a listing set to the builder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    /// Same content as the current index; nothing was rebuilt
    Unchanged,
    Rebuilt {
        generation: u64,
        indexed: usize,
        /// Listings dropped for bad coordinates or duplicate ids
        rejected: usize,
    },
}

impl BuildOutcome {
    pub fn is_rebuilt(&self) -> bool {
        matches!(self, BuildOutcome::Rebuilt { .. })
    }
}

pub struct IndexBuilder {
    config: ClusterConfig,
    current: Arc<ClusterIndex>,
    /// Sanitized, id-sorted copy of what `current` was built from
    canonical: Vec<ListingPoint>,
    generation: u64,
}

impl IndexBuilder {
    pub fn new(config: ClusterConfig) -> Result<Self> {
        let current = Arc::new(ClusterIndex::build(Vec::new(), config.clone())?);
        Ok(Self {
            config,
            current,
            canonical: Vec::new(),
            generation: 0,
        })
    }

    /// Replaces the index if `listings` differ from the current content.
    ///
    /// Order of the input does not matter. A query already holding the
    /// previous snapshot keeps using it until it drops its `Arc`.
    pub fn rebuild(&mut self, listings: Vec<ListingPoint>) -> BuildOutcome {
        let (canonical, rejected) = sanitize(listings);

        if same_content(&canonical, &self.canonical) {
            log::debug!(
                "listing set unchanged ({} listings), keeping index generation {}",
                canonical.len(),
                self.generation
            );
            return BuildOutcome::Unchanged;
        }

        let index = ClusterIndex::build_validated(canonical.clone(), self.config.clone());
        let indexed = index.len();
        self.current = Arc::new(index);
        self.canonical = canonical;
        self.generation += 1;

        log::info!(
            "built cluster index generation {} with {} listings ({} rejected)",
            self.generation,
            indexed,
            rejected
        );

        BuildOutcome::Rebuilt {
            generation: self.generation,
            indexed,
            rejected,
        }
    }

    /// The index queries should run against
    pub fn snapshot(&self) -> Arc<ClusterIndex> {
        Arc::clone(&self.current)
    }

    pub fn index(&self) -> &ClusterIndex {
        &self.current
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }
}

fn same_content(a: &[ListingPoint], b: &[ListingPoint]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_content(y))
}

/// Drops listings with unusable coordinates or repeated ids, then sorts by id
fn sanitize(listings: Vec<ListingPoint>) -> (Vec<ListingPoint>, usize) {
    let total = listings.len();
    let mut seen = HashSet::default();
    let mut kept = Vec::with_capacity(total);

    for listing in listings {
        if !listing.has_valid_position() {
            log::warn!(
                "listing '{}' has invalid coordinates ({}, {}), excluded from index",
                listing.id,
                listing.lat,
                listing.lng
            );
            continue;
        }
        if !seen.insert(listing.id.clone()) {
            log::warn!("duplicate listing id '{}', keeping the first", listing.id);
            continue;
        }
        kept.push(listing);
    }

    kept.sort_by(|a, b| a.id.cmp(&b.id));
    let rejected = total - kept.len();
    (kept, rejected)
}
