use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::debug;

use super::{Descriptor, ResourceKind};
use crate::config::{CacheConfig, DEFAULT_CACHE_TTL};

/// Last successful population of one resource kind
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub items: Vec<Descriptor>,
    pub fetched_at: Instant,
}

impl CacheEntry {
    pub fn age(&self) -> Duration {
        Instant::now().saturating_duration_since(self.fetched_at)
    }
}

/// TTL cache of the voice and model listings, shared by every node.
///
/// A kind with no map entry has never been populated (or was invalidated).
/// Single operations are atomic; `is_valid` followed by `get` or a fetch is
/// not, so two callers may both refetch. Last write wins.
#[derive(Debug)]
pub struct DiscoveryCache {
    entries: DashMap<ResourceKind, CacheEntry>,
    ttl: Duration,
}

impl Default for DiscoveryCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

impl DiscoveryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn with_config(config: &CacheConfig) -> Self {
        Self::new(config.ttl)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// True iff the kind has items younger than the TTL.
    pub fn is_valid(&self, kind: ResourceKind) -> bool {
        self.entries
            .get(&kind)
            .map(|e| e.age() < self.ttl)
            .unwrap_or(false)
    }

    /// Last stored items, fresh or stale.
    pub fn get(&self, kind: ResourceKind) -> Option<Vec<Descriptor>> {
        self.entries.get(&kind).map(|e| e.items.clone())
    }

    pub fn entry(&self, kind: ResourceKind) -> Option<CacheEntry> {
        self.entries.get(&kind).map(|e| e.clone())
    }

    /// Replace the items for `kind` and restart its TTL.
    pub fn set(&self, kind: ResourceKind, items: Vec<Descriptor>) {
        debug!(target: "discovery", kind = %kind, count = items.len(), "Cache populated");
        self.entries.insert(
            kind,
            CacheEntry {
                items,
                fetched_at: Instant::now(),
            },
        );
    }

    /// Drop the entry so the next `is_valid` check fails.
    pub fn invalidate(&self, kind: ResourceKind) {
        if self.entries.remove(&kind).is_some() {
            debug!(target: "discovery", kind = %kind, "Cache invalidated");
        }
    }
}
