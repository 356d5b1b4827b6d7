use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{Descriptor, DiscoveryCache, ResourceKind};
use crate::Result;

/// Remote listing endpoint for one resource kind
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Fetch the current list. `api_key` overrides the source's default key.
    async fn list(&self, kind: ResourceKind, api_key: Option<&str>) -> Result<Vec<Descriptor>>;
}

/// Result of a discovery fetch.
///
/// `Unavailable` is returned only when the remote call failed and nothing was
/// ever cached; it is never a resource and never an empty list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum Listing {
    Available { items: Vec<Descriptor> },
    Unavailable { reason: String },
}

impl Listing {
    pub fn items(&self) -> Option<&[Descriptor]> {
        match self {
            Listing::Available { items } => Some(items),
            Listing::Unavailable { .. } => None,
        }
    }

    pub fn into_items(self) -> Option<Vec<Descriptor>> {
        match self {
            Listing::Available { items } => Some(items),
            Listing::Unavailable { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Listing::Available { .. })
    }

    /// Selection labels for a node's input schema
    pub fn labels(&self) -> Vec<String> {
        self.items()
            .map(|items| items.iter().map(Descriptor::label).collect())
            .unwrap_or_default()
    }
}

/// Cache-first fetch orchestration over a [`ListingSource`]
#[derive(Clone)]
pub struct Discovery {
    cache: Arc<DiscoveryCache>,
    source: Arc<dyn ListingSource>,
}

impl Discovery {
    pub fn new(cache: Arc<DiscoveryCache>, source: Arc<dyn ListingSource>) -> Self {
        Self { cache, source }
    }

    pub fn cache(&self) -> &Arc<DiscoveryCache> {
        &self.cache
    }

    /// Return the listing for `kind`, serving from cache while fresh.
    ///
    /// A failed remote call never touches the cache: the last known items are
    /// served if any exist, otherwise [`Listing::Unavailable`].
    pub async fn fetch(
        &self,
        kind: ResourceKind,
        api_key: Option<&str>,
        force_refresh: bool,
    ) -> Listing {
        if !force_refresh && self.cache.is_valid(kind) {
            if let Some(items) = self.cache.get(kind) {
                debug!(target: "discovery", kind = %kind, count = items.len(), "Serving cached listing");
                return Listing::Available { items };
            }
        }

        match self.source.list(kind, api_key).await {
            Ok(items) => {
                info!(target: "discovery", kind = %kind, count = items.len(), "Fetched listing");
                self.cache.set(kind, items.clone());
                Listing::Available { items }
            }
            Err(e) => {
                warn!(target: "discovery", kind = %kind, error = %e, "Listing fetch failed");
                match self.cache.get(kind) {
                    Some(items) => {
                        debug!(target: "discovery", kind = %kind, count = items.len(), "Falling back to stale listing");
                        Listing::Available { items }
                    }
                    None => Listing::Unavailable {
                        reason: format!("cannot fetch {}: {}", kind, e),
                    },
                }
            }
        }
    }

    pub async fn voices(&self, api_key: Option<&str>, force_refresh: bool) -> Listing {
        self.fetch(ResourceKind::Voices, api_key, force_refresh).await
    }

    pub async fn models(&self, api_key: Option<&str>, force_refresh: bool) -> Listing {
        self.fetch(ResourceKind::Models, api_key, force_refresh).await
    }

    /// Invalidate and refetch each requested kind.
    pub async fn refresh(&self, kinds: &[ResourceKind], api_key: Option<&str>) -> RefreshReport {
        let mut entries = Vec::with_capacity(kinds.len());
        for &kind in kinds {
            self.cache.invalidate(kind);
            let listing = self.fetch(kind, api_key, false).await;
            entries.push((kind, listing));
        }
        RefreshReport { entries }
    }
}

/// Per-kind outcome of [`Discovery::refresh`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshReport {
    pub entries: Vec<(ResourceKind, Listing)>,
}

impl RefreshReport {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, kind: ResourceKind) -> Option<&Listing> {
        self.entries
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, listing)| listing)
    }
}

impl fmt::Display for RefreshReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return f.write_str("No refresh performed");
        }
        let lines: Vec<String> = self
            .entries
            .iter()
            .map(|(kind, listing)| match listing {
                Listing::Available { items } => format!("Refreshed {} {}", items.len(), kind),
                Listing::Unavailable { reason } => format!("Could not refresh {}: {}", kind, reason),
            })
            .collect();
        f.write_str(&lines.join("\n"))
    }
}
