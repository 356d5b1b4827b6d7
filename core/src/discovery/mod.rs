//! Voice and model discovery
//!
//! Nodes need the list of available voices and models every time they build
//! an input schema. The listings live in a shared [`DiscoveryCache`] with a
//! flat TTL; [`Discovery`] fetches through a [`ListingSource`] only when the
//! entry is stale, absent, or a refresh is forced, and degrades to the last
//! known items when the remote call fails.

mod cache;
mod descriptor;
mod fetch;

pub use cache::{CacheEntry, DiscoveryCache};
pub use descriptor::{voice_id_from_label, Descriptor, ResourceKind};
pub use fetch::{Discovery, Listing, ListingSource, RefreshReport};
