//! Cache-aside layer over a pluggable key/value store.
//!
//! # Design Philosophy
//!
//! The durable store is the source of truth; the cache holds serialized,
//! time-bounded copies keyed by the names in [`openmusic_core::CacheKey`].
//! Reads go through [`CacheAside::read_through`], which never lets a cache
//! failure abort a request. Writes commit to the durable store first and
//! then call the [`Invalidator`], which likewise never fails the write.
//!
//! A cache that is down behaves like an empty cache for callers, but the
//! two are not conflated internally: [`CacheLookup`] separates a miss from
//! an unavailable backend, and every unavailable lookup is reported to the
//! configured [`CacheObserver`] so an outage shows up in metrics.
//!
//! # Example
//!
//! ```ignore
//! let cache = CacheAside::new(Arc::new(InMemoryCache::new()));
//!
//! let read = cache
//!     .read_through(&CacheKey::album(&id), CacheTtl::ALBUM, || load_album(&store, &id))
//!     .await?;
//! if read.was_cache_hit() {
//!     // served without touching the durable store
//! }
//!
//! // after a committed write
//! cache.invalidator().invalidate(&CacheKey::album(&id)).await;
//! ```

pub mod invalidation;
pub mod lookup;
pub mod memory;
pub mod read_through;
pub mod traits;

pub use invalidation::Invalidator;
pub use lookup::{CacheLookup, CacheRead};
pub use memory::InMemoryCache;
pub use read_through::CacheAside;
pub use traits::{
    CacheBackend, CacheEvent, CacheObserver, CacheOperation, CacheStats, NoopObserver,
};
