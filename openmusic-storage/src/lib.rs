//! OpenMusic Storage - Catalog Store Trait, In-Memory Store and Cache Layer
//!
//! The durable store is abstracted behind [`CatalogStore`]; the Postgres
//! implementation lives in `openmusic-api`. The cache layer wraps any
//! [`CacheBackend`] with cache-aside reads and explicit invalidation.

pub mod cache;
pub mod catalog;
pub mod in_memory;

pub use cache::{
    CacheAside, CacheBackend, CacheEvent, CacheLookup, CacheObserver, CacheOperation, CacheRead,
    CacheStats, InMemoryCache, Invalidator, NoopObserver,
};
pub use catalog::CatalogStore;
pub use in_memory::InMemoryCatalog;
