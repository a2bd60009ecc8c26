//! Outcome types for cache reads.
//!
//! A lookup has three outcomes, not two: the key was there, the key was not
//! there, or the cache could not be asked. Callers fall back to the durable
//! store on both of the latter, but only the first of those is normal.

use openmusic_core::CacheError;

/// Result of asking the cache for one key.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup<T> {
    /// The key was present and decoded.
    Hit(T),
    /// The key was absent or expired.
    Miss,
    /// The backend failed, or the stored payload no longer decodes.
    Unavailable(CacheError),
}

impl<T> CacheLookup<T> {
    /// The cached value, if any.
    pub fn hit(self) -> Option<T> {
        match self {
            Self::Hit(value) => Some(value),
            Self::Miss | Self::Unavailable(_) => None,
        }
    }
}

/// A value returned by [`CacheAside::read_through`](super::CacheAside::read_through),
/// tagged with where it came from.
#[derive(Debug, Clone)]
pub struct CacheRead<T> {
    /// The value.
    value: T,
    /// Whether this was a cache hit or miss.
    was_cache_hit: bool,
}

impl<T> CacheRead<T> {
    /// Create a new read from a cache hit.
    pub fn from_cache(value: T) -> Self {
        Self {
            value,
            was_cache_hit: true,
        }
    }

    /// Create a new read from a durable store load (cache miss).
    pub fn from_storage(value: T) -> Self {
        Self {
            value,
            was_cache_hit: false,
        }
    }

    /// Consume the wrapper and return the underlying value.
    pub fn into_value(self) -> T {
        self.value
    }

    /// Get a reference to the underlying value.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Returns true if this read was served from the cache.
    pub fn was_cache_hit(&self) -> bool {
        self.was_cache_hit
    }

    /// Map the value while keeping the provenance.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> CacheRead<U> {
        CacheRead {
            value: f(self.value),
            was_cache_hit: self.was_cache_hit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_hit_extracts_value() {
        assert_eq!(CacheLookup::Hit(5).hit(), Some(5));
        assert_eq!(CacheLookup::<i32>::Miss.hit(), None);
        let down = CacheLookup::<i32>::Unavailable(CacheError::Unavailable {
            reason: "refused".to_string(),
        });
        assert_eq!(down.hit(), None);
    }

    #[test]
    fn test_cache_read_provenance_survives_map() {
        let read = CacheRead::from_cache(21).map(|v| v * 2);
        assert!(read.was_cache_hit());
        assert_eq!(*read.value(), 42);

        let loaded = CacheRead::from_storage("x");
        assert!(!loaded.was_cache_hit());
        assert_eq!(loaded.into_value(), "x");
    }
}
