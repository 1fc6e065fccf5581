//! Loaders — produce a value for a key on a cache miss.
//!
//! A loader runs **outside** the cache's structural lock, so it may be slow or
//! read other keys of the same cache.  Concurrent misses on one key share a
//! single loader call (see [`LoadGroup`](crate::flight::LoadGroup)).
//!
//! # Example
//! ```
//! use cairn::CacheBuilder;
//!
//! let cache: cairn::Cache<u32, String> = CacheBuilder::new(100)
//!     .loader(|key: &u32| Ok::<_, std::io::Error>(format!("value-{key}")))
//!     .build();
//!
//! assert_eq!(*cache.get(&7).unwrap(), "value-7");
//! ```

use std::time::Duration;

use crate::error::BoxError;

/// The result of a successful load.
pub struct Loaded<V> {
    pub value: V,
    /// Time-to-live for this entry.  `None` falls back to the cache's default.
    pub expires_in: Option<Duration>,
}

impl<V> Loaded<V> {
    pub fn new(value: V) -> Self {
        Loaded {
            value,
            expires_in: None,
        }
    }

    pub fn expiring(value: V, ttl: Duration) -> Self {
        Loaded {
            value,
            expires_in: Some(ttl),
        }
    }
}

/// Produces values for missing keys.
pub trait Loader<K, V>: Send + Sync + 'static {
    fn load(&self, key: &K) -> Result<Loaded<V>, BoxError>;
}

/// A [`Loader`] backed by a closure.
///
/// The builder's [`loader`](crate::CacheBuilder::loader) and
/// [`expiring_loader`](crate::CacheBuilder::expiring_loader) adapt user
/// closures into this shape.
pub struct FnLoader<F>(pub F);

impl<K, V, F> Loader<K, V> for FnLoader<F>
where
    F: Fn(&K) -> Result<Loaded<V>, BoxError> + Send + Sync + 'static,
{
    fn load(&self, key: &K) -> Result<Loaded<V>, BoxError> {
        (self.0)(key)
    }
}
