//! Entry weigher — assigns a cost (weight) to each cached value.
//!
//! The score-weighted policy enforces `Σ weight(entry) ≤ capacity`, so a
//! weigher lets the cache bound bytes instead of entries.  The weight is
//! recomputed every time a key's value is written.
//!
//! # Example
//! ```
//! use cairn::CacheBuilder;
//!
//! // Keep at most ~1 MB of payload, dropping the lowest-priority blobs first.
//! let cache: cairn::Cache<String, Vec<u8>> = CacheBuilder::new(1024 * 1024)
//!     .scored(|v: &Vec<u8>| v.first().copied().unwrap_or(0) as i64, |v: &Vec<u8>| v.len() as u64)
//!     .build();
//! # let _ = cache;
//! ```

/// Computes the capacity cost of a cached value.
pub trait Weigher<V>: Send + Sync + 'static {
    fn weigh(&self, value: &V) -> u64;
}

/// Every value costs exactly 1 unit.
pub struct UnitWeigher;

impl<V> Weigher<V> for UnitWeigher {
    #[inline]
    fn weigh(&self, _value: &V) -> u64 {
        1
    }
}

/// A weigher backed by a closure.
///
/// Created via [`CacheBuilder::scored`](crate::CacheBuilder::scored).
pub struct FnWeigher<F>(pub F);

impl<V, F> Weigher<V> for FnWeigher<F>
where
    F: Fn(&V) -> u64 + Send + Sync + 'static,
{
    #[inline]
    fn weigh(&self, value: &V) -> u64 {
        (self.0)(value)
    }
}
