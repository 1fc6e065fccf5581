//! Entry scorer — assigns an eviction priority to each cached value.
//!
//! Lower scores are evicted first.  Like weights, scores are recomputed every
//! time a key's value is written and never change on reads.

/// Computes the eviction priority of a cached value.
pub trait Scorer<V>: Send + Sync + 'static {
    fn score(&self, value: &V) -> i64;
}

/// Every value has the same score; eviction order among entries is then
/// unspecified.
pub struct ConstantScorer(pub i64);

impl<V> Scorer<V> for ConstantScorer {
    #[inline]
    fn score(&self, _value: &V) -> i64 {
        self.0
    }
}

/// A scorer backed by a closure.
///
/// Created via [`CacheBuilder::scored`](crate::CacheBuilder::scored).
pub struct FnScorer<F>(pub F);

impl<V, F> Scorer<V> for FnScorer<F>
where
    F: Fn(&V) -> i64 + Send + Sync + 'static,
{
    #[inline]
    fn score(&self, value: &V) -> i64 {
        (self.0)(value)
    }
}
