//! Score-weighted eviction.
//!
//! Every value carries a *score* (eviction priority, lower leaves first) and a
//! *weight* (capacity cost), both computed by caller-supplied functions each
//! time the value is written.  Capacity bounds the sum of weights rather than
//! the number of entries, which models byte budgets and similar resources.
//!
//! ```text
//!   IndexedHeap<K, score, Scored<V>>          total_weight ≤ capacity
//!
//!              (1, "tmp")   ← evicted first
//!             /          \
//!      (4, "img")      (9, "index")
//! ```
//!
//! Admitting a new key pops minimum-score entries until the newcomer fits or
//! nothing is left; a single value heavier than the whole capacity is still
//! admitted once the heap has been drained.  Replacing the value of a live key
//! re-scores and re-weighs it in place and does not evict, so an update may
//! leave the policy over capacity until the next admission.

use std::hash::Hash;

use crate::ds::IndexedHeap;
use crate::entry::Entry;
use crate::scorer::Scorer;
use crate::weigher::Weigher;

use super::{Admission, Evicted, Policy};

struct Scored<V> {
    entry: Entry<V>,
    weight: u64,
}

pub struct ScoredPolicy<K, V> {
    heap: IndexedHeap<K, i64, Scored<V>>,
    scorer: Box<dyn Scorer<V>>,
    weigher: Box<dyn Weigher<V>>,
    /// Sum of live weights, saturating at `u64::MAX`.
    total_weight: u64,
    capacity: u64,
}

impl<K, V> ScoredPolicy<K, V>
where
    K: Hash + Eq + Clone,
{
    pub fn new(capacity: u64, scorer: Box<dyn Scorer<V>>, weigher: Box<dyn Weigher<V>>) -> Self {
        ScoredPolicy {
            heap: IndexedHeap::new(),
            scorer,
            weigher,
            total_weight: 0,
            capacity,
        }
    }

    /// Pops minimum-score entries until `incoming` more weight fits.
    fn evict_until_fits(&mut self, incoming: u64, evicted: &mut Evicted<K, V>) {
        while self.total_weight.saturating_add(incoming) > self.capacity {
            let Some((key, score, victim)) = self.heap.pop_min() else {
                break;
            };
            self.total_weight = self.total_weight.saturating_sub(victim.weight);
            tracing::trace!(score, weight = victim.weight, "evicting lowest-scored entry");
            evicted.push((key, victim.entry));
        }
    }

    /// Score of `key`'s current value.
    #[cfg(test)]
    fn score_of(&self, key: &K) -> Option<i64> {
        self.heap.priority(key)
    }
}

impl<K, V> Policy<K, V> for ScoredPolicy<K, V>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Send + Sync + 'static,
{
    fn peek(&self, key: &K) -> Option<&Entry<V>> {
        self.heap.get(key).map(|scored| &scored.entry)
    }

    fn insert(&mut self, key: K, entry: Entry<V>, evicted: &mut Evicted<K, V>) -> Admission {
        let score = self.scorer.score(&entry.value);
        let weight = self.weigher.weigh(&entry.value);

        if self.heap.get(&key).is_some() {
            // In-place update: adjust by the delta, no capacity check.
            if let Some(old) = self.heap.push(key, score, Scored { entry, weight }) {
                self.total_weight = self
                    .total_weight
                    .saturating_sub(old.weight)
                    .saturating_add(weight);
            }
            return Admission::Replaced;
        }

        self.evict_until_fits(weight, evicted);
        self.heap.push(key, score, Scored { entry, weight });
        self.total_weight = self.total_weight.saturating_add(weight);
        Admission::Inserted
    }

    fn remove(&mut self, key: &K) -> Option<Entry<V>> {
        let (_, scored) = self.heap.remove(key)?;
        self.total_weight = self.total_weight.saturating_sub(scored.weight);
        Some(scored.entry)
    }

    fn clear(&mut self) {
        self.heap.clear();
        self.total_weight = 0;
    }

    fn len(&self) -> usize {
        self.heap.len()
    }

    fn iter(&self) -> Box<dyn Iterator<Item = (&K, &Entry<V>)> + '_> {
        Box::new(self.heap.iter().map(|(key, scored)| (key, &scored.entry)))
    }

    fn weight(&self) -> u64 {
        self.total_weight
    }

    fn capacity(&self) -> u64 {
        self.capacity
    }
}
