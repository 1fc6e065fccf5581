use std::hash::Hash;

use crate::ds::IndexedHeap;
use crate::entry::Entry;

use super::{Admission, Evicted, Policy};

/// `(hits, last touch)`: fewest hits first, then least recently touched.
type Rank = (u64, u64);

/// Least-frequently-used policy with an item-count capacity.
///
/// Shares the indexed min-heap with the score-weighted policy, ranking by
/// hit count instead of a caller-supplied score.  A hit is an O(log n)
/// re-prioritisation.  Replacing a value keeps the key's hit count.
pub struct LfuPolicy<K, V> {
    heap: IndexedHeap<K, Rank, Entry<V>>,
    capacity: usize,
    /// Logical clock used to break frequency ties by age.
    tick: u64,
}

impl<K: Hash + Eq + Clone, V> LfuPolicy<K, V> {
    pub fn new(capacity: usize) -> Self {
        LfuPolicy {
            heap: IndexedHeap::new(),
            capacity,
            tick: 0,
        }
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Hit count of `key`, if present.
    #[cfg(test)]
    fn frequency(&self, key: &K) -> Option<u64> {
        self.heap.priority(key).map(|(hits, _)| hits)
    }
}

impl<K, V> Policy<K, V> for LfuPolicy<K, V>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Send + Sync,
{
    fn peek(&self, key: &K) -> Option<&Entry<V>> {
        self.heap.get(key)
    }

    fn access(&mut self, key: &K) -> Option<&Entry<V>> {
        let (hits, _) = self.heap.priority(key)?;
        let tick = self.next_tick();
        self.heap.reprioritize(key, (hits.saturating_add(1), tick));
        self.heap.get(key)
    }

    fn tracks_access(&self) -> bool {
        true
    }

    fn insert(&mut self, key: K, entry: Entry<V>, evicted: &mut Evicted<K, V>) -> Admission {
        if let Some(slot) = self.heap.get_mut(&key) {
            *slot = entry;
            return Admission::Replaced;
        }
        while self.heap.len() >= self.capacity {
            let Some((victim, _, old)) = self.heap.pop_min() else {
                break;
            };
            evicted.push((victim, old));
        }
        let tick = self.next_tick();
        self.heap.push(key, (0, tick), entry);
        Admission::Inserted
    }

    fn remove(&mut self, key: &K) -> Option<Entry<V>> {
        self.heap.remove(key).map(|(_, entry)| entry)
    }

    fn clear(&mut self) {
        self.heap.clear();
        self.tick = 0;
    }

    fn len(&self) -> usize {
        self.heap.len()
    }

    fn iter(&self) -> Box<dyn Iterator<Item = (&K, &Entry<V>)> + '_> {
        Box::new(self.heap.iter())
    }

    fn weight(&self) -> u64 {
        self.heap.len() as u64
    }

    fn capacity(&self) -> u64 {
        self.capacity as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn entry(v: u32) -> Entry<u32> {
        Entry::new(Arc::new(v), None)
    }

    #[test]
    fn evicts_least_frequently_used() {
        let mut policy = LfuPolicy::new(3);
        let mut evicted = Vec::new();
        for k in ["a", "b", "c"] {
            policy.insert(k, entry(0), &mut evicted);
        }
        policy.access(&"a");
        policy.access(&"a");
        policy.access(&"c");

        policy.insert("d", entry(0), &mut evicted);
        assert_eq!(evicted.iter().map(|(k, _)| *k).collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn ties_go_to_the_oldest() {
        let mut policy = LfuPolicy::new(2);
        let mut evicted = Vec::new();
        policy.insert("a", entry(0), &mut evicted);
        policy.insert("b", entry(0), &mut evicted);
        policy.insert("c", entry(0), &mut evicted);
        assert_eq!(evicted[0].0, "a");
    }

    #[test]
    fn replacing_keeps_frequency() {
        let mut policy = LfuPolicy::new(2);
        let mut evicted = Vec::new();
        policy.insert("a", entry(1), &mut evicted);
        policy.access(&"a");
        assert_eq!(policy.insert("a", entry(2), &mut evicted), Admission::Replaced);
        assert_eq!(policy.frequency(&"a"), Some(1));
        assert_eq!(policy.peek(&"a").map(|e| *e.value), Some(2));
    }

    #[test]
    fn remove_and_clear() {
        let mut policy = LfuPolicy::new(4);
        let mut evicted = Vec::new();
        policy.insert(1u32, entry(1), &mut evicted);
        policy.insert(2u32, entry(2), &mut evicted);
        assert!(policy.remove(&1).is_some());
        assert!(policy.remove(&1).is_none());
        policy.clear();
        assert_eq!(policy.len(), 0);
    }
}
