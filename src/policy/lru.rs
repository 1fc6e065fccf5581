use std::hash::Hash;

use ahash::AHashMap;

use crate::ds::OrderList;
use crate::entry::Entry;

use super::{Admission, Evicted, Policy};

/// O(1) LRU policy with an item-count capacity.
///
/// Entries sit in an index-arena list ordered from most- to least-recently
/// used; `map` holds each key's slot.  Reads and writes both move the entry
/// to the front, eviction takes from the back.
pub struct LruPolicy<K, V> {
    list: OrderList<(K, Entry<V>)>,
    /// Maps a key to its index in `list`.
    map: AHashMap<K, usize>,
    capacity: usize,
}

impl<K: Hash + Eq + Clone, V> LruPolicy<K, V> {
    pub fn new(capacity: usize) -> Self {
        LruPolicy {
            list: OrderList::new(),
            map: AHashMap::new(),
            capacity,
        }
    }

    /// Removes least-recently-used entries until one more fits.
    fn make_room(&mut self, evicted: &mut Evicted<K, V>) {
        while self.map.len() >= self.capacity {
            let Some((key, entry)) = self.list.pop_back() else {
                break;
            };
            self.map.remove(&key);
            evicted.push((key, entry));
        }
    }
}

impl<K, V> Policy<K, V> for LruPolicy<K, V>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Send + Sync,
{
    fn peek(&self, key: &K) -> Option<&Entry<V>> {
        let idx = *self.map.get(key)?;
        self.list.get(idx).map(|(_, entry)| entry)
    }

    fn access(&mut self, key: &K) -> Option<&Entry<V>> {
        let idx = *self.map.get(key)?;
        self.list.move_to_front(idx);
        self.list.get(idx).map(|(_, entry)| entry)
    }

    fn tracks_access(&self) -> bool {
        true
    }

    fn insert(&mut self, key: K, entry: Entry<V>, evicted: &mut Evicted<K, V>) -> Admission {
        if let Some(&idx) = self.map.get(&key) {
            if let Some(slot) = self.list.get_mut(idx) {
                slot.1 = entry;
            }
            self.list.move_to_front(idx);
            return Admission::Replaced;
        }
        self.make_room(evicted);
        let idx = self.list.push_front((key.clone(), entry));
        self.map.insert(key, idx);
        Admission::Inserted
    }

    fn remove(&mut self, key: &K) -> Option<Entry<V>> {
        let idx = self.map.remove(key)?;
        self.list.remove(idx).map(|(_, entry)| entry)
    }

    fn clear(&mut self) {
        self.list.clear();
        self.map.clear();
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn iter(&self) -> Box<dyn Iterator<Item = (&K, &Entry<V>)> + '_> {
        Box::new(self.list.iter().map(|(key, entry)| (key, entry)))
    }

    fn weight(&self) -> u64 {
        self.map.len() as u64
    }

    fn capacity(&self) -> u64 {
        self.capacity as u64
    }
}
