//! Adaptive Replacement Cache.
//!
//! ```text
//!          ghosts (keys only)          resident entries            ghosts
//!   B1 ◀─────────────────────── T1 (seen once) │ T2 (seen twice+) ───────▶ B2
//!                                 ◀──── target ────▶
//! ```
//!
//! New keys enter T1; a second hit moves them to T2.  When room is needed the
//! tail of T1 or T2 is demoted to its ghost list, keeping only the key.  A
//! write that finds its key in B1 means T1 was too small, so `target` (the
//! desired size of T1) grows; a hit in B2 shrinks it.  Either way the key is
//! re-admitted straight into T2.
//!
//! Capacity counts resident entries; the ghost lists together hold at most
//! another `capacity` keys.

use std::hash::Hash;

use ahash::AHashMap;

use crate::ds::OrderList;
use crate::entry::Entry;

use super::{Admission, Evicted, Policy};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Segment {
    Recent,
    Frequent,
}

pub struct ArcPolicy<K, V> {
    capacity: usize,
    /// Adaptive target size of T1.
    target: usize,
    resident: AHashMap<K, (Segment, usize)>,
    /// T1
    recent: OrderList<(K, Entry<V>)>,
    /// T2
    frequent: OrderList<(K, Entry<V>)>,
    ghosts: AHashMap<K, (Segment, usize)>,
    /// B1
    recent_ghosts: OrderList<K>,
    /// B2
    frequent_ghosts: OrderList<K>,
}

impl<K: Hash + Eq + Clone, V> ArcPolicy<K, V> {
    pub fn new(capacity: usize) -> Self {
        ArcPolicy {
            capacity,
            target: 0,
            resident: AHashMap::new(),
            recent: OrderList::new(),
            frequent: OrderList::new(),
            ghosts: AHashMap::new(),
            recent_ghosts: OrderList::new(),
            frequent_ghosts: OrderList::new(),
        }
    }

    fn list(&self, segment: Segment) -> &OrderList<(K, Entry<V>)> {
        match segment {
            Segment::Recent => &self.recent,
            Segment::Frequent => &self.frequent,
        }
    }

    fn list_mut(&mut self, segment: Segment) -> &mut OrderList<(K, Entry<V>)> {
        match segment {
            Segment::Recent => &mut self.recent,
            Segment::Frequent => &mut self.frequent,
        }
    }

    fn ghost_list_mut(&mut self, segment: Segment) -> &mut OrderList<K> {
        match segment {
            Segment::Recent => &mut self.recent_ghosts,
            Segment::Frequent => &mut self.frequent_ghosts,
        }
    }

    fn admit(&mut self, segment: Segment, key: K, entry: Entry<V>) {
        let idx = self.list_mut(segment).push_front((key.clone(), entry));
        self.resident.insert(key, (segment, idx));
    }

    /// Moves the tail of `segment` to its ghost list, reporting the entry as
    /// evicted.
    fn demote(&mut self, segment: Segment, evicted: &mut Evicted<K, V>) {
        let Some((key, entry)) = self.list_mut(segment).pop_back() else {
            return;
        };
        self.resident.remove(&key);
        let idx = self.ghost_list_mut(segment).push_front(key.clone());
        self.ghosts.insert(key.clone(), (segment, idx));
        evicted.push((key, entry));
    }

    /// Drops the oldest ghost of `segment`.
    fn forget(&mut self, segment: Segment) {
        if let Some(key) = self.ghost_list_mut(segment).pop_back() {
            self.ghosts.remove(&key);
        }
    }

    /// Frees one resident slot if the cache is full, choosing between T1 and
    /// T2 by comparing T1's size against `target`.
    fn replace(&mut self, hit_frequent_ghost: bool, evicted: &mut Evicted<K, V>) {
        if self.resident.len() < self.capacity {
            return;
        }
        let t1 = self.recent.len();
        if t1 > 0 && (t1 > self.target || (hit_frequent_ghost && t1 == self.target)) {
            self.demote(Segment::Recent, evicted);
        } else if !self.frequent.is_empty() {
            self.demote(Segment::Frequent, evicted);
        } else {
            self.demote(Segment::Recent, evicted);
        }
    }

    fn admit_new(&mut self, key: K, entry: Entry<V>, evicted: &mut Evicted<K, V>) {
        let full = self.resident.len() >= self.capacity;
        let l1 = self.recent.len() + self.recent_ghosts.len();
        if full && l1 >= self.capacity {
            if self.recent.len() < self.capacity {
                self.forget(Segment::Recent);
                self.replace(false, evicted);
            } else if let Some((old, entry)) = self.recent.pop_back() {
                // T1 alone fills the cache: drop its tail without a ghost.
                self.resident.remove(&old);
                evicted.push((old, entry));
            }
        } else if full {
            let total = l1 + self.frequent.len() + self.frequent_ghosts.len();
            if total >= 2 * self.capacity {
                if self.frequent_ghosts.is_empty() {
                    self.forget(Segment::Recent);
                } else {
                    self.forget(Segment::Frequent);
                }
            }
            self.replace(false, evicted);
        }
        self.admit(Segment::Recent, key, entry);
    }

    #[cfg(test)]
    fn segment_of(&self, key: &K) -> Option<Segment> {
        self.resident.get(key).map(|(segment, _)| *segment)
    }
}

impl<K, V> Policy<K, V> for ArcPolicy<K, V>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Send + Sync,
{
    fn peek(&self, key: &K) -> Option<&Entry<V>> {
        let &(segment, idx) = self.resident.get(key)?;
        self.list(segment).get(idx).map(|(_, entry)| entry)
    }

    fn access(&mut self, key: &K) -> Option<&Entry<V>> {
        let &(segment, idx) = self.resident.get(key)?;
        match segment {
            Segment::Recent => {
                let (key, entry) = self.recent.remove(idx)?;
                self.admit(Segment::Frequent, key, entry);
            }
            Segment::Frequent => self.frequent.move_to_front(idx),
        }
        self.peek(key)
    }

    fn tracks_access(&self) -> bool {
        true
    }

    fn insert(&mut self, key: K, entry: Entry<V>, evicted: &mut Evicted<K, V>) -> Admission {
        if let Some(&(segment, idx)) = self.resident.get(&key) {
            if let Some(slot) = self.list_mut(segment).get_mut(idx) {
                slot.1 = entry;
            }
            return Admission::Replaced;
        }

        match self.ghosts.get(&key).copied() {
            Some((Segment::Recent, idx)) => {
                let delta = (self.frequent_ghosts.len() / self.recent_ghosts.len().max(1)).max(1);
                self.target = (self.target + delta).min(self.capacity);
                self.recent_ghosts.remove(idx);
                self.ghosts.remove(&key);
                self.replace(false, evicted);
                self.admit(Segment::Frequent, key, entry);
            }
            Some((Segment::Frequent, idx)) => {
                let delta = (self.recent_ghosts.len() / self.frequent_ghosts.len().max(1)).max(1);
                self.target = self.target.saturating_sub(delta);
                self.frequent_ghosts.remove(idx);
                self.ghosts.remove(&key);
                self.replace(true, evicted);
                self.admit(Segment::Frequent, key, entry);
            }
            None => self.admit_new(key, entry, evicted),
        }
        Admission::Inserted
    }

    fn remove(&mut self, key: &K) -> Option<Entry<V>> {
        let (segment, idx) = self.resident.remove(key)?;
        self.list_mut(segment).remove(idx).map(|(_, entry)| entry)
    }

    fn clear(&mut self) {
        self.target = 0;
        self.resident.clear();
        self.recent.clear();
        self.frequent.clear();
        self.ghosts.clear();
        self.recent_ghosts.clear();
        self.frequent_ghosts.clear();
    }

    fn len(&self) -> usize {
        self.resident.len()
    }

    fn iter(&self) -> Box<dyn Iterator<Item = (&K, &Entry<V>)> + '_> {
        Box::new(
            self.recent
                .iter()
                .chain(self.frequent.iter())
                .map(|(key, entry)| (key, entry)),
        )
    }

    fn weight(&self) -> u64 {
        self.resident.len() as u64
    }

    fn capacity(&self) -> u64 {
        self.capacity as u64
    }
}
