//! Binary min-heap with a key → position index.
//!
//! `std::collections::BinaryHeap` cannot remove or re-prioritise an arbitrary
//! element, which forces either O(n) scans or lazily-invalidated stale
//! entries.  This heap owns both the node vector and the position index and
//! updates them together inside every swap, so a key is always present in
//! both or in neither.
//!
//! | Operation        | Cost      |
//! |------------------|-----------|
//! | `push`           | O(log n)  |
//! | `remove`         | O(log n)  |
//! | `pop_min`        | O(log n)  |
//! | `reprioritize`   | O(log n)  |
//! | `get` / `peek_min` | O(1)    |
//!
//! Ties between equal priorities are broken by heap layout and are not stable.

use std::hash::Hash;

use ahash::AHashMap;

struct HeapNode<K, P, T> {
    key: K,
    priority: P,
    item: T,
}

pub(crate) struct IndexedHeap<K, P, T> {
    nodes: Vec<HeapNode<K, P, T>>,
    positions: AHashMap<K, usize>,
}

impl<K, P, T> IndexedHeap<K, P, T>
where
    K: Hash + Eq + Clone,
    P: Ord + Copy,
{
    pub(crate) fn new() -> Self {
        IndexedHeap {
            nodes: Vec::new(),
            positions: AHashMap::new(),
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn get(&self, key: &K) -> Option<&T> {
        self.positions.get(key).map(|&pos| &self.nodes[pos].item)
    }

    /// Mutable access to the payload.  The priority is untouched, so the heap
    /// order cannot be disturbed through this reference.
    pub(crate) fn get_mut(&mut self, key: &K) -> Option<&mut T> {
        let pos = *self.positions.get(key)?;
        Some(&mut self.nodes[pos].item)
    }

    pub(crate) fn priority(&self, key: &K) -> Option<P> {
        self.positions.get(key).map(|&pos| self.nodes[pos].priority)
    }

    /// Inserts `key`, or updates its priority and payload if already present.
    ///
    /// Returns the previous payload when the key existed.
    pub(crate) fn push(&mut self, key: K, priority: P, item: T) -> Option<T> {
        if let Some(&pos) = self.positions.get(&key) {
            let node = &mut self.nodes[pos];
            node.priority = priority;
            let old = std::mem::replace(&mut node.item, item);
            self.restore(pos);
            return Some(old);
        }
        let pos = self.nodes.len();
        self.positions.insert(key.clone(), pos);
        self.nodes.push(HeapNode {
            key,
            priority,
            item,
        });
        self.sift_up(pos);
        None
    }

    /// Changes the priority of `key`.  Returns `false` if the key is absent.
    pub(crate) fn reprioritize(&mut self, key: &K, priority: P) -> bool {
        let Some(&pos) = self.positions.get(key) else {
            return false;
        };
        self.nodes[pos].priority = priority;
        self.restore(pos);
        true
    }

    pub(crate) fn remove(&mut self, key: &K) -> Option<(P, T)> {
        let pos = self.positions.remove(key)?;
        self.detach(pos).map(|node| (node.priority, node.item))
    }

    #[cfg(test)]
    pub(crate) fn peek_min(&self) -> Option<(&K, P)> {
        self.nodes.first().map(|node| (&node.key, node.priority))
    }

    pub(crate) fn pop_min(&mut self) -> Option<(K, P, T)> {
        let key = self.nodes.first()?.key.clone();
        self.positions.remove(&key);
        self.detach(0).map(|node| (node.key, node.priority, node.item))
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&K, &T)> + '_ {
        self.nodes.iter().map(|node| (&node.key, &node.item))
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.positions.clear();
    }

    /// Removes the node at `pos` whose key has already been dropped from the
    /// index, filling the hole with the last node.
    fn detach(&mut self, pos: usize) -> Option<HeapNode<K, P, T>> {
        let last = self.nodes.len().checked_sub(1)?;
        if pos != last {
            self.swap(pos, last);
        }
        let node = self.nodes.pop()?;
        if pos < self.nodes.len() {
            self.restore(pos);
        }
        Some(node)
    }

    fn restore(&mut self, pos: usize) {
        if self.sift_up(pos) == pos {
            self.sift_down(pos);
        }
    }

    fn sift_up(&mut self, mut pos: usize) -> usize {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if self.nodes[pos].priority >= self.nodes[parent].priority {
                break;
            }
            self.swap(pos, parent);
            pos = parent;
        }
        pos
    }

    fn sift_down(&mut self, mut pos: usize) -> usize {
        let len = self.nodes.len();
        loop {
            let left = 2 * pos + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let child = if right < len && self.nodes[right].priority < self.nodes[left].priority {
                right
            } else {
                left
            };
            if self.nodes[child].priority >= self.nodes[pos].priority {
                break;
            }
            self.swap(pos, child);
            pos = child;
        }
        pos
    }

    /// Swaps two nodes and re-points both keys' positions.
    fn swap(&mut self, a: usize, b: usize) {
        self.nodes.swap(a, b);
        if let Some(p) = self.positions.get_mut(&self.nodes[a].key) {
            *p = a;
        }
        if let Some(p) = self.positions.get_mut(&self.nodes[b].key) {
            *p = b;
        }
    }

    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        assert_eq!(self.nodes.len(), self.positions.len(), "index size mismatch");
        for (pos, node) in self.nodes.iter().enumerate() {
            assert_eq!(self.positions.get(&node.key), Some(&pos), "stale position");
            if pos > 0 {
                assert!(
                    self.nodes[(pos - 1) / 2].priority <= node.priority,
                    "heap order violated at {pos}"
                );
            }
        }
    }
}
