/// Sentinel indices in the `nodes` arena.
const HEAD: usize = 0; // front (most recent)
const TAIL: usize = 1; // back (least recent)
const NULL: usize = usize::MAX;

struct ListNode<T> {
    /// `None` for the HEAD and TAIL sentinels and for freed slots.
    value: Option<T>,
    /// Index toward HEAD.
    prev: usize,
    /// Index toward TAIL.
    next: usize,
}

/// O(1) doubly-linked list over an index arena.
///
/// Nodes live in a `Vec` and link by index, so there are no raw pointers.
/// Indices returned by [`push_front`](OrderList::push_front) stay valid until
/// the value is removed; callers keep them in their own key → index maps.
pub(crate) struct OrderList<T> {
    /// Index 0 = HEAD sentinel, 1 = TAIL sentinel, 2+ = real values.
    nodes: Vec<ListNode<T>>,
    /// Indices of freed (reusable) slots.
    free_list: Vec<usize>,
    len: usize,
}

impl<T> OrderList<T> {
    pub(crate) fn new() -> Self {
        let mut list = OrderList {
            nodes: Vec::with_capacity(16),
            free_list: Vec::new(),
            len: 0,
        };
        list.reset();
        list
    }

    fn reset(&mut self) {
        self.nodes.clear();
        self.free_list.clear();
        self.len = 0;
        self.nodes.push(ListNode {
            value: None,
            prev: NULL,
            next: TAIL,
        });
        self.nodes.push(ListNode {
            value: None,
            prev: HEAD,
            next: NULL,
        });
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn get(&self, idx: usize) -> Option<&T> {
        self.nodes.get(idx).and_then(|node| node.value.as_ref())
    }

    pub(crate) fn get_mut(&mut self, idx: usize) -> Option<&mut T> {
        self.nodes.get_mut(idx).and_then(|node| node.value.as_mut())
    }

    /// Inserts `value` at the front and returns its index.
    pub(crate) fn push_front(&mut self, value: T) -> usize {
        let idx = match self.free_list.pop() {
            Some(idx) => {
                self.nodes[idx].value = Some(value);
                idx
            }
            None => {
                self.nodes.push(ListNode {
                    value: Some(value),
                    prev: NULL,
                    next: NULL,
                });
                self.nodes.len() - 1
            }
        };
        self.link_after_head(idx);
        self.len += 1;
        idx
    }

    /// Moves the value at `idx` to the front.
    pub(crate) fn move_to_front(&mut self, idx: usize) {
        if self.get(idx).is_some() {
            self.unlink(idx);
            self.link_after_head(idx);
        }
    }

    /// Removes and returns the value at `idx`.
    pub(crate) fn remove(&mut self, idx: usize) -> Option<T> {
        let value = self.nodes.get_mut(idx)?.value.take()?;
        self.unlink(idx);
        self.free_list.push(idx);
        self.len -= 1;
        Some(value)
    }

    /// Removes and returns the value at the back.
    pub(crate) fn pop_back(&mut self) -> Option<T> {
        let idx = self.nodes[TAIL].prev;
        if idx == HEAD {
            return None;
        }
        self.remove(idx)
    }

    /// Iterates from front to back.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        let mut idx = self.nodes[HEAD].next;
        std::iter::from_fn(move || {
            if idx == TAIL {
                return None;
            }
            let node = &self.nodes[idx];
            idx = node.next;
            node.value.as_ref()
        })
    }

    pub(crate) fn clear(&mut self) {
        self.reset();
    }

    fn link_after_head(&mut self, idx: usize) {
        let old_first = self.nodes[HEAD].next;
        self.nodes[idx].prev = HEAD;
        self.nodes[idx].next = old_first;
        self.nodes[HEAD].next = idx;
        self.nodes[old_first].prev = idx;
    }

    fn unlink(&mut self, idx: usize) {
        let prev = self.nodes[idx].prev;
        let next = self.nodes[idx].next;
        self.nodes[prev].next = next;
        self.nodes[next].prev = prev;
        self.nodes[idx].prev = NULL;
        self.nodes[idx].next = NULL;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_front_and_pop_back_is_fifo() {
        let mut list = OrderList::new();
        for v in ["a", "b", "c"] {
            list.push_front(v);
        }
        assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec!["c", "b", "a"]);
        assert_eq!(list.pop_back(), Some("a"));
        assert_eq!(list.pop_back(), Some("b"));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn move_to_front_reorders() {
        let mut list = OrderList::new();
        let a = list.push_front("a");
        list.push_front("b");
        list.move_to_front(a);
        assert_eq!(list.pop_back(), Some("b"));
    }

    #[test]
    fn removed_slots_are_reused() {
        let mut list = OrderList::new();
        let a = list.push_front(1);
        assert_eq!(list.remove(a), Some(1));
        assert_eq!(list.remove(a), None);
        assert_eq!(list.push_front(2), a);
        assert_eq!(list.get(a), Some(&2));
    }

    #[test]
    fn clear_empties_the_list() {
        let mut list = OrderList::new();
        list.push_front(1);
        list.push_front(2);
        list.clear();
        assert!(list.is_empty());
        assert_eq!(list.pop_back(), None);
    }
}
