//! Ordering structures owned by the eviction policies.

pub(crate) mod indexed_heap;
pub(crate) mod order_list;

pub(crate) use indexed_heap::IndexedHeap;
pub(crate) use order_list::OrderList;
