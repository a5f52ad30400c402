// Min-priority queue used as the search frontier
//
// The priority of an item is derived from the item itself by a function
// supplied at construction, so callers only ever `push` payloads.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Heap entry. Ordered so that `BinaryHeap` (a max-heap) pops the lowest
/// priority first and, among equal priorities, the earliest insertion.
struct Entry<T> {
    priority: f64,
    sequence: u64,
    item: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Binary-heap frontier ordered by a caller-supplied priority function
pub struct PriorityQueue<T, F>
where
    F: Fn(&T) -> f64,
{
    heap: BinaryHeap<Entry<T>>,
    priority_fn: F,
    next_sequence: u64,
}

impl<T, F> PriorityQueue<T, F>
where
    F: Fn(&T) -> f64,
{
    pub fn with_priority(priority_fn: F) -> Self {
        PriorityQueue {
            heap: BinaryHeap::new(),
            priority_fn,
            next_sequence: 0,
        }
    }

    /// Adds an item, computing its priority from the stored function
    pub fn push(&mut self, item: T) {
        let priority = (self.priority_fn)(&item);
        self.heap.push(Entry {
            priority,
            sequence: self.next_sequence,
            item,
        });
        self.next_sequence += 1;
    }

    /// Removes the item with the lowest priority
    pub fn pop(&mut self) -> Option<T> {
        self.heap.pop().map(|entry| entry.item)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap = BinaryHeap::new();
        self.next_sequence = 0;
    }
}
