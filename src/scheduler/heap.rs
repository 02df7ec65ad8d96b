//! Array-backed binary heap ordered by a caller-supplied predicate.
//!
//! The heap does not require `T: Ord`. Instead it is built with a
//! `higher(a, b)` closure meaning "`a` must sit above `b`", which makes it a
//! max-heap under whatever ordering the caller chooses. Positions are
//! 1-based internally so that the parent of position `i` is `i / 2` and its
//! children are `2i` and `2i + 1`.
//!
//! Storage grows by a factor of four when full and never shrinks.

use std::collections::TryReserveError;
use std::fmt;

/// Initial capacity used by [`Heap::new`].
pub const DEFAULT_CAPACITY: usize = 32;

const GROWTH_FACTOR: usize = 4;

/// Binary heap ordered by a `higher(a, b)` predicate. See the module docs.
pub struct Heap<T, F> {
    items: Vec<T>,
    capacity: usize,
    higher: F,
}

impl<T, F> Heap<T, F>
where
    F: Fn(&T, &T) -> bool,
{
    /// Create an empty heap. Storage for [`DEFAULT_CAPACITY`] items is
    /// reserved on the first push.
    pub fn new(higher: F) -> Self {
        Self {
            items: Vec::new(),
            capacity: DEFAULT_CAPACITY,
            higher,
        }
    }

    /// Create an empty heap with storage for `capacity` items reserved up front.
    pub fn with_capacity(capacity: usize, higher: F) -> Result<Self, TryReserveError> {
        let capacity = capacity.max(1);
        let mut items = Vec::new();
        items.try_reserve_exact(capacity)?;

        Ok(Self {
            items,
            capacity,
            higher,
        })
    }

    /// Insert an item, sifting it up from the last slot.
    ///
    /// If the storage needs to grow and the allocation fails, the heap is left
    /// untouched and the item is handed back inside the error.
    pub fn push(&mut self, item: T) -> Result<(), PushError<T>> {
        if let Err(source) = self.reserve_slot() {
            return Err(PushError { item, source });
        }

        self.items.push(item);
        self.sift_up(self.items.len());
        Ok(())
    }

    /// Remove and return the top item, or `None` if the heap is empty.
    pub fn pop(&mut self) -> Option<T> {
        if self.items.is_empty() {
            return None;
        }

        // moves the last item into the root slot
        let top = self.items.swap_remove(0);
        if self.items.len() > 1 {
            self.sift_down(1);
        }
        Some(top)
    }

    /// The top item, without removing it.
    pub fn peek(&self) -> Option<&T> {
        self.items.first()
    }

    /// Whether the heap holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Logical capacity. Reaching it on push grows storage fourfold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Apply `f` to every stored item in place.
    ///
    /// Heap order is not re-established afterwards; if `f` changes the keys
    /// the comparator looks at, restoring order is the caller's job.
    pub fn for_each<G>(&mut self, f: G)
    where
        G: FnMut(&mut T),
    {
        self.items.iter_mut().for_each(f);
    }

    /// Keep only the items for which `keep` returns true and return the new
    /// length. Survivors are compacted in their current relative order, then
    /// the heap is rebuilt if anything was removed.
    pub fn filter_retain<P>(&mut self, keep: P) -> usize
    where
        P: FnMut(&T) -> bool,
    {
        let before = self.items.len();
        self.items.retain(keep);

        if self.items.len() < before {
            self.rebuild();
        }
        self.items.len()
    }

    /// Remove every item, in storage order. Reserved storage is kept.
    pub fn drain(&mut self) -> Vec<T> {
        self.items.drain(..).collect()
    }

    /// Consume the heap, returning its items in storage order.
    pub fn into_vec(self) -> Vec<T> {
        self.items
    }

    /// Copy the heap into a new one with room for `capacity` items.
    ///
    /// If more than `capacity` items are stored, only the first `capacity`
    /// in storage order are kept. Any prefix of the storage is itself a
    /// valid heap, so the copy needs no reordering.
    pub fn copy_with_capacity(&self, capacity: usize) -> Result<Self, TryReserveError>
    where
        T: Clone,
        F: Clone,
    {
        let capacity = capacity.max(1);
        let mut items = Vec::new();
        items.try_reserve_exact(capacity)?;

        let keep = self.items.len().min(capacity);
        items.extend_from_slice(&self.items[..keep]);

        Ok(Self {
            items,
            capacity,
            higher: self.higher.clone(),
        })
    }

    fn reserve_slot(&mut self) -> Result<(), TryReserveError> {
        let len = self.items.len();
        let target = if len >= self.capacity {
            self.capacity.max(1).saturating_mul(GROWTH_FACTOR)
        } else {
            self.capacity
        };

        if self.items.capacity() < target {
            self.items.try_reserve_exact(target - len)?;
        }
        self.capacity = target;
        Ok(())
    }

    fn is_higher(&self, a: usize, b: usize) -> bool {
        (self.higher)(&self.items[a - 1], &self.items[b - 1])
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.items.swap(a - 1, b - 1);
    }

    fn sift_up(&mut self, mut pos: usize) {
        while pos > 1 {
            let parent = pos / 2;
            if !self.is_higher(pos, parent) {
                break;
            }
            self.swap(pos, parent);
            pos = parent;
        }
    }

    fn sift_down(&mut self, mut pos: usize) {
        let len = self.items.len();

        loop {
            let left = pos * 2;
            let right = left + 1;

            // the right child only wins if it beats both its sibling and the parent
            if right <= len && self.is_higher(right, left) && self.is_higher(right, pos) {
                self.swap(pos, right);
                pos = right;
            } else if left <= len && self.is_higher(left, pos) {
                self.swap(pos, left);
                pos = left;
            } else {
                break;
            }
        }
    }

    fn rebuild(&mut self) {
        let len = self.items.len();
        for pos in (1..=len / 2).rev() {
            self.sift_down(pos);
        }
    }
}

impl<T: Clone, F: Clone> Clone for Heap<T, F> {
    fn clone(&self) -> Self {
        let mut items = Vec::with_capacity(self.capacity);
        items.extend_from_slice(&self.items);

        Self {
            items,
            capacity: self.capacity,
            higher: self.higher.clone(),
        }
    }
}

impl<T, F> fmt::Debug for Heap<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Heap")
            .field("len", &self.items.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

/// Returned by [`Heap::push`] when storage could not grow.
pub struct PushError<T> {
    item: T,
    source: TryReserveError,
}

impl<T> PushError<T> {
    /// Recover the item that was not inserted.
    pub fn into_inner(self) -> T {
        self.item
    }

    /// The allocation error that stopped the push.
    pub fn reserve_error(&self) -> &TryReserveError {
        &self.source
    }

    /// Split into the rejected item and the allocation error.
    pub fn into_parts(self) -> (T, TryReserveError) {
        (self.item, self.source)
    }
}

impl<T> fmt::Debug for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushError")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl<T> fmt::Display for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "heap storage could not grow: {}", self.source)
    }
}

impl<T> std::error::Error for PushError<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn max_heap() -> Heap<i32, fn(&i32, &i32) -> bool> {
        Heap::new(|a, b| a > b)
    }

    fn drain_in_order<F: Fn(&i32, &i32) -> bool>(heap: &mut Heap<i32, F>) -> Vec<i32> {
        std::iter::from_fn(|| heap.pop()).collect()
    }

    #[test]
    fn test_pop_order() {
        let mut heap = max_heap();
        for v in [5, 1, 9, 3] {
            heap.push(v).unwrap();
        }

        assert_eq!(heap.peek(), Some(&9));
        assert_eq!(drain_in_order(&mut heap), vec![9, 5, 3, 1]);
        assert!(heap.is_empty());
    }

    #[test]
    fn test_growth_keeps_items() {
        let mut heap = Heap::with_capacity(2, |a: &i32, b: &i32| a > b).unwrap();
        assert_eq!(heap.capacity(), 2);

        for v in [5, 1, 9, 3] {
            heap.push(v).unwrap();
        }

        assert_eq!(heap.capacity(), 8);
        assert_eq!(heap.len(), 4);
        assert_eq!(drain_in_order(&mut heap), vec![9, 5, 3, 1]);
        // never shrinks
        assert_eq!(heap.capacity(), 8);
    }

    #[test]
    fn test_empty_and_single() {
        let mut heap = max_heap();
        assert_eq!(heap.pop(), None);
        assert_eq!(heap.peek(), None);

        heap.push(42).unwrap();
        assert_eq!(heap.pop(), Some(42));
        assert_eq!(heap.pop(), None);
    }

    #[test]
    fn test_custom_ordering_min_heap() {
        let mut heap = Heap::new(|a: &i32, b: &i32| a < b);
        for v in [7, -2, 11, 0, 3] {
            heap.push(v).unwrap();
        }

        assert_eq!(drain_in_order(&mut heap), vec![-2, 0, 3, 7, 11]);
    }

    #[test]
    fn test_for_each_touches_every_item() {
        let mut heap = max_heap();
        for v in 1..=10 {
            heap.push(v).unwrap();
        }

        heap.for_each(|v| *v *= 10);

        let mut all = heap.into_vec();
        all.sort_unstable();
        assert_eq!(all, (1..=10).map(|v| v * 10).collect::<Vec<_>>());
    }

    #[test]
    fn test_filter_retain() {
        let mut heap = max_heap();
        for v in 1..=20 {
            heap.push(v).unwrap();
        }

        let remaining = heap.filter_retain(|v| v % 3 == 0);
        assert_eq!(remaining, 6);
        assert_eq!(drain_in_order(&mut heap), vec![18, 15, 12, 9, 6, 3]);
    }

    #[test]
    fn test_filter_retain_everything_removed() {
        let mut heap = max_heap();
        for v in 0..5 {
            heap.push(v).unwrap();
        }

        assert_eq!(heap.filter_retain(|_| false), 0);
        assert!(heap.is_empty());
    }

    #[test]
    fn test_drain_keeps_capacity() {
        let mut heap = Heap::with_capacity(4, |a: &i32, b: &i32| a > b).unwrap();
        for v in 0..10 {
            heap.push(v).unwrap();
        }
        let capacity = heap.capacity();

        let drained = heap.drain();
        assert_eq!(drained.len(), 10);
        assert!(heap.is_empty());
        assert_eq!(heap.capacity(), capacity);
    }

    #[test]
    fn test_does_not_require_ord() {
        #[derive(Debug)]
        struct Job {
            weight: f64,
        }

        let mut heap = Heap::new(|a: &Job, b: &Job| a.weight > b.weight);
        for weight in [0.5, 2.25, 1.0] {
            heap.push(Job { weight }).unwrap();
        }

        assert_eq!(heap.pop().map(|j| j.weight), Some(2.25));
    }

    #[test]
    fn test_copy_with_capacity_truncates() {
        let mut heap = max_heap();
        for v in [4, 8, 1, 7, 3, 9, 2] {
            heap.push(v).unwrap();
        }

        let mut small = heap.copy_with_capacity(3).unwrap();
        assert_eq!(small.capacity(), 3);
        assert_eq!(small.len(), 3);
        assert_eq!(small.peek(), Some(&9));
        // the storage prefix is still a valid heap
        let popped = drain_in_order(&mut small);
        assert!(popped.windows(2).all(|w| w[0] >= w[1]));

        let mut large = heap.copy_with_capacity(64).unwrap();
        assert_eq!(large.capacity(), 64);
        assert_eq!(drain_in_order(&mut large), vec![9, 8, 7, 4, 3, 2, 1]);

        // source untouched
        assert_eq!(heap.len(), 7);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut heap = max_heap();
        for v in [3, 1, 2] {
            heap.push(v).unwrap();
        }

        let mut copy = heap.clone();
        copy.push(10).unwrap();

        assert_eq!(heap.len(), 3);
        assert_eq!(heap.peek(), Some(&3));
        assert_eq!(drain_in_order(&mut copy), vec![10, 3, 2, 1]);
    }

    #[test]
    fn test_failed_push_returns_item_and_leaves_heap() {
        let mut heap: Heap<u64, fn(&u64, &u64) -> bool> = Heap {
            items: vec![5, 2],
            // growing to this many u64s cannot be satisfied
            capacity: usize::MAX / 2,
            higher: |a, b| a > b,
        };

        let err = heap.push(7).unwrap_err();
        assert!(err.to_string().starts_with("heap storage could not grow"));
        assert_eq!(err.into_inner(), 7);

        assert_eq!(heap.len(), 2);
        assert_eq!(heap.pop(), Some(5));
        assert_eq!(heap.pop(), Some(2));
    }

    proptest! {
        #[test]
        fn prop_pops_are_non_increasing(values in proptest::collection::vec(any::<i32>(), 0..300)) {
            let mut heap = max_heap();
            for v in &values {
                heap.push(*v).unwrap();
            }

            let popped = drain_in_order(&mut heap);
            prop_assert_eq!(popped.len(), values.len());
            prop_assert!(popped.windows(2).all(|w| w[0] >= w[1]));
        }

        #[test]
        fn prop_filter_retain_keeps_heap_order(
            values in proptest::collection::vec(-1000i32..1000, 0..200),
            modulus in 2i32..7,
        ) {
            let mut heap = max_heap();
            for v in &values {
                heap.push(*v).unwrap();
            }

            heap.filter_retain(|v| v.rem_euclid(modulus) != 0);

            let mut expected: Vec<i32> = values
                .iter()
                .copied()
                .filter(|v| v.rem_euclid(modulus) != 0)
                .collect();
            expected.sort_unstable_by(|a, b| b.cmp(a));

            prop_assert_eq!(drain_in_order(&mut heap), expected);
        }
    }
}
