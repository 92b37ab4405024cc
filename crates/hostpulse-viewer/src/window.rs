//! Fixed-capacity rolling window.

use std::ops::Index;
use std::slice;

/// Oldest-to-newest iterator over a [`RollingWindow`].
pub type Iter<'a, T> = std::iter::Chain<slice::Iter<'a, T>, slice::Iter<'a, T>>;

/// Ring buffer holding the most recent `capacity` values.
///
/// Index 0 is the oldest retained value and `len() - 1` the newest. Storage
/// is allocated once; pushing past capacity overwrites the oldest slot.
#[derive(Debug, Clone)]
pub struct RollingWindow<T> {
    slots: Vec<T>,
    capacity: usize,
    /// Slot holding the oldest value once the window is full.
    head: usize,
}

impl<T> RollingWindow<T> {
    /// Create an empty window. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            head: 0,
        }
    }

    /// Append a value, overwriting the oldest one when full.
    pub fn push(&mut self, value: T) {
        if self.slots.len() < self.capacity {
            self.slots.push(value);
        } else {
            self.slots[self.head] = value;
            self.head = (self.head + 1) % self.capacity;
        }
    }

    /// Number of retained values.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() == self.capacity
    }

    /// Maximum number of retained values.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Value at `index`, counted from the oldest.
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.slots.len() {
            return None;
        }
        Some(&self.slots[(self.head + index) % self.slots.len()])
    }

    /// Newest value, if any.
    pub fn newest(&self) -> Option<&T> {
        self.slots.len().checked_sub(1).and_then(|i| self.get(i))
    }

    /// Forget every value. Keeps the allocation.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.head = 0;
    }

    /// Values from oldest to newest.
    pub fn iter(&self) -> Iter<'_, T> {
        let (newer, older) = self.slots.split_at(self.head);
        older.iter().chain(newer.iter())
    }
}

impl<T: Clone + Default> RollingWindow<T> {
    /// Newest value, or `T::default()` when empty.
    pub fn latest(&self) -> T {
        self.newest().cloned().unwrap_or_default()
    }
}

impl<T> Index<usize> for RollingWindow<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        match self.get(index) {
            Some(value) => value,
            None => panic!(
                "index {index} out of bounds for rolling window of length {}",
                self.len()
            ),
        }
    }
}

impl<'a, T> IntoIterator for &'a RollingWindow<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overwrites_oldest() {
        let mut window = RollingWindow::new(3);
        for value in 1..=5 {
            window.push(value);
        }
        assert_eq!(window.iter().copied().collect::<Vec<_>>(), vec![3, 4, 5]);
        assert_eq!(window.latest(), 5);
        assert_eq!(window[0], 3);
        assert_eq!(window.len(), 3);
    }

    #[test]
    fn test_capacity_plus_k() {
        let capacity = 4;
        for k in 0..10 {
            let mut window = RollingWindow::new(capacity);
            for value in 1..=(capacity + k) {
                window.push(value);
            }
            assert_eq!(window.len(), capacity);
            assert_eq!(window[0], k + 1);
            assert_eq!(window[capacity - 1], capacity + k);

            let by_index: Vec<usize> = (0..window.len()).map(|i| window[i]).collect();
            let by_iter: Vec<usize> = window.iter().copied().collect();
            assert_eq!(by_index, by_iter);
        }
    }

    #[test]
    fn test_partial_fill_keeps_insertion_order() {
        let mut window = RollingWindow::new(5);
        window.push(10);
        window.push(20);
        assert_eq!(window.len(), 2);
        assert!(!window.is_full());
        assert_eq!(window.get(0), Some(&10));
        assert_eq!(window.get(1), Some(&20));
        assert_eq!(window.get(2), None);
    }

    #[test]
    fn test_latest_on_empty_is_default() {
        let window: RollingWindow<f32> = RollingWindow::new(3);
        assert_eq!(window.latest(), 0.0);
        assert!(window.newest().is_none());
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let mut window = RollingWindow::new(2);
        window.push(1);
        window.push(2);
        window.push(3);
        window.clear();
        assert!(window.is_empty());
        assert_eq!(window.capacity(), 2);

        window.push(7);
        assert_eq!(window.iter().copied().collect::<Vec<_>>(), vec![7]);
    }

    #[test]
    fn test_iteration_is_restartable() {
        let mut window = RollingWindow::new(2);
        window.push("a");
        window.push("b");
        window.push("c");
        let first: Vec<_> = (&window).into_iter().collect();
        let second: Vec<_> = window.iter().collect();
        assert_eq!(first, second);
        assert_eq!(window.iter().rev().next(), Some(&"c"));
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let mut window = RollingWindow::new(0);
        window.push(1);
        window.push(2);
        assert_eq!(window.capacity(), 1);
        assert_eq!(window.latest(), 2);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_index_past_len_panics() {
        let window: RollingWindow<u8> = RollingWindow::new(2);
        let _ = window[0];
    }
}
