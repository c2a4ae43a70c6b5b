use std::collections::VecDeque;

/// Fixed-capacity FIFO of the most recent items; pushing into a full ring
/// evicts the oldest.
#[derive(Debug, Clone)]
pub struct FrameRing<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> FrameRing<T> {
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        // a ring is never larger than the frames of one file
        Self { items: VecDeque::with_capacity(capacity.min(256)), capacity }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Appends `item`, returning the evicted oldest item if the ring was full.
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() == self.capacity { self.items.pop_front() } else { None };
        self.items.push_back(item);
        evicted
    }

    pub fn front(&self) -> Option<&T> {
        self.items.front()
    }

    pub fn back(&self) -> Option<&T> {
        self.items.back()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &T> + '_ {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> impl ExactSizeIterator<Item = &mut T> + '_ {
        self.items.iter_mut()
    }
}
