//! # Ring Arena
//!
//! Index-based circular buffer backing the capped store. Elements live in a
//! flat slot vector addressed by `head` and `len`; logical index `i` maps to
//! physical slot `(head + i) % capacity`. There are no links between slots, so
//! eviction from the front and admission at the back are O(1) and never
//! allocate.
//!
//! When every slot is occupied the arena doubles its slot vector and
//! re-linearizes the live elements at physical index 0, preserving order.

pub struct RingArena<T> {
    slots: Vec<Option<T>>,
    head: usize,
    len: usize,
}

impl<T> RingArena<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            head: 0,
            len: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    fn physical(&self, logical: usize) -> usize {
        (self.head + logical) % self.slots.len()
    }

    pub fn push_back(&mut self, value: T) {
        if self.len == self.slots.len() {
            self.grow();
        }
        let tail = self.physical(self.len);
        debug_assert!(self.slots[tail].is_none());
        self.slots[tail] = Some(value);
        self.len += 1;
    }

    pub fn pop_front(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let value = self.slots[self.head].take();
        self.len -= 1;
        self.head = if self.len == 0 {
            0
        } else {
            (self.head + 1) % self.slots.len()
        };
        value
    }

    pub fn front(&self) -> Option<&T> {
        self.get(0)
    }

    pub fn back(&self) -> Option<&T> {
        self.len.checked_sub(1).and_then(|i| self.get(i))
    }

    pub fn get(&self, logical: usize) -> Option<&T> {
        if logical >= self.len {
            return None;
        }
        self.slots[self.physical(logical)].as_ref()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        (0..self.len).filter_map(move |i| self.get(i))
    }

    /// Binary search over logical order. `pred` must be true for a prefix of
    /// the elements and false for the rest; returns the length of that prefix.
    pub fn partition_point<F>(&self, mut pred: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let (mut lo, mut hi) = (0, self.len);
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            match self.get(mid) {
                Some(item) if pred(item) => lo = mid + 1,
                _ => hi = mid,
            }
        }
        lo
    }

    fn grow(&mut self) {
        let old_capacity = self.slots.len();
        let new_capacity = old_capacity * 2;
        let mut slots: Vec<Option<T>> = Vec::with_capacity(new_capacity);
        for i in 0..self.len {
            let idx = (self.head + i) % old_capacity;
            slots.push(self.slots[idx].take());
        }
        slots.resize_with(new_capacity, || None);
        self.slots = slots;
        self.head = 0;
    }
}

impl<T> Default for RingArena<T> {
    fn default() -> Self {
        Self::with_capacity(crate::config::DEFAULT_RING_CAPACITY)
    }
}
