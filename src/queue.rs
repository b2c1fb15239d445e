//! Bounded circular byte queue used by the pull-style receive path.
//!
//! One slot is always left unused so that `dequeue == enqueue` means empty
//! and `next(enqueue) == dequeue` means full. A queue of `N` slots therefore
//! holds at most `N - 1` bytes.

#[derive(Debug, Clone)]
pub struct ByteQueue<const N: usize> {
    slots: [u8; N],
    enqueue: usize,
    dequeue: usize,
}

impl<const N: usize> ByteQueue<N> {
    pub const fn new() -> Self {
        assert!(N >= 2, "queue needs at least two slots");
        Self {
            slots: [0; N],
            enqueue: 0,
            dequeue: 0,
        }
    }

    /// Number of bytes the queue can hold.
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    const fn next(index: usize) -> usize {
        if index + 1 >= N { 0 } else { index + 1 }
    }

    pub fn is_empty(&self) -> bool {
        self.dequeue == self.enqueue
    }

    pub fn is_full(&self) -> bool {
        Self::next(self.enqueue) == self.dequeue
    }

    pub fn len(&self) -> usize {
        if self.enqueue >= self.dequeue {
            self.enqueue - self.dequeue
        } else {
            N - self.dequeue + self.enqueue
        }
    }

    /// Append a byte. Returns `false` and leaves the queue untouched when full.
    pub fn enqueue(&mut self, byte: u8) -> bool {
        if self.is_full() {
            return false;
        }
        self.slots[self.enqueue] = byte;
        self.enqueue = Self::next(self.enqueue);
        true
    }

    pub fn dequeue(&mut self) -> Option<u8> {
        if self.is_empty() {
            return None;
        }
        let byte = self.slots[self.dequeue];
        self.dequeue = Self::next(self.dequeue);
        Some(byte)
    }

    /// Zero the storage and reset both indices.
    pub fn clear(&mut self) {
        self.slots = [0; N];
        self.enqueue = 0;
        self.dequeue = 0;
    }

    #[cfg(test)]
    pub(crate) fn indices(&self) -> (usize, usize) {
        (self.enqueue, self.dequeue)
    }
}

impl<const N: usize> Default for ByteQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usable_capacity_is_one_less_than_slots() {
        let mut q = ByteQueue::<8>::new();
        assert_eq!(q.capacity(), 7);
        for i in 0..7 {
            assert!(q.enqueue(i));
        }
        assert!(q.is_full());
        assert_eq!(q.len(), 7);
    }

    #[test]
    fn enqueue_into_full_queue_fails_without_moving_indices() {
        let mut q = ByteQueue::<4>::new();
        assert!(q.enqueue(1));
        assert!(q.enqueue(2));
        assert!(q.enqueue(3));
        let before = q.indices();
        assert!(!q.enqueue(4));
        assert_eq!(q.indices(), before);
        assert_eq!(q.dequeue(), Some(1));
    }

    #[test]
    fn dequeue_from_empty_queue_returns_none_without_moving_indices() {
        let mut q = ByteQueue::<4>::new();
        let before = q.indices();
        assert_eq!(q.dequeue(), None);
        assert_eq!(q.indices(), before);

        assert!(q.enqueue(9));
        assert_eq!(q.dequeue(), Some(9));
        let drained = q.indices();
        assert_eq!(q.dequeue(), None);
        assert_eq!(q.indices(), drained);
    }

    #[test]
    fn k_enqueues_then_k_dequeues_leaves_queue_empty() {
        for k in 0..15 {
            let mut q = ByteQueue::<16>::new();
            // start from a rotated position so the run crosses the wrap point
            for _ in 0..11 {
                q.enqueue(0);
                q.dequeue();
            }
            for i in 0..k {
                assert!(q.enqueue(i as u8));
            }
            for i in 0..k {
                assert_eq!(q.dequeue(), Some(i as u8));
            }
            assert!(q.is_empty(), "k={k}");
            assert_eq!(q.len(), 0);
        }
    }

    #[test]
    fn len_tracks_wrapped_contents() {
        let mut q = ByteQueue::<5>::new();
        for b in 0..4 {
            q.enqueue(b);
        }
        q.dequeue();
        q.dequeue();
        q.enqueue(4);
        q.enqueue(5);
        assert_eq!(q.len(), 4);
        assert!(q.is_full());
        let out: Vec<u8> = core::iter::from_fn(|| q.dequeue()).collect();
        assert_eq!(out, vec![2, 3, 4, 5]);
    }

    #[test]
    fn clear_resets_indices() {
        let mut q = ByteQueue::<4>::new();
        q.enqueue(7);
        q.enqueue(8);
        q.dequeue();
        q.clear();
        assert!(q.is_empty());
        assert_eq!(q.indices(), (0, 0));
    }
}
