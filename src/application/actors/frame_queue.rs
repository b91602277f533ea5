use std::collections::VecDeque;

/// Bounded FIFO that evicts the oldest entry when full
#[derive(Debug)]
pub struct FrameQueue<T> {
    items: VecDeque<T>,
    capacity: usize,
    dropped: u64,
}

impl<T> FrameQueue<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
            dropped: 0,
        }
    }

    /// Enqueue `item`, returning the evicted oldest entry if the queue was full
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() >= self.capacity {
            self.dropped += 1;
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    pub fn pop(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total entries evicted since creation
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut queue = FrameQueue::new(4);
        queue.push(1);
        queue.push(2);
        assert_eq!(queue.pop(), Some(1));
        assert_eq!(queue.pop(), Some(2));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_drops_oldest_at_capacity() {
        let mut queue = FrameQueue::new(3);
        for i in 0..3 {
            assert_eq!(queue.push(i), None);
        }
        assert_eq!(queue.push(3), Some(0));
        assert_eq!(queue.push(4), Some(1));
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.dropped(), 2);

        let drained: Vec<i32> = std::iter::from_fn(|| queue.pop()).collect();
        assert_eq!(drained, vec![2, 3, 4]);
    }

    #[test]
    fn test_zero_capacity_is_one() {
        let mut queue = FrameQueue::new(0);
        queue.push("a");
        assert_eq!(queue.push("b"), Some("a"));
        assert_eq!(queue.len(), 1);
    }
}
