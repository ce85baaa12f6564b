//! Bounded FIFO of outgoing messages.
//!
//! A fixed ring of slots indexed by `first`/`last` modulo capacity. Requests
//! wait here until the engine is free to transmit them; the head stays in
//! place while its reply is outstanding.

/// Fixed-capacity FIFO of owned, terminated request texts.
#[derive(Debug, Clone)]
pub struct MessageQueue {
    slots: Vec<Option<String>>,
    /// Index of the oldest entry.
    first: usize,
    /// Index the next push writes to.
    last: usize,
    count: usize,
}

impl MessageQueue {
    /// Create an empty queue holding at most `capacity` messages.
    pub fn new(capacity: usize) -> Self {
        MessageQueue {
            slots: vec![None; capacity],
            first: 0,
            last: 0,
            count: 0,
        }
    }

    /// Append a message.
    ///
    /// Returns `false` without touching the queue when it is full.
    pub fn push(&mut self, msg: String) -> bool {
        if self.count == self.slots.len() {
            return false;
        }
        self.slots[self.last] = Some(msg);
        self.last = (self.last + 1) % self.slots.len();
        self.count += 1;
        true
    }

    /// Oldest message, if any.
    pub fn peek(&self) -> Option<&str> {
        if self.count == 0 {
            return None;
        }
        self.slots[self.first].as_deref()
    }

    /// Remove and return the oldest message.
    pub fn pop(&mut self) -> Option<String> {
        if self.count == 0 {
            return None;
        }
        let msg = self.slots[self.first].take();
        self.first = (self.first + 1) % self.slots.len();
        self.count -= 1;
        msg
    }

    /// Drop every queued message.
    pub fn clear(&mut self) {
        while self.pop().is_some() {}
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_full(&self) -> bool {
        self.count == self.slots.len()
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut queue = MessageQueue::new(3);
        assert!(queue.push("a".to_string()));
        assert!(queue.push("b".to_string()));
        assert_eq!(queue.peek(), Some("a"));
        assert_eq!(queue.pop().as_deref(), Some("a"));
        assert_eq!(queue.pop().as_deref(), Some("b"));
        assert_eq!(queue.pop(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_push_when_full_is_rejected() {
        let mut queue = MessageQueue::new(2);
        assert!(queue.push("a".to_string()));
        assert!(queue.push("b".to_string()));
        assert!(queue.is_full());
        assert!(!queue.push("c".to_string()));

        // Rejected push left the contents alone.
        assert_eq!(queue.count(), 2);
        assert_eq!(queue.peek(), Some("a"));
    }

    #[test]
    fn test_wraps_around() {
        let mut queue = MessageQueue::new(2);
        for i in 0..5 {
            assert!(queue.push(i.to_string()));
            assert_eq!(queue.pop(), Some(i.to_string()));
        }
        assert!(queue.push("x".to_string()));
        assert!(queue.push("y".to_string()));
        assert_eq!(queue.peek(), Some("x"));
    }

    #[test]
    fn test_clear() {
        let mut queue = MessageQueue::new(4);
        queue.push("a".to_string());
        queue.push("b".to_string());
        queue.clear();
        assert_eq!(queue.count(), 0);
        assert_eq!(queue.peek(), None);
        assert!(queue.push("c".to_string()));
        assert_eq!(queue.peek(), Some("c"));
    }

    #[test]
    fn test_zero_capacity() {
        let mut queue = MessageQueue::new(0);
        assert!(!queue.push("a".to_string()));
        assert!(queue.is_empty());
    }
}
