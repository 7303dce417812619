use std::collections::VecDeque;
use std::sync::{Arc, RwLock};

/// Bounded FIFO.  Pushes never block: a full queue hands the value back.
#[derive(Debug)]
pub struct BoundedQueue<T> {
    storage: VecDeque<T>,
    max_size: usize,
}

impl<T> BoundedQueue<T> {
    pub fn new(max_size: usize) -> Self {
        assert!(max_size > 0, "queue capacity must be > 0");
        Self {
            storage: VecDeque::with_capacity(max_size),
            max_size,
        }
    }

    pub fn try_enq(&mut self, data: T) -> Result<(), T> {
        if self.is_full() {
            return Err(data);
        }
        self.storage.push_back(data);
        Ok(())
    }

    pub fn try_deq(&mut self) -> Option<T> {
        self.storage.pop_front()
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.storage.len() >= self.max_size
    }

    pub fn capacity(&self) -> usize {
        self.max_size
    }

    pub fn clear(&mut self) {
        self.storage.clear();
    }
}

/// Shared handle to a bounded queue linking a producer and a consumer.  Newtype so the
/// ingress/egress vocabulary lives on the reference type.
// RwLock because neither side knows when the other one touches the queue.
#[derive(Debug)]
pub struct QueueRef<T>(Arc<RwLock<BoundedQueue<T>>>);

impl<T> Clone for QueueRef<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> QueueRef<T> {
    pub fn bounded(capacity: usize) -> Self {
        Self(Arc::new(RwLock::new(BoundedQueue::new(capacity))))
    }

    /// Number of entries ready to be popped.
    pub fn available(&self) -> usize {
        self.0.read().expect("rw lock poisoned").len()
    }

    pub fn is_full(&self) -> bool {
        self.0.read().expect("rw lock poisoned").is_full()
    }

    pub fn capacity(&self) -> usize {
        self.0.read().expect("rw lock poisoned").capacity()
    }

    /// Non-blocking push.  Returns the value back if the queue is full.
    pub fn try_push(&self, data: T) -> Result<(), T> {
        self.0.write().expect("rw lock poisoned").try_enq(data)
    }

    /// Non-blocking pop.  Returns None if nothing is available.
    pub fn pop(&self) -> Option<T> {
        self.0.write().expect("rw lock poisoned").try_deq()
    }

    pub fn clear(&self) {
        self.0.write().expect("rw lock poisoned").clear();
    }

    /// Whether both handles refer to the same underlying queue.
    pub fn same_queue(&self, other: &QueueRef<T>) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
