//! Blocking priority queue.
//!
//! A binary min-heap behind the same waiter protocol as the FIFO
//! [`Queue`](super::Queue): consumers block while the heap is empty and
//! producers hand the smallest items straight to the oldest waiter. The
//! heap is hand-rolled (sift-up on push, swap-pop sift-down on pop) so
//! `get(n)` can pop exactly as many items as it hands off.

use std::cmp::Ordering;
use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use super::waiter::Waiter;
use super::QueueError;

/// A `{ value, priority }` pair ordered by ascending priority, for
/// priority-queueing payloads that carry no order of their own. Equality
/// and ordering look at the priority only.
#[derive(Debug, Clone)]
pub struct PriorityItem<T> {
    pub value: T,
    pub priority: i64,
}

impl<T> PriorityItem<T> {
    pub fn new(value: T, priority: i64) -> PriorityItem<T> {
        PriorityItem { value, priority }
    }
}

impl<T> PartialEq for PriorityItem<T> {
    fn eq(&self, other: &PriorityItem<T>) -> bool {
        self.priority == other.priority
    }
}

impl<T> Eq for PriorityItem<T> {}

impl<T> PartialOrd for PriorityItem<T> {
    fn partial_cmp(&self, other: &PriorityItem<T>) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for PriorityItem<T> {
    fn cmp(&self, other: &PriorityItem<T>) -> Ordering {
        self.priority.cmp(&other.priority)
    }
}

/// Binary min-heap over a flat vector.
struct Heap<T> {
    items: Vec<T>,
}

impl<T: Ord> Heap<T> {
    fn with_capacity(hint: usize) -> Heap<T> {
        Heap {
            items: Vec::with_capacity(hint),
        }
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn peek(&self) -> Option<&T> {
        self.items.first()
    }

    fn contains_equal(&self, item: &T) -> bool {
        self.items.iter().any(|held| held.cmp(item) == Ordering::Equal)
    }

    fn push(&mut self, item: T) {
        self.items.push(item);
        let mut index = self.items.len() - 1;
        while index > 0 {
            let parent = (index - 1) / 2;
            if self.items[parent] <= self.items[index] {
                break;
            }
            self.items.swap(parent, index);
            index = parent;
        }
    }

    fn pop(&mut self) -> Option<T> {
        if self.items.is_empty() {
            return None;
        }
        let last = self.items.len() - 1;
        self.items.swap(0, last);
        let item = self.items.pop();

        let mut index = 0;
        loop {
            let left = 2 * index + 1;
            let right = 2 * index + 2;
            if left >= self.items.len() {
                break;
            }
            let mut child = left;
            if right < self.items.len() && self.items[right] < self.items[left] {
                child = right;
            }
            if self.items[child] >= self.items[index] {
                break;
            }
            self.items.swap(index, child);
            index = child;
        }
        item
    }

    /// Pop up to `number` items in heap order.
    fn take(&mut self, number: usize) -> Vec<T> {
        let mut taken = Vec::with_capacity(number.min(self.items.len()));
        for _ in 0..number {
            match self.pop() {
                Some(item) => taken.push(item),
                None => break,
            }
        }
        taken
    }
}

struct Shared<T> {
    heap: Heap<T>,
    waiters: VecDeque<Arc<Waiter<T>>>,
    disposed: bool,
}

/// A blocking min-priority queue: `get` returns the smallest items and
/// blocks while the queue is empty.
pub struct PriorityQueue<T> {
    shared: Mutex<Shared<T>>,
    allow_duplicates: bool,
}

impl<T: Ord> PriorityQueue<T> {
    /// Create a queue preallocated for `hint` items. With
    /// `allow_duplicates` off, `put` drops items comparing equal to an
    /// item already held.
    pub fn new(hint: usize, allow_duplicates: bool) -> PriorityQueue<T> {
        PriorityQueue {
            shared: Mutex::new(Shared {
                heap: Heap::with_capacity(hint),
                waiters: VecDeque::new(),
                disposed: false,
            }),
            allow_duplicates,
        }
    }

    /// Add items in priority order, then hand off to parked waiters
    /// oldest-first. Empty input is a no-op.
    pub fn put(&self, items: impl IntoIterator<Item = T>) -> Result<(), QueueError> {
        let items: Vec<T> = items.into_iter().collect();
        if items.is_empty() {
            return Ok(());
        }

        let mut shared = self.shared.lock();
        if shared.disposed {
            return Err(QueueError::Disposed);
        }

        for item in items {
            if !self.allow_duplicates && shared.heap.contains_equal(&item) {
                continue;
            }
            shared.heap.push(item);
        }

        while !shared.heap.is_empty() {
            let Some(waiter) = shared.waiters.pop_front() else {
                break;
            };
            let available = shared.heap.len();
            let heap = &mut shared.heap;
            waiter.hand_off(available, |count| heap.take(count));
        }
        Ok(())
    }

    /// Take up to `number` items in ascending order, blocking while the
    /// queue is empty. `number == 0` returns an empty vector.
    pub fn get(&self, number: usize) -> Result<Vec<T>, QueueError> {
        if number == 0 {
            return Ok(Vec::new());
        }

        let waiter = {
            let mut shared = self.shared.lock();
            if shared.disposed {
                return Err(QueueError::Disposed);
            }
            if !shared.heap.is_empty() {
                return Ok(shared.heap.take(number));
            }
            let waiter = Waiter::new(number);
            shared.waiters.push_back(Arc::clone(&waiter));
            waiter
        };

        waiter.await_items()
    }

    /// The smallest item by value, without removing it.
    pub fn peek(&self) -> Result<T, QueueError>
    where
        T: Clone,
    {
        let shared = self.shared.lock();
        if shared.disposed {
            return Err(QueueError::Disposed);
        }
        shared.heap.peek().cloned().ok_or(QueueError::Empty)
    }

    pub fn len(&self) -> usize {
        self.shared.lock().heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.lock().heap.is_empty()
    }

    pub fn is_disposed(&self) -> bool {
        self.shared.lock().disposed
    }

    /// Mark the queue disposed and release every parked waiter. Later
    /// operations observe `Disposed`.
    pub fn dispose(&self) {
        let mut shared = self.shared.lock();
        shared.disposed = true;
        for waiter in shared.waiters.drain(..) {
            waiter.release_disposed();
        }
        shared.heap.items.clear();
    }
}
