//! Unbounded blocking FIFO.
//!
//! Producers never block on capacity; consumers block (or time out)
//! when the queue is empty. One mutex guards both the item buffer and
//! the ordered list of parked waiters, and is held across the whole
//! hand-off attempt, so items are either visible in the buffer or
//! already acknowledged by a waiter by the time `put` returns.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use super::waiter::Waiter;
use super::QueueError;

struct Shared<T> {
    items: VecDeque<T>,
    waiters: VecDeque<Arc<Waiter<T>>>,
    disposed: bool,
}

/// An unbounded multi-producer / multi-consumer FIFO with blocking
/// `get`, timed `poll`, and disposal.
pub struct Queue<T> {
    shared: Mutex<Shared<T>>,
}

impl<T> Queue<T> {
    /// Create a queue whose buffer is preallocated for `hint` items.
    pub fn new(hint: usize) -> Queue<T> {
        Queue {
            shared: Mutex::new(Shared {
                items: VecDeque::with_capacity(hint),
                waiters: VecDeque::new(),
                disposed: false,
            }),
        }
    }

    /// Append items in input order, then hand off to parked waiters
    /// oldest-first. Empty input is a no-op. Returns `Disposed` once the
    /// queue has been disposed.
    pub fn put(&self, items: impl IntoIterator<Item = T>) -> Result<(), QueueError> {
        let items: Vec<T> = items.into_iter().collect();
        if items.is_empty() {
            return Ok(());
        }

        let mut shared = self.shared.lock();
        if shared.disposed {
            return Err(QueueError::Disposed);
        }

        shared.items.extend(items);
        while !shared.items.is_empty() {
            let Some(waiter) = shared.waiters.pop_front() else {
                break;
            };
            // A waiter that timed out in the meantime is skipped
            // silently; its items stay for the next taker.
            let available = shared.items.len();
            let buffer = &mut shared.items;
            waiter.hand_off(available, |count| buffer.drain(..count).collect());
        }
        Ok(())
    }

    /// Take up to `number` items, blocking while the queue is empty.
    /// `number == 0` returns an empty vector immediately.
    pub fn get(&self, number: usize) -> Result<Vec<T>, QueueError> {
        self.poll_inner(number, None)
    }

    /// Like [`get`], but gives up with `Timeout` once `timeout` has
    /// elapsed. A zero timeout blocks indefinitely, identical to `get`.
    ///
    /// [`get`]: Queue::get
    pub fn poll(&self, number: usize, timeout: Duration) -> Result<Vec<T>, QueueError> {
        self.poll_inner(number, Some(timeout))
    }

    fn poll_inner(&self, number: usize, timeout: Option<Duration>) -> Result<Vec<T>, QueueError> {
        if number == 0 {
            return Ok(Vec::new());
        }

        let waiter = {
            let mut shared = self.shared.lock();
            if shared.disposed {
                return Err(QueueError::Disposed);
            }
            if !shared.items.is_empty() {
                let count = number.min(shared.items.len());
                return Ok(shared.items.drain(..count).collect());
            }
            let waiter = Waiter::new(number);
            shared.waiters.push_back(Arc::clone(&waiter));
            waiter
        };

        let outcome = match timeout {
            Some(timeout) if !timeout.is_zero() => waiter.await_items_timed(timeout),
            _ => waiter.await_items(),
        };
        if matches!(outcome, Err(QueueError::Timeout)) {
            // The reclaim won: nobody will hand to this waiter anymore,
            // so drop it from the queue's list as well.
            let mut shared = self.shared.lock();
            shared.waiters.retain(|parked| !Arc::ptr_eq(parked, &waiter));
        }
        outcome
    }

    /// The head item by value, without removing it.
    pub fn peek(&self) -> Result<T, QueueError>
    where
        T: Clone,
    {
        let shared = self.shared.lock();
        if shared.disposed {
            return Err(QueueError::Disposed);
        }
        shared.items.front().cloned().ok_or(QueueError::Empty)
    }

    /// Take the longest prefix for which `pred` holds. Never blocks;
    /// an empty queue yields an empty vector.
    pub fn take_until(&self, mut pred: impl FnMut(&T) -> bool) -> Result<Vec<T>, QueueError> {
        let mut shared = self.shared.lock();
        if shared.disposed {
            return Err(QueueError::Disposed);
        }
        let count = shared.items.iter().take_while(|item| pred(item)).count();
        Ok(shared.items.drain(..count).collect())
    }

    pub fn len(&self) -> usize {
        self.shared.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.lock().items.is_empty()
    }

    pub fn is_disposed(&self) -> bool {
        self.shared.lock().disposed
    }

    /// Mark the queue disposed, release every parked waiter, and return
    /// whatever was buffered. All later operations observe `Disposed`.
    pub fn dispose(&self) -> Vec<T> {
        let mut shared = self.shared.lock();
        shared.disposed = true;
        for waiter in shared.waiters.drain(..) {
            waiter.release_disposed();
        }
        shared.items.drain(..).collect()
    }

    /// Apply `work` to every buffered item from `max(1, cores - 1)`
    /// worker threads pulling indices off a shared counter, then dispose
    /// the queue. The queue lock is held while the workers run and
    /// released before disposal. An empty queue is left undisposed.
    pub fn execute_in_parallel<F>(&self, work: F)
    where
        T: Sync,
        F: Fn(&T) + Sync,
    {
        let shared = self.shared.lock();
        let todo = shared.items.len();
        if todo == 0 {
            return;
        }

        let workers = thread::available_parallelism()
            .map(|cores| cores.get())
            .unwrap_or(1);
        let workers = if workers > 1 { workers - 1 } else { 1 };

        let next = AtomicUsize::new(0);
        let items = &shared.items;
        thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| loop {
                    let index = next.fetch_add(1, Ordering::Relaxed);
                    if index >= todo {
                        break;
                    }
                    work(&items[index]);
                });
            }
        });

        drop(shared);
        self.dispose();
    }
}
