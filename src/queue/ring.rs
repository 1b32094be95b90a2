//! Bounded blocking ring buffer.
//!
//! The fixed-capacity member of the queue family: `put` blocks while
//! the ring is full (use `offer` to refuse instead), `get` blocks while
//! it is empty, and `dispose` unblocks everyone. Capacity is rounded up
//! to the next power of two so slot addressing is a mask of the
//! monotonically increasing head and tail counters.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use super::QueueError;

struct Shared<T> {
    slots: Box<[Option<T>]>,
    /// Next position to read; only ever increases.
    head: usize,
    /// Next position to write; only ever increases.
    tail: usize,
    disposed: bool,
}

/// A fixed-capacity MPMC queue with blocking put and get.
pub struct RingBuffer<T> {
    shared: Mutex<Shared<T>>,
    not_full: Condvar,
    not_empty: Condvar,
    cap: usize,
    mask: usize,
}

impl<T> RingBuffer<T> {
    /// Create a ring holding at least `capacity` items; the real
    /// capacity is the next power of two.
    pub fn new(capacity: usize) -> RingBuffer<T> {
        let cap = capacity.next_power_of_two().max(1);
        let mut slots = Vec::with_capacity(cap);
        slots.resize_with(cap, || None);
        RingBuffer {
            shared: Mutex::new(Shared {
                slots: slots.into_boxed_slice(),
                head: 0,
                tail: 0,
                disposed: false,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            cap,
            mask: cap - 1,
        }
    }

    /// Append one item, blocking while the ring is full.
    pub fn put(&self, item: T) -> Result<(), QueueError> {
        let mut shared = self.shared.lock();
        while !shared.disposed && shared.tail - shared.head == self.cap {
            self.not_full.wait(&mut shared);
        }
        if shared.disposed {
            return Err(QueueError::Disposed);
        }

        let at = shared.tail & self.mask;
        shared.slots[at] = Some(item);
        shared.tail += 1;
        self.not_empty.notify_one();
        Ok(())
    }

    /// Append one item without blocking; `Ok(false)` when full.
    pub fn offer(&self, item: T) -> Result<bool, QueueError> {
        let mut shared = self.shared.lock();
        if shared.disposed {
            return Err(QueueError::Disposed);
        }
        if shared.tail - shared.head == self.cap {
            return Ok(false);
        }

        let at = shared.tail & self.mask;
        shared.slots[at] = Some(item);
        shared.tail += 1;
        self.not_empty.notify_one();
        Ok(true)
    }

    /// Take the oldest item, blocking while the ring is empty.
    pub fn get(&self) -> Result<T, QueueError> {
        self.poll_inner(None)
    }

    /// Like [`get`], but gives up with `Timeout` after `timeout`. A zero
    /// timeout blocks indefinitely.
    ///
    /// [`get`]: RingBuffer::get
    pub fn poll(&self, timeout: Duration) -> Result<T, QueueError> {
        if timeout.is_zero() {
            return self.poll_inner(None);
        }
        self.poll_inner(Some(Instant::now() + timeout))
    }

    fn poll_inner(&self, deadline: Option<Instant>) -> Result<T, QueueError> {
        let mut shared = self.shared.lock();
        loop {
            if shared.disposed {
                return Err(QueueError::Disposed);
            }
            if shared.tail != shared.head {
                let at = shared.head & self.mask;
                let item = shared.slots[at].take().expect("occupied ring slot");
                shared.head += 1;
                self.not_full.notify_one();
                return Ok(item);
            }

            match deadline {
                Some(deadline) => {
                    if self.not_empty.wait_until(&mut shared, deadline).timed_out()
                        && shared.tail == shared.head
                        && !shared.disposed
                    {
                        return Err(QueueError::Timeout);
                    }
                }
                None => self.not_empty.wait(&mut shared),
            }
        }
    }

    /// Total slots available.
    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn len(&self) -> usize {
        let shared = self.shared.lock();
        shared.tail - shared.head
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() == self.cap
    }

    pub fn is_disposed(&self) -> bool {
        self.shared.lock().disposed
    }

    /// Mark the ring disposed, drop its contents, and unblock every
    /// waiting producer and consumer.
    pub fn dispose(&self) {
        let mut shared = self.shared.lock();
        shared.disposed = true;
        for slot in shared.slots.iter_mut() {
            *slot = None;
        }
        shared.head = 0;
        shared.tail = 0;
        self.not_full.notify_all();
        self.not_empty.notify_all();
    }
}
