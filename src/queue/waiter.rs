//! The producer-to-consumer hand-off primitive.
//!
//! A [`Waiter`] is a parked consumer: a one-shot slot the producer fills
//! with items, plus a response counter the consumer decrements once it
//! has taken them. The pairing gives both directions of the handshake:
//!
//! 1. producer fills the slot and signals `ready`;
//! 2. consumer takes the items and decrements the response;
//! 3. producer observes the decrement and only then reports success.
//!
//! The slot is also how timeouts stay race-free: a consumer whose
//! deadline passes *claims its own slot* (flips it to `Reclaimed`). A
//! producer finding a reclaimed slot skips that waiter silently, so no
//! item is ever parked with a consumer that already left. If the
//! producer's hand-off lands first, the claim fails and the consumer
//! honours the delivery instead of timing out.
//!
//! Producers run entirely under their queue's lock; the consumer side
//! only ever touches the waiter's own small mutex, so a parked consumer
//! holds no lock anybody else needs.

use std::mem;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use super::QueueError;

/// What the hand-off slot currently holds.
enum Slot<T> {
    /// Parked; nothing delivered yet.
    Pending,
    /// A producer delivered items.
    Handed(Vec<T>),
    /// The queue was disposed while the waiter was parked.
    Disposed,
    /// The consumer timed out and claimed the slot back.
    Reclaimed,
}

struct Inner<T> {
    slot: Slot<T>,
    /// Hand-offs not yet acknowledged by the consumer.
    response: u32,
}

/// A parked consumer. Created by the consumer, enqueued on the owning
/// queue's waiter list, and handed items by whichever producer pops it.
pub(crate) struct Waiter<T> {
    /// Most items the consumer asked for.
    want: usize,
    inner: Mutex<Inner<T>>,
    /// Wakes the consumer when the slot changes.
    ready: Condvar,
    /// Wakes the producer when the response counter drops.
    acked: Condvar,
}

impl<T> Waiter<T> {
    pub(crate) fn new(want: usize) -> Arc<Waiter<T>> {
        Arc::new(Waiter {
            want,
            inner: Mutex::new(Inner {
                slot: Slot::Pending,
                response: 0,
            }),
            ready: Condvar::new(),
            acked: Condvar::new(),
        })
    }

    /// Producer side. Attempt the non-blocking hand-off: when the slot
    /// is still open, `drain` is called with how many items to move
    /// (`min(want, available)`), the consumer is signalled, and the call
    /// blocks until the consumer acknowledges. Returns `false` without
    /// calling `drain` when the consumer already reclaimed the slot.
    ///
    /// The caller holds the queue lock across this entire call; that is
    /// what keeps the buffer, the waiter list, and the hand-off atomic
    /// with respect to other producers.
    pub(crate) fn hand_off(&self, available: usize, drain: impl FnOnce(usize) -> Vec<T>) -> bool {
        let mut inner = self.inner.lock();
        if !matches!(inner.slot, Slot::Pending) {
            return false;
        }

        inner.slot = Slot::Handed(drain(self.want.min(available)));
        inner.response += 1;
        self.ready.notify_one();
        while inner.response > 0 {
            self.acked.wait(&mut inner);
        }
        true
    }

    /// Dispose side: mark the slot disposed and wake the consumer. No
    /// acknowledgement is awaited; the consumer observes the state on
    /// its own time.
    pub(crate) fn release_disposed(&self) {
        let mut inner = self.inner.lock();
        if matches!(inner.slot, Slot::Pending) {
            inner.slot = Slot::Disposed;
            self.ready.notify_one();
        }
    }

    /// Consumer side: block until a hand-off or disposal.
    pub(crate) fn await_items(&self) -> Result<Vec<T>, QueueError> {
        let mut inner = self.inner.lock();
        loop {
            match mem::replace(&mut inner.slot, Slot::Pending) {
                Slot::Handed(items) => {
                    inner.response -= 1;
                    self.acked.notify_one();
                    return Ok(items);
                }
                Slot::Disposed => {
                    inner.slot = Slot::Disposed;
                    return Err(QueueError::Disposed);
                }
                Slot::Pending => self.ready.wait(&mut inner),
                Slot::Reclaimed => unreachable!("waiter used after reclaiming its slot"),
            }
        }
    }

    /// Consumer side with a deadline. `Err(Timeout)` means the claim
    /// won and the caller must deregister this waiter from its queue; a
    /// hand-off that beats the claim is honoured as a normal delivery.
    pub(crate) fn await_items_timed(&self, timeout: Duration) -> Result<Vec<T>, QueueError> {
        let deadline = Instant::now() + timeout;
        let mut inner = self.inner.lock();
        loop {
            match mem::replace(&mut inner.slot, Slot::Pending) {
                Slot::Handed(items) => {
                    inner.response -= 1;
                    self.acked.notify_one();
                    return Ok(items);
                }
                Slot::Disposed => {
                    inner.slot = Slot::Disposed;
                    return Err(QueueError::Disposed);
                }
                Slot::Pending => {
                    if self.ready.wait_until(&mut inner, deadline).timed_out()
                        && matches!(inner.slot, Slot::Pending)
                    {
                        inner.slot = Slot::Reclaimed;
                        return Err(QueueError::Timeout);
                    }
                    // Either a real wake-up, or the deadline lost the
                    // race to a producer: the next pass settles it.
                }
                Slot::Reclaimed => unreachable!("waiter used after reclaiming its slot"),
            }
        }
    }
}
