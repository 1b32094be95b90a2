//! Blocking queues.
//!
//! A family of thread-safe containers sharing one hand-off discipline:
//!
//! - [`Queue`]: unbounded multi-producer / multi-consumer FIFO with
//!   blocking `get`, timed `poll`, bulk put/take, and disposal.
//! - [`PriorityQueue`]: a binary min-heap behind the same waiter
//!   protocol (and its convenience entry type [`PriorityItem`]).
//! - [`RingBuffer`]: a fixed-capacity variant whose `put` blocks when
//!   full.
//!
//! Consumers that find nothing to take park themselves as *waiters*;
//! producers hand items directly to the oldest parked waiter and wait
//! for its acknowledgement before reporting success, which is what rules
//! out lost wake-ups and stranded items even when a waiter times out at
//! the worst possible moment. See [`waiter`] for the protocol itself.

mod fifo;
mod priority;
mod ring;
mod waiter;

pub use fifo::Queue;
pub use priority::{PriorityItem, PriorityQueue};
pub use ring::RingBuffer;

use thiserror::Error;

/// Failure kinds shared by the queue family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    /// The queue was disposed; it accepts and yields nothing further.
    #[error("queue has been disposed")]
    Disposed,
    /// The deadline elapsed before any item was handed off.
    #[error("timed out waiting for items")]
    Timeout,
    /// A non-waiting read found nothing.
    #[error("queue is empty")]
    Empty,
}
