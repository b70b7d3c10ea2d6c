//! Lock-Free Observation Event Channel
#![allow(unsafe_code)] // Required for the atomic ring buffer
//!
//! ## Overview
//!
//! Discovery callbacks arrive from the radio subsystem's interrupt context
//! while the window pipeline runs in a normal task. This module bridges the
//! two with a bounded, lock-free single-producer/single-consumer ring of
//! [`BeaconEvent`]s: the callback pushes, the pipeline drains at its own
//! pace, and neither side ever blocks.
//!
//! Routing every observation through the queue is what gives the
//! accumulators their single-threaded view - by the time an event reaches
//! [`WindowAggregator::ingest`](crate::aggregator::WindowAggregator::ingest)
//! it is owned by the consumer task, so no accumulator needs interior
//! synchronization.
//!
//! ## Algorithm
//!
//! A ring buffer with atomic head/tail indices:
//!
//! ```text
//! ┌─────┬─────┬─────┬─────┬─────┬─────┬─────┬─────┐
//! │  0  │  1  │  2  │  3  │  4  │  5  │  6  │  7  │
//! └─────┴─────┴─────┴─────┴─────┴─────┴─────┴─────┘
//!          ↑                       ↑
//!        tail (next read)        head (next write)
//! ```
//!
//! The producer writes at `head` and publishes with a Release store; the
//! consumer reads at `tail` after an Acquire load, so the event payload is
//! fully visible before the slot is claimed. One slot is sacrificed to
//! distinguish full from empty. Capacity must be a power of two so the
//! wrap is a mask, not a division; this is enforced at compile time.
//!
//! ## Overflow
//!
//! A full queue drops the *incoming* event and counts it in
//! [`QueueStats::dropped`] - the same newest-loses policy the accumulators
//! apply, and the only sane choice in an interrupt context that must not
//! wait.

use core::cell::UnsafeCell;
use core::mem::MaybeUninit;
use core::ptr;
use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use crate::events::BeaconEvent;

/// Default queue capacity (events). At roughly 350 bytes per event a
/// 64-slot ring costs ~22 KB of static RAM.
pub const EVENT_QUEUE_CAPACITY: usize = 64;

/// Queue health counters, updated with relaxed ordering (they never affect
/// correctness).
#[derive(Debug)]
pub struct QueueStats {
    /// Total events pushed.
    pub pushed: AtomicU32,
    /// Total events popped.
    pub popped: AtomicU32,
    /// Events dropped because the queue was full.
    pub dropped: AtomicU32,
}

impl QueueStats {
    const fn new() -> Self {
        Self {
            pushed: AtomicU32::new(0),
            popped: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
        }
    }
}

/// Bounded lock-free SPSC ring of discovery events.
///
/// Usable in a static context:
///
/// ```rust
/// use envsense_core::queue::{EventQueue, EVENT_QUEUE_CAPACITY};
///
/// static SCAN_QUEUE: EventQueue<EVENT_QUEUE_CAPACITY> = EventQueue::new();
/// ```
///
/// ## Safety contract
///
/// Exactly one context may call [`push`](Self::push) and exactly one may
/// call [`pop`](Self::pop)/[`drain`](Self::drain). The scanning
/// collaborator guarantees no further callbacks after its stop
/// acknowledgment, which is what makes the end-of-window drain complete.
pub struct EventQueue<const N: usize> {
    /// Ring storage; slots outside [tail, head) are uninitialized
    buffer: UnsafeCell<[MaybeUninit<BeaconEvent>; N]>,
    /// Next write position (producer owned)
    head: AtomicUsize,
    /// Next read position (consumer owned)
    tail: AtomicUsize,
    stats: QueueStats,
}

impl<const N: usize> EventQueue<N> {
    const CAPACITY_IS_POWER_OF_TWO: () =
        assert!(N.is_power_of_two(), "queue capacity must be a power of two");

    /// Create a new empty queue. `const`, so it works as a `static`.
    pub const fn new() -> Self {
        let _ = Self::CAPACITY_IS_POWER_OF_TWO;
        Self {
            // An array of MaybeUninit needs no initialization
            buffer: UnsafeCell::new(unsafe { MaybeUninit::uninit().assume_init() }),
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            stats: QueueStats::new(),
        }
    }

    /// Push an event (producer side only).
    ///
    /// Returns `false` and counts a drop when the queue is full.
    pub fn push(&self, event: BeaconEvent) -> bool {
        let head = self.head.load(Ordering::Acquire);
        let next_head = (head + 1) & (N - 1);

        if next_head == self.tail.load(Ordering::Acquire) {
            self.stats.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        // Sole producer: the slot at head is ours until the Release store
        unsafe {
            let buffer = &mut *self.buffer.get();
            buffer[head].write(event);
        }

        self.head.store(next_head, Ordering::Release);
        self.stats.pushed.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Pop the oldest event (consumer side only).
    pub fn pop(&self) -> Option<BeaconEvent> {
        let tail = self.tail.load(Ordering::Acquire);
        if tail == self.head.load(Ordering::Acquire) {
            return None;
        }

        // Sole consumer: the slot at tail holds a published event
        let event = unsafe {
            let buffer = &*self.buffer.get();
            ptr::read(buffer[tail].as_ptr())
        };

        self.tail.store((tail + 1) & (N - 1), Ordering::Release);
        self.stats.popped.fetch_add(1, Ordering::Relaxed);
        Some(event)
    }

    /// Number of queued events.
    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        if head >= tail {
            head - tail
        } else {
            N - tail + head
        }
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.head.load(Ordering::Acquire) == self.tail.load(Ordering::Acquire)
    }

    /// Whether the next push would drop.
    pub fn is_full(&self) -> bool {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        ((head + 1) & (N - 1)) == tail
    }

    /// Health counters.
    pub fn stats(&self) -> &QueueStats {
        &self.stats
    }

    /// Consume all currently queued events (consumer side only).
    pub fn drain(&self) -> QueueDrain<'_, N> {
        QueueDrain { queue: self }
    }
}

// The ring handles cross-context synchronization itself
unsafe impl<const N: usize> Send for EventQueue<N> {}
unsafe impl<const N: usize> Sync for EventQueue<N> {}

/// Draining iterator returned by [`EventQueue::drain`].
pub struct QueueDrain<'a, const N: usize> {
    queue: &'a EventQueue<N>,
}

impl<'a, const N: usize> Iterator for QueueDrain<'a, N> {
    type Item = BeaconEvent;

    fn next(&mut self) -> Option<Self::Item> {
        self.queue.pop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::DeviceId;

    fn event(addr: &str, ticks: u32) -> BeaconEvent {
        BeaconEvent::new(DeviceId::new(addr).unwrap(), -40, ticks)
    }

    #[test]
    fn push_pop_round_trip() {
        let queue = EventQueue::<16>::new();
        assert!(queue.push(event("A", 100)));
        assert_eq!(queue.len(), 1);

        let popped = queue.pop().unwrap();
        assert_eq!(popped.device.as_str(), "A");
        assert_eq!(popped.timestamp, 100);
        assert!(queue.is_empty());
        assert!(queue.pop().is_none());
    }

    #[test]
    fn full_queue_drops_newest() {
        let queue = EventQueue::<4>::new();
        // One slot is sacrificed, so capacity is 3
        for i in 0..3 {
            assert!(queue.push(event("A", i)));
        }
        assert!(queue.is_full());
        assert!(!queue.push(event("A", 99)));
        assert_eq!(queue.stats().dropped.load(Ordering::Relaxed), 1);

        // The retained events are the oldest ones
        assert_eq!(queue.pop().unwrap().timestamp, 0);
    }

    #[test]
    fn drain_preserves_order() {
        let queue = EventQueue::<8>::new();
        for i in 0..5 {
            queue.push(event("A", i));
        }

        let timestamps: heapless::Vec<u32, 8> =
            queue.drain().map(|event| event.timestamp).collect();
        assert_eq!(timestamps.as_slice(), &[0, 1, 2, 3, 4]);
        assert!(queue.is_empty());
    }

    #[test]
    fn wraps_around() {
        let queue = EventQueue::<4>::new();
        for round in 0..10u32 {
            assert!(queue.push(event("A", round)));
            assert_eq!(queue.pop().unwrap().timestamp, round);
        }
        assert_eq!(queue.stats().pushed.load(Ordering::Relaxed), 10);
        assert_eq!(queue.stats().popped.load(Ordering::Relaxed), 10);
    }
}
