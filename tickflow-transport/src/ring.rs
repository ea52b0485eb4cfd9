//! Bounded lock-free SPSC ring.

use std::cell::UnsafeCell;
use std::mem::{self, MaybeUninit};
use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_utils::CachePadded;

/// Bounded single-producer single-consumer ring buffer.
///
/// Capacity is fixed at construction and must be a power of two; one slot is
/// reserved to distinguish full from empty, so a ring of `n` slots holds
/// `n - 1` items. `head` and `tail` live on separate cache lines so the
/// producer and consumer do not invalidate each other's line on every
/// operation.
///
/// Contract: at most one task calls [`try_push`](SpscRing::try_push) and at
/// most one task calls [`try_pop`](SpscRing::try_pop) at any instant. The one
/// sanctioned exception is [`force_push`](SpscRing::force_push), which lets
/// the producer evict the oldest entry while a consumer may be popping
/// concurrently; `try_pop` advances `head` by compare-exchange so the two
/// sides cannot claim the same slot.
///
/// Ordering: a pushed item is written before the `tail` advance is released,
/// and popped slots are released via the `head` advance, so the consumer's
/// acquire of `tail` observes fully written payloads and the producer's
/// acquire of `head` only reuses slots the consumer is done with.
pub struct SpscRing<T> {
    buf: Box<[UnsafeCell<MaybeUninit<T>>]>,
    mask: usize,
    head: CachePadded<AtomicUsize>,
    tail: CachePadded<AtomicUsize>,
}

unsafe impl<T: Send> Send for SpscRing<T> {}
unsafe impl<T: Send> Sync for SpscRing<T> {}

impl<T> SpscRing<T> {
    /// Create a ring with `slots` slots (power of two, at least 2). Usable
    /// capacity is `slots - 1`.
    ///
    /// # Panics
    ///
    /// Panics if `slots` is not a power of two or is smaller than 2.
    pub fn with_capacity(slots: usize) -> Self {
        assert!(
            slots >= 2 && slots.is_power_of_two(),
            "ring size must be a power of two >= 2, got {slots}"
        );
        let buf = (0..slots)
            .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        SpscRing {
            buf,
            mask: slots - 1,
            head: CachePadded::new(AtomicUsize::new(0)),
            tail: CachePadded::new(AtomicUsize::new(0)),
        }
    }

    /// Enqueue `item`, or hand it back if the ring is full. Producer side
    /// only. Never blocks, never allocates.
    pub fn try_push(&self, item: T) -> Result<(), T> {
        let tail = self.tail.load(Ordering::Relaxed);
        let next = (tail + 1) & self.mask;
        if next == self.head.load(Ordering::Acquire) {
            return Err(item);
        }
        unsafe { (*self.buf[tail].get()).write(item) };
        self.tail.store(next, Ordering::Release);
        Ok(())
    }

    /// Dequeue the oldest item, or `None` if the ring is empty. Consumer side
    /// only (plus the producer inside `force_push`). Never blocks.
    pub fn try_pop(&self) -> Option<T> {
        loop {
            let head = self.head.load(Ordering::Relaxed);
            if head == self.tail.load(Ordering::Acquire) {
                return None;
            }
            // The slot cannot be rewritten while `head` still covers it (a
            // push into it would require `head` to have advanced past it
            // first), so this read is valid even if we lose the race below.
            let item = unsafe { (*self.buf[head].get()).assume_init_read() };
            match self.head.compare_exchange(
                head,
                (head + 1) & self.mask,
                Ordering::Release,
                Ordering::Relaxed,
            ) {
                Ok(_) => return Some(item),
                // Another popper claimed the slot; it owns the value now.
                Err(_) => mem::forget(item),
            }
        }
    }

    /// Enqueue `item`, evicting the oldest pending entry if the ring is full.
    /// Returns the evicted entry, if any. Producer side only; must not run
    /// concurrently with `try_push`.
    pub fn force_push(&self, item: T) -> Option<T> {
        let mut item = item;
        let mut evicted = None;
        loop {
            match self.try_push(item) {
                Ok(()) => return evicted,
                Err(back) => {
                    item = back;
                    // Popping one entry (here or by the consumer racing us)
                    // frees at least one slot, so the retry terminates.
                    if let Some(old) = self.try_pop() {
                        evicted = Some(old);
                    }
                }
            }
        }
    }

    /// Number of items currently enqueued. Advisory under concurrency, exact
    /// for the side that owns the next operation.
    pub fn len(&self) -> usize {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        tail.wrapping_sub(head) & self.mask
    }

    pub fn is_empty(&self) -> bool {
        self.head.load(Ordering::Acquire) == self.tail.load(Ordering::Acquire)
    }

    pub fn is_full(&self) -> bool {
        let tail = self.tail.load(Ordering::Acquire);
        let next = (tail + 1) & self.mask;
        next == self.head.load(Ordering::Acquire)
    }

    /// Maximum number of items the ring can hold.
    pub fn capacity(&self) -> usize {
        self.mask
    }
}

impl<T> Drop for SpscRing<T> {
    fn drop(&mut self) {
        while self.try_pop().is_some() {}
    }
}
