// src/spsc/shared.rs

use crate::internal::cache_padded::CachePadded;
use crate::strategy::{OverflowStrategy, WaitStrategy};

use core::marker::PhantomData;
use std::cell::UnsafeCell;
use std::fmt;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};

/// The producer's cache line: its own cursor plus a plain shadow of the
/// consumer's cursor. The shadow is read and written only by the producer
/// thread, so the fast path of `try_send` touches no line the consumer
/// writes.
pub(crate) struct ProducerSide {
  pub(crate) cursor: AtomicUsize,
  pub(crate) peer_cache: UnsafeCell<usize>,
}

/// The consumer's cache line, mirroring [`ProducerSide`].
pub(crate) struct ConsumerSide {
  pub(crate) cursor: AtomicUsize,
  pub(crate) peer_cache: UnsafeCell<usize>,
}

/// Shared state of a bounded SPSC ring channel.
///
/// `capacity` is a power of two and `mask = capacity - 1`, so cursors
/// advance with a bitwise AND instead of a modulo. Live elements occupy
/// `[recv, send)` modulo capacity; the ring is empty when the cursors are
/// equal and full when the send cursor is one slot behind the receive
/// cursor, which sacrifices one slot and makes the two conditions
/// unambiguous. Usable capacity is therefore `capacity - 1`.
///
/// Slots are raw storage: an element is written in place by the producer
/// and moved out by the consumer, never default-initialized.
pub(crate) struct RingShared<T, O, W> {
  pub(crate) buffer: Box<[UnsafeCell<MaybeUninit<T>>]>,
  pub(crate) capacity: usize,
  pub(crate) mask: usize,
  pub(crate) producer: CachePadded<ProducerSide>,
  pub(crate) consumer: CachePadded<ConsumerSide>,
  _strategies: PhantomData<(O, W)>,
}

unsafe impl<T: Send, O, W> Send for RingShared<T, O, W> {}
unsafe impl<T: Send, O, W> Sync for RingShared<T, O, W> {}

impl<T, O, W> fmt::Debug for RingShared<T, O, W> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("RingShared")
      .field("capacity", &self.capacity)
      .field("send_cursor", &self.producer.cursor.load(Ordering::Relaxed))
      .field("recv_cursor", &self.consumer.cursor.load(Ordering::Relaxed))
      .finish_non_exhaustive()
  }
}

impl<T, O, W> RingShared<T, O, W>
where
  O: OverflowStrategy,
  W: WaitStrategy,
{
  /// Allocates a ring whose capacity is the smallest power of two that can
  /// hold at least one element and is >= `requested`.
  pub(crate) fn new(requested: usize) -> Self {
    assert!(requested > 0, "SPSC channel capacity must be greater than 0");
    // One slot is sacrificed to the full/empty discriminator, so a
    // one-slot ring could never hold anything; 2 is the floor.
    let capacity = requested.next_power_of_two().max(2);
    let buffer = (0..capacity)
      .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
      .collect::<Vec<_>>()
      .into_boxed_slice();
    RingShared {
      buffer,
      capacity,
      mask: capacity - 1,
      producer: CachePadded::new(ProducerSide {
        cursor: AtomicUsize::new(0),
        peer_cache: UnsafeCell::new(0),
      }),
      consumer: CachePadded::new(ConsumerSide {
        cursor: AtomicUsize::new(0),
        peer_cache: UnsafeCell::new(0),
      }),
      _strategies: PhantomData,
    }
  }

  #[inline]
  fn slot(&self, index: usize) -> *mut MaybeUninit<T> {
    self.buffer[index].get()
  }

  /// Attempts to write `value` into the ring.
  ///
  /// Returns the value back when the ring is full and the overflow policy
  /// is to wait. Under [`OverwriteOnFull`](crate::strategy::OverwriteOnFull)
  /// a full ring reclaims its oldest unread slot instead, so this never
  /// fails.
  ///
  /// # Safety
  ///
  /// Must only be called from the single producer thread; the producer-side
  /// shadow cache is a plain cell with no synchronization of its own.
  pub(crate) unsafe fn try_send(&self, value: T) -> Result<(), T> {
    let send = self.producer.cursor.load(Ordering::Relaxed);
    let next = (send + 1) & self.mask;

    let cache = unsafe { &mut *self.producer.peer_cache.get() };
    if next == *cache {
      // Fast-path check says full; refresh the shadow before believing it.
      *cache = self.consumer.cursor.load(Ordering::Acquire);
      if next == *cache {
        if O::OVERWRITES {
          self.reclaim_oldest(cache);
        } else {
          return Err(value);
        }
      }
    }

    unsafe { (*self.slot(send)).write(value) };
    // Publishes the element: pairs with the consumer's acquire refresh.
    self.producer.cursor.store(next, Ordering::Release);
    W::notify(&self.producer.cursor);
    Ok(())
  }

  /// Frees one slot of a full ring by advancing the receive cursor over
  /// the oldest unread element and dropping it.
  ///
  /// The CAS against the consumer's own advance is the tie-break for a
  /// slot both sides want: exactly one of them wins it. Losing means the
  /// consumer just drained the slot, which also made room.
  #[cold]
  fn reclaim_oldest(&self, cache: &mut usize) {
    crate::telemetry::increment_counter("spsc::send", "overwrite_reclaim");
    let oldest = *cache;
    let bumped = (oldest + 1) & self.mask;
    match self.consumer.cursor.compare_exchange(
      oldest,
      bumped,
      Ordering::AcqRel,
      Ordering::Acquire,
    ) {
      Ok(_) => {
        // The slot is ours now; a consumer that raced us on it will see
        // the moved cursor, discard its read and report Overwritten.
        unsafe { (*self.slot(oldest)).assume_init_drop() };
        *cache = bumped;
      }
      Err(actual) => {
        // Consumer advanced first; the ring already has room.
        *cache = actual;
      }
    }
  }

  /// Attempts to move one element out of the ring.
  ///
  /// # Safety
  ///
  /// Must only be called from the single consumer thread.
  pub(crate) unsafe fn try_recv(&self) -> Result<T, RecvFailed> {
    // Under overwrite the producer may move this cursor; acquire makes its
    // drop of the reclaimed element visible before we touch the slot.
    let recv = if O::OVERWRITES {
      self.consumer.cursor.load(Ordering::Acquire)
    } else {
      self.consumer.cursor.load(Ordering::Relaxed)
    };

    let cache = unsafe { &mut *self.consumer.peer_cache.get() };
    if recv == *cache {
      *cache = self.producer.cursor.load(Ordering::Acquire);
      if recv == *cache {
        return Err(RecvFailed::Empty);
      }
    }

    let value = unsafe { (*self.slot(recv)).assume_init_read() };
    let next = (recv + 1) & self.mask;
    if O::OVERWRITES {
      // Claim the slot we just read. If the producer reclaimed it under
      // us, the bits we copied are its to drop, not ours to return.
      if self
        .consumer
        .cursor
        .compare_exchange(recv, next, Ordering::AcqRel, Ordering::Relaxed)
        .is_err()
      {
        std::mem::forget(value);
        crate::telemetry::increment_counter("spsc::recv", "overwrite_skip");
        return Err(RecvFailed::Overwritten);
      }
    } else {
      // Pairs with the producer's acquire refresh of its shadow.
      self.consumer.cursor.store(next, Ordering::Release);
    }
    W::notify(&self.consumer.cursor);
    Ok(value)
  }
}

/// Why a `try_recv` produced no element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RecvFailed {
  Empty,
  Overwritten,
}

impl<T, O, W> Drop for RingShared<T, O, W> {
  fn drop(&mut self) {
    // Runs when the last handle drops; `&mut self` means no concurrent
    // access, so plain cursor reads suffice. Every live element in
    // [recv, send) still owns a value and must be dropped here.
    let send = *self.producer.cursor.get_mut();
    let mut recv = *self.consumer.cursor.get_mut();
    while recv != send {
      unsafe { (*self.buffer[recv].get()).assume_init_drop() };
      recv = (recv + 1) & self.mask;
    }
  }
}
