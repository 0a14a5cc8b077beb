// src/spsc/mod.rs

//! Bounded single-producer, single-consumer channels.
//!
//! One thread sends, one thread receives, values arrive strictly in FIFO
//! order. The ring behind the channel has a power-of-two capacity and two
//! cursors, each padded onto its own cache line together with a plain
//! shadow of the peer's cursor. On the steady-state hot path a send or
//! receive touches only its own line; the shadow is refreshed with an
//! acquire load of the peer cursor only when the fast-path check claims the
//! ring is full (or empty), which is the micro-optimization that keeps
//! cache lines from bouncing between cores.
//!
//! Two type parameters configure a channel at compile time:
//!
//! - the overflow strategy: [`WaitOnFull`](crate::strategy::WaitOnFull)
//!   (a full ring rejects/blocks the producer) or
//!   [`OverwriteOnFull`](crate::strategy::OverwriteOnFull) (a full ring
//!   drops its oldest unread element; the producer never waits),
//! - the wait strategy: [`Spin`](crate::strategy::Spin),
//!   [`Yield`](crate::strategy::Yield) or
//!   [`AtomicWait`](crate::strategy::AtomicWait), used by the blocking
//!   `send`/`recv` between retries.
//!
//! Dropping the sender is not signalled to the consumer: remaining elements
//! can still be drained, but a blocking `recv` on an empty ring whose
//! producer is gone waits forever. Callers that need shutdown should agree
//! on a sentinel value or stick to `try_recv`.
//!
//! # Example
//!
//! ```
//! use filament::spsc;
//! use filament::strategy::{Spin, WaitOnFull};
//! use std::thread;
//!
//! let (mut tx, mut rx) = spsc::channel::<String, WaitOnFull, Spin>(8);
//!
//! let producer = thread::spawn(move || {
//!   for i in 0..3 {
//!     tx.send(format!("item {i}"));
//!   }
//! });
//!
//! for i in 0..3 {
//!   assert_eq!(rx.recv(), format!("item {i}"));
//! }
//! producer.join().unwrap();
//! ```

mod shared;

use crate::arc::Arc;
use crate::error::{TryRecvError, TrySendError};
use crate::strategy::{OverflowStrategy, Spin, WaitOnFull, WaitStrategy};
use crate::telemetry;
use self::shared::{RecvFailed, RingShared};

use core::marker::PhantomData;
use std::fmt;
use std::sync::atomic::Ordering;

/// Creates a bounded SPSC channel.
///
/// `capacity` is a lower bound: the ring is sized to the next power of two
/// (at least 2), of which one slot is reserved, so up to
/// `capacity.next_power_of_two() - 1` elements can be in flight. Check
/// [`Sender::capacity`] for the exact figure.
///
/// # Panics
///
/// Panics if `capacity` is zero, or if `O` is
/// [`OverwriteOnFull`](crate::strategy::OverwriteOnFull) combined with any
/// wait strategy other than [`Spin`](crate::strategy::Spin); parking on a
/// cursor the producer itself keeps moving cannot work.
pub fn channel<T, O, W>(capacity: usize) -> (Sender<T, O, W>, Receiver<T, O, W>)
where
  O: OverflowStrategy,
  W: WaitStrategy,
{
  assert!(
    !O::OVERWRITES || W::IS_SPIN,
    "OverwriteOnFull requires the Spin wait strategy"
  );
  let shared = Arc::new(RingShared::new(capacity));
  (
    Sender {
      shared: shared.clone(),
      _not_sync: PhantomData,
    },
    Receiver {
      shared,
      _not_sync: PhantomData,
    },
  )
}

/// The sending half of a bounded SPSC channel.
///
/// Move-only: exactly one thread may own and use it at a time. All
/// operations take `&mut self`, so even a leaked reference cannot introduce
/// a second producer.
pub struct Sender<T, O = WaitOnFull, W = Spin> {
  shared: Arc<RingShared<T, O, W>>,
  _not_sync: PhantomData<*mut ()>,
}

/// The receiving half of a bounded SPSC channel.
pub struct Receiver<T, O = WaitOnFull, W = Spin> {
  shared: Arc<RingShared<T, O, W>>,
  _not_sync: PhantomData<*mut ()>,
}

unsafe impl<T: Send, O, W> Send for Sender<T, O, W> {}
unsafe impl<T: Send, O, W> Send for Receiver<T, O, W> {}

impl<T, O, W> fmt::Debug for Sender<T, O, W> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Sender").field("shared", &*self.shared).finish()
  }
}

impl<T, O, W> fmt::Debug for Receiver<T, O, W> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Receiver").field("shared", &*self.shared).finish()
  }
}

impl<T, O, W> Sender<T, O, W>
where
  O: OverflowStrategy,
  W: WaitStrategy,
{
  /// Attempts to send without blocking.
  ///
  /// Fails with [`TrySendError::Full`] only under
  /// [`WaitOnFull`](crate::strategy::WaitOnFull); an overwrite channel
  /// makes room by discarding its oldest unread element and always
  /// succeeds.
  #[inline]
  pub fn try_send(&mut self, value: T) -> Result<(), TrySendError<T>> {
    // Safety: `&mut self` on a move-only handle makes this thread the
    // single producer.
    unsafe { self.shared.try_send(value) }.map_err(TrySendError::Full)
  }

  /// Sends, blocking under the channel's wait strategy while the ring is
  /// full. Never fails.
  pub fn send(&mut self, value: T) {
    let mut value = value;
    loop {
      match self.try_send(value) {
        Ok(()) => return,
        Err(TrySendError::Full(v)) => {
          value = v;
          telemetry::increment_counter("spsc::send", "retry_full");
          // Stuck while the consumer cursor still equals `next`; park on
          // it so the consumer's release store (plus notify) wakes us.
          let next = (self.shared.producer.cursor.load(Ordering::Relaxed) + 1) & self.shared.mask;
          W::wait(&self.shared.consumer.cursor, next);
        }
        Err(TrySendError::Sent(_)) => unreachable!("SPSC try_send cannot report Sent"),
      }
    }
  }

  /// Maximum number of elements that can be in flight at once.
  pub fn capacity(&self) -> usize {
    self.shared.capacity - 1
  }
}

impl<T, O, W> Receiver<T, O, W>
where
  O: OverflowStrategy,
  W: WaitStrategy,
{
  /// Attempts to receive without blocking.
  ///
  /// [`TryRecvError::Overwritten`] means an overwrite-channel producer
  /// reclaimed the slot mid-read; the next attempt proceeds from the new
  /// oldest element.
  #[inline]
  pub fn try_recv(&mut self) -> Result<T, TryRecvError> {
    // Safety: `&mut self` on a move-only handle makes this thread the
    // single consumer.
    match unsafe { self.shared.try_recv() } {
      Ok(value) => Ok(value),
      Err(RecvFailed::Empty) => Err(TryRecvError::Empty),
      Err(RecvFailed::Overwritten) => Err(TryRecvError::Overwritten),
    }
  }

  /// Receives, blocking under the channel's wait strategy while the ring
  /// is empty. Never fails.
  pub fn recv(&mut self) -> T {
    loop {
      match self.try_recv() {
        Ok(value) => return value,
        Err(TryRecvError::Empty) => {
          telemetry::increment_counter("spsc::recv", "retry_empty");
          // Stuck while the producer cursor still equals our own.
          let recv = self.shared.consumer.cursor.load(Ordering::Relaxed);
          W::wait(&self.shared.producer.cursor, recv);
        }
        // Lost a slot to the producer's reclaim; the next oldest element
        // is already there, so retry immediately.
        Err(TryRecvError::Overwritten) => continue,
        Err(TryRecvError::Closed) => unreachable!("SPSC try_recv cannot report Closed"),
      }
    }
  }

  /// Maximum number of elements that can be in flight at once.
  pub fn capacity(&self) -> usize {
    self.shared.capacity - 1
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::strategy::{AtomicWait, OverwriteOnFull, Yield};
  use std::thread;
  use std::time::Duration;

  #[test]
  fn capacity_rounds_to_next_power_of_two() {
    let (tx, _rx) = channel::<u8, WaitOnFull, Spin>(5);
    assert_eq!(tx.capacity(), 7);
    let (tx, _rx) = channel::<u8, WaitOnFull, Spin>(16);
    assert_eq!(tx.capacity(), 15);
    let (tx, _rx) = channel::<u8, WaitOnFull, Spin>(1);
    assert_eq!(tx.capacity(), 1);
  }

  #[test]
  #[should_panic]
  fn zero_capacity_panics() {
    let _ = channel::<u8, WaitOnFull, Spin>(0);
  }

  #[test]
  #[should_panic]
  fn overwrite_with_yield_panics() {
    let _ = channel::<u8, OverwriteOnFull, Yield>(4);
  }

  #[test]
  #[should_panic]
  fn overwrite_with_atomic_wait_panics() {
    let _ = channel::<u8, OverwriteOnFull, AtomicWait>(4);
  }

  #[test]
  fn send_recv_single_item() {
    let (mut tx, mut rx) = channel::<i32, WaitOnFull, Spin>(4);
    tx.send(42);
    assert_eq!(rx.recv(), 42);
  }

  #[test]
  fn try_send_full_try_recv_empty() {
    let (mut tx, mut rx) = channel::<i32, WaitOnFull, Spin>(4);
    // capacity 4 -> usable 3
    for i in 0..3 {
      tx.try_send(i).unwrap();
    }
    match tx.try_send(3) {
      Err(TrySendError::Full(v)) => assert_eq!(v, 3),
      other => panic!("expected Full, got {:?}", other),
    }
    for i in 0..3 {
      assert_eq!(rx.try_recv().unwrap(), i);
    }
    assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
  }

  #[test]
  fn cursors_wrap_around() {
    let (mut tx, mut rx) = channel::<usize, WaitOnFull, Spin>(4);
    // Many passes over a small ring exercise the mask arithmetic.
    for round in 0..64 {
      for i in 0..3 {
        tx.try_send(round * 3 + i).unwrap();
      }
      for i in 0..3 {
        assert_eq!(rx.try_recv().unwrap(), round * 3 + i);
      }
    }
  }

  #[test]
  fn send_blocks_until_recv() {
    let (mut tx, mut rx) = channel::<i32, WaitOnFull, Yield>(2);
    tx.send(1);
    let producer = thread::spawn(move || {
      tx.send(2); // ring full (usable 1): blocks until the drain below
      tx
    });
    thread::sleep(Duration::from_millis(100));
    assert_eq!(rx.recv(), 1);
    let _tx = producer.join().unwrap();
    assert_eq!(rx.recv(), 2);
  }

  #[test]
  fn recv_blocks_until_send() {
    let (mut tx, mut rx) = channel::<i32, WaitOnFull, Yield>(2);
    let consumer = thread::spawn(move || {
      let value = rx.recv();
      assert_eq!(value, 100);
      rx
    });
    thread::sleep(Duration::from_millis(100));
    tx.send(100);
    let _rx = consumer.join().unwrap();
  }

  #[test]
  fn overwrite_keeps_most_recent_values() {
    let (mut tx, mut rx) = channel::<usize, OverwriteOnFull, Spin>(4);
    // usable 3; sending 10 values overwrites the first 7
    for i in 0..10 {
      tx.try_send(i).unwrap();
    }
    let mut drained = Vec::new();
    loop {
      match rx.try_recv() {
        Ok(v) => drained.push(v),
        Err(TryRecvError::Overwritten) => continue,
        Err(TryRecvError::Empty) => break,
        Err(e) => panic!("unexpected {:?}", e),
      }
    }
    assert_eq!(drained, vec![7, 8, 9]);
  }

  #[test]
  fn overwrite_send_never_blocks() {
    let (mut tx, _rx) = channel::<usize, OverwriteOnFull, Spin>(4);
    for i in 0..1000 {
      tx.send(i); // would deadlock under WaitOnFull with no consumer
    }
  }

  #[test]
  fn values_are_dropped() {
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
    static DROP_COUNT: AtomicUsize = AtomicUsize::new(0);
    struct Droppable(#[allow(dead_code)] usize);
    impl Drop for Droppable {
      fn drop(&mut self) {
        DROP_COUNT.fetch_add(1, AtomicOrdering::Relaxed);
      }
    }

    DROP_COUNT.store(0, AtomicOrdering::Relaxed);
    {
      let (mut tx, mut rx) = channel::<Droppable, WaitOnFull, Spin>(4);
      tx.send(Droppable(1));
      tx.send(Droppable(2));
      tx.send(Droppable(3));
      let first = rx.recv();
      drop(first);
      assert_eq!(DROP_COUNT.load(AtomicOrdering::Relaxed), 1);
      // Two unreceived elements remain in the ring here.
    }
    assert_eq!(DROP_COUNT.load(AtomicOrdering::Relaxed), 3);
  }

  #[test]
  fn overwritten_values_are_dropped_exactly_once() {
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
    static DROP_COUNT: AtomicUsize = AtomicUsize::new(0);
    struct Droppable(#[allow(dead_code)] usize);
    impl Drop for Droppable {
      fn drop(&mut self) {
        DROP_COUNT.fetch_add(1, AtomicOrdering::Relaxed);
      }
    }

    DROP_COUNT.store(0, AtomicOrdering::Relaxed);
    {
      let (mut tx, _rx) = channel::<Droppable, OverwriteOnFull, Spin>(4);
      for i in 0..10 {
        tx.send(Droppable(i));
      }
      // 7 were reclaimed by overwrites, 3 still live in the ring.
      assert_eq!(DROP_COUNT.load(AtomicOrdering::Relaxed), 7);
    }
    assert_eq!(DROP_COUNT.load(AtomicOrdering::Relaxed), 10);
  }

  #[test]
  fn stress_fifo_order() {
    const ITEMS: usize = 100_000;
    let (mut tx, mut rx) = channel::<usize, WaitOnFull, Yield>(128);

    let producer = thread::spawn(move || {
      for i in 0..ITEMS {
        tx.send(i);
      }
    });
    let consumer = thread::spawn(move || {
      for i in 0..ITEMS {
        assert_eq!(rx.recv(), i);
      }
    });

    producer.join().unwrap();
    consumer.join().unwrap();
  }

  #[test]
  fn atomic_wait_round_trip() {
    let (mut tx, mut rx) = channel::<usize, WaitOnFull, AtomicWait>(4);
    let consumer = thread::spawn(move || {
      let mut out = Vec::new();
      for _ in 0..20 {
        out.push(rx.recv());
      }
      out
    });
    thread::sleep(Duration::from_millis(50));
    for i in 0..20 {
      tx.send(i);
      if i % 5 == 0 {
        thread::sleep(Duration::from_millis(1));
      }
    }
    assert_eq!(consumer.join().unwrap(), (0..20).collect::<Vec<_>>());
  }
}
