// src/oneshot/core.rs

use crate::strategy::WaitStrategy;

use core::marker::PhantomData;
use std::cell::UnsafeCell;
use std::fmt;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};

// States of the slot. Monotonic: NOT_SENT -> SENT -> RECEIVED.
pub(super) const NOT_SENT: usize = 0;
pub(super) const SENT: usize = 1;
pub(super) const RECEIVED: usize = 2;

/// Shared state of a oneshot channel: one inline storage cell governed by a
/// three-state atomic.
///
/// The value lives in `slot` iff `state == SENT`. The sender's release
/// store of `SENT` pairs with the receiver's acquire load, publishing the
/// written value; the receiver's transition to `RECEIVED` marks the slot
/// logically empty again so nothing is dropped twice.
pub(super) struct OneshotShared<T, W> {
  slot: UnsafeCell<MaybeUninit<T>>,
  pub(super) state: AtomicUsize,
  _wait: PhantomData<W>,
}

unsafe impl<T: Send, W> Send for OneshotShared<T, W> {}
unsafe impl<T: Send, W> Sync for OneshotShared<T, W> {}

impl<T, W> fmt::Debug for OneshotShared<T, W> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let state = match self.state.load(Ordering::Relaxed) {
      NOT_SENT => "NotSent",
      SENT => "Sent",
      RECEIVED => "Received",
      _ => "Unknown",
    };
    f.debug_struct("OneshotShared").field("state", &state).finish()
  }
}

impl<T, W> OneshotShared<T, W>
where
  W: WaitStrategy,
{
  pub(super) fn new() -> Self {
    OneshotShared {
      slot: UnsafeCell::new(MaybeUninit::uninit()),
      state: AtomicUsize::new(NOT_SENT),
      _wait: PhantomData,
    }
  }

  /// Writes the single value.
  ///
  /// Returns the value back if one was already sent.
  ///
  /// # Safety
  ///
  /// Must only be called from the single sender; the `NOT_SENT -> SENT`
  /// transition is unsynchronized against a second writer.
  pub(super) unsafe fn send(&self, value: T) -> Result<(), T> {
    if self.state.load(Ordering::Acquire) != NOT_SENT {
      return Err(value);
    }
    unsafe { (*self.slot.get()).write(value) };
    self.state.store(SENT, Ordering::Release);
    W::notify(&self.state);
    Ok(())
  }

  /// Moves the value out if it has been sent and not yet taken.
  ///
  /// # Safety
  ///
  /// Must only be called from the single receiver; the `SENT -> RECEIVED`
  /// transition is unsynchronized against a second reader.
  pub(super) unsafe fn try_recv(&self) -> Result<T, RecvFailed> {
    match self.state.load(Ordering::Acquire) {
      RECEIVED => Err(RecvFailed::Closed),
      NOT_SENT => Err(RecvFailed::Empty),
      _ => {
        let value = unsafe { (*self.slot.get()).assume_init_read() };
        self.state.store(RECEIVED, Ordering::Release);
        Ok(value)
      }
    }
  }
}

/// Why a oneshot `try_recv` produced no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum RecvFailed {
  Empty,
  Closed,
}

impl<T, W> Drop for OneshotShared<T, W> {
  fn drop(&mut self) {
    // A value that was sent but never received still owns its payload.
    if *self.state.get_mut() == SENT {
      unsafe { (*self.slot.get()).assume_init_drop() };
    }
  }
}
