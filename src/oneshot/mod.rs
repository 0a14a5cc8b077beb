// src/oneshot/mod.rs

//! A channel that transmits at most one value over its lifetime.
//!
//! Built for request/response dispatch: hand the [`Sender`] to whoever
//! produces the answer, keep the [`Receiver`], and block (or poll) until
//! the single value arrives. The storage is a single inline cell governed
//! by a three-state atomic (not sent, sent, received), with no ring and no
//! per-element allocation, so a send is one write plus one release store.
//!
//! Both handles are move-only and their operations take `&mut self`: one
//! sender thread, one receiver thread, at most one value each way. A second
//! `send` reports [`TrySendError::Sent`]; a `try_recv` after the value was
//! taken reports [`TryRecvError::Closed`].
//!
//! # Example
//!
//! ```
//! use filament::oneshot;
//! use filament::strategy::AtomicWait;
//! use std::thread;
//!
//! let (mut tx, mut rx) = oneshot::channel::<u32, AtomicWait>();
//!
//! let worker = thread::spawn(move || {
//!   tx.send(57).unwrap();
//! });
//!
//! assert_eq!(rx.recv(), 57); // parks until the worker sends
//! worker.join().unwrap();
//! ```

mod core;

use crate::arc::Arc;
use crate::error::{TryRecvError, TrySendError};
use crate::strategy::{Spin, WaitStrategy};
use crate::telemetry;
use self::core::{OneshotShared, RecvFailed, NOT_SENT};

use std::fmt;
use std::marker::PhantomData;

/// Creates a oneshot channel.
pub fn channel<T, W>() -> (Sender<T, W>, Receiver<T, W>)
where
  W: WaitStrategy,
{
  let shared = Arc::new(OneshotShared::new());
  (
    Sender {
      shared: shared.clone(),
      sent: false,
      _not_sync: PhantomData,
    },
    Receiver {
      shared,
      received: false,
      _not_sync: PhantomData,
    },
  )
}

/// The sending half of a oneshot channel. Move-only; sends at most once.
pub struct Sender<T, W = Spin> {
  shared: Arc<OneshotShared<T, W>>,
  // Local progress flag backing is_closed(). Exact, not a lagging hint:
  // only this handle can perform the NOT_SENT -> SENT transition.
  sent: bool,
  _not_sync: PhantomData<*mut ()>,
}

/// The receiving half of a oneshot channel. Move-only; receives at most
/// once.
pub struct Receiver<T, W = Spin> {
  shared: Arc<OneshotShared<T, W>>,
  received: bool,
  _not_sync: PhantomData<*mut ()>,
}

unsafe impl<T: Send, W> Send for Sender<T, W> {}
unsafe impl<T: Send, W> Send for Receiver<T, W> {}

impl<T, W> fmt::Debug for Sender<T, W> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Sender")
      .field("shared", &*self.shared)
      .field("sent", &self.sent)
      .finish()
  }
}

impl<T, W> fmt::Debug for Receiver<T, W> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Receiver")
      .field("shared", &*self.shared)
      .field("received", &self.received)
      .finish()
  }
}

impl<T, W> Sender<T, W>
where
  W: WaitStrategy,
{
  /// Sends the channel's single value.
  ///
  /// Returns [`TrySendError::Sent`] with the value if one was already
  /// sent. Never blocks.
  pub fn send(&mut self, value: T) -> Result<(), TrySendError<T>> {
    if self.sent {
      return Err(TrySendError::Sent(value));
    }
    // Safety: `&mut self` on a move-only handle makes this thread the
    // single sender.
    match unsafe { self.shared.send(value) } {
      Ok(()) => {
        self.sent = true;
        Ok(())
      }
      Err(value) => Err(TrySendError::Sent(value)),
    }
  }

  /// True once this sender has delivered its value; no further send can
  /// succeed.
  pub fn is_closed(&self) -> bool {
    self.sent
  }
}

impl<T, W> Receiver<T, W>
where
  W: WaitStrategy,
{
  /// Attempts to take the value without blocking.
  ///
  /// Returns [`TryRecvError::Empty`] while nothing has been sent and
  /// [`TryRecvError::Closed`] once the value has already been received.
  pub fn try_recv(&mut self) -> Result<T, TryRecvError> {
    if self.received {
      return Err(TryRecvError::Closed);
    }
    // Safety: `&mut self` on a move-only handle makes this thread the
    // single receiver.
    match unsafe { self.shared.try_recv() } {
      Ok(value) => {
        self.received = true;
        Ok(value)
      }
      Err(RecvFailed::Empty) => Err(TryRecvError::Empty),
      Err(RecvFailed::Closed) => Err(TryRecvError::Closed),
    }
  }

  /// Blocks under the channel's wait strategy until the value arrives,
  /// then returns it.
  ///
  /// A oneshot channel only ever carries one value, so calling this after
  /// the value was already received loops forever; receive once.
  pub fn recv(&mut self) -> T {
    loop {
      match self.try_recv() {
        Ok(value) => return value,
        Err(_) => {
          telemetry::increment_counter("oneshot::recv", "retry_empty");
          W::wait(&self.shared.state, NOT_SENT);
        }
      }
    }
  }

  /// True once the value has been received; no further receive can
  /// succeed.
  pub fn is_closed(&self) -> bool {
    self.received
  }
}
