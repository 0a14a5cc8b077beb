// src/error.rs

//! Status values returned by the non-blocking channel operations.
//!
//! Failures are ordinary values, never panics: a full ring hands the rejected
//! element back inside [`TrySendError::Full`], an empty ring leaves everything
//! untouched and reports [`TryRecvError::Empty`]. The blocking `send`/`recv`
//! counterparts retry internally and have no failure path at all.

use core::fmt;

/// Error returned by `try_send` when the value could not be accepted.
/// The rejected value rides along so the caller can retry or drop it.
#[derive(PartialEq, Eq, Clone)]
pub enum TrySendError<T> {
  /// The ring is full and the channel blocks rather than overwrites.
  Full(T),
  /// A value has already been sent on this oneshot channel.
  Sent(T),
}

impl<T> TrySendError<T> {
  /// Consumes the error, returning the value that failed to send.
  #[inline]
  pub fn into_inner(self) -> T {
    match self {
      TrySendError::Full(v) => v,
      TrySendError::Sent(v) => v,
    }
  }
}

// Manual Debug so T does not need to be Debug.
impl<T> fmt::Debug for TrySendError<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TrySendError::Full(_) => write!(f, "TrySendError::Full(..)"),
      TrySendError::Sent(_) => write!(f, "TrySendError::Sent(..)"),
    }
  }
}

impl<T> fmt::Display for TrySendError<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TrySendError::Full(_) => f.write_str("channel full"),
      TrySendError::Sent(_) => f.write_str("channel already sent a value"),
    }
  }
}

impl<T> std::error::Error for TrySendError<T> {}

/// Error returned by `try_recv` when no value could be taken.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TryRecvError {
  /// No value is currently available.
  Empty,
  /// The slot being read was reclaimed by the producer's overwrite before
  /// this receiver could claim it. Only overwrite-on-full rings report this;
  /// the receiver should simply try again.
  Overwritten,
  /// The single value of this oneshot channel was already received.
  Closed,
}

impl fmt::Display for TryRecvError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TryRecvError::Empty => f.write_str("channel empty"),
      TryRecvError::Overwritten => f.write_str("slot reclaimed by overwrite"),
      TryRecvError::Closed => f.write_str("oneshot value already received"),
    }
  }
}

impl std::error::Error for TryRecvError {}
