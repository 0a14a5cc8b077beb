// src/strategy.rs

//! Compile-time wait and overflow strategies.
//!
//! Every blocking operation in this crate is a retry loop around a
//! non-blocking `try_*` primitive; the [`WaitStrategy`] decides what a
//! failed iteration does before the next attempt. The choice is a type
//! parameter so the retry loop monomorphizes down to exactly the chosen
//! behavior: no branches, no function pointers.
//!
//! The [`OverflowStrategy`] is independent of the wait strategy and picks
//! what an SPSC producer does when the ring is full: report it
//! ([`WaitOnFull`]) or reclaim the oldest unread slot ([`OverwriteOnFull`]).
//! The one coupling rule: `OverwriteOnFull` requires [`Spin`], because
//! parking on a cursor the producer itself keeps moving is meaningless; the
//! factories enforce this at construction.

use std::sync::atomic::{compiler_fence, AtomicUsize, Ordering};

/// What a blocking operation does between retries, and how the peer side
/// wakes it.
///
/// `wait` is handed the peer's atomic word together with the value that
/// made the last attempt fail; a parking implementation sleeps until the
/// word changes away from it. `notify` runs on the peer side after its
/// release store and is a no-op for the non-parking strategies.
pub trait WaitStrategy {
  /// True only for [`Spin`]; overwrite-on-full rings insist on it.
  const IS_SPIN: bool;

  /// Delay after a failed try-operation. `word` is the peer's atomic the
  /// caller is stuck on and `observed` the stuck value it saw.
  fn wait(word: &AtomicUsize, observed: usize);

  /// Wake anything parked on `word`. Called after the release store that
  /// makes progress visible.
  fn notify(word: &AtomicUsize) {
    let _ = word;
  }
}

/// Pure busy-spin. Lowest latency, burns a core.
///
/// Each retry issues only a compiler fence so the load in the next attempt
/// can be neither elided nor hoisted; there is no syscall, no yield, not
/// even a CPU pause hint.
#[derive(Debug, Clone, Copy)]
pub struct Spin;

impl WaitStrategy for Spin {
  const IS_SPIN: bool = true;

  #[inline(always)]
  fn wait(_word: &AtomicUsize, _observed: usize) {
    compiler_fence(Ordering::SeqCst);
  }
}

/// Cooperative yield between retries. Balanced latency and CPU use for
/// workloads where the channel is rarely contended for long.
#[derive(Debug, Clone, Copy)]
pub struct Yield;

impl WaitStrategy for Yield {
  const IS_SPIN: bool = false;

  #[inline]
  fn wait(_word: &AtomicUsize, _observed: usize) {
    std::thread::yield_now();
  }
}

/// Futex-style parking keyed on the atomic word itself.
///
/// A stuck thread parks in the global parking lot under the word's address
/// and is woken by the peer's `notify` after the cursor or state moves.
/// Best when waits are long; each suspend/resume pays a parking-lot round
/// trip.
#[derive(Debug, Clone, Copy)]
pub struct AtomicWait;

impl WaitStrategy for AtomicWait {
  const IS_SPIN: bool = false;

  fn wait(word: &AtomicUsize, observed: usize) {
    let key = word as *const AtomicUsize as usize;
    // The validate closure runs under the parking-lot bucket lock, and
    // notify takes the same lock after the peer's release store, so a
    // store-then-notify can never slip between our re-check and the sleep.
    unsafe {
      parking_lot_core::park(
        key,
        || word.load(Ordering::Acquire) == observed,
        || {},
        |_, _| {},
        parking_lot_core::DEFAULT_PARK_TOKEN,
        None,
      );
    }
  }

  fn notify(word: &AtomicUsize) {
    let key = word as *const AtomicUsize as usize;
    unsafe {
      parking_lot_core::unpark_all(key, parking_lot_core::DEFAULT_UNPARK_TOKEN);
    }
  }
}

/// What an SPSC producer does when the ring is full.
pub trait OverflowStrategy {
  /// True if the producer reclaims the oldest unread slot instead of
  /// failing or blocking.
  const OVERWRITES: bool;
}

/// A full ring makes `try_send` fail and `send` block until the consumer
/// drains. No value is ever lost. The default.
#[derive(Debug, Clone, Copy)]
pub struct WaitOnFull;

impl OverflowStrategy for WaitOnFull {
  const OVERWRITES: bool = false;
}

/// A full ring drops the oldest unread element to make room, so the
/// producer never waits. The consumer observes
/// [`TryRecvError::Overwritten`](crate::error::TryRecvError::Overwritten)
/// when it loses a slot to the reclaim and simply retries. Requires the
/// [`Spin`] wait strategy.
#[derive(Debug, Clone, Copy)]
pub struct OverwriteOnFull;

impl OverflowStrategy for OverwriteOnFull {
  const OVERWRITES: bool = true;
}
