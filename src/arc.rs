// src/arc.rs

//! A minimal atomic reference-counted cell.
//!
//! [`Arc`] keeps the reference count and the payload in a single heap block,
//! which is what lets a channel factory allocate its inner state once and
//! hand one handle to each side. It is deliberately smaller than
//! `std::sync::Arc`: no weak references, no `make_mut`, no pointer
//! comparisons. The channels need shared ownership and a payload address
//! that stays put, nothing more.
//!
//! Moved-from handles do not exist in safe Rust, so there is no "null" or
//! disengaged state to guard against; wrap an `Arc` in `Option` if a slot
//! for "absent" is needed.

use core::fmt;
use core::marker::PhantomData;
use core::ops::Deref;
use core::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Single-allocation control block: count first, payload inline.
struct ArcInner<T> {
  ref_count: AtomicUsize,
  data: T,
}

/// Shared ownership of a heap-allocated `T` with an atomic count.
///
/// Cloning bumps the count with a relaxed increment (ordering toward the
/// payload was already established when the existing handle was created).
/// Dropping decrements with acquire-release so the final destructor
/// happens-after every other handle's last access.
pub struct Arc<T> {
  inner: NonNull<ArcInner<T>>,
  _marker: PhantomData<ArcInner<T>>,
}

unsafe impl<T: Send + Sync> Send for Arc<T> {}
unsafe impl<T: Send + Sync> Sync for Arc<T> {}

impl<T> Arc<T> {
  /// Allocates a control block holding `data` with an initial count of 1.
  pub fn new(data: T) -> Self {
    let block = Box::new(ArcInner {
      ref_count: AtomicUsize::new(1),
      data,
    });
    Arc {
      inner: NonNull::from(Box::leak(block)),
      _marker: PhantomData,
    }
  }

  #[inline]
  fn inner(&self) -> &ArcInner<T> {
    // Invariant: `inner` stays valid while any handle exists; the count
    // cannot hit zero before this handle is dropped.
    unsafe { self.inner.as_ref() }
  }

  /// Returns the number of handles currently sharing the payload.
  ///
  /// The load is relaxed, so in the presence of concurrent clones or drops
  /// the value is a snapshot, not a synchronization point.
  #[inline]
  pub fn use_count(this: &Self) -> usize {
    this.inner().ref_count.load(Ordering::Relaxed)
  }

  /// Returns a mutable reference to the payload without checking the count.
  ///
  /// # Safety
  ///
  /// The caller must guarantee no other handle reads or writes the payload
  /// for the lifetime of the returned borrow. The channels never call this
  /// on a shared payload; their inner state synchronizes itself with
  /// atomics instead.
  #[inline]
  pub unsafe fn get_mut(this: &mut Self) -> &mut T {
    unsafe { &mut this.inner.as_mut().data }
  }
}

impl<T> Clone for Arc<T> {
  #[inline]
  fn clone(&self) -> Self {
    self.inner().ref_count.fetch_add(1, Ordering::Relaxed);
    Arc {
      inner: self.inner,
      _marker: PhantomData,
    }
  }
}

impl<T> Deref for Arc<T> {
  type Target = T;
  #[inline]
  fn deref(&self) -> &T {
    &self.inner().data
  }
}

impl<T> Drop for Arc<T> {
  fn drop(&mut self) {
    // The acquire half of the AcqRel decrement synchronizes with every
    // other handle's release half, so the deallocation below happens-after
    // all of their payload accesses.
    if self.inner().ref_count.fetch_sub(1, Ordering::AcqRel) == 1 {
      unsafe { drop(Box::from_raw(self.inner.as_ptr())) };
    }
  }
}

impl<T: fmt::Debug> fmt::Debug for Arc<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Arc")
      .field("use_count", &Arc::use_count(self))
      .field("data", &**self)
      .finish()
  }
}
