#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]

//! Lock-free channels for exactly two threads.
//!
//! Filament provides a bounded single-producer/single-consumer ring-buffer
//! channel and a oneshot (single value) channel, built for latency-sensitive
//! pipelines that move typed values between two threads without ever taking a
//! mutex. Both channels share the same backing pieces: a single-allocation
//! atomic reference-counted cell ([`arc::Arc`]) that keeps the inner state
//! alive across the sender/receiver split, and a compile-time
//! [`WaitStrategy`](strategy::WaitStrategy) that turns the non-blocking
//! `try_*` primitives into blocking operations.
//!
//! # Picking a channel
//!
//! - [`spsc`]: a bounded ring with power-of-two capacity. One thread sends,
//!   one thread receives, values arrive in FIFO order. The overflow behavior
//!   when the ring fills is chosen at the type level:
//!   [`WaitOnFull`](strategy::WaitOnFull) (block/fail until the consumer
//!   drains) or [`OverwriteOnFull`](strategy::OverwriteOnFull) (reclaim the
//!   oldest unread slot and keep going).
//! - [`oneshot`]: transmits at most one value over its lifetime, governed by
//!   a three-state atomic. Useful for request/response style handoffs.
//!
//! # Example
//!
//! ```
//! use filament::spsc;
//! use filament::strategy::{Spin, WaitOnFull};
//! use std::thread;
//!
//! let (mut tx, mut rx) = spsc::channel::<u64, WaitOnFull, Spin>(16);
//!
//! let producer = thread::spawn(move || {
//!   for i in 0..100 {
//!     tx.send(i); // blocks while the ring is full
//!   }
//! });
//!
//! let consumer = thread::spawn(move || {
//!   for i in 0..100 {
//!     assert_eq!(rx.recv(), i);
//!   }
//! });
//!
//! producer.join().unwrap();
//! consumer.join().unwrap();
//! ```

pub mod arc;
pub mod error;
pub mod oneshot;
pub mod spsc;
pub mod strategy;
pub mod telemetry;

mod internal;

pub use error::{TryRecvError, TrySendError};
pub use strategy::{AtomicWait, OverwriteOnFull, Spin, WaitOnFull, Yield};

// Helper to assert auto traits of public handle types in tests.
#[allow(dead_code)]
fn assert_send<T: Send>() {}
