// src/telemetry.rs

//! Slow-path counters, compiled in only with the `filament_telemetry`
//! feature.
//!
//! The hot paths of both channels never log or count anything. What the
//! counters cover is the slow paths (blocking retries, overwrite reclaims,
//! overwrite skips), which is exactly the information needed when a harness
//! wants to know whether a channel spent its time waiting or working.
//! With the feature disabled every entry point is an empty `#[inline]`
//! function and the call sites vanish.

#[cfg(feature = "filament_telemetry")]
mod enabled {
  use once_cell::sync::Lazy;
  use std::collections::HashMap;
  use std::sync::Mutex;

  type CounterKey = (&'static str, &'static str);

  static COUNTERS: Lazy<Mutex<HashMap<CounterKey, u64>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

  /// Bumps the counter `name` under `location` (e.g. `("spsc::send", "retry_full")`).
  pub fn increment_counter(location: &'static str, name: &'static str) {
    let mut counters = COUNTERS.lock().unwrap_or_else(|e| e.into_inner());
    *counters.entry((location, name)).or_insert(0) += 1;
  }

  /// Snapshot of every counter recorded so far.
  pub fn counters_snapshot() -> Vec<(&'static str, &'static str, u64)> {
    let counters = COUNTERS.lock().unwrap_or_else(|e| e.into_inner());
    let mut out: Vec<_> = counters
      .iter()
      .map(|(&(loc, name), &count)| (loc, name, count))
      .collect();
    out.sort();
    out
  }

  /// Prints every counter to stdout, sorted by location.
  pub fn print_report() {
    println!("--- filament telemetry ---");
    for (loc, name, count) in counters_snapshot() {
      println!("  {:<24} {:<20} {}", loc, name, count);
    }
    println!("--------------------------");
  }

  /// Resets all counters to zero.
  pub fn clear() {
    let mut counters = COUNTERS.lock().unwrap_or_else(|e| e.into_inner());
    counters.clear();
  }
}

#[cfg(not(feature = "filament_telemetry"))]
mod disabled {
  /// No-op; enable the `filament_telemetry` feature to record counters.
  #[inline(always)]
  pub fn increment_counter(_location: &'static str, _name: &'static str) {}

  /// No-op; always empty without the `filament_telemetry` feature.
  #[inline(always)]
  pub fn counters_snapshot() -> Vec<(&'static str, &'static str, u64)> {
    Vec::new()
  }

  /// No-op without the `filament_telemetry` feature.
  #[inline(always)]
  pub fn print_report() {}

  /// No-op without the `filament_telemetry` feature.
  #[inline(always)]
  pub fn clear() {}
}

#[cfg(feature = "filament_telemetry")]
pub use enabled::{clear, counters_snapshot, increment_counter, print_report};

#[cfg(not(feature = "filament_telemetry"))]
pub use disabled::{clear, counters_snapshot, increment_counter, print_report};

#[cfg(all(test, feature = "filament_telemetry"))]
mod tests {
  use super::*;

  #[test]
  fn counters_accumulate_and_clear() {
    clear();
    increment_counter("here", "thing");
    increment_counter("here", "thing");
    let snap = counters_snapshot();
    assert!(snap.contains(&("here", "thing", 2)));
    clear();
    assert!(counters_snapshot().is_empty());
  }
}
