//! # exclusionms-core — a multidimensional exclusion index
//!
//! ## What this crate is
//!
//! An in-memory store of labelled intervals in a 5-dimensional attribute
//! space (charge, mass, retention time, reduced mobility, intensity) for
//! mass-spectrometry acquisition control. It answers two questions at low
//! millisecond latency under concurrent mutation:
//!
//! 1. **Point status** — is this probe point excluded, included, both, or
//!    neither, given every stored interval's polarity?
//! 2. **Interval search/removal** — which stored intervals does this probe
//!    interval fully envelop?
//!
//! ## Why a specialised tree
//!
//! A linear scan costs O(N·D) per point. At N≈10⁵ intervals and batches of
//! 10³ points that misses duty-cycle budgets for acquisition control. This
//! crate keeps a 1D interval tree keyed on mass — the most selective
//! dimension — and filters the other four dimensions only on the
//! candidates the tree narrows down to.
//!
//! ## Layout
//!
//! - [`bounds`] — open/closed bound arithmetic shared by every other module.
//! - [`interval`] / [`point`] — the stored and probe value types.
//! - [`tolerance`] — expand a probe point into a bounding interval.
//! - [`tree`] — the augmented mass interval tree.
//! - [`index`] — the composite store: tree + label index + handle index.
//! - [`concurrency`] — the reader-writer facade callers actually hold.
//! - [`snapshot`] — the byte-stream and named-file persistence layer.
//! - [`config`] — where snapshots live and how verbose logging is.
//! - [`error`] — the six-variant error taxonomy every fallible operation uses.

// mimalloc's per-thread heaps keep small, frequent allocations (one per
// interval insert, one per batch-status result vector) effectively
// contention-free under concurrent readers and writers.
use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

pub mod bounds;
pub mod concurrency;
pub mod config;
pub mod error;
pub mod index;
pub mod interval;
pub mod point;
pub mod snapshot;
pub mod tolerance;
pub mod tree;

pub use concurrency::SharedExclusionIndex;
pub use error::{ExclusionError, Result};
pub use index::{ExclusionIndex, IndexStats, Status};
pub use interval::{Bound, Handle, Interval, Polarity};
pub use point::Point;
pub use tolerance::DynamicExclusionTolerance;

#[cfg(test)]
mod tests {
    use super::*;

    /// End-to-end scenario 6 from spec §8: snapshot round trip preserves
    /// a known probe's status.
    #[test]
    fn snapshot_round_trip_preserves_status() {
        let shared = SharedExclusionIndex::<serde_json::Value>::new();
        for i in 0..5u64 {
            let mut interval = Interval::probe();
            interval.label = Some(format!("L{i}"));
            interval.mass = Bound::new(Some(i as f64 * 1000.0), Some(i as f64 * 1000.0 + 10.0));
            interval.polarity = if i % 2 == 0 { Polarity::Exclude } else { Polarity::Include };
            interval.payload = Some(serde_json::json!({ "i": i }));
            shared.add(interval).unwrap();
        }

        let probe = Point {
            mass: Some(2000.5),
            ..Point::wildcard()
        };
        let before = shared.status(&probe);

        let mut buf = Vec::new();
        shared.save(&mut buf).unwrap();

        let reloaded = SharedExclusionIndex::<serde_json::Value>::new();
        reloaded.load(buf.as_slice()).unwrap();

        assert_eq!(reloaded.len(), shared.len());
        assert_eq!(reloaded.status(&probe), before);
    }
}
