//! Concurrency layer: many-reader/single-writer access to a composite
//! [`ExclusionIndex`] (spec §5).
//!
//! `parking_lot::RwLock` is used instead of `std::sync::RwLock` because
//! uncontended acquisition is a single atomic CAS with no OS futex call on
//! the fast path, which matters here because `query_by_point`/`status` are
//! meant to be called at low millisecond latency under concurrent load.

use crate::error::Result;
use crate::index::{ExclusionIndex, IndexStats, Status};
use crate::interval::{Handle, Interval};
use crate::point::Point;
use parking_lot::RwLock;
use std::io::{Read, Write};

/// Thread-safe facade around [`ExclusionIndex`]. Every mutation acquires
/// exclusive access; every query acquires shared access. A batch point
/// query acquires shared access exactly once for the whole batch, so every
/// point in one call observes the same snapshot of the index (spec §5).
pub struct SharedExclusionIndex<P> {
    inner: RwLock<ExclusionIndex<P>>,
}

impl<P> Default for SharedExclusionIndex<P> {
    fn default() -> Self {
        Self {
            inner: RwLock::new(ExclusionIndex::new()),
        }
    }
}

impl<P> SharedExclusionIndex<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, interval: Interval<P>) -> Result<Handle> {
        self.inner.write().add(interval)
    }

    pub fn remove_by_handle(&self, handle: Handle) -> Result<Interval<P>>
    where
        P: Clone,
    {
        self.inner.write().remove_by_handle(handle)
    }

    pub fn remove(&self, probe: &Interval<P>) -> Vec<Interval<P>>
    where
        P: Clone,
    {
        self.inner.write().remove(probe)
    }

    pub fn query_by_interval(&self, probe: &Interval<P>) -> Vec<Interval<P>>
    where
        P: Clone,
    {
        self.inner.read().query_by_interval(probe)
    }

    pub fn query_by_point(&self, p: &Point) -> Vec<Interval<P>>
    where
        P: Clone,
    {
        self.inner.read().query_by_point(p)
    }

    pub fn query_by_label(&self, label: &str) -> Vec<Interval<P>>
    where
        P: Clone,
    {
        self.inner.read().query_by_label(label)
    }

    pub fn query_by_handle(&self, handle: Handle) -> Option<Interval<P>>
    where
        P: Clone,
    {
        self.inner.read().query_by_handle(handle)
    }

    pub fn is_excluded(&self, p: &Point) -> bool {
        self.inner.read().is_excluded(p)
    }

    pub fn is_included(&self, p: &Point) -> bool {
        self.inner.read().is_included(p)
    }

    pub fn status(&self, p: &Point) -> Status {
        self.inner.read().status(p)
    }

    /// One read-lock acquisition covers the entire batch: every point
    /// observes the same view of the index, regardless of concurrent
    /// writers queued behind this read.
    pub fn batch_status(&self, points: &[Point]) -> Vec<Status>
    where
        P: Sync,
    {
        self.inner.read().batch_status(points)
    }

    pub fn clear(&self) -> usize {
        self.inner.write().clear()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn stats(&self) -> IndexStats {
        self.inner.read().stats()
    }

    /// Serialize the current contents to `writer` under a shared lock.
    pub fn save<W: Write>(&self, writer: W) -> Result<()>
    where
        P: serde::Serialize,
    {
        crate::snapshot::serialize(&self.inner.read(), writer)
    }

    /// Deserialize from `reader`, atomically replacing the current
    /// contents on success. Held behind the same exclusive lock as any
    /// other mutation, so readers never observe a torn state.
    pub fn load<R: Read>(&self, reader: R) -> Result<()>
    where
        P: serde::de::DeserializeOwned,
    {
        crate::snapshot::deserialize_into(&mut self.inner.write(), reader)
    }
}
