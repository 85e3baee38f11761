//! `ExclusionIndex`: the composite store — mass tree + label index +
//! handle index — and the public operation surface of spec §4.4.

use crate::bounds::{resolve_max, resolve_min};
use crate::error::{ExclusionError, Result};
use crate::interval::{Handle, Interval, Polarity};
use crate::point::Point;
use crate::tree::MassIntervalTree;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Batches at or above this many points are evaluated with rayon. Below
/// it, thread-dispatch overhead outweighs the parallelism — a sequential
/// path below the threshold, a parallel one above it.
const PARALLEL_BATCH_THRESHOLD: usize = 256;

/// Classification of a probe point against the stored intervals, per
/// spec §4.4 `status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    None,
    Excluded,
    Included,
    Mixed,
}

/// Counts returned by [`ExclusionIndex::stats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub mass_tree_len: usize,
    pub handle_index_len: usize,
    pub label_count: usize,
    pub label_index_total: usize,
    pub implementation: &'static str,
}

/// The unsynchronized composite store. [`crate::concurrency::SharedExclusionIndex`]
/// wraps this in a reader-writer lock for concurrent access.
pub struct ExclusionIndex<P> {
    mass_tree: MassIntervalTree<P>,
    handle_index: HashMap<Handle, Arc<Interval<P>>>,
    label_index: HashMap<String, HashSet<Handle>>,
    next_handle: AtomicU64,
}

impl<P> Default for ExclusionIndex<P> {
    fn default() -> Self {
        Self {
            mass_tree: MassIntervalTree::new(),
            handle_index: HashMap::new(),
            label_index: HashMap::new(),
            next_handle: AtomicU64::new(1),
        }
    }
}

impl<P> ExclusionIndex<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `interval`, assigning it a fresh handle.
    ///
    /// Rejects intervals with no label (I1) or with unordered bounds (I2).
    pub fn add(&mut self, mut interval: Interval<P>) -> Result<Handle> {
        if interval.label.is_none() {
            return Err(ExclusionError::InvalidInterval {
                reason: "label must not be null".to_string(),
            });
        }
        if !interval.is_valid() {
            return Err(ExclusionError::InvalidInterval {
                reason: "bounds are not ordered after null substitution".to_string(),
            });
        }

        let handle = Handle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        interval.handle = Some(handle);
        let label = interval.label.clone().unwrap();

        let arc = Arc::new(interval);
        self.mass_tree.insert(arc.clone());
        self.handle_index.insert(handle, arc.clone());
        self.label_index.entry(label.clone()).or_default().insert(handle);

        log::trace!("added interval handle={handle} label={label}");
        Ok(handle)
    }

    /// Remove the interval with the given handle. Errors if unknown.
    pub fn remove_by_handle(&mut self, handle: Handle) -> Result<Interval<P>>
    where
        P: Clone,
    {
        let arc = self
            .handle_index
            .remove(&handle)
            .ok_or(ExclusionError::UnknownHandle(handle))?;

        let key_min = resolve_min(arc.mass.min);
        let key_max = resolve_max(arc.mass.max);
        self.mass_tree.remove(handle, key_min, key_max);

        if let Some(label) = &arc.label {
            if let Some(bucket) = self.label_index.get_mut(label) {
                bucket.remove(&handle);
                if bucket.is_empty() {
                    self.label_index.remove(label);
                }
            }
        }

        log::trace!("removed interval handle={handle}");
        Ok((*arc).clone())
    }

    /// Remove every interval enveloped by `probe` (spec §4.4 matching rule).
    pub fn remove(&mut self, probe: &Interval<P>) -> Vec<Interval<P>>
    where
        P: Clone,
    {
        let matches = self.matching_arcs(probe);
        matches
            .into_iter()
            .filter_map(|arc| self.remove_by_handle(arc.handle.expect("stored interval always has a handle")).ok())
            .collect()
    }

    /// Intervals enveloped by `probe`, without removing them.
    pub fn query_by_interval(&self, probe: &Interval<P>) -> Vec<Interval<P>>
    where
        P: Clone,
    {
        self.matching_arcs(probe).into_iter().map(|a| (*a).clone()).collect()
    }

    fn matching_arcs(&self, probe: &Interval<P>) -> Vec<Arc<Interval<P>>> {
        match &probe.label {
            Some(label) => self
                .label_index
                .get(label)
                .into_iter()
                .flatten()
                .filter_map(|h| self.handle_index.get(h))
                .filter(|i| i.is_enveloped_by(probe))
                .cloned()
                .collect(),
            None => {
                let qmin = resolve_min(probe.mass.min);
                let qmax = resolve_max(probe.mass.max);
                self.mass_tree
                    .envelope(qmin, qmax)
                    .into_iter()
                    .filter(|i| i.is_enveloped_by(probe))
                    .collect()
            }
        }
    }

    /// Intervals containing the probe point, as the tree stores them
    /// (stab the tree, or iterate it wholesale if mass is a wildcard),
    /// filtered by the other dimensions.
    fn query_arcs_by_point(&self, p: &Point) -> Vec<Arc<Interval<P>>> {
        let candidates = match p.mass {
            Some(mass) => self.mass_tree.stab(mass),
            None => self.mass_tree.iter(),
        };
        candidates.into_iter().filter(|i| p.is_bounded_by(i)).collect()
    }

    /// Intervals containing the probe point.
    pub fn query_by_point(&self, p: &Point) -> Vec<Interval<P>>
    where
        P: Clone,
    {
        self.query_arcs_by_point(p).into_iter().map(|a| (*a).clone()).collect()
    }

    /// Intervals with the given label, empty if the label is unknown.
    pub fn query_by_label(&self, label: &str) -> Vec<Interval<P>>
    where
        P: Clone,
    {
        self.label_index
            .get(label)
            .into_iter()
            .flatten()
            .filter_map(|h| self.handle_index.get(h))
            .map(|a| (**a).clone())
            .collect()
    }

    /// The single interval with the given handle, if any.
    pub fn query_by_handle(&self, handle: Handle) -> Option<Interval<P>>
    where
        P: Clone,
    {
        self.handle_index.get(&handle).map(|a| (**a).clone())
    }

    fn any_matching_with_polarity(&self, p: &Point, polarity: Polarity) -> bool {
        let candidates = match p.mass {
            Some(mass) => self.mass_tree.stab(mass),
            None => self.mass_tree.iter(),
        };
        candidates.iter().any(|i| i.polarity == polarity && p.is_bounded_by(i))
    }

    /// True iff `status(p)` is [`Status::Excluded`] or [`Status::Mixed`].
    /// Short-circuits: stops at the first matching EXCLUDE-polarity interval.
    pub fn is_excluded(&self, p: &Point) -> bool {
        self.any_matching_with_polarity(p, Polarity::Exclude)
    }

    /// True iff `status(p)` is [`Status::Included`] or [`Status::Mixed`].
    /// Short-circuits: stops at the first matching INCLUDE-polarity interval.
    pub fn is_included(&self, p: &Point) -> bool {
        self.any_matching_with_polarity(p, Polarity::Include)
    }

    /// Classify `p` against every interval that contains it.
    pub fn status(&self, p: &Point) -> Status {
        let arcs = self.query_arcs_by_point(p);
        if arcs.is_empty() {
            return Status::None;
        }
        let all_exclude = arcs.iter().all(|i| i.polarity == Polarity::Exclude);
        let all_include = arcs.iter().all(|i| i.polarity == Polarity::Include);
        if all_exclude {
            Status::Excluded
        } else if all_include {
            Status::Included
        } else {
            Status::Mixed
        }
    }

    /// Order-preserving batch classification. Dispatches to rayon's
    /// work-stealing pool once the batch is large enough to amortize
    /// thread-dispatch overhead (spec §5: one logical read per batch, not
    /// per point — the caller, [`crate::concurrency::SharedExclusionIndex`],
    /// is responsible for taking the lock exactly once around this call).
    pub fn batch_status(&self, points: &[Point]) -> Vec<Status>
    where
        P: Sync,
    {
        if points.len() >= PARALLEL_BATCH_THRESHOLD {
            points.par_iter().map(|p| self.status(p)).collect()
        } else {
            points.iter().map(|p| self.status(p)).collect()
        }
    }

    /// Empty every view. Returns the new length (always 0).
    pub fn clear(&mut self) -> usize {
        self.mass_tree.clear();
        self.handle_index.clear();
        self.label_index.clear();
        log::debug!("cleared exclusion index");
        0
    }

    pub fn len(&self) -> usize {
        self.mass_tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            mass_tree_len: self.mass_tree.len(),
            handle_index_len: self.handle_index.len(),
            label_count: self.label_index.len(),
            label_index_total: self.label_index.values().map(|b| b.len()).sum(),
            implementation: "ExclusionIndex<MassIntervalTree>",
        }
    }

    /// All stored intervals, order unspecified. Used by the snapshot codec.
    pub(crate) fn iter_arcs(&self) -> Vec<Arc<Interval<P>>> {
        self.mass_tree.iter()
    }

    /// Rebuild the index from a list of intervals whose handles are
    /// already assigned (used by [`crate::snapshot::deserialize`]). Every
    /// interval must carry a handle and a label, matching I1/I3; a
    /// snapshot violating that is corrupt.
    pub(crate) fn rebuild_from(&mut self, intervals: Vec<Interval<P>>) -> Result<()> {
        let mut rebuilt = Self::default();
        let mut max_handle = 0u64;
        for interval in intervals {
            let handle = interval.handle.ok_or_else(|| ExclusionError::CorruptSnapshot {
                reason: "interval in snapshot has no handle".to_string(),
            })?;
            let label = interval.label.clone().ok_or_else(|| ExclusionError::CorruptSnapshot {
                reason: "interval in snapshot has no label".to_string(),
            })?;
            max_handle = max_handle.max(handle.0);
            let arc = Arc::new(interval);
            rebuilt.mass_tree.insert(arc.clone());
            rebuilt.handle_index.insert(handle, arc.clone());
            rebuilt.label_index.entry(label).or_default().insert(handle);
        }
        rebuilt.next_handle.store(max_handle + 1, Ordering::Relaxed);
        *self = rebuilt;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::Bound;

    fn labelled(label: &str, charge: Option<i32>, lo: f64, hi: f64, polarity: Polarity) -> Interval<()> {
        Interval {
            label: Some(label.to_string()),
            handle: None,
            charge,
            mass: Bound::new(Some(lo), Some(hi)),
            rt: Bound::new(Some(1000.0), Some(1001.0)),
            ook0: Bound::new(Some(1000.0), Some(1001.0)),
            intensity: Bound::new(Some(1000.0), Some(1001.0)),
            polarity,
            payload: None,
        }
    }

    fn full_point(charge: Option<i32>, mass: f64) -> Point {
        Point {
            charge,
            mass: Some(mass),
            rt: Some(1000.5),
            ook0: Some(1000.5),
            intensity: Some(1000.5),
        }
    }

    #[test]
    fn basic_exclusion_scenario() {
        let mut idx = ExclusionIndex::<()>::new();
        idx.add(labelled("PEPTIDE", Some(1), 1000.0, 1001.0, Polarity::Exclude)).unwrap();

        assert_eq!(idx.status(&full_point(Some(1), 1000.5)), Status::Excluded);
        assert_eq!(idx.status(&full_point(Some(2), 1000.5)), Status::None);
        assert_eq!(idx.status(&full_point(Some(1), 1001.0)), Status::None);
        assert_eq!(idx.status(&full_point(Some(1), 1000.0)), Status::Excluded);
    }

    #[test]
    fn wildcard_point_matches() {
        let mut idx = ExclusionIndex::<()>::new();
        idx.add(labelled("PEPTIDE", Some(1), 1000.0, 1001.0, Polarity::Exclude)).unwrap();
        assert_eq!(idx.status(&Point::wildcard()), Status::Excluded);
    }

    #[test]
    fn mixed_polarity_scenario() {
        let mut idx = ExclusionIndex::<()>::new();
        let mut exclude = Interval::<()>::probe();
        exclude.label = Some("P".into());
        exclude.mass = Bound::new(Some(500.0), Some(800.0));
        exclude.polarity = Polarity::Exclude;
        idx.add(exclude).unwrap();

        let mut include = Interval::<()>::probe();
        include.label = Some("P".into());
        include.mass = Bound::new(Some(700.0), Some(1000.0));
        include.polarity = Polarity::Include;
        idx.add(include).unwrap();

        let at = |mass: f64| Point {
            mass: Some(mass),
            ..Point::wildcard()
        };
        assert_eq!(idx.status(&at(500.0)), Status::Excluded);
        assert_eq!(idx.status(&at(400.0)), Status::None);
        assert_eq!(idx.status(&at(800.0)), Status::Included);
        assert_eq!(idx.status(&at(750.0)), Status::Mixed);
    }

    #[test]
    fn is_excluded_and_is_included_consistent_with_status() {
        let mut idx = ExclusionIndex::<()>::new();
        let mut exclude = Interval::<()>::probe();
        exclude.label = Some("P".into());
        exclude.mass = Bound::new(Some(500.0), Some(800.0));
        exclude.polarity = Polarity::Exclude;
        idx.add(exclude).unwrap();
        let mut include = Interval::<()>::probe();
        include.label = Some("P".into());
        include.mass = Bound::new(Some(700.0), Some(1000.0));
        include.polarity = Polarity::Include;
        idx.add(include).unwrap();

        let at = |mass: f64| Point {
            mass: Some(mass),
            ..Point::wildcard()
        };
        assert!(idx.is_excluded(&at(750.0)) && idx.is_included(&at(750.0)));
        assert!(idx.is_excluded(&at(500.0)) && !idx.is_included(&at(500.0)));
        assert!(!idx.is_excluded(&at(800.0)) && idx.is_included(&at(800.0)));
        assert!(!idx.is_excluded(&at(400.0)) && !idx.is_included(&at(400.0)));
    }

    #[test]
    fn envelope_removal_deletes_only_fully_enveloped_intervals() {
        let mut idx = ExclusionIndex::<()>::new();
        let mut a = labelled("A", Some(1), 1000.0, 1001.0, Polarity::Exclude);
        a.rt = Bound::new(Some(0.0), Some(1.0));
        let mut b = labelled("A", Some(1), 1000.0, 1001.0, Polarity::Exclude);
        b.rt = Bound::new(Some(5000.0), Some(5001.0));
        idx.add(a).unwrap();
        idx.add(b).unwrap();
        assert_eq!(idx.len(), 2);

        let mut probe = Interval::<()>::probe();
        probe.charge = Some(1);
        probe.mass = Bound::new(Some(999.0), Some(1002.0));
        let removed = idx.remove(&probe);
        assert_eq!(removed.len(), 2);
        assert_eq!(idx.len(), 0);
    }

    #[test]
    fn remove_by_label_only_affects_matching_label() {
        let mut idx = ExclusionIndex::<()>::new();
        idx.add(labelled("A", None, 100.0, 200.0, Polarity::Exclude)).unwrap();
        idx.add(labelled("B", None, 100.0, 200.0, Polarity::Exclude)).unwrap();

        let mut probe = Interval::<()>::probe();
        probe.label = Some("A".into());
        probe.mass = Bound::new(Some(0.0), Some(1000.0));
        let removed = idx.remove(&probe);
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].label.as_deref(), Some("A"));
        assert_eq!(idx.len(), 1);
    }

    #[test]
    fn add_rejects_null_label() {
        let mut idx = ExclusionIndex::<()>::new();
        let mut i = Interval::<()>::probe();
        i.label = None;
        assert!(matches!(idx.add(i), Err(ExclusionError::InvalidInterval { .. })));
    }

    #[test]
    fn add_rejects_invalid_bounds() {
        let mut idx = ExclusionIndex::<()>::new();
        let mut i = labelled("A", None, 200.0, 100.0, Polarity::Exclude);
        i.label = Some("A".into());
        assert!(matches!(idx.add(i), Err(ExclusionError::InvalidInterval { .. })));
    }

    #[test]
    fn remove_by_handle_unknown_errors() {
        let mut idx = ExclusionIndex::<()>::new();
        assert!(matches!(
            idx.remove_by_handle(Handle(404)),
            Err(ExclusionError::UnknownHandle(Handle(404)))
        ));
    }

    #[test]
    fn batch_status_preserves_order() {
        let mut idx = ExclusionIndex::<()>::new();
        idx.add(labelled("PEPTIDE", Some(1), 1000.0, 1001.0, Polarity::Exclude)).unwrap();

        let hit = full_point(Some(1), 1000.5);
        let miss = full_point(Some(1), 5000.0);
        let statuses = idx.batch_status(&[hit, miss, hit]);
        assert_eq!(statuses, vec![Status::Excluded, Status::None, Status::Excluded]);
    }

    #[test]
    fn batch_status_parallel_path_matches_sequential() {
        let mut idx = ExclusionIndex::<()>::new();
        for i in 0..100u64 {
            idx.add(labelled(&format!("L{i}"), None, i as f64 * 10.0, i as f64 * 10.0 + 5.0, Polarity::Exclude))
                .unwrap();
        }
        let points: Vec<Point> = (0..500)
            .map(|i| Point {
                mass: Some((i % 1000) as f64 / 2.0),
                ..Point::wildcard()
            })
            .collect();
        let sequential: Vec<Status> = points.iter().map(|p| idx.status(p)).collect();
        let batched = idx.batch_status(&points);
        assert_eq!(sequential, batched);
    }

    #[test]
    fn clear_empties_all_views() {
        let mut idx = ExclusionIndex::<()>::new();
        idx.add(labelled("A", None, 100.0, 200.0, Polarity::Exclude)).unwrap();
        assert_eq!(idx.clear(), 0);
        assert_eq!(idx.len(), 0);
        let stats = idx.stats();
        assert_eq!(stats.mass_tree_len, 0);
        assert_eq!(stats.handle_index_len, 0);
        assert_eq!(stats.label_index_total, 0);
    }

    #[test]
    fn invariant_p1_holds_after_mixed_operations() {
        let mut idx = ExclusionIndex::<()>::new();
        let mut handles = Vec::new();
        for i in 0..30u64 {
            handles.push(
                idx.add(labelled(&format!("L{}", i % 5), None, i as f64, i as f64 + 1.0, Polarity::Exclude))
                    .unwrap(),
            );
        }
        for h in handles.into_iter().step_by(3) {
            idx.remove_by_handle(h).unwrap();
        }
        let stats = idx.stats();
        assert_eq!(idx.len(), stats.mass_tree_len);
        assert_eq!(idx.len(), stats.handle_index_len);
        assert_eq!(idx.len(), stats.label_index_total);
    }

    #[test]
    fn re_adding_after_remove_yields_new_handle() {
        let mut idx = ExclusionIndex::<()>::new();
        let i = labelled("A", None, 100.0, 200.0, Polarity::Exclude);
        let h1 = idx.add(i.clone()).unwrap();
        idx.remove_by_handle(h1).unwrap();
        let h2 = idx.add(i).unwrap();
        assert_ne!(h1, h2);
    }
}
