//! Stored interval value type: the five-dimensional (charge + four
//! continuous dimensions) labelled region plus polarity and opaque payload.

use crate::bounds::envelops;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, unique, system-assigned identifier for a stored interval.
///
/// Unifies what two revisions of the original source tracked separately as
/// an `interval_id` string and a UUID (spec §9, Open Question 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Handle(pub u64);

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Governs how a matching interval votes in [`crate::index::ExclusionIndex::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    Exclude,
    Include,
}

impl Default for Polarity {
    fn default() -> Self {
        Polarity::Exclude
    }
}

/// One continuous dimension's bound pair. `min` is inclusive, `max` is
/// exclusive; `None` on either side means unbounded on that side.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bound {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Bound {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    pub fn unbounded() -> Self {
        Self { min: None, max: None }
    }

    fn is_valid(&self) -> bool {
        crate::bounds::resolve_min(self.min) <= crate::bounds::resolve_max(self.max)
    }

    fn envelops(&self, inner: &Bound) -> bool {
        envelops(self.min, self.max, inner.min, inner.max)
    }
}

/// The four continuous dimensions, in a fixed order shared by
/// [`crate::point::Point`] and the tolerance constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Mass,
    Rt,
    Ook0,
    Intensity,
}

pub const CONTINUOUS_DIMENSIONS: [Dimension; 4] =
    [Dimension::Mass, Dimension::Rt, Dimension::Ook0, Dimension::Intensity];

/// A labelled region in 5D attribute space, stored in the index.
///
/// `payload` is opaque to the core: it is carried through save/load
/// verbatim and never interpreted (spec §9).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interval<P> {
    pub label: Option<String>,
    pub handle: Option<Handle>,
    pub charge: Option<i32>,
    pub mass: Bound,
    pub rt: Bound,
    pub ook0: Bound,
    pub intensity: Bound,
    pub polarity: Polarity,
    pub payload: Option<P>,
}

impl<P> Interval<P> {
    /// A probe interval with no label, no handle, and wildcard bounds on
    /// every dimension — the starting point for building up a query.
    pub fn probe() -> Self {
        Self {
            label: None,
            handle: None,
            charge: None,
            mass: Bound::unbounded(),
            rt: Bound::unbounded(),
            ook0: Bound::unbounded(),
            intensity: Bound::unbounded(),
            polarity: Polarity::Exclude,
            payload: None,
        }
    }

    fn bound(&self, dim: Dimension) -> &Bound {
        match dim {
            Dimension::Mass => &self.mass,
            Dimension::Rt => &self.rt,
            Dimension::Ook0 => &self.ook0,
            Dimension::Intensity => &self.intensity,
        }
    }

    /// Every dimension satisfies `resolve_min <= resolve_max` (spec §4.2, I2).
    pub fn is_valid(&self) -> bool {
        CONTINUOUS_DIMENSIONS.iter().all(|d| self.bound(*d).is_valid())
    }

    /// Is `self` fully contained within `other` along every dimension?
    ///
    /// Charge: a mismatch on both-set charges fails; a probe with
    /// `other.charge = None` accepts any `self.charge`; a `self.charge =
    /// None` with `other.charge` set fails (self is broader than other on
    /// that dimension, so it cannot be enveloped by it).
    pub fn is_enveloped_by(&self, other: &Interval<P>) -> bool {
        match (self.charge, other.charge) {
            (Some(a), Some(b)) if a != b => return false,
            (None, Some(_)) => return false,
            _ => {}
        }
        CONTINUOUS_DIMENSIONS
            .iter()
            .all(|d| other.bound(*d).envelops(self.bound(*d)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic_interval(mass_min: f64, mass_max: f64) -> Interval<()> {
        Interval {
            label: Some("PEPTIDE".into()),
            handle: None,
            charge: Some(1),
            mass: Bound::new(Some(mass_min), Some(mass_max)),
            rt: Bound::new(Some(1000.0), Some(1001.0)),
            ook0: Bound::new(Some(1000.0), Some(1001.0)),
            intensity: Bound::new(Some(1000.0), Some(1001.0)),
            polarity: Polarity::Exclude,
            payload: None,
        }
    }

    #[test]
    fn valid_interval_passes() {
        assert!(basic_interval(1000.0, 1001.0).is_valid());
    }

    #[test]
    fn inverted_bounds_are_invalid() {
        assert!(!basic_interval(1001.0, 1000.0).is_valid());
    }

    #[test]
    fn enveloped_by_wider_probe() {
        let inner = basic_interval(1000.0, 1001.0);
        let mut outer = Interval::<()>::probe();
        outer.mass = Bound::new(Some(999.0), Some(1002.0));
        outer.rt = Bound::new(Some(999.0), Some(1002.0));
        outer.ook0 = Bound::new(Some(999.0), Some(1002.0));
        outer.intensity = Bound::new(Some(999.0), Some(1002.0));
        assert!(inner.is_enveloped_by(&outer));
    }

    #[test]
    fn not_enveloped_when_outer_charge_narrower() {
        let inner = basic_interval(1000.0, 1001.0);
        let mut outer = Interval::<()>::probe();
        outer.charge = Some(2);
        outer.mass = Bound::new(Some(999.0), Some(1002.0));
        outer.rt = Bound::new(Some(999.0), Some(1002.0));
        outer.ook0 = Bound::new(Some(999.0), Some(1002.0));
        outer.intensity = Bound::new(Some(999.0), Some(1002.0));
        assert!(!inner.is_enveloped_by(&outer));
    }

    #[test]
    fn null_self_charge_not_enveloped_by_set_other_charge() {
        let mut inner = basic_interval(1000.0, 1001.0);
        inner.charge = None;
        let mut outer = Interval::<()>::probe();
        outer.charge = Some(1);
        outer.mass = Bound::new(Some(999.0), Some(1002.0));
        outer.rt = Bound::new(Some(999.0), Some(1002.0));
        outer.ook0 = Bound::new(Some(999.0), Some(1002.0));
        outer.intensity = Bound::new(Some(999.0), Some(1002.0));
        assert!(!inner.is_enveloped_by(&outer));
    }

    #[test]
    fn wildcard_probe_charge_envelops_any_charge() {
        let inner = basic_interval(1000.0, 1001.0);
        let mut outer = Interval::<()>::probe();
        outer.mass = Bound::new(Some(999.0), Some(1002.0));
        outer.rt = Bound::new(Some(999.0), Some(1002.0));
        outer.ook0 = Bound::new(Some(999.0), Some(1002.0));
        outer.intensity = Bound::new(Some(999.0), Some(1002.0));
        assert!(inner.is_enveloped_by(&outer));
    }
}
