//! Tolerance-based constructor: expand a probe [`Point`] into a bounding
//! [`Interval`] (spec §4.2, §6).

use crate::interval::{Bound, Interval, Polarity};
use crate::point::Point;
use serde::{Deserialize, Serialize};

/// Per-dimension tolerances used to build an [`Interval`] around a
/// [`Point`]. `mass_tolerance` is parts-per-million; `rt_tolerance` and
/// `ook0_tolerance` are absolute; `intensity_tolerance` is multiplicative.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DynamicExclusionTolerance {
    pub exact_charge: bool,
    pub mass_tolerance: Option<f64>,
    pub rt_tolerance: Option<f64>,
    pub ook0_tolerance: Option<f64>,
    pub intensity_tolerance: Option<f64>,
}

fn ppm_bounds(v: Option<f64>, tol: Option<f64>) -> Bound {
    match (v, tol) {
        (Some(v), Some(tol)) if tol != 0.0 => {
            Bound::new(Some(v - v * tol / 1_000_000.0), Some(v + v * tol / 1_000_000.0))
        }
        _ => Bound::unbounded(),
    }
}

fn absolute_bounds(v: Option<f64>, tol: Option<f64>) -> Bound {
    match (v, tol) {
        (Some(v), Some(tol)) if tol != 0.0 => Bound::new(Some(v - tol), Some(v + tol)),
        _ => Bound::unbounded(),
    }
}

fn multiplicative_bounds(v: Option<f64>, tol: Option<f64>) -> Bound {
    match (v, tol) {
        (Some(v), Some(tol)) if tol != 0.0 => Bound::new(Some(v - v * tol), Some(v + v * tol)),
        _ => Bound::unbounded(),
    }
}

impl DynamicExclusionTolerance {
    /// Expand `point` into a bounding [`Interval`] under these tolerances.
    /// The produced interval has no label and no handle; the caller assigns
    /// both via [`crate::index::ExclusionIndex::add`].
    pub fn expand<P>(&self, point: &Point) -> Interval<P> {
        Interval {
            label: None,
            handle: None,
            charge: if self.exact_charge { point.charge } else { None },
            mass: ppm_bounds(point.mass, self.mass_tolerance),
            rt: absolute_bounds(point.rt, self.rt_tolerance),
            ook0: absolute_bounds(point.ook0, self.ook0_tolerance),
            intensity: multiplicative_bounds(point.intensity, self.intensity_tolerance),
            polarity: Polarity::Exclude,
            payload: None,
        }
    }
}
