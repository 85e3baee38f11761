//! Probe point value type: a 5D coordinate where any dimension may be a
//! wildcard (`None`).

use crate::bounds::contains_half_open;
use crate::interval::Interval;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub charge: Option<i32>,
    pub mass: Option<f64>,
    pub rt: Option<f64>,
    pub ook0: Option<f64>,
    pub intensity: Option<f64>,
}

impl Point {
    pub fn wildcard() -> Self {
        Self::default()
    }

    /// Is this point inside `interval`? A `None` coordinate matches
    /// anything on that dimension; a set coordinate is checked half-open
    /// against the interval's bound (inclusive-min, exclusive-max).
    pub fn is_bounded_by<P>(&self, interval: &Interval<P>) -> bool {
        if let (Some(pc), Some(ic)) = (self.charge, interval.charge) {
            if pc != ic {
                return false;
            }
        }
        if let Some(v) = self.mass {
            if !contains_half_open(interval.mass.min, interval.mass.max, v) {
                return false;
            }
        }
        if let Some(v) = self.rt {
            if !contains_half_open(interval.rt.min, interval.rt.max, v) {
                return false;
            }
        }
        if let Some(v) = self.ook0 {
            if !contains_half_open(interval.ook0.min, interval.ook0.max, v) {
                return false;
            }
        }
        if let Some(v) = self.intensity {
            if !contains_half_open(interval.intensity.min, interval.intensity.max, v) {
                return false;
            }
        }
        true
    }
}
