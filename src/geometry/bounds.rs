//! Axis-aligned bounding boxes for processor domains.
//!
//! [`union_bounds`] is the region pre-filter used before fragments are read:
//! a fragment whose box misses the region of interest cannot contribute
//! faces to it.

use serde::{Deserialize, Serialize};

/// Axis-aligned box. An empty box has `min > max` on every axis.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundBox {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl Default for BoundBox {
    fn default() -> Self {
        Self::empty()
    }
}

impl BoundBox {
    /// The identity element of [`BoundBox::union`].
    pub const fn empty() -> Self {
        BoundBox {
            min: [f64::INFINITY; 3],
            max: [f64::NEG_INFINITY; 3],
        }
    }

    pub const fn new(min: [f64; 3], max: [f64; 3]) -> Self {
        BoundBox { min, max }
    }

    /// Smallest box containing every point.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a [f64; 3]>) -> Self {
        let mut bb = Self::empty();
        for p in points {
            bb.add_point(*p);
        }
        bb
    }

    pub fn is_empty(&self) -> bool {
        (0..3).any(|k| self.min[k] > self.max[k])
    }

    pub fn add_point(&mut self, p: [f64; 3]) {
        for k in 0..3 {
            self.min[k] = self.min[k].min(p[k]);
            self.max[k] = self.max[k].max(p[k]);
        }
    }

    /// Component-wise min/max of two boxes.
    pub fn union(&self, other: &BoundBox) -> BoundBox {
        let mut out = *self;
        for k in 0..3 {
            out.min[k] = out.min[k].min(other.min[k]);
            out.max[k] = out.max[k].max(other.max[k]);
        }
        out
    }

    /// Closed-interval intersection test; touching boxes overlap.
    pub fn overlaps(&self, other: &BoundBox) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        (0..3).all(|k| self.min[k] <= other.max[k] && other.min[k] <= self.max[k])
    }

    pub fn span(&self) -> [f64; 3] {
        if self.is_empty() {
            return [0.0; 3];
        }
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }

    /// Length of the diagonal (0 for an empty box).
    pub fn diag(&self) -> f64 {
        let s = self.span();
        (s[0] * s[0] + s[1] * s[1] + s[2] * s[2]).sqrt()
    }

    /// Grow on every side by `frac` of the diagonal.
    pub fn inflate(&self, frac: f64) -> BoundBox {
        if self.is_empty() {
            return *self;
        }
        let d = frac * self.diag();
        BoundBox {
            min: [self.min[0] - d, self.min[1] - d, self.min[2] - d],
            max: [self.max[0] + d, self.max[1] + d, self.max[2] + d],
        }
    }
}

/// Union of a set of boxes; the empty box for an empty set.
pub fn union_bounds<'a>(boxes: impl IntoIterator<Item = &'a BoundBox>) -> BoundBox {
    boxes
        .into_iter()
        .fold(BoundBox::empty(), |acc, bb| acc.union(bb))
}
