//! `Face`: an ordered loop of point indices.
//!
//! The vertex order defines the face normal (right-hand rule). For an
//! internal face the normal points from the owner cell to the neighbour.

use crate::geometry::metrics;
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// Polygonal face stored as indices into the mesh point array.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Face(Vec<usize>);

impl Face {
    pub fn new(points: Vec<usize>) -> Self {
        Face(points)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn points(&self) -> &[usize] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }

    /// Same loop, opposite orientation (first vertex kept).
    pub fn reversed(&self) -> Face {
        let mut pts = Vec::with_capacity(self.0.len());
        if let Some(&first) = self.0.first() {
            pts.push(first);
            pts.extend(self.0[1..].iter().rev());
        }
        Face(pts)
    }

    /// Apply an old→new point map.
    pub fn renumbered(&self, point_map: &[usize]) -> Face {
        Face(self.0.iter().map(|&p| point_map[p]).collect())
    }

    /// Point indices sorted, for orientation-independent comparison.
    pub fn sorted_points(&self) -> Vec<usize> {
        let mut pts = self.0.clone();
        pts.sort_unstable();
        pts
    }

    pub fn vertices(&self, points: &[[f64; 3]]) -> Vec<[f64; 3]> {
        self.0.iter().map(|&p| points[p]).collect()
    }

    pub fn centre(&self, points: &[[f64; 3]]) -> [f64; 3] {
        metrics::face_centre(&self.vertices(points))
    }

    pub fn area_vector(&self, points: &[[f64; 3]]) -> [f64; 3] {
        metrics::face_area_vector(&self.vertices(points))
    }
}

impl From<Vec<usize>> for Face {
    fn from(points: Vec<usize>) -> Self {
        Face(points)
    }
}

impl Index<usize> for Face {
    type Output = usize;

    fn index(&self, i: usize) -> &usize {
        &self.0[i]
    }
}
