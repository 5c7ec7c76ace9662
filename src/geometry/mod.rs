//! Geometry utilities for mesh-reconstruct.
//!
//! - [`matrix`]: closed-form 3×3 determinant, inverse, pivoting and symmetric
//!   eigenvalues used by least-squares stencil fits.
//! - [`bounds`]: axis-aligned boxes and the processor-domain union filter.
//! - [`metrics`]: face centres and area vectors.

pub mod bounds;
pub mod matrix;
pub mod metrics;

pub use bounds::{BoundBox, union_bounds};
pub use matrix::{EigenTriple, PivotRecord, SquareMatrix3, det, det2, eigen, inv, pivot, solve};
