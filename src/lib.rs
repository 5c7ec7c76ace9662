#![cfg_attr(docsrs, feature(doc_cfg))]
//! # mesh-reconstruct
//!
//! mesh-reconstruct rebuilds a single polyhedral mesh from the per-processor
//! fragments left by a domain decomposition, and provides the closed-form
//! 3×3 matrix kernels used to fit least-squares reconstruction stencils on
//! the result.
//!
//! ## Features
//! - Closed-form 3×3 determinant (FMA-compensated 2×2 minors), inverse,
//!   partial pivoting and symmetric eigenvalues in [`geometry::matrix`]
//! - Arena-indexed [`PolyMesh`] with processor interface patches
//! - Versioned fragment files and a scoped file-access-mode guard in [`io`]
//! - Geometric face coupling, fragment merging with old→new index maps, and
//!   region-pruned reconstruction in [`algs`]
//!
//! ## Determinism
//!
//! Fragments are merged in ascending processor order, so the reconstructed
//! numbering depends only on the set of processors, never on the order they
//! were listed in.
//!
//! ## Usage
//! ```no_run
//! use mesh_reconstruct::prelude::*;
//!
//! # fn main() -> Result<(), MeshError> {
//! let mut handler = FileHandler::default();
//! let case = CaseLayout::new("cases/cavity");
//! let local = LocalMesh::read(&handler, case, 0)?;
//! let global = reconstruct(&mut handler, &[0, 1, 2, 3], &local, &ReconstructOptions::default())?;
//! println!("{} cells", global.mesh.n_cells());
//! # Ok(())
//! # }
//! ```

pub mod algs;
pub mod debug_invariants;
pub mod geometry;
pub mod io;
pub mod mesh_error;
pub mod topology;

pub use debug_invariants::DebugInvariants;
pub use topology::poly_mesh::PolyMesh;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::couple::CoupleInfo;
    pub use crate::algs::mesh_add::{AddedMeshMap, add};
    pub use crate::algs::reconstruct::{
        LocalMesh, ReconstructOptions, ReconstructedMesh, proc_bounds, reconstruct,
    };
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::geometry::bounds::{BoundBox, union_bounds};
    pub use crate::geometry::matrix::{SquareMatrix3, det, det2, eigen, inv, pivot};
    pub use crate::io::case::CaseLayout;
    pub use crate::io::{FileAccessMode, FileHandler, FileHandlerControl};
    pub use crate::mesh_error::MeshError;
    pub use crate::topology::face::Face;
    pub use crate::topology::patch::{Patch, PatchKind};
    pub use crate::topology::poly_mesh::PolyMesh;
}
