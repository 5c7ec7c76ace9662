//! Mesh topology: the arena-indexed polyhedral mesh and its parts.
//!
//! - [`face::Face`]: ordered point loops
//! - [`patch::Patch`] and [`patch::PatchKind`]: named boundary ranges,
//!   including processor interfaces left by decomposition
//! - [`poly_mesh::PolyMesh`]: points/faces/owner/neighbour/patches arrays
//! - [`validation`]: structural and geometric consistency checks

pub mod face;
pub mod patch;
pub mod poly_mesh;
pub mod validation;

pub use face::Face;
pub use patch::{Patch, PatchKind, processor_patch_name};
pub use poly_mesh::PolyMesh;
