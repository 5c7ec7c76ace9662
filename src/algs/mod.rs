//! Re-export public algorithms.

pub mod couple;
pub mod mesh_add;
pub mod reconstruct;

pub use couple::CoupleInfo;
pub use mesh_add::{AddedMeshMap, add};
pub use reconstruct::{
    LocalMesh, ReconstructOptions, ReconstructedMesh, local_path, proc_bounds, reconstruct,
    relevant_processors,
};
