//! Case directory layout for decomposed meshes.
//!
//! ```text
//! <root>/processor<N>/<mesh_dir>/{points,faces,owner,neighbour,boundary,bounds}
//! <root>/processor<N>/<field_dir>/<field>
//! ```

use crate::mesh_error::MeshError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const PROCESSOR_PREFIX: &str = "processor";
const DEFAULT_MESH_DIR: &str = "constant/polyMesh";

/// Root directory plus the mesh subdirectory used inside each processor
/// directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseLayout {
    pub root: PathBuf,
    #[serde(default = "default_mesh_dir")]
    pub mesh_dir: PathBuf,
}

fn default_mesh_dir() -> PathBuf {
    PathBuf::from(DEFAULT_MESH_DIR)
}

impl CaseLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        CaseLayout {
            root: root.into(),
            mesh_dir: default_mesh_dir(),
        }
    }

    pub fn with_mesh_dir(mut self, mesh_dir: impl Into<PathBuf>) -> Self {
        self.mesh_dir = mesh_dir.into();
        self
    }

    /// `<root>/processor<proci>`
    pub fn processor_dir(&self, proci: usize) -> PathBuf {
        self.root.join(format!("{PROCESSOR_PREFIX}{proci}"))
    }

    /// Path of processor `proci`'s copy of mesh file `file`. No I/O.
    pub fn local_path(&self, proci: usize, file: impl AsRef<Path>) -> PathBuf {
        self.processor_dir(proci).join(&self.mesh_dir).join(file)
    }

    /// Path of processor `proci`'s field `name` under `field_dir`. No I/O.
    pub fn field_path(&self, proci: usize, field_dir: impl AsRef<Path>, name: &str) -> PathBuf {
        self.processor_dir(proci).join(field_dir).join(name)
    }

    /// Processor indices present on disk, ascending.
    pub fn list_processors(&self) -> Result<Vec<usize>, MeshError> {
        let entries = fs::read_dir(&self.root).map_err(|e| MeshError::io(&self.root, e))?;
        let mut procs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| MeshError::io(&self.root, e))?;
            let name = entry.file_name();
            let Some(index) = name
                .to_str()
                .and_then(|n| n.strip_prefix(PROCESSOR_PREFIX))
                .and_then(|n| n.parse::<usize>().ok())
            else {
                continue;
            };
            if entry.path().is_dir() {
                procs.push(index);
            }
        }
        procs.sort_unstable();
        Ok(procs)
    }
}
