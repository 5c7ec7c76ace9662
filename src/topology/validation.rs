//! Topology validation helpers for [`PolyMesh`].

use crate::geometry::metrics::{add, norm};
use crate::mesh_error::MeshError;
use crate::topology::poly_mesh::PolyMesh;
use std::collections::{HashSet, VecDeque};

/// Optional checks on top of the structural ones run by [`check_poly_mesh`].
#[derive(Debug, Clone, Copy)]
pub struct TopologyValidationOptions {
    /// Every cell's outward area vectors must sum to (nearly) zero.
    pub check_closed_cells: bool,
    /// Every cell must be reachable from cell 0 through internal faces.
    pub check_connected: bool,
    /// How to handle a failed optional check.
    pub handling: ValidationHandling,
}

impl TopologyValidationOptions {
    /// Enable all checks, failing on the first violation.
    pub fn all() -> Self {
        Self {
            check_closed_cells: true,
            check_connected: true,
            handling: ValidationHandling::Error,
        }
    }
}

impl Default for TopologyValidationOptions {
    fn default() -> Self {
        Self {
            check_closed_cells: false,
            check_connected: false,
            handling: ValidationHandling::Warn,
        }
    }
}

/// Behavior when an optional check fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationHandling {
    /// Skip reporting.
    Ignore,
    /// Log a warning.
    Warn,
    /// Return an error.
    Error,
}

/// Structural consistency of the mesh arrays.
///
/// Checks array lengths, index ranges, owner < neighbour ordering of
/// internal faces, that every cell is referenced, and that the patches cover
/// the boundary faces contiguously with unique names.
pub fn check_poly_mesh(mesh: &PolyMesh) -> Result<(), MeshError> {
    let n_faces = mesh.n_faces();
    let n_points = mesh.n_points();
    let n_internal = mesh.n_internal_faces();

    if mesh.owner().len() != n_faces {
        return Err(MeshError::InvalidTopology(format!(
            "owner list has {} entries for {n_faces} faces",
            mesh.owner().len()
        )));
    }
    if n_internal > n_faces {
        return Err(MeshError::InvalidTopology(format!(
            "neighbour list has {n_internal} entries for {n_faces} faces"
        )));
    }

    for (f, face) in mesh.faces().iter().enumerate() {
        if face.len() < 3 {
            return Err(MeshError::InvalidTopology(format!(
                "face {f} has {} points (need at least 3)",
                face.len()
            )));
        }
        if let Some(p) = face.iter().find(|&p| p >= n_points) {
            return Err(MeshError::InvalidTopology(format!(
                "face {f} references point {p} but mesh has {n_points} points"
            )));
        }
    }

    for (f, &nei) in mesh.neighbour().iter().enumerate() {
        let own = mesh.owner()[f];
        if own >= nei {
            return Err(MeshError::InvalidTopology(format!(
                "internal face {f}: owner {own} must be lower than neighbour {nei}"
            )));
        }
    }

    let mut referenced = vec![false; mesh.n_cells()];
    for &c in mesh.owner().iter().chain(mesh.neighbour()) {
        referenced[c] = true;
    }
    if let Some(c) = referenced.iter().position(|r| !r) {
        return Err(MeshError::InvalidTopology(format!(
            "cell {c} is not referenced by any face"
        )));
    }

    let mut next = n_internal;
    let mut names = HashSet::new();
    for patch in mesh.patches() {
        if !names.insert(patch.name.as_str()) {
            return Err(MeshError::InvalidTopology(format!(
                "duplicate patch name `{}`",
                patch.name
            )));
        }
        if patch.start != next {
            return Err(MeshError::InvalidTopology(format!(
                "patch `{}` starts at face {} but the previous range ends at {next}",
                patch.name, patch.start
            )));
        }
        next += patch.size;
    }
    if next != n_faces {
        return Err(MeshError::InvalidTopology(format!(
            "patches cover faces up to {next} but mesh has {n_faces} faces"
        )));
    }
    Ok(())
}

/// Structural checks plus the optional geometric/connectivity checks.
pub fn validate_poly_mesh(
    mesh: &PolyMesh,
    options: TopologyValidationOptions,
) -> Result<(), MeshError> {
    check_poly_mesh(mesh)?;

    if options.check_closed_cells {
        if let Some((cell, residual)) = first_open_cell(mesh, 1e-8) {
            report(
                options.handling,
                format!("cell {cell} is not closed (area vector residual {residual:e})"),
            )?;
        }
    }

    if options.check_connected {
        let regions = connected_regions(mesh);
        if regions > 1 {
            report(
                options.handling,
                format!("mesh splits into {regions} disconnected regions"),
            )?;
        }
    }
    Ok(())
}

fn report(handling: ValidationHandling, message: String) -> Result<(), MeshError> {
    match handling {
        ValidationHandling::Ignore => Ok(()),
        ValidationHandling::Warn => {
            log::warn!("{message}");
            Ok(())
        }
        ValidationHandling::Error => Err(MeshError::InvalidTopology(message)),
    }
}

/// Number of connected cell regions (0 for a mesh without cells).
pub fn connected_regions(mesh: &PolyMesh) -> usize {
    let adj = mesh.cell_cells();
    let mut seen = vec![false; mesh.n_cells()];
    let mut regions = 0;
    let mut queue = VecDeque::new();
    for seed in 0..mesh.n_cells() {
        if seen[seed] {
            continue;
        }
        regions += 1;
        seen[seed] = true;
        queue.push_back(seed);
        while let Some(c) = queue.pop_front() {
            for &n in &adj[c] {
                if !seen[n] {
                    seen[n] = true;
                    queue.push_back(n);
                }
            }
        }
    }
    regions
}

/// True when every cell is reachable from every other through internal faces.
pub fn is_connected(mesh: &PolyMesh) -> bool {
    connected_regions(mesh) <= 1
}

/// First cell whose outward area vectors do not sum to zero, relative to the
/// cell's total face area.
pub fn first_open_cell(mesh: &PolyMesh, rel_tol: f64) -> Option<(usize, f64)> {
    let areas = mesh.face_area_vectors();
    let mut sum = vec![[0.0; 3]; mesh.n_cells()];
    let mut mag = vec![0.0; mesh.n_cells()];
    for (f, a) in areas.iter().enumerate() {
        let own = mesh.owner()[f];
        sum[own] = add(sum[own], *a);
        mag[own] += norm(*a);
        if let Some(&nei) = mesh.neighbour().get(f) {
            sum[nei] = add(sum[nei], [-a[0], -a[1], -a[2]]);
            mag[nei] += norm(*a);
        }
    }
    sum.iter()
        .zip(&mag)
        .enumerate()
        .map(|(c, (s, m))| (c, norm(*s) / m.max(f64::MIN_POSITIVE)))
        .find(|&(_, residual)| residual > rel_tol)
}
