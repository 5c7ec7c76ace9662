//! `PolyMesh`: arena representation of an unstructured polyhedral mesh.
//!
//! Points, faces and cells are addressed by stable `usize` indices into
//! growable arrays:
//! - `points[p]` are coordinates,
//! - `faces[f]` are point loops,
//! - `owner[f]` is the cell on the negative side of face `f`,
//! - `neighbour[f]` exists for internal faces only (`f < n_internal_faces`),
//! - `patches` partition the boundary faces `n_internal_faces..n_faces` into
//!   contiguous named ranges.
//!
//! Cells are implicit: the cell count is one past the largest owner or
//! neighbour index.

use crate::geometry::bounds::BoundBox;
use crate::geometry::metrics;
use crate::mesh_error::MeshError;
use crate::topology::face::Face;
use crate::topology::patch::Patch;
use crate::topology::validation;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PolyMesh {
    points: Vec<[f64; 3]>,
    faces: Vec<Face>,
    owner: Vec<usize>,
    neighbour: Vec<usize>,
    patches: Vec<Patch>,
    n_cells: usize,
}

impl PolyMesh {
    /// Assemble and validate a mesh from its raw arrays.
    pub fn new(
        points: Vec<[f64; 3]>,
        faces: Vec<Face>,
        owner: Vec<usize>,
        neighbour: Vec<usize>,
        patches: Vec<Patch>,
    ) -> Result<Self, MeshError> {
        let mesh = Self::from_parts_unchecked(points, faces, owner, neighbour, patches);
        validation::check_poly_mesh(&mesh)?;
        Ok(mesh)
    }

    pub(crate) fn from_parts_unchecked(
        points: Vec<[f64; 3]>,
        faces: Vec<Face>,
        owner: Vec<usize>,
        neighbour: Vec<usize>,
        patches: Vec<Patch>,
    ) -> Self {
        let n_cells = owner
            .iter()
            .chain(neighbour.iter())
            .max()
            .map_or(0, |&c| c + 1);
        PolyMesh {
            points,
            faces,
            owner,
            neighbour,
            patches,
            n_cells,
        }
    }

    /// Consume the mesh and return `(points, faces, owner, neighbour, patches)`.
    pub fn into_parts(self) -> (Vec<[f64; 3]>, Vec<Face>, Vec<usize>, Vec<usize>, Vec<Patch>) {
        (
            self.points,
            self.faces,
            self.owner,
            self.neighbour,
            self.patches,
        )
    }

    #[inline]
    pub fn points(&self) -> &[[f64; 3]] {
        &self.points
    }

    #[inline]
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    #[inline]
    pub fn owner(&self) -> &[usize] {
        &self.owner
    }

    #[inline]
    pub fn neighbour(&self) -> &[usize] {
        &self.neighbour
    }

    #[inline]
    pub fn patches(&self) -> &[Patch] {
        &self.patches
    }

    #[inline]
    pub fn n_points(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn n_faces(&self) -> usize {
        self.faces.len()
    }

    #[inline]
    pub fn n_internal_faces(&self) -> usize {
        self.neighbour.len()
    }

    #[inline]
    pub fn n_boundary_faces(&self) -> usize {
        self.faces.len() - self.neighbour.len()
    }

    #[inline]
    pub fn n_cells(&self) -> usize {
        self.n_cells
    }

    #[inline]
    pub fn is_internal_face(&self, face: usize) -> bool {
        face < self.neighbour.len()
    }

    pub fn patch(&self, name: &str) -> Option<&Patch> {
        self.patches.iter().find(|p| p.name == name)
    }

    /// Index of the patch holding boundary face `face`.
    pub fn which_patch(&self, face: usize) -> Option<usize> {
        self.patches
            .iter()
            .position(|p| p.range().contains(&face))
    }

    /// Processor interface patches, with their indices.
    pub fn processor_patches(&self) -> impl Iterator<Item = (usize, &Patch)> {
        self.patches
            .iter()
            .enumerate()
            .filter(|(_, p)| p.kind.is_processor())
    }

    pub fn face_centre(&self, face: usize) -> [f64; 3] {
        self.faces[face].centre(&self.points)
    }

    pub fn face_area_vectors(&self) -> Vec<[f64; 3]> {
        self.faces
            .iter()
            .map(|f| f.area_vector(&self.points))
            .collect()
    }

    /// Point indices used by each cell, sorted and unique.
    pub fn cell_points(&self) -> Vec<Vec<usize>> {
        let mut cells = vec![Vec::new(); self.n_cells];
        for (f, face) in self.faces.iter().enumerate() {
            cells[self.owner[f]].extend(face.iter());
            if let Some(&nei) = self.neighbour.get(f) {
                cells[nei].extend(face.iter());
            }
        }
        for pts in &mut cells {
            pts.sort_unstable();
            pts.dedup();
        }
        cells
    }

    /// Approximate cell centres (average of the cell's vertices).
    pub fn cell_centres(&self) -> Vec<[f64; 3]> {
        self.cell_points()
            .iter()
            .map(|pts| {
                let verts: Vec<[f64; 3]> = pts.iter().map(|&p| self.points[p]).collect();
                metrics::vertex_average(&verts)
            })
            .collect()
    }

    /// Cell-to-cell adjacency through internal faces.
    pub fn cell_cells(&self) -> Vec<Vec<usize>> {
        let mut adj = vec![Vec::new(); self.n_cells];
        for (f, &nei) in self.neighbour.iter().enumerate() {
            let own = self.owner[f];
            adj[own].push(nei);
            adj[nei].push(own);
        }
        adj
    }

    pub fn bounds(&self) -> BoundBox {
        BoundBox::from_points(self.points.iter())
    }

}
