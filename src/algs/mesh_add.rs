//! Merging one mesh fragment into an accumulated mesh.
//!
//! [`add`] appends the cells of `mesh1` after those of `mesh0`, reuses the
//! `mesh0` copies of matched points, turns every coupled face pair into a
//! single internal face and merges boundary patches by name. The old→new
//! index tables are returned as an [`AddedMeshMap`] so that data attached to
//! either input can follow.

use crate::algs::couple::CoupleInfo;
use crate::debug_invariants::DebugInvariants;
use crate::geometry::metrics::distance;
use crate::mesh_error::MeshError;
use crate::topology::face::Face;
use crate::topology::patch::{Patch, PatchKind};
use crate::topology::poly_mesh::PolyMesh;
use itertools::Itertools;
use std::collections::{HashMap, HashSet};

/// Old→new index correspondence produced by one [`add`].
///
/// Everything from `mesh0` survives, so its point, face and cell maps are
/// total. Faces of `mesh1` that were coupled into an internal face map to
/// `None`; the merged face is reachable through `face_map0`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AddedMeshMap {
    pub n_points: usize,
    pub n_faces: usize,
    pub n_cells: usize,
    pub point_map0: Vec<usize>,
    pub point_map1: Vec<usize>,
    pub face_map0: Vec<usize>,
    pub face_map1: Vec<Option<usize>>,
    pub cell_map0: Vec<usize>,
    pub cell_map1: Vec<usize>,
    /// `None` for processor patches emptied by the merge.
    pub patch_map0: Vec<Option<usize>>,
    pub patch_map1: Vec<Option<usize>>,
    /// Number of face pairs turned into internal faces.
    pub coupled_faces: usize,
    /// Interface faces left on the boundary without a partner (new indices).
    pub unmatched_faces: Vec<usize>,
}

impl AddedMeshMap {
    /// Concatenate per-cell values of both inputs in merged cell order.
    pub fn map_cell_values<T: Clone>(
        &self,
        values0: &[T],
        values1: &[T],
    ) -> Result<Vec<T>, MeshError> {
        check_len("cell", values0.len(), self.cell_map0.len())?;
        check_len("cell", values1.len(), self.cell_map1.len())?;
        scatter(
            "cell",
            self.n_cells,
            self.cell_map1
                .iter()
                .zip(values1)
                .chain(self.cell_map0.iter().zip(values0))
                .map(|(&new, v)| (new, v)),
        )
    }

    /// Per-point values in merged order. Shared points keep the `mesh0` value.
    pub fn map_point_values<T: Clone>(
        &self,
        values0: &[T],
        values1: &[T],
    ) -> Result<Vec<T>, MeshError> {
        check_len("point", values0.len(), self.point_map0.len())?;
        check_len("point", values1.len(), self.point_map1.len())?;
        scatter(
            "point",
            self.n_points,
            self.point_map1
                .iter()
                .zip(values1)
                .chain(self.point_map0.iter().zip(values0))
                .map(|(&new, v)| (new, v)),
        )
    }

    /// Per-face values in merged order. Coupled faces keep the `mesh0` value.
    pub fn map_face_values<T: Clone>(
        &self,
        values0: &[T],
        values1: &[T],
    ) -> Result<Vec<T>, MeshError> {
        check_len("face", values0.len(), self.face_map0.len())?;
        check_len("face", values1.len(), self.face_map1.len())?;
        let from1 = self
            .face_map1
            .iter()
            .zip(values1)
            .filter_map(|(new, v)| new.map(|n| (n, v)));
        let from0 = self.face_map0.iter().zip(values0).map(|(&n, v)| (n, v));
        scatter("face", self.n_faces, from1.chain(from0))
    }
}

fn check_len(what: &str, got: usize, expected: usize) -> Result<(), MeshError> {
    if got != expected {
        return Err(MeshError::InvalidTopology(format!(
            "{got} {what} values supplied for {expected} {what}s"
        )));
    }
    Ok(())
}

/// Later sources overwrite earlier ones.
fn scatter<'a, T: Clone + 'a>(
    what: &str,
    n: usize,
    sources: impl Iterator<Item = (usize, &'a T)>,
) -> Result<Vec<T>, MeshError> {
    let mut out: Vec<Option<T>> = vec![None; n];
    for (new, v) in sources {
        out[new] = Some(v.clone());
    }
    out.into_iter()
        .enumerate()
        .map(|(i, v)| {
            v.ok_or_else(|| MeshError::InvalidTopology(format!("merged {what} {i} has no value")))
        })
        .collect()
}

/// Where a merged boundary patch takes its faces from.
struct PatchPlan {
    name: String,
    kind: PatchKind,
    src0: Option<usize>,
    src1: Option<usize>,
}

#[derive(Clone, Copy)]
enum FaceSource {
    Mesh0(usize),
    Mesh1(usize),
}

/// Merge `mesh1` into `mesh0` using the face pairs in `couple`.
///
/// Coupled faces keep the `mesh0` point loop and orientation, with the
/// `mesh1` cell as neighbour. Internal faces of the result are ordered by
/// (owner, neighbour). Interface faces without a partner abort the merge
/// when `valid_boundary` is set; otherwise they are logged and left on their
/// processor patch. On error `mesh0` is left untouched.
pub fn add(
    mesh0: &mut PolyMesh,
    mesh1: &PolyMesh,
    couple: &CoupleInfo,
    valid_boundary: bool,
) -> Result<AddedMeshMap, MeshError> {
    check_couple(mesh0, mesh1, couple)?;

    let n_unmatched = couple.unmatched0.len() + couple.unmatched1.len();
    if n_unmatched > 0 {
        if valid_boundary {
            return Err(MeshError::CoupleMismatch {
                merged: couple.merged.clone(),
                incoming: couple.incoming,
                reason: format!(
                    "{} + {} interface faces have no partner",
                    couple.unmatched0.len(),
                    couple.unmatched1.len()
                ),
            });
        }
        log::warn!(
            "merging processor {} into {:?}: keeping {n_unmatched} unmatched interface faces on the boundary",
            couple.incoming,
            couple.merged
        );
    }

    let plans = plan_patches(mesh0.patches(), mesh1.patches(), couple.incoming, valid_boundary)?;

    // points: mesh0 keeps its numbering, unmatched mesh1 points are appended
    let mut points = mesh0.points().to_vec();
    let mut point_map1 = Vec::with_capacity(mesh1.n_points());
    for (p1, &x) in mesh1.points().iter().enumerate() {
        match couple.point_matches.get(&p1) {
            Some(&p0) => point_map1.push(p0),
            None => {
                point_map1.push(points.len());
                points.push(x);
            }
        }
    }

    let nc0 = mesh0.n_cells();
    let nc1 = mesh1.n_cells();
    let cell_map1 = (0..nc1).map(|c| c + nc0).collect_vec();

    let coupled0: HashMap<usize, usize> = couple.face_pairs.iter().copied().collect();
    let coupled1: HashSet<usize> = couple.face_pairs.iter().map(|&(_, f1)| f1).collect();
    let unmatched0: HashSet<usize> = couple.unmatched0.iter().copied().collect();
    let unmatched1: HashSet<usize> = couple.unmatched1.iter().copied().collect();

    // internal faces as (owner, neighbour, face, source)
    let mut internal: Vec<(usize, usize, Face, FaceSource)> = Vec::with_capacity(
        mesh0.n_internal_faces() + mesh1.n_internal_faces() + couple.face_pairs.len(),
    );
    for f in 0..mesh0.n_internal_faces() {
        internal.push((
            mesh0.owner()[f],
            mesh0.neighbour()[f],
            mesh0.faces()[f].clone(),
            FaceSource::Mesh0(f),
        ));
    }
    for &(f0, f1) in &couple.face_pairs {
        internal.push((
            mesh0.owner()[f0],
            cell_map1[mesh1.owner()[f1]],
            mesh0.faces()[f0].clone(),
            FaceSource::Mesh0(f0),
        ));
    }
    for f in 0..mesh1.n_internal_faces() {
        internal.push((
            cell_map1[mesh1.owner()[f]],
            cell_map1[mesh1.neighbour()[f]],
            mesh1.faces()[f].renumbered(&point_map1),
            FaceSource::Mesh1(f),
        ));
    }
    let internal = internal
        .into_iter()
        .sorted_by_key(|&(own, nei, _, _)| (own, nei))
        .collect_vec();

    let n_faces = mesh0.n_faces() + mesh1.n_faces() - couple.face_pairs.len();
    let mut faces = Vec::with_capacity(n_faces);
    let mut owner = Vec::with_capacity(n_faces);
    let mut neighbour = Vec::with_capacity(internal.len());
    let mut face_map0 = vec![usize::MAX; mesh0.n_faces()];
    let mut face_map1 = vec![None; mesh1.n_faces()];

    for (own, nei, face, source) in internal {
        let new = faces.len();
        match source {
            FaceSource::Mesh0(f0) => {
                face_map0[f0] = new;
                if let Some(&f1) = coupled0.get(&f0) {
                    face_map1[f1] = Some(new);
                }
            }
            FaceSource::Mesh1(f1) => face_map1[f1] = Some(new),
        }
        faces.push(face);
        owner.push(own);
        neighbour.push(nei);
    }

    let mut patches = Vec::with_capacity(plans.len());
    let mut patch_map0 = vec![None; mesh0.patches().len()];
    let mut patch_map1 = vec![None; mesh1.patches().len()];
    let mut unmatched_faces = Vec::new();

    for plan in plans {
        let start = faces.len();
        if let Some(pi) = plan.src0 {
            for f0 in mesh0.patches()[pi].range() {
                if coupled0.contains_key(&f0) {
                    continue;
                }
                if unmatched0.contains(&f0) {
                    unmatched_faces.push(faces.len());
                }
                face_map0[f0] = faces.len();
                faces.push(mesh0.faces()[f0].clone());
                owner.push(mesh0.owner()[f0]);
            }
        }
        if let Some(pi) = plan.src1 {
            for f1 in mesh1.patches()[pi].range() {
                if coupled1.contains(&f1) {
                    continue;
                }
                if unmatched1.contains(&f1) {
                    unmatched_faces.push(faces.len());
                }
                face_map1[f1] = Some(faces.len());
                faces.push(mesh1.faces()[f1].renumbered(&point_map1));
                owner.push(cell_map1[mesh1.owner()[f1]]);
            }
        }
        let size = faces.len() - start;
        if size == 0 && plan.kind.is_processor() {
            log::debug!("dropping emptied processor patch `{}`", plan.name);
            continue;
        }
        let new = patches.len();
        if let Some(pi) = plan.src0 {
            patch_map0[pi] = Some(new);
        }
        if let Some(pi) = plan.src1 {
            patch_map1[pi] = Some(new);
        }
        patches.push(Patch::new(plan.name, plan.kind, start, size));
    }

    let n_points = points.len();
    let merged = PolyMesh::new(points, faces, owner, neighbour, patches).map_err(|e| {
        MeshError::CoupleMismatch {
            merged: couple.merged.clone(),
            incoming: couple.incoming,
            reason: format!("merged mesh is inconsistent: {e}"),
        }
    })?;

    log::debug!(
        "merged processor {} into {:?}: {} + {nc1} cells, {} coupled faces",
        couple.incoming,
        couple.merged,
        nc0,
        couple.face_pairs.len()
    );

    let map = AddedMeshMap {
        n_points,
        n_faces: merged.n_faces(),
        n_cells: merged.n_cells(),
        point_map0: (0..mesh0.n_points()).collect(),
        point_map1,
        face_map0,
        face_map1,
        cell_map0: (0..nc0).collect(),
        cell_map1,
        patch_map0,
        patch_map1,
        coupled_faces: couple.face_pairs.len(),
        unmatched_faces,
    };
    merged.debug_assert_invariants();
    *mesh0 = merged;
    Ok(map)
}

/// Reject face pairs that do not describe coincident boundary faces.
fn check_couple(mesh0: &PolyMesh, mesh1: &PolyMesh, couple: &CoupleInfo) -> Result<(), MeshError> {
    let mismatch = |reason: String| MeshError::CoupleMismatch {
        merged: couple.merged.clone(),
        incoming: couple.incoming,
        reason,
    };

    let mut targets = HashSet::with_capacity(couple.point_matches.len());
    for (&p1, &p0) in couple.point_matches.iter().sorted() {
        if p1 >= mesh1.n_points() || p0 >= mesh0.n_points() {
            return Err(mismatch(format!("point match {p1} -> {p0} is out of range")));
        }
        let d = distance(mesh1.points()[p1], mesh0.points()[p0]);
        if d > couple.tolerance {
            return Err(mismatch(format!(
                "points {p1} and {p0} are {d:e} apart (tolerance {:e})",
                couple.tolerance
            )));
        }
        if !targets.insert(p0) {
            return Err(mismatch(format!("point {p0} is matched more than once")));
        }
    }

    let mut seen0 = HashSet::with_capacity(couple.face_pairs.len());
    let mut seen1 = HashSet::with_capacity(couple.face_pairs.len());
    for &(f0, f1) in &couple.face_pairs {
        if f0 >= mesh0.n_faces() || mesh0.is_internal_face(f0) {
            return Err(mismatch(format!("face {f0} is not a boundary face of the merged mesh")));
        }
        if f1 >= mesh1.n_faces() || mesh1.is_internal_face(f1) {
            return Err(mismatch(format!("face {f1} is not a boundary face of the fragment")));
        }
        if !seen0.insert(f0) || !seen1.insert(f1) {
            return Err(mismatch(format!("face pair ({f0}, {f1}) reuses a coupled face")));
        }
        let mapped: Option<Vec<usize>> = mesh1.faces()[f1]
            .iter()
            .map(|p| couple.point_matches.get(&p).copied())
            .collect();
        let Some(mut mapped) = mapped else {
            return Err(mismatch(format!("face {f1} has points without a match")));
        };
        mapped.sort_unstable();
        if mapped != mesh0.faces()[f0].sorted_points() {
            return Err(mismatch(format!("faces {f0} and {f1} do not share the same points")));
        }
    }
    Ok(())
}

/// Patch order of the result: `mesh0` patches, then new `mesh1` names.
fn plan_patches(
    patches0: &[Patch],
    patches1: &[Patch],
    incoming: usize,
    valid_boundary: bool,
) -> Result<Vec<PatchPlan>, MeshError> {
    let mut plans: Vec<PatchPlan> = patches0
        .iter()
        .enumerate()
        .map(|(i, p)| PatchPlan {
            name: p.name.clone(),
            kind: p.kind,
            src0: Some(i),
            src1: None,
        })
        .collect();
    let by_name: HashMap<&str, usize> = patches0
        .iter()
        .enumerate()
        .map(|(i, p)| (p.name.as_str(), i))
        .collect();

    for (i, p) in patches1.iter().enumerate() {
        match by_name.get(p.name.as_str()) {
            Some(&j) => {
                if plans[j].kind != p.kind {
                    let reason = format!(
                        "kind {} in the merged mesh but {} on processor {incoming}",
                        plans[j].kind, p.kind
                    );
                    if valid_boundary {
                        return Err(MeshError::BoundaryMismatch {
                            patch: p.name.clone(),
                            reason,
                        });
                    }
                    log::warn!("patch `{}`: {reason}; keeping {}", p.name, plans[j].kind);
                }
                plans[j].src1 = Some(i);
            }
            None => plans.push(PatchPlan {
                name: p.name.clone(),
                kind: p.kind,
                src0: None,
                src1: Some(i),
            }),
        }
    }
    Ok(plans)
}
