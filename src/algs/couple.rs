//! Face coupling between an accumulated mesh and an incoming fragment.
//!
//! Decomposition splits every interface face into two copies, one on each
//! side, stored on `procBoundary<a>to<b>` and `procBoundary<b>to<a>`.
//! [`CoupleInfo::build`] finds those pairs geometrically:
//!
//! 1. points on processor patches of both sides are matched within a
//!    tolerance (sorted sweep along x), whichever processor the patch faces,
//!    so fragments touching only along an edge or at a corner share points,
//! 2. a fragment face couples with an accumulated face when their matched
//!    point sets are identical.

use crate::geometry::bounds::BoundBox;
use crate::geometry::metrics::distance;
use crate::topology::patch::PatchKind;
use crate::topology::poly_mesh::PolyMesh;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Coincident points and faces between `mesh0` (accumulated) and `mesh1`
/// (incoming fragment).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CoupleInfo {
    /// Processors already merged into `mesh0`.
    pub merged: Vec<usize>,
    /// Processor that produced `mesh1`.
    pub incoming: usize,
    /// Absolute matching tolerance.
    pub tolerance: f64,
    /// `mesh1` point → coincident `mesh0` point.
    pub point_matches: HashMap<usize, usize>,
    /// `(mesh0 face, mesh1 face)` pairs that become internal faces.
    pub face_pairs: Vec<(usize, usize)>,
    /// `mesh0` interface faces towards `incoming` without a partner.
    pub unmatched0: Vec<usize>,
    /// `mesh1` interface faces towards a merged processor without a partner.
    pub unmatched1: Vec<usize>,
}

impl CoupleInfo {
    /// Coupling with explicit pairs, e.g. from a precomputed addressing.
    pub fn new(
        merged: Vec<usize>,
        incoming: usize,
        tolerance: f64,
        point_matches: HashMap<usize, usize>,
        face_pairs: Vec<(usize, usize)>,
    ) -> Self {
        CoupleInfo {
            merged,
            incoming,
            tolerance,
            point_matches,
            face_pairs,
            unmatched0: Vec::new(),
            unmatched1: Vec::new(),
        }
    }

    /// No shared faces at all.
    pub fn uncoupled(merged: Vec<usize>, incoming: usize) -> Self {
        CoupleInfo {
            merged,
            incoming,
            ..Default::default()
        }
    }

    /// Match interface faces of `mesh1` (from processor `incoming`) against
    /// `mesh0` (union of `merged`).
    ///
    /// `rel_tol` is scaled by the diagonal of the combined bounding box.
    pub fn build(
        mesh0: &PolyMesh,
        merged: &[usize],
        mesh1: &PolyMesh,
        incoming: usize,
        rel_tol: f64,
    ) -> Self {
        let merged_set: BTreeSet<usize> = merged.iter().copied().collect();
        let tolerance = rel_tol * coupling_bounds(mesh0, mesh1).diag();

        // both sides are keyed by the processor on the merged side
        let faces0 = interface_faces(mesh0, |my, nb| {
            (nb == incoming && merged_set.contains(&my)).then_some(my)
        });
        let faces1 = interface_faces(mesh1, |my, nb| {
            (my == incoming && merged_set.contains(&nb)).then_some(nb)
        });

        let mut info = CoupleInfo::uncoupled(merged.to_vec(), incoming);
        info.tolerance = tolerance;

        let sweep = PointSweep::new(mesh0, processor_faces(mesh0));
        let mut taken = HashSet::new();
        for f1 in processor_faces(mesh1) {
            for p1 in mesh1.faces()[f1].iter() {
                if info.point_matches.contains_key(&p1) {
                    continue;
                }
                let hit = sweep.nearest(mesh0, mesh1.points()[p1], tolerance);
                if let Some(p0) = hit.filter(|&p0| taken.insert(p0)) {
                    info.point_matches.insert(p1, p0);
                }
            }
        }
        if faces0.is_empty() && faces1.is_empty() {
            log::debug!(
                "coupling {merged:?} <- {incoming}: no interface faces, {} shared points",
                info.point_matches.len()
            );
            return info;
        }

        // (mesh0 owner proc, sorted points) -> mesh0 face
        let mut lookup: HashMap<(usize, Vec<usize>), usize> = HashMap::with_capacity(faces0.len());
        for &(f0, my) in &faces0 {
            lookup.insert((my, mesh0.faces()[f0].sorted_points()), f0);
        }

        for &(f1, nb) in &faces1 {
            let mapped: Option<Vec<usize>> = mesh1.faces()[f1]
                .iter()
                .map(|p| info.point_matches.get(&p).copied())
                .collect();
            let partner = mapped.and_then(|mut pts| {
                pts.sort_unstable();
                lookup.remove(&(nb, pts))
            });
            match partner {
                Some(f0) => info.face_pairs.push((f0, f1)),
                None => info.unmatched1.push(f1),
            }
        }
        info.unmatched0 = lookup.into_values().collect();
        info.unmatched0.sort_unstable();
        info.face_pairs.sort_unstable();

        log::debug!(
            "coupling {merged:?} <- {incoming}: {} face pairs, {} matched points, {} + {} unmatched faces",
            info.face_pairs.len(),
            info.point_matches.len(),
            info.unmatched0.len(),
            info.unmatched1.len()
        );
        info
    }

    #[inline]
    pub fn n_coupled(&self) -> usize {
        self.face_pairs.len()
    }

    /// True when every interface face found a partner.
    pub fn is_complete(&self) -> bool {
        self.unmatched0.is_empty() && self.unmatched1.is_empty()
    }
}

/// Faces on processor patches for which `select(my_proc, neighb_proc)`
/// returns a key, paired with that key.
fn interface_faces(
    mesh: &PolyMesh,
    select: impl Fn(usize, usize) -> Option<usize>,
) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    for (_, patch) in mesh.processor_patches() {
        if let PatchKind::Processor {
            my_proc,
            neighb_proc,
        } = patch.kind
        {
            if let Some(key) = select(my_proc, neighb_proc) {
                out.extend(patch.range().map(|f| (f, key)));
            }
        }
    }
    out
}

/// Every face on a processor patch.
fn processor_faces(mesh: &PolyMesh) -> impl Iterator<Item = usize> + '_ {
    mesh.processor_patches().flat_map(|(_, patch)| patch.range())
}

/// Processor patch points of `mesh0` sorted by x for windowed nearest search.
struct PointSweep {
    sorted: Vec<(f64, usize)>,
}

impl PointSweep {
    fn new(mesh: &PolyMesh, faces: impl Iterator<Item = usize>) -> Self {
        let mut pts: Vec<usize> = faces.flat_map(|f| mesh.faces()[f].iter()).collect();
        pts.sort_unstable();
        pts.dedup();
        let mut sorted: Vec<(f64, usize)> =
            pts.into_iter().map(|p| (mesh.points()[p][0], p)).collect();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));
        PointSweep { sorted }
    }

    fn nearest(&self, mesh: &PolyMesh, target: [f64; 3], tol: f64) -> Option<usize> {
        let lo = self.sorted.partition_point(|&(x, _)| x < target[0] - tol);
        self.sorted[lo..]
            .iter()
            .take_while(|&&(x, _)| x <= target[0] + tol)
            .map(|&(_, p)| (distance(mesh.points()[p], target), p))
            .filter(|&(d, _)| d <= tol)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, p)| p)
    }
}

/// Bounds used to scale the matching tolerance of a merge.
pub fn coupling_bounds(mesh0: &PolyMesh, mesh1: &PolyMesh) -> BoundBox {
    mesh0.bounds().union(&mesh1.bounds())
}
