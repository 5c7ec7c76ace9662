#![allow(dead_code)]
use mesh_reconstruct::io::fragment::{write_field, write_fragment};
use mesh_reconstruct::prelude::*;
use mesh_reconstruct::topology::processor_patch_name;
use tempfile::TempDir;

/// A face waiting to be placed: internal when `neighbour` is set, otherwise
/// on the boundary patch `patch`.
struct RawFace {
    owner: usize,
    neighbour: Option<usize>,
    face: Face,
    patch: String,
}

/// Order internal faces by (owner, neighbour), then boundary faces patch by
/// patch in `patches` order.
fn assemble(points: Vec<[f64; 3]>, raw: Vec<RawFace>, patches: &[(String, PatchKind)]) -> PolyMesh {
    let (mut internal, boundary): (Vec<RawFace>, Vec<RawFace>) =
        raw.into_iter().partition(|r| r.neighbour.is_some());
    internal.sort_by_key(|r| (r.owner, r.neighbour));

    let mut faces = Vec::new();
    let mut owner = Vec::new();
    let mut neighbour = Vec::new();
    for r in internal {
        faces.push(r.face);
        owner.push(r.owner);
        neighbour.extend(r.neighbour);
    }
    let mut out_patches = Vec::new();
    for (name, kind) in patches {
        let start = faces.len();
        for r in boundary.iter().filter(|r| &r.patch == name) {
            faces.push(r.face.clone());
            owner.push(r.owner);
        }
        out_patches.push(Patch::new(name.clone(), *kind, start, faces.len() - start));
    }
    PolyMesh::new(points, faces, owner, neighbour, out_patches).unwrap()
}

/// Unit-spaced `nx × ny × nz` hex block with patches `inlet` (x = 0),
/// `outlet` (x = nx) and `walls` (everything else).
pub fn block_mesh(nx: usize, ny: usize, nz: usize) -> PolyMesh {
    let pid = |i: usize, j: usize, k: usize| i + (nx + 1) * (j + (ny + 1) * k);
    let cid = |i: usize, j: usize, k: usize| i + nx * (j + ny * k);

    let mut points = Vec::with_capacity((nx + 1) * (ny + 1) * (nz + 1));
    for k in 0..=nz {
        for j in 0..=ny {
            for i in 0..=nx {
                points.push([i as f64, j as f64, k as f64]);
            }
        }
    }

    let mut raw = Vec::new();
    // `face` points along +axis; cells below/above along that axis
    let mut place = |face: Face, below: Option<usize>, above: Option<usize>, min_patch: &str, max_patch: &str| {
        let r = match (below, above) {
            (Some(o), Some(n)) => RawFace { owner: o, neighbour: Some(n), face, patch: String::new() },
            (Some(o), None) => RawFace { owner: o, neighbour: None, face, patch: max_patch.into() },
            (None, Some(o)) => RawFace { owner: o, neighbour: None, face: face.reversed(), patch: min_patch.into() },
            (None, None) => unreachable!(),
        };
        raw.push(r);
    };

    for k in 0..nz {
        for j in 0..ny {
            for i in 0..=nx {
                let face = Face::new(vec![pid(i, j, k), pid(i, j + 1, k), pid(i, j + 1, k + 1), pid(i, j, k + 1)]);
                let below = (i > 0).then(|| cid(i - 1, j, k));
                let above = (i < nx).then(|| cid(i, j, k));
                place(face, below, above, "inlet", "outlet");
            }
        }
    }
    for k in 0..nz {
        for j in 0..=ny {
            for i in 0..nx {
                let face = Face::new(vec![pid(i, j, k), pid(i, j, k + 1), pid(i + 1, j, k + 1), pid(i + 1, j, k)]);
                let below = (j > 0).then(|| cid(i, j - 1, k));
                let above = (j < ny).then(|| cid(i, j, k));
                place(face, below, above, "walls", "walls");
            }
        }
    }
    for k in 0..=nz {
        for j in 0..ny {
            for i in 0..nx {
                let face = Face::new(vec![pid(i, j, k), pid(i + 1, j, k), pid(i + 1, j + 1, k), pid(i, j + 1, k)]);
                let below = (k > 0).then(|| cid(i, j, k - 1));
                let above = (k < nz).then(|| cid(i, j, k));
                place(face, below, above, "walls", "walls");
            }
        }
    }

    let patches = [
        ("inlet".to_string(), PatchKind::Patch),
        ("outlet".to_string(), PatchKind::Patch),
        ("walls".to_string(), PatchKind::Wall),
    ];
    assemble(points, raw, &patches)
}

/// Split `global` into one fragment per processor of `cell_proc`.
///
/// Cut internal faces land on `procBoundary<me>to<other>`, oriented out of
/// the local cell. Every fragment keeps all physical patches, empty or not.
pub fn decompose(global: &PolyMesh, cell_proc: &[usize]) -> Vec<PolyMesh> {
    let n_procs = cell_proc.iter().max().map_or(0, |&p| p + 1);
    (0..n_procs).map(|me| fragment(global, cell_proc, me)).collect()
}

fn fragment(global: &PolyMesh, cell_proc: &[usize], me: usize) -> PolyMesh {
    let mut cell_map = vec![usize::MAX; global.n_cells()];
    let mut n_cells = 0;
    for (c, &p) in cell_proc.iter().enumerate() {
        if p == me {
            cell_map[c] = n_cells;
            n_cells += 1;
        }
    }

    let touches = |f: usize| {
        cell_proc[global.owner()[f]] == me
            || global.neighbour().get(f).is_some_and(|&n| cell_proc[n] == me)
    };
    let mut used = vec![false; global.n_points()];
    for f in (0..global.n_faces()).filter(|&f| touches(f)) {
        for p in global.faces()[f].iter() {
            used[p] = true;
        }
    }
    let mut point_map = vec![usize::MAX; global.n_points()];
    let mut points = Vec::new();
    for (p, _) in used.iter().enumerate().filter(|(_, u)| **u) {
        point_map[p] = points.len();
        points.push(global.points()[p]);
    }

    let mut raw = Vec::new();
    let mut others = Vec::new();
    for f in 0..global.n_internal_faces() {
        let (own, nei) = (global.owner()[f], global.neighbour()[f]);
        let (po, pn) = (cell_proc[own], cell_proc[nei]);
        if po != me && pn != me {
            continue;
        }
        let face = global.faces()[f].renumbered(&point_map);
        let r = if po == me && pn == me {
            RawFace { owner: cell_map[own], neighbour: Some(cell_map[nei]), face, patch: String::new() }
        } else if po == me {
            others.push(pn);
            RawFace { owner: cell_map[own], neighbour: None, face, patch: processor_patch_name(me, pn) }
        } else {
            others.push(po);
            RawFace { owner: cell_map[nei], neighbour: None, face: face.reversed(), patch: processor_patch_name(me, po) }
        };
        raw.push(r);
    }
    for f in global.n_internal_faces()..global.n_faces() {
        let own = global.owner()[f];
        if cell_proc[own] != me {
            continue;
        }
        let patch = &global.patches()[global.which_patch(f).unwrap()];
        raw.push(RawFace {
            owner: cell_map[own],
            neighbour: None,
            face: global.faces()[f].renumbered(&point_map),
            patch: patch.name.clone(),
        });
    }

    others.sort_unstable();
    others.dedup();
    let mut patches: Vec<(String, PatchKind)> =
        global.patches().iter().map(|p| (p.name.clone(), p.kind)).collect();
    patches.extend(others.into_iter().map(|q| {
        (processor_patch_name(me, q), PatchKind::Processor { my_proc: me, neighb_proc: q })
    }));
    assemble(points, raw, &patches)
}

/// Processor of each cell when the block is cut into `n_procs` slabs along x.
pub fn slabs_x(nx: usize, ny: usize, nz: usize, n_procs: usize) -> Vec<usize> {
    let mut cell_proc = Vec::with_capacity(nx * ny * nz);
    for _k in 0..nz {
        for _j in 0..ny {
            for i in 0..nx {
                cell_proc.push(i * n_procs / nx);
            }
        }
    }
    cell_proc
}

/// Processor of each cell for a 2 × 2 split in x and y.
pub fn quadrants(nx: usize, ny: usize, nz: usize) -> Vec<usize> {
    let mut cell_proc = Vec::with_capacity(nx * ny * nz);
    for _k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                cell_proc.push(usize::from(2 * i >= nx) + 2 * usize::from(2 * j >= ny));
            }
        }
    }
    cell_proc
}

/// Quadrants renumbered so that processors 0 and 1 touch only along the
/// centre edge: 0 (x-, y-), 1 (x+, y+), 2 (x+, y-), 3 (x-, y+).
pub fn diagonal_quadrants(nx: usize, ny: usize, nz: usize) -> Vec<usize> {
    quadrants(nx, ny, nz).into_iter().map(|q| [0, 2, 3, 1][q]).collect()
}

/// Fresh, empty case directory; removed when the returned guard drops.
pub fn scratch_case() -> (TempDir, CaseLayout) {
    let dir = tempfile::tempdir().unwrap();
    let case = CaseLayout::new(dir.path());
    (dir, case)
}

/// Write every fragment of `fragments` to `case`.
pub fn write_case(case: &CaseLayout, fragments: &[PolyMesh]) {
    let handler = FileHandler::default();
    for (proci, mesh) in fragments.iter().enumerate() {
        write_fragment(&handler, case, proci, mesh).unwrap();
    }
}

/// Scatter a global cell field to the processors of `cell_proc` and write it.
pub fn write_cell_field(case: &CaseLayout, cell_proc: &[usize], field_dir: &str, name: &str, values: &[f64]) {
    let n_procs = cell_proc.iter().max().map_or(0, |&p| p + 1);
    for proci in 0..n_procs {
        let local: Vec<f64> = cell_proc
            .iter()
            .zip(values)
            .filter(|&(&p, _)| p == proci)
            .map(|(_, &v)| v)
            .collect();
        write_field(case.field_path(proci, field_dir, name), &local).unwrap();
    }
}

/// Cell centres rounded to a fixed grid and sorted, for numbering-free
/// comparison of meshes.
pub fn sorted_cell_centres(mesh: &PolyMesh) -> Vec<[i64; 3]> {
    let mut out: Vec<[i64; 3]> = mesh
        .cell_centres()
        .iter()
        .map(|c| c.map(|x| (x * 1e6).round() as i64))
        .collect();
    out.sort_unstable();
    out
}

/// Patch names and sizes in order.
pub fn patch_summary(mesh: &PolyMesh) -> Vec<(String, usize)> {
    mesh.patches().iter().map(|p| (p.name.clone(), p.size)).collect()
}
