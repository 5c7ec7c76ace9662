//! Reconstruction of one global mesh from decomposed processor fragments.
//!
//! [`reconstruct`] forces uncollated file access for its whole duration,
//! optionally prunes the processor list against a region of interest,
//! then reads the selected fragments in ascending processor order and folds
//! each into the accumulated mesh with [`add`](crate::algs::mesh_add::add).
//! Any per-fragment failure aborts the pass and is reported as
//! [`MeshError::Reconstruction`] carrying the processor index. The access
//! mode is restored on every exit path.

use crate::algs::couple::CoupleInfo;
use crate::algs::mesh_add::add;
use crate::geometry::bounds::BoundBox;
use crate::io::case::CaseLayout;
use crate::io::fragment::{ProcessorFragment, read_field, read_fragment, read_fragment_bounds};
use crate::io::{FileHandler, FileHandlerControl};
use crate::mesh_error::MeshError;
use crate::topology::poly_mesh::PolyMesh;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Tunables for a reconstruction pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconstructOptions {
    /// Point matching tolerance relative to the merged bounding-box diagonal.
    pub merge_tolerance: f64,
    /// Abort on unmatched interface faces and conflicting patch kinds.
    pub valid_boundary: bool,
    /// Only fragments overlapping this box are merged. `None` merges all.
    pub region: Option<BoundBox>,
    /// Relative inflation of `region` before the overlap test.
    pub region_margin: f64,
    /// Directory (inside each processor directory) holding cell fields.
    pub field_dir: String,
    /// Cell fields carried through the merge.
    pub cell_fields: Vec<String>,
}

impl Default for ReconstructOptions {
    fn default() -> Self {
        ReconstructOptions {
            merge_tolerance: 1e-7,
            valid_boundary: true,
            region: None,
            region_margin: 1e-6,
            field_dir: "0".to_string(),
            cell_fields: Vec::new(),
        }
    }
}

impl ReconstructOptions {
    /// Load options from a JSON file. Missing keys take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, MeshError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| MeshError::io(path, e))?;
        serde_json::from_str(&text).map_err(|e| MeshError::parse(path, e))
    }
}

/// The calling processor's own mesh and the case it belongs to.
#[derive(Clone, Debug)]
pub struct LocalMesh {
    pub case: CaseLayout,
    pub processor: usize,
    pub mesh: PolyMesh,
}

impl LocalMesh {
    pub fn new(case: CaseLayout, processor: usize, mesh: PolyMesh) -> Self {
        LocalMesh {
            case,
            processor,
            mesh,
        }
    }

    /// Read processor `processor`'s fragment from `case`.
    pub fn read(
        handler: &FileHandler,
        case: CaseLayout,
        processor: usize,
    ) -> Result<Self, MeshError> {
        let fragment = read_fragment(handler, &case, processor)?;
        Ok(LocalMesh::new(case, processor, fragment.mesh))
    }
}

/// Path of processor `proci`'s copy of mesh file `file`. No I/O.
pub fn local_path(local: &LocalMesh, proci: usize, file: &str) -> PathBuf {
    local.case.local_path(proci, file)
}

/// Union of the bounding boxes of `processors`.
///
/// Reads only each fragment's `bounds` metadata; the local processor's box
/// comes from the in-memory mesh.
pub fn proc_bounds(
    handler: &FileHandler,
    processors: &[usize],
    local: &LocalMesh,
) -> Result<BoundBox, MeshError> {
    let mut bb = BoundBox::empty();
    for &proci in processors {
        bb = bb.union(&fragment_bounds(handler, proci, local)?);
    }
    Ok(bb)
}

fn fragment_bounds(
    handler: &FileHandler,
    proci: usize,
    local: &LocalMesh,
) -> Result<BoundBox, MeshError> {
    if proci == local.processor {
        return Ok(local.mesh.bounds());
    }
    read_fragment_bounds(handler, &local.case, proci).map_err(|e| e.at_processor(proci))
}

/// Processors of `processors` worth merging, ascending and unique.
///
/// Without a region every processor is kept. With one, a processor is
/// dropped only when its bounds miss the inflated region entirely.
pub fn relevant_processors(
    handler: &FileHandler,
    processors: &[usize],
    local: &LocalMesh,
    options: &ReconstructOptions,
) -> Result<Vec<usize>, MeshError> {
    let ordered = processors.iter().copied().sorted_unstable().dedup().collect_vec();
    let Some(region) = &options.region else {
        return Ok(ordered);
    };
    let region = region.inflate(options.region_margin);
    let mut kept = Vec::with_capacity(ordered.len());
    for proci in ordered {
        if proc_bounds(handler, &[proci], local)?.overlaps(&region) {
            kept.push(proci);
        } else {
            log::debug!("processor {proci} lies outside the region; skipped");
        }
    }
    Ok(kept)
}

/// A reconstructed mesh with the addressing back to its fragments.
#[derive(Clone, Debug)]
pub struct ReconstructedMesh {
    pub mesh: PolyMesh,
    /// Merged processors in merge order.
    pub processors: Vec<usize>,
    /// Global cell → (processor, local cell).
    pub cell_proc_addressing: Vec<(usize, usize)>,
    /// Global point → (processor, local point) of its first occurrence.
    pub point_proc_addressing: Vec<(usize, usize)>,
    /// Cell fields requested through [`ReconstructOptions::cell_fields`].
    pub cell_fields: BTreeMap<String, Vec<f64>>,
}

impl ReconstructedMesh {
    fn from_fragment(fragment: ProcessorFragment) -> Self {
        let proci = fragment.processor;
        ReconstructedMesh {
            cell_proc_addressing: (0..fragment.mesh.n_cells()).map(|c| (proci, c)).collect(),
            point_proc_addressing: (0..fragment.mesh.n_points()).map(|p| (proci, p)).collect(),
            processors: vec![proci],
            mesh: fragment.mesh,
            cell_fields: fragment.cell_fields,
        }
    }

    /// Merge one more fragment into the accumulated mesh.
    fn absorb(
        &mut self,
        fragment: ProcessorFragment,
        options: &ReconstructOptions,
    ) -> Result<(), MeshError> {
        let proci = fragment.processor;
        let couple = CoupleInfo::build(
            &self.mesh,
            &self.processors,
            &fragment.mesh,
            proci,
            options.merge_tolerance,
        );
        let map = add(&mut self.mesh, &fragment.mesh, &couple, options.valid_boundary)?;

        let cells1 = (0..fragment.mesh.n_cells()).map(|c| (proci, c)).collect_vec();
        self.cell_proc_addressing = map.map_cell_values(&self.cell_proc_addressing, &cells1)?;
        let points1 = (0..fragment.mesh.n_points()).map(|p| (proci, p)).collect_vec();
        self.point_proc_addressing = map.map_point_values(&self.point_proc_addressing, &points1)?;

        for (name, values) in self.cell_fields.iter_mut() {
            let incoming = fragment.cell_fields.get(name).ok_or_else(|| {
                MeshError::InvalidTopology(format!("cell field `{name}` missing on processor {proci}"))
            })?;
            *values = map.map_cell_values(values, incoming)?;
        }

        log::info!(
            "merged processor {proci}: {} cells total, {} coupled faces",
            self.mesh.n_cells(),
            map.coupled_faces
        );
        self.processors.push(proci);
        Ok(())
    }

    /// Read cell field `name` from every merged processor and scatter it
    /// into global cell order.
    pub fn reconstruct_cell_field(
        &self,
        handler: &mut FileHandler,
        case: &CaseLayout,
        field_dir: impl AsRef<Path>,
        name: &str,
    ) -> Result<Vec<f64>, MeshError> {
        let mut control = FileHandlerControl::new(handler);
        control.set_uncollated();
        control.require_uncollated()?;

        let mut per_proc: BTreeMap<usize, Vec<f64>> = BTreeMap::new();
        for &proci in &self.processors {
            let path = case.field_path(proci, field_dir.as_ref(), name);
            let values: Vec<f64> = read_field(&path).map_err(|e| e.at_processor(proci))?;
            per_proc.insert(proci, values);
        }

        self.cell_proc_addressing
            .iter()
            .map(|&(proci, cell)| {
                per_proc
                    .get(&proci)
                    .and_then(|values| values.get(cell))
                    .copied()
                    .ok_or_else(|| {
                        MeshError::parse(
                            case.field_path(proci, field_dir.as_ref(), name),
                            format!("no value for local cell {cell}"),
                        )
                        .at_processor(proci)
                    })
            })
            .collect()
    }
}

/// Merge the fragments of `processors` into one mesh.
///
/// Processors are visited in ascending order; the local processor's
/// fragment is taken from `local` instead of disk. `handler`'s access mode is
/// forced to uncollated for the duration of the call and restored before
/// returning, whatever the outcome.
pub fn reconstruct(
    handler: &mut FileHandler,
    processors: &[usize],
    local: &LocalMesh,
    options: &ReconstructOptions,
) -> Result<ReconstructedMesh, MeshError> {
    let mut control = FileHandlerControl::new(handler);
    control.set_uncollated();
    let result = reconstruct_uncollated(&control, processors, local, options);
    control.reset();
    result
}

fn reconstruct_uncollated(
    handler: &FileHandler,
    processors: &[usize],
    local: &LocalMesh,
    options: &ReconstructOptions,
) -> Result<ReconstructedMesh, MeshError> {
    let selected = relevant_processors(handler, processors, local, options)?;
    log::info!(
        "reconstructing {} of {} processors: [{}]",
        selected.len(),
        processors.len(),
        selected.iter().join(", ")
    );

    let Some((&first, rest)) = selected.split_first() else {
        return Err(MeshError::EmptySelection);
    };
    let fragment = load_fragment(handler, first, local, options).map_err(|e| e.at_processor(first))?;
    let mut result = ReconstructedMesh::from_fragment(fragment);

    for &proci in rest {
        let fragment =
            load_fragment(handler, proci, local, options).map_err(|e| e.at_processor(proci))?;
        result
            .absorb(fragment, options)
            .map_err(|e| e.at_processor(proci))?;
    }

    log::info!(
        "reconstructed mesh: {} cells, {} faces, {} points",
        result.mesh.n_cells(),
        result.mesh.n_faces(),
        result.mesh.n_points()
    );
    Ok(result)
}

fn load_fragment(
    handler: &FileHandler,
    proci: usize,
    local: &LocalMesh,
    options: &ReconstructOptions,
) -> Result<ProcessorFragment, MeshError> {
    let mut fragment = if proci == local.processor {
        ProcessorFragment::from_mesh(proci, local.mesh.clone())
    } else {
        read_fragment(handler, &local.case, proci)?
    };
    for name in &options.cell_fields {
        fragment.load_cell_field(handler, &local.case, &options.field_dir, name)?;
    }
    Ok(fragment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_defaults_fill_missing_keys() {
        let opts: ReconstructOptions =
            serde_json::from_str(r#"{"valid_boundary": false, "cell_fields": ["p"]}"#).unwrap();
        assert!(!opts.valid_boundary);
        assert_eq!(opts.cell_fields, vec!["p".to_string()]);
        assert_eq!(opts.merge_tolerance, 1e-7);
        assert_eq!(opts.field_dir, "0");
        assert!(opts.region.is_none());
    }

    #[test]
    fn options_file_errors_name_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reconstruct.json");
        let err = ReconstructOptions::from_json_file(&path).unwrap_err();
        assert!(matches!(err, MeshError::Io { path: ref p, .. } if *p == path));
    }

    #[test]
    fn local_path_is_pure() {
        let local = LocalMesh::new(CaseLayout::new("/nowhere"), 2, PolyMesh::default());
        assert_eq!(
            local_path(&local, 5, "owner"),
            PathBuf::from("/nowhere/processor5/constant/polyMesh/owner")
        );
    }

    #[test]
    fn empty_processor_list_is_an_error_and_mode_is_restored() {
        use crate::io::FileAccessMode;
        let mut handler = FileHandler::new(FileAccessMode::Collated);
        let local = LocalMesh::new(CaseLayout::new("/nowhere"), 0, PolyMesh::default());
        let err = reconstruct(&mut handler, &[], &local, &ReconstructOptions::default()).unwrap_err();
        assert!(matches!(err, MeshError::EmptySelection));
        assert_eq!(handler.mode(), FileAccessMode::Collated);
    }
}
