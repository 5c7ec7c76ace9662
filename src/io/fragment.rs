//! Per-processor fragment files.
//!
//! Every file starts with a one-line JSON header followed by a JSON body:
//!
//! ```text
//! {"version":1,"format":"ascii","class":"faceList","object":"faces"}
//! [[0,1,4,3],[1,2,5,4]]
//! ```
//!
//! The header's `class` names the body type; a reader that expects a
//! different class (or an unsupported version/format) fails with
//! [`MeshError::HeaderMismatch`] before touching the body.

use crate::geometry::bounds::BoundBox;
use crate::io::FileHandler;
use crate::io::case::CaseLayout;
use crate::mesh_error::MeshError;
use crate::topology::face::Face;
use crate::topology::patch::Patch;
use crate::topology::poly_mesh::PolyMesh;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

const FRAGMENT_FORMAT_VERSION: u32 = 1;
const FRAGMENT_FORMAT: &str = "ascii";

const FACE_LIST_CLASS: &str = "faceList";
const BOUNDARY_CLASS: &str = "polyBoundaryMesh";
const BOUND_BOX_CLASS: &str = "boundBox";

/// Versioned header preceding every fragment body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentHeader {
    pub version: u32,
    pub format: String,
    pub class: String,
    pub object: String,
}

impl FragmentHeader {
    pub fn new(class: &str, object: &str) -> Self {
        FragmentHeader {
            version: FRAGMENT_FORMAT_VERSION,
            format: FRAGMENT_FORMAT.to_string(),
            class: class.to_string(),
            object: object.to_string(),
        }
    }
}

/// Element types that can be stored as a homogeneous field or list.
pub trait FieldValue: Serialize + DeserializeOwned {
    /// Header class of a field of this type.
    const FIELD_CLASS: &'static str;
    /// Header class of a list of this type.
    const LIST_CLASS: &'static str;
}

impl FieldValue for f64 {
    const FIELD_CLASS: &'static str = "scalarField";
    const LIST_CLASS: &'static str = "scalarList";
}

impl FieldValue for [f64; 3] {
    const FIELD_CLASS: &'static str = "vectorField";
    const LIST_CLASS: &'static str = "vectorList";
}

impl FieldValue for usize {
    const FIELD_CLASS: &'static str = "labelField";
    const LIST_CLASS: &'static str = "labelList";
}

/// Parse and check the header line of a fragment stream.
pub fn read_header<R: BufRead>(reader: &mut R, path: &Path) -> Result<FragmentHeader, MeshError> {
    let mut line = String::new();
    reader
        .read_line(&mut line)
        .map_err(|e| MeshError::io(path, e))?;
    if line.trim().is_empty() {
        return Err(MeshError::parse(path, "missing header"));
    }
    let header: FragmentHeader =
        serde_json::from_str(line.trim()).map_err(|e| MeshError::parse(path, e))?;
    if header.version != FRAGMENT_FORMAT_VERSION {
        return Err(MeshError::HeaderMismatch {
            path: path.to_path_buf(),
            expected: format!("version {FRAGMENT_FORMAT_VERSION}"),
            found: format!("version {}", header.version),
        });
    }
    if header.format != FRAGMENT_FORMAT {
        return Err(MeshError::HeaderMismatch {
            path: path.to_path_buf(),
            expected: format!("format {FRAGMENT_FORMAT}"),
            found: format!("format {}", header.format),
        });
    }
    Ok(header)
}

fn read_object<T: DeserializeOwned>(path: &Path, class: &str) -> Result<T, MeshError> {
    let file = File::open(path).map_err(|e| MeshError::io(path, e))?;
    let mut reader = BufReader::new(file);
    let header = read_header(&mut reader, path)?;
    if header.class != class {
        return Err(MeshError::HeaderMismatch {
            path: path.to_path_buf(),
            expected: format!("class {class}"),
            found: format!("class {}", header.class),
        });
    }
    serde_json::from_reader(reader).map_err(|e| MeshError::parse(path, e))
}

fn write_object<T: Serialize + ?Sized>(
    path: &Path,
    class: &str,
    value: &T,
) -> Result<(), MeshError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| MeshError::io(parent, e))?;
    }
    let object = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let header = FragmentHeader::new(class, object);

    let file = File::create(path).map_err(|e| MeshError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, &header).map_err(|e| MeshError::parse(path, e))?;
    writer
        .write_all(b"\n")
        .map_err(|e| MeshError::io(path, e))?;
    serde_json::to_writer(&mut writer, value).map_err(|e| MeshError::parse(path, e))?;
    writer
        .write_all(b"\n")
        .and_then(|_| writer.flush())
        .map_err(|e| MeshError::io(path, e))
}

/// Read a field of `T` (header class `T::FIELD_CLASS`).
pub fn read_field<T: FieldValue>(path: impl AsRef<Path>) -> Result<Vec<T>, MeshError> {
    read_object(path.as_ref(), T::FIELD_CLASS)
}

/// Read a list of `T` (header class `T::LIST_CLASS`).
pub fn read_list<T: FieldValue>(path: impl AsRef<Path>) -> Result<Vec<T>, MeshError> {
    read_object(path.as_ref(), T::LIST_CLASS)
}

/// Read an ordered face list.
pub fn read_face_list(path: impl AsRef<Path>) -> Result<Vec<Face>, MeshError> {
    read_object(path.as_ref(), FACE_LIST_CLASS)
}

pub fn read_boundary(path: impl AsRef<Path>) -> Result<Vec<Patch>, MeshError> {
    read_object(path.as_ref(), BOUNDARY_CLASS)
}

pub fn read_bound_box(path: impl AsRef<Path>) -> Result<BoundBox, MeshError> {
    read_object(path.as_ref(), BOUND_BOX_CLASS)
}

pub fn write_field<T: FieldValue>(path: impl AsRef<Path>, values: &[T]) -> Result<(), MeshError> {
    write_object(path.as_ref(), T::FIELD_CLASS, values)
}

pub fn write_list<T: FieldValue>(path: impl AsRef<Path>, values: &[T]) -> Result<(), MeshError> {
    write_object(path.as_ref(), T::LIST_CLASS, values)
}

pub fn write_face_list(path: impl AsRef<Path>, faces: &[Face]) -> Result<(), MeshError> {
    write_object(path.as_ref(), FACE_LIST_CLASS, faces)
}

pub fn write_boundary(path: impl AsRef<Path>, patches: &[Patch]) -> Result<(), MeshError> {
    write_object(path.as_ref(), BOUNDARY_CLASS, patches)
}

pub fn write_bound_box(path: impl AsRef<Path>, bounds: &BoundBox) -> Result<(), MeshError> {
    write_object(path.as_ref(), BOUND_BOX_CLASS, bounds)
}

/// One processor's mesh as read from disk, with optional cell fields.
#[derive(Clone, Debug)]
pub struct ProcessorFragment {
    pub processor: usize,
    pub mesh: PolyMesh,
    pub bounds: BoundBox,
    /// Cell-centred scalar fields keyed by name.
    pub cell_fields: BTreeMap<String, Vec<f64>>,
}

impl ProcessorFragment {
    /// Wrap an in-memory mesh (e.g. the local processor's own mesh).
    pub fn from_mesh(processor: usize, mesh: PolyMesh) -> Self {
        let bounds = mesh.bounds();
        ProcessorFragment {
            processor,
            mesh,
            bounds,
            cell_fields: BTreeMap::new(),
        }
    }

    /// Read cell field `name` from `field_dir` and attach it.
    pub fn load_cell_field(
        &mut self,
        handler: &FileHandler,
        case: &CaseLayout,
        field_dir: impl AsRef<Path>,
        name: &str,
    ) -> Result<(), MeshError> {
        handler.require_uncollated()?;
        let path = case.field_path(self.processor, field_dir, name);
        let values: Vec<f64> = read_field(&path)?;
        if values.len() != self.mesh.n_cells() {
            return Err(MeshError::parse(
                &path,
                format!(
                    "field has {} values for {} cells",
                    values.len(),
                    self.mesh.n_cells()
                ),
            ));
        }
        self.cell_fields.insert(name.to_string(), values);
        Ok(())
    }
}

/// Read processor `proci`'s mesh fragment. Requires uncollated access.
pub fn read_fragment(
    handler: &FileHandler,
    case: &CaseLayout,
    proci: usize,
) -> Result<ProcessorFragment, MeshError> {
    handler.require_uncollated()?;
    let points: Vec<[f64; 3]> = read_field(case.local_path(proci, "points"))?;
    let faces = read_face_list(case.local_path(proci, "faces"))?;
    let owner: Vec<usize> = read_list(case.local_path(proci, "owner"))?;
    let neighbour: Vec<usize> = read_list(case.local_path(proci, "neighbour"))?;
    let patches = read_boundary(case.local_path(proci, "boundary"))?;

    let mesh = PolyMesh::new(points, faces, owner, neighbour, patches)?;
    log::debug!(
        "read fragment {proci}: {} cells, {} faces, {} points",
        mesh.n_cells(),
        mesh.n_faces(),
        mesh.n_points()
    );
    Ok(ProcessorFragment::from_mesh(proci, mesh))
}

/// Bounding box of processor `proci`'s domain.
///
/// Uses the lightweight `bounds` file when present and falls back to the
/// point list otherwise.
pub fn read_fragment_bounds(
    handler: &FileHandler,
    case: &CaseLayout,
    proci: usize,
) -> Result<BoundBox, MeshError> {
    handler.require_uncollated()?;
    let bounds_path = case.local_path(proci, "bounds");
    if bounds_path.is_file() {
        return read_bound_box(&bounds_path);
    }
    log::debug!("no bounds file for processor {proci}; computing from points");
    let points: Vec<[f64; 3]> = read_field(case.local_path(proci, "points"))?;
    Ok(BoundBox::from_points(points.iter()))
}

/// Write `mesh` as processor `proci`'s fragment, including its `bounds`.
pub fn write_fragment(
    handler: &FileHandler,
    case: &CaseLayout,
    proci: usize,
    mesh: &PolyMesh,
) -> Result<(), MeshError> {
    handler.require_uncollated()?;
    write_field(case.local_path(proci, "points"), mesh.points())?;
    write_face_list(case.local_path(proci, "faces"), mesh.faces())?;
    write_list(case.local_path(proci, "owner"), mesh.owner())?;
    write_list(case.local_path(proci, "neighbour"), mesh.neighbour())?;
    write_boundary(case.local_path(proci, "boundary"), mesh.patches())?;
    write_bound_box(case.local_path(proci, "bounds"), &mesh.bounds())?;
    Ok(())
}
