//! MeshError: unified error type for mesh-reconstruct public APIs
//!
//! Every fallible operation of the crate reports through this enum. The
//! numeric matrix kernel is the exception: it never fails and lets non-finite
//! values propagate to the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for reconstruction and fragment I/O.
#[derive(Debug, Error)]
pub enum MeshError {
    /// A fragment file could not be opened or read.
    #[error("I/O error on `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file header does not describe the expected object.
    #[error("header mismatch in `{path}`: expected {expected}, found {found}")]
    HeaderMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },
    /// Header or body could not be decoded.
    #[error("parse error in `{path}`: {message}")]
    Parse { path: PathBuf, message: String },
    /// Per-processor fragments can only be read with uncollated file access.
    #[error("processor fragments require uncollated file access (current mode: {0})")]
    CollatedAccess(String),
    /// Mesh arrays are inconsistent with each other.
    #[error("invalid mesh topology: {0}")]
    InvalidTopology(String),
    /// Two fragments disagree about a boundary patch.
    #[error("boundary mismatch on patch `{patch}`: {reason}")]
    BoundaryMismatch { patch: String, reason: String },
    /// Faces claimed to be shared by two fragments do not coincide.
    #[error(
        "coupling mismatch between processors {merged:?} and processor {incoming}: {reason}"
    )]
    CoupleMismatch {
        merged: Vec<usize>,
        incoming: usize,
        reason: String,
    },
    /// Reconstruction was asked to merge nothing.
    #[error("no processor fragment selected for reconstruction")]
    EmptySelection,
    /// A fragment failed to read or merge; the whole pass is aborted.
    #[error("reconstruction failed at processor {processor}: {source}")]
    Reconstruction {
        processor: usize,
        #[source]
        source: Box<MeshError>,
    },
}

impl MeshError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MeshError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        MeshError::Parse {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Attach the offending processor index to a per-fragment failure.
    pub fn at_processor(self, processor: usize) -> Self {
        match self {
            already @ MeshError::Reconstruction { .. } => already,
            other => MeshError::Reconstruction {
                processor,
                source: Box::new(other),
            },
        }
    }

    /// Processor index carried by a reconstruction failure, if any.
    pub fn processor(&self) -> Option<usize> {
        match self {
            MeshError::Reconstruction { processor, .. } => Some(*processor),
            _ => None,
        }
    }
}
