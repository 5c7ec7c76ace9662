//! Boundary patches: named, contiguous ranges of boundary faces.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Physical meaning of a boundary patch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PatchKind {
    Patch,
    Wall,
    Symmetry,
    Empty,
    /// Interface produced by decomposition, shared with `neighb_proc`.
    #[serde(rename_all = "camelCase")]
    Processor { my_proc: usize, neighb_proc: usize },
}

impl PatchKind {
    #[inline]
    pub fn is_processor(&self) -> bool {
        matches!(self, PatchKind::Processor { .. })
    }
}

impl fmt::Display for PatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchKind::Patch => write!(f, "patch"),
            PatchKind::Wall => write!(f, "wall"),
            PatchKind::Symmetry => write!(f, "symmetry"),
            PatchKind::Empty => write!(f, "empty"),
            PatchKind::Processor {
                my_proc,
                neighb_proc,
            } => write!(f, "processor({my_proc}->{neighb_proc})"),
        }
    }
}

/// A boundary patch covering faces `start..start + size`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patch {
    pub name: String,
    #[serde(flatten)]
    pub kind: PatchKind,
    pub start: usize,
    pub size: usize,
}

impl Patch {
    pub fn new(name: impl Into<String>, kind: PatchKind, start: usize, size: usize) -> Self {
        Patch {
            name: name.into(),
            kind,
            start,
            size,
        }
    }

    /// Processor interface patch with the conventional name.
    pub fn processor(my_proc: usize, neighb_proc: usize, start: usize, size: usize) -> Self {
        Patch::new(
            processor_patch_name(my_proc, neighb_proc),
            PatchKind::Processor {
                my_proc,
                neighb_proc,
            },
            start,
            size,
        )
    }

    #[inline]
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.start + self.size
    }
}

/// `procBoundary<a>to<b>`
pub fn processor_patch_name(my_proc: usize, neighb_proc: usize) -> String {
    format!("procBoundary{my_proc}to{neighb_proc}")
}
