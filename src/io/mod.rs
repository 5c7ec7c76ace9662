//! Fragment I/O and file-access policy.
//!
//! All reads and writes go through a [`FileHandler`], an explicit value that
//! carries the file-access mode (collated or per-process) instead of a
//! process-wide flag. Reconstruction needs every processor's own files, so it
//! scopes an uncollated override with [`FileHandlerControl`], which restores
//! the previous mode when dropped, on success and failure paths alike.

pub mod case;
pub mod fragment;

use crate::mesh_error::MeshError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

pub use case::CaseLayout;
pub use fragment::{
    FieldValue, FragmentHeader, ProcessorFragment, read_face_list, read_field, read_fragment,
    read_header, read_list, write_face_list, write_field, write_fragment, write_list,
};

/// How per-processor data is laid out on disk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FileAccessMode {
    /// One file per processor, each read independently.
    #[default]
    Uncollated,
    /// One file per processor, read by the master and scattered.
    MasterUncollated,
    /// All processors' data aggregated into one file.
    Collated,
}

impl fmt::Display for FileAccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileAccessMode::Uncollated => write!(f, "uncollated"),
            FileAccessMode::MasterUncollated => write!(f, "masterUncollated"),
            FileAccessMode::Collated => write!(f, "collated"),
        }
    }
}

/// I/O context threaded through every fragment read and write.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHandler {
    mode: FileAccessMode,
}

impl FileHandler {
    pub fn new(mode: FileAccessMode) -> Self {
        FileHandler { mode }
    }

    #[inline]
    pub fn mode(&self) -> FileAccessMode {
        self.mode
    }

    /// Switch mode, returning the previous one.
    pub fn set_mode(&mut self, mode: FileAccessMode) -> FileAccessMode {
        std::mem::replace(&mut self.mode, mode)
    }

    /// Fail unless processor files can be opened one by one.
    pub fn require_uncollated(&self) -> Result<(), MeshError> {
        match self.mode {
            FileAccessMode::Uncollated => Ok(()),
            other => Err(MeshError::CollatedAccess(other.to_string())),
        }
    }
}

/// Scoped override of a [`FileHandler`]'s access mode.
///
/// Construction changes nothing. [`set_uncollated`](Self::set_uncollated)
/// records the current mode and switches to [`FileAccessMode::Uncollated`];
/// [`reset`](Self::reset) or dropping the guard restores the recorded mode.
#[derive(Debug)]
pub struct FileHandlerControl<'a> {
    handler: &'a mut FileHandler,
    saved: Option<FileAccessMode>,
}

impl<'a> FileHandlerControl<'a> {
    pub fn new(handler: &'a mut FileHandler) -> Self {
        FileHandlerControl {
            handler,
            saved: None,
        }
    }

    /// Force per-process file access until reset.
    pub fn set_uncollated(&mut self) {
        let previous = self.handler.set_mode(FileAccessMode::Uncollated);
        if self.saved.is_none() {
            self.saved = Some(previous);
        }
        log::debug!("file access mode {previous} -> uncollated");
    }

    /// Restore the recorded mode. Idempotent.
    pub fn reset(&mut self) {
        if let Some(previous) = self.saved.take() {
            self.handler.set_mode(previous);
            log::debug!("file access mode restored to {previous}");
        }
    }

    /// Whether an override is currently active.
    pub fn is_overridden(&self) -> bool {
        self.saved.is_some()
    }
}

impl Deref for FileHandlerControl<'_> {
    type Target = FileHandler;

    fn deref(&self) -> &FileHandler {
        &*self.handler
    }
}

impl Drop for FileHandlerControl<'_> {
    fn drop(&mut self) {
        self.reset();
    }
}
