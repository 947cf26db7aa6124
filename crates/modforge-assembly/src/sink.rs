//! Hand-off of finalized projects to their destination
//!
//! Packaging into archives and pushing to remote repositories happen behind
//! [`ProjectSink`]. The crate ships [`DirectorySink`], which materialises a
//! tree on the local filesystem.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::assembler::FinalizedProject;
use crate::error::{AssemblyError, Result};
use crate::manifest::is_project_relative;

/// Destination for a finalized project
pub trait ProjectSink {
    /// What the sink reports back once the project is delivered
    type Output;

    /// Deliver a finalized project
    fn deliver(&self, project: &FinalizedProject) -> Result<Self::Output>;
}

/// Summary of a directory write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkReport {
    /// Directory the project now lives in
    pub root: PathBuf,
    /// Number of files written
    pub files_written: usize,
    /// Total bytes written
    pub bytes_written: u64,
}

/// Writes a project tree into a new directory
///
/// Files are written into a temporary sibling of the destination which is
/// renamed into place once every file is on disk. A failed write leaves no
/// partial tree at the destination.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    destination: PathBuf,
}

impl DirectorySink {
    /// Create a sink targeting `destination`, which must not exist yet
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
        }
    }

    /// Destination directory
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    fn parent_dir(&self) -> Result<PathBuf> {
        let parent = match self.destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;
        Ok(parent)
    }
}

impl ProjectSink for DirectorySink {
    type Output = SinkReport;

    fn deliver(&self, project: &FinalizedProject) -> Result<SinkReport> {
        if self.destination.exists() {
            return Err(AssemblyError::Io(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", self.destination.display()),
            )));
        }

        let parent = self.parent_dir()?;
        let staging = tempfile::Builder::new()
            .prefix(".modforge-")
            .tempdir_in(&parent)?;

        let mut bytes_written = 0u64;
        for (path, file) in project.tree.iter() {
            if !is_project_relative(path) {
                return Err(AssemblyError::Io(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("refusing to write {} outside the project root", path),
                )));
            }

            let target = staging.path().join(path);
            if let Some(dir) = target.parent() {
                fs::create_dir_all(dir)?;
            }
            let bytes = file.contents.as_bytes();
            fs::write(&target, bytes)?;
            bytes_written += bytes.len() as u64;
            debug!(file = %path, bytes = bytes.len(), "Wrote project file");
        }

        let staged = staging.into_path();
        if let Err(err) = fs::rename(&staged, &self.destination) {
            let _ = fs::remove_dir_all(&staged);
            return Err(err.into());
        }
        info!(
            project = %project.project_name,
            destination = %self.destination.display(),
            files = project.tree.len(),
            "Project written"
        );

        Ok(SinkReport {
            root: self.destination.clone(),
            files_written: project.tree.len(),
            bytes_written,
        })
    }
}
