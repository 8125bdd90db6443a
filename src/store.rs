//! On-disk page store. One UTF-8 HTML file per successfully fetched target,
//! written whole via temp-then-rename so a crash never leaves a partial file.

use std::fs;
use std::path::{Path, PathBuf};

use crate::model::FetchTarget;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Could not create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Could not write {path}: {source}")]
    WriteFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Store rooted at one output directory.
#[derive(Debug)]
pub struct PageStore {
    dir: PathBuf,
}

impl PageStore {
    /// Open the store, creating the directory recursively if absent.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Final path a target's page lands at.
    pub fn path_for(&self, target: &FetchTarget) -> PathBuf {
        target.file_path(&self.dir)
    }

    /// Write the body to the target's slot. The write goes to a `.tmp`
    /// sibling first and is renamed into place, so an existing file is
    /// either fully replaced or left untouched.
    pub fn save(&self, target: &FetchTarget, body: &str) -> Result<PathBuf, StoreError> {
        let path = self.path_for(target);
        let tmp = self.dir.join(format!("{}.tmp", target.file_name()));
        fs::write(&tmp, body.as_bytes()).map_err(|source| StoreError::WriteFile {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| StoreError::WriteFile {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}
