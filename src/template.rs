//! Template sources and per-build working copies.
//!
//! A template is never modified. Every build checks out a private copy into
//! its own temporary directory, so concurrent builds cannot see each other.

use crate::error::{io_at, GfResult, GridForgeError};
use crate::layers::{folder_table, GRIDS_DIR};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;
use walkdir::WalkDir;
use zip::ZipArchive;

const CHECKOUT_PREFIX: &str = "gridforge-";

#[derive(Debug, Clone)]
pub enum Template {
    /// Unpacked template tree on disk.
    Directory(PathBuf),
    /// Packaged template held in memory.
    Archive(Vec<u8>),
}

impl Template {
    /// Opens a template directory or a packaged template file.
    pub fn open<P: AsRef<Path>>(path: P) -> GfResult<Self> {
        let path = path.as_ref();
        if path.is_dir() {
            if !path.join(GRIDS_DIR).is_dir() {
                debug!("Template '{}' has no {} folder", path.display(), GRIDS_DIR);
            }
            return Ok(Template::Directory(path.to_path_buf()));
        }

        let bytes = fs::read(path).map_err(io_at(path))?;
        Self::from_archive_bytes(bytes)
    }

    pub fn from_archive_bytes(bytes: Vec<u8>) -> GfResult<Self> {
        ZipArchive::new(Cursor::new(bytes.as_slice()))?;
        Ok(Template::Archive(bytes))
    }

    /// Materializes a fresh, private copy of the template.
    pub fn checkout(&self) -> GfResult<WorkingCopy> {
        let dir = tempfile::Builder::new()
            .prefix(CHECKOUT_PREFIX)
            .tempdir()
            .map_err(io_at(std::env::temp_dir()))?;

        match self {
            Template::Directory(src) => copy_tree(src, dir.path())?,
            Template::Archive(bytes) => {
                let mut archive = ZipArchive::new(Cursor::new(bytes.as_slice()))?;
                archive.extract(dir.path())?;
            }
        }

        let copy = WorkingCopy { dir };
        debug!(
            "Checked out template into {} ({} layer pages)",
            copy.path().display(),
            copy.layer_pages()
        );
        Ok(copy)
    }
}

fn copy_tree(src: &Path, dest: &Path) -> GfResult<()> {
    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry.map_err(|e| {
            GridForgeError::Packaging(format!("cannot read template '{}': {e}", src.display()))
        })?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| GridForgeError::Packaging(e.to_string()))?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(io_at(&target))?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(io_at(parent))?;
            }
            fs::copy(entry.path(), &target).map_err(io_at(entry.path()))?;
        }
    }
    Ok(())
}

/// A checked-out template tree. Removed from disk on `close` or drop.
#[derive(Debug)]
pub struct WorkingCopy {
    dir: TempDir,
}

impl WorkingCopy {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Number of layer pages present in this copy.
    pub fn layer_pages(&self) -> usize {
        folder_table()
            .into_iter()
            .filter(|(_, layer)| layer.grid_path(self.path()).is_file())
            .count()
    }

    pub fn close(self) -> GfResult<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close().map_err(io_at(path))
    }
}
