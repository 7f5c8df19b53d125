use crate::error::{io_at, GfResult, GridForgeError};
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const PACKAGE_EXTENSION: &str = "gridset";

/// A packaged template tree, held in memory.
#[derive(Debug, Clone)]
pub struct Package {
    pub bytes: Vec<u8>,
    /// Entry names in archive order.
    pub entries: Vec<String>,
}

/// `<id>.gridset`
pub fn package_file_name(layout_id: &str) -> String {
    format!("{}.{}", layout_id, PACKAGE_EXTENSION)
}

/// Zips every regular file under `root`. Entry names are relative to `root`,
/// use `/` separators and appear in sorted walk order.
pub fn assemble(root: &Path) -> GfResult<Package> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut entries = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            GridForgeError::Packaging(format!("cannot walk '{}': {e}", root.display()))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry_name(root, entry.path())?;
        let content = fs::read(entry.path()).map_err(io_at(entry.path()))?;

        zip.start_file(name.as_str(), options)?;
        zip.write_all(&content).map_err(io_at(entry.path()))?;
        entries.push(name);
    }

    let bytes = zip.finish()?.into_inner();
    debug!("Packaged {} entries ({} bytes)", entries.len(), bytes.len());
    Ok(Package { bytes, entries })
}

fn entry_name(root: &Path, path: &Path) -> GfResult<String> {
    let relative = path
        .strip_prefix(root)
        .map_err(|e| GridForgeError::Packaging(format!("{}: {e}", path.display())))?;

    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(parts.join("/"))
}

/// Writes `bytes` to `out_dir/file_name`. The file appears complete or not
/// at all.
pub fn write_package(bytes: &[u8], out_dir: &Path, file_name: &str) -> GfResult<PathBuf> {
    fs::create_dir_all(out_dir).map_err(io_at(out_dir))?;
    let dest = out_dir.join(file_name);

    let mut staged = NamedTempFile::new_in(out_dir).map_err(io_at(out_dir))?;
    staged.write_all(bytes).map_err(io_at(staged.path()))?;
    staged.persist(&dest).map_err(|e| {
        GridForgeError::Packaging(format!("cannot write '{}': {}", dest.display(), e.error))
    })?;

    info!("Wrote {} ({} bytes)", dest.display(), bytes.len());
    Ok(dest)
}
