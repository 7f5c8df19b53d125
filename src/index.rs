use crate::error::{io_at, GfResult, GridForgeError};
use crate::parser::structured;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

pub const REPOSITORY_BLOB_BASE: &str = "https://github.com/keymanapp/keyboards/blob/master";
const LAYOUT_EXTENSION: &str = "kvks";

/// Keyboard id → link to its structured layout definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyboardIndex {
    entries: BTreeMap<String, String>,
}

impl KeyboardIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes every layout definition below a local clone of the keyboards
    /// repository. Files without a readable keyboard name are skipped.
    pub fn build<P: AsRef<Path>>(repo_dir: P) -> GfResult<Self> {
        let repo_dir = repo_dir.as_ref();
        if !repo_dir.is_dir() {
            return Err(GridForgeError::Config(format!(
                "'{}' is not a directory",
                repo_dir.display()
            )));
        }

        let mut index = Self::new();
        let mut scanned = 0usize;

        for entry in WalkDir::new(repo_dir).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            let path = entry.path();
            let is_layout = entry.file_type().is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(LAYOUT_EXTENSION));
            if !is_layout {
                continue;
            }
            scanned += 1;

            let raw = match fs::read(path) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("Skipping '{}': {}", path.display(), e);
                    continue;
                }
            };

            let name = match structured::parse(&raw) {
                Ok((Some(name), _)) => name,
                Ok((None, _)) => {
                    warn!("Skipping '{}': no keyboard name", path.display());
                    continue;
                }
                Err(e) => {
                    warn!("Skipping '{}': {}", path.display(), e);
                    continue;
                }
            };

            let Ok(relative) = path.strip_prefix(repo_dir) else {
                continue;
            };
            let relative: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();

            debug!("Indexed '{}' at {}", name, relative.join("/"));
            index.insert(name, format!("{}/{}", REPOSITORY_BLOB_BASE, relative.join("/")));
        }

        info!(
            "Indexed {} keyboards from {} layout files",
            index.len(),
            scanned
        );
        Ok(index)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> GfResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(io_at(path))?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> GfResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_at(parent))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(io_at(path))
    }

    pub fn insert(&mut self, id: impl Into<String>, link: impl Into<String>) {
        self.entries.insert(id.into(), link.into());
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(String::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// `https://github.com/o/r/blob/b/p` → `https://raw.githubusercontent.com/o/r/b/p`.
/// Links that are not GitHub blob links come back unchanged.
pub fn raw_link(link: &str) -> String {
    if !link.contains("github.com") || !link.contains("/blob/") {
        return link.to_string();
    }
    link.replacen("github.com", "raw.githubusercontent.com", 1)
        .replacen("/blob/", "/", 1)
}
