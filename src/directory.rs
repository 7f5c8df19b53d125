//! Collaborators that find keyboards and fetch their layout definitions.

use crate::error::{io_at, GfResult, GridForgeError};
use crate::index::{raw_link, KeyboardIndex};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyboardRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
}

pub trait KeyboardDirectory {
    fn search(&self, query: &str) -> GfResult<Vec<KeyboardRecord>>;
}

pub trait LayoutSource {
    /// Raw layout bytes, or `None` when the source has nothing for `id`.
    fn fetch(&self, id: &str) -> GfResult<Option<Vec<u8>>>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    keyboards: Vec<KeyboardRecord>,
}

/// Remote directory search plus layout download, restricted to keyboards
/// the local index knows a source link for.
pub struct KeymanClient {
    client: Client,
    api_url: String,
    index: KeyboardIndex,
}

impl KeymanClient {
    pub fn new(api_url: impl Into<String>, index: KeyboardIndex) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.into(),
            index,
        }
    }

    pub fn index(&self) -> &KeyboardIndex {
        &self.index
    }

    fn get(&self, url: &str, query: &[(&str, &str)]) -> GfResult<reqwest::blocking::Response> {
        self.client
            .get(url)
            .query(query)
            .send()
            .map_err(|e| GridForgeError::Network(format!("GET {}: {}", url, e)))
    }
}

impl KeyboardDirectory for KeymanClient {
    fn search(&self, query: &str) -> GfResult<Vec<KeyboardRecord>> {
        let term = format!("l:{}", query);
        let res = self.get(&self.api_url, &[("q", term.as_str()), ("f", "1")])?;

        if !res.status().is_success() {
            return Err(GridForgeError::Network(format!(
                "search for '{}' failed: {}",
                query,
                res.status()
            )));
        }

        let body: SearchResponse = res
            .json()
            .map_err(|e| GridForgeError::Network(format!("invalid search response: {}", e)))?;

        let total = body.keyboards.len();
        let records = filter_indexed(body.keyboards, &self.index);
        info!(
            "Search '{}': {} keyboards, {} with a layout source",
            query,
            total,
            records.len()
        );
        Ok(records)
    }
}

impl LayoutSource for KeymanClient {
    fn fetch(&self, id: &str) -> GfResult<Option<Vec<u8>>> {
        let Some(link) = self.index.get(id) else {
            debug!("Keyboard '{}' is not in the index", id);
            return Ok(None);
        };

        let url = raw_link(link);
        let res = self.get(&url, &[])?;
        if !res.status().is_success() {
            warn!("Fetching '{}' returned {}", url, res.status());
            return Ok(None);
        }

        let bytes = res
            .bytes()
            .map_err(|e| GridForgeError::Network(format!("GET {}: {}", url, e)))?;
        debug!("Fetched {} bytes for '{}'", bytes.len(), id);
        Ok(Some(bytes.to_vec()))
    }
}

/// Drops records whose id has no entry in `index`.
pub fn filter_indexed(records: Vec<KeyboardRecord>, index: &KeyboardIndex) -> Vec<KeyboardRecord> {
    records
        .into_iter()
        .filter(|record| index.contains(&record.id))
        .collect()
}

/// Layout definitions stored as `<dir>/<id>.kvks` or `<dir>/<id>.js`.
#[derive(Debug, Clone)]
pub struct LocalLayoutSource {
    dir: PathBuf,
}

impl LocalLayoutSource {
    const EXTENSIONS: [&'static str; 2] = ["kvks", "js"];

    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl LayoutSource for LocalLayoutSource {
    fn fetch(&self, id: &str) -> GfResult<Option<Vec<u8>>> {
        for ext in Self::EXTENSIONS {
            let path = self.dir.join(format!("{}.{}", id, ext));
            if path.is_file() {
                debug!("Reading layout from {}", path.display());
                return fs::read(&path).map(Some).map_err(io_at(&path));
            }
        }
        Ok(None)
    }
}
