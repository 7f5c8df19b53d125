use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GridForgeError {
    #[error("IO Error at '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("XML Error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Malformed Layout Definition: {0}")]
    ParseMalformed(String),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Archive Error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Packaging Error: {0}")]
    Packaging(String),

    #[error("Nothing found: {0}")]
    LookupEmpty(String),

    #[error("Network Error: {0}")]
    Network(String),

    #[error("Configuration Error: {0}")]
    Config(String),
}

pub type GfResult<T> = Result<T, GridForgeError>;

/// Attaches the offending path to an `io::Error`.
pub fn io_at(path: impl AsRef<Path>) -> impl FnOnce(std::io::Error) -> GridForgeError {
    let path = path.as_ref().to_path_buf();
    move |source| GridForgeError::Io { path, source }
}
