use crate::error::{io_at, GfResult, GridForgeError};
use crate::mapping::MappingMode;
use clap::{parser::ValueSource, ArgMatches, Args};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_PLACEHOLDER: &str = "*";
pub const DEFAULT_API_URL: &str = "https://api.keyman.com/search/2.0";
pub const DEFAULT_INDEX_PATH: &str = "data/kvks_index.json";

#[derive(Args, Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    #[command(flatten)]
    pub rewrite: RewriteParams,
    #[command(flatten)]
    pub directory: DirectoryParams,
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriteParams {
    /// Caption written for keys the layout maps to nothing and for empty cells
    #[arg(long, default_value = DEFAULT_PLACEHOLDER)]
    pub placeholder: String,

    #[arg(long, value_enum, default_value_t = MappingMode::MultiLayer)]
    pub mode: MappingMode,
}

impl Default for RewriteParams {
    fn default() -> Self {
        Self {
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            mode: MappingMode::MultiLayer,
        }
    }
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryParams {
    #[arg(long, default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// JSON index of keyboard id → layout source link
    #[arg(long, default_value = DEFAULT_INDEX_PATH)]
    pub index: String,
}

impl Default for DirectoryParams {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            index: DEFAULT_INDEX_PATH.to_string(),
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> GfResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(io_at(path))?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> GfResult<()> {
        if self.rewrite.placeholder.is_empty() {
            return Err(GridForgeError::Config(
                "placeholder must not be empty".to_string(),
            ));
        }
        if self.directory.api_url.trim().is_empty() {
            return Err(GridForgeError::Config("api_url must not be empty".to_string()));
        }
        Ok(())
    }

    /// Copies values the user typed on the command line over file values.
    pub fn merge_from_cli(&mut self, cli: &Config, matches: &ArgMatches) {
        macro_rules! update_if_present {
            ($section:ident . $field:ident, $arg_name:expr) => {
                if matches.value_source($arg_name) == Some(ValueSource::CommandLine) {
                    self.$section.$field = cli.$section.$field.clone();
                }
            };
        }

        update_if_present!(rewrite.placeholder, "placeholder");
        update_if_present!(rewrite.mode, "mode");
        update_if_present!(directory.api_url, "api_url");
        update_if_present!(directory.index, "index");
    }
}
