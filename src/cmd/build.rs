use crate::reports;
use clap::Args;
use gridforge::api::GridForge;
use gridforge::config::Config;
use gridforge::directory::{KeymanClient, LocalLayoutSource};
use gridforge::error::{io_at, GfResult, GridForgeError};
use gridforge::index::KeyboardIndex;
use gridforge::package::write_package;
use gridforge::parser::LayoutFormat;
use gridforge::template::Template;
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    #[command(flatten)]
    pub config: Config,

    /// Keyboard id to fetch
    #[arg(short, long, required_unless_present = "layout_file")]
    pub keyboard: Option<String>,

    /// Local layout definition to build from instead of fetching
    #[arg(short, long, conflicts_with = "keyboard")]
    pub layout_file: Option<PathBuf>,

    /// Read `<id>.kvks` / `<id>.js` from this directory instead of the network
    #[arg(long, requires = "keyboard")]
    pub layouts_dir: Option<PathBuf>,

    /// Template package or unpacked template directory
    #[arg(short, long)]
    pub template: PathBuf,

    #[arg(short, long, default_value = ".")]
    pub out: PathBuf,

    /// Force a layout format instead of detecting it
    #[arg(short, long, value_enum)]
    pub format: Option<LayoutFormat>,
}

pub fn run(args: &BuildArgs, config: &Config) -> GfResult<()> {
    info!("📦 Loading Template: {}", args.template.display());
    let forge = GridForge::new(Template::open(&args.template)?, &config.rewrite);

    let output = match (&args.layout_file, &args.keyboard) {
        (Some(path), _) => {
            let raw = fs::read(path).map_err(io_at(path))?;
            let id = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "layout".to_string());
            forge.build(&id, &raw, args.format)?
        }
        (None, Some(id)) => match &args.layouts_dir {
            Some(dir) => forge.fetch_and_build(&LocalLayoutSource::new(dir), id, args.format)?,
            None => {
                let index = KeyboardIndex::load_from_file(&config.directory.index)?;
                let client = KeymanClient::new(config.directory.api_url.clone(), index);
                forge.fetch_and_build(&client, id, args.format)?
            }
        },
        (None, None) => {
            return Err(GridForgeError::Config(
                "either --keyboard or --layout-file is required".to_string(),
            ))
        }
    };

    reports::print_rewrite_report(&output.report);

    let path = write_package(&output.bytes, &args.out, &output.file_name)?;
    info!("✅ Saved {}", path.display());
    Ok(())
}
