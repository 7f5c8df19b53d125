use clap::Args;
use gridforge::config::DEFAULT_INDEX_PATH;
use gridforge::error::{GfResult, GridForgeError};
use gridforge::index::KeyboardIndex;
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct IndexArgs {
    /// Local clone of the keyboards repository
    pub repo_dir: PathBuf,

    #[arg(short, long, default_value = DEFAULT_INDEX_PATH)]
    pub out: PathBuf,
}

pub fn run(args: &IndexArgs) -> GfResult<()> {
    info!("📂 Scanning {}", args.repo_dir.display());
    let index = KeyboardIndex::build(&args.repo_dir)?;
    if index.is_empty() {
        return Err(GridForgeError::LookupEmpty(format!(
            "no layout definitions under '{}'",
            args.repo_dir.display()
        )));
    }

    index.save_to_file(&args.out)?;
    info!("✅ Indexed {} keyboards into {}", index.len(), args.out.display());
    Ok(())
}
