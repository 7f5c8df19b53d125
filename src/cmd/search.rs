use crate::reports;
use clap::Args;
use gridforge::config::Config;
use gridforge::directory::{KeyboardDirectory, KeymanClient};
use gridforge::error::{GfResult, GridForgeError};
use gridforge::index::KeyboardIndex;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Language name to search for
    pub query: String,

    #[command(flatten)]
    pub config: Config,
}

pub fn run(args: &SearchArgs, config: &Config) -> GfResult<()> {
    let index = KeyboardIndex::load_from_file(&config.directory.index)?;
    let client = KeymanClient::new(config.directory.api_url.clone(), index);

    info!("🔎 Searching keyboards for '{}'", args.query);
    let records = client.search(&args.query)?;
    if records.is_empty() {
        return Err(GridForgeError::LookupEmpty(format!(
            "no keyboards with a layout source match '{}'",
            args.query
        )));
    }

    reports::print_keyboard_list(&records);
    Ok(())
}
