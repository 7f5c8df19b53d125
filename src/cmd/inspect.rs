use crate::reports;
use clap::Args;
use gridforge::error::{io_at, GfResult};
use gridforge::parser::{parse_layout, LayoutFormat};
use std::fs;
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    pub layout_file: PathBuf,

    #[arg(short, long, value_enum)]
    pub format: Option<LayoutFormat>,

    /// Print the parsed mapping as JSON instead of tables
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

pub fn run(args: &InspectArgs) -> GfResult<()> {
    let raw = fs::read(&args.layout_file).map_err(io_at(&args.layout_file))?;
    let definition = parse_layout(&raw, args.format)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&definition)?);
    } else {
        reports::print_layout_mapping(&definition);
    }
    Ok(())
}
