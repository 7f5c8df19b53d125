use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, Subcommand};
use gridforge::config::Config;
use gridforge::error::GfResult;
use std::process;
use tracing::{debug, error, info, Level};

mod cmd;
mod reports;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON config file; values typed on the command line override it
    #[arg(global = true, long)]
    config: Option<String>,

    #[arg(global = true, long, default_value_t = false)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Find keyboards for a language
    Search(cmd::search::SearchArgs),
    /// Relabel a template from a keyboard layout and package it
    Build(cmd::build::BuildArgs),
    /// Show what a layout definition maps
    Inspect(cmd::inspect::InspectArgs),
    /// Index a local clone of the keyboards repository
    Index(cmd::index::IndexArgs),
}

fn main() {
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    tracing_subscriber::fmt()
        .with_max_level(if cli.debug { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&cli, &matches) {
        error!("❌ {}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli, matches: &ArgMatches) -> GfResult<()> {
    match &cli.command {
        Commands::Search(args) => {
            let config = resolve_config(cli, &args.config, matches, "search")?;
            cmd::search::run(args, &config)
        }
        Commands::Build(args) => {
            let config = resolve_config(cli, &args.config, matches, "build")?;
            cmd::build::run(args, &config)
        }
        Commands::Inspect(args) => cmd::inspect::run(args),
        Commands::Index(args) => cmd::index::run(args),
    }
}

/// File config (or defaults) with explicitly typed flags laid over it.
fn resolve_config(
    cli: &Cli,
    cli_config: &Config,
    matches: &ArgMatches,
    subcommand: &str,
) -> GfResult<Config> {
    let Some(path) = &cli.config else {
        cli_config.validate()?;
        return Ok(cli_config.clone());
    };

    info!("⚙️  Loading config from: {}", path);
    let mut config = Config::load_from_file(path)?;
    if let Some(sub_matches) = matches.subcommand_matches(subcommand) {
        config.merge_from_cli(cli_config, sub_matches);
    }
    config.validate()?;
    debug!("Effective config: {:?}", config);
    Ok(config)
}
