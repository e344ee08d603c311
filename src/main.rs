use clap::Parser;

use devscan::Settings;
use devscan::cli::commands::{init, scan, sync, watch};
use devscan::cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    let settings = match settings {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    let level_override = cli.verbose.then_some("info");
    devscan::logging::init_with_config(&settings.logging, level_override);

    let outcome = match cli.command {
        Commands::Init { force } => init::run_init(force),
        Commands::Config => init::run_config(&settings),
        Commands::Scan { path, json } => scan::run_scan(&settings, path, json).await,
        Commands::Check { dir, json } => scan::run_check(&dir, json),
        Commands::Sync { path, json } => sync::run_sync(&settings, path, json).await,
        Commands::List { json } => sync::run_list(&settings, json),
        Commands::Watch { path } => watch::run_watch(&settings, path).await,
    };

    if let Err(e) = outcome {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
