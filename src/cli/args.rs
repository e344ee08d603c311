//! CLI argument parsing using clap.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Workspace project discovery
#[derive(Parser)]
#[command(
    name = "devscan",
    version = env!("CARGO_PKG_VERSION"),
    about = "Discover and track development projects in a workspace",
    long_about = "Classify the projects directly under a workspace directory, keep a registry of them in sync, and watch for projects appearing or disappearing.",
    next_line_help = true,
    styles = clap_cargo_style(),
    after_help = "Examples:\n  devscan scan ~/code\n  devscan check ~/code/my-app --json\n  devscan sync\n  devscan watch ~/code"
)]
pub struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log discoveries and registry changes to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Initialize configuration
    #[command(about = "Set up .devscan directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration settings
    #[command(about = "Display active settings")]
    Config,

    /// Classify workspace subdirectories without touching the registry
    #[command(about = "List the projects found under a workspace")]
    Scan {
        /// Workspace directory (defaults to configured workspace, then cwd)
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Classify a single directory
    #[command(about = "Detect the project type of one directory")]
    Check {
        /// Directory to classify
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Scan and merge results into the registry
    #[command(about = "Scan a workspace and update the project registry")]
    Sync {
        /// Workspace directory (defaults to configured workspace, then cwd)
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show registered projects
    #[command(about = "List projects in the registry")]
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Sync, then keep the registry current until interrupted
    #[command(about = "Watch a workspace for projects being added or removed")]
    Watch {
        /// Workspace directory (defaults to configured workspace, then cwd)
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_scan_with_global_config() {
        let cli = Cli::parse_from(["devscan", "scan", "/tmp/ws", "--json", "-c", "x.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        match cli.command {
            Commands::Scan { path, json } => {
                assert_eq!(path, Some(PathBuf::from("/tmp/ws")));
                assert!(json);
            }
            _ => panic!("expected scan"),
        }
    }
}
