//! CLI definitions using clap.
//!
//! Fixed flags are derived; the build options come from the option registry
//! so the command line always matches what the resolver understands.

use std::path::PathBuf;

use clap::{ArgMatches, Command, CommandFactory, Parser};
use clap_complete::Shell;

use cs2kit_configure::core::OptionRegistry;

/// Configure a CS2-Kit Metamod:Source plugin build
#[derive(Parser, Debug)]
#[command(name = "cs2kit-configure")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Print the resolved build plan as JSON instead of running the engine
    #[arg(long)]
    pub plan: bool,

    /// Directory containing the plugin's build scripts (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub source_dir: Option<PathBuf>,

    /// Build engine program to hand the plan to
    #[arg(long, value_name = "PROGRAM")]
    pub engine: Option<String>,

    /// Read options from this config file instead of the global and project ones
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print shell completions and exit
    #[arg(long, value_name = "SHELL")]
    pub completions: Option<Shell>,
}

/// The full command: fixed flags plus one `--<name>` per registered option.
pub fn command(registry: &OptionRegistry) -> Command {
    Cli::command()
        .next_help_heading("Build options")
        .args(registry.clap_args())
}

/// Parse the process arguments.
pub fn parse(registry: &OptionRegistry) -> (Cli, ArgMatches) {
    use clap::FromArgMatches;

    let matches = command(registry).get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());
    (cli, matches)
}
