//! cs2kit-configure - configuration front end for plugin builds

use std::io::{self, IsTerminal};
use std::path::Path;

use anyhow::{Context, Result};
use clap::ArgMatches;
use clap_complete::generate;
use tracing_subscriber::EnvFilter;

use cs2kit_configure::core::OptionRegistry;
use cs2kit_configure::engine::{BuildEngine, EngineError, PlanWriter, ProcessEngine};
use cs2kit_configure::resolver::{RawInput, ResolutionError, Resolver};
use cs2kit_configure::util::config::{
    global_config_path, load_config, project_config_path, Config,
};
use cs2kit_configure::util::diagnostic::{emit, suggestions, Diagnostic};
use cs2kit_configure::util::fs::absolutize;

mod cli;

use cli::Cli;

fn main() {
    let registry = match OptionRegistry::standard() {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };

    let (cli, matches) = cli::parse(&registry);
    let color = !cli.no_color && io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none();

    if let Err(e) = run(&registry, &cli, &matches, color) {
        std::process::exit(report(&e, color));
    }
}

fn run(registry: &OptionRegistry, cli: &Cli, matches: &ArgMatches, color: bool) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("cs2kit_configure=debug")
    } else {
        EnvFilter::new("cs2kit_configure=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(color)
        .with_target(false)
        .without_time()
        .init();

    if let Some(shell) = cli.completions {
        let mut cmd = cli::command(registry);
        let name = cmd.get_name().to_string();
        generate(shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let cwd = std::env::current_dir().context("failed to determine the working directory")?;
    let source_dir = absolutize(&cwd, cli.source_dir.as_deref().unwrap_or(Path::new(".")));

    // Explicit --config replaces the global + project lookup
    let config = match &cli.config {
        Some(path) => Config::load(&absolutize(&cwd, path))?,
        None => load_config(
            global_config_path().as_deref(),
            &project_config_path(&source_dir),
        )?,
    };

    // CLI and environment win over config files
    let mut raw = RawInput::from_matches(registry, matches);
    raw.fill_from(config.to_raw_input());

    let plan = Resolver::new(registry, &cwd)
        .with_source_dir(&source_dir)
        .resolve(&raw)?;

    let mut engine: Box<dyn BuildEngine> = if cli.plan {
        Box::new(PlanWriter::new(io::stdout().lock()))
    } else {
        let program = cli.engine.as_deref().or(config.engine.program.as_deref());
        Box::new(ProcessEngine::locate(program, config.engine.args.clone())?)
    };

    engine.configure(plan)?;
    Ok(())
}

/// Print an error and return the process exit code for it.
fn report(err: &anyhow::Error, color: bool) -> i32 {
    if let Some(resolution) = err.downcast_ref::<ResolutionError>() {
        emit(&resolution.to_diagnostic(), color);
        return 1;
    }

    if let Some(engine) = err.downcast_ref::<EngineError>() {
        let mut diag = Diagnostic::error(engine.to_string());
        if matches!(engine, EngineError::NotFound { .. }) {
            diag = diag.with_suggestion(suggestions::ENGINE_NOT_FOUND);
        }
        emit(&diag, color);
        return engine.exit_code();
    }

    eprintln!("error: {:#}", err);
    1
}
