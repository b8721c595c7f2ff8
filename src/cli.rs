//! CLI definitions and entry point

use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::commands;
use nrdiag::output::OutputMode;

/// nrdiag - Diagnostics runner for New Relic agents
#[derive(Parser, Debug)]
#[command(
    name = "nrdiag",
    version,
    about = "Diagnostics runner for New Relic agents",
    long_about = "Run host checks in dependency order and report what they found.\n\n\
                  Tasks are named Category/Subcategory/Name. Select them by name,\n\
                  by wildcard (Base/Config/*) or through a suite."
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output in JSON format (machine-readable)
    #[arg(long, global = true)]
    pub json: bool,

    /// Run profile to load instead of the default locations
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run tasks and report the results
    Run(RunArgs),

    /// Show the execution plan without running anything
    Plan(SelectArgs),

    /// List registered tasks
    List,

    /// List task suites
    Suites,

    /// Show version
    Version,
}

/// Which tasks to run, and with what options
#[derive(Args, Debug, Clone, Default)]
pub struct SelectArgs {
    /// Tasks to run: identifiers, wildcards (Base/Config/*) or `all`
    #[arg(short, long, value_delimiter = ',')]
    pub tasks: Vec<String>,

    /// Suites to run
    #[arg(short, long, value_delimiter = ',')]
    pub suites: Vec<String>,

    /// Tasks to skip
    #[arg(short = 'x', long, value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Task option as key=value (repeatable)
    #[arg(long = "option", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub options: Vec<(String, String)>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    #[command(flatten)]
    pub select: SelectArgs,

    /// Statuses to show: `all` or a list such as warning,failure
    #[arg(short, long, value_delimiter = ',')]
    pub filter: Vec<String>,

    /// Write the report and collected files into this directory
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("Invalid option: {s}. Use: key=value"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("Invalid option: {s}. The key is empty"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Run the CLI
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    if cli.json || !io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    let config = cli.config.as_deref();

    match cli.command {
        Some(Command::Run(args)) => commands::run(config, &args, output_mode),
        Some(Command::Plan(select)) => commands::plan(config, &select, output_mode),
        Some(Command::List) => commands::list(output_mode),
        Some(Command::Suites) => commands::suites(config, output_mode),
        Some(Command::Version) => {
            if output_mode == OutputMode::Json {
                println!(
                    "{}",
                    serde_json::json!({
                        "version": env!("CARGO_PKG_VERSION")
                    })
                );
            } else {
                println!("nrdiag v{}", env!("CARGO_PKG_VERSION"));
            }
            Ok(())
        },
        None => {
            if output_mode == OutputMode::Json {
                println!(
                    "{}",
                    serde_json::json!({
                        "version": env!("CARGO_PKG_VERSION"),
                        "hint": "Use --help for usage"
                    })
                );
            } else {
                println!("nrdiag v{}", env!("CARGO_PKG_VERSION"));
                println!("\nRun 'nrdiag --help' for usage");
                println!("Run 'nrdiag run' to run every default task");
            }
            Ok(())
        },
    }
}
