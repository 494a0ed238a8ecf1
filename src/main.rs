//! Kata CLI
//!
//! Runs JSON suite manifests through the executor and prints a report.

use anyhow::Context;
use clap::{Parser, Subcommand};
use kata::manifest::Manifest;
use kata::report::render_tree;
use kata::{Executor, ExecutorConfig, Reporter, DEFAULT_TIMEOUT, VERSION};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kata")]
#[command(author, version, about = "Hierarchical test registration and execution engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the suites of a manifest
    Run {
        /// Manifest file
        file: PathBuf,
        /// Output format: spec, json or tap
        #[arg(short, long, default_value_t = Reporter::Spec)]
        reporter: Reporter,
        /// Per-action deadline in milliseconds (0 disables deadlines)
        #[arg(short, long, value_name = "MS")]
        timeout: Option<u64>,
        /// Only run cases whose full title matches this pattern
        #[arg(short, long, value_name = "PATTERN")]
        grep: Option<Regex>,
        /// Run the cases that do not match --grep instead
        #[arg(short, long, requires = "grep")]
        invert: bool,
        /// Stop running cases after the first failure
        #[arg(short, long)]
        bail: bool,
    },

    /// Print the suite tree of a manifest without running it
    List {
        /// Manifest file
        file: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            file,
            reporter,
            timeout,
            grep,
            invert,
            bail,
        } => run_manifest(&file, reporter, timeout, grep, invert, bail),
        Commands::List { file } => list_manifest(&file).map(|()| 0),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("kata {}: {:#}", VERSION, e);
            ExitCode::from(2)
        }
    }
}

fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env("KATA_LOG").unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load(file: &Path) -> anyhow::Result<Manifest> {
    Manifest::from_path(file).with_context(|| format!("failed to load {}", file.display()))
}

fn run_manifest(
    file: &Path,
    reporter: Reporter,
    timeout: Option<u64>,
    grep: Option<Regex>,
    invert: bool,
    bail: bool,
) -> anyhow::Result<u8> {
    let manifest = load(file)?;
    let tree = manifest
        .build_tree()
        .with_context(|| format!("invalid suite tree in {}", file.display()))?;

    let timeout = timeout
        .map(Duration::from_millis)
        .or_else(|| manifest.timeout())
        .unwrap_or(DEFAULT_TIMEOUT);
    let config = ExecutorConfig {
        timeout,
        grep,
        invert,
        bail,
    };

    let report = Executor::new(config)
        .run(&tree)
        .context("failed to start the executor")?;
    print!("{}", reporter.render(&report));
    Ok(if report.success() { 0 } else { 1 })
}

fn list_manifest(file: &Path) -> anyhow::Result<()> {
    let tree = load(file)?
        .build_tree()
        .with_context(|| format!("invalid suite tree in {}", file.display()))?;
    print!("{}", render_tree(&tree));
    Ok(())
}
