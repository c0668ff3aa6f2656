use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "caniusepypy",
    about = "Find out which PyPI projects run on PyPy",
    version
)]
pub struct Cli {
    /// Config file [default: ./.caniusepypy/config.toml, fallback ~/.config/caniusepypy/config.toml]
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Show debug logging and every listed entry
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print summary lines
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List every project known to support PyPy
    Projects(ProjectsArgs),
    /// Check whether the given requirements can be used on PyPy
    Check(CheckArgs),
    /// List every project name on the index
    All(AllArgs),
}

#[derive(Args, Debug)]
pub struct ProjectsArgs {
    /// Override table (JSON) used instead of the bundled one
    #[arg(long, value_name = "FILE")]
    pub overrides: Option<PathBuf>,

    /// Report format
    #[arg(long, default_value = "terminal", value_name = "FORMAT")]
    pub format: ReportFormat,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Requirement strings, e.g. `requests>=2.0`
    #[arg(value_name = "REQUIREMENT")]
    pub requirements: Vec<String>,

    /// Read requirements from a pip requirements file (repeatable)
    #[arg(short = 'r', long = "requirement", value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Override table (JSON) used instead of the bundled one
    #[arg(long, value_name = "FILE")]
    pub overrides: Option<PathBuf>,

    /// Report format
    #[arg(long, default_value = "terminal", value_name = "FORMAT")]
    pub format: ReportFormat,
}

#[derive(Args, Debug)]
pub struct AllArgs {
    /// Only print how many projects exist
    #[arg(long)]
    pub count: bool,

    /// Report format
    #[arg(long, default_value = "terminal", value_name = "FORMAT")]
    pub format: ReportFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    Terminal,
    Json,
}
