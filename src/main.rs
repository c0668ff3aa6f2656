//! `caniusepypy` — find out which PyPI projects support PyPy and whether your
//! dependencies do.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]) and install the log subscriber.
//! 2. Load config ([`config::load_config`]).
//! 3. Fetch the PyPy trove classifiers and browse each one ([`aggregate`]).
//! 4. Merge in the manual overrides ([`overrides`]).
//! 5. For `check`, probe unlisted dependencies for universal wheels ([`purity`]).
//! 6. Render the requested report ([`report`]).
//! 7. Exit `0` (clean) or `1` (at least one [`models::Verdict::Blocking`] dependency).

mod aggregate;
mod cli;
mod config;
mod error;
mod index;
mod models;
mod names;
mod overrides;
mod purity;
mod report;

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use cli::{AllArgs, CheckArgs, Cli, Command, ProjectsArgs, ReportFormat};
use config::{load_config, Config};
use index::xmlrpc::{http_client, XmlRpcConnector};
use models::{DependencyStatus, OverrideTable, Verdict};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let cwd = std::env::current_dir()?;
    let config = load_config(&cwd, cli.config.as_deref())?;

    let http = http_client(&config.index)?;
    let connector = XmlRpcConnector::new(http.clone(), config.index.rpc_url.clone());

    match cli.command {
        Command::Projects(args) => {
            projects(&config, &connector, &http, args, cli.verbose, cli.quiet).await
        }
        Command::Check(args) => {
            let has_blockers = check(&config, &connector, &http, args, cli.quiet).await?;
            if has_blockers {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::All(args) => all(&connector, args).await,
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// `--overrides` wins over the config file; neither means the bundled table.
fn manual_overrides(config: &Config, cli_path: Option<&Path>) -> Result<Option<OverrideTable>> {
    let path = cli_path.or(config.aggregate.overrides.as_deref());
    path.map(|p| {
        overrides::load(p).with_context(|| format!("loading overrides from {}", p.display()))
    })
    .transpose()
}

async fn projects(
    config: &Config,
    connector: &XmlRpcConnector,
    http: &reqwest::Client,
    args: ProjectsArgs,
    verbose: bool,
    quiet: bool,
) -> Result<()> {
    let table = manual_overrides(config, args.overrides.as_deref())?;
    let aggregation =
        aggregate::aggregate(connector, http, &config.index, &config.aggregate, table).await?;

    match args.format {
        ReportFormat::Terminal => report::terminal::render_projects(&aggregation, verbose, quiet),
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&aggregation)?),
    }
    Ok(())
}

/// Returns whether any dependency blocks PyPy.
async fn check(
    config: &Config,
    connector: &XmlRpcConnector,
    http: &reqwest::Client,
    args: CheckArgs,
    quiet: bool,
) -> Result<bool> {
    let mut requirements = args.requirements;
    for file in &args.files {
        let content = std::fs::read_to_string(file)
            .with_context(|| format!("reading requirements from {}", file.display()))?;
        requirements.extend(names::requirement_lines(&content));
    }
    if requirements.is_empty() {
        bail!("no requirements given; pass them as arguments or with -r FILE");
    }

    let mut statuses = requirements
        .into_iter()
        .map(|requirement| -> Result<DependencyStatus> {
            let name = names::normalize(&requirement)?;
            Ok(DependencyStatus {
                requirement,
                name,
                verdict: Verdict::Blocking,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let table = manual_overrides(config, args.overrides.as_deref())?;
    let aggregation =
        aggregate::aggregate(connector, http, &config.index, &config.aggregate, table).await?;

    for status in &mut statuses {
        if aggregation.contains(&status.name) {
            status.verdict = Verdict::Compatible;
        }
    }

    probe_purity(connector, &mut statuses, quiet).await?;

    match args.format {
        ReportFormat::Terminal => report::terminal::render_check(&statuses, quiet),
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&statuses)?),
    }

    Ok(statuses.iter().any(|s| s.verdict == Verdict::Blocking))
}

/// Look for universal wheels among the dependencies not already known to work.
async fn probe_purity(
    connector: &XmlRpcConnector,
    statuses: &mut [DependencyStatus],
    quiet: bool,
) -> Result<()> {
    use futures::future::join_all;

    const BATCH_SIZE: usize = 16;

    let mut pending: Vec<&mut DependencyStatus> = statuses
        .iter_mut()
        .filter(|s| s.verdict == Verdict::Blocking)
        .collect();
    if pending.is_empty() {
        return Ok(());
    }

    let pb = if !quiet {
        let pb = ProgressBar::new(pending.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )?
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    for batch in pending.chunks_mut(BATCH_SIZE) {
        let futures: Vec<_> = batch
            .iter()
            .map(|status| purity::is_pure(connector, &status.name))
            .collect();

        let results = join_all(futures).await;

        for (status, result) in batch.iter_mut().zip(results) {
            if result? {
                status.verdict = Verdict::Pure;
            }
            if let Some(pb) = &pb {
                pb.inc(1);
            }
        }
    }

    if let Some(pb) = pb {
        pb.finish_with_message("Done");
    }

    Ok(())
}

async fn all(connector: &XmlRpcConnector, args: AllArgs) -> Result<()> {
    let projects = aggregate::all_projects(connector).await?;

    match args.format {
        ReportFormat::Terminal => report::terminal::render_all(&projects, args.count),
        ReportFormat::Json if args.count => {
            println!("{}", serde_json::json!({ "count": projects.len() }))
        }
        ReportFormat::Json => {
            let mut names: Vec<&String> = projects.iter().collect();
            names.sort_unstable();
            println!("{}", serde_json::to_string_pretty(&names)?);
        }
    }
    Ok(())
}
