use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Deserialize;

use crate::index::classifiers::PYPY_CLASSIFIER;

/// Root configuration structure, deserialized from `.caniusepypy/config.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub index: IndexConfig,
    pub aggregate: AggregateConfig,
}

/// Where and how to reach the package index.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// XML-RPC endpoint.
    pub rpc_url: String,
    /// Plain-text classifier listing.
    pub classifiers_url: String,
    pub user_agent: String,
    /// Per-request timeout. Requests never time out when unset.
    pub timeout_secs: Option<u64>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        IndexConfig {
            rpc_url: "https://pypi.python.org/pypi".to_string(),
            classifiers_url: "https://pypi.python.org/pypi?%3Aaction=list_classifiers".to_string(),
            user_agent: concat!("caniusepypy/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: None,
        }
    }
}

/// Controls how the compatibility set is assembled.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AggregateConfig {
    /// Classifiers starting with this string are browsed.
    pub classifier_prefix: String,
    /// Concurrent browse calls. Defaults to the number of CPUs, at least two.
    pub workers: Option<usize>,
    pub empty_result: EmptyResultPolicy,
    /// Override table replacing the bundled one.
    pub overrides: Option<PathBuf>,
}

impl Default for AggregateConfig {
    fn default() -> Self {
        AggregateConfig {
            classifier_prefix: PYPY_CLASSIFIER.to_string(),
            workers: None,
            empty_result: EmptyResultPolicy::default(),
            overrides: None,
        }
    }
}

impl AggregateConfig {
    pub fn worker_count(&self) -> usize {
        match self.workers {
            Some(n) => n.max(1),
            None => default_workers(),
        }
    }
}

/// What to do when a classifier browse returns a body that cannot be decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyResultPolicy {
    /// Count the classifier as having no projects.
    #[default]
    Empty,
    /// Abort the aggregation.
    Error,
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .max(2)
}

/// Load the configuration, searching in order:
///
/// 1. `config_override` — path passed via `--config`
/// 2. `<cwd>/.caniusepypy/config.toml`
/// 3. `~/.config/caniusepypy/config.toml`
/// 4. Built-in [`Config::default`]
pub fn load_config(cwd: &Path, config_override: Option<&Path>) -> Result<Config> {
    if let Some(path) = config_override {
        return read_config(path);
    }

    let local_config = cwd.join(".caniusepypy").join("config.toml");
    if local_config.exists() {
        return read_config(&local_config);
    }

    if let Some(home) = dirs::home_dir() {
        let home_config = home.join(".config").join("caniusepypy").join("config.toml");
        if home_config.exists() {
            return read_config(&home_config);
        }
    }

    Ok(Config::default())
}

fn read_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}
