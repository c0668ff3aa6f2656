//! In-memory index used by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::{Connector, IndexSession};
use crate::error::{Error, Result};
use crate::models::ReleaseArtifact;

#[derive(Debug, Clone)]
pub enum BrowseReply {
    Hits(Vec<(String, String)>),
    /// The body could not be decoded, as happens for empty results.
    Malformed,
    Fail,
}

#[derive(Default)]
struct State {
    browse: HashMap<String, BrowseReply>,
    packages: Vec<String>,
    releases: HashMap<String, Vec<String>>,
    urls: HashMap<(String, String), Vec<ReleaseArtifact>>,
    failing_close: bool,
    browse_delay: Option<Duration>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    opened: AtomicUsize,
    closed: AtomicUsize,
}

#[derive(Clone, Default)]
pub struct FakeIndex {
    state: Arc<State>,
}

impl FakeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn state_mut(&mut self) -> &mut State {
        Arc::get_mut(&mut self.state).expect("fake index configured before use")
    }

    pub fn with_browse(mut self, classifier: &str, reply: BrowseReply) -> Self {
        self.state_mut().browse.insert(classifier.to_string(), reply);
        self
    }

    pub fn with_hits(self, classifier: &str, names: &[&str]) -> Self {
        let hits = names
            .iter()
            .map(|name| (name.to_string(), "1.0".to_string()))
            .collect();
        self.with_browse(classifier, BrowseReply::Hits(hits))
    }

    pub fn with_package(mut self, name: &str, versions: &[&str]) -> Self {
        let state = self.state_mut();
        state.packages.push(name.to_string());
        state
            .releases
            .insert(name.to_string(), versions.iter().map(|v| v.to_string()).collect());
        self
    }

    pub fn with_artifact(mut self, name: &str, version: &str, packagetype: &str, url: &str) -> Self {
        self.state_mut()
            .urls
            .entry((name.to_string(), version.to_string()))
            .or_default()
            .push(ReleaseArtifact {
                packagetype: packagetype.to_string(),
                url: url.to_string(),
                filename: url.rsplit('/').next().map(str::to_string),
            });
        self
    }

    pub fn failing_close(mut self) -> Self {
        self.state_mut().failing_close = true;
        self
    }

    /// Keep every browse call pending for `delay` so calls overlap.
    pub fn with_browse_delay(mut self, delay: Duration) -> Self {
        self.state_mut().browse_delay = Some(delay);
        self
    }

    /// Most browse calls that were running at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.state.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn opened(&self) -> usize {
        self.state.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.state.closed.load(Ordering::SeqCst)
    }
}

pub struct FakeSession {
    state: Arc<State>,
}

#[async_trait]
impl Connector for FakeIndex {
    type Session = FakeSession;

    async fn open(&self) -> Result<FakeSession> {
        self.state.opened.fetch_add(1, Ordering::SeqCst);
        Ok(FakeSession {
            state: Arc::clone(&self.state),
        })
    }
}

#[async_trait]
impl IndexSession for FakeSession {
    async fn browse(&self, classifiers: &[String]) -> Result<Vec<(String, String)>> {
        let running = self.state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.peak_in_flight.fetch_max(running, Ordering::SeqCst);
        if let Some(delay) = self.state.browse_delay {
            tokio::time::sleep(delay).await;
        }
        self.state.in_flight.fetch_sub(1, Ordering::SeqCst);

        let key = classifiers.join(",");
        match self.state.browse.get(&key) {
            Some(BrowseReply::Hits(hits)) => Ok(hits.clone()),
            Some(BrowseReply::Malformed) => {
                Err(Error::MalformedResponse("no element found".to_string()))
            }
            Some(BrowseReply::Fail) => Err(Error::Fault {
                code: 1,
                message: format!("browse failed for {key}"),
            }),
            None => Ok(Vec::new()),
        }
    }

    async fn list_packages(&self) -> Result<Vec<String>> {
        Ok(self.state.packages.clone())
    }

    async fn package_releases(&self, name: &str) -> Result<Vec<String>> {
        Ok(self.state.releases.get(name).cloned().unwrap_or_default())
    }

    async fn release_urls(&self, name: &str, version: &str) -> Result<Vec<ReleaseArtifact>> {
        Ok(self
            .state
            .urls
            .get(&(name.to_string(), version.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn close(&self) -> Result<()> {
        self.state.closed.fetch_add(1, Ordering::SeqCst);
        if self.state.failing_close {
            return Err(Error::MalformedResponse("close is not supported".to_string()));
        }
        Ok(())
    }
}
