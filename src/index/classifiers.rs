use reqwest::Client;
use tracing::info;

use crate::error::{Error, Result};

/// Marker shared by every classifier describing the PyPy implementation.
pub const PYPY_CLASSIFIER: &str = "Programming Language :: Python :: Implementation :: PyPy";

/// Single-pass iterator over the classifiers that start with a prefix.
///
/// Lines are scanned out of the response body on demand. Prefix matching is
/// deliberate: any classifier extending the marker counts.
pub struct Classifiers {
    body: String,
    pos: usize,
    prefix: String,
}

impl Classifiers {
    /// Filter a newline-delimited classifier listing.
    pub fn from_listing(listing: impl Into<String>, prefix: &str) -> Self {
        Self {
            body: listing.into(),
            pos: 0,
            prefix: prefix.to_string(),
        }
    }
}

impl Iterator for Classifiers {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        while self.pos < self.body.len() {
            let rest = &self.body[self.pos..];
            let (line, consumed) = match rest.find('\n') {
                Some(end) => (&rest[..end], end + 1),
                None => (rest, rest.len()),
            };
            self.pos += consumed;

            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.starts_with(self.prefix.as_str()) {
                return Some(line.to_string());
            }
        }
        None
    }
}

/// Fetch the index's classifier listing and keep the ones starting with `prefix`.
pub async fn fetch_classifiers(client: &Client, url: &str, prefix: &str) -> Result<Classifiers> {
    info!(url, "fetching trove classifiers");
    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::RemoteFetch {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response.text().await?;
    Ok(Classifiers::from_listing(body, prefix))
}
