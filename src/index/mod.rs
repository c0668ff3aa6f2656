//! Read-only access to the package index.
//!
//! - [`xmlrpc`] — the XML-RPC session used against the live index.
//! - [`classifiers`] — trove classifier discovery over plain HTTP.
//!
//! Callers never hold a session directly; they go through [`with_session`], which
//! opens one per call and always closes it afterwards.

pub mod classifiers;
pub mod xmlrpc;

#[cfg(test)]
pub mod fake;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tracing::debug;

use crate::error::Result;
use crate::models::ReleaseArtifact;

/// The four remote calls the crate relies on.
#[async_trait]
pub trait IndexSession: Send + Sync {
    /// Projects carrying every one of `classifiers`, as `(name, version)` pairs.
    async fn browse(&self, classifiers: &[String]) -> Result<Vec<(String, String)>>;

    async fn list_packages(&self) -> Result<Vec<String>>;

    /// Versions of `name`, oldest first.
    async fn package_releases(&self, name: &str) -> Result<Vec<String>>;

    async fn release_urls(&self, name: &str, version: &str) -> Result<Vec<ReleaseArtifact>>;

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Opens sessions bound to one index endpoint.
#[async_trait]
pub trait Connector: Send + Sync {
    type Session: IndexSession;

    async fn open(&self) -> Result<Self::Session>;
}

/// Run `f` against a freshly opened session, closing it on every exit path.
///
/// Errors raised while closing are logged and dropped; the outcome of `f` is returned
/// untouched.
pub async fn with_session<C, T, F>(connector: &C, f: F) -> Result<T>
where
    C: Connector + ?Sized,
    F: for<'s> FnOnce(&'s C::Session) -> BoxFuture<'s, Result<T>>,
{
    let session = connector.open().await?;
    let outcome = f(&session).await;
    if let Err(err) = session.close().await {
        debug!(error = %err, "ignoring error while closing index session");
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::fake::{BrowseReply, FakeIndex};
    use super::*;
    use crate::error::Error;

    #[tokio::test]
    async fn test_session_closed_after_success() {
        let index = FakeIndex::new();
        let names: Vec<String> = with_session(&index, |session| session.list_packages())
            .await
            .unwrap();

        assert!(names.is_empty());
        assert_eq!(index.opened(), 1);
        assert_eq!(index.closed(), 1);
    }

    #[tokio::test]
    async fn test_session_closed_after_failure() {
        let index = FakeIndex::new().with_browse("broken", BrowseReply::Fail);
        let result: Result<Vec<(String, String)>> = with_session(&index, |session| {
            Box::pin(async move { session.browse(&["broken".to_string()]).await })
        })
        .await;

        assert!(matches!(result, Err(Error::Fault { .. })));
        assert_eq!(index.closed(), 1);
    }

    #[tokio::test]
    async fn test_close_error_is_swallowed() {
        let index = FakeIndex::new().with_package("six", &["1.0"]).failing_close();
        let releases: Vec<String> = with_session(&index, |session| session.package_releases("six"))
            .await
            .unwrap();

        assert_eq!(releases, vec!["1.0"]);
        assert_eq!(index.closed(), 1);
    }
}
