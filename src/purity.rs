use tracing::debug;

use crate::error::Result;
use crate::index::{with_session, Connector, IndexSession};
use crate::models::ReleaseArtifact;

/// Wheel tags that work on any interpreter.
const UNIVERSAL_TAGS: [&str; 2] = ["py2.py3-none-any", "py2.none-any"];

/// Whether the latest release of `dependency` ships a universal wheel.
///
/// A project with no releases is never considered pure. Releases are taken in
/// the order the index returns them, oldest first.
pub async fn is_pure<C>(connector: &C, dependency: &str) -> Result<bool>
where
    C: Connector + ?Sized,
{
    let dependency = dependency.to_string();
    with_session(connector, move |session| {
        Box::pin(async move {
            let releases = session.package_releases(&dependency).await?;
            let Some(latest) = releases.last() else {
                debug!(dependency = %dependency, "no releases published");
                return Ok(false);
            };

            let artifacts = session.release_urls(&dependency, latest).await?;
            Ok(artifacts.iter().any(is_universal_wheel))
        })
    })
    .await
}

pub fn is_universal_wheel(artifact: &ReleaseArtifact) -> bool {
    artifact.packagetype == "bdist_wheel"
        && UNIVERSAL_TAGS.iter().any(|tag| artifact.url.contains(tag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::fake::FakeIndex;

    const FILES: &str = "https://files.pythonhosted.org/packages";

    #[tokio::test]
    async fn test_no_releases_is_not_pure() {
        let index = FakeIndex::new().with_package("somepkg", &[]);
        assert!(!is_pure(&index, "somepkg").await.unwrap());
        assert_eq!(index.closed(), 1);
    }

    #[tokio::test]
    async fn test_universal_wheel_is_pure() {
        let index = FakeIndex::new()
            .with_package("somepkg", &["1.0", "1.1"])
            .with_artifact("somepkg", "1.1", "sdist", &format!("{FILES}/somepkg-1.1.tar.gz"))
            .with_artifact(
                "somepkg",
                "1.1",
                "bdist_wheel",
                &format!("{FILES}/somepkg-1.1-py2.py3-none-any.whl"),
            );
        assert!(is_pure(&index, "somepkg").await.unwrap());
    }

    #[tokio::test]
    async fn test_only_latest_release_counts() {
        let index = FakeIndex::new()
            .with_package("somepkg", &["1.0", "2.0"])
            .with_artifact(
                "somepkg",
                "1.0",
                "bdist_wheel",
                &format!("{FILES}/somepkg-1.0-py2.py3-none-any.whl"),
            )
            .with_artifact("somepkg", "2.0", "sdist", &format!("{FILES}/somepkg-2.0.tar.gz"));
        assert!(!is_pure(&index, "somepkg").await.unwrap());
    }

    #[tokio::test]
    async fn test_interpreter_specific_wheel_is_not_pure() {
        let index = FakeIndex::new()
            .with_package("somepkg", &["1.0"])
            .with_artifact(
                "somepkg",
                "1.0",
                "bdist_wheel",
                &format!("{FILES}/somepkg-1.0-cp27-cp27mu-manylinux1_x86_64.whl"),
            )
            .with_artifact("somepkg", "1.0", "sdist", &format!("{FILES}/somepkg-1.0.tar.gz"));
        assert!(!is_pure(&index, "somepkg").await.unwrap());
    }

    #[test]
    fn test_universal_tag_needs_wheel_type() {
        let egg = ReleaseArtifact {
            packagetype: "bdist_egg".to_string(),
            url: format!("{FILES}/somepkg-1.0-py2.py3-none-any.whl"),
            filename: None,
        };
        assert!(!is_universal_wheel(&egg));

        let py2_only = ReleaseArtifact {
            packagetype: "bdist_wheel".to_string(),
            url: format!("{FILES}/somepkg-1.0-py2.none-any.whl"),
            filename: None,
        };
        assert!(is_universal_wheel(&py2_only));
    }
}
