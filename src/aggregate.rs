//! Builds the set of projects known to run on PyPy.
//!
//! Every classifier carrying the PyPy implementation marker is browsed in its own
//! index session, a bounded number at a time. The per-classifier sets are folded
//! together once all of them are in, then the manual overrides are merged on top.

use std::collections::BTreeSet;

use futures::{StreamExt, TryStreamExt};
use reqwest::Client;
use tracing::{info, warn};

use crate::config::{AggregateConfig, EmptyResultPolicy, IndexConfig};
use crate::error::{Error, Result};
use crate::index::classifiers::fetch_classifiers;
use crate::index::{with_session, Connector, IndexSession};
use crate::models::{AppliedOverride, Aggregation, CompatibilitySet, OverrideTable};
use crate::overrides;

/// Discover the PyPy classifiers, browse each of them and merge in overrides.
///
/// When `manual_overrides` is `None` the bundled table is used.
pub async fn aggregate<C>(
    connector: &C,
    http: &Client,
    index: &IndexConfig,
    settings: &AggregateConfig,
    manual_overrides: Option<OverrideTable>,
) -> Result<Aggregation>
where
    C: Connector + ?Sized,
{
    let classifiers =
        fetch_classifiers(http, &index.classifiers_url, &settings.classifier_prefix).await?;
    let projects = browse_all(
        connector,
        classifiers,
        settings.worker_count(),
        settings.empty_result,
    )
    .await?;

    let manual_overrides = match manual_overrides {
        Some(table) => table,
        None => overrides::bundled()?,
    };
    Ok(merge_overrides(projects, manual_overrides))
}

/// Browse every classifier with at most `workers` calls in flight.
///
/// The first failing classifier aborts the whole run.
pub async fn browse_all<C, I>(
    connector: &C,
    classifiers: I,
    workers: usize,
    policy: EmptyResultPolicy,
) -> Result<CompatibilitySet>
where
    C: Connector + ?Sized,
    I: IntoIterator<Item = String>,
{
    let partials: Vec<CompatibilitySet> = futures::stream::iter(classifiers)
        .map(|classifier| projects_matching_classifier(connector, classifier, policy))
        .buffer_unordered(workers.max(1))
        .try_collect()
        .await?;

    Ok(partials.into_iter().flatten().collect())
}

/// Lowercased names of the projects carrying `classifier`.
pub async fn projects_matching_classifier<C>(
    connector: &C,
    classifier: String,
    policy: EmptyResultPolicy,
) -> Result<CompatibilitySet>
where
    C: Connector + ?Sized,
{
    with_session(connector, move |session| {
        Box::pin(async move {
            info!(classifier = %classifier, "fetching project list");
            match session.browse(std::slice::from_ref(&classifier)).await {
                Ok(hits) => Ok(hits
                    .into_iter()
                    .map(|(name, _)| name.to_lowercase())
                    .collect::<CompatibilitySet>()),
                Err(Error::MalformedResponse(reason)) if policy == EmptyResultPolicy::Empty => {
                    info!(classifier = %classifier, %reason, "index didn't return any results");
                    Ok(CompatibilitySet::new())
                }
                Err(err) => Err(err),
            }
        })
    })
    .await
}

/// Union the override names into `projects`, recording which were stale.
pub fn merge_overrides(mut projects: CompatibilitySet, manual_overrides: OverrideTable) -> Aggregation {
    let stale: BTreeSet<String> = manual_overrides
        .keys()
        .map(|name| name.to_lowercase())
        .filter(|name| projects.contains(name))
        .collect();

    info!("Adding {} overrides:", manual_overrides.len());
    let applied: Vec<AppliedOverride> = manual_overrides
        .into_iter()
        .map(|(name, note)| AppliedOverride {
            name: name.to_lowercase(),
            note,
        })
        .collect();
    for entry in &applied {
        info!("    {}", entry);
    }

    if !stale.is_empty() {
        warn!(
            "Stale overrides: {}",
            stale.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
        );
    }

    projects.extend(applied.iter().map(|entry| entry.name.clone()));

    Aggregation {
        projects,
        applied,
        stale,
    }
}

/// Every project name on the index, lowercased.
pub async fn all_projects<C>(connector: &C) -> Result<CompatibilitySet>
where
    C: Connector + ?Sized,
{
    with_session(connector, |session| {
        Box::pin(async move {
            info!("Fetching all project names from the index");
            let names = session.list_packages().await?;
            Ok(names
                .into_iter()
                .map(|name| name.to_lowercase())
                .collect::<CompatibilitySet>())
        })
    })
    .await
}
