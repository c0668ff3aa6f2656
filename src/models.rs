use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize, Serializer};

/// Lowercased names of every project known to work on PyPy.
pub type CompatibilitySet = HashSet<String>;

/// Manually curated projects, each with an optional note explaining the entry.
pub type OverrideTable = BTreeMap<String, Option<String>>;

/// A single file published for a release (`release_urls` entry).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseArtifact {
    /// Distribution type, e.g. `sdist` or `bdist_wheel`.
    pub packagetype: String,
    pub url: String,
    pub filename: Option<String>,
}

/// An override merged into the compatibility set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedOverride {
    pub name: String,
    pub note: Option<String>,
}

impl std::fmt::Display for AppliedOverride {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.note {
            Some(note) => write!(f, "{} ({})", self.name, note),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Result of a full aggregation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Aggregation {
    #[serde(serialize_with = "serialize_sorted")]
    pub projects: CompatibilitySet,
    /// Overrides in name order.
    pub applied: Vec<AppliedOverride>,
    /// Overrides that classifier search already found.
    pub stale: BTreeSet<String>,
}

impl Aggregation {
    pub fn contains(&self, name: &str) -> bool {
        self.projects.contains(name)
    }

    /// Project names in alphabetical order.
    pub fn sorted(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.projects.iter().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

fn serialize_sorted<S: Serializer>(set: &CompatibilitySet, serializer: S) -> Result<S::Ok, S::Error> {
    let sorted: BTreeSet<&String> = set.iter().collect();
    serializer.collect_seq(sorted)
}

/// How a single dependency fares on PyPy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// Listed as PyPy-compatible by classifier or override.
    Compatible,
    /// Not listed, but the latest release ships a universal wheel.
    Pure,
    /// No evidence it runs on PyPy.
    Blocking,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Compatible => write!(f, "compatible"),
            Verdict::Pure => write!(f, "pure"),
            Verdict::Blocking => write!(f, "blocking"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyStatus {
    /// Requirement as given by the user.
    pub requirement: String,
    pub name: String,
    pub verdict: Verdict,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregation_json_lists_projects_in_order() {
        let aggregation = Aggregation {
            projects: ["twisted", "cffi", "six", "django"]
                .iter()
                .map(|n| n.to_string())
                .collect(),
            applied: vec![AppliedOverride {
                name: "six".to_string(),
                note: None,
            }],
            stale: BTreeSet::new(),
        };

        let json = serde_json::to_value(&aggregation).unwrap();
        assert_eq!(
            json["projects"],
            serde_json::json!(["cffi", "django", "six", "twisted"])
        );

        let back: Aggregation = serde_json::from_value(json).unwrap();
        assert_eq!(back.projects, aggregation.projects);
    }
}
