//! Manually curated projects that classifier search misses.

use std::path::Path;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::models::OverrideTable;

const OVERRIDES_JSON: &str = include_str!("overrides.json");

/// Look up a resource bundled into the binary.
pub fn resource(name: &str) -> Result<&'static str> {
    match name {
        "overrides.json" => Ok(OVERRIDES_JSON),
        other => Err(Error::UnknownResource(other.to_string())),
    }
}

/// The override table shipped with the tool.
pub fn bundled() -> Result<OverrideTable> {
    parse(resource("overrides.json")?)
}

/// Load a user-supplied override table from disk.
pub fn load(path: &Path) -> Result<OverrideTable> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

/// Parse a JSON object of project name to note.
///
/// Names are lowercased. Only non-empty string values count as notes.
pub fn parse(content: &str) -> Result<OverrideTable> {
    let raw: serde_json::Map<String, Value> = serde_json::from_str(content)?;
    Ok(raw
        .into_iter()
        .map(|(name, value)| {
            let note = match value {
                Value::String(note) if !note.trim().is_empty() => Some(note),
                _ => None,
            };
            (name.to_lowercase(), note)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_bundled_table_parses() {
        let table = bundled().unwrap();
        assert!(!table.is_empty());
        assert!(table.keys().all(|name| *name == name.to_lowercase()));
    }

    #[test]
    fn test_notes_and_empty_markers() {
        let table = parse(r#"{"Foo-Bar": "ships with PyPy", "baz": null, "qux": "", "quux": {}}"#)
            .unwrap();
        assert_eq!(table.get("foo-bar"), Some(&Some("ships with PyPy".to_string())));
        assert_eq!(table.get("baz"), Some(&None));
        assert_eq!(table.get("qux"), Some(&None));
        assert_eq!(table.get("quux"), Some(&None));
    }

    #[test]
    fn test_rejects_non_object() {
        assert!(matches!(parse(r#"["foo"]"#), Err(Error::Overrides(_))));
    }

    #[test]
    fn test_unknown_resource() {
        assert!(matches!(resource("missing.json"), Err(Error::UnknownResource(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, r#"{{"greenlet": "bundled with PyPy"}}"#).unwrap();

        let table = load(f.path()).unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.contains_key("greenlet"));
    }
}
