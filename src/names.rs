use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

static PROJECT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.-]+").expect("project name pattern is valid"));

/// Strip version specifiers, extras and markers from a requirement, leaving the
/// lowercased project name.
///
/// `Foo>=1.2.3` becomes `foo` and `My-Package[extra]` becomes `my-package`.
/// Input that does not begin with a word, dot or dash character is rejected.
pub fn normalize(requirement: &str) -> Result<String> {
    PROJECT_NAME
        .find(requirement)
        .map(|m| m.as_str().to_lowercase())
        .ok_or_else(|| Error::MalformedName(requirement.to_string()))
}

/// Pull the requirement strings out of a requirements file body.
///
/// Blank lines, comments and pip option lines (`-r`, `--index-url`, ...) are skipped.
pub fn requirement_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| line.split(" #").next().unwrap_or(line).trim())
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('-'))
        .map(str::to_string)
        .collect()
}
