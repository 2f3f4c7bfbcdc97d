//! Exception-set allowlist.
//!
//! A small plain-text list of logical layer names whose line/polygon
//! duality cannot be observed from the physical table split. The catalog
//! builder consults it as a membership predicate only.

use std::collections::HashSet;
use std::path::Path;

use tracing::debug;

/// Logical layer names forced to carry both outline tags.
#[derive(Debug, Clone, Default)]
pub struct ExceptionSet {
    names: HashSet<String>,
}

impl ExceptionSet {
    /// Creates an empty set (no overrides).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set from explicit names.
    #[must_use]
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Loads the set from a plain-text file, one name per line.
    ///
    /// Lines are trimmed and blank lines discarded. A missing or unreadable
    /// file yields an empty set; the run continues without overrides.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => Self {
                names: text
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(String::from)
                    .collect(),
            },
            Err(err) => {
                debug!("exception file '{}' not read ({err}), no overrides", path.display());
                Self::default()
            }
        }
    }

    /// Returns true if the logical layer name is listed.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Number of listed names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if no names are listed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
