use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical path+query identifying a navigable state of the application.
///
/// Compared only by structural equality; immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Location(String);

impl Location {
    /// Normalizes the raw value to a leading slash. An empty value is the root.
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        if raw.is_empty() {
            Self("/".to_string())
        } else if raw.starts_with('/') {
            Self(raw)
        } else {
            Self(format!("/{raw}"))
        }
    }

    pub fn root() -> Self {
        Self("/".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The portion before any `?`.
    pub fn path(&self) -> &str {
        match self.0.split_once('?') {
            Some((path, _)) => path,
            None => &self.0,
        }
    }

    /// The query string after `?`, if present.
    pub fn query(&self) -> Option<&str> {
        self.0.split_once('?').map(|(_, query)| query)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a committed navigation mutates the history stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryMode {
    #[default]
    Push,
    Replace,
}
