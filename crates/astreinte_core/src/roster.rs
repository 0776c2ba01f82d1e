use anyhow::Result;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Maps opaque per-person codes to display names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    users: BTreeMap<String, String>,
}

impl Roster {
    pub fn new(users: BTreeMap<String, String>) -> Self {
        Self { users }
    }

    /// Loads a YAML `code: Name` mapping. A missing file is an empty roster.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no roster file, nobody can sign in");
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let users: BTreeMap<String, String> = serde_yaml::from_str(&raw)?;
        Ok(Self::new(users))
    }

    /// Display name for `code`; `None` means no current user.
    pub fn identify(&self, code: &str) -> Option<&str> {
        self.users.get(code.trim()).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.users.values().map(String::as_str)
    }
}

/// Trims and capitalizes a typed-in name: `" aLICE "` becomes `"Alice"`.
pub fn normalize_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let mut chars = trimmed.chars();
    let first = chars.next()?;
    Some(first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect())
}
