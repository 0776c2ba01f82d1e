use crate::engine::BalancingPolicy;
use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "astreinte.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub roster: RosterConfig,
    pub balancing: BalancingConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("data/plannings.db"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    pub path: PathBuf,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/users.yaml"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BalancingConfig {
    pub policy: BalancingPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub out_dir: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("reports"),
        }
    }
}

impl Config {
    /// Reads a TOML config; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&raw)?;
        Ok(config)
    }

    /// Resolves relative paths against the directory holding the config file.
    pub fn rebased(mut self, config_path: &Path) -> Self {
        let Some(base) = config_path.parent().filter(|dir| !dir.as_os_str().is_empty()) else {
            return self;
        };
        for path in [
            &mut self.storage.db_path,
            &mut self.roster.path,
            &mut self.report.out_dir,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [balancing]
            policy = "greedy"
            "#,
        )
        .unwrap();
        assert_eq!(config.balancing.policy, BalancingPolicy::Greedy);
        assert_eq!(config.storage.db_path, PathBuf::from("data/plannings.db"));
        assert_eq!(config.report.out_dir, PathBuf::from("reports"));
    }

    #[test]
    fn missing_file_is_default_and_paths_rebase() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        let config = Config::load(&path).unwrap().rebased(&path);
        assert_eq!(config.storage.db_path, dir.path().join("data/plannings.db"));
        assert_eq!(config.balancing.policy, BalancingPolicy::Snapshot);
    }

    #[test]
    fn unknown_policy_is_an_error() {
        assert!(toml::from_str::<Config>("[balancing]\npolicy = \"random\"\n").is_err());
    }
}
