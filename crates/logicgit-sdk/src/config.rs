//! Repository configuration, stored as TOML at `.logicgit/config.toml`.

use std::fs;
use std::path::Path;

use logicgit_types::DEFAULT_AUTHOR;
use serde::{Deserialize, Serialize};

use crate::error::{RepoError, RepoResult};

#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoConfig {
    pub user: UserConfig,
    pub core: CoreConfig,
    pub log: LogConfig,
    pub paths: PathsConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    /// Author recorded on new commits.
    pub author: String,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            author: DEFAULT_AUTHOR.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Branch created by `init` and pointed at by a fresh HEAD.
    pub default_branch: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            default_branch: "main".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Entries shown by `log` when no limit is given.
    pub limit: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { limit: 10 }
    }
}

/// Working directories, relative to the repository root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub rules_dir: String,
    pub data_dir: String,
    pub exports_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            rules_dir: "rules".to_string(),
            data_dir: "data".to_string(),
            exports_dir: "exports".to_string(),
        }
    }
}

impl RepoConfig {
    /// Every settable dotted key.
    pub const KEYS: [&'static str; 6] = [
        "user.author",
        "core.default_branch",
        "log.limit",
        "paths.rules_dir",
        "paths.data_dir",
        "paths.exports_dir",
    ];

    /// Read a config file; a missing file yields defaults.
    pub fn load(path: &Path) -> RepoResult<Self> {
        match fs::read_to_string(path) {
            Ok(text) => toml::from_str(&text).map_err(|e| RepoError::Config(format!("{}: {e}", path.display()))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: &Path) -> RepoResult<()> {
        let text = toml::to_string_pretty(self).map_err(|e| RepoError::Config(e.to_string()))?;
        fs::write(path, text)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        Some(match key {
            "user.author" => self.user.author.clone(),
            "core.default_branch" => self.core.default_branch.clone(),
            "log.limit" => self.log.limit.to_string(),
            "paths.rules_dir" => self.paths.rules_dir.clone(),
            "paths.data_dir" => self.paths.data_dir.clone(),
            "paths.exports_dir" => self.paths.exports_dir.clone(),
            _ => return None,
        })
    }

    pub fn set(&mut self, key: &str, value: &str) -> RepoResult<()> {
        let slot = match key {
            "user.author" => &mut self.user.author,
            "core.default_branch" => &mut self.core.default_branch,
            "paths.rules_dir" => &mut self.paths.rules_dir,
            "paths.data_dir" => &mut self.paths.data_dir,
            "paths.exports_dir" => &mut self.paths.exports_dir,
            "log.limit" => {
                self.log.limit = value
                    .parse()
                    .map_err(|_| RepoError::Config(format!("log.limit must be a number, got {value:?}")))?;
                return Ok(());
            }
            _ => return Err(RepoError::Config(format!("unknown key {key:?}"))),
        };
        *slot = value.to_string();
        Ok(())
    }

    /// All keys with their current values, in [`Self::KEYS`] order.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        Self::KEYS
            .iter()
            .filter_map(|key| self.get(key).map(|value| (*key, value)))
            .collect()
    }
}
