use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub repo: RepoConfig,
    pub db: DbConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RepoConfig {
    /// Root of the git working tree to index.
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    /// Location of the index database file. Rebuilt from scratch on every
    /// `cidx build`.
    pub path: PathBuf,
}

impl Config {
    /// Build a config directly from paths, bypassing the TOML file. Used when
    /// no config file exists and by tests.
    pub fn for_paths(repo: impl Into<PathBuf>, db: impl Into<PathBuf>) -> Self {
        Self {
            repo: RepoConfig { path: repo.into() },
            db: DbConfig { path: db.into() },
        }
    }

    /// Defaults when no config file is present: index the current directory
    /// into `./commit-index.db`.
    pub fn minimal() -> Self {
        Self::for_paths(".", "./commit-index.db")
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.repo.path.as_os_str().is_empty() {
        anyhow::bail!("repo.path must not be empty");
    }
    if config.db.path.as_os_str().is_empty() {
        anyhow::bail!("db.path must not be empty");
    }

    Ok(config)
}
