//! Runtime configuration.
//!
//! Resolution order: command line flags, then environment, then defaults.

use anyhow::{Result, bail};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Environment variable naming the data file.
pub const DATA_ENV: &str = "TALLYLAX_DATA";

/// Environment variable naming the backend (`redb` or `file`).
pub const BACKEND_ENV: &str = "TALLYLAX_BACKEND";

/// Data file used when nothing else is configured.
pub const DEFAULT_DATA_PATH: &str = "tallylax.db";

/// Durable storage backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Backend {
    /// Embedded redb database, one record per state key.
    #[default]
    Redb,
    /// Single binary snapshot file.
    File,
}

impl Backend {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Redb => "redb",
            Self::File => "file",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redb" => Ok(Self::Redb),
            "file" => Ok(Self::File),
            other => bail!("Unknown backend '{other}'. Use 'redb' or 'file'."),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data: PathBuf,
    pub backend: Backend,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data: PathBuf::from(DEFAULT_DATA_PATH),
            backend: Backend::default(),
        }
    }
}

impl Config {
    /// Resolve against the process environment.
    pub fn resolve(data: Option<PathBuf>, backend: Option<Backend>) -> Result<Self> {
        Self::resolve_with(data, backend, |key| std::env::var(key).ok())
    }

    /// Resolve with an explicit environment lookup.
    pub fn resolve_with<F>(data: Option<PathBuf>, backend: Option<Backend>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let data = match data {
            Some(path) => path,
            None => env(DATA_ENV)
                .filter(|v| !v.trim().is_empty())
                .map_or(defaults.data, PathBuf::from),
        };

        let backend = match backend {
            Some(backend) => backend,
            None => match env(BACKEND_ENV).filter(|v| !v.trim().is_empty()) {
                Some(raw) => raw.parse()?,
                None => defaults.backend,
            },
        };

        Ok(Self { data, backend })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_apply_without_flags_or_env() {
        let config = Config::resolve_with(None, None, no_env).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.data, PathBuf::from("tallylax.db"));
        assert_eq!(config.backend, Backend::Redb);
    }

    #[test]
    fn env_overrides_defaults() {
        let env = |key: &str| match key {
            DATA_ENV => Some("/tmp/team.snap".to_string()),
            BACKEND_ENV => Some("FILE".to_string()),
            _ => None,
        };
        let config = Config::resolve_with(None, None, env).unwrap();
        assert_eq!(config.data, PathBuf::from("/tmp/team.snap"));
        assert_eq!(config.backend, Backend::File);
    }

    #[test]
    fn flags_override_env() {
        let env = |key: &str| match key {
            DATA_ENV => Some("/tmp/env.db".to_string()),
            BACKEND_ENV => Some("file".to_string()),
            _ => None,
        };
        let config =
            Config::resolve_with(Some(PathBuf::from("flag.db")), Some(Backend::Redb), env).unwrap();
        assert_eq!(config.data, PathBuf::from("flag.db"));
        assert_eq!(config.backend, Backend::Redb);
    }

    #[test]
    fn bad_backend_in_env_is_an_error() {
        let env = |key: &str| (key == BACKEND_ENV).then(|| "sqlite".to_string());
        assert!(Config::resolve_with(None, None, env).is_err());
    }

    #[test]
    fn backend_parses_loosely() {
        assert_eq!(" Redb ".parse::<Backend>().unwrap(), Backend::Redb);
        assert_eq!("file".parse::<Backend>().unwrap(), Backend::File);
        assert!("".parse::<Backend>().is_err());
    }
}
