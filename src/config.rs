// src/config.rs

use serde::Deserialize;
use std::{fs, path::Path, time::Duration};
use url::Url;

use crate::error::ConfigError;
use crate::labels::LabelDictionary;

pub const DEFAULT_ENDPOINT: &str = "https://view.inews.qq.com/g2/getOnsInfo?name=disease_h5";

/// Runtime settings. Defaults, then an optional YAML file, then `NCOV_*`
/// environment variables.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub fetch: FetchConfig,
    pub labels: LabelSet,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
    /// Extra attempts after a failed GET. `0` leaves retrying to the caller.
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: 30,
            max_retries: 0,
            initial_backoff_ms: 500,
        }
    }
}

impl FetchConfig {
    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.endpoint).map_err(|source| ConfigError::Endpoint {
            endpoint: self.endpoint.clone(),
            source,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Which built-in label dictionary names the columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelSet {
    #[default]
    English,
    Chinese,
}

impl LabelSet {
    pub fn dictionary(&self) -> &'static LabelDictionary {
        match self {
            LabelSet::English => LabelDictionary::english(),
            LabelSet::Chinese => LabelDictionary::chinese(),
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "english" | "en" => Some(LabelSet::English),
            "chinese" | "zh" => Some(LabelSet::Chinese),
            _ => None,
        }
    }
}

impl Config {
    /// Load from `path` (if given) and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|var| std::env::var(var).ok())?;
        config.fetch.endpoint_url()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_yaml::from_str(&text).map_err(|source| ConfigError::Yaml {
            path: path.display().to_string(),
            source,
        })
    }

    /// Override fields from `NCOV_ENDPOINT`, `NCOV_TIMEOUT_SECS`,
    /// `NCOV_MAX_RETRIES` and `NCOV_LABELS`, as returned by `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup("NCOV_ENDPOINT") {
            self.fetch.endpoint = endpoint;
        }
        if let Some(value) = lookup("NCOV_TIMEOUT_SECS") {
            self.fetch.timeout_secs = value.trim().parse().map_err(|_| ConfigError::Env {
                var: "NCOV_TIMEOUT_SECS",
                value: value.clone(),
            })?;
        }
        if let Some(value) = lookup("NCOV_MAX_RETRIES") {
            self.fetch.max_retries = value.trim().parse().map_err(|_| ConfigError::Env {
                var: "NCOV_MAX_RETRIES",
                value: value.clone(),
            })?;
        }
        if let Some(value) = lookup("NCOV_LABELS") {
            self.labels = LabelSet::parse(&value).ok_or_else(|| ConfigError::Env {
                var: "NCOV_LABELS",
                value: value.clone(),
            })?;
        }
        Ok(())
    }
}
