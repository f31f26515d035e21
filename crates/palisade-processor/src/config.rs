//! Processor configuration.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;

use crate::error::ProcessorError;

/// Default policy file poll interval.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// Configuration for the policy processor.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Path to a JSON file containing policies. The file is watched for
    /// changes and policies are reloaded automatically.
    pub policy_file: Option<PathBuf>,

    /// How often to check the policy file for changes, in seconds.
    pub poll_interval_secs: u64,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            policy_file: None,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}

impl ProcessorConfig {
    /// Load configuration from files and environment.
    ///
    /// Configuration is loaded in order (later sources override earlier):
    /// 1. Default values
    /// 2. `palisade.toml` in the current directory
    /// 3. Environment variables prefixed with `PALISADE_`
    pub fn load() -> Result<Self, ProcessorError> {
        Figment::new()
            .merge(Toml::file("palisade.toml"))
            .merge(Env::prefixed("PALISADE_"))
            .extract()
            .map_err(|e| ProcessorError::Config(e.to_string()))
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &str) -> Result<Self, ProcessorError> {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("PALISADE_"))
            .extract()
            .map_err(|e| ProcessorError::Config(e.to_string()))
    }

    /// Check that the configuration is complete.
    pub fn validate(&self) -> Result<(), ProcessorError> {
        match &self.policy_file {
            Some(path) if !path.as_os_str().is_empty() => Ok(()),
            _ => Err(ProcessorError::Config(
                "policy_file is required".to_owned(),
            )),
        }
    }

    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}
