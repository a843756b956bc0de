//! Runtime configuration

use serde::Deserialize;
use thiserror::Error;

use crate::gc::DEFAULT_GC_THRESHOLD;

/// Default bound on nested native/host/code calls
pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

/// Default bound on the argument count of a prepared native call frame
pub const DEFAULT_MAX_CALL_ARGS: usize = 65_536;

/// Tunables for a [`crate::Runtime`]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Allocations between automatic collections (0 disables them)
    pub gc_threshold: usize,
    /// Calls deeper than this raise RangeError
    pub max_call_depth: usize,
    /// Frames with more arguments than this raise RangeError
    pub max_call_args: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            gc_threshold: DEFAULT_GC_THRESHOLD,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            max_call_args: DEFAULT_MAX_CALL_ARGS,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid runtime config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },
}

impl RuntimeConfig {
    /// Parse a JSON object. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Apply `GC_THRESHOLD`, `MAX_CALL_DEPTH` and `MAX_CALL_ARGS` from the environment
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    fn with_overrides_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(value) = lookup("GC_THRESHOLD") {
            self.gc_threshold = parse_usize("GC_THRESHOLD", value)?;
        }
        if let Some(value) = lookup("MAX_CALL_DEPTH") {
            self.max_call_depth = parse_usize("MAX_CALL_DEPTH", value)?;
        }
        if let Some(value) = lookup("MAX_CALL_ARGS") {
            self.max_call_args = parse_usize("MAX_CALL_ARGS", value)?;
        }
        Ok(self)
    }
}

fn parse_usize(name: &'static str, value: String) -> Result<usize, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { name, value })
}
