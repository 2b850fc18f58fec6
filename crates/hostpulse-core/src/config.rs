//! Dashboard configuration.
//!
//! Every field has a default, so an empty file (or no file) is valid:
//!
//! ```toml
//! history_seconds = 31.0
//! initial_family = "cpu_util"
//! fallback_sample_period = 1.0
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::families::FamilyKind;

/// Shortest sample period taken from the collector, in seconds.
pub const MIN_SAMPLE_PERIOD: f64 = 0.001;

/// Most cells a single window may hold.
pub const MAX_WINDOW_CAPACITY: usize = 100_000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config value: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    /// Seconds of history kept per channel.
    pub history_seconds: f64,
    /// Family shown right after bootstrap.
    pub initial_family: FamilyKind,
    /// Sample period assumed when the collector advertises none, or junk.
    pub fallback_sample_period: f64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            history_seconds: 31.0,
            initial_family: FamilyKind::CpuUtil,
            fallback_sample_period: 1.0,
        }
    }
}

impl DashboardConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.history_seconds.is_finite() || self.history_seconds <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "history_seconds must be a positive number, got {}",
                self.history_seconds
            )));
        }
        if !self.fallback_sample_period.is_finite() || self.fallback_sample_period < MIN_SAMPLE_PERIOD {
            return Err(ConfigError::Invalid(format!(
                "fallback_sample_period must be at least {MIN_SAMPLE_PERIOD}s, got {}",
                self.fallback_sample_period
            )));
        }
        Ok(())
    }

    /// The advertised period if usable, else the fallback.
    pub fn effective_period(&self, advertised: Option<f64>) -> f64 {
        match advertised {
            Some(p) if p.is_finite() && p >= MIN_SAMPLE_PERIOD => p,
            Some(p) if p.is_finite() && p > 0.0 => {
                log::warn!(
                    "advertised sample period {p}s is below {MIN_SAMPLE_PERIOD}s; using {}s",
                    self.fallback_sample_period
                );
                self.fallback_sample_period
            }
            _ => self.fallback_sample_period,
        }
    }

    /// Cells per window: `floor(history / period)`, clamped to
    /// `1..=MAX_WINDOW_CAPACITY`.
    pub fn window_capacity(&self, period: f64) -> usize {
        let n = (self.history_seconds / period).floor();
        if n.is_nan() || n < 1.0 {
            1
        } else if n >= MAX_WINDOW_CAPACITY as f64 {
            if n > MAX_WINDOW_CAPACITY as f64 {
                log::warn!(
                    "history of {}s at {period}s per sample exceeds {MAX_WINDOW_CAPACITY} cells; clamping",
                    self.history_seconds
                );
            }
            MAX_WINDOW_CAPACITY
        } else {
            n as usize
        }
    }
}
