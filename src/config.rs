//! Profiler configuration

use crate::error::{ProfilerError, Result};
use crate::host::ConfigSource;
use crate::sample::DEFAULT_SAMPLE_LIMIT;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Profiler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilerConfig {
    /// Seconds between drains of the sampling engine
    pub flush_interval: f64,
    /// Cap on retained samples per window; the retention period doubles
    /// whenever a window reaches it
    pub sample_limit: usize,
    /// Minimum window duration worth profiling, in seconds (0 = disabled)
    pub min_task_duration: f64,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            flush_interval: 0.1, // 100ms
            sample_limit: DEFAULT_SAMPLE_LIMIT,
            min_task_duration: 0.0, // Keep nothing for slowness alone
        }
    }
}

impl ProfilerConfig {
    /// Create a new profiler configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save configuration to a JSON file
    pub fn to_file(&self, path: impl AsRef<std::path::Path>) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl ConfigSource for ProfilerConfig {
    fn min_duration(&self) -> Result<f64> {
        Ok(self.min_task_duration)
    }
}

/// Configuration source that re-reads a JSON config file on every query, so
/// threshold changes take effect without restarting the worker
#[derive(Debug, Clone)]
pub struct FileConfigSource {
    path: PathBuf,
}

impl FileConfigSource {
    /// Create a source backed by the given config file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing config file
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl ConfigSource for FileConfigSource {
    fn min_duration(&self) -> Result<f64> {
        let config = ProfilerConfig::from_file(&self.path)
            .map_err(|e| ProfilerError::config(format!("{}: {}", self.path.display(), e)))?;
        Ok(config.min_task_duration)
    }
}
