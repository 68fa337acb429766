//! Configuration for Quark
//!
//! Centralized configuration with sensible defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration for a Quark store
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Path of the container file (created empty if absent)
    pub container_path: PathBuf,

    /// Directory for staging copies during rebuilds.
    /// `None` means the container's parent directory.
    pub staging_dir: Option<PathBuf>,

    // -------------------------------------------------------------------------
    // Access Log Configuration
    // -------------------------------------------------------------------------
    /// Directory holding `{container file name}.csv` access logs
    pub log_dir: PathBuf,

    /// Append an access event after every successful fetch
    pub record_access: bool,

    // -------------------------------------------------------------------------
    // Prefetch Configuration
    // -------------------------------------------------------------------------
    /// Spawn the background idle task that services the prefetch queue
    pub idle_task: bool,

    /// Bytes copied per locked prefetch chunk
    pub prefetch_chunk_size: usize,

    /// Sleep between idle task polls (milliseconds)
    pub idle_backoff_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            container_path: PathBuf::from("./quark.bin"),
            staging_dir: None,
            log_dir: PathBuf::from("./logs"),
            record_access: true,
            idle_task: true,
            prefetch_chunk_size: 1024 * 1024, // 1 MiB
            idle_backoff_ms: 100,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Directory used for staging copies
    pub fn staging_dir(&self) -> PathBuf {
        match &self.staging_dir {
            Some(dir) => dir.clone(),
            None => match self.container_path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            },
        }
    }

    /// Path of the access log for this container: `{log_dir}/{file name}.csv`
    pub fn access_log_path(&self) -> PathBuf {
        let file_name = self
            .container_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "quark".to_string());
        self.log_dir.join(format!("{}.csv", file_name))
    }

    /// Idle task backoff as a Duration
    pub fn idle_backoff(&self) -> Duration {
        Duration::from_millis(self.idle_backoff_ms)
    }

    pub(crate) fn validate(&self) -> crate::Result<()> {
        if self.prefetch_chunk_size == 0 {
            return Err(crate::QuarkError::Config(
                "prefetch_chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.container_path.file_name().is_none() {
            return Err(crate::QuarkError::Config(format!(
                "container path {:?} has no file name",
                self.container_path
            )));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the container file path
    pub fn container_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config.container_path = path.as_ref().to_path_buf();
        self
    }

    /// Set the staging directory
    pub fn staging_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.config.staging_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the access log directory
    pub fn log_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.config.log_dir = path.as_ref().to_path_buf();
        self
    }

    /// Enable or disable access logging on fetch
    pub fn record_access(mut self, enabled: bool) -> Self {
        self.config.record_access = enabled;
        self
    }

    /// Enable or disable the background idle task
    pub fn idle_task(mut self, enabled: bool) -> Self {
        self.config.idle_task = enabled;
        self
    }

    /// Set the prefetch chunk size (in bytes)
    pub fn prefetch_chunk_size(mut self, size: usize) -> Self {
        self.config.prefetch_chunk_size = size;
        self
    }

    /// Set the idle task backoff (in milliseconds)
    pub fn idle_backoff_ms(mut self, ms: u64) -> Self {
        self.config.idle_backoff_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
