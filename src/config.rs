//! # Coordinator configuration.
//!
//! Provides [`Options`], the immutable settings of a [`Coordinator`](crate::Coordinator).
//!
//! Options come from two places:
//! 1. **Code**: `Options::default()` and field updates.
//! 2. **Files**: [`Options::load`] / [`Options::from_toml_str`], which apply
//!    defaults for missing keys, reject unknown keys, and validate every value.
//!
//! ## File format
//! ```toml
//! grace_period_ms = 30000
//! force_timeout_ms = 5000
//! bus_capacity = 1024
//! remote_endpoint = "/run/myapp/shutdown.sock"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::source::Endpoint;

/// Settings for the shutdown coordinator.
///
/// ## Field semantics
/// - `grace_period`: total wall-clock budget for running all hooks, measured from the trigger
/// - `force_timeout`: reserved; see below
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by the bus)
/// - `remote_endpoint`: when set, the remote-command source listens on it (any platform)
///
/// ## `force_timeout`
/// Intended as the budget between the end of the grace period and a forced
/// process exit. The coordinator never waits past the grace period, so it does
/// not consult this value; it is carried for hosts that implement a forced
/// exit themselves.
#[derive(Clone, Debug)]
pub struct Options {
    /// Total budget for hook execution.
    pub grace_period: Duration,

    /// Reserved post-grace budget before forced exit. Not consulted by the coordinator.
    pub force_timeout: Duration,

    /// Capacity of the event bus broadcast channel.
    pub bus_capacity: usize,

    /// Endpoint for the remote shutdown command.
    ///
    /// `None` selects the platform default source: signals only on Unix,
    /// signals plus the default named pipe on Windows.
    pub remote_endpoint: Option<Endpoint>,
}

impl Options {
    /// Loads and validates options from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path_str.clone(),
            source: e,
        })?;
        Self::from_toml_str(&content, &path_str)
    }

    /// Parses and validates options from a TOML string.
    ///
    /// `source_name` is only used in error messages.
    pub fn from_toml_str(content: &str, source_name: &str) -> Result<Self, ConfigError> {
        let file: OptionsFile = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: source_name.to_string(),
            source: e,
        })?;
        file.validate()?;
        Ok(file.into())
    }

    /// Returns the grace period with a builder-style update.
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Sets the remote endpoint with a builder-style update.
    pub fn with_remote_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.remote_endpoint = Some(endpoint);
        self
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Checks the values for contract violations, collecting every error.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();
        if self.grace_period.is_zero() {
            errors.push("grace_period must be positive".to_string());
        }
        if self.force_timeout.is_zero() {
            errors.push("force_timeout must be positive".to_string());
        }
        if self.bus_capacity == 0 {
            errors.push("bus_capacity must be at least 1".to_string());
        }
        if let Some(endpoint) = &self.remote_endpoint {
            if endpoint.as_str().is_empty() {
                errors.push("remote_endpoint must not be empty".to_string());
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::ValidationFailed(errors))
        }
    }
}

impl Default for Options {
    /// Default configuration:
    ///
    /// - `grace_period = 30s`
    /// - `force_timeout = 5s`
    /// - `bus_capacity = 1024`
    /// - `remote_endpoint = None`
    fn default() -> Self {
        Self {
            grace_period: Duration::from_millis(OptionsFile::default_grace_period_ms()),
            force_timeout: Duration::from_millis(OptionsFile::default_force_timeout_ms()),
            bus_capacity: OptionsFile::default_bus_capacity(),
            remote_endpoint: None,
        }
    }
}

/// On-disk representation of [`Options`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct OptionsFile {
    #[serde(default = "OptionsFile::default_grace_period_ms")]
    grace_period_ms: u64,

    #[serde(default = "OptionsFile::default_force_timeout_ms")]
    force_timeout_ms: u64,

    #[serde(default = "OptionsFile::default_bus_capacity")]
    bus_capacity: usize,

    #[serde(default)]
    remote_endpoint: Option<String>,
}

impl OptionsFile {
    const fn default_grace_period_ms() -> u64 {
        30_000
    }

    const fn default_force_timeout_ms() -> u64 {
        5_000
    }

    const fn default_bus_capacity() -> usize {
        1024
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();
        if self.grace_period_ms == 0 {
            errors.push("grace_period_ms must be positive".to_string());
        }
        if self.force_timeout_ms == 0 {
            errors.push("force_timeout_ms must be positive".to_string());
        }
        if self.bus_capacity == 0 {
            errors.push("bus_capacity must be at least 1".to_string());
        }
        if matches!(self.remote_endpoint.as_deref(), Some("")) {
            errors.push("remote_endpoint must not be empty".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::ValidationFailed(errors))
        }
    }
}

impl From<OptionsFile> for Options {
    fn from(file: OptionsFile) -> Self {
        Self {
            grace_period: Duration::from_millis(file.grace_period_ms),
            force_timeout: Duration::from_millis(file.force_timeout_ms),
            bus_capacity: file.bus_capacity,
            remote_endpoint: file.remote_endpoint.map(Endpoint::new),
        }
    }
}
