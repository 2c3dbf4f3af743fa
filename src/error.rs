//! Error types used by the coordinator, termination sources, and hooks.
//!
//! This module defines the error enums of the crate:
//!
//! - [`CoordinatorError`] usage and setup errors returned by the [`Coordinator`](crate::Coordinator).
//! - [`SourceError`] failures arming or releasing a termination-event source.
//! - [`HookError`] errors returned by individual shutdown hooks.
//! - [`RemoteError`] failures of the out-of-process shutdown sender.
//! - [`ConfigError`] configuration loading and validation failures.
//!
//! Each type provides an `as_label` helper returning a stable snake_case label for logs.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// # Errors produced by the shutdown coordinator.
///
/// These are configuration/usage errors: they are fatal to the call that
/// produced them, never to the process.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CoordinatorError {
    /// `start()` was called on a coordinator that is already started.
    #[error("coordinator already started")]
    AlreadyStarted,

    /// A hook was registered with an empty name.
    #[error("hook name must not be empty")]
    EmptyHookName,

    /// A hook was registered with a zero timeout.
    #[error("hook '{name}' must have a positive timeout")]
    ZeroTimeout {
        /// Name of the rejected hook.
        name: String,
    },

    /// A hook with the same name is already registered.
    #[error("hook with name '{name}' already registered")]
    DuplicateHook {
        /// The duplicated name.
        name: String,
    },

    /// The termination-event source could not be armed.
    #[error("termination source failed: {0}")]
    Source(#[from] SourceError),

    /// The coordinator's options failed validation at `start()`.
    #[error("invalid options: {0}")]
    InvalidOptions(#[from] ConfigError),
}

impl CoordinatorError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use terminator::CoordinatorError;
    ///
    /// let err = CoordinatorError::DuplicateHook { name: "db".into() };
    /// assert_eq!(err.as_label(), "coordinator_duplicate_hook");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            CoordinatorError::AlreadyStarted => "coordinator_already_started",
            CoordinatorError::EmptyHookName => "coordinator_empty_hook_name",
            CoordinatorError::ZeroTimeout { .. } => "coordinator_zero_timeout",
            CoordinatorError::DuplicateHook { .. } => "coordinator_duplicate_hook",
            CoordinatorError::Source(_) => "coordinator_source_failed",
            CoordinatorError::InvalidOptions(_) => "coordinator_invalid_options",
        }
    }
}

/// # Errors produced by termination-event sources.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SourceError {
    /// `start()` was called twice on the same source.
    #[error("termination source already started")]
    AlreadyStarted,

    /// Subscribing to OS signals failed.
    #[error("failed to subscribe to termination signals: {0}")]
    Signal(#[source] io::Error),

    /// The remote-trigger endpoint could not be created.
    #[error("failed to create remote endpoint '{endpoint}': {source}")]
    Endpoint {
        /// Endpoint address.
        endpoint: String,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Another live process already serves the endpoint.
    #[error("remote endpoint '{endpoint}' is served by another process")]
    EndpointInUse {
        /// Endpoint address.
        endpoint: String,
    },

    /// Releasing the endpoint failed.
    #[error("failed to release remote endpoint '{endpoint}': {source}")]
    Cleanup {
        /// Endpoint address.
        endpoint: String,
        /// Underlying I/O error.
        source: io::Error,
    },
}

impl SourceError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            SourceError::AlreadyStarted => "source_already_started",
            SourceError::Signal(_) => "source_signal",
            SourceError::Endpoint { .. } => "source_endpoint",
            SourceError::EndpointInUse { .. } => "source_endpoint_in_use",
            SourceError::Cleanup { .. } => "source_cleanup",
        }
    }
}

/// # Errors returned by shutdown hooks.
///
/// Hook errors are recorded and reported per hook; they never propagate to
/// the caller of [`Coordinator::wait`](crate::Coordinator::wait).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum HookError {
    /// Cleanup failed.
    #[error("cleanup failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The hook gave up because its deadline expired.
    #[error("deadline exceeded after {deadline:?}")]
    DeadlineExceeded {
        /// Time budget the hook was given.
        deadline: Duration,
    },

    /// The hook observed cancellation and stopped early.
    #[error("hook cancelled")]
    Canceled,
}

impl HookError {
    /// Creates a [`HookError::Fail`] from any displayable error.
    ///
    /// # Example
    /// ```
    /// use terminator::HookError;
    ///
    /// let err = HookError::fail("pool still busy");
    /// assert_eq!(err.to_string(), "cleanup failed: pool still busy");
    /// ```
    pub fn fail(error: impl std::fmt::Display) -> Self {
        HookError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            HookError::Fail { .. } => "hook_failed",
            HookError::DeadlineExceeded { .. } => "hook_deadline_exceeded",
            HookError::Canceled => "hook_canceled",
        }
    }
}

impl From<io::Error> for HookError {
    fn from(err: io::Error) -> Self {
        HookError::fail(err)
    }
}

/// # Errors produced when sending a remote shutdown command.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RemoteError {
    /// The endpoint did not accept the connection in time.
    #[error("timed out after {timeout:?} connecting to '{endpoint}'")]
    ConnectTimeout {
        /// Endpoint address.
        endpoint: String,
        /// Connection bound.
        timeout: Duration,
    },

    /// Connecting to the endpoint failed.
    #[error("failed to connect to '{endpoint}': {source}")]
    Connect {
        /// Endpoint address.
        endpoint: String,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Writing the command frame failed.
    #[error("failed to send shutdown command to '{endpoint}': {source}")]
    Send {
        /// Endpoint address.
        endpoint: String,
        /// Underlying I/O error.
        source: io::Error,
    },
}

impl RemoteError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            RemoteError::ConnectTimeout { .. } => "remote_connect_timeout",
            RemoteError::Connect { .. } => "remote_connect",
            RemoteError::Send { .. } => "remote_send",
        }
    }
}

/// # Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File I/O error when loading options.
    #[error("failed to read config file '{path}': {source}")]
    FileRead {
        /// Path of the file.
        path: String,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse config '{path}': {source}")]
    Parse {
        /// Path or name of the source.
        path: String,
        /// Underlying parse error.
        source: toml::de::Error,
    },

    /// Validation failed with one or more errors.
    #[error("config validation failed:\n{}", .0.join("\n"))]
    ValidationFailed(Vec<String>),
}
