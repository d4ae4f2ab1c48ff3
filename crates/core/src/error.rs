//! Error types returned by the invocation pipeline.
//!
//! A non-zero exit code is never an error: it is reported through
//! [`InvocationResult::code`](crate::InvocationResult). Everything here is a
//! failure to get a process started (or to finish it in time).

use std::io;
use std::time::Duration;

use polyshell_common::Platform;
use thiserror::Error;

pub type ShellResult<T> = Result<T, ShellError>;

/// Coarse classification used by callers that branch on the failure mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The call itself was invalid (unknown interpreter).
    InvalidOperation,
    /// No executable could be located.
    NotFound,
    /// The interpreter cannot exist on this platform.
    PlatformNotSupported,
    /// Filesystem or process-spawn failure.
    Io,
    /// The process exceeded its deadline and was killed.
    Timeout,
    /// Invalid profile configuration.
    Config,
}

#[derive(Debug, Error)]
pub enum ShellError {
    /// Lookup miss. Raised before any filesystem or process work.
    #[error("interpreter '{name}' is not registered")]
    NotRegistered { name: String },

    /// Every candidate path and the PATH search came up empty.
    #[error("executable for '{name}' not found on path (searched: {})", searched.join(", "))]
    NotFoundOnPath { name: String, searched: Vec<String> },

    #[error("interpreter '{name}' is not supported on {platform}")]
    UnsupportedPlatform { name: String, platform: Platform },

    #[error("failed to materialize script for '{name}': {source}")]
    Materialize {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to launch '{name}': {source}")]
    Launch {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("'{name}' timed out after {timeout:?}")]
    TimedOut { name: String, timeout: Duration },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ShellError {
    pub fn not_registered(name: impl Into<String>) -> Self {
        ShellError::NotRegistered { name: name.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ShellError::NotRegistered { .. } => ErrorKind::InvalidOperation,
            ShellError::NotFoundOnPath { .. } => ErrorKind::NotFound,
            ShellError::UnsupportedPlatform { .. } => ErrorKind::PlatformNotSupported,
            ShellError::Materialize { .. } | ShellError::Launch { .. } => ErrorKind::Io,
            ShellError::TimedOut { .. } => ErrorKind::Timeout,
            ShellError::Config(_) => ErrorKind::Config,
        }
    }

    /// Interpreter the failure relates to, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            ShellError::NotRegistered { name }
            | ShellError::NotFoundOnPath { name, .. }
            | ShellError::UnsupportedPlatform { name, .. }
            | ShellError::Materialize { name, .. }
            | ShellError::Launch { name, .. }
            | ShellError::TimedOut { name, .. } => Some(name),
            ShellError::Config(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}
