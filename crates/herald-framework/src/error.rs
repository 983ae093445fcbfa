//! Error types for the Herald framework.

use herald_core::ApiError;
use thiserror::Error;

/// A boxed, thread-safe error returned by checks and handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced while building or running commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// A command was built without a handler.
    #[error("command has no handler")]
    MissingHandler,

    /// Neither the supplied name nor the handler's own name is usable.
    #[error("invalid command name '{name}': names must be non-empty and contain no spaces")]
    InvalidName {
        /// The rejected name.
        name: String,
    },

    /// The dispatcher prefix is empty or contains a space.
    #[error("invalid prefix '{prefix}': prefixes must be non-empty and contain no spaces")]
    InvalidPrefix {
        /// The rejected prefix.
        prefix: String,
    },

    /// A check returned an error instead of `true`/`false`.
    ///
    /// `command` is `None` for global checks.
    #[error("check failed{}: {source}", command_suffix(.command))]
    Check {
        /// The command whose check failed.
        command: Option<String>,
        /// The error raised by the check.
        source: BoxError,
    },

    /// A handler returned an error.
    #[error("command '{command}' failed: {source}")]
    Handler {
        /// The command that failed.
        command: String,
        /// The error returned by the handler.
        source: BoxError,
    },

    /// A handler panicked.
    #[error("command '{command}' panicked: {message}")]
    Panicked {
        /// The command that panicked.
        command: String,
        /// The panic payload, when it was a string.
        message: String,
    },

    /// The author lacks permission to run a command.
    #[error("permission denied: {reason}")]
    PermissionDenied {
        /// Why permission was denied.
        reason: String,
    },

    /// A positional argument is missing or malformed.
    #[error("argument {index}: {reason}")]
    Argument {
        /// Zero-based argument position.
        index: usize,
        /// What is wrong with it.
        reason: String,
    },

    /// Sending a reply failed.
    #[error(transparent)]
    Reply(#[from] ApiError),
}

fn command_suffix(command: &Option<String>) -> String {
    match command {
        Some(name) => format!(" for command '{name}'"),
        None => String::new(),
    }
}

impl CommandError {
    /// Creates a permission error.
    pub fn permission_denied(reason: impl Into<String>) -> Self {
        Self::PermissionDenied {
            reason: reason.into(),
        }
    }

    /// Creates an argument error.
    pub fn argument(index: usize, reason: impl Into<String>) -> Self {
        Self::Argument {
            index,
            reason: reason.into(),
        }
    }

    /// Returns the name of the command the error is attributed to, if any.
    pub fn command(&self) -> Option<&str> {
        match self {
            Self::Check { command, .. } => command.as_deref(),
            Self::Handler { command, .. } | Self::Panicked { command, .. } => Some(command),
            _ => None,
        }
    }

    /// Returns the error raised by user code (a check or a handler), if any.
    pub fn user_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Self::Check { source, .. } | Self::Handler { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Result type for command operations.
pub type CommandResult<T> = Result<T, CommandError>;
