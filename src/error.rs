use crate::failure::{Failure, FailureKind};

/// Kind of every failure the guard machinery raises on its own behalf
pub static GUARD_CONFIGURATION: FailureKind = FailureKind::root("GuardConfigurationError");

/// Kind raised when a captured call argument is missing or has the wrong shape
pub static INVALID_ARGUMENT: FailureKind = FailureKind::root("InvalidArgumentError");

/// Errors raised by the guard itself rather than by the protected operation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuardError {
    /// The guard was invoked without a protected operation
    #[error("Guard '{guard}' has no protected operation configured")]
    MissingOperation { guard: String },

    /// `Guard::call` was used but no arguments were bound at build time
    #[error("Guard '{guard}' has no bound arguments to call with")]
    MissingArguments { guard: String },

    /// A call argument could not be read as the requested type
    #[error("Invalid argument {argument}: {reason}")]
    InvalidArgument { argument: String, reason: String },

    /// Invalid configuration value or source
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl Failure for GuardError {
    fn kind(&self) -> &'static FailureKind {
        match self {
            Self::InvalidArgument { .. } => &INVALID_ARGUMENT,
            _ => &GUARD_CONFIGURATION,
        }
    }
}

pub type Result<T> = std::result::Result<T, GuardError>;
