//! Unified error handling for the herald crate
//!
//! This module provides a unified error type that consolidates all domain-specific
//! errors into a single `Error` enum, while maintaining the ability to use
//! domain-specific errors when needed.
//!
//! # Architecture
//!
//! - [`HeraldErrorTrait`] - Common interface implemented by all error types
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors
//!
//! # Usage
//!
//! ```rust,ignore
//! use herald::error::{Error, ErrorCategory, HeraldErrorTrait};
//!
//! fn handle_error(err: Error) {
//!     if err.is_recoverable() {
//!         tracing::warn!(category = %err.category(), "Will retry next tick: {err}");
//!     } else {
//!         tracing::error!("Fatal error: {err}");
//!     }
//! }
//! ```

use std::fmt;
use std::io;
use thiserror::Error;

// Re-export domain-specific errors for convenience
pub use crate::notifications::channels::ChannelError;
pub use crate::scheduler::error::SchedulerError;
pub use crate::storage::StorageError;
pub use crate::utils::error::{FetchError, ParseError};

/// Common trait for all herald error types
///
/// This trait provides a unified interface for error handling across
/// all modules, enabling consistent error processing strategies.
pub trait HeraldErrorTrait: std::error::Error {
    /// Check if this error is recoverable (the next tick may succeed)
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network-related errors (HTTP, timeout, upstream status)
    Network,
    /// Credentials rejected or login given up
    Auth,
    /// Parsing and data extraction errors
    Parsing,
    /// Storage and I/O errors
    Storage,
    /// Messaging platform delivery errors
    Messaging,
    /// Configuration and validation errors
    Config,
    /// Scheduler and timing errors
    Scheduler,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Auth => "auth",
            Self::Parsing => "parsing",
            Self::Storage => "storage",
            Self::Messaging => "messaging",
            Self::Config => "config",
            Self::Scheduler => "scheduler",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unified error type for the herald crate
///
/// This enum wraps all domain-specific errors, providing a single error type
/// that can be used across module boundaries while preserving the detailed
/// error information.
#[derive(Error, Debug)]
pub enum Error {
    /// Upstream fetch errors
    #[error("Fetch error: {0}")]
    Fetch(FetchError),

    /// Parse-specific errors
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Login to an upstream platform was given up
    #[error("Authentication exhausted after {attempts} attempts: {reason}")]
    AuthExhausted { attempts: u32, reason: String },

    /// Persisted state errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Messaging platform errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Scheduler and timing errors
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl HeraldErrorTrait for FetchError {
    fn is_recoverable(&self) -> bool {
        FetchError::is_recoverable(self)
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Unauthorized(_) | Self::AuthExhausted { .. } => ErrorCategory::Auth,
            Self::Parse(_) => ErrorCategory::Parsing,
            Self::Http(_) | Self::ServerError(_) | Self::Timeout | Self::Empty(_) => {
                ErrorCategory::Network
            }
        }
    }
}

impl HeraldErrorTrait for ParseError {
    fn is_recoverable(&self) -> bool {
        // Upstream may serve a well-formed payload next time
        true
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Parsing
    }
}

impl HeraldErrorTrait for StorageError {
    fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Corrupt(_))
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Storage
    }
}

impl HeraldErrorTrait for ChannelError {
    fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InvalidConfig(_))
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Messaging
    }
}

impl HeraldErrorTrait for SchedulerError {
    fn is_recoverable(&self) -> bool {
        false
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Scheduler
    }
}

impl HeraldErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Fetch(e) => HeraldErrorTrait::is_recoverable(e),
            Self::Parse(e) => e.is_recoverable(),
            Self::AuthExhausted { .. } => false,
            Self::Storage(e) => e.is_recoverable(),
            Self::Channel(e) => e.is_recoverable(),
            Self::Scheduler(e) => e.is_recoverable(),
            Self::Config(_) => false,
            Self::Io(_) => true, // I/O errors are often transient
            Self::Json(_) => false,
            Self::Other { .. } => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Fetch(e) => e.category(),
            Self::Parse(_) | Self::Json(_) => ErrorCategory::Parsing,
            Self::AuthExhausted { .. } => ErrorCategory::Auth,
            Self::Storage(_) | Self::Io(_) => ErrorCategory::Storage,
            Self::Channel(_) => ErrorCategory::Messaging,
            Self::Scheduler(_) => ErrorCategory::Scheduler,
            Self::Config(_) => ErrorCategory::Config,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }

    /// Create a generic error with context and source
    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Whether this error should stop the process
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::AuthExhausted { .. } | Self::Config(_))
    }
}

// Login exhaustion is lifted to its own variant
impl From<FetchError> for Error {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::AuthExhausted { attempts, reason } => Self::AuthExhausted { attempts, reason },
            other => Self::Fetch(other),
        }
    }
}

// Conversion from rusqlite::Error
impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(StorageError::Database(err))
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
