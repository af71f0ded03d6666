//! Error types for the scheduler module

use std::fmt;

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Scheduler-specific errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// Invalid hour value (must be 0-23)
    InvalidHour {
        hour: u32,
    },

    /// Do-not-disturb range could not be parsed
    InvalidWindow {
        value: String,
        reason: String,
    },

    /// Invalid timezone
    InvalidTimezone {
        tz: String,
    },
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidHour { hour } => {
                write!(f, "Invalid hour '{}'. Must be 0-23", hour)
            }
            Self::InvalidWindow { value, reason } => {
                write!(f, "Invalid do-not-disturb range '{}': {}", value, reason)
            }
            Self::InvalidTimezone { tz } => {
                write!(f, "Invalid timezone: {}", tz)
            }
        }
    }
}

impl std::error::Error for SchedulerError {}

impl SchedulerError {
    /// Create an invalid hour error
    pub fn invalid_hour(hour: u32) -> Self {
        Self::InvalidHour { hour }
    }

    /// Create an invalid window error
    pub fn invalid_window(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidWindow {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid timezone error
    pub fn invalid_timezone(tz: impl Into<String>) -> Self {
        Self::InvalidTimezone { tz: tz.into() }
    }
}
