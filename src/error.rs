//! Unified error types for the recognizer.
//!
//! One `Copy` enum per failure class so errors travel through timer
//! callbacks and the registry without allocation; everything funnels into
//! [`ButtonError`] at the public API boundary.

use core::fmt;

use crate::ports::PlatformError;

/// Every fallible public operation returns this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonError {
    /// Bad pin, malformed config, or an unknown handle on delete.
    InvalidArg(&'static str),
    /// The platform ran out of timers or interrupt slots.
    Exhausted(&'static str),
    /// A GPIO or timer-service call returned non-OK.
    Platform(PlatformError),
}

impl fmt::Display for ButtonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArg(msg) => write!(f, "invalid argument: {msg}"),
            Self::Exhausted(msg) => write!(f, "resource exhausted: {msg}"),
            Self::Platform(e) => write!(f, "platform: {e}"),
        }
    }
}

impl From<PlatformError> for ButtonError {
    fn from(e: PlatformError) -> Self {
        match e {
            PlatformError::TimerCreateFailed => Self::Exhausted("timer pool"),
            PlatformError::IsrAddFailed(_) => Self::Exhausted("interrupt slot"),
            other => Self::Platform(other),
        }
    }
}

impl std::error::Error for ButtonError {}

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, ButtonError>;
