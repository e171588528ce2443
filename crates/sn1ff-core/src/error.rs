//! Unified error types for sn1ff check reporting

use thiserror::Error;

use crate::Phase;

/// Unified error type for all sn1ff operations
#[derive(Error, Debug)]
pub enum Sn1ffError {
    // Collector errors
    #[error("{phase} failed: collector unavailable: {reason}")]
    CollectorUnavailable { phase: Phase, reason: String },

    #[error("{phase} failed: collector rejected ({}): {diagnostic}", describe_exit(.code))]
    CollectorRejected {
        phase: Phase,
        code: Option<i32>,
        diagnostic: String,
    },

    // Caller errors
    #[error("Invalid state: cannot {operation} while session is {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // Setup errors
    #[error("Configuration error: {0}")]
    Config(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {}", c),
        None => "terminated by signal".to_string(),
    }
}

impl Sn1ffError {
    /// Whether the same call may succeed if simply repeated
    pub fn is_retryable(&self) -> bool {
        matches!(self, Sn1ffError::CollectorUnavailable { .. })
    }

    /// Lifecycle phase a collector failure happened in
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Sn1ffError::CollectorUnavailable { phase, .. }
            | Sn1ffError::CollectorRejected { phase, .. } => Some(*phase),
            _ => None,
        }
    }

    /// Process exit code for a check that stops on this error
    ///
    /// A collector rejection propagates the collector's own code; everything
    /// else maps onto the sysexits(3) conventions.
    pub fn exit_code(&self) -> i32 {
        match self {
            Sn1ffError::CollectorRejected { code: Some(c), .. } if *c != 0 => *c,
            Sn1ffError::CollectorRejected { .. } => 1,
            Sn1ffError::CollectorUnavailable { .. } => 69,
            Sn1ffError::InvalidArgument(_) => 64,
            Sn1ffError::InvalidState { .. } => 70,
            Sn1ffError::Io(_) => 74,
            Sn1ffError::Config(_) => 78,
        }
    }
}

/// Result type alias using Sn1ffError
pub type Result<T> = std::result::Result<T, Sn1ffError>;
