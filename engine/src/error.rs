//! Error types and handling
//!
//! This module provides the error types used throughout the Brandloom engine.
//! Each variant carries a user-facing hint and a recoverability flag so the
//! API layer can answer callers without leaking internal detail.
//!
//! # Propagation policy
//!
//! Validation, not-found and no-history failures are detected before any
//! write and short-circuit cleanly. Generation failures occur after
//! validation but before persistence, so they are also side-effect free.
//! Database failures after a successful generation may leave a conversation
//! ending on a user turn; that is surfaced as `Internal` and logged with
//! full detail server-side.

use thiserror::Error;

/// Main engine error type
///
/// Every failure the conversation core can produce maps to one of these
/// variants. Messages are safe to display to end users: no API keys, no
/// file paths, no raw SQL.
#[derive(Debug, Error)]
pub enum EngineError {
    // Request errors
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No usable history: could not recover the original task from this conversation")]
    NoHistory,

    // Generation provider errors
    #[error("Generation failed: {0}")]
    Generation(String),

    // Persistence errors
    #[error("Database error: {0}")]
    Database(String),

    // Everything else
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Returns a user-friendly hint for the error
    ///
    /// Safe to display to end users; contains no secrets or internal paths.
    pub fn user_hint(&self) -> &str {
        match self {
            Self::Validation(_) => "Check the request fields and try again",
            Self::NotFound(_) => "The requested account or conversation does not exist",
            Self::NoHistory => "Start a new narrative before sending follow-up instructions",
            Self::Generation(_) => "The narrative provider is unavailable. Try again shortly",
            Self::Database(_) => "Storage operation failed. Try again shortly",
            Self::Internal(_) => "Internal server error",
        }
    }

    /// Returns whether the error is recoverable by retrying or amending
    /// the request.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Validation(_) | Self::NotFound(_) | Self::NoHistory => true,
            Self::Generation(_) => true,
            Self::Database(_) | Self::Internal(_) => false,
        }
    }
}
