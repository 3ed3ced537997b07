//! Generation provider abstraction
//!
//! The orchestrator treats text generation as a single opaque call: prompt
//! string in, generated narrative out. The trait seam keeps providers
//! swappable and lets orchestration tests script responses. No retries or
//! caching live at this layer; callers needing backoff wrap the provider.

use async_trait::async_trait;

pub mod groq;

pub use groq::GroqProvider;

/// Result type for generation operations
pub type Result<T> = std::result::Result<T, GenerationError>;

/// Errors that can occur during a generation call
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Contract all generation providers implement
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Provider name, for logging
    fn name(&self) -> &str;

    /// Generate narrative text for a composed prompt
    ///
    /// Invoked at most once per request; failures surface to the caller
    /// before anything is persisted.
    async fn generate(&self, prompt: &str) -> Result<String>;
}
