//! Brandloom Engine Library
//!
//! This library provides the core functionality of the Brandloom
//! brand-narrative service: conversation threading, prompt composition,
//! turn persistence and the generation-provider seam. It is used by both
//! the main binary and integration tests.

/// Configuration management module
pub mod config;

/// Error types and handling
pub mod error;

/// Database persistence module
pub mod db;

/// Conversation threading and prompt composition
pub mod chat;

/// Generation provider abstraction layer
pub mod llm;

/// HTTP API surface
pub mod api;

/// Telemetry and Observability
pub mod telemetry;
