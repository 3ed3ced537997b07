//! Conversation domain types
//!
//! This module defines the turn and message types shared by the history
//! reconstructor, the prompt composer and the orchestrator, plus the
//! collaborator traits the orchestrator consumes (`TurnStore`,
//! `AccountService`). The traits exist so orchestration logic can be tested
//! against fakes and so persistence stays an explicitly passed collaborator
//! rather than a module-level singleton.
//!
//! A turn's content is stored as a JSON blob `{"role": ..., "content": ...}`.
//! Decoding is an explicit step that can fail per record; a failed decode is
//! a [`MalformedTurn`] and never aborts work on the surrounding turns.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod history;
pub mod orchestrator;
pub mod prompt;

pub use history::{reconstruct, ChatHistory};
pub use orchestrator::{
    ContinuationOutcome, ConversationSummary, Identity, NarrativeOutcome, NarrativeRequest,
    Orchestrator,
};
pub use prompt::{compose, extract_title, NarrativeBrief, NarrativeLength};

/// Role of a message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// End-user message (instruction or composed brief)
    User,

    /// Generated narrative reply
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// One decoded message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    /// Role of the message sender
    pub role: MessageRole,

    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }

    /// Encode this message into the stored JSON blob form
    pub fn encode(&self) -> String {
        // ChatMessage contains only strings; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// A stored turn failed to decode into a [`ChatMessage`]
#[derive(Debug, thiserror::Error)]
#[error("malformed turn {turn_id}: {source}")]
pub struct MalformedTurn {
    /// Store-assigned id of the offending turn
    pub turn_id: i64,

    /// Underlying JSON decode failure
    #[source]
    pub source: serde_json::Error,
}

/// One persisted turn, as returned by the turn store
#[derive(Debug, Clone, PartialEq)]
pub struct TurnRecord {
    /// Store-assigned id, strictly increasing within a conversation
    pub id: i64,

    /// Opaque identifier grouping all turns of one thread
    pub conversation_id: String,

    /// Denormalized role column (the blob also carries the role)
    pub role: MessageRole,

    /// Raw JSON content blob
    pub content: String,

    /// Id of the causal parent turn; `None` for the thread root
    pub parent_id: Option<i64>,

    /// Owning account id
    pub owner_id: i64,

    /// Owning account public id
    pub owner_public_id: String,

    /// Short label, present only on the first pair of a conversation
    pub title: Option<String>,

    /// Unix timestamp (seconds)
    pub created_at: i64,
}

impl TurnRecord {
    /// Decode the content blob into a structured message
    pub fn decode(&self) -> Result<ChatMessage, MalformedTurn> {
        serde_json::from_str(&self.content).map_err(|source| MalformedTurn {
            turn_id: self.id,
            source,
        })
    }
}

/// A turn to be inserted; the store assigns the id
#[derive(Debug, Clone)]
pub struct NewTurn {
    pub conversation_id: String,
    pub message: ChatMessage,
    pub parent_id: Option<i64>,
    pub owner_id: i64,
    pub owner_public_id: String,
    pub title: Option<String>,
}

/// An account row, as seen by the conversation core
#[derive(Debug, Clone)]
pub struct Account {
    pub id: i64,
    pub public_id: String,
    pub email: String,
    pub name: String,
    pub profile_image: Option<String>,
    pub credits: i64,
    pub last_credit_reset: i64,
    pub created_at: i64,
}

/// The public slice of an account returned with generation responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountSnapshot {
    pub public_id: String,
    pub email: String,
    pub name: String,
    pub profile_image: Option<String>,
    pub credits: i64,
    pub last_credit_reset: i64,
}

impl From<&Account> for AccountSnapshot {
    fn from(account: &Account) -> Self {
        Self {
            public_id: account.public_id.clone(),
            email: account.email.clone(),
            name: account.name.clone(),
            profile_image: account.profile_image.clone(),
            credits: account.credits,
            last_credit_reset: account.last_credit_reset,
        }
    }
}

/// Append-only store of conversation turns
///
/// Contract: ids are assigned by the store, strictly increasing within a
/// conversation, and an inserted id is immediately visible to the next read
/// from the same flow (the assistant turn links to the user turn's fresh
/// id). `list_by_conversation` MUST return turns in ascending-id order; the
/// reconstructor relies on that, not on physical row order.
#[async_trait]
pub trait TurnStore: Send + Sync {
    /// Insert a turn and return its assigned id
    async fn insert(&self, turn: NewTurn) -> anyhow::Result<i64>;

    /// All turns of one conversation, ascending by id
    async fn list_by_conversation(&self, conversation_id: &str) -> anyhow::Result<Vec<TurnRecord>>;

    /// All turns owned by one account, ascending by id
    async fn list_by_owner(&self, owner_id: i64) -> anyhow::Result<Vec<TurnRecord>>;
}

/// Account lookup, as required by the conversation core
///
/// Credit accounting and reset policy live behind this seam and are not
/// part of the conversation core.
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Look up an account by email; `None` when absent
    async fn get_by_email(&self, email: &str) -> anyhow::Result<Option<Account>>;
}
