//! History reconstruction
//!
//! Rebuilds a conversation's causal history from stored turns: ordered
//! decoded messages, the original task (content of the first user message)
//! and the id of the latest turn. Pure read, idempotent, safe to call
//! concurrently.
//!
//! A turn whose content blob fails to decode is logged and skipped from the
//! message list; it still counts for `last_turn_id`, since parent linkage
//! is about stored turns, not decodable ones.

use tracing::warn;

use super::{ChatMessage, MessageRole, TurnStore};

/// Reconstructed view of one conversation
#[derive(Debug, Clone, PartialEq)]
pub struct ChatHistory {
    /// Decoded messages in ascending-id order
    pub messages: Vec<ChatMessage>,

    /// Content of the first user message, if any
    pub original_task: Option<String>,

    /// Id of the latest stored turn, if any
    pub last_turn_id: Option<i64>,
}

impl ChatHistory {
    /// An empty history, for conversations with no stored turns
    pub fn empty() -> Self {
        Self {
            messages: Vec::new(),
            original_task: None,
            last_turn_id: None,
        }
    }
}

/// Load and decode all turns of `conversation_id`
///
/// The store contract guarantees ascending-id ordering, so the last
/// returned turn is the latest one.
pub async fn reconstruct(
    store: &dyn TurnStore,
    conversation_id: &str,
) -> anyhow::Result<ChatHistory> {
    let turns = store.list_by_conversation(conversation_id).await?;

    let last_turn_id = turns.last().map(|turn| turn.id);

    let mut messages = Vec::with_capacity(turns.len());
    for turn in &turns {
        match turn.decode() {
            Ok(message) => messages.push(message),
            Err(err) => {
                warn!(
                    conversation_id,
                    turn_id = turn.id,
                    "skipping malformed turn: {}",
                    err
                );
            }
        }
    }

    let original_task = messages
        .iter()
        .find(|message| message.role == MessageRole::User)
        .map(|message| message.content.clone());

    Ok(ChatHistory {
        messages,
        original_task,
        last_turn_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{NewTurn, TurnRecord};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Vec-backed store for reconstruction tests
    struct FixedStore {
        turns: Mutex<Vec<TurnRecord>>,
    }

    impl FixedStore {
        fn new(turns: Vec<TurnRecord>) -> Self {
            Self {
                turns: Mutex::new(turns),
            }
        }
    }

    #[async_trait]
    impl TurnStore for FixedStore {
        async fn insert(&self, _turn: NewTurn) -> anyhow::Result<i64> {
            unimplemented!("reconstruction is read-only")
        }

        async fn list_by_conversation(
            &self,
            conversation_id: &str,
        ) -> anyhow::Result<Vec<TurnRecord>> {
            Ok(self
                .turns
                .lock()
                .unwrap()
                .iter()
                .filter(|t| t.conversation_id == conversation_id)
                .cloned()
                .collect())
        }

        async fn list_by_owner(&self, _owner_id: i64) -> anyhow::Result<Vec<TurnRecord>> {
            Ok(self.turns.lock().unwrap().clone())
        }
    }

    fn turn(id: i64, parent: Option<i64>, message: &ChatMessage) -> TurnRecord {
        TurnRecord {
            id,
            conversation_id: "conv-1".to_string(),
            role: message.role,
            content: message.encode(),
            parent_id: parent,
            owner_id: 1,
            owner_public_id: "pub-1".to_string(),
            title: None,
            created_at: 0,
        }
    }

    fn raw_turn(id: i64, parent: Option<i64>, content: &str) -> TurnRecord {
        TurnRecord {
            content: content.to_string(),
            ..turn(id, parent, &ChatMessage::user(""))
        }
    }

    #[tokio::test]
    async fn test_reconstruct_recovers_task_and_last_id() {
        let store = FixedStore::new(vec![
            turn(1, None, &ChatMessage::user("Launch a skincare brand")),
            turn(2, Some(1), &ChatMessage::assistant("Here is a narrative.")),
            turn(3, Some(2), &ChatMessage::user("Make it punchier")),
            turn(4, Some(3), &ChatMessage::assistant("Punchier narrative.")),
        ]);

        let history = reconstruct(&store, "conv-1").await.unwrap();

        assert_eq!(history.messages.len(), 4);
        assert_eq!(
            history.original_task.as_deref(),
            Some("Launch a skincare brand")
        );
        assert_eq!(history.last_turn_id, Some(4));
    }

    #[tokio::test]
    async fn test_reconstruct_empty_conversation() {
        let store = FixedStore::new(vec![]);

        let history = reconstruct(&store, "conv-1").await.unwrap();
        assert_eq!(history, ChatHistory::empty());
    }

    #[tokio::test]
    async fn test_malformed_turn_is_skipped_but_counts_for_last_id() {
        let store = FixedStore::new(vec![
            turn(1, None, &ChatMessage::user("task")),
            raw_turn(2, Some(1), "{{not json"),
            turn(3, Some(2), &ChatMessage::assistant("reply")),
            raw_turn(4, Some(3), "also broken"),
        ]);

        let history = reconstruct(&store, "conv-1").await.unwrap();

        assert_eq!(history.messages.len(), 2);
        assert_eq!(history.original_task.as_deref(), Some("task"));
        // The malformed tail turn still defines the parent for the next pair.
        assert_eq!(history.last_turn_id, Some(4));
    }

    #[tokio::test]
    async fn test_no_user_message_means_no_original_task() {
        let store = FixedStore::new(vec![turn(1, None, &ChatMessage::assistant("orphan reply"))]);

        let history = reconstruct(&store, "conv-1").await.unwrap();
        assert_eq!(history.original_task, None);
        assert_eq!(history.last_turn_id, Some(1));
    }

    #[tokio::test]
    async fn test_reconstruct_is_idempotent() {
        let store = FixedStore::new(vec![
            turn(1, None, &ChatMessage::user("task")),
            turn(2, Some(1), &ChatMessage::assistant("reply")),
        ]);

        let first = reconstruct(&store, "conv-1").await.unwrap();
        let second = reconstruct(&store, "conv-1").await.unwrap();
        assert_eq!(first, second);
    }
}
