/// Turn persistence operations
///
/// SQLite-backed implementation of the `TurnStore` contract. All queries are
/// parameterized, and both listing queries order by ascending id explicitly:
/// parent resolution and history reconstruction depend on that contract, not
/// on physical row order.
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::chat::{MessageRole, NewTurn, TurnRecord, TurnStore};

/// Repository for conversation turns
pub struct TurnRepository {
    pool: SqlitePool,
}

impl TurnRepository {
    /// Create a new turn repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a turn and return the store-assigned id
    ///
    /// The returned id is immediately visible to subsequent reads on the
    /// same pool, which the orchestrator relies on when linking the
    /// assistant turn to the user turn it answers.
    pub async fn insert_turn(&self, turn: &NewTurn) -> Result<i64> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as i64;

        let result = sqlx::query(
            r#"
            INSERT INTO turns
                (conversation_id, role, content, parent_id, owner_id, owner_public_id, title, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&turn.conversation_id)
        .bind(turn.message.role.to_string())
        .bind(turn.message.encode())
        .bind(turn.parent_id)
        .bind(turn.owner_id)
        .bind(&turn.owner_public_id)
        .bind(&turn.title)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to insert turn")?;

        Ok(result.last_insert_rowid())
    }

    /// All turns of one conversation, ascending by id
    pub async fn turns_for_conversation(&self, conversation_id: &str) -> Result<Vec<TurnRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, conversation_id, role, content, parent_id,
                   owner_id, owner_public_id, title, created_at
            FROM turns
            WHERE conversation_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list turns for conversation")?;

        rows.iter().map(row_to_record).collect()
    }

    /// All turns owned by one account, ascending by id
    pub async fn turns_for_owner(&self, owner_id: i64) -> Result<Vec<TurnRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, conversation_id, role, content, parent_id,
                   owner_id, owner_public_id, title, created_at
            FROM turns
            WHERE owner_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list turns for owner")?;

        rows.iter().map(row_to_record).collect()
    }
}

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<TurnRecord> {
    let role: String = row.get("role");
    let role = match role.as_str() {
        "user" => MessageRole::User,
        "assistant" => MessageRole::Assistant,
        other => bail!("unknown turn role in storage: {}", other),
    };

    Ok(TurnRecord {
        id: row.get("id"),
        conversation_id: row.get("conversation_id"),
        role,
        content: row.get("content"),
        parent_id: row.get("parent_id"),
        owner_id: row.get("owner_id"),
        owner_public_id: row.get("owner_public_id"),
        title: row.get("title"),
        created_at: row.get("created_at"),
    })
}

#[async_trait]
impl TurnStore for TurnRepository {
    async fn insert(&self, turn: NewTurn) -> Result<i64> {
        self.insert_turn(&turn).await
    }

    async fn list_by_conversation(&self, conversation_id: &str) -> Result<Vec<TurnRecord>> {
        self.turns_for_conversation(conversation_id).await
    }

    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<TurnRecord>> {
        self.turns_for_owner(owner_id).await
    }
}
