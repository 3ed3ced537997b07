/// Account persistence operations
///
/// Minimal account repository backing the `AccountService` seam. The
/// conversation core only needs email lookup; `create` exists for bootstrap
/// and tests. Credit accounting and reset policy are handled upstream.
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::chat::{Account, AccountService};

/// Fields needed to create an account
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub public_id: String,
    pub email: String,
    pub name: String,
    pub profile_image: Option<String>,
    pub credits: i64,
}

/// Repository for account rows
pub struct AccountRepository {
    pool: SqlitePool,
}

impl AccountRepository {
    /// Create a new account repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert an account and return it with its assigned id
    pub async fn create(&self, account: &NewAccount) -> Result<Account> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as i64;

        let result = sqlx::query(
            r#"
            INSERT INTO accounts (public_id, email, name, profile_image, credits, last_credit_reset, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&account.public_id)
        .bind(&account.email)
        .bind(&account.name)
        .bind(&account.profile_image)
        .bind(account.credits)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create account")?;

        Ok(Account {
            id: result.last_insert_rowid(),
            public_id: account.public_id.clone(),
            email: account.email.clone(),
            name: account.name.clone(),
            profile_image: account.profile_image.clone(),
            credits: account.credits,
            last_credit_reset: now,
            created_at: now,
        })
    }

    /// Look up an account by email
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let row = sqlx::query(
            r#"
            SELECT id, public_id, email, name, profile_image, credits, last_credit_reset, created_at
            FROM accounts
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to look up account by email")?;

        Ok(row.map(|row| Account {
            id: row.get("id"),
            public_id: row.get("public_id"),
            email: row.get("email"),
            name: row.get("name"),
            profile_image: row.get("profile_image"),
            credits: row.get("credits"),
            last_credit_reset: row.get("last_credit_reset"),
            created_at: row.get("created_at"),
        }))
    }
}

#[async_trait]
impl AccountService for AccountRepository {
    async fn get_by_email(&self, email: &str) -> Result<Option<Account>> {
        self.find_by_email(email).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use tempfile::TempDir;

    async fn setup() -> (TempDir, AccountRepository) {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::new(&temp_dir.path().join("test.db")).await.unwrap();
        (temp_dir, AccountRepository::new(db.pool().clone()))
    }

    fn sample_account() -> NewAccount {
        NewAccount {
            public_id: "pub-1".to_string(),
            email: "owner@example.com".to_string(),
            name: "Owner".to_string(),
            profile_image: Some("https://example.com/avatar.png".to_string()),
            credits: 25,
        }
    }

    #[tokio::test]
    async fn test_create_and_find_by_email() {
        let (_tmp, repo) = setup().await;

        let created = repo.create(&sample_account()).await.unwrap();
        let found = repo
            .find_by_email("owner@example.com")
            .await
            .unwrap()
            .expect("account should exist");

        assert_eq!(found.id, created.id);
        assert_eq!(found.credits, 25);
        assert_eq!(
            found.profile_image.as_deref(),
            Some("https://example.com/avatar.png")
        );
    }

    #[tokio::test]
    async fn test_find_unknown_email_returns_none() {
        let (_tmp, repo) = setup().await;
        assert!(repo.find_by_email("ghost@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let (_tmp, repo) = setup().await;

        repo.create(&sample_account()).await.unwrap();
        assert!(repo.create(&sample_account()).await.is_err());
    }
}
