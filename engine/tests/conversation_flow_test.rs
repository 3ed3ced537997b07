//! End-to-end conversation flow
//!
//! Exercises the full path a request takes through the engine: fresh
//! narrative generation, a follow-up continuation, and the conversation
//! listing, against a real SQLite database with only the generation
//! provider faked.

use async_trait::async_trait;
use std::sync::Arc;
use tempfile::TempDir;

use brandloom_engine::chat::{Identity, NarrativeLength, NarrativeRequest, Orchestrator};
use brandloom_engine::db::{AccountRepository, Database, NewAccount, TurnRepository};
use brandloom_engine::llm::GenerationProvider;

const GENERATED: &str =
    "Title of Narrative: Velvet Dawn\nNarrative: A story of quiet luxury and trust.";

struct StaticProvider;

#[async_trait]
impl GenerationProvider for StaticProvider {
    fn name(&self) -> &str {
        "static"
    }

    async fn generate(&self, _prompt: &str) -> brandloom_engine::llm::Result<String> {
        Ok(GENERATED.to_string())
    }
}

async fn setup() -> (TempDir, Orchestrator, Identity) {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::new(&temp_dir.path().join("flow.db")).await.unwrap();
    let pool = db.pool().clone();

    let accounts = Arc::new(AccountRepository::new(pool.clone()));
    let account = accounts
        .create(&NewAccount {
            public_id: "pub-flow".to_string(),
            email: "flow@example.com".to_string(),
            name: "Flow".to_string(),
            profile_image: None,
            credits: 5,
        })
        .await
        .unwrap();

    let orchestrator = Orchestrator::new(
        Arc::new(TurnRepository::new(pool)),
        accounts,
        Arc::new(StaticProvider),
    );

    let identity = Identity {
        user_id: account.id,
        email: "flow@example.com".to_string(),
    };

    (temp_dir, orchestrator, identity)
}

fn short_request() -> NarrativeRequest {
    NarrativeRequest {
        industry: Some("Skincare".to_string()),
        brand_values: Some(vec!["Quality".to_string(), "Trust".to_string()]),
        target_audience: Some("Affluent professionals".to_string()),
        brand_mission: Some("Radiance for everyone".to_string()),
        usp: Some("Cold-pressed botanicals".to_string()),
        narrative_length: NarrativeLength::Short,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_generate_continue_and_list() {
    let (_tmp, orchestrator, identity) = setup().await;

    let first = orchestrator
        .generate_narrative(&short_request(), &identity)
        .await
        .unwrap();

    assert!(!first.conversation_id.is_empty());
    assert_eq!(first.response, GENERATED);
    assert!(first.original_task.contains("Brand Values: Quality, Trust"));

    let continuation = orchestrator
        .continue_conversation(&first.conversation_id, "Make it punchier", &identity)
        .await
        .unwrap();

    // The continuation rederives the original task from the stored first
    // user turn, which holds the composed brief.
    assert_eq!(continuation.original_task, first.original_task);

    let summaries = orchestrator.list_conversations(&identity).await.unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].conversation_id, first.conversation_id);
    assert_eq!(summaries[0].title.as_deref(), Some("Velvet Dawn"));
    assert_eq!(summaries[0].turns.len(), 4);
}

#[tokio::test]
async fn test_original_task_survives_many_continuations() {
    let (_tmp, orchestrator, identity) = setup().await;

    let first = orchestrator
        .generate_narrative(&short_request(), &identity)
        .await
        .unwrap();

    for instruction in ["warmer", "shorter", "add a tagline"] {
        let continuation = orchestrator
            .continue_conversation(&first.conversation_id, instruction, &identity)
            .await
            .unwrap();
        assert_eq!(continuation.original_task, first.original_task);
    }

    let summaries = orchestrator.list_conversations(&identity).await.unwrap();
    assert_eq!(summaries[0].turns.len(), 8);
}
