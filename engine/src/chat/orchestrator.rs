//! Conversation orchestration
//!
//! Top-level policy for narrative requests. Each request moves through a
//! fixed sequence: validate, resolve history, compose, generate, persist,
//! respond; any failure terminates the request with no retries at this
//! layer.
//!
//! Persistence always happens in pairs: the user turn first (parented on
//! the conversation's latest turn, or rootless for a fresh thread), then
//! the assistant turn parented on the user turn's fresh id. Validation and
//! generation failures therefore never leave partial state; only a store
//! failure between the two inserts can leave a conversation ending on a
//! user turn, which is detectable and surfaced as an internal error.
//!
//! Two requests racing on the same conversation may both adopt the same
//! pre-race latest turn as parent, branching the thread. That is tolerated:
//! reconstruction orders by ascending id and stays correct on branches.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::history::{reconstruct, ChatHistory};
use super::prompt::{compose, extract_title, NarrativeBrief, NarrativeLength};
use super::{AccountService, AccountSnapshot, ChatMessage, NewTurn, TurnStore};
use crate::error::EngineError;
use crate::llm::GenerationProvider;

/// Authenticated caller identity, supplied by the upstream auth layer and
/// trusted as-is
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: i64,
    pub email: String,
}

/// Inbound narrative request
///
/// Field names follow the public wire format. Structured fields are all
/// optional at the type level; which ones are required depends on the
/// narrative mode and is enforced in validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NarrativeRequest {
    pub industry: Option<String>,
    pub brand_values: Option<Vec<String>>,
    pub target_audience: Option<String>,
    pub brand_mission: Option<String>,
    pub brand_vision: Option<String>,
    pub usp: Option<String>,
    pub brand_personality: Option<String>,
    pub tone_of_voice: Option<String>,
    pub key_products: Option<Vec<String>>,
    pub brand_story: Option<String>,
    pub narrative_length: NarrativeLength,

    /// Continue an existing thread instead of minting a new one
    pub conversation_id: Option<String>,

    /// Explicit parent override, used only when the conversation has no
    /// stored turns to derive a parent from
    pub parent_turn_id: Option<i64>,

    /// Caller-supplied original task; rederived from history when absent
    pub original_task: Option<String>,

    /// Follow-up instruction appended to the prompt
    pub new_instruction: Option<String>,
}

/// Response to a narrative generation request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeOutcome {
    pub response: String,
    pub conversation_id: String,
    pub original_task: String,
    pub account: AccountSnapshot,
}

/// Response to a continue-conversation request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinuationOutcome {
    pub response: String,
    pub conversation_id: String,
    pub original_task: String,
}

/// One conversation in an account's listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub conversation_id: String,
    pub title: Option<String>,
    pub turns: Vec<ChatMessage>,
}

/// Conversation orchestrator
///
/// All collaborators are explicitly passed references, so the orchestrator
/// can be exercised against fakes and in-memory stores.
#[derive(Clone)]
pub struct Orchestrator {
    turns: Arc<dyn TurnStore>,
    accounts: Arc<dyn AccountService>,
    provider: Arc<dyn GenerationProvider>,
}

impl Orchestrator {
    /// Create a new orchestrator over the given collaborators
    pub fn new(
        turns: Arc<dyn TurnStore>,
        accounts: Arc<dyn AccountService>,
        provider: Arc<dyn GenerationProvider>,
    ) -> Self {
        Self {
            turns,
            accounts,
            provider,
        }
    }

    /// Generate a narrative, starting a new thread or continuing one
    pub async fn generate_narrative(
        &self,
        request: &NarrativeRequest,
        identity: &Identity,
    ) -> Result<NarrativeOutcome, EngineError> {
        validate_required_fields(request)?;

        let account = self.require_account(&identity.email).await?;

        // A conversation is created implicitly by the first successful
        // generation call; only a minted id makes this a fresh thread.
        let fresh = request.conversation_id.is_none();
        let conversation_id = request
            .conversation_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let history = if fresh {
            ChatHistory::empty()
        } else {
            reconstruct(self.turns.as_ref(), &conversation_id)
                .await
                .map_err(db_error)?
        };

        let original_task = request
            .original_task
            .clone()
            .or_else(|| history.original_task.clone());

        // A fresh thread is always rootless. The explicit parent override
        // only applies when the caller named a conversation that has no
        // stored turns to derive a parent from.
        let parent_id = if fresh {
            None
        } else {
            history.last_turn_id.or(request.parent_turn_id)
        };

        let brief = build_brief(request);
        let prompt = compose(
            Some(&brief),
            &history.messages,
            original_task.as_deref(),
            request.new_instruction.as_deref(),
        );

        debug!(
            conversation_id,
            fresh,
            prompt_len = prompt.len(),
            "composed narrative prompt"
        );

        let response = self.generate(&prompt).await?;

        let title = fresh.then(|| extract_title(&response));
        let user_content = request
            .new_instruction
            .clone()
            .unwrap_or_else(|| prompt.clone());

        self.persist_pair(
            &conversation_id,
            &account,
            user_content,
            response.clone(),
            parent_id,
            title,
        )
        .await?;

        info!(conversation_id, owner = account.id, "narrative generated");

        // Re-fetch for the latest credit balance; the generation call may
        // have debited the account upstream.
        let account = self
            .accounts
            .get_by_email(&identity.email)
            .await
            .map_err(db_error)?
            .unwrap_or(account);

        Ok(NarrativeOutcome {
            response,
            conversation_id,
            original_task: original_task.unwrap_or(prompt),
            account: AccountSnapshot::from(&account),
        })
    }

    /// Continue an existing conversation with a follow-up instruction
    ///
    /// Requires the conversation to exist and to have a recoverable
    /// original task; no structured-field validation applies here.
    pub async fn continue_conversation(
        &self,
        conversation_id: &str,
        new_instruction: &str,
        identity: &Identity,
    ) -> Result<ContinuationOutcome, EngineError> {
        if conversation_id.is_empty() || new_instruction.is_empty() {
            return Err(EngineError::Validation(
                "conversationId and newInstruction are required".to_string(),
            ));
        }

        let account = self.require_account(&identity.email).await?;

        let history = reconstruct(self.turns.as_ref(), conversation_id)
            .await
            .map_err(db_error)?;

        if history.last_turn_id.is_none() {
            return Err(EngineError::NotFound(format!(
                "no history for conversation {}",
                conversation_id
            )));
        }

        let original_task = history.original_task.clone().ok_or(EngineError::NoHistory)?;

        let prompt = compose(
            None,
            &history.messages,
            Some(&original_task),
            Some(new_instruction),
        );

        let response = self.generate(&prompt).await?;

        self.persist_pair(
            conversation_id,
            &account,
            new_instruction.to_string(),
            response.clone(),
            history.last_turn_id,
            None,
        )
        .await?;

        info!(conversation_id, owner = account.id, "conversation continued");

        Ok(ContinuationOutcome {
            response,
            conversation_id: conversation_id.to_string(),
            original_task,
        })
    }

    /// List all of an account's conversations, grouped and titled
    ///
    /// Pure projection over the turn store; no write path. Groups appear
    /// in order of their first turn; malformed turns are skipped.
    pub async fn list_conversations(
        &self,
        identity: &Identity,
    ) -> Result<Vec<ConversationSummary>, EngineError> {
        let account = self.require_account(&identity.email).await?;

        let turns = self
            .turns
            .list_by_owner(account.id)
            .await
            .map_err(db_error)?;

        let mut summaries: Vec<ConversationSummary> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for turn in &turns {
            let slot = match index.get(&turn.conversation_id) {
                Some(&slot) => slot,
                None => {
                    index.insert(turn.conversation_id.clone(), summaries.len());
                    summaries.push(ConversationSummary {
                        conversation_id: turn.conversation_id.clone(),
                        title: None,
                        turns: Vec::new(),
                    });
                    summaries.len() - 1
                }
            };

            let summary = &mut summaries[slot];
            if summary.title.is_none() {
                summary.title = turn.title.clone();
            }

            match turn.decode() {
                Ok(message) => summary.turns.push(message),
                Err(err) => {
                    warn!(turn_id = turn.id, "skipping malformed turn: {}", err);
                }
            }
        }

        Ok(summaries)
    }

    /// Fetch the caller's account snapshot
    pub async fn account_profile(&self, identity: &Identity) -> Result<AccountSnapshot, EngineError> {
        let account = self.require_account(&identity.email).await?;
        Ok(AccountSnapshot::from(&account))
    }

    async fn require_account(&self, email: &str) -> Result<super::Account, EngineError> {
        self.accounts
            .get_by_email(email)
            .await
            .map_err(db_error)?
            .ok_or_else(|| EngineError::NotFound("account not found".to_string()))
    }

    async fn generate(&self, prompt: &str) -> Result<String, EngineError> {
        self.provider.generate(prompt).await.map_err(|err| {
            error!(provider = self.provider.name(), "generation failed: {}", err);
            EngineError::Generation(err.to_string())
        })
    }

    /// Insert the user turn, then the assistant turn parented on it
    ///
    /// Runs only after a successful generation; a failure between the two
    /// inserts can leave the conversation ending on a user turn, which is
    /// why these errors surface as internal rather than as read failures.
    async fn persist_pair(
        &self,
        conversation_id: &str,
        account: &super::Account,
        user_content: String,
        assistant_content: String,
        parent_id: Option<i64>,
        title: Option<String>,
    ) -> Result<(), EngineError> {
        let user_turn_id = self
            .turns
            .insert(NewTurn {
                conversation_id: conversation_id.to_string(),
                message: ChatMessage::user(user_content),
                parent_id,
                owner_id: account.id,
                owner_public_id: account.public_id.clone(),
                title: title.clone(),
            })
            .await
            .map_err(internal_error)?;

        self.turns
            .insert(NewTurn {
                conversation_id: conversation_id.to_string(),
                message: ChatMessage::assistant(assistant_content),
                parent_id: Some(user_turn_id),
                owner_id: account.id,
                owner_public_id: account.public_id.clone(),
                title,
            })
            .await
            .map_err(internal_error)?;

        Ok(())
    }
}

/// Validate per-mode required fields
///
/// A field is missing when absent, empty, or an empty sequence. Short mode
/// requires five fields; any other mode requires all ten.
fn validate_required_fields(request: &NarrativeRequest) -> Result<(), EngineError> {
    let missing_text = |value: &Option<String>| value.as_deref().map_or(true, str::is_empty);
    let missing_list = |value: &Option<Vec<String>>| value.as_ref().map_or(true, Vec::is_empty);

    let short_missing = missing_text(&request.industry)
        || missing_list(&request.brand_values)
        || missing_text(&request.target_audience)
        || missing_text(&request.brand_mission)
        || missing_text(&request.usp);

    match request.narrative_length {
        NarrativeLength::Short => {
            if short_missing {
                return Err(EngineError::Validation(
                    "Missing required fields for short narrative (industry, brandValues, \
                     targetAudience, brandMission, usp)"
                        .to_string(),
                ));
            }
        }
        NarrativeLength::Long => {
            if short_missing
                || missing_text(&request.brand_vision)
                || missing_text(&request.brand_personality)
                || missing_text(&request.tone_of_voice)
                || missing_list(&request.key_products)
                || missing_text(&request.brand_story)
            {
                return Err(EngineError::Validation(
                    "Missing required fields for long narrative (all 10 parameters)".to_string(),
                ));
            }
        }
    }

    Ok(())
}

/// Build the composer brief from a validated request
///
/// Short mode blanks the five long-only fields rather than omitting them,
/// so the rendered brief always carries all ten labels.
fn build_brief(request: &NarrativeRequest) -> NarrativeBrief {
    let text = |value: &Option<String>| value.clone().unwrap_or_default();
    let list = |value: &Option<Vec<String>>| value.clone().unwrap_or_default();

    match request.narrative_length {
        NarrativeLength::Short => NarrativeBrief {
            industry: text(&request.industry),
            brand_values: list(&request.brand_values),
            target_audience: text(&request.target_audience),
            brand_mission: text(&request.brand_mission),
            brand_vision: String::new(),
            usp: text(&request.usp),
            brand_personality: String::new(),
            tone_of_voice: String::new(),
            key_products: Vec::new(),
            brand_story: String::new(),
            length: NarrativeLength::Short,
        },
        NarrativeLength::Long => NarrativeBrief {
            industry: text(&request.industry),
            brand_values: list(&request.brand_values),
            target_audience: text(&request.target_audience),
            brand_mission: text(&request.brand_mission),
            brand_vision: text(&request.brand_vision),
            usp: text(&request.usp),
            brand_personality: text(&request.brand_personality),
            tone_of_voice: text(&request.tone_of_voice),
            key_products: list(&request.key_products),
            brand_story: text(&request.brand_story),
            length: NarrativeLength::Long,
        },
    }
}

fn db_error(err: anyhow::Error) -> EngineError {
    error!("storage failure: {:#}", err);
    EngineError::Database(err.to_string())
}

/// Write failures after a successful generation; the response already
/// exists, so losing it is an engine fault rather than a plain read error
fn internal_error(err: anyhow::Error) -> EngineError {
    error!("persistence failure after generation: {:#}", err);
    EngineError::Internal(err.to_string())
}
