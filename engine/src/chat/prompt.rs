//! Prompt composition
//!
//! Pure, deterministic assembly of the single outbound prompt sent to the
//! generation provider, plus title extraction from generated text. Identical
//! inputs always produce identical strings; nothing here touches storage or
//! the network.
//!
//! Composition order is fixed: task restatement or structured brief, then a
//! one-line history snippet, then the follow-up instruction. Only the most
//! recent history message is echoed, to bound prompt size.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::ChatMessage;

/// Marker line the output-format directive asks the model to emit
const TITLE_MARKER: &str = "Title of Narrative:";

/// Maximum length of a fallback title, in characters
const FALLBACK_TITLE_CHARS: usize = 50;

/// Target length of the generated narrative
///
/// Anything other than the literal `"short"` on the wire is treated as
/// long mode, which is also the default when the field is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NarrativeLength {
    Short,
    #[default]
    Long,
}

impl NarrativeLength {
    pub fn as_str(&self) -> &str {
        match self {
            NarrativeLength::Short => "short",
            NarrativeLength::Long => "long",
        }
    }
}

impl Serialize for NarrativeLength {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NarrativeLength {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(if raw == "short" {
            NarrativeLength::Short
        } else {
            NarrativeLength::Long
        })
    }
}

/// The ten structured fields of a brand brief
///
/// Short-mode requests carry empty strings and vecs in the five long-only
/// fields; the composer renders them as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct NarrativeBrief {
    pub industry: String,
    pub brand_values: Vec<String>,
    pub target_audience: String,
    pub brand_mission: String,
    pub brand_vision: String,
    pub usp: String,
    pub brand_personality: String,
    pub tone_of_voice: String,
    pub key_products: Vec<String>,
    pub brand_story: String,
    pub length: NarrativeLength,
}

/// Compose the outbound prompt
///
/// With `original_task` present this is the continuation path: the task is
/// restated and the brief is not re-emitted. Otherwise `brief` must be
/// present (the orchestrator validates before calling) and the full
/// structured brief is rendered with the length and output-format
/// directives.
pub fn compose(
    brief: Option<&NarrativeBrief>,
    history: &[ChatMessage],
    original_task: Option<&str>,
    new_instruction: Option<&str>,
) -> String {
    let mut prompt = String::new();

    match original_task {
        Some(task) => {
            prompt.push_str(&format!("Original Task/Goal: {}\n", task));
        }
        None => {
            if let Some(brief) = brief {
                prompt.push_str(
                    "You are a luxury brand strategist. Craft a compelling and emotionally \
                     engaging brand narrative based on the following inputs:\n\n",
                );
                prompt.push_str(&format!("Industry: {}\n", brief.industry));
                prompt.push_str(&format!("Brand Values: {}\n", brief.brand_values.join(", ")));
                prompt.push_str(&format!("Target Audience: {}\n", brief.target_audience));
                prompt.push_str(&format!("Brand Mission: {}\n", brief.brand_mission));
                prompt.push_str(&format!("Brand Vision: {}\n", brief.brand_vision));
                prompt.push_str(&format!("Unique Selling Proposition: {}\n", brief.usp));
                prompt.push_str(&format!("Brand Personality: {}\n", brief.brand_personality));
                prompt.push_str(&format!("Tone of Voice: {}\n", brief.tone_of_voice));
                prompt.push_str(&format!(
                    "Key Products/Services: {}\n",
                    brief.key_products.join(", ")
                ));
                prompt.push_str(&format!("Brand Story/Background: {}\n\n", brief.brand_story));

                prompt.push_str(
                    "The narrative should emphasize exclusivity, emotion, and connection to \
                     high-end consumers.\n",
                );
                prompt.push_str(&format!(
                    "Please generate a {} narrative.\n\n",
                    match brief.length {
                        NarrativeLength::Short => "concise (1-2 paragraphs)",
                        NarrativeLength::Long => "detailed (3-5 paragraphs)",
                    }
                ));

                prompt.push_str("**Output Format:**\n");
                prompt.push_str("Title of Narrative: <Insert a short, captivating title here>\n");
                prompt.push_str("Narrative: <Write the brand narrative in paragraph form>\n");
            }
        }
    }

    // Only the latest message is echoed, not the full transcript.
    if let Some(last) = history.last() {
        prompt.push_str("\nChat History (for context):\n");
        prompt.push_str(&format!(
            "[{}]: {}\n",
            last.role.to_string().to_uppercase(),
            last.content
        ));
    }

    if let Some(instruction) = new_instruction {
        prompt.push_str(&format!("\nUser Follow-up Instruction: {}\n", instruction));
    }

    prompt
}

/// Extract a short title from generated text
///
/// Returns the text after the first `Title of Narrative:` marker, trimmed
/// of whitespace and `*` emphasis. Fallback policy when the marker is
/// absent: the first non-empty line, truncated to 50 characters on a char
/// boundary; empty input yields an empty string.
pub fn extract_title(generated: &str) -> String {
    for line in generated.lines() {
        if let Some(pos) = line.find(TITLE_MARKER) {
            let title = line[pos + TITLE_MARKER.len()..]
                .trim()
                .trim_matches('*')
                .trim();
            return title.to_string();
        }
    }

    let first_line = generated
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("");

    first_line.chars().take(FALLBACK_TITLE_CHARS).collect()
}
