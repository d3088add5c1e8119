//! Shared data model: conversation turns, backend descriptors and the
//! per-request results of the vision flows.

use serde::{Deserialize, Serialize};

/// Placeholder used when a field could not be extracted from model output.
///
/// Distinguishes "field absent" from "field present but empty".
pub const UNKNOWN_FIELD: &str = "Unknown";

// =============================================================================
// Conversation
// =============================================================================

/// One user message paired with the reply it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// What the user typed.
    pub user: String,
    /// The model reply, or a human-readable error string.
    pub bot: String,
}

impl Turn {
    pub fn new(user: impl Into<String>, bot: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            bot: bot.into(),
        }
    }
}

/// Ordered, append-only sequence of turns owned by a single session.
///
/// The only way to remove turns is [`ConversationHistory::clear`], which
/// resets the history to empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationHistory {
    turns: Vec<Turn>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a completed turn.
    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Drop every turn.
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// The trailing `n` turns, oldest first. Returns everything when the
    /// history is shorter than `n`.
    pub fn window(&self, n: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

impl From<Vec<Turn>> for ConversationHistory {
    fn from(turns: Vec<Turn>) -> Self {
        Self { turns }
    }
}

// =============================================================================
// Backends
// =============================================================================

/// The request shape a backend speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Local Ollama `/api/generate`, text only, single attempt.
    OllamaGenerate,
    /// Local Ollama `/api/generate` with an image, wrapped in the retry policy.
    OllamaVision,
    /// Cloud Gemini `generateContent`, single attempt.
    Gemini,
}

/// Where a request goes and which model it asks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendDescriptor {
    pub kind: BackendKind,
    /// Display name used in logs and user-facing error strings.
    pub name: String,
    /// Base URL without a trailing slash, e.g. `http://localhost:11434`.
    pub base_url: String,
    /// Model identifier sent with every request.
    pub model: String,
}

impl BackendDescriptor {
    pub fn new(
        kind: BackendKind,
        name: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    /// Same backend, different model.
    pub fn with_model(&self, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..self.clone()
        }
    }
}

// =============================================================================
// Vision results
// =============================================================================

/// The fixed set of labeled fields extracted from an image analysis reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisField {
    Age,
    Gender,
    Clothing,
    Environment,
}

impl AnalysisField {
    pub const ALL: [AnalysisField; 4] = [
        AnalysisField::Age,
        AnalysisField::Gender,
        AnalysisField::Clothing,
        AnalysisField::Environment,
    ];

    /// The label the model is asked to prefix each line with.
    pub fn label(self) -> &'static str {
        match self {
            AnalysisField::Age => "Age",
            AnalysisField::Gender => "Gender",
            AnalysisField::Clothing => "Clothing",
            AnalysisField::Environment => "Environment",
        }
    }
}

/// Parsed image analysis. Field order matches the JSON wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub age: String,
    pub gender: String,
    pub clothing: String,
    pub environment: String,
    /// Unmodified model output, kept for debugging.
    pub raw_response: String,
}

impl AnalysisResult {
    /// A result with every field set to [`UNKNOWN_FIELD`].
    pub fn unknown(raw_response: impl Into<String>) -> Self {
        Self {
            age: UNKNOWN_FIELD.to_string(),
            gender: UNKNOWN_FIELD.to_string(),
            clothing: UNKNOWN_FIELD.to_string(),
            environment: UNKNOWN_FIELD.to_string(),
            raw_response: raw_response.into(),
        }
    }

    pub fn get(&self, field: AnalysisField) -> &str {
        match field {
            AnalysisField::Age => &self.age,
            AnalysisField::Gender => &self.gender,
            AnalysisField::Clothing => &self.clothing,
            AnalysisField::Environment => &self.environment,
        }
    }

    pub fn set(&mut self, field: AnalysisField, value: impl Into<String>) {
        let slot = match field {
            AnalysisField::Age => &mut self.age,
            AnalysisField::Gender => &mut self.gender,
            AnalysisField::Clothing => &mut self.clothing,
            AnalysisField::Environment => &mut self.environment,
        };
        *slot = value.into();
    }
}

/// Reply to a question about an uploaded image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
}
