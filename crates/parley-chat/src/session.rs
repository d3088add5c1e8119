//! Chat session state.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use parley_core::ConversationHistory;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ChatError;

/// Which backend answers the next message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    /// Local Ollama server.
    #[default]
    Local,
    /// Gemini cloud API.
    Cloud,
}

impl ChatMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatMode::Local => "local",
            ChatMode::Cloud => "cloud",
        }
    }

    /// Status line shown after switching to this mode.
    pub fn status_line(&self) -> &'static str {
        match self {
            ChatMode::Local => "Ollama mode selected",
            ChatMode::Cloud => "Gemini mode selected",
        }
    }
}

impl fmt::Display for ChatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatMode {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "ollama" => Ok(ChatMode::Local),
            "cloud" | "gemini" => Ok(ChatMode::Cloud),
            other => Err(ChatError::InvalidMode(other.to_string())),
        }
    }
}

/// Whether a session has a backend call in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Idle,
    AwaitingReply,
}

/// One browser conversation.
#[derive(Debug, Clone)]
pub struct ChatSession {
    pub id: Uuid,
    pub history: ConversationHistory,
    pub mode: ChatMode,
    /// Local model name; ignored in cloud mode.
    pub model: String,
    pub state: SessionState,
    pub created_at: DateTime<Utc>,
    pub last_message_at: Option<DateTime<Utc>>,
}

impl ChatSession {
    pub fn new(mode: ChatMode, model: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            history: ConversationHistory::new(),
            mode,
            model: model.into(),
            state: SessionState::Idle,
            created_at: Utc::now(),
            last_message_at: None,
        }
    }

    /// Drop the whole history. Never touches a backend.
    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// Switch backends for subsequent messages and return the status line.
    pub fn set_mode(&mut self, mode: ChatMode) -> &'static str {
        self.mode = mode;
        mode.status_line()
    }

    pub fn set_model(&mut self, model: &str) -> Result<(), ChatError> {
        let model = model.trim();
        if model.is_empty() {
            return Err(ChatError::EmptyModel);
        }
        self.model = model.to_string();
        Ok(())
    }

    /// Time of the last message, or creation for a session never used.
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_message_at.unwrap_or(self.created_at)
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            session_id: self.id,
            mode: self.mode,
            model: self.model.clone(),
            state: self.state,
            history: self.history.clone(),
            created_at: self.created_at,
            last_message_at: self.last_message_at,
        }
    }
}

/// Serializable snapshot of a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub mode: ChatMode,
    pub model: String,
    pub state: SessionState,
    pub history: ConversationHistory,
    pub created_at: DateTime<Utc>,
    pub last_message_at: Option<DateTime<Utc>>,
}
