//! UI-agnostic chat state types
//!
//! These are shared by every frontend and don't depend on any specific UI
//! framework. Nothing here is persisted; history lives only in the view.

use serde::{Deserialize, Serialize};

/// A chat message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: ChatRole,
    pub text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            text: text.into(),
        }
    }
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// Busy/enabled flags for the whole widget. Always flipped together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiState {
    pub busy: bool,
    pub input_enabled: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            busy: false,
            input_enabled: true,
        }
    }
}

impl UiState {
    pub fn is_idle(&self) -> bool {
        !self.busy && self.input_enabled
    }
}
