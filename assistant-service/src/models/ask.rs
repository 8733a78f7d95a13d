use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

impl AskRequest {
    /// The prompt with surrounding whitespace removed, or `None` when blank.
    pub fn prompt(&self) -> Option<&str> {
        self.prompt
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

/// `{reply}` on success, `{message, reply}` when the model call failed and
/// `reply` carries the fixed fallback sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AskResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub reply: String,
}

impl AskResponse {
    pub fn reply(reply: impl Into<String>) -> Self {
        Self {
            message: None,
            reply: reply.into(),
        }
    }

    pub fn with_message(message: impl Into<String>, reply: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            reply: reply.into(),
        }
    }
}
