use serde::{Deserialize, Serialize};

use super::attachment::Attachment;
use super::settings::{ConversationSettings, ToolSpec};

/// Parent pointer for the first message of a conversation.
pub const ROOT_MESSAGE_ID: &str = "00000000-0000-4000-8000-000000000000";

#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub prompt: String,
    pub parent_message_uuid: String,
    pub timezone: String,
    pub attachments: Vec<Attachment>,
    pub files: Vec<String>,
    pub tools: Vec<ToolSpec>,
    pub rendering_mode: String,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, parent_message_uuid: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            parent_message_uuid: parent_message_uuid.into(),
            timezone: "UTC".to_string(),
            attachments: Vec::new(),
            files: Vec::new(),
            tools: Vec::new(),
            rendering_mode: "messages".to_string(),
        }
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolSpec>) -> Self {
        self.tools = tools;
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConversationDetails {
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub settings: Option<ConversationSettings>,
    #[serde(default)]
    pub chat_messages: Vec<ChatMessage>,
}

impl ConversationDetails {
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => "Untitled",
        }
    }

    pub fn settings(&self) -> ConversationSettings {
        self.settings.clone().unwrap_or_default()
    }

    /// Parent pointer for the next message: the last message, or the root.
    pub fn latest_message_id(&self) -> &str {
        self.chat_messages
            .last()
            .map(|message| message.uuid.as_str())
            .unwrap_or(ROOT_MESSAGE_ID)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessage {
    pub uuid: String,
    #[serde(default)]
    pub sender: Option<String>,
}
