use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::configs::session::SessionConfig;
use crate::api::types::settings::ConversationSettings;

/// Where the active session and conversation come from and go back to.
pub trait ConversationStore {
    fn active_session(&self) -> Option<&SessionConfig>;
    fn active_conversation(&self) -> Option<String>;
    fn parent_message_id(&self) -> Option<String>;
    /// Cached settings for the active conversation.
    fn conversation_settings(&self) -> Option<ConversationSettings>;
    /// Make a conversation active. `None` settings keep whatever is cached for it.
    fn set_active_conversation(
        &mut self,
        conversation_id: &str,
        parent_message_id: &str,
        settings: Option<ConversationSettings>,
    ) -> Result<()>;
    /// Cache settings for a conversation without touching the parent pointer.
    fn cache_settings(&mut self, conversation_id: &str, settings: ConversationSettings) -> Result<()>;
    fn clear_active_conversation(&mut self) -> Result<()>;
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredState {
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub parent_message_id: Option<String>,
    #[serde(default)]
    pub settings: HashMap<String, ConversationSettings>,
}

/// Conversation state persisted as a JSON file.
pub struct StateFile {
    path: PathBuf,
    session: Option<SessionConfig>,
    state: StoredState,
}

pub fn default_state_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    Ok(config_dir.join("claude-cli").join("state.json"))
}

impl StateFile {
    /// Load state from `path`; a missing file is an empty state.
    pub fn load(path: impl Into<PathBuf>, session: Option<SessionConfig>) -> Result<Self> {
        let path = path.into();
        let state = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read state file {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse state file {}", path.display()))?
        } else {
            StoredState::default()
        };

        Ok(Self {
            path,
            session,
            state,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> &StoredState {
        &self.state
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(&self.state)?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write state file {}", self.path.display()))?;
        Ok(())
    }
}

impl ConversationStore for StateFile {
    fn active_session(&self) -> Option<&SessionConfig> {
        self.session.as_ref()
    }

    fn active_conversation(&self) -> Option<String> {
        self.state.conversation_id.clone()
    }

    fn parent_message_id(&self) -> Option<String> {
        self.state.parent_message_id.clone()
    }

    fn conversation_settings(&self) -> Option<ConversationSettings> {
        let conversation_id = self.state.conversation_id.as_ref()?;
        self.state.settings.get(conversation_id).cloned()
    }

    fn set_active_conversation(
        &mut self,
        conversation_id: &str,
        parent_message_id: &str,
        settings: Option<ConversationSettings>,
    ) -> Result<()> {
        self.state.conversation_id = Some(conversation_id.to_string());
        self.state.parent_message_id = Some(parent_message_id.to_string());
        if let Some(settings) = settings {
            self.state
                .settings
                .insert(conversation_id.to_string(), settings);
        }
        self.persist()
    }

    fn cache_settings(&mut self, conversation_id: &str, settings: ConversationSettings) -> Result<()> {
        self.state
            .settings
            .insert(conversation_id.to_string(), settings);
        self.persist()
    }

    fn clear_active_conversation(&mut self) -> Result<()> {
        if let Some(conversation_id) = self.state.conversation_id.take() {
            self.state.settings.remove(&conversation_id);
        }
        self.state.parent_message_id = None;
        self.persist()
    }
}
