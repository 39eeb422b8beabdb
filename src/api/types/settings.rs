use serde::{Deserialize, Serialize};

/// Per-conversation feature flags, as returned by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled_web_search: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_feature_uses_artifacts: Option<bool>,
    /// Code execution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled_turmeric: Option<bool>,
}

impl ConversationSettings {
    /// Used for new conversations and when settings cannot be fetched.
    pub fn all_enabled() -> Self {
        Self {
            enabled_web_search: Some(true),
            preview_feature_uses_artifacts: Some(true),
            enabled_turmeric: Some(true),
        }
    }

    pub fn web_search(&self) -> bool {
        self.enabled_web_search.unwrap_or(false)
    }

    pub fn artifacts(&self) -> bool {
        self.preview_feature_uses_artifacts.unwrap_or(false)
    }

    pub fn code_execution(&self) -> bool {
        self.enabled_turmeric.unwrap_or(false)
    }

    /// Tools to enable on a completion, always in the same order.
    pub fn tools(&self) -> Vec<ToolSpec> {
        let mut tools = Vec::new();
        if self.web_search() {
            tools.push(ToolSpec::new("web_search_v0", "web_search"));
        }
        if self.artifacts() {
            tools.push(ToolSpec::new("artifacts_v0", "artifacts"));
        }
        if self.code_execution() {
            tools.push(ToolSpec::new("repl_v0", "repl"));
        }
        tools
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpec {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
}

impl ToolSpec {
    pub fn new(kind: &str, name: &str) -> Self {
        Self {
            kind: kind.to_string(),
            name: name.to_string(),
        }
    }
}
