use anyhow::Result;

use super::base::ConfigLoader;

pub const DEFAULT_HOST: &str = "https://claude.ai";
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Cookie session and organization used for every request.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub session_key: String,
    pub org_id: String,
    pub host: String,
    pub timezone: String,
}

impl SessionConfig {
    pub fn new(session_key: String, org_id: String, host: String) -> Self {
        Self {
            session_key,
            org_id,
            host: host.trim_end_matches('/').to_string(),
            timezone: DEFAULT_TIMEZONE.to_string(),
        }
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    pub fn cookie(&self) -> String {
        format!("sessionKey={}", self.session_key)
    }

    /// Resolve from explicit values first, the environment second.
    ///
    /// Returns `None` when no session key or organization is available.
    pub fn resolve(
        session_key: Option<String>,
        org_id: Option<String>,
        host: Option<String>,
    ) -> Result<Option<Self>> {
        let session_key = match session_key {
            Some(key) => Some(key),
            None => Self::get_env("CLAUDE_SESSION_KEY", false, None)?,
        };
        let org_id = match org_id {
            Some(id) => Some(id),
            None => Self::get_env("CLAUDE_ORG_ID", false, None)?,
        };
        let host = match host {
            Some(host) => host,
            None => Self::get_env("CLAUDE_HOST", false, Some(DEFAULT_HOST.to_string()))?
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
        };
        let timezone = Self::get_env("CLAUDE_TIMEZONE", false, Some(DEFAULT_TIMEZONE.to_string()))?
            .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());

        Ok(match (session_key, org_id) {
            (Some(key), Some(org)) => Some(Self::new(key, org, host).with_timezone(timezone)),
            _ => None,
        })
    }
}

impl ConfigLoader for SessionConfig {}
