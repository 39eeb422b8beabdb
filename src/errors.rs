use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("No active account. Set CLAUDE_SESSION_KEY and CLAUDE_ORG_ID, or pass --session-key and --org-id.")]
    NoSession,

    #[error("No active conversation. Use 'new' or 'sync' to select one.")]
    NoConversation,

    #[error("Failed to {action} (status code: {status})")]
    HttpStatus { action: &'static str, status: u16 },

    #[error("Authentication failed. Your session cookie may have expired; refresh CLAUDE_SESSION_KEY.")]
    AuthenticationFailed,

    #[error("File(s) not found: {}", .0.join(", "))]
    FilesNotFound(Vec<String>),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ChatError {
    /// Map a non-success status onto the error taxonomy.
    pub fn from_status(action: &'static str, status: reqwest::StatusCode) -> Self {
        match status.as_u16() {
            401 | 403 => ChatError::AuthenticationFailed,
            code => ChatError::HttpStatus {
                action,
                status: code,
            },
        }
    }
}

pub type ChatResult<T> = Result<T, ChatError>;
