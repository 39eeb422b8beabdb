use std::env;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::api::client::ClaudeClient;
use crate::api::types::conversation::{CompletionRequest, ConversationDetails, ROOT_MESSAGE_ID};
use crate::api::types::settings::ConversationSettings;
use crate::api::utils::attachments_from_prompt;
use crate::errors::{ChatError, ChatResult};
use crate::store::ConversationStore;
use crate::stream::sink::{stdout_sink, OutputMode, OutputSink};
use crate::stream::state::{body_lines, drive, StreamState};

#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    /// Emit raw markdown instead of the live formatted view.
    pub raw: bool,
    /// Also save the complete response to this file.
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SendOutcome {
    pub text: String,
    pub new_message_id: Option<String>,
}

/// Send `prompt` to the active conversation, rendering to stdout.
pub fn chat<S: ConversationStore>(
    store: &mut S,
    prompt: &str,
    options: &ChatOptions,
) -> ChatResult<SendOutcome> {
    let mode = OutputMode::detect(options.raw, options.output.as_deref());
    tracing::debug!(?mode, "selected output mode");
    let mut sink = stdout_sink(mode, options.output.clone());
    let cwd = env::current_dir()?;
    send(store, prompt, &cwd, sink.as_mut())
}

/// Send `prompt` to the active conversation and stream the reply into `sink`.
///
/// `@path` references resolve against `cwd`. The conversation's parent
/// pointer only moves once the service has accepted the message.
pub fn send<S: ConversationStore>(
    store: &mut S,
    prompt: &str,
    cwd: &Path,
    sink: &mut dyn OutputSink,
) -> ChatResult<SendOutcome> {
    let session = store.active_session().cloned().ok_or(ChatError::NoSession)?;
    let conversation_id = store
        .active_conversation()
        .ok_or(ChatError::NoConversation)?;
    let parent_message_id = store
        .parent_message_id()
        .unwrap_or_else(|| ROOT_MESSAGE_ID.to_string());

    let attachments = attachments_from_prompt(prompt, cwd)?;
    let timezone = session.timezone.clone();
    let client = ClaudeClient::new(session)?;

    let settings = resolve_settings(store, &client, &conversation_id);
    let request = CompletionRequest::new(prompt, parent_message_id)
        .with_timezone(timezone)
        .with_attachments(attachments)
        .with_tools(settings.tools());

    let response = client.send_completion(&conversation_id, &request)?;
    let status = response.status();
    if !status.is_success() {
        return Err(ChatError::HttpStatus {
            action: "send message",
            status: status.as_u16(),
        });
    }

    let mut state = StreamState::new();
    let streamed = drive(body_lines(BufReader::new(response)), &mut state, &mut *sink);
    let finalized = sink.finalize(&state.rendered_text);

    if let Some(message_id) = &state.new_message_id {
        store.set_active_conversation(&conversation_id, message_id, None)?;
    }

    streamed?;
    finalized?;

    Ok(SendOutcome {
        text: state.rendered_text,
        new_message_id: state.new_message_id,
    })
}

/// Settings for the conversation: cached, else fetched and cached, else all enabled.
pub fn resolve_settings<S: ConversationStore>(
    store: &mut S,
    client: &ClaudeClient,
    conversation_id: &str,
) -> ConversationSettings {
    if let Some(settings) = store.conversation_settings() {
        return settings;
    }

    match fetch_settings(client, conversation_id) {
        Ok(settings) => {
            if let Err(e) = store.cache_settings(conversation_id, settings.clone()) {
                tracing::warn!("could not cache conversation settings: {}", e);
            }
            settings
        }
        Err(e) => {
            tracing::warn!("falling back to default conversation settings: {}", e);
            ConversationSettings::all_enabled()
        }
    }
}

fn fetch_settings(client: &ClaudeClient, conversation_id: &str) -> ChatResult<ConversationSettings> {
    let response = client.conversation_details(conversation_id)?;
    let status = response.status();
    if !status.is_success() {
        return Err(ChatError::from_status("fetch conversation settings", status));
    }
    let details: ConversationDetails = response.json()?;
    Ok(details.settings())
}
