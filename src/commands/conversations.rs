use console::style;
use reqwest::StatusCode;
use uuid::Uuid;

use crate::api::client::ClaudeClient;
use crate::api::configs::session::DEFAULT_HOST;
use crate::api::types::conversation::{ConversationDetails, ROOT_MESSAGE_ID};
use crate::api::types::settings::ConversationSettings;
use crate::errors::{ChatError, ChatResult};
use crate::store::ConversationStore;

fn client_for<S: ConversationStore>(store: &S) -> ChatResult<ClaudeClient> {
    let session = store.active_session().cloned().ok_or(ChatError::NoSession)?;
    Ok(ClaudeClient::new(session)?)
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn fetch_details(client: &ClaudeClient, conversation_id: &str) -> ChatResult<ConversationDetails> {
    let response = client.conversation_details(conversation_id)?;
    let status = response.status();
    if !status.is_success() {
        return Err(ChatError::from_status("fetch conversation", status));
    }
    Ok(response.json()?)
}

/// Create a conversation and make it active. Returns its id.
pub fn handle_new<S: ConversationStore>(store: &mut S, name: &str) -> ChatResult<String> {
    let client = client_for(store)?;
    let conversation_id = Uuid::new_v4().to_string();

    println!("Creating new conversation...");
    let response = client.create_conversation(&conversation_id, name)?;
    let status = response.status();
    if !matches!(status, StatusCode::OK | StatusCode::CREATED) {
        return Err(ChatError::from_status("create conversation", status));
    }

    store.set_active_conversation(
        &conversation_id,
        ROOT_MESSAGE_ID,
        Some(ConversationSettings::all_enabled()),
    )?;
    println!(
        "Conversation created: {}... {}",
        short_id(&conversation_id),
        style("(now active)").dim()
    );
    Ok(conversation_id)
}

/// Show the active conversation's name, or rename it. Returns the name in effect.
pub fn handle_name<S: ConversationStore>(store: &S, new_name: Option<&str>) -> ChatResult<String> {
    let client = client_for(store)?;
    let conversation_id = store
        .active_conversation()
        .ok_or(ChatError::NoConversation)?;

    let details = fetch_details(&client, &conversation_id)?;
    let current_name = details.display_name().to_string();

    let Some(new_name) = new_name.filter(|name| !name.trim().is_empty()) else {
        println!("Current conversation: {}", current_name);
        return Ok(current_name);
    };

    println!("Renaming conversation from '{}' to '{}'...", current_name, new_name);
    let response = client.rename_conversation(&conversation_id, new_name)?;
    let status = response.status();
    if !matches!(status, StatusCode::OK | StatusCode::ACCEPTED) {
        return Err(ChatError::from_status("rename conversation", status));
    }

    println!("{}", style("Conversation renamed successfully!").green());
    Ok(new_name.to_string())
}

/// Delete a conversation, the active one by default.
///
/// Returns false when the user declines the confirmation.
pub fn handle_delete<S: ConversationStore>(
    store: &mut S,
    conversation_id: Option<String>,
    assume_yes: bool,
) -> ChatResult<bool> {
    let client = client_for(store)?;
    let active = store.active_conversation();
    let conversation_id = conversation_id
        .or_else(|| active.clone())
        .ok_or(ChatError::NoConversation)?;

    if !assume_yes {
        let confirmed = cliclack::confirm(format!(
            "Delete conversation {}...?",
            short_id(&conversation_id)
        ))
        .initial_value(false)
        .interact()?;
        if !confirmed {
            println!("Cancelled.");
            return Ok(false);
        }
    }

    let response = client.delete_conversation(&conversation_id)?;
    let status = response.status();
    if !matches!(status, StatusCode::OK | StatusCode::NO_CONTENT) {
        return Err(ChatError::from_status("delete conversation", status));
    }
    println!("Conversation deleted");

    if active.as_deref() == Some(conversation_id.as_str()) {
        store.clear_active_conversation()?;
        println!("Cleared active conversation");
    }
    Ok(true)
}

/// Web link to the active conversation.
pub fn conversation_link<S: ConversationStore>(store: &S) -> String {
    let host = store
        .active_session()
        .map(|session| session.host.as_str())
        .unwrap_or(DEFAULT_HOST);
    let conversation_id = store
        .active_conversation()
        .unwrap_or_else(|| "???".to_string());
    format!("{}/chat/{}", host, conversation_id)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncOutcome {
    pub previous_parent: Option<String>,
    pub parent_message_id: String,
    pub message_count: usize,
}

impl SyncOutcome {
    pub fn changed(&self) -> bool {
        self.previous_parent.as_deref() != Some(self.parent_message_id.as_str())
    }
}

/// Point the active conversation at its latest remote message and refresh its settings.
pub fn handle_sync<S: ConversationStore>(store: &mut S) -> ChatResult<SyncOutcome> {
    let client = client_for(store)?;
    let conversation_id = store
        .active_conversation()
        .ok_or(ChatError::NoConversation)?;

    println!("Syncing conversation...");
    let details = fetch_details(&client, &conversation_id)?;
    let outcome = SyncOutcome {
        previous_parent: store.parent_message_id(),
        parent_message_id: details.latest_message_id().to_string(),
        message_count: details.chat_messages.len(),
    };

    store.set_active_conversation(
        &conversation_id,
        &outcome.parent_message_id,
        Some(details.settings()),
    )?;

    if outcome.message_count == 0 {
        println!("Synced! (Conversation is empty)");
    } else if outcome.changed() {
        println!("Synced! Updated parent message:");
        println!(
            "  Old: {}...",
            outcome.previous_parent.as_deref().map(short_id).unwrap_or("none")
        );
        println!("  New: {}...", short_id(&outcome.parent_message_id));
        println!("  Total messages in conversation: {}", outcome.message_count);
    } else {
        println!("Already synced! No new messages on web.");
    }
    Ok(outcome)
}
