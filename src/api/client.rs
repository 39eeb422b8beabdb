use std::time::Duration;

use anyhow::Result;
use reqwest::blocking::{Client, RequestBuilder, Response}; // blocking: responses are read line by line
use reqwest::header::{ACCEPT, COOKIE};
use serde_json::json;

use super::configs::session::SessionConfig;
use super::types::conversation::CompletionRequest;

/// Blocking client for the conversation endpoints of the web service.
///
/// Every method returns the raw response so callers decide how to treat
/// each status code.
pub struct ClaudeClient {
    client: Client,
    config: SessionConfig,
}

impl ClaudeClient {
    pub fn new(config: SessionConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()?;

        Ok(Self { client, config })
    }

    fn conversations_url(&self) -> String {
        format!(
            "{}/api/organizations/{}/chat_conversations",
            self.config.host, self.config.org_id
        )
    }

    fn conversation_url(&self, conversation_id: &str) -> String {
        format!("{}/{}", self.conversations_url(), conversation_id)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(COOKIE, self.config.cookie())
    }

    pub fn send_completion(
        &self,
        conversation_id: &str,
        request: &CompletionRequest,
    ) -> Result<Response> {
        let url = format!("{}/completion", self.conversation_url(conversation_id));
        tracing::debug!(%url, tools = request.tools.len(), attachments = request.attachments.len(), "sending completion");

        let response = self
            .authorized(self.client.post(&url))
            .header(ACCEPT, "text/event-stream")
            .json(request)
            .send()?;
        Ok(response)
    }

    pub fn conversation_details(&self, conversation_id: &str) -> Result<Response> {
        let url = self.conversation_url(conversation_id);
        tracing::debug!(%url, "fetching conversation details");

        let response = self
            .authorized(self.client.get(&url))
            .query(&[
                ("tree", "True"),
                ("rendering_mode", "messages"),
                ("render_all_tools", "true"),
            ])
            .send()?;
        Ok(response)
    }

    pub fn create_conversation(&self, conversation_id: &str, name: &str) -> Result<Response> {
        let url = self.conversations_url();
        tracing::debug!(%url, conversation_id, "creating conversation");

        let response = self
            .authorized(self.client.post(&url))
            .json(&json!({
                "uuid": conversation_id,
                "name": name,
            }))
            .send()?;
        Ok(response)
    }

    pub fn rename_conversation(&self, conversation_id: &str, name: &str) -> Result<Response> {
        let url = self.conversation_url(conversation_id);
        tracing::debug!(%url, "renaming conversation");

        let response = self
            .authorized(self.client.put(&url))
            .json(&json!({ "name": name }))
            .send()?;
        Ok(response)
    }

    pub fn delete_conversation(&self, conversation_id: &str) -> Result<Response> {
        let url = self.conversation_url(conversation_id);
        tracing::debug!(%url, "deleting conversation");

        let response = self.authorized(self.client.delete(&url)).send()?;
        Ok(response)
    }
}
