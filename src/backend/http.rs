//! REST client for the chat service

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::json;

use super::api::{
    ChatApi, MessagesEnvelope, ModelInfo, ModelsEnvelope, SendResponse, SessionSummary,
    SessionsEnvelope,
};
use crate::error::{ClientError, Result};
use crate::protocol::SendRequest;
use crate::transcript::Message;

/// Talks to the chat service over HTTP with an optional bearer token.
#[derive(Clone)]
pub struct HttpChatApi {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpChatApi {
    pub fn new(base_url: impl Into<String>, token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Session transcript URL; the id is percent-encoded as one path segment.
    fn session_url(&self, session_id: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ClientError::Config(format!("Invalid API URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::Config(format!("API URL cannot have a path: {}", self.base_url)))?
            .pop_if_empty()
            .extend(["api", "chat", "session", session_id]);
        Ok(url)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

/// Map the status line, then decode the body.
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(ClientError::Unauthorized);
    }
    let body = response.text().await?;
    if !status.is_success() {
        // Error bodies are usually `{ "error": "..." }`
        let detail = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
            .unwrap_or(body);
        return Err(ClientError::Backend(format!("{}: {}", status, detail.trim())));
    }
    Ok(serde_json::from_str(&body)?)
}

fn multipart_form(request: SendRequest) -> Result<Form> {
    let mut form = Form::new()
        .text("message", request.message)
        .text("model", request.model)
        .text("user_instructions", request.user_instructions);
    if let Some(session_id) = request.session_id {
        form = form.text("session_id", session_id);
    }
    for attachment in request.attachments {
        let part = Part::bytes(attachment.bytes)
            .file_name(attachment.filename)
            .mime_str(&attachment.mime)?;
        form = form.part("files", part);
    }
    Ok(form)
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn send_message(&self, request: SendRequest) -> Result<SendResponse> {
        let builder = self.authorize(self.client.post(self.url("/api/chat")));
        let builder = if request.attachments.is_empty() {
            builder.json(&json!({
                "message": request.message,
                "session_id": request.session_id,
                "model": request.model,
                "user_instructions": request.user_instructions,
            }))
        } else {
            builder.multipart(multipart_form(request)?)
        };

        let response: SendResponse = read_json(builder.send().await?).await?;
        if !response.success {
            return Err(ClientError::Backend(
                response
                    .error
                    .unwrap_or_else(|| "The service did not return a response".to_string()),
            ));
        }
        Ok(response)
    }

    async fn list_sessions(&self) -> Result<Vec<SessionSummary>> {
        let builder = self.authorize(self.client.get(self.url("/api/chat/history")));
        let envelope: SessionsEnvelope = read_json(builder.send().await?).await?;
        if !envelope.success {
            return Err(ClientError::Backend(
                envelope.error.unwrap_or_else(|| "Failed to load sessions".to_string()),
            ));
        }
        Ok(envelope.sessions)
    }

    async fn session_messages(&self, session_id: &str) -> Result<Vec<Message>> {
        let builder = self.authorize(self.client.get(self.session_url(session_id)?));
        let envelope: MessagesEnvelope = read_json(builder.send().await?).await?;
        if !envelope.success {
            return Err(ClientError::Backend(
                envelope.error.unwrap_or_else(|| "Failed to load session".to_string()),
            ));
        }
        Ok(envelope.messages.into_iter().map(Message::from).collect())
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let builder = self.authorize(self.client.get(self.url("/api/models")));
        let envelope: ModelsEnvelope = read_json(builder.send().await?).await?;
        Ok(envelope.models)
    }
}
