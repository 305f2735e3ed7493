//! Service interface and wire types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::protocol::SendRequest;
use crate::transcript::{Message, OutputFile, Role};

/// The remote chat service, as seen by the backend worker.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn send_message(&self, request: SendRequest) -> Result<SendResponse>;
    async fn list_sessions(&self) -> Result<Vec<SessionSummary>>;
    async fn session_messages(&self, session_id: &str) -> Result<Vec<Message>>;
    async fn list_models(&self) -> Result<Vec<ModelInfo>>;
}

/// Answer to a chat send.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SendResponse {
    #[serde(default)]
    pub success: bool,
    /// Assistant text
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub model_used: Option<String>,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub request_type: Option<String>,
    #[serde(default)]
    pub output_files: Vec<OutputFile>,
    #[serde(default)]
    pub error: Option<String>,
}

/// One row of the session list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub last_message: String,
    #[serde(with = "wire_time")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub model_used: Option<String>,
    #[serde(default)]
    pub request_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
}

/// Stored transcript entry as the history endpoint returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryItem {
    pub message_type: String,
    #[serde(default)]
    pub message_content: String,
    #[serde(with = "wire_time")]
    pub message_timestamp: DateTime<Utc>,
    #[serde(default)]
    pub model_used: Option<String>,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub request_type: Option<String>,
    #[serde(default)]
    pub output_files: Vec<OutputFile>,
}

impl From<HistoryItem> for Message {
    fn from(item: HistoryItem) -> Self {
        let role = if item.message_type == "assistant" {
            Role::Assistant
        } else {
            Role::User
        };
        Message {
            role,
            content: item.message_content,
            timestamp: item.message_timestamp,
            model_used: item.model_used,
            sources: item.sources,
            output_files: item.output_files,
            request_type: item.request_type,
        }
    }
}

/// `{ success, sessions | error }`
#[derive(Debug, Deserialize)]
pub(crate) struct SessionsEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub sessions: Vec<SessionSummary>,
    #[serde(default)]
    pub error: Option<String>,
}

/// `{ success, messages | error }`
#[derive(Debug, Deserialize)]
pub(crate) struct MessagesEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub messages: Vec<HistoryItem>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ModelsEnvelope {
    #[serde(default)]
    pub models: Vec<ModelInfo>,
}

/// Timestamps arrive either as RFC 3339 or as naive ISO-8601 (assumed UTC).
pub(crate) mod wire_time {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp: {}", raw)))
    }

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}
