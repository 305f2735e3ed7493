use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a transcript message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A file produced by the backend for an assistant message.
///
/// Exactly one of `content` (base64) or `url` is populated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFile {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub file_type: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl OutputFile {
    /// Filename to save under, derived from the type when the backend sent none.
    pub fn effective_filename(&self, index: usize) -> String {
        if !self.filename.trim().is_empty() {
            return self.filename.clone();
        }
        // Non-pdf payloads are saved as text/csv, so they get a csv name
        let ext = if self.file_type == "pdf" { "pdf" } else { "csv" };
        format!("{}_{}.{}", self.file_type, index + 1, ext)
    }
}

/// One transcript entry. Never mutated after it is appended.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub model_used: Option<String>,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub output_files: Vec<OutputFile>,
    #[serde(default)]
    pub request_type: Option<String>,
}

impl Message {
    pub fn user(content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp,
            model_used: None,
            sources: Vec::new(),
            output_files: Vec::new(),
            request_type: None,
        }
    }

    pub fn assistant(content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            role: Role::Assistant,
            ..Self::user(content, timestamp)
        }
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model_used = model;
        self
    }

    pub fn with_sources(mut self, sources: Vec<String>) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_output_files(mut self, files: Vec<OutputFile>) -> Self {
        self.output_files = files;
        self
    }

    pub fn with_request_type(mut self, request_type: Option<String>) -> Self {
        self.request_type = request_type;
        self
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }
}

/// Ordered, append-only list of messages for the active session.
///
/// The only other mutation is wholesale replacement when a session is
/// (re)loaded from the backend.
#[derive(Default, Clone, Debug)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, msg: Message) {
        self.messages.push(msg);
    }

    pub fn replace(&mut self, messages: Vec<Message>) {
        self.messages = messages;
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
