//! Session data owned by the controller, separated from request handling.

use std::time::Instant;

use chrono::{DateTime, Utc};

use crate::backend::{ModelInfo, SessionSummary};
use crate::relative_time::format_relative;
use crate::transcript::Transcript;

/// Status messages older than this are dropped on the next event drain.
pub const STATUS_MESSAGE_TTL_SECS: u64 = 30;

/// Oldest status messages are discarded beyond this many.
pub const MAX_STATUS_MESSAGES: usize = 20;

#[derive(Debug)]
pub struct ClientState {
    /// Messages of the active session
    pub transcript: Transcript,

    /// Known sessions, most recent first as the service returns them
    pub sessions: Vec<SessionSummary>,

    /// None until the service assigns an id to a new conversation
    pub active_session: Option<String>,

    pub models: Vec<ModelInfo>,

    pub selected_model: String,

    /// Inline status messages with creation time (auto-expire).
    pub status_messages: Vec<(String, Instant)>,
}

impl ClientState {
    pub fn new(selected_model: impl Into<String>) -> Self {
        Self {
            transcript: Transcript::new(),
            sessions: Vec::new(),
            active_session: None,
            models: Vec::new(),
            selected_model: selected_model.into(),
            status_messages: Vec::new(),
        }
    }

    pub fn push_status(&mut self, message: impl Into<String>) {
        self.status_messages.push((message.into(), Instant::now()));
        let excess = self.status_messages.len().saturating_sub(MAX_STATUS_MESSAGES);
        self.status_messages.drain(..excess);
    }

    /// Purge status messages older than the given duration.
    pub fn purge_old_status_messages(&mut self, max_age_secs: u64) {
        self.status_messages
            .retain(|(_, created)| created.elapsed().as_secs() < max_age_secs);
    }

    /// Adopt a freshly loaded model list, keeping the selection valid.
    pub fn set_models(&mut self, models: Vec<ModelInfo>) {
        if !models.is_empty() && !models.iter().any(|m| m.id == self.selected_model) {
            self.selected_model = models[0].id.clone();
        }
        self.models = models;
    }

    pub fn is_active(&self, session_id: &str) -> bool {
        self.active_session.as_deref() == Some(session_id)
    }

    /// `(title, relative date)` rows for the session list.
    pub fn session_labels(&self, now: DateTime<Utc>) -> Vec<(String, String)> {
        self.sessions
            .iter()
            .map(|s| {
                let title = if s.title.trim().is_empty() {
                    s.last_message.clone()
                } else {
                    s.title.clone()
                };
                (title, format_relative(&s.timestamp, &now))
            })
            .collect()
    }
}
