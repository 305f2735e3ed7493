//! State of the one outstanding send.

use tokio_util::sync::CancellationToken;

use crate::protocol::RequestId;

pub const STATUS_ANALYZING_FILES: &str = "Analyzing files...";
pub const STATUS_GENERATING_DOCUMENT: &str = "Generating document...";
pub const STATUS_CREATING_TABLE: &str = "Creating table...";
pub const STATUS_PROCESSING: &str = "Processing...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPhase {
    Idle,
    Sending,
    Cancelled,
    Succeeded,
    Failed,
}

/// How the last request settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    Succeeded,
    Cancelled,
    Failed(String),
}

impl RequestOutcome {
    pub fn phase(&self) -> RequestPhase {
        match self {
            RequestOutcome::Succeeded => RequestPhase::Succeeded,
            RequestOutcome::Cancelled => RequestPhase::Cancelled,
            RequestOutcome::Failed(_) => RequestPhase::Failed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequestState {
    pub id: RequestId,
    pub phase: RequestPhase,
    pub status_label: &'static str,
    pub cancel_token: CancellationToken,
}

impl RequestState {
    pub fn sending(id: RequestId, status_label: &'static str) -> Self {
        Self {
            id,
            phase: RequestPhase::Sending,
            status_label,
            cancel_token: CancellationToken::new(),
        }
    }

    /// A completion for `id` still matters to this request.
    pub fn accepts(&self, id: RequestId) -> bool {
        self.id == id && self.phase == RequestPhase::Sending && !self.cancel_token.is_cancelled()
    }
}

/// Pick the progress label shown while a send is outstanding.
pub fn status_label_for(input: &str, has_attachments: bool) -> &'static str {
    if has_attachments {
        return STATUS_ANALYZING_FILES;
    }
    let lower = input.to_lowercase();
    if lower.contains("pdf") || lower.contains("document") {
        STATUS_GENERATING_DOCUMENT
    } else if lower.contains("table") {
        STATUS_CREATING_TABLE
    } else {
        STATUS_PROCESSING
    }
}
