use tokio_util::sync::CancellationToken;

use crate::backend::api::{ModelInfo, SendResponse, SessionSummary};
use crate::transcript::Message;

/// Identifies one logical send from the controller
pub type RequestId = u64;

/// A user-supplied file bundled with an outgoing message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(filename: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime: mime.into(),
            bytes,
        }
    }
}

/// Everything the service needs to answer one message
#[derive(Debug, Clone, PartialEq)]
pub struct SendRequest {
    pub message: String,
    /// None starts a new session
    pub session_id: Option<String>,
    pub model: String,
    pub user_instructions: String,
    pub attachments: Vec<Attachment>,
}

/// Actions sent from the controller to the Backend
#[derive(Debug, Clone)]
pub enum BackendAction {
    /// Send a message; abandon it when `cancel` fires
    SendMessage {
        request_id: RequestId,
        request: SendRequest,
        cancel: CancellationToken,
    },
    /// Reload the session list
    FetchSessions,
    /// Reload one session's transcript
    FetchTranscript(String),
    /// Reload the available models
    FetchModels,
}

/// Events sent from the Backend to the controller
#[derive(Debug, Clone)]
pub enum BackendEvent {
    /// The service answered (or the transport failed) for a send
    SendCompleted {
        request_id: RequestId,
        outcome: Result<SendResponse, String>,
    },
    /// The send was dropped after its token was cancelled
    SendAbandoned { request_id: RequestId },
    SessionsLoaded(Vec<SessionSummary>),
    TranscriptLoaded {
        session_id: String,
        messages: Vec<Message>,
    },
    ModelsLoaded(Vec<ModelInfo>),
    /// A background fetch failed
    Error(String),
}
