//! Request lifecycle controller.
//!
//! `ChatController` is the single owner of the transcript, the composition
//! buffer and the at-most-one outstanding request. It runs on the caller's
//! thread; the network work happens on the backend worker, reached through
//! the crossbeam channel pair in [`crate::protocol`].

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::Utc;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};

use crate::backend::{run_backend, ChatApi};
use crate::config::Settings;
use crate::error::SendRejected;
use crate::export::{prepare_download, ExportAction, ExportPolicy};
use crate::input_state::InputState;
use crate::logging::{ActivityEntry, ActivityKind, Logger};
use crate::protocol::{Attachment, BackendAction, BackendEvent, RequestId, SendRequest};
use crate::request::{status_label_for, RequestOutcome, RequestPhase, RequestState};
use crate::scroll::{ContentChange, ScrollTracker, Viewport};
use crate::state::ClientState;
use crate::transcript::Message;

pub struct ChatController {
    pub state: ClientState,
    pub input: InputState,
    pub(crate) request: Option<RequestState>,
    pub(crate) last_outcome: Option<RequestOutcome>,
    pub(crate) scroll: ScrollTracker,
    pub(crate) action_tx: Sender<BackendAction>,
    pub(crate) event_rx: Receiver<BackendEvent>,
    pub(crate) logger: Option<Logger>,
    next_request_id: RequestId,
    export_policy: ExportPolicy,
}

impl ChatController {
    pub fn new(
        action_tx: Sender<BackendAction>,
        event_rx: Receiver<BackendEvent>,
        settings: &Settings,
    ) -> Self {
        Self {
            state: ClientState::new(settings.default_model.clone()),
            input: InputState::with_instructions(settings.user_instructions.clone()),
            request: None,
            last_outcome: None,
            scroll: ScrollTracker::new(settings.scroll_threshold_px),
            action_tx,
            event_rx,
            logger: None,
            next_request_id: 1,
            export_policy: settings.export.clone(),
        }
    }

    /// Start a backend worker thread for `api` and connect a controller to it.
    ///
    /// The worker exits once the controller is dropped.
    pub fn spawn(settings: &Settings, api: Arc<dyn ChatApi>) -> (Self, JoinHandle<()>) {
        let (action_tx, action_rx) = unbounded::<BackendAction>();
        let (event_tx, event_rx) = unbounded::<BackendEvent>();

        let handle = thread::spawn(move || {
            run_backend(action_rx, event_tx, api);
        });

        (Self::new(action_tx, event_rx, settings), handle)
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Replace the composition buffer with `text` and `attachments`, then submit.
    ///
    /// An in-flight send is rejected before the buffer is touched.
    pub fn send(
        &mut self,
        text: impl Into<String>,
        attachments: Vec<Attachment>,
    ) -> Result<RequestId, SendRejected> {
        if self.request.is_some() {
            return Err(SendRejected::InFlight);
        }
        self.input.message_input = text.into();
        self.input.attachments = attachments;
        self.submit()
    }

    /// Send whatever is in the composition buffer.
    pub fn submit(&mut self) -> Result<RequestId, SendRejected> {
        if self.request.is_some() {
            return Err(SendRejected::InFlight);
        }
        if !self.input.has_content() {
            return Err(SendRejected::EmptyInput);
        }

        let text = self.input.message_input.trim().to_string();
        let has_attachments = !self.input.attachments.is_empty();
        let id = self.next_request_id;
        self.next_request_id += 1;

        let request = RequestState::sending(id, status_label_for(&text, has_attachments));
        let cancel = request.cancel_token.clone();
        self.request = Some(request);
        self.last_outcome = None;

        let echo = self.echo_text(&text);
        self.state.transcript.push(Message::user(echo, Utc::now()));
        self.scroll.on_content_change(ContentChange::LocalSend);

        let outgoing = SendRequest {
            message: text,
            session_id: self.state.active_session.clone(),
            model: self.state.selected_model.clone(),
            user_instructions: self.input.user_instructions.clone(),
            attachments: self.input.attachments.clone(),
        };
        tracing::info!(
            request_id = id,
            attachments = outgoing.attachments.len(),
            model = %outgoing.model,
            "sending message"
        );
        self.log_activity(ActivityKind::Sent, format!("request {}", id));

        let action = BackendAction::SendMessage {
            request_id: id,
            request: outgoing,
            cancel,
        };
        if self.action_tx.send(action).is_err() {
            self.fail("Backend is not running".to_string());
        }
        Ok(id)
    }

    /// Text of the local echo; attachment-only sends list the files.
    fn echo_text(&self, text: &str) -> String {
        if !text.is_empty() {
            return text.to_string();
        }
        let names: Vec<&str> = self
            .input
            .attachments
            .iter()
            .map(|a| a.filename.as_str())
            .collect();
        format!("Attached: {}", names.join(", "))
    }

    /// Abandon the outstanding send. Returns false when nothing was in flight.
    pub fn cancel(&mut self) -> bool {
        let Some(request) = self.request.take() else {
            return false;
        };
        request.cancel_token.cancel();
        tracing::info!(request_id = request.id, "send cancelled");
        self.log_activity(ActivityKind::Cancelled, format!("request {}", request.id));
        self.last_outcome = Some(RequestOutcome::Cancelled);
        true
    }

    pub fn phase(&self) -> RequestPhase {
        self.request
            .as_ref()
            .map_or(RequestPhase::Idle, |r| r.phase)
    }

    pub fn request_state(&self) -> Option<&RequestState> {
        self.request.as_ref()
    }

    /// Progress label for the outstanding send, empty when idle.
    pub fn status_label(&self) -> &'static str {
        self.request.as_ref().map_or("", |r| r.status_label)
    }

    pub fn is_sending(&self) -> bool {
        self.request.is_some()
    }

    /// How the most recent request settled.
    pub fn last_outcome(&self) -> Option<&RequestOutcome> {
        self.last_outcome.as_ref()
    }

    pub fn observe_viewport(&mut self, viewport: Viewport) {
        self.scroll.observe(viewport);
    }

    pub fn take_scroll_request(&mut self) -> bool {
        self.scroll.take_scroll_request()
    }

    /// Switch to a stored session. Refused while a send is outstanding.
    pub fn select_session(&mut self, session_id: &str) -> bool {
        if self.is_sending() {
            return false;
        }
        self.state.active_session = Some(session_id.to_string());
        self.state.transcript.clear();
        self.scroll.reset();
        self.dispatch(BackendAction::FetchTranscript(session_id.to_string()));
        true
    }

    /// Start a fresh conversation; the service assigns the id on first send.
    pub fn new_session(&mut self) -> bool {
        if self.is_sending() {
            return false;
        }
        self.state.active_session = None;
        self.state.transcript.clear();
        self.scroll.reset();
        true
    }

    pub fn refresh_sessions(&mut self) {
        self.dispatch(BackendAction::FetchSessions);
    }

    pub fn refresh_models(&mut self) {
        self.dispatch(BackendAction::FetchModels);
    }

    /// Choose the model for later sends; unknown ids are refused once a list is loaded.
    pub fn set_model(&mut self, model_id: &str) -> bool {
        if !self.state.models.is_empty() && !self.state.models.iter().any(|m| m.id == model_id) {
            return false;
        }
        self.state.selected_model = model_id.to_string();
        true
    }

    /// Export action for the transcript message at `index`, if it has one.
    pub fn download_for(&self, index: usize) -> Option<ExportAction> {
        self.state
            .transcript
            .messages()
            .get(index)
            .and_then(|m| prepare_download(m, &self.export_policy))
    }

    /// Block up to `timeout` for the next backend event, then drain the rest.
    pub fn wait_for_events(&mut self, timeout: Duration) -> usize {
        match self.event_rx.recv_timeout(timeout) {
            Ok(event) => {
                self.handle_event(event);
                1 + self.process_events()
            }
            Err(RecvTimeoutError::Timeout) => 0,
            Err(RecvTimeoutError::Disconnected) => {
                if self.is_sending() {
                    self.fail("Backend stopped".to_string());
                }
                0
            }
        }
    }

    pub(crate) fn dispatch(&mut self, action: BackendAction) {
        if self.action_tx.send(action).is_err() {
            tracing::warn!("backend channel closed");
            self.state.push_status("Backend is not running");
        }
    }

    /// Settle the live request as failed; input is left as typed.
    pub(crate) fn fail(&mut self, reason: String) {
        let id = self.request.as_ref().map_or(0, |r| r.id);
        tracing::warn!(request_id = id, "send failed: {}", reason);
        self.log_activity(ActivityKind::Failed, format!("request {}: {}", id, reason));
        self.state.push_status(format!("Failed to send message: {}", reason));
        self.settle(RequestOutcome::Failed(reason));
    }

    pub(crate) fn settle(&mut self, outcome: RequestOutcome) {
        self.request = None;
        self.last_outcome = Some(outcome);
    }

    pub(crate) fn log_activity(&self, kind: ActivityKind, detail: String) {
        if let Some(logger) = &self.logger {
            logger.log(ActivityEntry::now(
                self.state.active_session.as_deref(),
                kind,
                detail,
            ));
        }
    }
}
