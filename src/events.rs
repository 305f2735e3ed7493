//! Backend event processing (send completions, session and model refreshes).

use chrono::Utc;

use crate::backend::SendResponse;
use crate::controller::ChatController;
use crate::logging::ActivityKind;
use crate::protocol::{BackendAction, BackendEvent, RequestId};
use crate::request::RequestOutcome;
use crate::scroll::ContentChange;
use crate::state::STATUS_MESSAGE_TTL_SECS;
use crate::transcript::Message;

impl ChatController {
    /// Process all pending events from the backend. Returns how many were handled.
    pub fn process_events(&mut self) -> usize {
        self.state.purge_old_status_messages(STATUS_MESSAGE_TTL_SECS);

        let mut handled = 0;
        // Drain all pending events from the backend
        while let Ok(event) = self.event_rx.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    pub(crate) fn handle_event(&mut self, event: BackendEvent) {
        match event {
            BackendEvent::SendCompleted {
                request_id,
                outcome,
            } => {
                if !self.is_live(request_id) {
                    tracing::debug!(request_id, "ignoring stale completion");
                    return;
                }
                match outcome {
                    Ok(response) if response.success => self.complete(response),
                    Ok(response) => self.fail(
                        response
                            .error
                            .unwrap_or_else(|| "The service did not return a response".into()),
                    ),
                    Err(e) => self.fail(e),
                }
            }

            BackendEvent::SendAbandoned { request_id } => {
                // cancel() already settled the request
                tracing::debug!(request_id, "backend abandoned send");
            }

            BackendEvent::SessionsLoaded(sessions) => {
                tracing::debug!("loaded {} sessions", sessions.len());
                self.state.sessions = sessions;
            }

            BackendEvent::TranscriptLoaded {
                session_id,
                messages,
            } => {
                if !self.state.is_active(&session_id) || self.is_sending() {
                    tracing::debug!(%session_id, "ignoring transcript for inactive session");
                    return;
                }
                self.replace_transcript(messages);
            }

            BackendEvent::ModelsLoaded(models) => {
                self.state.set_models(models);
            }

            BackendEvent::Error(msg) => {
                tracing::warn!("{}", msg);
                self.state.push_status(msg);
            }
        }
    }

    fn is_live(&self, request_id: RequestId) -> bool {
        self.request
            .as_ref()
            .is_some_and(|r| r.accepts(request_id))
    }

    fn complete(&mut self, response: SendResponse) {
        let id = self.request.as_ref().map_or(0, |r| r.id);

        let message = Message::assistant(response.response, Utc::now())
            .with_model(response.model_used)
            .with_sources(response.sources)
            .with_output_files(response.output_files)
            .with_request_type(response.request_type);
        self.state.transcript.push(message);
        self.scroll.on_content_change(ContentChange::Incoming);

        if let Some(session_id) = response.session_id {
            self.state.active_session = Some(session_id);
        }
        self.input.clear();

        tracing::info!(request_id = id, "response received");
        self.log_activity(ActivityKind::Succeeded, format!("request {}", id));
        self.settle(RequestOutcome::Succeeded);

        self.dispatch(BackendAction::FetchSessions);
        if let Some(session_id) = self.state.active_session.clone() {
            self.dispatch(BackendAction::FetchTranscript(session_id));
        }
    }

    /// Swap in the stored transcript.
    ///
    /// Stored history does not carry output files, so they are carried over
    /// from the local copy of the same message.
    fn replace_transcript(&mut self, mut messages: Vec<Message>) {
        let previous = self.state.transcript.messages();
        for message in messages.iter_mut().filter(|m| m.output_files.is_empty()) {
            if let Some(local) = previous
                .iter()
                .find(|p| p.role == message.role && p.content == message.content)
            {
                message.output_files = local.output_files.clone();
            }
        }

        let grew = messages.len() > previous.len();
        self.state.transcript.replace(messages);
        if grew {
            self.scroll.on_content_change(ContentChange::Incoming);
        }
    }
}
