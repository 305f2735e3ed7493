//! Action dispatch for the backend worker
//!
//! Each action runs as its own task so a slow send never blocks session or
//! model refreshes.

use std::sync::Arc;

use crossbeam_channel::Sender;

use super::api::ChatApi;
use crate::protocol::{BackendAction, BackendEvent};

/// Spawn the work for one action onto the current runtime.
pub fn handle_backend_action(
    action: BackendAction,
    api: &Arc<dyn ChatApi>,
    event_tx: &Sender<BackendEvent>,
) {
    let api = Arc::clone(api);
    let event_tx = event_tx.clone();

    match action {
        BackendAction::SendMessage {
            request_id,
            request,
            cancel,
        } => {
            tokio::spawn(async move {
                let event = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        tracing::debug!(request_id, "send abandoned");
                        BackendEvent::SendAbandoned { request_id }
                    }
                    result = api.send_message(request) => BackendEvent::SendCompleted {
                        request_id,
                        outcome: result.map_err(|e| e.to_string()),
                    },
                };
                let _ = event_tx.send(event);
            });
        }
        BackendAction::FetchSessions => {
            tokio::spawn(async move {
                let event = match api.list_sessions().await {
                    Ok(sessions) => BackendEvent::SessionsLoaded(sessions),
                    Err(e) => BackendEvent::Error(format!("Failed to load sessions: {}", e)),
                };
                let _ = event_tx.send(event);
            });
        }
        BackendAction::FetchTranscript(session_id) => {
            tokio::spawn(async move {
                let event = match api.session_messages(&session_id).await {
                    Ok(messages) => BackendEvent::TranscriptLoaded {
                        session_id,
                        messages,
                    },
                    Err(e) => BackendEvent::Error(format!("Failed to load conversation: {}", e)),
                };
                let _ = event_tx.send(event);
            });
        }
        BackendAction::FetchModels => {
            tokio::spawn(async move {
                let event = match api.list_models().await {
                    Ok(models) => BackendEvent::ModelsLoaded(models),
                    Err(e) => BackendEvent::Error(format!("Failed to load models: {}", e)),
                };
                let _ = event_tx.send(event);
            });
        }
    }
}
