use crossbeam_channel::{Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

use super::api::ChatApi;
use super::handlers::handle_backend_action;
use crate::protocol::{BackendAction, BackendEvent};

/// How long the loop idles when no action is queued
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Run the backend worker until the controller drops its action sender.
///
/// Blocks the calling thread; spawn it on a dedicated thread.
pub fn run_backend(
    action_rx: Receiver<BackendAction>,
    event_tx: Sender<BackendEvent>,
    api: Arc<dyn ChatApi>,
) {
    // Create a Tokio runtime for this thread
    let rt = match Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            let _ = event_tx.send(BackendEvent::Error(format!(
                "Failed to create Tokio runtime: {}",
                e
            )));
            return;
        }
    };

    rt.block_on(async move {
        loop {
            match action_rx.try_recv() {
                Ok(action) => handle_backend_action(action, &api, &event_tx),
                Err(TryRecvError::Empty) => tokio::time::sleep(POLL_INTERVAL).await,
                Err(TryRecvError::Disconnected) => {
                    tracing::debug!("controller gone, backend exiting");
                    break;
                }
            }
        }
    });
}
