//! Integration tests for the request lifecycle
//!
//! These drive a `ChatController` over plain channel pairs, standing in for
//! the backend worker, to check the send/cancel/settle state machine, the
//! refreshes it triggers and the scroll policy it applies.

use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::backend::{ModelInfo, SendResponse};
use crate::config::Settings;
use crate::controller::ChatController;
use crate::error::SendRejected;
use crate::export::ExportAction;
use crate::protocol::{Attachment, BackendAction, BackendEvent};
use crate::request::{RequestOutcome, RequestPhase};
use crate::scroll::Viewport;
use crate::state::STATUS_MESSAGE_TTL_SECS;
use crate::transcript::{Message, OutputFile, Role};

struct Harness {
    controller: ChatController,
    action_rx: Receiver<BackendAction>,
    event_tx: Sender<BackendEvent>,
}

fn harness() -> Harness {
    let (action_tx, action_rx) = unbounded::<BackendAction>();
    let (event_tx, event_rx) = unbounded::<BackendEvent>();
    Harness {
        controller: ChatController::new(action_tx, event_rx, &Settings::default()),
        action_rx,
        event_tx,
    }
}

fn drain(rx: &Receiver<BackendAction>) -> Vec<BackendAction> {
    rx.try_iter().collect()
}

fn success(text: &str, session_id: &str) -> SendResponse {
    SendResponse {
        success: true,
        response: text.to_string(),
        session_id: Some(session_id.to_string()),
        model_used: Some("claude-sonnet-4".to_string()),
        ..SendResponse::default()
    }
}

fn complete(h: &mut Harness, request_id: u64, outcome: Result<SendResponse, String>) {
    h.event_tx
        .send(BackendEvent::SendCompleted {
            request_id,
            outcome,
        })
        .unwrap();
    h.controller.process_events();
}

fn pdf_attachment(name: &str) -> Attachment {
    Attachment::new(name, "application/pdf", b"%PDF-1.4".to_vec())
}

#[test]
fn test_send_dispatches_and_enters_sending() {
    let mut h = harness();
    let id = h.controller.send("What is a lease?", Vec::new()).unwrap();

    assert_eq!(h.controller.phase(), RequestPhase::Sending);
    assert_eq!(h.controller.status_label(), "Processing...");
    assert_eq!(h.controller.state.transcript.len(), 1);
    assert_eq!(h.controller.state.transcript.messages()[0].role, Role::User);
    assert!(h.controller.take_scroll_request());

    let actions = drain(&h.action_rx);
    assert_eq!(actions.len(), 1);
    match &actions[0] {
        BackendAction::SendMessage {
            request_id,
            request,
            cancel,
        } => {
            assert_eq!(*request_id, id);
            assert_eq!(request.message, "What is a lease?");
            assert_eq!(request.session_id, None);
            assert_eq!(request.model, "claude-sonnet-4");
            assert!(!cancel.is_cancelled());
        }
        other => panic!("unexpected action: {:?}", other),
    }
}

#[test]
fn test_status_label_reflects_request() {
    let mut h = harness();
    h.controller.send("Draft a rental agreement as PDF", Vec::new()).unwrap();
    assert_eq!(h.controller.status_label(), "Generating document...");
    h.controller.cancel();

    h.controller.send("Summarize fees in a table", Vec::new()).unwrap();
    assert_eq!(h.controller.status_label(), "Creating table...");
}

#[test]
fn test_send_while_sending_is_rejected() {
    let mut h = harness();
    h.controller.send("first", Vec::new()).unwrap();

    assert_eq!(
        h.controller.send("second", Vec::new()),
        Err(SendRejected::InFlight)
    );
    assert_eq!(h.controller.submit(), Err(SendRejected::InFlight));

    // Nothing about the rejected send leaked into state
    assert_eq!(h.controller.input.message_input, "first");
    assert_eq!(h.controller.state.transcript.len(), 1);
    assert_eq!(drain(&h.action_rx).len(), 1);
}

#[test]
fn test_empty_input_is_rejected() {
    let mut h = harness();
    assert_eq!(
        h.controller.send("  \n\t", Vec::new()),
        Err(SendRejected::EmptyInput)
    );
    assert_eq!(h.controller.phase(), RequestPhase::Idle);
    assert!(h.controller.state.transcript.is_empty());
    assert!(drain(&h.action_rx).is_empty());
}

#[test]
fn test_attachment_only_send() {
    let mut h = harness();
    h.controller
        .send("", vec![pdf_attachment("lease.pdf")])
        .unwrap();

    assert_eq!(h.controller.status_label(), "Analyzing files...");
    assert_eq!(
        h.controller.state.transcript.messages()[0].content,
        "Attached: lease.pdf"
    );
    match &drain(&h.action_rx)[0] {
        BackendAction::SendMessage { request, .. } => {
            assert_eq!(request.attachments.len(), 1);
            assert_eq!(request.attachments[0].filename, "lease.pdf");
        }
        other => panic!("unexpected action: {:?}", other),
    }
}

#[test]
fn test_cancel_without_request_is_noop() {
    let mut h = harness();
    assert!(!h.controller.cancel());
    assert_eq!(h.controller.phase(), RequestPhase::Idle);
    assert!(h.controller.last_outcome().is_none());
}

#[test]
fn test_late_response_after_cancel_is_ignored() {
    let mut h = harness();
    let id = h.controller.send("Draft an NDA", Vec::new()).unwrap();
    let token = match drain(&h.action_rx).remove(0) {
        BackendAction::SendMessage { cancel, .. } => cancel,
        other => panic!("unexpected action: {:?}", other),
    };

    assert!(h.controller.cancel());
    assert!(token.is_cancelled());
    assert_eq!(h.controller.phase(), RequestPhase::Idle);
    assert_eq!(h.controller.status_label(), "");
    assert!(h.controller.request_state().is_none());

    complete(&mut h, id, Ok(success("too late", "s1")));

    assert_eq!(h.controller.state.transcript.len(), 1);
    assert_eq!(h.controller.state.active_session, None);
    assert_eq!(h.controller.last_outcome(), Some(&RequestOutcome::Cancelled));
    // Cancellation is silent and suppresses refreshes
    assert!(h.controller.state.status_messages.is_empty());
    assert!(drain(&h.action_rx).is_empty());
}

#[test]
fn test_success_appends_reply_and_refreshes() {
    let mut h = harness();
    h.controller
        .send("Explain consideration", vec![pdf_attachment("contract.pdf")])
        .unwrap();
    let id = h.controller.request_state().map(|r| r.id).unwrap();
    drain(&h.action_rx);

    let mut response = success("Consideration is...", "session_42");
    response.sources = vec!["contract-act.pdf".into()];
    complete(&mut h, id, Ok(response));

    assert_eq!(h.controller.phase(), RequestPhase::Idle);
    assert_eq!(h.controller.status_label(), "");
    assert_eq!(h.controller.last_outcome(), Some(&RequestOutcome::Succeeded));

    let reply = h.controller.state.transcript.last().unwrap();
    assert_eq!(reply.role, Role::Assistant);
    assert_eq!(reply.content, "Consideration is...");
    assert_eq!(reply.sources, vec!["contract-act.pdf".to_string()]);

    assert_eq!(h.controller.state.active_session.as_deref(), Some("session_42"));
    assert!(h.controller.input.message_input.is_empty());
    assert!(h.controller.input.attachments.is_empty());

    let actions = drain(&h.action_rx);
    assert_eq!(actions.len(), 2);
    assert!(matches!(actions[0], BackendAction::FetchSessions));
    assert!(matches!(&actions[1], BackendAction::FetchTranscript(s) if s == "session_42"));
}

#[test]
fn test_follow_up_uses_adopted_session() {
    let mut h = harness();
    let id = h.controller.send("hello", Vec::new()).unwrap();
    complete(&mut h, id, Ok(success("hi", "s7")));
    drain(&h.action_rx);

    h.controller.send("and again", Vec::new()).unwrap();
    match &drain(&h.action_rx)[0] {
        BackendAction::SendMessage { request, .. } => {
            assert_eq!(request.session_id.as_deref(), Some("s7"));
        }
        other => panic!("unexpected action: {:?}", other),
    }
}

#[test]
fn test_failure_preserves_input() {
    let mut h = harness();
    h.controller.input.message_input = "Draft an NDA".into();
    h.controller
        .input
        .add_attachment(pdf_attachment("template.pdf"))
        .unwrap();
    let id = h.controller.submit().unwrap();

    complete(
        &mut h,
        id,
        Ok(SendResponse {
            success: false,
            error: Some("throttled".into()),
            ..SendResponse::default()
        }),
    );

    assert_eq!(h.controller.phase(), RequestPhase::Idle);
    assert_eq!(
        h.controller.last_outcome(),
        Some(&RequestOutcome::Failed("throttled".into()))
    );
    assert_eq!(h.controller.input.message_input, "Draft an NDA");
    assert_eq!(h.controller.input.attachments.len(), 1);
    assert_eq!(h.controller.state.status_messages.len(), 1);
    assert_eq!(h.controller.state.transcript.len(), 1);
}

#[test]
fn test_transport_error_fails_request() {
    let mut h = harness();
    let id = h.controller.send("hello", Vec::new()).unwrap();
    complete(&mut h, id, Err("Network error: connection refused".into()));

    assert!(matches!(
        h.controller.last_outcome(),
        Some(RequestOutcome::Failed(reason)) if reason.contains("connection refused")
    ));
    // The user can retry right away
    assert!(h.controller.submit().is_ok());
}

#[test]
fn test_mismatched_request_id_is_ignored() {
    let mut h = harness();
    let id = h.controller.send("hello", Vec::new()).unwrap();
    complete(&mut h, id + 99, Ok(success("not mine", "s1")));

    assert_eq!(h.controller.phase(), RequestPhase::Sending);
    assert_eq!(h.controller.state.transcript.len(), 1);
}

#[test]
fn test_backend_gone_fails_immediately() {
    let mut h = harness();
    drop(h.action_rx);

    assert!(h.controller.send("hello", Vec::new()).is_ok());
    assert_eq!(h.controller.phase(), RequestPhase::Idle);
    assert!(matches!(
        h.controller.last_outcome(),
        Some(RequestOutcome::Failed(_))
    ));
    assert_eq!(h.controller.input.message_input, "hello");
}

#[test]
fn test_own_send_scrolls_but_reply_respects_position() {
    let mut h = harness();
    // Scrolled well up into history
    h.controller
        .observe_viewport(Viewport::new(0.0, 600.0, 4000.0));

    let id = h.controller.send("hello", Vec::new()).unwrap();
    assert!(h.controller.take_scroll_request());

    complete(&mut h, id, Ok(success("hi", "s1")));
    assert!(!h.controller.take_scroll_request());
}

#[test]
fn test_reply_scrolls_when_near_bottom() {
    let mut h = harness();
    h.controller
        .observe_viewport(Viewport::new(3350.0, 600.0, 4000.0));

    let id = h.controller.send("hello", Vec::new()).unwrap();
    assert!(h.controller.take_scroll_request());

    complete(&mut h, id, Ok(success("hi", "s1")));
    assert!(h.controller.take_scroll_request());
}

#[test]
fn test_refreshed_transcript_keeps_output_files() {
    let mut h = harness();
    let id = h.controller.send("Draft a lease as PDF", Vec::new()).unwrap();
    let mut response = success("LEASE AGREEMENT", "s1");
    response.request_type = Some("document".into());
    response.output_files = vec![OutputFile {
        title: Some("Lease".into()),
        file_type: "pdf".into(),
        filename: String::new(),
        content: None,
        url: Some("https://bucket/lease.pdf".into()),
    }];
    complete(&mut h, id, Ok(response));

    let now = chrono::Utc::now();
    let stored = vec![
        Message::user("Draft a lease as PDF", now),
        Message::assistant("LEASE AGREEMENT", now).with_request_type(Some("document".into())),
    ];
    h.event_tx
        .send(BackendEvent::TranscriptLoaded {
            session_id: "s1".into(),
            messages: stored,
        })
        .unwrap();
    h.controller.process_events();

    let messages = h.controller.state.transcript.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].output_files.len(), 1);
    assert!(matches!(
        h.controller.download_for(1),
        Some(ExportAction::OpenExisting(_))
    ));
}

#[test]
fn test_transcript_for_other_session_is_ignored() {
    let mut h = harness();
    h.controller.select_session("s1");
    h.event_tx
        .send(BackendEvent::TranscriptLoaded {
            session_id: "s2".into(),
            messages: vec![Message::user("elsewhere", chrono::Utc::now())],
        })
        .unwrap();
    h.controller.process_events();
    assert!(h.controller.state.transcript.is_empty());
}

#[test]
fn test_select_session_loads_transcript() {
    let mut h = harness();
    assert!(h.controller.select_session("s1"));
    assert!(h.controller.take_scroll_request());
    assert!(matches!(
        &drain(&h.action_rx)[0],
        BackendAction::FetchTranscript(s) if s == "s1"
    ));

    h.event_tx
        .send(BackendEvent::TranscriptLoaded {
            session_id: "s1".into(),
            messages: vec![Message::user("stored question", chrono::Utc::now())],
        })
        .unwrap();
    h.controller.process_events();
    assert_eq!(h.controller.state.transcript.len(), 1);
}

#[test]
fn test_session_switch_refused_while_sending() {
    let mut h = harness();
    h.controller.send("hello", Vec::new()).unwrap();
    assert!(!h.controller.select_session("s1"));
    assert!(!h.controller.new_session());
    assert_eq!(h.controller.state.transcript.len(), 1);
}

#[test]
fn test_new_session_clears_conversation() {
    let mut h = harness();
    let id = h.controller.send("hello", Vec::new()).unwrap();
    complete(&mut h, id, Ok(success("hi", "s1")));

    assert!(h.controller.new_session());
    assert!(h.controller.state.transcript.is_empty());
    assert_eq!(h.controller.state.active_session, None);
}

#[test]
fn test_models_and_selection() {
    let mut h = harness();
    h.controller.refresh_models();
    assert!(matches!(drain(&h.action_rx)[0], BackendAction::FetchModels));

    h.event_tx
        .send(BackendEvent::ModelsLoaded(vec![
            ModelInfo {
                id: "claude-sonnet-4".into(),
                name: "Claude Sonnet 4".into(),
            },
            ModelInfo {
                id: "nova-pro".into(),
                name: "Nova Pro".into(),
            },
        ]))
        .unwrap();
    h.controller.process_events();

    assert!(h.controller.set_model("nova-pro"));
    assert!(!h.controller.set_model("gpt-unknown"));
    assert_eq!(h.controller.state.selected_model, "nova-pro");
}

#[test]
fn test_fetch_error_becomes_status_message() {
    let mut h = harness();
    h.event_tx
        .send(BackendEvent::Error("Failed to load sessions: timeout".into()))
        .unwrap();
    assert_eq!(h.controller.process_events(), 1);
    assert_eq!(h.controller.state.status_messages.len(), 1);
    assert_eq!(h.controller.phase(), RequestPhase::Idle);
}

#[test]
fn test_expired_status_messages_are_dropped_on_drain() {
    let mut h = harness();
    let stale = Instant::now()
        .checked_sub(Duration::from_secs(STATUS_MESSAGE_TTL_SECS + 1))
        .expect("clock too close to boot");
    h.controller
        .state
        .status_messages
        .push(("Failed to load models: timeout".into(), stale));

    h.event_tx
        .send(BackendEvent::Error("Failed to load sessions: timeout".into()))
        .unwrap();
    assert_eq!(h.controller.process_events(), 1);

    let messages: Vec<&str> = h
        .controller
        .state
        .status_messages
        .iter()
        .map(|(m, _)| m.as_str())
        .collect();
    assert_eq!(messages, vec!["Failed to load sessions: timeout"]);
}

#[test]
fn test_long_agreement_reply_is_exportable() {
    let mut h = harness();
    let id = h.controller.send("Draft a services agreement", Vec::new()).unwrap();
    let body = format!("SERVICES AGREEMENT\n{}", "1. The parties agree to terms.\n".repeat(50));
    complete(&mut h, id, Ok(success(&body, "s1")));

    assert!(h.controller.download_for(0).is_none());
    assert!(matches!(
        h.controller.download_for(1),
        Some(ExportAction::SynthesizeAndSave { .. })
    ));
}
