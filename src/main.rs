//! legal-chat-client - command line front end for the legal assistant
//!
//! Architecture:
//! - Main thread: drives the `ChatController` and prints results
//! - Backend thread: runs a Tokio runtime for the HTTP calls
//! - Communication via crossbeam channels

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use clap::{Parser, Subcommand};

use legal_chat_client::backend::HttpChatApi;
use legal_chat_client::config::{self, Settings};
use legal_chat_client::controller::ChatController;
use legal_chat_client::document::{classify, render_plain, RenderOptions};
use legal_chat_client::error::{ClientError, Result};
use legal_chat_client::export::{download_label, execute, DirectoryHost, ExportOutcome};
use legal_chat_client::logging::{init_tracing, Logger};
use legal_chat_client::protocol::Attachment;
use legal_chat_client::relative_time::format_relative;
use legal_chat_client::request::RequestOutcome;
use legal_chat_client::transcript::{Message, Role};
use legal_chat_client::validation::{attachment_mime, validate_api_base_url};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Chat service base URL (overrides the saved setting)
    #[arg(long)]
    api_url: Option<String>,

    /// Settings file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Disable ANSI styling in rendered replies
    #[arg(long)]
    plain: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Send a message and print the reply
    Send {
        /// Message text
        message: Vec<String>,

        /// Attach a .pdf, .txt, .doc or .docx file (repeatable)
        #[arg(short, long)]
        attach: Vec<PathBuf>,

        /// Continue an existing session
        #[arg(short, long)]
        session: Option<String>,

        /// Model id, e.g. claude-sonnet-4 or nova-pro
        #[arg(short, long)]
        model: Option<String>,

        /// Give up on the reply after this many seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Do not save exportable replies
        #[arg(long)]
        no_export: bool,
    },
    /// List stored sessions
    Sessions,
    /// Print one session's transcript
    History {
        session_id: String,
    },
    /// List available models
    Models,
    /// Store a bearer token in the OS keyring
    Login {
        #[arg(long)]
        token: String,
    },
    /// Remove the stored bearer token
    Logout,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut settings = match &cli.config {
        Some(path) => config::load_settings_from(path)?,
        None => config::load_settings().unwrap_or_default(),
    };
    if let Some(url) = &cli.api_url {
        settings.api_base_url = validate_api_base_url(url).map_err(ClientError::Config)?;
    }
    let render = RenderOptions {
        ansi: !cli.plain,
        ..RenderOptions::default()
    };

    match cli.command {
        Command::Login { token } => {
            config::save_auth_token(&settings.account, token.trim())?;
            println!("Token saved for account '{}'", settings.account);
            Ok(())
        }
        Command::Logout => {
            config::clear_auth_token(&settings.account)?;
            println!("Signed out");
            Ok(())
        }
        Command::Send {
            message,
            attach,
            session,
            model,
            timeout,
            no_export,
        } => {
            let mut controller = connect(&settings)?;
            if let Some(session) = session {
                controller.state.active_session = Some(session);
            }
            if let Some(model) = model {
                controller.set_model(&model);
            }
            for path in attach {
                let filename = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let bytes = fs::read(&path)?;
                let mime = attachment_mime(&filename);
                controller
                    .input
                    .add_attachment(Attachment::new(filename, mime, bytes))
                    .map_err(ClientError::Config)?;
            }
            controller.input.message_input = message.join(" ");

            send_and_wait(&mut controller, timeout.map(Duration::from_secs))?;

            let index = controller.state.transcript.len().saturating_sub(1);
            if let Some(reply) = controller.state.transcript.last() {
                print_message(reply, render);
            }
            if let Some(session) = &controller.state.active_session {
                eprintln!("session: {}", session);
            }
            if !no_export {
                export_reply(&controller, index, &settings);
            }
            Ok(())
        }
        Command::Sessions => {
            let mut controller = connect(&settings)?;
            controller.refresh_sessions();
            await_reply(&mut controller, &settings)?;
            let now = Utc::now();
            for (session, (title, when)) in controller
                .state
                .sessions
                .iter()
                .zip(controller.state.session_labels(now))
            {
                println!("{:<12} {:<40} {}", when, title, session.session_id);
            }
            Ok(())
        }
        Command::History { session_id } => {
            let mut controller = connect(&settings)?;
            controller.select_session(&session_id);
            await_reply(&mut controller, &settings)?;
            for message in controller.state.transcript.messages() {
                print_message(message, render);
            }
            Ok(())
        }
        Command::Models => {
            let mut controller = connect(&settings)?;
            controller.refresh_models();
            await_reply(&mut controller, &settings)?;
            for model in &controller.state.models {
                let marker = if model.id == controller.state.selected_model { "*" } else { " " };
                println!("{} {:<20} {}", marker, model.id, model.name);
            }
            Ok(())
        }
    }
}

fn connect(settings: &Settings) -> Result<ChatController> {
    let token = config::load_auth_token(&settings.account).unwrap_or_else(|e| {
        tracing::warn!("Could not read stored token: {}", e);
        None
    });
    let api = HttpChatApi::new(
        settings.api_base_url.clone(),
        token,
        Duration::from_secs(settings.request_timeout_secs),
    )?;
    let (controller, _backend) = ChatController::spawn(settings, Arc::new(api));
    Ok(match Logger::new() {
        Ok(logger) => controller.with_logger(logger),
        Err(e) => {
            tracing::warn!("Activity log disabled: {}", e);
            controller
        }
    })
}

fn send_and_wait(controller: &mut ChatController, timeout: Option<Duration>) -> Result<()> {
    controller
        .submit()
        .map_err(|e| ClientError::Config(e.to_string()))?;
    eprintln!("{}", controller.status_label());

    let deadline = timeout.map(|t| Instant::now() + t);
    while controller.is_sending() {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            controller.cancel();
            break;
        }
        controller.wait_for_events(Duration::from_millis(200));
    }

    match controller.last_outcome() {
        Some(RequestOutcome::Succeeded) => Ok(()),
        Some(RequestOutcome::Cancelled) => Err(ClientError::Backend("Timed out waiting for a reply".into())),
        Some(RequestOutcome::Failed(reason)) => Err(ClientError::Backend(reason.clone())),
        None => Err(ClientError::Backend("No reply".into())),
    }
}

/// Wait for the single reply to a fetch; surface it if it was an error.
fn await_reply(controller: &mut ChatController, settings: &Settings) -> Result<()> {
    let deadline = Instant::now() + Duration::from_secs(settings.request_timeout_secs);
    while Instant::now() < deadline {
        if controller.wait_for_events(Duration::from_millis(200)) > 0 {
            return match controller.state.status_messages.pop() {
                Some((msg, _)) => Err(ClientError::Backend(msg)),
                None => Ok(()),
            };
        }
    }
    Err(ClientError::Backend("Timed out waiting for the service".into()))
}

fn print_message(message: &Message, render: RenderOptions) {
    match message.role {
        Role::User => println!("> {}\n", message.content),
        Role::Assistant => {
            println!("{}", render_plain(&classify(&message.content), render));
            if !message.sources.is_empty() {
                println!("Sources: {}", message.sources.join(", "));
            }
            println!();
        }
    }
}

fn export_reply(controller: &ChatController, index: usize, settings: &Settings) {
    let Some(action) = controller.download_for(index) else {
        return;
    };
    let Some(message) = controller.state.transcript.messages().get(index) else {
        return;
    };
    let host = DirectoryHost::new(settings.download_dir());
    match execute(&action, &host) {
        Ok(ExportOutcome::Saved(path)) => {
            eprintln!("{}: saved to {}", download_label(message), path.display())
        }
        Ok(ExportOutcome::Opened(url)) => eprintln!("{}: {}", download_label(message), url),
        Err(e) => eprintln!("Export failed: {}", e),
    }
}
