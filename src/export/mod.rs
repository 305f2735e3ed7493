//! Downloadable artifacts derived from assistant messages.
//!
//! [`prepare_download`] decides *what* to export for a message without doing
//! any work; [`materialize`] turns that decision into bytes (or a URL to hand
//! off), and [`host::execute`] delivers it.

pub mod host;
pub mod pdf;
pub mod table;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ExportError;
use crate::transcript::{Message, OutputFile};

pub use host::{execute, DirectoryHost, ExportHost, ExportOutcome};

pub const FILL_FORM_REQUEST: &str = "fill_form";
pub const TABLE_REQUEST: &str = "table";

pub const FILL_FORM_LABEL: &str = "Download Filled Form";
pub const DOCUMENT_LABEL: &str = "Download Document";

const PDF_MIME: &str = "application/pdf";
const CSV_MIME: &str = "text/csv";
const TEXT_MIME: &str = "text/plain";

/// Lead-ins the assistant puts before a drafted document.
const BOILERPLATE_PREFIXES: &[&str] = &[
    "Here is your legal document:",
    "Here is the legal document:",
    "Here is your document:",
    "Here is the document:",
];

/// When a message qualifies for auto-export.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ExportPolicy {
    /// Content longer than this many characters is exportable
    pub length_threshold: usize,
    /// Case-insensitive keywords signalling a document
    pub keywords: Vec<String>,
    /// Request types that always produce a document
    pub document_request_types: Vec<String>,
}

impl Default for ExportPolicy {
    fn default() -> Self {
        Self {
            length_threshold: 1000,
            keywords: ["pdf", "agreement", "contract", "petition", "document"]
                .into_iter()
                .map(String::from)
                .collect(),
            document_request_types: vec!["document".into(), FILL_FORM_REQUEST.into()],
        }
    }
}

/// What a download of a message amounts to.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportAction {
    /// The backend already hosts the file; hand the URL to the host.
    OpenExisting(OutputFile),
    /// The backend sent the file inline as base64. `index` is the file's
    /// position in the message, used to name files the backend left unnamed.
    DecodeAndSave { file: OutputFile, index: usize },
    /// Pipe-delimited table in the reply, exported as CSV.
    SynthesizeTable {
        text: String,
        timestamp: DateTime<Utc>,
    },
    /// Build a paginated document from the reply text.
    SynthesizeAndSave {
        text: String,
        timestamp: DateTime<Utc>,
    },
}

/// A materialized export, ready for the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    Open(String),
    File {
        filename: String,
        mime: String,
        bytes: Vec<u8>,
    },
}

/// Whether an assistant message should offer (or trigger) a download.
pub fn is_export_eligible(message: &Message, policy: &ExportPolicy) -> bool {
    if !message.is_assistant() {
        return false;
    }
    if !message.output_files.is_empty() {
        return true;
    }
    if message.content.chars().count() > policy.length_threshold {
        return true;
    }
    let lower = message.content.to_lowercase();
    if policy
        .keywords
        .iter()
        .any(|k| lower.contains(&k.to_lowercase()))
    {
        return true;
    }
    message
        .request_type
        .as_deref()
        .is_some_and(|rt| policy.document_request_types.iter().any(|d| d == rt))
}

/// Decide how a message would be downloaded, if at all.
pub fn prepare_download(message: &Message, policy: &ExportPolicy) -> Option<ExportAction> {
    if !message.is_assistant() {
        return None;
    }

    let usable = message
        .output_files
        .iter()
        .enumerate()
        .find(|(_, f)| f.url.is_some() || f.content.is_some());
    if let Some((index, file)) = usable {
        return Some(if file.url.is_some() {
            ExportAction::OpenExisting(file.clone())
        } else {
            ExportAction::DecodeAndSave {
                file: file.clone(),
                index,
            }
        });
    }

    if message.request_type.as_deref() == Some(TABLE_REQUEST)
        && table::has_table_rows(&message.content)
    {
        return Some(ExportAction::SynthesizeTable {
            text: message.content.clone(),
            timestamp: message.timestamp,
        });
    }

    if is_export_eligible(message, policy) {
        return Some(ExportAction::SynthesizeAndSave {
            text: message.content.clone(),
            timestamp: message.timestamp,
        });
    }
    None
}

/// Button label for a message's download.
pub fn download_label(message: &Message) -> &'static str {
    if message.request_type.as_deref() == Some(FILL_FORM_REQUEST) {
        FILL_FORM_LABEL
    } else {
        DOCUMENT_LABEL
    }
}

/// Turn an action into an artifact.
///
/// Document synthesis never fails: when a paginated document can't be
/// produced the cleaned text is saved as `.txt` instead.
pub fn materialize(action: &ExportAction) -> Result<Artifact, ExportError> {
    match action {
        ExportAction::OpenExisting(file) => file
            .url
            .clone()
            .map(Artifact::Open)
            .ok_or(ExportError::MissingPayload),
        ExportAction::DecodeAndSave { file, index } => {
            let payload = file.content.as_deref().ok_or(ExportError::MissingPayload)?;
            let bytes = STANDARD.decode(payload.trim())?;
            let mime = if file.file_type == "pdf" {
                PDF_MIME
            } else {
                CSV_MIME
            };
            Ok(Artifact::File {
                filename: file.effective_filename(*index),
                mime: mime.to_string(),
                bytes,
            })
        }
        ExportAction::SynthesizeTable { text, timestamp } => Ok(Artifact::File {
            filename: export_filename("legal_table", timestamp, "csv"),
            mime: CSV_MIME.to_string(),
            bytes: table::to_csv(&table::extract_rows(text)).into_bytes(),
        }),
        ExportAction::SynthesizeAndSave { text, timestamp } => {
            Ok(synthesize_document(text, timestamp, pdf::render_document))
        }
    }
}

/// Build the document artifact with `render`, saving the cleaned text as
/// `.txt` when rendering fails.
fn synthesize_document<F>(text: &str, timestamp: &DateTime<Utc>, render: F) -> Artifact
where
    F: FnOnce(&str) -> Result<Vec<u8>, ExportError>,
{
    match render(strip_boilerplate_prefix(text)) {
        Ok(bytes) => Artifact::File {
            filename: export_filename("legal_document", timestamp, "pdf"),
            mime: PDF_MIME.to_string(),
            bytes,
        },
        Err(e) => {
            tracing::debug!("Falling back to plain text export: {}", e);
            Artifact::File {
                filename: export_filename("legal_document", timestamp, "txt"),
                mime: TEXT_MIME.to_string(),
                bytes: clean_document_text(text).into_bytes(),
            }
        }
    }
}

/// `<stem>_<epoch-millis>.<ext>`
pub fn export_filename(stem: &str, timestamp: &DateTime<Utc>, ext: &str) -> String {
    format!("{}_{}.{}", stem, timestamp.timestamp_millis(), ext)
}

/// Drop a leading assistant lead-in such as "Here is your document:".
pub fn strip_boilerplate_prefix(text: &str) -> &str {
    let trimmed = text.trim_start();
    for prefix in BOILERPLATE_PREFIXES {
        if trimmed
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
        {
            return trimmed[prefix.len()..].trim_start();
        }
    }
    trimmed
}

/// Text suitable for a plain export: lead-in and block markup removed.
pub fn clean_document_text(text: &str) -> String {
    strip_boilerplate_prefix(text)
        .chars()
        .filter(|c| !matches!(c, '*' | '#'))
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_123).unwrap()
    }

    fn assistant(content: &str) -> Message {
        Message::assistant(content, ts())
    }

    fn file(url: Option<&str>, content: Option<&str>, file_type: &str) -> OutputFile {
        OutputFile {
            title: None,
            file_type: file_type.into(),
            filename: format!("out.{}", file_type),
            content: content.map(String::from),
            url: url.map(String::from),
        }
    }

    #[test]
    fn test_url_output_file_opens_existing() {
        let msg = assistant("see file").with_output_files(vec![file(Some("https://x"), None, "pdf")]);
        let action = prepare_download(&msg, &ExportPolicy::default()).unwrap();
        assert!(matches!(action, ExportAction::OpenExisting(ref f) if f.url.as_deref() == Some("https://x")));
        assert_eq!(materialize(&action).unwrap(), Artifact::Open("https://x".into()));
    }

    #[test]
    fn test_inline_pdf_decodes_byte_exact() {
        let raw: Vec<u8> = vec![0x25, 0x50, 0x44, 0x46, 0x00, 0xff, 0x10];
        let encoded = STANDARD.encode(&raw);
        let msg = assistant("here").with_output_files(vec![file(None, Some(&encoded), "pdf")]);

        let action = prepare_download(&msg, &ExportPolicy::default()).unwrap();
        assert!(matches!(action, ExportAction::DecodeAndSave { index: 0, .. }));
        match materialize(&action).unwrap() {
            Artifact::File {
                filename,
                mime,
                bytes,
            } => {
                assert_eq!(filename, "out.pdf");
                assert_eq!(mime, "application/pdf");
                assert_eq!(bytes, raw);
            }
            other => panic!("unexpected artifact {:?}", other),
        }
    }

    #[test]
    fn test_inline_non_pdf_is_csv() {
        let encoded = STANDARD.encode("a,b\n1,2\n");
        let msg = assistant("x").with_output_files(vec![file(None, Some(&encoded), "csv")]);
        let action = prepare_download(&msg, &ExportPolicy::default()).unwrap();
        match materialize(&action).unwrap() {
            Artifact::File { mime, bytes, .. } => {
                assert_eq!(mime, "text/csv");
                assert_eq!(bytes, b"a,b\n1,2\n");
            }
            other => panic!("unexpected artifact {:?}", other),
        }
    }

    #[test]
    fn test_unnamed_file_is_named_by_its_position() {
        let encoded = STANDARD.encode("Court,Fee\n");
        let mut table = file(None, Some(&encoded), "table");
        table.filename = String::new();
        let msg = assistant("x").with_output_files(vec![file(None, None, "pdf"), table]);

        let action = prepare_download(&msg, &ExportPolicy::default()).unwrap();
        assert!(matches!(action, ExportAction::DecodeAndSave { index: 1, .. }));
        match materialize(&action).unwrap() {
            Artifact::File { filename, mime, .. } => {
                assert_eq!(filename, "table_2.csv");
                assert_eq!(mime, "text/csv");
            }
            other => panic!("unexpected artifact {:?}", other),
        }
    }

    #[test]
    fn test_bad_base64_is_error() {
        let msg = assistant("x").with_output_files(vec![file(None, Some("%%%not base64"), "pdf")]);
        let action = prepare_download(&msg, &ExportPolicy::default()).unwrap();
        assert!(matches!(materialize(&action), Err(ExportError::Decode(_))));
    }

    #[test]
    fn test_long_agreement_synthesizes() {
        let content = format!("This agreement {}", "x".repeat(1185));
        assert_eq!(content.len(), 1200);
        let msg = assistant(&content);
        let action = prepare_download(&msg, &ExportPolicy::default()).unwrap();
        assert_eq!(
            action,
            ExportAction::SynthesizeAndSave {
                text: content,
                timestamp: ts()
            }
        );
    }

    #[test]
    fn test_eligibility_triggers() {
        let policy = ExportPolicy::default();
        assert!(!is_export_eligible(&assistant("Hello, how can I help?"), &policy));
        assert!(is_export_eligible(&assistant("Draft CONTRACT below"), &policy));
        assert!(is_export_eligible(&assistant(&"y".repeat(1001)), &policy));
        assert!(!is_export_eligible(&assistant(&"y".repeat(1000)), &policy));
        assert!(is_export_eligible(
            &assistant("ok").with_request_type(Some("fill_form".into())),
            &policy
        ));
        assert!(is_export_eligible(
            &assistant("ok").with_request_type(Some("document".into())),
            &policy
        ));
        assert!(!is_export_eligible(
            &assistant("ok").with_request_type(Some("chat".into())),
            &policy
        ));
    }

    #[test]
    fn test_user_messages_never_export() {
        let msg = Message::user("please draft an agreement", ts());
        assert!(!is_export_eligible(&msg, &ExportPolicy::default()));
        assert!(prepare_download(&msg, &ExportPolicy::default()).is_none());
    }

    #[test]
    fn test_plain_chat_has_no_download() {
        assert!(prepare_download(&assistant("Hi!"), &ExportPolicy::default()).is_none());
    }

    #[test]
    fn test_table_request_synthesizes_csv() {
        let msg = assistant("| Court | Fee |\n|---|---|\n| High Court | 500 |")
            .with_request_type(Some("table".into()));
        let action = prepare_download(&msg, &ExportPolicy::default()).unwrap();
        assert!(matches!(action, ExportAction::SynthesizeTable { .. }));
        match materialize(&action).unwrap() {
            Artifact::File {
                filename, bytes, ..
            } => {
                assert_eq!(filename, "legal_table_1700000000123.csv");
                assert_eq!(String::from_utf8(bytes).unwrap(), "Court,Fee\nHigh Court,500\n");
            }
            other => panic!("unexpected artifact {:?}", other),
        }
    }

    #[test]
    fn test_synthesized_document_filename() {
        let action = ExportAction::SynthesizeAndSave {
            text: "**NON-DISCLOSURE AGREEMENT**\n\n1. Purpose".into(),
            timestamp: ts(),
        };
        match materialize(&action).unwrap() {
            Artifact::File {
                filename, bytes, ..
            } => {
                assert!(filename.starts_with("legal_document_1700000000123."));
                if cfg!(feature = "pdf") {
                    assert!(filename.ends_with(".pdf"));
                    assert!(bytes.starts_with(b"%PDF"));
                } else {
                    assert!(filename.ends_with(".txt"));
                    assert_eq!(bytes, b"NON-DISCLOSURE AGREEMENT\n\n1. Purpose");
                }
            }
            other => panic!("unexpected artifact {:?}", other),
        }
    }

    #[test]
    fn test_render_failure_falls_back_to_text() {
        let text = "Here is your document:\n**LEASE AGREEMENT**\n\n1. Term";
        let artifact = synthesize_document(text, &ts(), |_| Err(ExportError::SynthesisUnavailable));
        assert_eq!(
            artifact,
            Artifact::File {
                filename: "legal_document_1700000000123.txt".into(),
                mime: "text/plain".into(),
                bytes: b"LEASE AGREEMENT\n\n1. Term".to_vec(),
            }
        );
    }

    #[test]
    fn test_rendered_document_is_pdf() {
        let artifact = synthesize_document("Here is the document: body", &ts(), |body| {
            assert_eq!(body, "body");
            Ok(b"%PDF-1.5".to_vec())
        });
        assert_eq!(
            artifact,
            Artifact::File {
                filename: "legal_document_1700000000123.pdf".into(),
                mime: "application/pdf".into(),
                bytes: b"%PDF-1.5".to_vec(),
            }
        );
    }

    #[test]
    fn test_download_label() {
        assert_eq!(
            download_label(&assistant("x").with_request_type(Some("fill_form".into()))),
            "Download Filled Form"
        );
        assert_eq!(download_label(&assistant("x")), "Download Document");
    }

    #[test]
    fn test_clean_document_text() {
        assert_eq!(
            clean_document_text("Here is your document:\n## **LEASE**\n# Terms"),
            "LEASE\n Terms"
        );
        assert_eq!(strip_boilerplate_prefix("HERE IS THE DOCUMENT: body"), "body");
        assert_eq!(strip_boilerplate_prefix("Plain body"), "Plain body");
    }
}
