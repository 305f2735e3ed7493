//! Delivering artifacts to the host environment.

use std::fs;
use std::path::{Path, PathBuf};

use super::{materialize, Artifact, ExportAction};
use crate::error::ExportError;
use crate::validation::sanitize_filename;

/// Capabilities the embedding environment provides for downloads.
pub trait ExportHost {
    /// Hand a remote file to whatever opens links on this host.
    fn open_url(&self, url: &str) -> Result<(), ExportError>;

    /// Persist a file, returning where it ended up.
    fn save(&self, filename: &str, mime: &str, bytes: &[u8]) -> Result<PathBuf, ExportError>;
}

/// Result of executing an export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Opened(String),
    Saved(PathBuf),
}

/// Materialize an action and deliver it through `host`.
pub fn execute(action: &ExportAction, host: &dyn ExportHost) -> Result<ExportOutcome, ExportError> {
    match materialize(action)? {
        Artifact::Open(url) => {
            host.open_url(&url)?;
            Ok(ExportOutcome::Opened(url))
        }
        Artifact::File {
            filename,
            mime,
            bytes,
        } => host.save(&filename, &mime, &bytes).map(ExportOutcome::Saved),
    }
}

/// Saves downloads into a directory; URLs are reported, not fetched.
#[derive(Debug, Clone)]
pub struct DirectoryHost {
    dir: PathBuf,
}

impl DirectoryHost {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// First free path for `filename`, appending ` (n)` before the extension.
    fn unique_path(&self, filename: &str) -> PathBuf {
        let candidate = self.dir.join(filename);
        if !candidate.exists() {
            return candidate;
        }
        let (stem, ext) = match filename.rsplit_once('.') {
            Some((stem, ext)) => (stem, format!(".{}", ext)),
            None => (filename, String::new()),
        };
        (1..)
            .map(|n| self.dir.join(format!("{} ({}){}", stem, n, ext)))
            .find(|p| !p.exists())
            .unwrap_or(candidate)
    }
}

impl ExportHost for DirectoryHost {
    fn open_url(&self, url: &str) -> Result<(), ExportError> {
        tracing::info!("Document available at {}", url);
        Ok(())
    }

    fn save(&self, filename: &str, mime: &str, bytes: &[u8]) -> Result<PathBuf, ExportError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.unique_path(&sanitize_filename(filename));
        fs::write(&path, bytes)?;
        tracing::info!("Saved {} ({}, {} bytes)", path.display(), mime, bytes.len());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::OutputFile;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;

    fn inline_csv(filename: &str) -> ExportAction {
        ExportAction::DecodeAndSave {
            file: OutputFile {
                title: None,
                file_type: "csv".into(),
                filename: filename.into(),
                content: Some(STANDARD.encode("a,b\n")),
                url: None,
            },
            index: 0,
        }
    }

    #[test]
    fn test_save_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        let host = DirectoryHost::new(dir.path().join("downloads"));

        let outcome = execute(&inline_csv("fees.csv"), &host).unwrap();
        let ExportOutcome::Saved(path) = outcome else {
            panic!("expected a saved file");
        };
        assert_eq!(path, dir.path().join("downloads").join("fees.csv"));
        assert_eq!(fs::read(&path).unwrap(), b"a,b\n");
    }

    #[test]
    fn test_existing_files_are_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let host = DirectoryHost::new(dir.path());

        execute(&inline_csv("fees.csv"), &host).unwrap();
        let second = execute(&inline_csv("fees.csv"), &host).unwrap();
        assert_eq!(second, ExportOutcome::Saved(dir.path().join("fees (1).csv")));
    }

    #[test]
    fn test_unsafe_names_are_sanitized() {
        let dir = tempfile::tempdir().unwrap();
        let host = DirectoryHost::new(dir.path());
        let outcome = execute(&inline_csv("../../escape.csv"), &host).unwrap();
        assert_eq!(outcome, ExportOutcome::Saved(dir.path().join("_.._escape.csv")));
    }

    #[test]
    fn test_url_is_handed_off() {
        let dir = tempfile::tempdir().unwrap();
        let host = DirectoryHost::new(dir.path());
        let action = ExportAction::OpenExisting(OutputFile {
            title: None,
            file_type: "pdf".into(),
            filename: String::new(),
            content: None,
            url: Some("https://bucket/doc.pdf".into()),
        });
        assert_eq!(
            execute(&action, &host).unwrap(),
            ExportOutcome::Opened("https://bucket/doc.pdf".into())
        );
    }
}
