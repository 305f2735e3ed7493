//! Composition state for the next outgoing message.
//!
//! Kept apart from `ClientState` so the controller can decide what survives a
//! failed send (everything) and what a successful one clears (the message and
//! its attachments).

use crate::protocol::Attachment;
use crate::validation::validate_attachment;

#[derive(Debug, Default, Clone)]
pub struct InputState {
    /// Current message being composed
    pub message_input: String,

    /// Files queued to go out with the message
    pub attachments: Vec<Attachment>,

    /// Free-text instructions sent with every message
    pub user_instructions: String,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_instructions(user_instructions: impl Into<String>) -> Self {
        Self {
            user_instructions: user_instructions.into(),
            ..Self::default()
        }
    }

    /// Queue an attachment after validating its name and size.
    pub fn add_attachment(&mut self, attachment: Attachment) -> Result<(), String> {
        validate_attachment(&attachment.filename, attachment.bytes.len())?;
        if self
            .attachments
            .iter()
            .any(|a| a.filename == attachment.filename)
        {
            return Err(format!("'{}' is already attached", attachment.filename));
        }
        self.attachments.push(attachment);
        Ok(())
    }

    pub fn remove_attachment(&mut self, index: usize) -> Option<Attachment> {
        (index < self.attachments.len()).then(|| self.attachments.remove(index))
    }

    /// Something worth sending: non-blank text or at least one attachment.
    pub fn has_content(&self) -> bool {
        !self.message_input.trim().is_empty() || !self.attachments.is_empty()
    }

    /// Clear the message and attachments; instructions persist.
    pub fn clear(&mut self) {
        self.message_input.clear();
        self.attachments.clear();
    }
}
