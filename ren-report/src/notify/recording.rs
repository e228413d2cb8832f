//! In-memory notifier for tests and previews.

use super::Notifier;
use crate::error::SendError;
use crate::message::EmailMessage;

/// Keeps every message it is asked to send. Optionally fails every send.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    sent: Vec<EmailMessage>,
    reject_with: Option<String>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose sends are rejected with `reason`.
    #[must_use]
    pub fn rejecting(reason: &str) -> Self {
        Self {
            sent: Vec::new(),
            reject_with: Some(reason.to_owned()),
        }
    }

    /// Messages accepted so far.
    #[must_use]
    pub fn sent(&self) -> &[EmailMessage] {
        &self.sent
    }
}

impl Notifier for RecordingNotifier {
    fn send(&mut self, message: &EmailMessage) -> Result<(), SendError> {
        if let Some(reason) = &self.reject_with {
            return Err(SendError::Rejected {
                program: "recording".to_owned(),
                status: "rejected".to_owned(),
                stderr: reason.clone(),
            });
        }
        self.sent.push(message.clone());
        Ok(())
    }
}
