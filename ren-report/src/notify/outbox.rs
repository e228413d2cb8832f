//! Writes composed messages as `.eml` files instead of sending them.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use super::Notifier;
use super::mime::{self, Envelope};
use crate::error::SendError;
use crate::message::EmailMessage;

/// Drops each message into a directory, one `.eml` file per send.
#[derive(Debug, Clone)]
pub struct OutboxNotifier {
    dir: PathBuf,
    from: Option<String>,
    written: Vec<PathBuf>,
}

impl OutboxNotifier {
    #[must_use]
    pub fn new(dir: PathBuf, from: Option<String>) -> Self {
        Self {
            dir,
            from,
            written: Vec::new(),
        }
    }

    /// Files written so far, in send order.
    #[must_use]
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn file_name(envelope: &Envelope) -> String {
        let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        let id = envelope
            .message_id
            .trim_matches(['<', '>'])
            .split('@')
            .next()
            .unwrap_or_default();
        let short: String = id.chars().take(8).collect();
        format!("ren-report-{stamp}-{short}.eml")
    }
}

impl Notifier for OutboxNotifier {
    fn send(&mut self, message: &EmailMessage) -> Result<(), SendError> {
        if message.recipients.is_empty() {
            return Err(SendError::NoRecipients);
        }
        let envelope = Envelope::now(self.from.as_deref());
        let encoded = mime::encode(message, &envelope)?;

        let path = self.dir.join(Self::file_name(&envelope));
        fs::create_dir_all(&self.dir).map_err(|source| outbox_error(&self.dir, source))?;
        fs::write(&path, encoded).map_err(|source| outbox_error(&path, source))?;

        info!("message written to {}", path.display());
        self.written.push(path);
        Ok(())
    }
}

fn outbox_error(path: &Path, source: std::io::Error) -> SendError {
    SendError::Outbox {
        path: path.to_owned(),
        source,
    }
}
