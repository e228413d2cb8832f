//! Delivery through a local mail submission command such as `sendmail -t`.

use std::io::Write;
use std::process::{Command, Stdio};

use tracing::{debug, info};

use super::Notifier;
use super::mime::{self, Envelope};
use crate::config::TransportConfig;
use crate::error::SendError;
use crate::message::EmailMessage;

/// Pipes the encoded message into the configured program's stdin.
///
/// The program must read recipients from the message headers
/// (`sendmail -t` semantics) and exit with status 0 on acceptance.
#[derive(Debug, Clone)]
pub struct MailCommandNotifier {
    transport: TransportConfig,
}

impl MailCommandNotifier {
    #[must_use]
    pub fn new(transport: TransportConfig) -> Self {
        Self { transport }
    }
}

impl Notifier for MailCommandNotifier {
    fn send(&mut self, message: &EmailMessage) -> Result<(), SendError> {
        if message.recipients.is_empty() {
            return Err(SendError::NoRecipients);
        }
        let envelope = Envelope::now(self.transport.from.as_deref());
        let encoded = mime::encode(message, &envelope)?;

        let program = self.transport.program.clone();
        let spawn_err = |source| SendError::Spawn {
            program: program.clone(),
            source,
        };

        debug!(
            "running {} {}",
            self.transport.program,
            self.transport.args.join(" ")
        );
        let mut child = Command::new(&self.transport.program)
            .args(&self.transport.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_err)?;

        // A program that exits before draining stdin closes the pipe early.
        // Its exit status and stderr say more than the write error does.
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(encoded.as_bytes()),
            None => Err(std::io::Error::other("stdin was not captured")),
        };

        let output = child.wait_with_output().map_err(spawn_err)?;
        if !output.status.success() {
            if let Err(e) = &written {
                debug!("write to {program} failed before it exited: {e}");
            }
            return Err(SendError::Rejected {
                program,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }
        written.map_err(spawn_err)?;

        info!(
            "submitted {} ({} bytes) via {}",
            envelope.message_id,
            encoded.len(),
            self.transport.program
        );
        Ok(())
    }
}
