//! Mail delivery.
//!
//! The pipeline only sees the [`Notifier`] trait. [`MailCommandNotifier`]
//! submits through a local mail command, [`OutboxNotifier`] writes the
//! message to disk instead, and [`RecordingNotifier`] keeps it in memory.

pub mod command;
pub mod mime;
pub mod outbox;
pub mod recording;

use crate::error::SendError;
use crate::message::EmailMessage;

pub use command::MailCommandNotifier;
pub use outbox::OutboxNotifier;
pub use recording::RecordingNotifier;

/// Compose-and-send capability for one message.
///
/// Implementations make a single attempt; there is no retry.
pub trait Notifier {
    /// Hand `message` to the transport.
    ///
    /// # Errors
    ///
    /// Returns a [`SendError`] describing why the transport did not accept
    /// the message.
    fn send(&mut self, message: &EmailMessage) -> Result<(), SendError>;
}
