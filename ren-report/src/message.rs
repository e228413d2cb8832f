//! The outbound mail as handed to a [`Notifier`](crate::Notifier).

use std::path::PathBuf;

/// Delimiter between addresses in [`EmailMessage::recipient_line`].
pub const RECIPIENT_DELIMITER: &str = ";";

/// A file attached to the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// File read at send time.
    pub path: PathBuf,
    /// Content-ID the HTML body references as `cid:<id>`; `None` for a
    /// regular attachment.
    pub content_id: Option<String>,
}

impl Attachment {
    /// An attachment rendered inline wherever the body references `cid:{content_id}`.
    #[must_use]
    pub fn inline(path: PathBuf, content_id: &str) -> Self {
        Self {
            path,
            content_id: Some(content_id.to_owned()),
        }
    }

    /// File name used in MIME headers.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map_or_else(|| "attachment".to_owned(), |n| n.to_string_lossy().into_owned())
    }
}

/// One composed mail. Recipients are kept as given, duplicates included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// Subject line, UTF-8.
    pub subject: String,
    /// Recipient addresses in configured order.
    pub recipients: Vec<String>,
    /// Complete HTML body.
    pub html_body: String,
    /// Files sent along with the body, inline ones first.
    pub attachments: Vec<Attachment>,
}

impl EmailMessage {
    /// Recipients joined the way mail clients expect in their `To` field.
    #[must_use]
    pub fn recipient_line(&self) -> String {
        self.recipients.join(RECIPIENT_DELIMITER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipient_line_keeps_duplicates() {
        let msg = EmailMessage {
            subject: "s".to_owned(),
            recipients: vec![
                "a@example.com".to_owned(),
                "a@example.com".to_owned(),
                "b@example.com".to_owned(),
            ],
            html_body: String::new(),
            attachments: Vec::new(),
        };
        assert_eq!(
            msg.recipient_line(),
            "a@example.com;a@example.com;b@example.com"
        );
    }

    #[test]
    fn test_attachment_file_name() {
        let att = Attachment::inline(PathBuf::from("/img/icon_2.png"), "icon");
        assert_eq!(att.file_name(), "icon_2.png");
        assert_eq!(att.content_id.as_deref(), Some("icon"));
    }
}
