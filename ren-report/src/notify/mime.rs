//! RFC 5322 / MIME encoding of an [`EmailMessage`].
//!
//! The HTML body and every attachment become parts of one
//! `multipart/related` entity, so images tagged with a Content-ID render
//! inline where the body references `cid:<id>`. Lines end in CRLF and all
//! part bodies are base64 encoded.

use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::error::SendError;
use crate::message::{Attachment, EmailMessage};

/// Maximum base64 line length allowed by RFC 2045.
const LINE_WIDTH: usize = 76;

const HEX: &[u8; 16] = b"0123456789ABCDEF";

/// Envelope values that change from one composition to the next.
#[derive(Debug, Clone)]
pub struct Envelope {
    /// `From:` address; omitted from the headers when `None`.
    pub from: Option<String>,
    /// RFC 2822 `Date:` value.
    pub date: String,
    /// `Message-ID:` value including the angle brackets.
    pub message_id: String,
    /// Multipart boundary, unique per message.
    pub boundary: String,
}

impl Envelope {
    /// Fresh envelope with the current local time and random identifiers.
    #[must_use]
    pub fn now(from: Option<&str>) -> Self {
        let id = uuid::Uuid::new_v4().simple().to_string();
        Self {
            from: from.map(str::to_owned),
            date: chrono::Local::now().to_rfc2822(),
            message_id: format!("<{id}@ren-report>"),
            boundary: format!("ren-report-{id}"),
        }
    }
}

/// Encode `message` into a complete mail, reading attachments from disk.
///
/// # Errors
///
/// Returns [`SendError::Attachment`] if an attachment cannot be read.
pub fn encode(message: &EmailMessage, envelope: &Envelope) -> Result<String, SendError> {
    let mut lines: Vec<String> = Vec::new();

    if let Some(from) = envelope.from.as_deref() {
        lines.push(format!("From: {}", header_value(from)));
    }
    let to: Vec<String> = message.recipients.iter().map(|r| header_value(r)).collect();
    lines.push(format!("To: {}", to.join(", ")));
    lines.push(format!("Subject: {}", encode_subject(&message.subject)));
    lines.push(format!("Date: {}", envelope.date));
    lines.push(format!("Message-ID: {}", envelope.message_id));
    lines.push("MIME-Version: 1.0".to_owned());
    lines.push(format!(
        "Content-Type: multipart/related; boundary=\"{}\"; type=\"text/html\"",
        envelope.boundary
    ));
    lines.push(String::new());

    lines.push(format!("--{}", envelope.boundary));
    lines.push("Content-Type: text/html; charset=utf-8".to_owned());
    lines.push("Content-Transfer-Encoding: base64".to_owned());
    lines.push(String::new());
    push_base64(&mut lines, message.html_body.as_bytes());

    for attachment in &message.attachments {
        let bytes = std::fs::read(&attachment.path).map_err(|source| SendError::Attachment {
            path: attachment.path.clone(),
            source,
        })?;
        lines.push(format!("--{}", envelope.boundary));
        push_attachment_headers(&mut lines, attachment);
        lines.push(String::new());
        push_base64(&mut lines, &bytes);
    }

    lines.push(format!("--{}--", envelope.boundary));
    lines.push(String::new());
    Ok(lines.join("\r\n"))
}

fn push_attachment_headers(lines: &mut Vec<String>, attachment: &Attachment) {
    let name = header_value(&attachment.file_name());
    lines.push(format!(
        "Content-Type: {}; {}",
        content_type_for(&attachment.path),
        file_name_param("name", &name)
    ));
    lines.push("Content-Transfer-Encoding: base64".to_owned());
    let filename = file_name_param("filename", &name);
    if let Some(cid) = attachment.content_id.as_deref() {
        lines.push(format!("Content-ID: <{}>", header_value(cid)));
        lines.push(format!("Content-Disposition: inline; {filename}"));
    } else {
        lines.push(format!("Content-Disposition: attachment; {filename}"));
    }
}

/// `key="value"` for plain ASCII names, RFC 2231 `key*=UTF-8''...` otherwise.
fn file_name_param(key: &str, name: &str) -> String {
    if name.is_ascii() && !name.contains(['"', '\\']) {
        return format!("{key}=\"{name}\"");
    }
    let mut encoded = String::with_capacity(name.len() * 3);
    for byte in name.bytes() {
        if byte.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&byte) {
            encoded.push(char::from(byte));
        } else {
            encoded.push('%');
            encoded.push(char::from(HEX[usize::from(byte >> 4)]));
            encoded.push(char::from(HEX[usize::from(byte & 0x0f)]));
        }
    }
    format!("{key}*=UTF-8''{encoded}")
}

fn push_base64(lines: &mut Vec<String>, bytes: &[u8]) {
    let encoded = STANDARD.encode(bytes);
    lines.extend(
        encoded
            .as_bytes()
            .chunks(LINE_WIDTH)
            .map(|chunk| String::from_utf8_lossy(chunk).into_owned()),
    );
}

/// MIME type guessed from the file extension.
#[must_use]
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Strip line breaks so a value cannot start a new header.
fn header_value(value: &str) -> String {
    value
        .chars()
        .filter(|c| *c != '\r' && *c != '\n')
        .collect::<String>()
        .trim()
        .to_owned()
}

/// RFC 2047 encoded-word for non-ASCII subjects.
fn encode_subject(subject: &str) -> String {
    let subject = header_value(subject);
    if subject.is_ascii() {
        subject
    } else {
        format!("=?UTF-8?B?{}?=", STANDARD.encode(subject.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn envelope() -> Envelope {
        Envelope {
            from: Some("ci@example.com".to_owned()),
            date: "Sun, 18 Oct 2026 09:00:00 +0000".to_owned(),
            message_id: "<fixed@ren-report>".to_owned(),
            boundary: "BOUNDARY".to_owned(),
        }
    }

    fn message(attachments: Vec<Attachment>) -> EmailMessage {
        EmailMessage {
            subject: "REN CX_BT_MAIN".to_owned(),
            recipients: vec!["a@example.com".to_owned(), "a@example.com".to_owned()],
            html_body: "<p>hi</p>".to_owned(),
            attachments,
        }
    }

    #[test]
    fn test_encode_headers_and_inline_image() {
        let tmp = TempDir::new().unwrap();
        let icon = tmp.path().join("icon_2.png");
        fs::write(&icon, [0x89, b'P', b'N', b'G']).unwrap();

        let mail = encode(&message(vec![Attachment::inline(icon, "icon")]), &envelope()).unwrap();

        assert!(mail.starts_with("From: ci@example.com\r\nTo: a@example.com, a@example.com\r\n"));
        assert!(mail.contains("Subject: REN CX_BT_MAIN\r\n"));
        assert!(mail.contains("Message-ID: <fixed@ren-report>\r\n"));
        assert!(mail.contains(
            "Content-Type: multipart/related; boundary=\"BOUNDARY\"; type=\"text/html\"\r\n"
        ));
        assert!(mail.contains(&format!("\r\n{}\r\n", STANDARD.encode("<p>hi</p>"))));
        assert!(mail.contains("Content-Type: image/png; name=\"icon_2.png\"\r\n"));
        assert!(mail.contains("Content-ID: <icon>\r\n"));
        assert!(mail.contains("Content-Disposition: inline; filename=\"icon_2.png\"\r\n"));
        assert!(mail.ends_with("--BOUNDARY--\r\n"));
        assert_eq!(mail.matches("--BOUNDARY\r\n").count(), 2);
    }

    #[test]
    fn test_non_ascii_file_name_uses_extended_parameter() {
        let tmp = TempDir::new().unwrap();
        let icon = tmp.path().join("logo \u{e9}.png");
        fs::write(&icon, [0x89, b'P', b'N', b'G']).unwrap();

        let mail = encode(&message(vec![Attachment::inline(icon, "icon")]), &envelope()).unwrap();

        assert!(mail.contains("Content-Type: image/png; name*=UTF-8''logo%20%C3%A9.png\r\n"));
        assert!(mail.contains("Content-Disposition: inline; filename*=UTF-8''logo%20%C3%A9.png\r\n"));
        assert!(mail.is_ascii());
    }

    #[test]
    fn test_file_name_param() {
        assert_eq!(file_name_param("name", "icon.png"), "name=\"icon.png\"");
        assert_eq!(file_name_param("name", "a\"b.png"), "name*=UTF-8''a%22b.png");
    }

    #[test]
    fn test_missing_attachment() {
        let att = Attachment::inline(PathBuf::from("/nonexistent/icon.png"), "icon");
        let err = encode(&message(vec![att]), &envelope()).unwrap_err();
        assert!(matches!(err, SendError::Attachment { .. }), "got: {err:?}");
    }

    #[test]
    fn test_header_injection_is_neutralised() {
        let mut msg = message(Vec::new());
        msg.subject = "Report\r\nBcc: evil@example.com".to_owned();
        let mail = encode(&msg, &envelope()).unwrap();
        assert!(mail.contains("Subject: ReportBcc: evil@example.com\r\n"));
        assert!(!mail.contains("\r\nBcc:"));
    }

    #[test]
    fn test_non_ascii_subject_is_encoded() {
        assert_eq!(encode_subject("plain"), "plain");
        let encoded = encode_subject("Bericht \u{fc}ber");
        assert!(encoded.starts_with("=?UTF-8?B?") && encoded.ends_with("?="));
    }

    #[test]
    fn test_base64_lines_are_wrapped() {
        let mut lines = Vec::new();
        push_base64(&mut lines, &[7u8; 200]);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.len() <= LINE_WIDTH));
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for(Path::new("a.PNG")), "image/png");
        assert_eq!(content_type_for(Path::new("a.jpeg")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("a")), "application/octet-stream");
    }
}
