//! Error types for the report pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by the pipeline stages.
///
/// Every variant except [`ReportError::Parse`] ends the run. A parse failure
/// is reported and the pipeline carries on with an empty result set.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReportError {
    /// No subdirectory of `root` starts with `prefix`.
    #[error("No subfolders found starting with '{prefix}' in {}", .root.display())]
    NotFound {
        /// The required directory name prefix.
        prefix: String,
        /// The directory that was scanned.
        root: PathBuf,
    },

    /// The root directory could not be listed.
    #[error("Cannot list run directories under {}: {source}", .root.display())]
    RootUnreadable {
        /// The directory that was scanned.
        root: PathBuf,
        /// Underlying traversal error.
        #[source]
        source: walkdir::Error,
    },

    /// The run directory has no report file.
    #[error("Report file not found: {}", .path.display())]
    MissingFile {
        /// Expected location of the report.
        path: PathBuf,
    },

    /// The report exists but could not be read.
    #[error("Failed to read report {}: {source}", .path.display())]
    Io {
        /// Location of the report.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The report is larger than the configured limit.
    #[error("Report {} exceeds maximum size of {limit} bytes", .path.display())]
    ReportTooLarge {
        /// Location of the report.
        path: PathBuf,
        /// Configured limit in bytes.
        limit: u64,
    },

    /// The report content is not valid JSON.
    #[error("Error reading JSON from file {}: {source}", .path.display())]
    Parse {
        /// Location of the report.
        path: PathBuf,
        /// Underlying decoder error.
        #[source]
        source: serde_json::Error,
    },

    /// The mail transport rejected the message.
    #[error(transparent)]
    Send(#[from] SendError),
}

impl ReportError {
    /// Whether the pipeline must stop when this error occurs.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Parse { .. })
    }
}

/// Failures raised by a [`Notifier`](crate::Notifier) while sending.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SendError {
    /// An attachment could not be read from disk.
    #[error("Failed to read attachment {}: {source}", .path.display())]
    Attachment {
        /// Attachment location.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The mail submission command could not be started or fed.
    #[error("Failed to run mail command '{program}': {source}")]
    Spawn {
        /// Program that was invoked.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The mail submission command exited unsuccessfully.
    #[error("Mail command '{program}' failed ({status}): {stderr}")]
    Rejected {
        /// Program that was invoked.
        program: String,
        /// Exit status as displayed by the OS.
        status: String,
        /// Captured standard error, trimmed.
        stderr: String,
    },

    /// The message could not be written to the outbox.
    #[error("Failed to write message to {}: {source}", .path.display())]
    Outbox {
        /// Destination file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The message has no recipients.
    #[error("Message has no recipients")]
    NoRecipients,
}

/// Failures while loading or validating configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config {}: {source}", .path.display())]
    Read {
        /// Configuration file location.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML for [`ReportConfig`](crate::ReportConfig).
    #[error("Invalid config: {message}")]
    Parse {
        /// Decoder message.
        message: String,
    },

    /// A value failed validation.
    #[error("Invalid config value for '{field}': {reason}")]
    Invalid {
        /// Offending option name.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_names_prefix_and_root() {
        let err = ReportError::NotFound {
            prefix: "CX_BT_MAIN_".to_owned(),
            root: PathBuf::from("/runs"),
        };
        let msg = err.to_string();
        assert!(msg.contains("'CX_BT_MAIN_'"), "got: {msg}");
        assert!(msg.contains("/runs"), "got: {msg}");
        assert!(err.is_fatal());
    }

    #[test]
    fn test_parse_error_is_not_fatal() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ReportError::Parse {
            path: PathBuf::from("r.prf"),
            source,
        };
        assert!(!err.is_fatal());
        assert!(err.to_string().starts_with("Error reading JSON from file r.prf"));
    }

    #[test]
    fn test_send_error_is_transparent() {
        let err = ReportError::from(SendError::NoRecipients);
        assert_eq!(err.to_string(), "Message has no recipients");
        assert!(err.is_fatal());
    }
}
