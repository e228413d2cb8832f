//! # ren-report
//!
//! Mails an HTML summary of the latest test run.
//!
//! A run is four stages executed once, in order:
//!
//! 1. **locate** the newest `<root>/<prefix>*` directory,
//! 2. **parse** its JSON report and tally outcomes,
//! 3. **render** a summary table and a detail table,
//! 4. **notify**: hand one mail with an inline icon to a [`Notifier`].
//!
//! All environment-specific values come from [`ReportConfig`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::{Path, PathBuf};
//! use ren_report::{MailCommandNotifier, ReportConfig, run};
//!
//! let mut config = ReportConfig::load(Path::new("ren-report.yaml")).unwrap();
//! config.root = PathBuf::from("/data/runs");
//! config.validate().unwrap();
//!
//! let mut notifier = MailCommandNotifier::new(config.transport.clone());
//! let summary = run(&config, &mut notifier).unwrap();
//! println!("Run:   {}", summary.run.name);
//! println!("Total: {}", summary.tally.total);
//! ```

mod config;
mod document;
mod error;
mod locate;
mod message;
pub mod notify;
mod pipeline;
mod render;
mod tally;

pub use config::{
    ColorPair, DEFAULT_MAX_REPORT_BYTES, Palette, ReportConfig, TOTAL_LABEL, TransportConfig,
};
pub use document::{load_rows, rows_from_document};
pub use error::{ConfigError, ReportError, SendError};
pub use locate::{RunDirectory, find_latest_run};
pub use message::{Attachment, EmailMessage, RECIPIENT_DELIMITER};
pub use notify::{MailCommandNotifier, Notifier, OutboxNotifier, RecordingNotifier};
pub use pipeline::{PreparedReport, RunSummary, compose, prepare, run};
pub use render::{Renderer, escape_html};
pub use tally::{Outcome, OutcomeTally, ResultRow};
