//! The four-stage run: locate, parse and tally, render, notify.
//!
//! Stages run strictly in order. The run stops early when no run directory
//! matches or the report file is missing; a malformed report only degrades
//! the run to an empty result set.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::ReportConfig;
use crate::document;
use crate::error::ReportError;
use crate::locate::{RunDirectory, find_latest_run};
use crate::message::{Attachment, EmailMessage};
use crate::notify::Notifier;
use crate::render::Renderer;
use crate::tally::{OutcomeTally, ResultRow};

/// Output of the locate and parse stages.
#[derive(Debug, Clone)]
pub struct PreparedReport {
    /// Selected run directory.
    pub run: RunDirectory,
    /// Report file inside `run`.
    pub report_path: PathBuf,
    /// Rows in document order; empty when the report was malformed.
    pub rows: Vec<ResultRow>,
    /// Per-category counts of `rows`.
    pub tally: OutcomeTally,
    /// Parse failure that was tolerated, if any.
    pub parse_error: Option<String>,
}

/// What a completed run did.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Run directory that was reported.
    pub run: RunDirectory,
    /// Report file that was read.
    pub report_path: PathBuf,
    /// Counts shown in the summary table.
    pub tally: OutcomeTally,
    /// Whether the report was malformed and replaced by an empty set.
    pub degraded: bool,
    /// Subject line after template expansion.
    pub subject: String,
    /// Number of recipient addresses, duplicates included.
    pub recipients: usize,
}

/// Locate the newest run and load its report.
///
/// # Errors
///
/// Returns the fatal [`ReportError`]s of the locate and parse stages. A
/// [`ReportError::Parse`] is logged and absorbed into
/// [`PreparedReport::parse_error`].
pub fn prepare(config: &ReportConfig) -> Result<PreparedReport, ReportError> {
    let run = find_latest_run(&config.root, &config.prefix)?;
    info!("latest run directory: {}", run.path.display());

    let report_path = run.path.join(&config.report_file);
    let (rows, parse_error) = match document::load_rows(&report_path, config.max_report_bytes) {
        Ok(rows) => (rows, None),
        Err(err) if !err.is_fatal() => {
            warn!("{err}; continuing with an empty result set");
            (Vec::new(), Some(err.to_string()))
        }
        Err(err) => return Err(err),
    };

    let tally = OutcomeTally::from_rows(&rows);
    info!(
        "tally: total={} error={} success={} failed={} inconclusive={} none={} unrecognized={}",
        tally.total,
        tally.error,
        tally.success,
        tally.failed,
        tally.inconclusive,
        tally.none,
        tally.unrecognized()
    );

    Ok(PreparedReport {
        run,
        report_path,
        rows,
        tally,
        parse_error,
    })
}

/// Render the mail for a prepared report.
#[must_use]
pub fn compose(config: &ReportConfig, report: &PreparedReport) -> EmailMessage {
    let html_body = Renderer::new(config).body(&report.tally, &report.rows);
    EmailMessage {
        subject: config.subject_for(&report.run.name),
        recipients: config.recipients.clone(),
        html_body,
        attachments: vec![Attachment::inline(
            config.icon_path.clone(),
            &config.icon_cid,
        )],
    }
}

/// Run the whole pipeline and send exactly one message through `notifier`.
///
/// # Errors
///
/// Returns the first fatal [`ReportError`]; nothing is sent when the locate
/// or parse stage fails. A transport failure is returned as
/// [`ReportError::Send`] without retrying.
pub fn run(config: &ReportConfig, notifier: &mut dyn Notifier) -> Result<RunSummary, ReportError> {
    let report = prepare(config)?;
    let message = compose(config, &report);
    info!(
        "sending '{}' to {}",
        message.subject,
        message.recipient_line()
    );
    notifier.send(&message)?;

    Ok(RunSummary {
        degraded: report.parse_error.is_some(),
        run: report.run,
        report_path: report.report_path,
        tally: report.tally,
        subject: message.subject,
        recipients: message.recipients.len(),
    })
}
