//! Configuration for a report run.
//!
//! Every environment-specific value lives here so the pipeline itself holds
//! no literals. The file format is YAML; omitted keys fall back to the
//! defaults below, and `palette` entries are merged over the built-in palette
//! rather than replacing it.
//!
//! ```yaml
//! root: /data/runs
//! prefix: CX_BT_MAIN_
//! report_file: CX_BT_MAIN.prf
//! icon_path: /data/icon.png
//! recipients: [qa@example.com, lead@example.com]
//! subject: "REN {run}"
//! palette:
//!   SUCCESS: { background: lime, foreground: black }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::tally::Outcome;

/// Palette key used for the synthetic Total row.
pub const TOTAL_LABEL: &str = "TOTAL";

/// Default report size limit (64 MiB).
pub const DEFAULT_MAX_REPORT_BYTES: u64 = 67_108_864;

/// Background and foreground colour of one table row or cell.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColorPair {
    /// CSS `background-color` value.
    pub background: String,
    /// CSS `color` value.
    pub foreground: String,
}

impl ColorPair {
    #[must_use]
    pub fn new(background: &str, foreground: &str) -> Self {
        Self {
            background: background.to_owned(),
            foreground: foreground.to_owned(),
        }
    }
}

impl Default for ColorPair {
    fn default() -> Self {
        Self::new("white", "black")
    }
}

/// Outcome label to colour mapping.
///
/// Keys are matched exactly against `origResult` values and against
/// [`TOTAL_LABEL`] for the summary Total row.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "BTreeMap<String, ColorPair>")]
pub struct Palette {
    colors: BTreeMap<String, ColorPair>,
}

impl Palette {
    /// Colours registered for `label`, if any.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&ColorPair> {
        self.colors.get(label)
    }

    /// Register or replace the colours for `label`.
    pub fn insert(&mut self, label: impl Into<String>, colors: ColorPair) {
        self.colors.insert(label.into(), colors);
    }
}

impl Default for Palette {
    fn default() -> Self {
        let colors = [
            (TOTAL_LABEL, ColorPair::new("gray", "black")),
            (Outcome::Error.label(), ColorPair::new("red", "white")),
            (Outcome::Success.label(), ColorPair::new("green", "black")),
            (Outcome::Failed.label(), ColorPair::new("yellow", "red")),
            (Outcome::None.label(), ColorPair::new("orange", "black")),
            (Outcome::Inconclusive.label(), ColorPair::new("yellow", "black")),
        ]
        .into_iter()
        .map(|(label, pair)| (label.to_owned(), pair))
        .collect();
        Self { colors }
    }
}

impl From<BTreeMap<String, ColorPair>> for Palette {
    fn from(overrides: BTreeMap<String, ColorPair>) -> Self {
        let mut palette = Self::default();
        palette.colors.extend(overrides);
        palette
    }
}

/// Mail submission command used by [`MailCommandNotifier`](crate::MailCommandNotifier).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
#[non_exhaustive]
pub struct TransportConfig {
    /// Program that accepts a complete RFC 5322 message on stdin.
    pub program: String,
    /// Arguments passed to `program`.
    pub args: Vec<String>,
    /// Optional `From:` header; the submission program fills it in when absent.
    pub from: Option<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            program: "sendmail".to_owned(),
            args: vec!["-t".to_owned(), "-i".to_owned()],
            from: None,
        }
    }
}

/// Complete configuration of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
#[non_exhaustive]
pub struct ReportConfig {
    /// Directory holding the run directories.
    pub root: PathBuf,
    /// Required run directory name prefix.
    pub prefix: String,
    /// Report file name inside the run directory.
    pub report_file: String,
    /// Image attached inline at the top of the mail.
    pub icon_path: PathBuf,
    /// Content-ID the body uses to reference the icon.
    pub icon_cid: String,
    /// Mail recipients. Duplicates are kept.
    pub recipients: Vec<String>,
    /// Subject template; `{run}` and `{prefix}` are expanded.
    pub subject: String,
    /// Dashboard link in the mail intro. Empty omits the link.
    pub dashboard_url: String,
    /// Text in front of the dashboard link.
    pub dashboard_label: String,
    /// Sentence introducing the tables.
    pub lead_in: String,
    /// Outcome colours, merged over the defaults.
    pub palette: Palette,
    /// Colours for outcomes missing from `palette`.
    pub fallback_colors: ColorPair,
    /// HTML-escape report values before interpolating them.
    pub escape_html: bool,
    /// Reports larger than this are rejected.
    pub max_report_bytes: u64,
    /// Mail submission command.
    pub transport: TransportConfig,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            prefix: "CX_BT_MAIN_".to_owned(),
            report_file: "CX_BT_MAIN.prf".to_owned(),
            icon_path: PathBuf::from("icon.png"),
            icon_cid: "icon".to_owned(),
            recipients: Vec::new(),
            subject: "REN CX_BT_MAIN".to_owned(),
            dashboard_url: String::new(),
            dashboard_label: "Dashboard".to_owned(),
            lead_in: "Please find below the test case data in table format:".to_owned(),
            palette: Palette::default(),
            fallback_colors: ColorPair::default(),
            escape_html: true,
            max_report_bytes: DEFAULT_MAX_REPORT_BYTES,
            transport: TransportConfig::default(),
        }
    }
}

impl ReportConfig {
    /// Parse a YAML document. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the document is not valid YAML or
    /// contains unknown keys.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_saphyr::from_str::<Self>(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// Read and parse a YAML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read, or
    /// [`ConfigError::Parse`] if it is not a valid configuration.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Check values the pipeline cannot run without.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending option.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.prefix.is_empty() {
            return Err(invalid("prefix", "must not be empty"));
        }
        if self.report_file.trim().is_empty() {
            return Err(invalid("report_file", "must not be empty"));
        }
        if self.recipients.is_empty() {
            return Err(invalid("recipients", "at least one recipient is required"));
        }
        if let Some(pos) = self.recipients.iter().position(|r| r.trim().is_empty()) {
            return Err(invalid(
                "recipients",
                &format!("entry #{} is blank", pos + 1),
            ));
        }
        if self.icon_cid.is_empty() || self.icon_cid.contains(['<', '>', ' ']) {
            return Err(invalid(
                "icon_cid",
                "must be a non-empty token without '<', '>' or spaces",
            ));
        }
        if self.transport.program.trim().is_empty() {
            return Err(invalid("transport.program", "must not be empty"));
        }
        Ok(())
    }

    /// Expand the subject template for a run directory name.
    #[must_use]
    pub fn subject_for(&self, run_name: &str) -> String {
        let mut out = String::with_capacity(self.subject.len() + run_name.len());
        let mut rest = self.subject.as_str();
        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let tail = &rest[start..];
            if let Some(after) = tail.strip_prefix("{run}") {
                out.push_str(run_name);
                rest = after;
            } else if let Some(after) = tail.strip_prefix("{prefix}") {
                out.push_str(&self.prefix);
                rest = after;
            } else {
                out.push('{');
                rest = &tail[1..];
            }
        }
        out.push_str(rest);
        out
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_owned(),
    }
}
