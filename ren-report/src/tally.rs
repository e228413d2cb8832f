//! Outcome vocabulary, result rows and per-category tallies.

use serde::Serialize;

/// One of the five outcome labels the test tool emits.
///
/// Labels are matched case-sensitively; anything else is unrecognized and
/// only contributes to the Total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// `ERROR`: the test could not run to completion.
    Error,
    /// `SUCCESS`: all checks passed.
    Success,
    /// `FAILED`: at least one check failed.
    Failed,
    /// `INCONCLUSIVE`: the run finished without a verdict.
    Inconclusive,
    /// `NONE`: no verdict was recorded.
    None,
}

impl Outcome {
    /// Summary table order.
    pub const ALL: [Self; 5] = [
        Self::Error,
        Self::Success,
        Self::Failed,
        Self::Inconclusive,
        Self::None,
    ];

    /// Match a raw `origResult` value.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "ERROR" => Some(Self::Error),
            "SUCCESS" => Some(Self::Success),
            "FAILED" => Some(Self::Failed),
            "INCONCLUSIVE" => Some(Self::Inconclusive),
            "NONE" => Some(Self::None),
            _ => Option::None,
        }
    }

    /// The raw label as it appears in reports and palette keys.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
            Self::Inconclusive => "INCONCLUSIVE",
            Self::None => "NONE",
        }
    }

    /// Row caption in the summary table.
    #[must_use]
    pub fn caption(self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::Success => "Success",
            Self::Failed => "Failed",
            Self::Inconclusive => "Inconclusive",
            Self::None => "None",
        }
    }
}

/// A `{name, outcome}` projection of one report child, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    /// Test item name, `None` when absent or not a string.
    pub name: Option<String>,
    /// Raw `origResult` value, `None` when absent or not a string.
    pub outcome: Option<String>,
}

impl ResultRow {
    #[must_use]
    pub fn new(name: &str, outcome: &str) -> Self {
        Self {
            name: Some(name.to_owned()),
            outcome: Some(outcome.to_owned()),
        }
    }

    /// Known category of this row, if its label is one of the five.
    #[must_use]
    pub fn category(&self) -> Option<Outcome> {
        self.outcome.as_deref().and_then(Outcome::from_label)
    }
}

/// Count of rows per known outcome plus the overall Total.
///
/// `categorized() <= total`, with equality exactly when every row carries a
/// known label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeTally {
    /// Rows labelled `ERROR`.
    pub error: usize,
    /// Rows labelled `SUCCESS`.
    pub success: usize,
    /// Rows labelled `FAILED`.
    pub failed: usize,
    /// Rows labelled `INCONCLUSIVE`.
    pub inconclusive: usize,
    /// Rows labelled `NONE`.
    pub none: usize,
    /// All rows, recognized or not.
    pub total: usize,
}

impl OutcomeTally {
    #[must_use]
    pub fn from_rows(rows: &[ResultRow]) -> Self {
        let mut tally = Self {
            total: rows.len(),
            ..Self::default()
        };
        for outcome in rows.iter().filter_map(ResultRow::category) {
            *tally.slot(outcome) += 1;
        }
        tally
    }

    /// Count for one category.
    #[must_use]
    pub fn count(&self, outcome: Outcome) -> usize {
        match outcome {
            Outcome::Error => self.error,
            Outcome::Success => self.success,
            Outcome::Failed => self.failed,
            Outcome::Inconclusive => self.inconclusive,
            Outcome::None => self.none,
        }
    }

    /// Sum of the five category counts.
    #[must_use]
    pub fn categorized(&self) -> usize {
        Outcome::ALL.iter().map(|o| self.count(*o)).sum()
    }

    /// Rows whose label is not one of the five known outcomes.
    ///
    /// Zero when the category counts exceed `total`, which only happens for
    /// hand-built tallies.
    #[must_use]
    pub fn unrecognized(&self) -> usize {
        self.total.saturating_sub(self.categorized())
    }

    fn slot(&mut self, outcome: Outcome) -> &mut usize {
        match outcome {
            Outcome::Error => &mut self.error,
            Outcome::Success => &mut self.success,
            Outcome::Failed => &mut self.failed,
            Outcome::Inconclusive => &mut self.inconclusive,
            Outcome::None => &mut self.none,
        }
    }
}
