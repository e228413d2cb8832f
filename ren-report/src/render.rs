//! HTML rendering of the summary and detail tables.
//!
//! Output is a pure function of the configuration, tally and rows, so the
//! same input always produces byte-identical markup. Report values are
//! escaped unless `escape_html` is off, in which case they are inlined raw.
//! Configuration text (dashboard label, lead-in) is trusted HTML.

use std::borrow::Cow;

use crate::config::{ColorPair, ReportConfig, TOTAL_LABEL};
use crate::tally::{Outcome, OutcomeTally, ResultRow};

const TABLE_OPEN: &str = r#"<div style="width: 50%; margin: 0 auto;">
    <table border="1" style="border-collapse: collapse; width: 31%; text-align: center;""#;

const HEADER_ROW_STYLE: &str =
    "font-size: 18px; font-weight: bold; background-color: lightgray;";

const TABLE_CLOSE: &str = "    </table>\n</div>\n";

/// Renders report fragments using one configuration.
#[derive(Debug, Clone)]
pub struct Renderer<'a> {
    config: &'a ReportConfig,
}

impl<'a> Renderer<'a> {
    #[must_use]
    pub fn new(config: &'a ReportConfig) -> Self {
        Self { config }
    }

    /// Colours for an outcome label, falling back for unknown or missing labels.
    #[must_use]
    pub fn colors_for(&self, label: Option<&str>) -> &'a ColorPair {
        label
            .and_then(|l| self.config.palette.get(l))
            .unwrap_or(&self.config.fallback_colors)
    }

    /// Summary table: the five categories in fixed order, then Total.
    #[must_use]
    pub fn summary_table(&self, tally: &OutcomeTally) -> String {
        let category_rows = Outcome::ALL.iter().map(|outcome| {
            summary_row(
                outcome.caption(),
                tally.count(*outcome),
                self.colors_for(Some(outcome.label())),
            )
        });
        let total_row = summary_row("Total", tally.total, self.colors_for(Some(TOTAL_LABEL)));
        let body: String = category_rows.chain(std::iter::once(total_row)).collect();

        format!(
            "{TABLE_OPEN} class=\"count-table\">\n{}{body}{TABLE_CLOSE}",
            header_row("Count Type", "Count")
        )
    }

    /// Detail table: one row per result in source order.
    #[must_use]
    pub fn detail_table(&self, rows: &[ResultRow]) -> String {
        let body: String = rows.iter().map(|row| self.detail_row(row)).collect();
        format!(
            "{TABLE_OPEN} class=\"data-table\">\n{}{body}{TABLE_CLOSE}",
            header_row("Name", "OrigResult")
        )
    }

    /// Full mail body: intro, summary table, spacer, detail table.
    #[must_use]
    pub fn body(&self, tally: &OutcomeTally, rows: &[ResultRow]) -> String {
        let cfg = self.config;
        let icon = format!(
            "<div style=\"text-align: left; margin: 1px;\">\n    <p><img src='cid:{}' style='width: 100px; height: 100px;' alt='icon' /></p>\n</div>\n",
            cfg.icon_cid
        );
        let dashboard = if cfg.dashboard_url.is_empty() {
            String::new()
        } else {
            format!(
                "<p style=\"text-align: left;\">\n    {}: <a href=\"{}\">Click Here</a>\n</p>\n",
                cfg.dashboard_label, cfg.dashboard_url
            )
        };
        format!(
            "{icon}{dashboard}<p>{}</p>\n{}<p>&nbsp;</p>\n{}",
            cfg.lead_in,
            self.summary_table(tally),
            self.detail_table(rows)
        )
    }

    fn detail_row(&self, row: &ResultRow) -> String {
        let colors = self.colors_for(row.outcome.as_deref());
        format!(
            "        <tr><td>{}</td><td style='background-color: {}; color: {};'>{}</td></tr>\n",
            self.text(row.name.as_deref()),
            colors.background,
            colors.foreground,
            self.text(row.outcome.as_deref())
        )
    }

    fn text<'s>(&self, value: Option<&'s str>) -> Cow<'s, str> {
        let value = value.unwrap_or_default();
        if self.config.escape_html {
            escape_html(value)
        } else {
            Cow::Borrowed(value)
        }
    }
}

fn summary_row(caption: &str, count: usize, colors: &ColorPair) -> String {
    format!(
        "        <tr style=\"background-color: {}; color: {};\">\n            <td>{caption}</td>\n            <td>{count}</td>\n        </tr>\n",
        colors.background, colors.foreground
    )
}

fn header_row(first: &str, second: &str) -> String {
    format!(
        "        <tr style=\"{HEADER_ROW_STYLE}\">\n            <th>{first}</th>\n            <th>{second}</th>\n        </tr>\n"
    )
}

/// Escape the five HTML-significant characters.
#[must_use]
pub fn escape_html(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(value);
    }
    let mut out = String::with_capacity(value.len() + 16);
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}
