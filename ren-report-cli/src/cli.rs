use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use colored::Colorize;
use ren_report::{
    MailCommandNotifier, OutboxNotifier, OutcomeTally, Renderer, ReportConfig, ReportError,
    RunSummary, prepare,
};

use crate::logging;

/// Config file picked up from the working directory when `--config` is absent.
const DEFAULT_CONFIG_FILE: &str = "ren-report.yaml";

#[derive(Parser, Debug)]
#[command(
    name = "ren-report",
    version,
    about = "Mail an HTML summary of the latest test run",
    long_about = "Finds the newest <root>/<prefix>* run directory, tallies the outcomes in its report \
                  and mails the summary and detail tables with an inline icon.\n\n\
                  Configuration precedence: CLI > config file > defaults.",
    after_help = "Examples:\n  ren-report --config ren-report.yaml\n  ren-report --root /data/runs --outbox ./outbox -v\n  ren-report --print-html > report.html"
)]
pub struct Cli {
    /// YAML configuration file (default: ./ren-report.yaml when present)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory holding the run directories
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Run directory name prefix
    #[arg(long)]
    pub prefix: Option<String>,

    /// Write the message as an .eml file into DIR instead of sending it
    #[arg(long, value_name = "DIR", conflicts_with = "print_html")]
    pub outbox: Option<PathBuf>,

    /// Print the rendered HTML body to stdout; nothing is sent
    #[arg(long)]
    pub print_html: bool,

    /// Print the run summary as JSON instead of text
    #[arg(long, conflicts_with = "print_html")]
    pub json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Load the config file (if any) and apply CLI overrides.
    fn resolve_config(&self) -> Result<ReportConfig> {
        let mut config = match self.config_path() {
            Some(path) => ReportConfig::load(&path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => ReportConfig::default(),
        };
        if let Some(root) = &self.root {
            config.root.clone_from(root);
        }
        if let Some(prefix) = &self.prefix {
            config.prefix.clone_from(prefix);
        }
        Ok(config)
    }

    fn config_path(&self) -> Option<PathBuf> {
        self.config.clone().or_else(|| {
            let fallback = Path::new(DEFAULT_CONFIG_FILE);
            fallback.is_file().then(|| fallback.to_path_buf())
        })
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    run_with(&cli, &mut std::io::stdout().lock())
}

fn run_with(cli: &Cli, out: &mut dyn Write) -> Result<()> {
    let config = cli.resolve_config()?;

    if cli.print_html {
        let report = prepare(&config)?;
        write!(out, "{}", Renderer::new(&config).body(&report.tally, &report.rows))?;
        return Ok(());
    }

    config.validate()?;
    let mut written = None;
    let result = match &cli.outbox {
        Some(dir) => {
            let mut notifier = OutboxNotifier::new(dir.clone(), config.transport.from.clone());
            let summary = ren_report::run(&config, &mut notifier);
            written = notifier.written().first().cloned();
            summary
        }
        None => ren_report::run(&config, &mut MailCommandNotifier::new(config.transport.clone())),
    };

    let summary = match result {
        Ok(summary) => summary,
        Err(ReportError::Send(e)) => return Err(anyhow::Error::new(e).context("sending email")),
        Err(e) => return Err(e.into()),
    };
    if cli.json {
        write_json(&summary, out)
    } else {
        write_human(&summary, written.as_deref(), out)
    }
}

/// Format a [`RunSummary`] as JSON to a writer.
fn write_json(summary: &RunSummary, out: &mut dyn Write) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    writeln!(out, "{json}")?;
    Ok(())
}

fn write_human(summary: &RunSummary, written: Option<&Path>, out: &mut dyn Write) -> Result<()> {
    if let Some(path) = written {
        writeln!(out, "Message written to {}", path.display())?;
    }
    writeln!(out, "Run directory: {}", summary.run.path.display())?;
    if summary.degraded {
        writeln!(
            out,
            "{} {} could not be parsed; sent an empty report",
            "warning:".yellow().bold(),
            summary.report_path.display()
        )?;
    }
    writeln!(out, "{}", tally_line(&summary.tally))?;
    writeln!(
        out,
        "{} Email sent successfully. ({} recipient(s))",
        "\u{2713}".green(),
        summary.recipients
    )?;
    Ok(())
}

fn tally_line(tally: &OutcomeTally) -> String {
    format!(
        "Total: {}  Success: {}  Failed: {}  Error: {}  Inconclusive: {}  None: {}",
        tally.total, tally.success, tally.failed, tally.error, tally.inconclusive, tally.none
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_cli_overrides_config_file() {
        let tmp = TempDir::new().unwrap();
        let cfg_path = tmp.path().join("cfg.yaml");
        fs::write(&cfg_path, "root: /from/file\nprefix: FILE_\nrecipients: [a@example.com]\n")
            .unwrap();

        let cli = Cli::try_parse_from([
            "ren-report",
            "--config",
            cfg_path.to_str().unwrap(),
            "--prefix",
            "CLI_",
        ])
        .unwrap();
        let config = cli.resolve_config().unwrap();

        assert_eq!(config.root, PathBuf::from("/from/file"));
        assert_eq!(config.prefix, "CLI_");
        assert_eq!(config.recipients, vec!["a@example.com"]);
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let cli = Cli::try_parse_from(["ren-report", "--config", "/nonexistent/ren.yaml"]).unwrap();
        let err = cli.resolve_config().unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/ren.yaml"));
    }

    #[test]
    fn test_outbox_conflicts_with_print_html() {
        let parsed = Cli::try_parse_from(["ren-report", "--outbox", "out", "--print-html"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_verbosity_counts() {
        let cli = Cli::try_parse_from(["ren-report", "-vv", "--root", "/runs"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.root, Some(PathBuf::from("/runs")));
    }

    fn run_root(report: &str) -> TempDir {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("CX_BT_MAIN_1");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("CX_BT_MAIN.prf"), report).unwrap();
        tmp
    }

    fn output(cli: &Cli) -> Result<String> {
        let mut out = Vec::new();
        run_with(cli, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_print_html_renders_without_sending() {
        let tmp = run_root(
            r#"{"project": {"children": [{"name": "A", "origResult": "SUCCESS"}]}}"#,
        );
        let root = tmp.path().to_str().unwrap();
        // No recipients and no icon: a send would fail validation.
        let cli = Cli::try_parse_from(["ren-report", "--root", root, "--print-html"]).unwrap();

        let html = output(&cli).unwrap();

        assert!(html.contains("class=\"count-table\""));
        assert!(html.contains("<td>A</td>"));
        assert!(html.contains("<img src='cid:icon'"));
        assert!(!html.contains("Email sent"));
    }

    #[test]
    fn test_send_without_recipients_is_rejected() {
        let tmp = run_root(r#"{"project": {"children": []}}"#);
        let root = tmp.path().to_str().unwrap();
        let cli = Cli::try_parse_from(["ren-report", "--root", root]).unwrap();

        let err = output(&cli).unwrap_err();
        assert!(format!("{err:#}").contains("recipients"), "got: {err:#}");
    }

    #[test]
    fn test_json_summary_after_outbox_delivery() {
        let tmp = run_root(
            r#"{"project": {"children": [{"name": "A", "origResult": "FAILED"}, {"name": "B", "origResult": "BOGUS"}]}}"#,
        );
        let icon = tmp.path().join("icon.png");
        fs::write(&icon, [0x89, b'P', b'N', b'G']).unwrap();
        let cfg_path = tmp.path().join("cfg.yaml");
        fs::write(
            &cfg_path,
            format!(
                "root: {}\nicon_path: {}\nrecipients: [qa@example.com]\n",
                tmp.path().display(),
                icon.display()
            ),
        )
        .unwrap();
        let outbox = tmp.path().join("outbox");

        let cli = Cli::try_parse_from([
            "ren-report",
            "--config",
            cfg_path.to_str().unwrap(),
            "--outbox",
            outbox.to_str().unwrap(),
            "--json",
        ])
        .unwrap();
        let json: serde_json::Value = serde_json::from_str(&output(&cli).unwrap()).unwrap();

        assert_eq!(json["run"]["name"], "CX_BT_MAIN_1");
        assert_eq!(json["tally"]["total"], 2);
        assert_eq!(json["tally"]["failed"], 1);
        assert_eq!(json["degraded"], false);
        assert_eq!(json["recipients"], 1);
        assert_eq!(fs::read_dir(&outbox).unwrap().count(), 1);
    }

    #[test]
    fn test_json_conflicts_with_print_html() {
        assert!(Cli::try_parse_from(["ren-report", "--json", "--print-html"]).is_err());
    }

    #[test]
    fn test_tally_line() {
        let tally = OutcomeTally {
            total: 3,
            success: 1,
            failed: 1,
            ..OutcomeTally::default()
        };
        assert_eq!(
            tally_line(&tally),
            "Total: 3  Success: 1  Failed: 1  Error: 0  Inconclusive: 0  None: 0"
        );
    }
}
