use anyhow::{Context, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};

use crate::aggregate::MonthlySummary;
use crate::config::{config_path, FilterConfig};
use crate::filter::Field;
use crate::import::TransactionBatch;
use crate::models::Transaction;
use crate::report::{build_report, Report};
use crate::util::format_amount;

const BAR_WIDTH: usize = 20;

pub(crate) fn as_cli(args: &[String]) -> Result<()> {
    let Some(command) = args.get(1) else {
        print_usage();
        return Ok(());
    };
    let opts = Options::parse(&args[2..])?;
    match command.as_str() {
        "summary" | "s" => cli_summary(&opts),
        "json" => cli_json(&opts),
        "export" => cli_export(&opts),
        "notices" => cli_notices(&opts),
        "list" | "ls" => cli_list(&opts),
        "config" => cli_config(&opts),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("savings {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

fn print_usage() {
    let fields: Vec<&str> = Field::all().iter().map(Field::as_str).collect();
    println!("savings: monthly income and spending from a transaction feed");
    println!();
    println!("Usage: savings <command> [options]");
    println!();
    println!("Commands:");
    println!("  summary <file>                Print monthly income, spending and savings");
    println!("  json <file>                   Print the monthly summary as JSON");
    println!("  export <file> [out.csv]       Export the monthly summary to CSV");
    println!("  notices <file>                Show what the filters dropped and why");
    println!("  list <file>                   List transactions that survive the filters");
    println!("  config [init]                 Show the effective config, or write the defaults");
    println!("  --help, -h                    Show this help");
    println!("  --version, -V                 Show version");
    println!();
    println!("Input files are JSON feed dumps, or CSV when the name ends in .csv");
    println!();
    println!("Options:");
    println!("  --config <path>               Config file (default: {})", default_config_label());
    println!("  --tolerance-hours <n>         Pairing window for reconciliation (default: 24)");
    println!("  --no-reconcile                Keep equal-and-opposite pairs");
    println!("  --exclude <a, b, ...>         Comma-separated text to exclude");
    println!("  --exclude-regex <pattern>     Exclude by regular expression instead");
    println!("  --no-exclude                  Turn exclusion off");
    println!("  --field <name>                Field to match: {}", fields.join(", "));
    println!("  --timezone <+HH:MM>           Offset used to assign months");
    println!("  --verbose, -v                 Debug logging to stderr");
}

fn default_config_label() -> String {
    config_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "none".into())
}

// ── Options ──────────────────────────────────────────────────

/// Positional arguments plus the flags that override the config file.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct Options {
    pub(crate) positional: Vec<String>,
    pub(crate) config_path: Option<PathBuf>,
    pub(crate) tolerance_hours: Option<i64>,
    pub(crate) no_reconcile: bool,
    pub(crate) exclude: Option<String>,
    pub(crate) exclude_regex: Option<String>,
    pub(crate) no_exclude: bool,
    pub(crate) field: Option<String>,
    pub(crate) timezone: Option<String>,
}

impl Options {
    pub(crate) fn parse(args: &[String]) -> Result<Self> {
        let mut opts = Self::default();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            let flag = arg.as_str();
            let mut value = |flag: &str| {
                iter.next()
                    .cloned()
                    .ok_or_else(|| anyhow::anyhow!("{flag} needs a value"))
            };
            match flag {
                "--config" => opts.config_path = Some(PathBuf::from(shellexpand(&value(flag)?))),
                "--tolerance-hours" => {
                    let raw = value(flag)?;
                    let hours = raw
                        .trim()
                        .parse()
                        .with_context(|| format!("Invalid --tolerance-hours: {raw}"))?;
                    opts.tolerance_hours = Some(hours);
                }
                "--no-reconcile" => opts.no_reconcile = true,
                "--exclude" => opts.exclude = Some(value(flag)?),
                "--exclude-regex" => opts.exclude_regex = Some(value(flag)?),
                "--no-exclude" => opts.no_exclude = true,
                "--field" => opts.field = Some(value(flag)?),
                "--timezone" | "--tz" => opts.timezone = Some(value(flag)?),
                "--verbose" | "-v" => {}
                _ if flag.starts_with("--") => anyhow::bail!("Unknown option: {flag}"),
                _ => opts.positional.push(arg.clone()),
            }
        }
        Ok(opts)
    }

    /// Layer the command-line flags over a loaded config.
    pub(crate) fn apply(&self, config: &mut FilterConfig) {
        if let Some(hours) = self.tolerance_hours {
            config.reconcile.tolerance_secs = hours.saturating_mul(3600);
        }
        if self.no_reconcile {
            config.reconcile.enabled = false;
        }
        if let Some(patterns) = &self.exclude {
            config.exclude.patterns = patterns.clone();
            config.exclude.regex = None;
            config.exclude.enabled = true;
        }
        if let Some(pattern) = &self.exclude_regex {
            config.exclude.regex = Some(pattern.clone());
            config.exclude.enabled = true;
        }
        if self.no_exclude {
            config.exclude.enabled = false;
        }
        if let Some(field) = &self.field {
            config.exclude.field = field.clone();
        }
        if let Some(tz) = &self.timezone {
            config.timezone = Some(tz.clone());
        }
    }

    fn config(&self) -> Result<FilterConfig> {
        let path = match &self.config_path {
            Some(p) => p.clone(),
            None => config_path()?,
        };
        let mut config = FilterConfig::load(&path)?;
        self.apply(&mut config);
        Ok(config)
    }

    fn input(&self, usage: &str) -> Result<&Path> {
        let Some(file) = self.positional.first() else {
            anyhow::bail!("Usage: savings {usage}");
        };
        let path = Path::new(file);
        if !path.exists() {
            anyhow::bail!("File not found: {file}");
        }
        Ok(path)
    }

    fn report(&self, usage: &str) -> Result<Report> {
        let batch = TransactionBatch::load(self.input(usage)?)?;
        let config = self.config()?;
        Ok(build_report(&batch, &config))
    }
}

// ── Commands ─────────────────────────────────────────────────

fn cli_summary(opts: &Options) -> Result<()> {
    let report = opts.report("summary <file>")?;
    print!("{}", summary_table(&report.summary));
    println!();
    let (saved, overspent): (Vec<_>, Vec<_>) = report
        .summary
        .months()
        .partition(|(_, agg)| agg.deficit() == Decimal::ZERO);
    let surplus: Decimal = saved.iter().map(|(_, agg)| agg.surplus()).sum();
    let deficit: Decimal = overspent.iter().map(|(_, agg)| agg.deficit()).sum();
    println!(
        "  {} months saved {}, {} months overspent {}",
        saved.len(),
        format_amount(surplus),
        overspent.len(),
        format_amount(deficit)
    );
    println!(
        "  {} transactions kept, {} notices",
        report.transactions.len(),
        report.notices.len()
    );
    Ok(())
}

/// Plain-text table of the summary, average last, with a spending bar
/// scaled to the heaviest month.
pub(crate) fn summary_table(summary: &MonthlySummary) -> String {
    let peak = summary.max().spent;
    let mut out = format!(
        "{:<8} {:>14} {:>14} {:>14}  Spent\n",
        "Month", "Income", "Spent", "Savings"
    );
    out.push_str(&"─".repeat(75));
    out.push('\n');
    for (bucket, agg) in summary.rows() {
        let bar = if bucket.is_month() {
            "█".repeat(bar_len(agg.spent, peak))
        } else {
            String::new()
        };
        out.push_str(&format!(
            "{:<8} {:>14} {:>14} {:>14}  {bar}\n",
            bucket.as_str(),
            format_amount(agg.income),
            format_amount(agg.spent),
            format_amount(agg.savings()),
        ));
    }
    out
}

fn bar_len(value: Decimal, peak: Decimal) -> usize {
    if peak <= Decimal::ZERO {
        return 0;
    }
    (value / peak * Decimal::from(BAR_WIDTH))
        .round()
        .to_usize()
        .unwrap_or(0)
        .min(BAR_WIDTH)
}

fn cli_json(opts: &Options) -> Result<()> {
    let report = opts.report("json <file>")?;
    let json = serde_json::to_string_pretty(&report.summary).context("serialize summary")?;
    println!("{json}");
    Ok(())
}

fn cli_export(opts: &Options) -> Result<()> {
    let input = opts.input("export <file> [out.csv]")?;
    let output_path = opts
        .positional
        .get(1)
        .map(|a| shellexpand(a))
        .unwrap_or_else(|| {
            let stem = input
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "summary".into());
            format!("{stem}-summary.csv")
        });

    let report = opts.report("export <file> [out.csv]")?;
    let count = crate::export::export_to_csv(&report.summary, Path::new(&output_path))?;
    println!("Exported {count} rows to {output_path}");
    Ok(())
}

fn cli_notices(opts: &Options) -> Result<()> {
    let report = opts.report("notices <file>")?;
    if report.notices.is_empty() {
        println!("No notices");
        return Ok(());
    }
    for notice in &report.notices {
        println!("{notice}");
    }
    Ok(())
}

fn cli_list(opts: &Options) -> Result<()> {
    let report = opts.report("list <file>")?;
    if report.transactions.is_empty() {
        println!("No transactions");
        return Ok(());
    }

    println!(
        "{:<26} {:>12} {:<28} {:<16} {:<10} Account",
        "Time", "Amount", "Merchant", "Category", "Cleared"
    );
    println!("{}", "─".repeat(110));
    for txn in &report.transactions {
        let amount = txn
            .value()
            .map(format_amount)
            .unwrap_or_else(|| "?".into());
        println!(
            "{:<26} {:>12} {:<28} {:<16} {:<10} {}",
            txn.transaction_time().unwrap_or("(no time)"),
            amount,
            truncate(txn.label(), 28),
            truncate(txn.categorization().unwrap_or(""), 16),
            cleared_label(txn),
            txn.account_id().unwrap_or(""),
        );
    }
    Ok(())
}

/// `pending`, the clear date, or blank when the feed says neither.
fn cleared_label(txn: &Transaction) -> String {
    if txn.is_pending() == Some(true) {
        return "pending".into();
    }
    txn.clear_date()
        .and_then(chrono::DateTime::from_timestamp_millis)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn cli_config(opts: &Options) -> Result<()> {
    let path = match &opts.config_path {
        Some(p) => p.clone(),
        None => config_path()?,
    };

    if opts.positional.first().map(String::as_str) == Some("init") {
        if path.exists() {
            anyhow::bail!("Config already exists: {}", path.display());
        }
        FilterConfig::default().save(&path)?;
        println!("Wrote default config to {}", path.display());
        return Ok(());
    }

    let config = opts.config()?;
    let text = toml::to_string_pretty(&config).context("serialize config")?;
    println!("# {}", path.display());
    print!("{text}");
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

pub(crate) fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        format!("{home}/{rest}")
    } else {
        path.to_string()
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
