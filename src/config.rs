use anyhow::{Context, Result};
use chrono::{Duration, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::filter::{Field, Filter, PatternFilter, ReconcileFilter};

/// Which filters run, in what order, and how they are tuned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct FilterConfig {
    /// Filter names in application order: `reconcile`, `exclude`.
    pub(crate) order: Vec<String>,
    /// Fixed UTC offset used for month bucketing, e.g. `-05:00`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) timezone: Option<String>,
    pub(crate) reconcile: ReconcileSection,
    pub(crate) exclude: ExcludeSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct ReconcileSection {
    pub(crate) enabled: bool,
    pub(crate) tolerance_secs: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct ExcludeSection {
    pub(crate) enabled: bool,
    pub(crate) field: String,
    /// Comma-separated, matched case-insensitively as literal text.
    pub(crate) patterns: String,
    /// A raw regular expression; when set it replaces `patterns`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) regex: Option<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            order: vec!["reconcile".into(), "exclude".into()],
            timezone: None,
            reconcile: ReconcileSection::default(),
            exclude: ExcludeSection::default(),
        }
    }
}

impl Default for ReconcileSection {
    fn default() -> Self {
        Self {
            enabled: true,
            tolerance_secs: crate::filter::DEFAULT_TOLERANCE_SECS,
        }
    }
}

impl Default for ExcludeSection {
    fn default() -> Self {
        Self {
            enabled: true,
            field: Field::Merchant.as_str().into(),
            patterns: "donut, dunkin".into(),
            regex: None,
        }
    }
}

/// Longest tolerance honoured; larger values are clamped.
const MAX_TOLERANCE_SECS: i64 = 100 * 366 * 24 * 60 * 60;

impl FilterConfig {
    pub(crate) fn tolerance(&self) -> Duration {
        let secs = self
            .reconcile
            .tolerance_secs
            .clamp(-MAX_TOLERANCE_SECS, MAX_TOLERANCE_SECS);
        Duration::seconds(secs)
    }

    /// Parsed `timezone`. An unparseable value is ignored with a warning.
    pub(crate) fn offset(&self) -> Option<FixedOffset> {
        let tz = self.timezone.as_deref()?;
        let offset = parse_offset(tz);
        if offset.is_none() {
            tracing::warn!(timezone = tz, "unrecognised timezone offset; using feed months");
        }
        offset
    }

    /// Build the enabled filters in configured order.
    pub(crate) fn build_filters(&self) -> Vec<Box<dyn Filter>> {
        let mut filters: Vec<Box<dyn Filter>> = Vec::new();
        for name in &self.order {
            match name.trim().to_lowercase().as_str() {
                "reconcile" if self.reconcile.enabled => {
                    filters.push(Box::new(ReconcileFilter::new(self.tolerance())));
                }
                "exclude" if self.exclude.enabled => {
                    let Some(field) = Field::parse(&self.exclude.field) else {
                        tracing::warn!(
                            field = %self.exclude.field,
                            "unknown exclude field; exclusion skipped"
                        );
                        continue;
                    };
                    let filter = match &self.exclude.regex {
                        Some(pattern) => PatternFilter::reject_by_field(field, pattern),
                        None => {
                            PatternFilter::by_comma_list(field, Some(&self.exclude.patterns), true)
                        }
                    }
                    .named("exclude");
                    filters.push(Box::new(filter));
                }
                "reconcile" | "exclude" => {}
                other => tracing::warn!(filter = other, "unknown filter in order; skipped"),
            }
        }
        filters
    }

    pub(crate) fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        toml::from_str(&s).with_context(|| format!("parse {}", path.display()))
    }

    pub(crate) fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
        }
        let s = toml::to_string_pretty(self).context("serialize config")?;
        fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }
}

pub(crate) fn config_path() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "savings", "Savings")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    Ok(proj_dirs.config_dir().join("config.toml"))
}

/// `Z`, `UTC`, `+HH:MM`, `-HH:MM` or `+HHMM`.
pub(crate) fn parse_offset(s: &str) -> Option<FixedOffset> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("z") || s.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0);
    }
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
