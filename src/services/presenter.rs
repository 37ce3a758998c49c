//! Turns a successful submission into the summary card shown to the user.

use crate::models::SuccessPayload;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Metrics shown in the summary, in display order.
pub const DEFAULT_METRICS: [&str; 6] = ["reach", "views", "likes", "comments", "shares", "saves"];

pub const NO_METRICS_NOTICE: &str = "No visual metrics were extracted.";
pub const SUMMARY_TITLE: &str = "Post registered!";

/// Base of the secondary link to the spreadsheet the backend writes to.
pub const SHEET_URL_BASE: &str = "https://docs.google.com/spreadsheets/d/";

pub fn sheet_link(sheet_id: &str) -> String {
    format!("{}{}", SHEET_URL_BASE, sheet_id)
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct MetricEntry {
    pub name: String,
    pub label: String,
    /// Value formatted with thousands separators.
    pub value: String,
}

/// Structured outcome of a successful submission.
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct Summary {
    /// Whitelisted metrics that were reported, in whitelist order.
    pub entries: Vec<MetricEntry>,
    /// Set instead of `entries` when no whitelisted metric was reported.
    pub notice: Option<String>,
    /// Folder holding the uploaded screenshots.
    pub storage_link: Option<String>,
    /// Fixed link to the data sink (the spreadsheet).
    pub reference_link: Option<String>,
    /// When the backend confirmed the submission.
    pub completed_at: DateTime<Utc>,
}

impl Summary {
    pub fn entry(&self, name: &str) -> Option<&MetricEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", SUMMARY_TITLE)?;
        if let Some(notice) = &self.notice {
            writeln!(f, "  {}", notice)?;
        }
        let width = self.entries.iter().map(|e| e.label.len()).max().unwrap_or(0);
        for entry in &self.entries {
            writeln!(f, "  {:<width$}  {}", entry.label, entry.value, width = width)?;
        }
        if let Some(link) = &self.storage_link {
            writeln!(f, "  Screenshots: {}", link)?;
        }
        if let Some(link) = &self.reference_link {
            writeln!(f, "  Data sheet:  {}", link)?;
        }
        writeln!(
            f,
            "  Registered at {}",
            self.completed_at.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct PresenterConfig {
    /// Metric whitelist, in display order.
    pub metrics: Vec<String>,
    pub thousands_separator: char,
    pub decimal_separator: char,
    pub reference_link: Option<String>,
}

impl Default for PresenterConfig {
    fn default() -> Self {
        Self {
            metrics: DEFAULT_METRICS.iter().map(|m| m.to_string()).collect(),
            thousands_separator: '.',
            decimal_separator: ',',
            reference_link: None,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ResultPresenter {
    config: PresenterConfig,
}

impl ResultPresenter {
    pub fn new(config: PresenterConfig) -> Self {
        Self { config }
    }

    pub fn present(&self, payload: &SuccessPayload) -> Summary {
        let entries: Vec<MetricEntry> = self
            .config
            .metrics
            .iter()
            .filter_map(|name| {
                payload.metric(name).map(|value| MetricEntry {
                    name: name.clone(),
                    label: metric_label(name),
                    value: format_number(
                        value,
                        self.config.thousands_separator,
                        self.config.decimal_separator,
                    ),
                })
            })
            .collect();

        let notice = entries
            .is_empty()
            .then(|| NO_METRICS_NOTICE.to_string());

        Summary {
            entries,
            notice,
            storage_link: payload.storage_link.clone(),
            reference_link: self.config.reference_link.clone(),
            completed_at: Utc::now(),
        }
    }
}

fn metric_label(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>().replace('_', " "),
        None => String::new(),
    }
}

/// Integer digits below which no thousands separator is inserted, so 1234
/// stays `1234` while 12500 becomes `12.500`.
const MIN_GROUPING_DIGITS: usize = 5;

/// Format a number with grouped thousands and at most three fraction digits.
pub fn format_number(value: f64, thousands: char, decimal: char) -> String {
    let negative = value < 0.0;
    let scaled = (value.abs() * 1000.0).round() as u128;
    let int_part = scaled / 1000;
    let frac_part = scaled % 1000;

    let digits = int_part.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 4);
    if negative && scaled > 0 {
        grouped.push('-');
    }
    let group = digits.len() >= MIN_GROUPING_DIGITS;
    for (i, ch) in digits.chars().enumerate() {
        if group && i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(thousands);
        }
        grouped.push(ch);
    }

    if frac_part > 0 {
        let frac = format!("{:03}", frac_part);
        grouped.push(decimal);
        grouped.push_str(frac.trim_end_matches('0'));
    }
    grouped
}
