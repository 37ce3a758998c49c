use crate::{
    models::FormSchema,
    services::{
        presenter::{DEFAULT_METRICS, PresenterConfig, sheet_link},
        reset_timer::DEFAULT_DWELL,
        submission_client::{DEFAULT_FILE_FIELD, DEFAULT_TIMEOUT},
    },
};
use anyhow::{Context, Result, bail};
use clap::Parser;
use std::{env, path::PathBuf, str::FromStr, time::Duration};

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000/upload";

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub endpoint: String,
    pub sheet_id: Option<String>,
    pub dwell: Duration,
    pub timeout: Duration,
    pub file_field: String,
    pub schema: FormSchema,
    pub metrics: Vec<String>,
    pub thousands_separator: char,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Submit content-metric screenshots for analysis")]
pub struct Args {
    /// Screenshots to stage (duplicates by name and size are skipped)
    pub files: Vec<PathBuf>,

    /// Form value as `name=value`; repeat for every required field
    #[arg(short = 'f', long = "field", value_name = "NAME=VALUE")]
    pub fields: Vec<String>,

    /// Unstage a file by name after adding (removes every size with that name)
    #[arg(long = "remove", value_name = "NAME")]
    pub remove: Vec<String>,

    /// Upload endpoint (overrides INTAKE_ENDPOINT)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Spreadsheet id for the data-sheet link (overrides INTAKE_SHEET_ID)
    #[arg(long)]
    pub sheet_id: Option<String>,

    /// Seconds the summary stays before the automatic reset (overrides INTAKE_DWELL_SECS)
    #[arg(long)]
    pub dwell_secs: Option<u64>,

    /// Request timeout in seconds (overrides INTAKE_TIMEOUT_SECS)
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Required form fields as `name[:Label],...` (overrides INTAKE_FIELDS)
    #[arg(long)]
    pub schema: Option<String>,

    /// Stay until the automatic reset fires after a successful submission
    #[arg(long)]
    pub wait: bool,

    /// Validate and stage only; print the queue without submitting
    #[arg(long)]
    pub dry_run: bool,
}

impl Args {
    /// Split `--field name=value` pairs. Values may contain `=`.
    pub fn field_pairs(&self) -> Result<Vec<(String, String)>> {
        self.fields
            .iter()
            .map(|raw| match raw.split_once('=') {
                Some((name, value)) if !name.trim().is_empty() => {
                    Ok((name.trim().to_string(), value.to_string()))
                }
                _ => bail!("invalid --field `{}`, expected NAME=VALUE", raw),
            })
            .collect()
    }
}

impl AppConfig {
    /// Merge environment variables and CLI args into AppConfig.
    pub fn from_env_and_args(args: &Args) -> Result<Self> {
        Self::from_lookup(args, |key| env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env_and_args`] with an explicit variable source.
    pub fn from_lookup<F>(args: &Args, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Environment fallback ---
        let env_endpoint = lookup("INTAKE_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.into());
        let env_sheet = lookup("INTAKE_SHEET_ID").filter(|s| !s.trim().is_empty());
        let env_dwell = parse_var(&lookup, "INTAKE_DWELL_SECS")?;
        let env_timeout = parse_var(&lookup, "INTAKE_TIMEOUT_SECS")?;
        let file_field =
            lookup("INTAKE_FILE_FIELD").unwrap_or_else(|| DEFAULT_FILE_FIELD.to_string());
        let env_schema = lookup("INTAKE_FIELDS");
        let metrics = match lookup("INTAKE_METRICS") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string)
                .collect(),
            None => DEFAULT_METRICS.iter().map(|m| m.to_string()).collect(),
        };
        let thousands_separator = match lookup("INTAKE_THOUSANDS_SEP") {
            Some(raw) => {
                let mut chars = raw.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => c,
                    _ => bail!("INTAKE_THOUSANDS_SEP must be a single character, got `{}`", raw),
                }
            }
            None => '.',
        };

        // --- Merge ---
        let schema = match args.schema.clone().or(env_schema) {
            Some(list) => FormSchema::parse(&list).context("parsing form field list")?,
            None => FormSchema::default(),
        };

        let cfg = Self {
            endpoint: args.endpoint.clone().unwrap_or(env_endpoint),
            sheet_id: args.sheet_id.clone().or(env_sheet),
            dwell: args
                .dwell_secs
                .or(env_dwell)
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_DWELL),
            timeout: args
                .timeout_secs
                .or(env_timeout)
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_TIMEOUT),
            file_field,
            schema,
            metrics,
            thousands_separator,
        };

        Ok(cfg)
    }

    pub fn presenter_config(&self) -> PresenterConfig {
        let decimal_separator = if self.thousands_separator == ',' { '.' } else { ',' };
        PresenterConfig {
            metrics: self.metrics.clone(),
            thousands_separator: self.thousands_separator,
            decimal_separator,
            reference_link: self.sheet_id.as_deref().map(sheet_link),
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("parsing {} value `{}`", key, value)),
        None => Ok(None),
    }
}
