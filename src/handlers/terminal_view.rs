//! Terminal rendering of the intake session.
//!
//! Writes user-facing output to any `io::Write` (stdout in the binary, a
//! buffer in tests). Diagnostics go through `tracing`, not through here.

use crate::{
    models::{FieldSpec, FileKey},
    services::{controller::View, presenter::Summary, workflow::StatusMessage},
};
use std::io::{self, Write};
use tracing::warn;

pub struct TerminalView<W: Write> {
    out: W,
    submit_visible: bool,
}

impl TerminalView<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            submit_visible: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: std::fmt::Arguments<'_>) {
        if let Err(err) = writeln!(self.out, "{}", text) {
            warn!("failed to write to terminal: {}", err);
        }
    }
}

impl<W: Write> View for TerminalView<W> {
    fn set_title(&mut self, title: &str) {
        self.line(format_args!("== {} ==", title));
    }

    fn show_validation_errors(&mut self, missing: &[FieldSpec]) {
        for field in missing {
            self.line(format_args!(
                "missing required field: {} (--field {}=...)",
                field.label, field.name
            ));
        }
    }

    fn render_file_list(&mut self, files: &[FileKey]) {
        if files.is_empty() {
            self.line(format_args!("no screenshots staged"));
            return;
        }
        self.line(format_args!("staged screenshots ({}):", files.len()));
        for (idx, key) in files.iter().enumerate() {
            self.line(format_args!("  {}. {} ({} bytes)", idx + 1, key.name, key.size));
        }
    }

    fn set_submit_visible(&mut self, visible: bool) {
        self.submit_visible = visible;
    }

    fn set_submit_enabled(&mut self, enabled: bool) {
        if enabled && self.submit_visible {
            self.line(format_args!("ready to submit"));
        }
    }

    fn notice(&mut self, text: &str) {
        self.line(format_args!("! {}", text));
    }

    fn show_status(&mut self, status: &StatusMessage) {
        self.line(format_args!("{}", status));
    }

    fn show_summary(&mut self, summary: &Summary) {
        self.line(format_args!("{}", summary));
    }
}
