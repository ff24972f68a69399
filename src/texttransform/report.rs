//! # Diagnostics Reporter
//!
//! Renders the diagnostics of a run, in the order they were collected, as
//! `file(line,col): ERROR: message`. Parts without data are left out, so a
//! diagnostic with no location is just `ERROR: message`.
//!
//! When the run has errors the listing is preceded by a one-line summary
//! naming the input file.

use console::Style;
use std::fmt::Write as _;
use std::path::Path;
use templating::{Diagnostic, Diagnostics, Severity};

/// Styles applied per severity. Styling never changes the text itself.
#[derive(Debug, Clone)]
pub struct ReportStyle {
    pub error: Style,
    pub warning: Style,
    pub summary: Style,
}

impl ReportStyle {
    /// Errors red and warnings yellow, when stderr supports colors.
    pub fn colored() -> Self {
        Self {
            error: Style::new().red().for_stderr(),
            warning: Style::new().yellow().for_stderr(),
            summary: Style::new().for_stderr(),
        }
    }

    pub fn plain() -> Self {
        Self {
            error: Style::new().force_styling(false),
            warning: Style::new().force_styling(false),
            summary: Style::new().force_styling(false),
        }
    }

    fn for_severity(&self, severity: Severity) -> &Style {
        match severity {
            Severity::Error => &self.error,
            Severity::Warning => &self.warning,
        }
    }
}

pub fn format_diagnostic(diagnostic: &Diagnostic) -> String {
    let mut out = String::new();
    let file = diagnostic.file.as_deref().filter(|f| !f.is_empty());
    if let Some(file) = file {
        out.push_str(file);
    }
    if let Some(line) = diagnostic.line {
        let _ = write!(out, "({}", line);
        if let Some(column) = diagnostic.column {
            let _ = write!(out, ",{}", column);
        }
        out.push(')');
    }
    if file.is_some() || diagnostic.line.is_some() {
        out.push_str(": ");
    }
    out.push_str(match diagnostic.severity {
        Severity::Error => "ERROR: ",
        Severity::Warning => "WARNING: ",
    });
    out.push_str(&diagnostic.message);
    out
}

pub fn failure_summary(input: Option<&Path>) -> String {
    match input {
        Some(path) => format!("Processing '{}' failed.", path.display()),
        None => "Processing failed.".to_string(),
    }
}

/// The full report, one line per entry, each ending in a newline. Empty when
/// there is nothing to report.
pub fn render_report(input: Option<&Path>, diagnostics: &Diagnostics, style: &ReportStyle) -> String {
    let mut out = String::new();
    if diagnostics.has_errors() {
        let _ = writeln!(out, "{}", style.summary.apply_to(failure_summary(input)));
    }
    for diagnostic in diagnostics {
        let _ = writeln!(
            out,
            "{}",
            style
                .for_severity(diagnostic.severity)
                .apply_to(format_diagnostic(diagnostic))
        );
    }
    out
}
