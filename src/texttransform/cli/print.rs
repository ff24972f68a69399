use super::setup::get_help;
use super::styles::REPORT_STYLE;
use colored::Colorize;
use std::path::Path;
use templating::Diagnostics;
use texttransform::report::render_report;

pub(super) fn print_help(concise: bool) {
    print!("{}", get_help(concise));
}

pub(super) fn print_error(message: impl std::fmt::Display) {
    eprintln!("{}", message.to_string().red());
}

/// Summary line and diagnostics, on stderr.
pub(super) fn print_report(input: Option<&Path>, diagnostics: &Diagnostics) {
    let report = render_report(input, diagnostics, &REPORT_STYLE);
    if !report.is_empty() {
        eprint!("{}", report);
    }
}
