use texttransform::options::{Arity, OptionSpec, OPTIONS};
use unicode_width::UnicodeWidthStr;

const BIN_NAME: &str = "texttransform";
const DEFAULT_WIDTH: usize = 80;
const FLAG_COLUMN: usize = 30;

/// Returns the version string, including git hash and commit date for non-release builds.
/// Format: "0.4.2" for releases, "0.4.2@abc1234 2024-01-15 14:30" for dev builds
pub fn get_version() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");
    const GIT_COMMIT_DATE: &str = env!("GIT_COMMIT_DATE");
    const IS_RELEASE: &str = env!("IS_RELEASE");

    use std::sync::OnceLock;
    static VERSION_STRING: OnceLock<String> = OnceLock::new();

    VERSION_STRING.get_or_init(|| {
        if IS_RELEASE == "true" || GIT_HASH.is_empty() {
            VERSION.to_string()
        } else {
            format!("{}@{} {}", VERSION, GIT_HASH, GIT_COMMIT_DATE)
        }
    })
}

/// Short aliases (`-o`, `-dp`) are shown with one dash, word aliases with two.
const SHORT_ALIAS_MAX: usize = 2;

/// `-o, --out=<file>`, `-dp=<directive>!<class>!<assembly>`.
fn flag_label(spec: &OptionSpec) -> String {
    let aliases: Vec<String> = spec
        .aliases
        .iter()
        .map(|alias| {
            if alias.chars().count() <= SHORT_ALIAS_MAX {
                format!("-{}", alias)
            } else {
                format!("--{}", alias)
            }
        })
        .collect();
    let mut label = aliases.join(", ");

    let names: Vec<String> = spec.values.iter().map(|v| format!("<{}>", v)).collect();
    match spec.arity {
        Arity::Flag => {}
        Arity::Value => {
            label.push('=');
            label.push_str(&names.join(""));
        }
        Arity::Split { separators, .. } => {
            label.push('=');
            let last = names.len().saturating_sub(1);
            for (i, name) in names.iter().enumerate() {
                if i > 0 {
                    let separator = match separators {
                        [_, .., final_sep] if i == last => *final_sep,
                        [first, ..] => *first,
                        [] => ' ',
                    };
                    label.push(separator);
                }
                label.push_str(name);
            }
        }
    }
    label
}

/// Greedy word wrap by display width.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.width() + 1 + word.width() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn render_options(width: usize) -> String {
    let description_width = width.saturating_sub(FLAG_COLUMN).max(20);
    let indent = " ".repeat(FLAG_COLUMN);
    let mut out = String::new();

    for spec in OPTIONS {
        let label = format!("  {}", flag_label(spec));
        let lines = wrap(spec.description, description_width);
        let mut lines = lines.iter();

        if label.width() + 2 > FLAG_COLUMN {
            out.push_str(&label);
            out.push('\n');
        } else if let Some(first) = lines.next() {
            out.push_str(&label);
            out.push_str(&" ".repeat(FLAG_COLUMN - label.width()));
            out.push_str(first);
            out.push('\n');
        }
        for line in lines {
            out.push_str(&indent);
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

fn terminal_width() -> usize {
    console::Term::stdout()
        .size_checked()
        .map(|(_, cols)| cols as usize)
        .unwrap_or(DEFAULT_WIDTH)
}

/// Usage text. The concise form only points at `--help`.
pub fn get_help(concise: bool) -> String {
    get_help_with_width(concise, terminal_width())
}

fn get_help_with_width(concise: bool, width: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "T4 text template processor version {}\n",
        get_version()
    ));
    out.push_str(&format!("Usage: {} [options] [template-file]\n", BIN_NAME));
    if concise {
        out.push_str("Use --help to display options.\n");
        return out;
    }
    out.push('\n');
    out.push_str(
        "The template-file argument is required unless the template text is piped in via stdin.\n",
    );
    out.push('\n');
    out.push_str("Options:\n");
    out.push('\n');
    out.push_str(&render_options(width));
    out.push('\n');
    out
}
