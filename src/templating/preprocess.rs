//! Generates a Rust module that renders the template at runtime.
//!
//! The generated type embeds the compiled template source and hands it to
//! [`crate::render_source`] when `transform_text` is called.

use crate::diagnostics::Location;
use crate::parser::ParsedTemplate;
use crate::render::compile;
use crate::settings::TemplateSettings;
use crate::types::map_type_name;
use std::fmt::Write;
use std::path::{Component, Path, PathBuf};

const INDENT: &str = "    ";

/// Splits a namespace on `.` or `::` into module names.
fn module_path(namespace: &str) -> Vec<&str> {
    namespace
        .split("::")
        .flat_map(|part| part.split('.'))
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect()
}

/// Wraps `text` in a raw string literal with enough `#`s to be unambiguous.
fn raw_string(text: &str) -> String {
    let mut longest = 0;
    let mut run = None;
    for c in text.chars() {
        run = match (c, run) {
            ('"', _) => Some(0),
            ('#', Some(n)) => Some(n + 1),
            _ => None,
        };
        if let Some(n) = run {
            longest = longest.max(n);
        }
    }
    let hashes = "#".repeat(longest + 1);
    format!("r{hashes}\"{text}\"{hashes}")
}

/// Path of `path` relative to the directory `base`, using `..` where needed.
pub fn relative_path(path: &Path, base: &Path) -> PathBuf {
    let path: Vec<Component> = path.components().collect();
    let base: Vec<Component> = base.components().collect();
    let common = path
        .iter()
        .zip(base.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for component in &base[common..] {
        if !matches!(component, Component::CurDir) {
            relative.push("..");
        }
    }
    for component in &path[common..] {
        relative.push(component.as_os_str());
    }
    relative
}

struct LinePragmas<'a> {
    enabled: bool,
    relative_to: Option<&'a Path>,
}

impl LinePragmas<'_> {
    fn marker(&self, location: &Location) -> Option<String> {
        if !self.enabled || location.line == 0 {
            return None;
        }
        let file = location.file.as_deref().map(|file| match self.relative_to {
            Some(base) => relative_path(Path::new(file), base).display().to_string(),
            None => file.to_string(),
        });
        Some(match file {
            Some(file) => format!("// line {} {:?}", location.line, file),
            None => format!("// line {}", location.line),
        })
    }
}

/// Produces the source of a Rust module for a parsed template.
///
/// `output_dir` is the directory the generated file is written to. It is used
/// to make line markers relative when `settings.relative_line_pragmas` is set.
pub fn generate(
    parsed: &ParsedTemplate,
    settings: &TemplateSettings,
    template_file: Option<&str>,
    output_dir: Option<&Path>,
) -> String {
    let compiled = compile(parsed);
    let pragmas = LinePragmas {
        enabled: settings.line_pragmas,
        relative_to: output_dir.filter(|_| settings.relative_line_pragmas),
    };
    let visibility = if settings.internal_visibility {
        "pub(crate)"
    } else {
        "pub"
    };
    let modules = settings
        .namespace
        .as_deref()
        .map(module_path)
        .unwrap_or_default();

    let mut out = String::new();
    let _ = writeln!(out, "// <auto-generated>");
    if let Some(file) = template_file {
        let _ = writeln!(out, "//     Generated from {:?}.", file);
    }
    let _ = writeln!(
        out,
        "//     Changes to this file will be lost when it is regenerated."
    );
    let _ = writeln!(out, "// </auto-generated>");
    let _ = writeln!(out);

    for (depth, module) in modules.iter().enumerate() {
        let _ = writeln!(out, "{}pub mod {} {{", INDENT.repeat(depth), module);
    }
    let pad = INDENT.repeat(modules.len());

    for import in &settings.imports {
        let _ = writeln!(out, "{pad}#[allow(unused_imports)]");
        let _ = writeln!(out, "{pad}use {};", module_path(import).join("::"));
    }
    if !settings.imports.is_empty() {
        let _ = writeln!(out);
    }

    let parameters: Vec<_> = parsed
        .parameter_directives()
        .filter_map(|d| Some((d.attribute("name")?, map_type_name(d.attribute("type")))))
        .collect();
    if !parameters.is_empty() {
        let _ = writeln!(out, "{pad}/// Template parameters:");
        let _ = writeln!(out, "{pad}///");
        for (name, type_name) in &parameters {
            let _ = writeln!(out, "{pad}/// * `{}`: {}", name, type_name);
        }
    }
    let _ = writeln!(out, "{pad}#[derive(Debug, Clone, Default)]");
    let _ = writeln!(out, "{pad}{visibility} struct {} {{", settings.name);
    let _ = writeln!(out, "{pad}{INDENT}pub session: templating::Session,");
    let _ = writeln!(out, "{pad}}}");
    let _ = writeln!(out);

    let _ = writeln!(out, "{pad}impl {} {{", settings.name);
    let _ = writeln!(out, "{pad}{INDENT}const TEMPLATE: &'static str = concat!(");
    for (location, chunk) in compiled.chunks().filter(|(_, chunk)| !chunk.is_empty()) {
        if let Some(marker) = pragmas.marker(location) {
            let _ = writeln!(out, "{pad}{INDENT}{INDENT}{}", marker);
        }
        let _ = writeln!(out, "{pad}{INDENT}{INDENT}{},", raw_string(chunk));
    }
    let _ = writeln!(out, "{pad}{INDENT});");
    let _ = writeln!(out);
    let _ = writeln!(out, "{pad}{INDENT}pub fn new() -> Self {{");
    let _ = writeln!(out, "{pad}{INDENT}{INDENT}Self::default()");
    let _ = writeln!(out, "{pad}{INDENT}}}");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{pad}{INDENT}pub fn set(&mut self, name: &str, value: impl Into<templating::SessionValue>) {{"
    );
    let _ = writeln!(
        out,
        "{pad}{INDENT}{INDENT}self.session.insert(name.to_string(), value.into());"
    );
    let _ = writeln!(out, "{pad}{INDENT}}}");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{pad}{INDENT}pub fn transform_text(&self) -> Result<String, templating::TemplateError> {{"
    );
    let _ = writeln!(
        out,
        "{pad}{INDENT}{INDENT}templating::render_source(Self::TEMPLATE, &self.session)"
    );
    let _ = writeln!(out, "{pad}{INDENT}}}");
    let _ = writeln!(out, "{pad}}}");

    for depth in (0..modules.len()).rev() {
        let _ = writeln!(out, "{}}}", INDENT.repeat(depth));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn settings(name: &str, namespace: Option<&str>) -> TemplateSettings {
        TemplateSettings {
            name: name.to_string(),
            namespace: namespace.map(str::to_string),
            ..TemplateSettings::default()
        }
    }

    #[test]
    fn test_raw_string_hashes() {
        assert_eq!(raw_string("plain"), "r#\"plain\"#");
        assert_eq!(raw_string("a \"# b"), "r##\"a \"# b\"##");
        assert_eq!(raw_string("\"##\""), "r###\"\"##\"\"###");
    }

    #[test]
    fn test_module_path() {
        assert_eq!(module_path("Acme.Gen"), vec!["Acme", "Gen"]);
        assert_eq!(module_path("acme::gen"), vec!["acme", "gen"]);
        assert!(module_path("").is_empty());
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(
            relative_path(Path::new("/work/templates/a.tt"), Path::new("/work/out")),
            PathBuf::from("../templates/a.tt")
        );
        assert_eq!(
            relative_path(Path::new("/work/a.tt"), Path::new("/work")),
            PathBuf::from("a.tt")
        );
    }

    #[test]
    fn test_generate_with_namespace() {
        let parsed = parse(
            Some("report.tt"),
            "<#@ parameter name=\"count\" type=\"int\" #>\nTotal: <#= count #>\n",
        );
        let code = generate(&parsed, &settings("Report", Some("Acme.Gen")), Some("report.tt"), None);

        assert!(code.contains("pub mod Acme {"));
        assert!(code.contains("    pub mod Gen {"));
        assert!(code.contains("        pub struct Report {"));
        assert!(code.contains("/// * `count`: System.Int32"));
        assert!(code.contains("// line 2 \"report.tt\""));
        assert!(code.contains("r#\"{{ count }}\"#"));
        assert!(code.contains("pub fn transform_text(&self)"));
        assert!(code.trim_end().ends_with('}'));
    }

    #[test]
    fn test_generate_internal_without_pragmas() {
        let parsed = parse(Some("t.tt"), "<#@ template visibility=\"internal\" linepragmas=\"false\" #>\nx");
        let mut s = settings("T", None);
        s.internal_visibility = true;
        s.line_pragmas = false;
        let code = generate(&parsed, &s, None, None);

        assert!(code.contains("pub(crate) struct T {"));
        assert!(!code.contains("// line"));
        assert!(!code.contains("pub mod"));
    }

    #[test]
    fn test_relative_line_pragmas() {
        let parsed = parse(Some("/src/tpl/a.tt"), "x");
        let mut s = settings("A", None);
        s.relative_line_pragmas = true;
        let code = generate(&parsed, &s, None, Some(Path::new("/src/out")));
        assert!(code.contains("// line 1 \"../tpl/a.tt\""), "{}", code);
    }
}
