//! Resolves [`TemplateSettings`] from the template's directives and the host options.

use crate::diagnostics::Diagnostic;
use crate::host::EngineOptions;
use crate::parser::{Directive, ParsedTemplate};

pub const DEFAULT_CLASS_NAME: &str = "GeneratedTextTransformation";
pub const DEFAULT_LANGUAGE: &str = "Rust";

const TEMPLATE_ATTRIBUTES: &[&str] = &[
    "language",
    "hostspecific",
    "debug",
    "inherits",
    "visibility",
    "linepragmas",
    "compilerOptions",
    "culture",
];

/// Describes the code generated in preprocess mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageProvider {
    pub language: String,
    /// Extension of generated source files, without the leading dot.
    pub file_extension: String,
}

impl Default for LanguageProvider {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            file_extension: "rs".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSettings {
    pub name: String,
    pub namespace: Option<String>,
    pub provider: LanguageProvider,
    /// Output file extension requested by an `output` directive.
    pub extension: Option<String>,
    pub encoding: Option<String>,
    pub host_specific: bool,
    pub debug: bool,
    /// Emit engine progress through the log.
    pub log: bool,
    pub internal_visibility: bool,
    pub line_pragmas: bool,
    pub relative_line_pragmas: bool,
    pub imports: Vec<String>,
    pub references: Vec<String>,
}

impl Default for TemplateSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_CLASS_NAME.to_string(),
            namespace: None,
            provider: LanguageProvider::default(),
            extension: None,
            encoding: None,
            host_specific: false,
            debug: false,
            log: false,
            internal_visibility: false,
            line_pragmas: true,
            relative_line_pragmas: false,
            imports: Vec::new(),
            references: Vec::new(),
        }
    }
}

fn is_true(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("trueFromBase"))
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !value.is_empty() && !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}

/// Builds settings for a parsed template. Problems found in directives are
/// appended to `parsed.errors`.
pub fn resolve(options: &EngineOptions, parsed: &mut ParsedTemplate) -> TemplateSettings {
    let mut settings = TemplateSettings {
        relative_line_pragmas: options.use_relative_line_pragmas,
        ..TemplateSettings::default()
    };
    for import in &options.imports {
        push_unique(&mut settings.imports, import);
    }
    for reference in &options.references {
        push_unique(&mut settings.references, reference);
    }

    let mut problems = Vec::new();
    for directive in &parsed.directives {
        match directive.name.to_ascii_lowercase().as_str() {
            "template" => apply_template_directive(directive, &mut settings, &mut problems),
            "output" => {
                if let Some(ext) = directive.attribute("extension") {
                    settings.extension = Some(ext.trim_start_matches('.').to_string());
                }
                if let Some(encoding) = directive.attribute("encoding") {
                    settings.encoding = Some(encoding.to_string());
                }
            }
            "import" => match directive.attribute("namespace") {
                Some(ns) => push_unique(&mut settings.imports, ns),
                None => problems.push(
                    Diagnostic::error("Import directive is missing the 'namespace' attribute")
                        .at(&directive.location),
                ),
            },
            "assembly" => match directive.attribute("name") {
                Some(name) => push_unique(&mut settings.references, name),
                None => problems.push(
                    Diagnostic::error("Assembly directive is missing the 'name' attribute")
                        .at(&directive.location),
                ),
            },
            "parameter" => {
                if directive.attribute("name").map_or(true, |n| n.trim().is_empty()) {
                    problems.push(
                        Diagnostic::error("Parameter directive is missing the 'name' attribute")
                            .at(&directive.location),
                    );
                }
            }
            // Expanded by the engine before settings are resolved.
            "include" => {}
            _ => check_custom_directive(options, directive, &mut problems),
        }
    }

    parsed.errors.extend(problems);
    settings
}

fn apply_template_directive(
    directive: &Directive,
    settings: &mut TemplateSettings,
    problems: &mut Vec<Diagnostic>,
) {
    if let Some(language) = directive.attribute("language") {
        if !language.eq_ignore_ascii_case(DEFAULT_LANGUAGE) {
            problems.push(
                Diagnostic::warning(format!(
                    "Language '{}' is not supported, generating {} instead",
                    language, DEFAULT_LANGUAGE
                ))
                .at(&directive.location),
            );
        }
    }
    settings.host_specific |= is_true(directive.attribute("hostspecific"));
    settings.debug |= is_true(directive.attribute("debug"));
    if let Some(visibility) = directive.attribute("visibility") {
        settings.internal_visibility = visibility.eq_ignore_ascii_case("internal");
    }
    if let Some(pragmas) = directive.attribute("linepragmas") {
        settings.line_pragmas = !pragmas.eq_ignore_ascii_case("false");
    }
    if directive.attribute("inherits").is_some() {
        problems.push(
            Diagnostic::warning("The 'inherits' attribute is ignored by this engine")
                .at(&directive.location),
        );
    }
    for (key, _) in directive.attributes() {
        if !TEMPLATE_ATTRIBUTES.iter().any(|a| a.eq_ignore_ascii_case(key)) {
            problems.push(
                Diagnostic::warning(format!("Unknown attribute '{}' in template directive", key))
                    .at(&directive.location),
            );
        }
    }
}

fn check_custom_directive(
    options: &EngineOptions,
    directive: &Directive,
    problems: &mut Vec<Diagnostic>,
) {
    let processor = directive
        .attribute("processor")
        .and_then(|p| options.directive_processor(p))
        .or_else(|| options.directive_processor(&directive.name));

    match processor {
        Some(processor) => problems.push(
            Diagnostic::warning(format!(
                "Directive processor '{}' ({}, {}) cannot run in this engine; directive '{}' was skipped",
                processor.name, processor.class, processor.assembly, directive.name
            ))
            .at(&directive.location),
        ),
        None => problems.push(
            Diagnostic::error(format!(
                "No directive processor registered for directive '{}'",
                directive.name
            ))
            .at(&directive.location),
        ),
    }
}
