use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::host::EngineOptions;
use crate::parser::{self, parse_directive, Directive, ParsedTemplate, SegmentKind};
use crate::preprocess;
use crate::render::{self, compile, HostContext};
use crate::settings::{self, TemplateSettings};
use crate::types::{self, Session};
use crate::TemplateError;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Includes nested deeper than this are reported as errors.
pub const MAX_INCLUDE_DEPTH: usize = 32;

#[derive(Default)]
struct IncludeState {
    seen: HashSet<PathBuf>,
}

/// The built-in template engine.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    options: Arc<EngineOptions>,
}

impl Engine {
    pub fn new(options: EngineOptions) -> Self {
        Self {
            options: Arc::new(options),
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Parses a template and expands its `include` directives.
    pub fn parse_template(&self, file: Option<&Path>, text: &str) -> ParsedTemplate {
        let label = file.map(|f| f.display().to_string());
        let parsed = parser::parse(label.as_deref(), text);
        let parsed = self.expand_includes(parsed, file, &mut IncludeState::default(), 0);
        debug!(
            segments = parsed.segments.len(),
            directives = parsed.directives.len(),
            errors = parsed.errors.len(),
            "parsed template"
        );
        parsed
    }

    pub fn get_settings(&self, parsed: &mut ParsedTemplate) -> TemplateSettings {
        settings::resolve(&self.options, parsed)
    }

    pub fn map_type_name(&self, type_name: Option<&str>) -> String {
        types::map_type_name(type_name)
    }

    /// Renders the template. Returns the final output path, whose extension
    /// follows the `output` directive, and the rendered text. On failure the
    /// text is empty and the problem is appended to `errors`.
    pub fn process_template(
        &self,
        parsed: &ParsedTemplate,
        input_path: Option<&Path>,
        output_path: Option<&Path>,
        settings: &TemplateSettings,
        session: &Session,
        errors: &mut Diagnostics,
    ) -> (Option<PathBuf>, String) {
        let output_path = output_path.map(|path| match &settings.extension {
            Some(ext) => path.with_extension(ext),
            None => path.to_path_buf(),
        });

        let compiled = compile(parsed);
        if settings.log {
            self.log_settings(settings);
        }
        if settings.debug {
            match self.keep_debug_source(&compiled.source) {
                Ok(path) => info!(path = %path.display(), "kept generated template source"),
                Err(err) => errors.push(Diagnostic::warning(err.to_string())),
            }
        }

        let host = settings.host_specific.then(|| HostContext {
            template_file: input_path.map(|p| p.display().to_string()),
            options: Arc::clone(&self.options),
        });
        match render::render(&compiled, session, host.as_ref()) {
            Ok(text) => {
                debug!(bytes = text.len(), "rendered template");
                (output_path, text)
            }
            Err(diagnostic) => {
                errors.push(diagnostic);
                (output_path, String::new())
            }
        }
    }

    /// Generates Rust source for a reusable type that renders the template.
    pub fn preprocess_template(
        &self,
        parsed: &ParsedTemplate,
        input_path: Option<&Path>,
        output_path: Option<&Path>,
        settings: &TemplateSettings,
    ) -> String {
        if settings.log {
            self.log_settings(settings);
        }
        let template_file = input_path.map(|p| p.display().to_string());
        let output_dir = output_path.and_then(Path::parent);
        preprocess::generate(parsed, settings, template_file.as_deref(), output_dir)
    }

    fn log_settings(&self, settings: &TemplateSettings) {
        info!(
            class = %settings.name,
            host_specific = settings.host_specific,
            imports = ?settings.imports,
            references = ?settings.references,
            reference_paths = ?self.options.reference_paths,
            "template settings"
        );
    }

    fn keep_debug_source(&self, source: &str) -> Result<PathBuf, TemplateError> {
        let path = std::env::temp_dir().join(format!("texttransform-{}.jinja", Uuid::new_v4()));
        fs::write(&path, source).map_err(|source| TemplateError::DebugSource {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    fn expand_includes(
        &self,
        parsed: ParsedTemplate,
        file: Option<&Path>,
        state: &mut IncludeState,
        depth: usize,
    ) -> ParsedTemplate {
        let mut expanded = ParsedTemplate {
            errors: parsed.errors,
            ..ParsedTemplate::default()
        };

        for segment in parsed.segments {
            let directive = match segment.kind {
                SegmentKind::Directive => parse_directive(&segment.text)
                    .ok()
                    .map(|d| d.with_location(segment.location.clone())),
                _ => None,
            };
            expanded.segments.push(segment);
            let Some(directive) = directive else {
                continue;
            };
            if !directive.is("include") {
                expanded.directives.push(directive);
                continue;
            }

            match self.include(&directive, file, state, depth) {
                Ok(Some(included)) => {
                    expanded.segments.extend(included.segments);
                    expanded.directives.extend(included.directives);
                    expanded.errors.extend(included.errors);
                }
                Ok(None) => {}
                Err(message) => expanded
                    .errors
                    .push(Diagnostic::error(message).at(&directive.location)),
            }
        }
        expanded
    }

    fn include(
        &self,
        directive: &Directive,
        including_file: Option<&Path>,
        state: &mut IncludeState,
        depth: usize,
    ) -> Result<Option<ParsedTemplate>, String> {
        let Some(name) = directive.attribute("file").filter(|f| !f.trim().is_empty()) else {
            return Err("Include directive is missing the 'file' attribute".to_string());
        };
        if depth >= MAX_INCLUDE_DEPTH {
            return Err(format!(
                "Include depth limit of {} exceeded while including '{}'",
                MAX_INCLUDE_DEPTH, name
            ));
        }
        let path = self
            .resolve_include(name, including_file)
            .ok_or_else(|| format!("Could not find included file '{}'", name))?;

        let once = directive
            .attribute("once")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"));
        let key = fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
        let first_time = state.seen.insert(key);
        if once && !first_time {
            debug!(file = %path.display(), "skipping repeated include");
            return Ok(None);
        }

        let text = fs::read_to_string(&path)
            .map_err(|source| TemplateError::Include {
                path: path.clone(),
                source,
            })
            .map_err(|err| err.to_string())?;
        debug!(file = %path.display(), depth, "including template");

        let label = path.display().to_string();
        let parsed = parser::parse(Some(&label), &text);
        Ok(Some(self.expand_includes(parsed, Some(&path), state, depth + 1)))
    }

    /// Looks next to the including file first, then in each include path in order.
    fn resolve_include(&self, name: &str, including_file: Option<&Path>) -> Option<PathBuf> {
        let requested = Path::new(name);
        if requested.is_absolute() {
            return requested.is_file().then(|| requested.to_path_buf());
        }
        let local_dir = including_file
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_default();
        std::iter::once(local_dir)
            .chain(self.options.include_paths.iter().cloned())
            .map(|dir| dir.join(requested))
            .find(|candidate| candidate.is_file())
    }
}
