use super::TemplateEngine;
use std::path::{Path, PathBuf};
use templating::{Diagnostics, Engine, EngineOptions, ParsedTemplate, Session, TemplateSettings};

/// [`TemplateEngine`] backed by the `templating` crate.
#[derive(Debug, Clone, Default)]
pub struct BuiltinEngine {
    inner: Engine,
}

impl BuiltinEngine {
    pub fn new(options: EngineOptions) -> Self {
        Self {
            inner: Engine::new(options),
        }
    }
}

impl TemplateEngine for BuiltinEngine {
    fn parse_template(&self, file: Option<&Path>, text: &str) -> ParsedTemplate {
        self.inner.parse_template(file, text)
    }

    fn get_settings(&self, parsed: &mut ParsedTemplate) -> TemplateSettings {
        self.inner.get_settings(parsed)
    }

    fn map_type_name(&self, type_name: Option<&str>) -> String {
        self.inner.map_type_name(type_name)
    }

    fn process_template(
        &self,
        parsed: &ParsedTemplate,
        input_path: Option<&Path>,
        output_path: Option<&Path>,
        settings: &TemplateSettings,
        session: &Session,
        errors: &mut Diagnostics,
    ) -> (Option<PathBuf>, String) {
        self.inner
            .process_template(parsed, input_path, output_path, settings, session, errors)
    }

    fn preprocess_template(
        &self,
        parsed: &ParsedTemplate,
        input_path: Option<&Path>,
        output_path: Option<&Path>,
        settings: &TemplateSettings,
        _errors: &mut Diagnostics,
    ) -> String {
        self.inner
            .preprocess_template(parsed, input_path, output_path, settings)
    }
}
