//! The template engine seam.
//!
//! The orchestration core drives an engine through [`TemplateEngine`] and
//! never looks inside it. Diagnostics stay with the caller: any call that
//! can fail takes the run's diagnostics list and appends to it.

use std::path::{Path, PathBuf};
use templating::{Diagnostics, ParsedTemplate, Session, TemplateSettings};

pub mod builtin;
#[cfg(any(test, feature = "test_utils"))]
pub mod recording;

pub use builtin::BuiltinEngine;
#[cfg(any(test, feature = "test_utils"))]
pub use recording::{EngineCall, RecordingEngine};

pub trait TemplateEngine {
    /// Parses template text. Parse problems end up in `ParsedTemplate::errors`.
    fn parse_template(&self, file: Option<&Path>, text: &str) -> ParsedTemplate;

    /// Resolves the template's directives into settings. May add to `parsed.errors`.
    fn get_settings(&self, parsed: &mut ParsedTemplate) -> TemplateSettings;

    /// Full name of a declared parameter type. Absent names map to the string type.
    fn map_type_name(&self, type_name: Option<&str>) -> String;

    /// Renders the template. Returns the final output path and the text.
    fn process_template(
        &self,
        parsed: &ParsedTemplate,
        input_path: Option<&Path>,
        output_path: Option<&Path>,
        settings: &TemplateSettings,
        session: &Session,
        errors: &mut Diagnostics,
    ) -> (Option<PathBuf>, String);

    /// Generates source for a reusable type named by `settings`.
    fn preprocess_template(
        &self,
        parsed: &ParsedTemplate,
        input_path: Option<&Path>,
        output_path: Option<&Path>,
        settings: &TemplateSettings,
        errors: &mut Diagnostics,
    ) -> String;
}
