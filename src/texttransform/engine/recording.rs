//! A scripted engine that records how it was driven.

use super::TemplateEngine;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use templating::{
    map_type_name, Diagnostic, Diagnostics, Directive, ParsedTemplate, Session, TemplateSettings,
};

#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Parse { file: Option<PathBuf>, text: String },
    GetSettings,
    MapTypeName(Option<String>),
    Process { output_path: Option<PathBuf>, session: Session },
    Preprocess { name: String, namespace: Option<String>, output_path: Option<PathBuf> },
}

#[derive(Debug, Default)]
pub struct RecordingEngine {
    /// Parameter directives `(name, type)` the parsed template declares.
    pub parameters: Vec<(String, Option<String>)>,
    pub parse_errors: Vec<Diagnostic>,
    pub settings_errors: Vec<Diagnostic>,
    pub process_errors: Vec<Diagnostic>,
    /// Extension from an `output` directive.
    pub extension: Option<String>,
    pub output: String,
    calls: RefCell<Vec<EngineCall>>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parameter(mut self, name: &str, type_name: Option<&str>) -> Self {
        self.parameters
            .push((name.to_string(), type_name.map(str::to_string)));
        self
    }

    pub fn with_output(mut self, output: &str) -> Self {
        self.output = output.to_string();
        self
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.borrow().clone()
    }

    pub fn processed_session(&self) -> Option<Session> {
        self.calls.borrow().iter().find_map(|call| match call {
            EngineCall::Process { session, .. } => Some(session.clone()),
            _ => None,
        })
    }

    fn record(&self, call: EngineCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl TemplateEngine for RecordingEngine {
    fn parse_template(&self, file: Option<&Path>, text: &str) -> ParsedTemplate {
        self.record(EngineCall::Parse {
            file: file.map(Path::to_path_buf),
            text: text.to_string(),
        });
        let mut parsed = ParsedTemplate::default();
        for (name, type_name) in &self.parameters {
            let mut directive = Directive::new("parameter").with_attribute("name", name.as_str());
            if let Some(type_name) = type_name {
                directive = directive.with_attribute("type", type_name.as_str());
            }
            parsed.directives.push(directive);
        }
        parsed.errors.extend(self.parse_errors.iter().cloned());
        parsed
    }

    fn get_settings(&self, parsed: &mut ParsedTemplate) -> TemplateSettings {
        self.record(EngineCall::GetSettings);
        parsed.errors.extend(self.settings_errors.iter().cloned());
        TemplateSettings {
            extension: self.extension.clone(),
            ..TemplateSettings::default()
        }
    }

    fn map_type_name(&self, type_name: Option<&str>) -> String {
        self.record(EngineCall::MapTypeName(type_name.map(str::to_string)));
        map_type_name(type_name)
    }

    fn process_template(
        &self,
        _parsed: &ParsedTemplate,
        _input_path: Option<&Path>,
        output_path: Option<&Path>,
        settings: &TemplateSettings,
        session: &Session,
        errors: &mut Diagnostics,
    ) -> (Option<PathBuf>, String) {
        let output_path = output_path.map(|path| match &settings.extension {
            Some(ext) => path.with_extension(ext),
            None => path.to_path_buf(),
        });
        self.record(EngineCall::Process {
            output_path: output_path.clone(),
            session: session.clone(),
        });
        errors.extend(self.process_errors.iter().cloned());
        (output_path, self.output.clone())
    }

    fn preprocess_template(
        &self,
        _parsed: &ParsedTemplate,
        _input_path: Option<&Path>,
        output_path: Option<&Path>,
        settings: &TemplateSettings,
        errors: &mut Diagnostics,
    ) -> String {
        self.record(EngineCall::Preprocess {
            name: settings.name.clone(),
            namespace: settings.namespace.clone(),
            output_path: output_path.map(Path::to_path_buf),
        });
        errors.extend(self.process_errors.iter().cloned());
        self.output.clone()
    }
}
