//! Drives one template through the engine.
//!
//! Stages run in a fixed order: parse, settings, parameter coercion, then
//! transform or preprocess. Diagnostics from every stage go into one list
//! owned by the run. Once it holds an error, later stages are skipped and
//! no output is produced.

use crate::coercion::coerce_parameters;
use crate::config::GeneratorConfig;
use crate::engine::TemplateEngine;
use crate::error::{Result, TransformError};
use crate::invocation::{Invocation, Mode, OutputTarget};
use crate::options::Properties;
use std::fs;
use std::io::Write;
use templating::{Diagnostics, Session};
use tracing::debug;

/// Result text and where it goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    pub target: OutputTarget,
    pub content: String,
}

impl RunOutput {
    /// Writes the content to its file, or to `stdout` followed by a newline.
    pub fn write(&self, stdout: &mut impl Write) -> Result<()> {
        match &self.target {
            OutputTarget::Stdout => writeln!(stdout, "{}", self.content)
                .and_then(|_| stdout.flush())
                .map_err(TransformError::WriteStdout),
            OutputTarget::File { path, .. } => {
                fs::write(path, &self.content).map_err(|source| TransformError::WriteOutput {
                    path: path.clone(),
                    source,
                })?;
                debug!(path = %path.display(), bytes = self.content.len(), "wrote output");
                Ok(())
            }
        }
    }
}

#[derive(Debug)]
pub struct RunResult {
    /// Present only when no error was reported.
    pub output: Option<RunOutput>,
    pub diagnostics: Diagnostics,
    pub session: Session,
}

impl RunResult {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }
}

/// State owned by a single run.
#[derive(Default)]
struct RunContext {
    session: Session,
    diagnostics: Diagnostics,
}

pub struct Transformer<E> {
    engine: E,
}

impl<E: TemplateEngine> Transformer<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn run(
        &self,
        invocation: Invocation,
        config: &GeneratorConfig,
        properties: &Properties,
    ) -> RunResult {
        let Invocation {
            input,
            output,
            mode,
        } = invocation;
        let input_path = input.path();
        let mut ctx = RunContext::default();

        let mut parsed = self.engine.parse_template(input_path, &input.content);
        let mut settings = self.engine.get_settings(&mut parsed);
        settings.debug |= config.debug;
        settings.log |= config.verbose;
        ctx.diagnostics.extend(parsed.errors.iter().cloned());

        if !ctx.diagnostics.has_errors() && !properties.is_empty() {
            coerce_parameters(
                &self.engine,
                &parsed,
                properties,
                &mut ctx.session,
                &mut ctx.diagnostics,
            );
        }

        let mut produced = None;
        if !ctx.diagnostics.has_errors() {
            produced = Some(match mode {
                Mode::Transform => {
                    let (path, content) = self.engine.process_template(
                        &parsed,
                        input_path,
                        output.path(),
                        &settings,
                        &ctx.session,
                        &mut ctx.diagnostics,
                    );
                    let target = match (output, path) {
                        (OutputTarget::File { is_default, .. }, Some(path)) => {
                            OutputTarget::File { path, is_default }
                        }
                        (target, _) => target,
                    };
                    RunOutput { target, content }
                }
                Mode::Preprocess(class_name) => {
                    settings.name = class_name.name;
                    settings.namespace = class_name.namespace;
                    let target = output.with_generated_extension(&settings.provider.file_extension);
                    let content = self.engine.preprocess_template(
                        &parsed,
                        input_path,
                        target.path(),
                        &settings,
                        &mut ctx.diagnostics,
                    );
                    RunOutput { target, content }
                }
            });
        }

        debug!(
            diagnostics = ctx.diagnostics.len(),
            errors = ctx.diagnostics.error_count(),
            "run finished"
        );
        let RunContext {
            session,
            diagnostics,
        } = ctx;
        RunResult {
            output: produced.filter(|_| !diagnostics.has_errors()),
            diagnostics,
            session,
        }
    }
}
