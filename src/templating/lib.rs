//! # templating
//!
//! A T4-style text template engine. Templates mix literal text with blocks:
//!
//! ```text
//! <#@ parameter name="count" type="int" #>
//! <# for i in range(count) #>
//! item <#= i #>
//! <# endfor #>
//! ```
//!
//! Code inside blocks is [minijinja](https://docs.rs/minijinja). The engine
//! parses the template, resolves its directives into [`TemplateSettings`],
//! and either renders it ([`Engine::process_template`]) or generates a Rust
//! module that renders it later ([`Engine::preprocess_template`]).
//!
//! Problems never abort a run. They are collected as [`Diagnostic`]s, with
//! file and line pointing into the original template.
//!
//! ```rust
//! use templating::{Diagnostics, Engine, Session, SessionValue};
//!
//! let engine = Engine::default();
//! let mut parsed = engine.parse_template(None, "Hello <#= name #>");
//! let settings = engine.get_settings(&mut parsed);
//!
//! let mut session = Session::new();
//! session.insert("name".into(), SessionValue::from("World"));
//!
//! let mut errors = Diagnostics::new();
//! let (_, text) = engine.process_template(&parsed, None, None, &settings, &session, &mut errors);
//! assert_eq!(text, "Hello World");
//! ```

use std::path::PathBuf;
use thiserror::Error;

pub mod diagnostics;
pub mod engine;
pub mod host;
pub mod parser;
pub mod preprocess;
pub mod render;
pub mod settings;
pub mod types;

pub use diagnostics::{Diagnostic, Diagnostics, Location, Severity};
pub use engine::Engine;
pub use host::{DirectiveProcessor, EngineOptions, ParameterKey};
pub use parser::{Directive, ParsedTemplate};
pub use settings::{LanguageProvider, TemplateSettings};
pub use types::{map_type_name, Session, SessionValue, STRING_TYPE};

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error(transparent)]
    Render(#[from] minijinja::Error),

    #[error("Could not read included file '{}': {source}", .path.display())]
    Include {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Could not write debug source '{}': {source}", .path.display())]
    DebugSource {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Renders template source embedded in a preprocessed type.
pub fn render_source(source: &str, session: &Session) -> Result<String, TemplateError> {
    Ok(render::render_source(source, session)?)
}
