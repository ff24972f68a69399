//! # Invocation Resolver
//!
//! Turns a parsed [`CommandLine`] into an [`Invocation`]: where the template
//! text comes from, where the result goes, and whether to transform or
//! preprocess.
//!
//! Rules:
//!
//! - exactly one positional argument is the input file, which must exist
//! - otherwise, redirected stdin is read in full; an interactive stdin means there is no input
//! - output goes to stdout for `-o -`, or for stdin input without `-o`
//! - without `-o`, a file input writes next to itself with a `.txt` extension;
//!   in preprocess mode that default takes the generated code's extension instead
//! - empty input is rejected before the engine is involved

use crate::error::{Result, TransformError};
use crate::options::CommandLine;
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};

pub const STDOUT_SENTINEL: &str = "-";
pub const DEFAULT_OUTPUT_EXTENSION: &str = "txt";

/// Standard input as seen by the resolver.
pub trait ConsoleInput {
    /// True when input is piped or redirected rather than an interactive terminal.
    fn is_redirected(&self) -> bool;
    fn read_all(&mut self) -> io::Result<String>;
}

/// The process's real standard input.
pub struct StdinInput;

impl ConsoleInput for StdinInput {
    fn is_redirected(&self) -> bool {
        !io::stdin().is_terminal()
    }

    fn read_all(&mut self) -> io::Result<String> {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputOrigin {
    File(PathBuf),
    Stdin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateInput {
    pub origin: InputOrigin,
    pub content: String,
}

impl TemplateInput {
    pub fn path(&self) -> Option<&Path> {
        match &self.origin {
            InputOrigin::File(path) => Some(path),
            InputOrigin::Stdin => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    File {
        path: PathBuf,
        /// Derived from the input name rather than given with `-o`.
        is_default: bool,
    },
}

impl OutputTarget {
    pub fn path(&self) -> Option<&Path> {
        match self {
            OutputTarget::File { path, .. } => Some(path),
            OutputTarget::Stdout => None,
        }
    }

    /// Replaces the extension of a derived output path. Explicit paths and stdout are unchanged.
    pub fn with_generated_extension(self, extension: &str) -> Self {
        match self {
            OutputTarget::File {
                path,
                is_default: true,
            } => OutputTarget::File {
                path: path.with_extension(extension.trim_start_matches('.')),
                is_default: true,
            },
            other => other,
        }
    }
}

/// `dir/name.ext` becomes `dir/name.txt`; a name without extension gets `.txt` appended.
pub fn default_output_path(input: &Path) -> PathBuf {
    match input.extension() {
        Some(ext) if !ext.is_empty() => input.with_extension(DEFAULT_OUTPUT_EXTENSION),
        _ => {
            let mut name = input.as_os_str().to_os_string();
            name.push(".");
            name.push(DEFAULT_OUTPUT_EXTENSION);
            PathBuf::from(name)
        }
    }
}

/// A preprocess target, `Namespace.Name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassName {
    pub namespace: Option<String>,
    pub name: String,
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Splits at the last `.`: everything before it is the namespace.
pub fn split_class_name(class_name: &str) -> Result<ClassName> {
    let (namespace, name) = match class_name.rfind('.') {
        Some(i) => (&class_name[..i], &class_name[i + 1..]),
        None => ("", class_name),
    };
    if !is_identifier(name) {
        return Err(TransformError::InvalidClassName(class_name.to_string()));
    }
    Ok(ClassName {
        namespace: (!namespace.is_empty()).then(|| namespace.to_string()),
        name: name.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Transform,
    Preprocess(ClassName),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub input: TemplateInput,
    pub output: OutputTarget,
    pub mode: Mode,
}

/// Resolves input, output and mode. Fails on user errors before anything is processed.
pub fn resolve(command_line: &CommandLine, console: &mut impl ConsoleInput) -> Result<Invocation> {
    let origin = match command_line.positionals.as_slice() {
        [file] => {
            let path = PathBuf::from(file);
            if !path.is_file() {
                return Err(TransformError::InputNotFound(path));
            }
            InputOrigin::File(path)
        }
        _ if console.is_redirected() => InputOrigin::Stdin,
        _ => return Err(TransformError::NoInput),
    };

    let content = match &origin {
        InputOrigin::File(path) => {
            fs::read_to_string(path).map_err(|source| TransformError::ReadInput {
                path: path.clone(),
                source,
            })?
        }
        InputOrigin::Stdin => console.read_all().map_err(TransformError::ReadStdin)?,
    };

    let requested = command_line
        .output_file
        .as_deref()
        .filter(|out| !out.is_empty());
    let output = match (requested, &origin) {
        (Some(STDOUT_SENTINEL), _) | (None, InputOrigin::Stdin) => OutputTarget::Stdout,
        (Some(out), _) => OutputTarget::File {
            path: PathBuf::from(out),
            is_default: false,
        },
        (None, InputOrigin::File(path)) => OutputTarget::File {
            path: default_output_path(path),
            is_default: true,
        },
    };

    if content.is_empty() {
        return Err(TransformError::EmptyInput);
    }

    let mode = match &command_line.config.preprocess_class_name {
        Some(class_name) => Mode::Preprocess(split_class_name(class_name)?),
        None => Mode::Transform,
    };

    tracing::debug!(?origin, ?output, ?mode, "resolved invocation");
    Ok(Invocation {
        input: TemplateInput { origin, content },
        output,
        mode,
    })
}

/// Scripted standard input for tests.
#[cfg(any(test, feature = "test_utils"))]
pub struct FakeConsole {
    pub redirected: bool,
    pub content: String,
    pub reads: usize,
}

#[cfg(any(test, feature = "test_utils"))]
impl FakeConsole {
    pub fn interactive() -> Self {
        Self {
            redirected: false,
            content: String::new(),
            reads: 0,
        }
    }

    pub fn piped(content: &str) -> Self {
        Self {
            redirected: true,
            content: content.to_string(),
            reads: 0,
        }
    }
}

#[cfg(any(test, feature = "test_utils"))]
impl ConsoleInput for FakeConsole {
    fn is_redirected(&self) -> bool {
        self.redirected
    }

    fn read_all(&mut self) -> io::Result<String> {
        self.reads += 1;
        Ok(std::mem::take(&mut self.content))
    }
}
