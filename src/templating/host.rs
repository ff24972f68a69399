//! Host-side configuration handed to the engine: references, imports,
//! search paths, directive processor registrations and host parameters.

use std::collections::BTreeMap;
use std::path::PathBuf;

/// Identifies a host parameter, optionally scoped to a processor and/or directive.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParameterKey {
    pub processor: Option<String>,
    pub directive: Option<String>,
    pub name: String,
}

impl ParameterKey {
    pub fn new(processor: Option<&str>, directive: Option<&str>, name: &str) -> Self {
        Self {
            processor: processor.map(str::to_string),
            directive: directive.map(str::to_string),
            name: name.to_string(),
        }
    }

    pub fn unscoped(name: &str) -> Self {
        Self::new(None, None, name)
    }

    pub fn is_scoped(&self) -> bool {
        self.processor.is_some() || self.directive.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveProcessor {
    pub name: String,
    pub class: String,
    pub assembly: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOptions {
    pub references: Vec<String>,
    pub imports: Vec<String>,
    pub include_paths: Vec<PathBuf>,
    pub reference_paths: Vec<PathBuf>,
    pub use_relative_line_pragmas: bool,
    pub(crate) directive_processors: BTreeMap<String, DirectiveProcessor>,
    pub(crate) host_parameters: BTreeMap<ParameterKey, String>,
}

impl EngineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a processor by name. A later registration under the same name replaces the earlier one.
    pub fn add_directive_processor(&mut self, name: &str, class: &str, assembly: &str) {
        self.directive_processors.insert(
            name.to_string(),
            DirectiveProcessor {
                name: name.to_string(),
                class: class.to_string(),
                assembly: assembly.to_string(),
            },
        );
    }

    pub fn directive_processor(&self, name: &str) -> Option<&DirectiveProcessor> {
        self.directive_processors.get(name)
    }

    pub fn directive_processors(&self) -> impl Iterator<Item = &DirectiveProcessor> {
        self.directive_processors.values()
    }

    /// Sets a host parameter. The last value for a given key wins.
    pub fn add_host_parameter(
        &mut self,
        processor: Option<&str>,
        directive: Option<&str>,
        name: &str,
        value: &str,
    ) {
        self.host_parameters.insert(
            ParameterKey::new(processor, directive, name),
            value.to_string(),
        );
    }

    pub fn host_parameters(&self) -> impl Iterator<Item = (&ParameterKey, &str)> {
        self.host_parameters.iter().map(|(k, v)| (k, v.as_str()))
    }

    pub fn host_parameter(&self, key: &ParameterKey) -> Option<&str> {
        self.host_parameters.get(key).map(String::as_str)
    }

    /// Looks up a host parameter: the exact scoped key first, then the unscoped name.
    pub fn resolve_host_parameter(
        &self,
        processor: Option<&str>,
        directive: Option<&str>,
        name: &str,
    ) -> Option<&str> {
        let key = ParameterKey::new(processor, directive, name);
        self.host_parameter(&key).or_else(|| {
            if key.is_scoped() {
                self.host_parameter(&ParameterKey::unscoped(name))
            } else {
                None
            }
        })
    }
}
