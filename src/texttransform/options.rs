//! # Option Model
//!
//! Options are described by a declarative table, [`OPTIONS`]. A single parser
//! loop walks the arguments left to right, matches each flag against the
//! table, collects the number of values the option's [`Arity`] asks for and
//! applies it to a [`CommandLine`] accumulator. Later options therefore
//! override earlier ones for single-value settings such as the output path.
//!
//! Flag syntax:
//!
//! - `-o file`, `-o=file`, `-o:file`, `--out=file` (both `-` and `--` work for every alias)
//! - `-p name=value` or `-p name value`: only the first `=` separates the name, so values may contain `=`
//! - `-dp directive!class!assembly`, or the three values as separate arguments
//! - `-a [[processor!]directive!]name=value`: optional leading scopes
//! - `--` ends option parsing; a lone `-` is a positional argument
//!
//! A help flag stops parsing immediately and yields [`ParseOutcome::Help`].

use crate::config::GeneratorConfig;
use crate::error::OptionError;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Raw `-p` values, by name. The last value given for a name wins.
pub type Properties = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Output,
    Reference,
    Using,
    IncludePath,
    ReferencePath,
    Class,
    RelativeLinePragmas,
    Parameter,
    Debug,
    Verbose,
    Help,
    DirectiveProcessor,
    HostParameter,
}

/// How many values an option consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Flag,
    Value,
    /// One argument split on any of `separators` into between `min` and `max`
    /// values. Splitting stops once `max - 1` separators have been consumed.
    /// When `min == max`, missing values are taken from the following arguments.
    Split {
        separators: &'static [char],
        min: usize,
        max: usize,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct OptionSpec {
    pub kind: OptionKind,
    pub aliases: &'static [&'static str],
    pub arity: Arity,
    /// Value names shown in help, one per value.
    pub values: &'static [&'static str],
    pub description: &'static str,
}

pub const OPTIONS: &[OptionSpec] = &[
    OptionSpec {
        kind: OptionKind::Output,
        aliases: &["o", "out"],
        arity: Arity::Value,
        values: &["file"],
        description: "Set the name or path of the output <file>. It defaults to the input filename with its \
            extension changed to `.txt`, or to match the generated code when preprocessing, and may be \
            overridden by template settings. Use `-` instead of a filename to write to stdout.",
    },
    OptionSpec {
        kind: OptionKind::Reference,
        aliases: &["r"],
        arity: Arity::Value,
        values: &["assembly"],
        description: "Add an <assembly> reference. It is passed to the template settings and generated code.",
    },
    OptionSpec {
        kind: OptionKind::Using,
        aliases: &["u", "using"],
        arity: Arity::Value,
        values: &["namespace"],
        description: "Import a <namespace> by generating a use statement.",
    },
    OptionSpec {
        kind: OptionKind::IncludePath,
        aliases: &["I"],
        arity: Arity::Value,
        values: &["directory"],
        description: "Add a <directory> to be searched when resolving included files.",
    },
    OptionSpec {
        kind: OptionKind::ReferencePath,
        aliases: &["P"],
        arity: Arity::Value,
        values: &["directory"],
        description: "Add a <directory> to be searched when resolving assemblies.",
    },
    OptionSpec {
        kind: OptionKind::Class,
        aliases: &["c", "class"],
        arity: Arity::Value,
        values: &["name"],
        description: "Preprocess the template into class <name> for use as a runtime template. \
            The class name may include a namespace.",
    },
    OptionSpec {
        kind: OptionKind::RelativeLinePragmas,
        aliases: &["l", "useRelativeLinePragmas"],
        arity: Arity::Flag,
        values: &[],
        description: "Use relative paths in line pragmas.",
    },
    OptionSpec {
        kind: OptionKind::Parameter,
        aliases: &["p", "parameter"],
        arity: Arity::Split {
            separators: &['='],
            min: 2,
            max: 2,
        },
        values: &["name", "value"],
        description: "Set session parameter <name> to <value>. The value is available to the template as a \
            variable and through `session`. If <name> matches a parameter directive \
            (<#@ parameter name='<name>' type='<type>' #>), the value is converted to that parameter's type.",
    },
    OptionSpec {
        kind: OptionKind::Debug,
        aliases: &["debug"],
        arity: Arity::Flag,
        values: &[],
        description: "Keep the generated intermediate template source.",
    },
    OptionSpec {
        kind: OptionKind::Verbose,
        aliases: &["v", "verbose"],
        arity: Arity::Flag,
        values: &[],
        description: "Output additional diagnostic information to stderr.",
    },
    OptionSpec {
        kind: OptionKind::Help,
        aliases: &["h", "?", "help"],
        arity: Arity::Flag,
        values: &[],
        description: "Show help",
    },
    OptionSpec {
        kind: OptionKind::DirectiveProcessor,
        aliases: &["dp"],
        arity: Arity::Split {
            separators: &['!'],
            min: 3,
            max: 3,
        },
        values: &["directive", "class", "assembly"],
        description: "Set <directive> to be handled by directive processor <class> in <assembly>.",
    },
    OptionSpec {
        kind: OptionKind::HostParameter,
        aliases: &["a"],
        arity: Arity::Split {
            separators: &['!', '='],
            min: 2,
            max: 4,
        },
        values: &["processor", "directive", "name", "value"],
        description: "Set host parameter <name> to <value>. It may optionally be scoped to a <directive> \
            and/or <processor>. Host-specific templates read it with host_parameter().",
    },
];

/// Looks up an option by alias. Aliases are case-sensitive (`-p` and `-P` differ).
pub fn find_option(alias: &str) -> Option<&'static OptionSpec> {
    OPTIONS.iter().find(|spec| spec.aliases.contains(&alias))
}

/// Everything the command line asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandLine {
    pub config: GeneratorConfig,
    /// `-o` value as given; `-` means stdout.
    pub output_file: Option<String>,
    pub properties: Properties,
    pub positionals: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// Help was requested. Nothing after the help flag was parsed.
    Help,
    Run(CommandLine),
}

fn is_flag_shaped(arg: &str) -> bool {
    arg.len() > 1 && arg.starts_with('-')
}

/// Splits `-name=value` / `-name:value` into the alias and its inline value.
fn split_flag(arg: &str) -> (&str, Option<&str>) {
    let body = arg
        .strip_prefix("--")
        .or_else(|| arg.strip_prefix('-'))
        .unwrap_or(arg);
    match body.find(['=', ':']) {
        Some(i) => (&body[..i], Some(&body[i + 1..])),
        None => (body, None),
    }
}

/// Splits `raw` on separators into at most `max` values.
fn split_values(raw: &str, separators: &[char], max: usize) -> Vec<String> {
    let mut values = Vec::with_capacity(max);
    let mut rest = raw;
    while values.len() + 1 < max {
        let Some(i) = rest.find(separators) else {
            break;
        };
        values.push(rest[..i].to_string());
        rest = &rest[i + 1..];
    }
    values.push(rest.to_string());
    values
}

fn describe_count(arity: Arity) -> String {
    match arity {
        Arity::Split {
            separators,
            min,
            max,
        } => {
            let seps: Vec<String> = separators.iter().map(|c| format!("'{}'", c)).collect();
            let count = if min == max {
                min.to_string()
            } else {
                format!("{} to {}", min, max)
            };
            format!("{} values separated by {}", count, seps.join(" or "))
        }
        Arity::Value => "a value".to_string(),
        Arity::Flag => "no value".to_string(),
    }
}

/// Parses arguments on top of `config`, which may already hold defaults.
pub fn parse<I, S>(args: I, config: GeneratorConfig) -> Result<ParseOutcome, OptionError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut command_line = CommandLine {
        config,
        ..CommandLine::default()
    };
    let mut args = args.into_iter().map(Into::into);
    let mut options_done = false;

    while let Some(arg) = args.next() {
        if options_done || !is_flag_shaped(&arg) {
            command_line.positionals.push(arg);
            continue;
        }
        if arg == "--" {
            options_done = true;
            continue;
        }

        let (alias, inline) = split_flag(&arg);
        let spec = find_option(alias).ok_or_else(|| OptionError::Unknown(arg.clone()))?;

        let values = match spec.arity {
            Arity::Flag => {
                if let Some(value) = inline {
                    return Err(OptionError::UnexpectedValue {
                        option: arg.clone(),
                        value: value.to_string(),
                    });
                }
                Vec::new()
            }
            Arity::Value | Arity::Split { .. } => {
                let raw = match inline {
                    Some(value) if !value.is_empty() => value.to_string(),
                    Some(_) => return Err(OptionError::MissingValue(arg.clone())),
                    None => args
                        .next()
                        .ok_or_else(|| OptionError::MissingValue(arg.clone()))?,
                };
                match spec.arity {
                    Arity::Split {
                        separators,
                        min,
                        max,
                    } => {
                        let mut values = split_values(&raw, separators, max);
                        // Fixed-arity options keep consuming arguments until every value is present.
                        if min == max {
                            while values.len() < max {
                                let next = args
                                    .next()
                                    .ok_or_else(|| OptionError::MissingValue(arg.clone()))?;
                                values.extend(split_values(&next, separators, max - values.len()));
                            }
                        }
                        if values.len() < min {
                            return Err(OptionError::WrongValueCount {
                                option: arg.clone(),
                                expected: describe_count(spec.arity),
                                value: raw,
                            });
                        }
                        values
                    }
                    _ => vec![raw],
                }
            }
        };

        if spec.kind == OptionKind::Help {
            return Ok(ParseOutcome::Help);
        }
        apply(spec.kind, values, &mut command_line);
    }

    Ok(ParseOutcome::Run(command_line))
}

fn scope(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}

/// Binds host parameter values using the optional-leading-scope rule:
/// `(name, value)`, `(directive, name, value)` or `(processor, directive, name, value)`.
pub fn bind_host_parameter(values: &[String], config: &mut GeneratorConfig) {
    let engine = &mut config.engine;
    match values {
        [name, value] => engine.add_host_parameter(None, None, name, value),
        [directive, name, value] => engine.add_host_parameter(None, scope(directive), name, value),
        [processor, directive, name, value] => {
            engine.add_host_parameter(scope(processor), scope(directive), name, value)
        }
        _ => {}
    }
}

fn apply(kind: OptionKind, mut values: Vec<String>, command_line: &mut CommandLine) {
    let config = &mut command_line.config;
    let mut single = || values.pop().unwrap_or_default();
    match kind {
        OptionKind::Output => command_line.output_file = Some(single()),
        OptionKind::Reference => config.engine.references.push(single()),
        OptionKind::Using => config.engine.imports.push(single()),
        OptionKind::IncludePath => config.engine.include_paths.push(PathBuf::from(single())),
        OptionKind::ReferencePath => config.engine.reference_paths.push(PathBuf::from(single())),
        OptionKind::Class => config.preprocess_class_name = Some(single()),
        OptionKind::RelativeLinePragmas => config.engine.use_relative_line_pragmas = true,
        OptionKind::Debug => config.debug = true,
        OptionKind::Verbose => config.verbose = true,
        OptionKind::Parameter => {
            if let [name, value] = values.as_slice() {
                command_line.properties.insert(name.clone(), value.clone());
            }
        }
        OptionKind::DirectiveProcessor => {
            if let [directive, class, assembly] = values.as_slice() {
                config
                    .engine
                    .add_directive_processor(directive, class, assembly);
            }
        }
        OptionKind::HostParameter => bind_host_parameter(&values, config),
        OptionKind::Help => {}
    }
}
