use super::logging::init_tracing;
use super::print::{print_error, print_help, print_report};
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use texttransform::config::{GeneratorConfig, ToolConfig};
use texttransform::engine::BuiltinEngine;
use texttransform::error::TransformError;
use texttransform::exit_codes;
use texttransform::invocation::{self, ConsoleInput, StdinInput};
use texttransform::options::{self, ParseOutcome};
use texttransform::pipeline::Transformer;

/// Runs one invocation against the real process environment and returns the exit code.
pub fn run() -> i32 {
    if !io::stderr().is_terminal() {
        colored::control::set_override(false);
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut console = StdinInput;
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    match execute(args, &mut console, &cwd) {
        Ok(code) => code,
        Err(err) => {
            print_error(&err);
            if matches!(err, TransformError::Options(_)) {
                eprintln!("Use --help to display options.");
            }
            exit_codes::FAILURE
        }
    }
}

fn execute(args: Vec<String>, console: &mut StdinInput, cwd: &Path) -> Result<i32, TransformError> {
    if args.is_empty() && !console.is_redirected() {
        print_help(true);
    }

    let mut command_line = match options::parse(args, GeneratorConfig::default())? {
        ParseOutcome::Help => {
            print_help(false);
            return Ok(exit_codes::SUCCESS);
        }
        ParseOutcome::Run(command_line) => command_line,
    };
    init_tracing(command_line.config.verbose);
    ToolConfig::discover(cwd)?.apply(&mut command_line.config);

    let invocation = invocation::resolve(&command_line, console)?;
    let input_path = invocation.input.path().map(Path::to_path_buf);

    let engine = BuiltinEngine::new(command_line.config.engine.clone());
    let result = Transformer::new(engine).run(
        invocation,
        &command_line.config,
        &command_line.properties,
    );

    if let Some(output) = &result.output {
        output.write(&mut io::stdout().lock())?;
    }
    print_report(input_path.as_deref(), &result.diagnostics);

    Ok(exit_codes::for_diagnostics(result.has_errors()))
}
