//! # texttransform Architecture
//!
//! texttransform is a command-line processor for T4-style text templates. The
//! template language itself lives in the `templating` crate; this crate is the
//! orchestration around it, and it is a library first. The binary is a thin
//! client.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (cli/, wired by main.rs)                         │
//! │  - Reads args, prints help, output and diagnostics          │
//! │  - The ONLY place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Orchestration (options, invocation, coercion, pipeline)    │
//! │  - Parses options into a GeneratorConfig                    │
//! │  - Resolves input, output and mode                          │
//! │  - Types -p values, runs the engine, collects diagnostics   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Template Engine (engine/ → templating crate)               │
//! │  - TemplateEngine trait                                     │
//! │  - BuiltinEngine (production), RecordingEngine (testing)    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## A run
//!
//! 1. [`options::parse`] turns arguments into a [`options::CommandLine`].
//! 2. [`invocation::resolve`] picks the input (file or stdin), the output
//!    (file or stdout) and the mode (transform or preprocess). User errors
//!    stop here, before the engine is touched.
//! 3. [`pipeline::Transformer::run`] parses the template, resolves settings,
//!    coerces `-p` parameters ([`coercion`]) and transforms or preprocesses.
//! 4. The caller writes the output if there were no errors, then renders the
//!    diagnostics with [`report`].
//!
//! ## Errors
//!
//! User and I/O errors are [`error::TransformError`] values and end a run
//! early. Template problems are never errors in that sense: they are
//! diagnostics, collected across all stages and reported together.
//!
//! ## Testing Strategy
//!
//! - Each module has unit tests next to it.
//! - `engine::RecordingEngine` (under `cfg(test)` or the `test_utils` feature)
//!   records engine calls, so tests can assert that the engine was, or was not, invoked.
//! - `tests/` drives the binary end to end.

pub mod coercion;
pub mod config;
pub mod engine;
pub mod error;
pub mod exit_codes;
pub mod invocation;
pub mod options;
pub mod pipeline;
pub mod report;
