//! # CLI Layer
//!
//! The only part of texttransform that touches the terminal: it reads the
//! arguments and standard input, prints help, output and diagnostics, and
//! turns the outcome of a run into an exit code. Everything else is in the
//! library.

mod commands;
mod logging;
mod print;
mod setup;
mod styles;

pub use commands::run;
