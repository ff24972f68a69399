use std::panic;
use texttransform::exit_codes;

mod cli;

fn main() {
    // The default panic hook has already printed the message and location.
    let code = panic::catch_unwind(cli::run).unwrap_or(exit_codes::INTERNAL);
    std::process::exit(code);
}
