//! Process exit codes.

/// The template was processed and the output written.
pub const SUCCESS: i32 = 0;

/// A user or input error, a template error, or a failed output write.
pub const FAILURE: i32 = 1;

/// An unexpected internal fault caught at the entry point.
pub const INTERNAL: i32 = -1;

/// Exit code for a run given whether any error-severity diagnostic was reported.
pub fn for_diagnostics(has_errors: bool) -> i32 {
    if has_errors {
        FAILURE
    } else {
        SUCCESS
    }
}
