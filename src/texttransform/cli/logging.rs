use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Overrides the default filter, e.g. `TEXTTRANSFORM_LOG=templating=trace`.
pub const LOG_ENV: &str = "TEXTTRANSFORM_LOG";

fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "texttransform=debug,templating=debug,info"
    } else {
        "warn"
    }
}

/// Sends logs to stderr so they never mix with output written to stdout.
pub fn init_tracing(verbose: bool) {
    let env_filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(default_filter(verbose)))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose)
                .without_time()
                .compact(),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filters_parse() {
        for verbose in [false, true] {
            assert!(EnvFilter::try_new(default_filter(verbose)).is_ok());
        }
    }
}
