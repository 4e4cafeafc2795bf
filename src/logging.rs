//! Logging setup for the command-line front-end
//!
//! Events go to stderr so stdout carries only the response.

use tracing_subscriber::EnvFilter;

/// Initialize logging; `RUST_LOG` overrides the default level
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "wireprobe=debug" } else { "wireprobe=warn" };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Initialize logging with a custom filter
pub fn init_logging_with_filter(filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_logging_with_filter("wireprobe=trace");
        init_logging(true);
        tracing::debug!("logging initialized twice without panicking");
    }
}
