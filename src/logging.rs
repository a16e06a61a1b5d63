//! Tracing subscriber setup for the binary
//!
//! `RUST_LOG` takes precedence; otherwise the level follows `--verbose` /
//! `--quiet`. Logs go to stderr so stdout only carries the report.

use tracing_subscriber::EnvFilter;

/// Log level implied by the verbosity flags
pub fn default_level(verbose: bool, quiet: bool) -> &'static str {
    if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    }
}

/// Filter directive used when `RUST_LOG` is not set
pub fn default_directive(verbose: bool, quiet: bool) -> String {
    let level = default_level(verbose, quiet);
    if verbose {
        // keep dependency chatter (hyper, rustls) at warn
        format!("specscan={level},warn")
    } else {
        level.to_string()
    }
}

/// Install the global tracing subscriber
pub fn init_tracing(verbose: bool, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));

    // try_init: a subscriber may already be installed (e.g. in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_level() {
        assert_eq!(default_level(false, false), "warn");
        assert_eq!(default_level(true, false), "debug");
        assert_eq!(default_level(false, true), "error");
    }

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(true, false), "specscan=debug,warn");
        assert_eq!(default_directive(false, false), "warn");
    }

    #[test]
    fn test_init_tracing_twice() {
        init_tracing(false, true);
        init_tracing(true, false);
    }
}
