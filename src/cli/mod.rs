//! CLI command definitions, logging setup, and status output.
//!
//! Uses clap derive macros for argument definitions.

pub mod args;

use colored::Colorize;
use tracing_subscriber::EnvFilter;

/// Default log directive for the given verbosity flags.
pub fn default_log_directive(verbose: bool, quiet: bool) -> &'static str {
    if verbose {
        "prscribe=debug"
    } else if quiet {
        "prscribe=warn"
    } else {
        "prscribe=info"
    }
}

/// Install the stderr tracing subscriber. `RUST_LOG` overrides the flags.
pub fn init_logging(verbose: bool, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_directive(verbose, quiet)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Print the final success line to stderr.
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✔".green().bold(), message);
}

/// Print the final failure line to stderr, naming the failed stage.
pub fn print_failure(stage: &str, message: &str) {
    eprintln!(
        "{} {} {}",
        "✖".red().bold(),
        format!("[{stage}]").red(),
        message
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_directive_follows_flags() {
        assert_eq!(default_log_directive(false, false), "prscribe=info");
        assert_eq!(default_log_directive(true, false), "prscribe=debug");
        assert_eq!(default_log_directive(false, true), "prscribe=warn");
    }

    #[test]
    fn status_lines_do_not_panic() {
        print_success("posted");
        print_failure("publish", "HTTP 422");
    }
}
