mod aggregate;
mod config;
mod export;
mod filter;
mod import;
mod models;
mod report;
mod run;
mod util;

#[cfg(test)]
#[path = "util_tests.rs"]
mod util_tests;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    init_logging(args.iter().any(|a| a == "--verbose" || a == "-v"));
    run::as_cli(&args)
}

/// Log to stderr so command output stays clean. `RUST_LOG` takes precedence.
fn init_logging(verbose: bool) {
    let level = if verbose { "savings=debug" } else { "savings=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
