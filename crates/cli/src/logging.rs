//! stderr logging for the CLI. Library crates log through `log`; the
//! subscriber's `tracing-log` bridge picks those records up.

use tracing_subscriber::EnvFilter;

/// Environment variable holding an `EnvFilter` directive, e.g. `stockbal_recon=debug`.
pub const LOG_ENV: &str = "STOCKBAL_LOG";

/// `-v` and `-vv` override the environment.
pub fn init(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };

    // A second init (tests) leaves the first subscriber in place
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
