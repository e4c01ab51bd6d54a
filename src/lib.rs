pub mod cli;
pub mod commands;
pub mod conversations;
pub mod error;
pub mod export;
pub mod paginate;
pub mod settings;
pub mod slack;
pub mod users;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub use cli::{Cli, ListInterestingCli};
pub use error::{AppError, Result};

/// The token given on the command line, else `SLACK_TOKEN`.
pub fn load_token(flag: Option<String>) -> Result<String> {
    resolve_token(flag, std::env::var("SLACK_TOKEN").ok())
}

/// Blank values count as missing, so an empty `--token` still falls back to the environment.
fn resolve_token(flag: Option<String>, env: Option<String>) -> Result<String> {
    flag.filter(|token| !token.trim().is_empty())
        .or(env)
        .filter(|token| !token.trim().is_empty())
        .ok_or(AppError::MissingToken)
}

/// Logs go to stderr so they never mix with the listing printed on stdout.
/// `RUST_LOG` wins over the verbosity count when set.
pub fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .try_init();
}
