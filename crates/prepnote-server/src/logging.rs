//! Log filter setup for the server binary.

use std::path::Path;

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "prepnote=info,prepnote_server=info,tower_http=info";

/// Loads `.env` (from `dotenv_path`, or the working directory) and then
/// builds the filter, so a `RUST_LOG` set there takes effect. Variables
/// already in the process environment win over the file.
pub fn env_filter(dotenv_path: Option<&Path>) -> EnvFilter {
    let loaded = match dotenv_path {
        Some(path) => dotenvy::from_path(path).map(|_| path.to_path_buf()),
        None => dotenvy::dotenv(),
    };
    // The subscriber isn't installed yet, so report on stderr.
    if let Err(e) = &loaded {
        if !e.not_found() {
            eprintln!("Ignoring unreadable .env file: {}", e);
        }
    }

    EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into())
}
