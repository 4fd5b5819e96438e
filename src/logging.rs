//! `tracing` subscriber setup.
//!
//! Text/JSON modes log to stderr. The TUI owns the terminal, so it logs to a
//! file under the cache dir instead.

use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

fn log_file_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|d| d.join("trino-scaleout").join("trino-scaleout.log"))
}

fn open_log_file() -> Option<std::fs::File> {
    let path = log_file_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok()?;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .ok()
}

pub fn init(tui: bool) {
    // Keep stderr quiet by default so progress lines stay readable.
    let default_level = if tui { "info" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let result = if tui {
        let Some(file) = open_log_file() else {
            return;
        };
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .try_init()
    };

    if let Err(error) = result {
        eprintln!("logger initialization failed: {}", error);
    }
}
