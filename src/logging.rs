//! Tracing subscriber setup.
//!
//! The `--log` target selects where output goes:
//! `0`/`off`, `1`/`stdout`, `2`/`stderr` (default), or a file path opened in
//! append mode. `RUST_LOG` takes precedence over the `--verbose` level.

use anyhow::Result;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Where log output is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Off,
    Stdout,
    Stderr,
    File(String),
}

impl LogTarget {
    pub fn parse(value: &str) -> Self {
        match value {
            "0" | "off" => LogTarget::Off,
            "1" | "stdout" => LogTarget::Stdout,
            "2" | "stderr" => LogTarget::Stderr,
            filename => LogTarget::File(filename.to_string()),
        }
    }
}

fn env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()))
}

/// Install the global subscriber.
pub fn init(target: &LogTarget, verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter(level));

    match target {
        LogTarget::Off => {}
        LogTarget::Stdout => {
            tracing::subscriber::set_global_default(builder.with_writer(std::io::stdout).finish())?;
        }
        LogTarget::Stderr => {
            tracing::subscriber::set_global_default(builder.with_writer(std::io::stderr).finish())?;
        }
        LogTarget::File(filename) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(filename)?;
            let subscriber = builder
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    Ok(())
}
