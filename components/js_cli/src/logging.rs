//! Tracing subscriber setup
//!
//! `CORTEN_LOG` (or `RUST_LOG`) selects what is logged, using the
//! `EnvFilter` directive syntax, e.g. `CORTEN_LOG=js_compiler=trace`.
//! `CORTEN_LOG_FORMAT=json` switches to one JSON object per event. Output
//! goes to stderr so listings on stdout stay clean.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Plain text lines
    Text,
    /// Newline-delimited JSON
    Json,
}

impl LogFormat {
    /// Reads the format from a `CORTEN_LOG_FORMAT` value.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::to_ascii_lowercase).as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

fn build_filter() -> EnvFilter {
    match std::env::var("CORTEN_LOG") {
        Ok(directives) => EnvFilter::builder().parse_lossy(directives),
        Err(_) => EnvFilter::from_default_env(),
    }
}

/// Installs the global subscriber when `CORTEN_LOG` or `RUST_LOG` is set.
pub fn init_tracing() {
    if std::env::var_os("CORTEN_LOG").is_none() && std::env::var_os("RUST_LOG").is_none() {
        return;
    }
    let filter = build_filter();
    let format = LogFormat::parse(std::env::var("CORTEN_LOG_FORMAT").ok().as_deref());

    match format {
        LogFormat::Json => {
            let layer = fmt::layer().json().with_writer(std::io::stderr);
            Registry::default().with(filter).with(layer).init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
