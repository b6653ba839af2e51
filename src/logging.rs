// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Subscriber setup for the binary.
//!
//! Filter priority: `POLYRANK_LOG`, then `RUST_LOG`, then
//! `polyrank=<level>,warn`. Logs go to stderr so `rank` output stays clean
//! JSON on stdout.

use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Env var with the highest filter priority.
pub const LOG_ENV: &str = "POLYRANK_LOG";

/// The filter the subscriber will use for `level`.
pub fn env_filter(level: Level) -> EnvFilter {
    std::env::var(LOG_ENV)
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(format!("polyrank={},warn", level)))
}

/// Install the global subscriber. A second call is a no-op.
pub fn init_logging(level: Level, json: bool) {
    let filter = env_filter(level);
    let ansi = atty::is(atty::Stream::Stderr);

    let result = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(true)
                    .with_target(true),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(ansi)
                    .with_target(false),
            )
            .try_init()
    };
    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Parse a level name, falling back to `INFO`.
pub fn parse_level(name: &str) -> Level {
    Level::from_str(name).unwrap_or(Level::INFO)
}
