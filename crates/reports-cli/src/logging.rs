// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use std::env;
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Full filter directives; replaces `[log] level` when set.
pub const LOG_ENV: &str = "REPORTS_LOG";

pub fn validate_level(level: &str) -> Result<()> {
    EnvFilter::try_new(level).map(|_| ()).with_context(|| {
        format!("{level:?} is not a valid log filter (for example warn or reports_client=debug)")
    })
}

fn build_filter(level: &str) -> Result<EnvFilter> {
    match env::var(LOG_ENV) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(&directives)
            .with_context(|| format!("parse {LOG_ENV}={directives:?}")),
        _ => EnvFilter::try_new(level).with_context(|| format!("parse log level {level:?}")),
    }
}

/// Installs the global subscriber, appending plain-text events to `file`.
///
/// The terminal belongs to the UI, so nothing is ever written to stdout or
/// stderr from here on.
pub fn init(level: &str, file: &Path) -> Result<()> {
    let filter = build_filter(level)?;

    if let Some(parent) = file.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    let handle = OpenOptions::new()
        .create(true)
        .append(true)
        .open(file)
        .with_context(|| format!("open log file {}", file.display()))?;

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_thread_names(true)
        .with_writer(Arc::new(handle));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init()
        .context("install log subscriber")?;
    Ok(())
}
