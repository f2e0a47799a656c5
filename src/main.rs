// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

mod app;
mod config;
mod logic;
mod models;
mod mvu;
mod ui;

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::logic::client::HttpBackend;

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kbmeta=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let path = Config::default_path()?;
    let config = Config::load(&path)?;
    tracing::info!(config = %path.display(), base_url = config.base_url(), "starting");

    let backend = HttpBackend::new(config.base_url(), config.api_key(), config.timeout()?)
        .context("configure knowledge-base client")?;

    app::run(config, Arc::new(backend)).map_err(|err| anyhow!("ui error: {err}"))
}
