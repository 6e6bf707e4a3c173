//! # bccovid
//!
//! Backend for a COVID-19 dashboard tracking the Boston College community.
//! Scrapes four structurally different public sources on a schedule, merges
//! them into one canonical record per cycle, persists only material changes,
//! and serves the resulting history over a small JSON API.
//!
//! ## Architecture
//!
//! 1. **Extract**: four source extractors run concurrently against the
//!    campus HTML dashboard, BU's PowerBI query API, NEU's spreadsheet feed
//!    and the USAFacts county CSV, joined fail-fast.
//! 2. **Merge**: the disjoint partial records combine into one candidate
//!    stamped with the scrape time.
//! 3. **Detect**: the candidate is compared field-by-field against the
//!    latest stored record; identical data is skipped.
//! 4. **Serve**: `GET /data` returns the stored series for the frontend.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod diff;
mod error;
mod models;
mod notify;
mod pipeline;
mod scheduler;
mod scrapers;
mod server;
mod store;

use cli::Cli;
use config::Config;
use notify::Notifier;
use pipeline::LiveSources;
use server::AppState;
use store::SledStore;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "bccovid starting up");

    let args = Cli::parse();
    debug!(?args.config, once = args.once, "parsed CLI arguments");

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(db_path) = args.db_path {
        config.db_path = db_path;
    }
    if let Some(listen_addr) = args.listen_addr {
        config.listen_addr = listen_addr;
    }
    if let Some(webhook_url) = args.webhook_url {
        config.webhook_url = Some(webhook_url);
    }

    let weekdays = config.scrape.weekday_filter()?;
    let interval = Duration::from_secs(config.scrape.interval_minutes * 60);
    let deadline = Duration::from_secs(config.scrape.timeout_secs);

    let store = Arc::new(SledStore::open(&config.db_path).context("failed to open record store")?);

    let client = reqwest::Client::builder()
        .timeout(deadline)
        .user_agent(concat!("bccovid/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")?;

    let notifier = Notifier::new(client.clone(), config.webhook_url.clone());
    let sources = LiveSources::live(&config.sources, deadline);

    if args.once {
        info!("running a single scrape cycle");
        pipeline::run_and_report(&sources, &client, store.as_ref(), &notifier).await;
        return Ok(());
    }

    // The scheduler's first tick fires immediately, covering the startup
    // scrape; the read API serves whatever the store already holds.
    tokio::spawn(scheduler::run(
        sources,
        client,
        Arc::clone(&store),
        notifier,
        interval,
        weekdays,
    ));

    server::run(&config.listen_addr, AppState { store }).await
}
