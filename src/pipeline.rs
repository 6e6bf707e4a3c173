//! The scrape orchestrator: one cycle from four sources to (maybe) one row.
//!
//! All four extractors run concurrently and join fail-fast: the first error
//! aborts the cycle before anything touches the store, so a partial record
//! can never be persisted. On success the disjoint partials merge into one
//! candidate, the change detector compares it against the latest stored
//! record, and only a material change is inserted.
//!
//! There is no retry inside a cycle; the next scheduled invocation is the
//! retry mechanism.

use crate::diff::{self, Decision};
use crate::error::ScrapeError;
use crate::models::{CampusCounts, CountyCounts, CovidRecord, PeerBiCount, PeerSheetCount};
use crate::notify::Notifier;
use crate::scrapers::campus::CampusDashboard;
use crate::scrapers::county_csv::CountyCsv;
use crate::scrapers::peer_bi::PeerBiQuery;
use crate::scrapers::peer_sheet::PeerSheetFeed;
use crate::scrapers::{SourceExtractor, Timed};
use crate::store::RecordStore;
use chrono::Utc;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{error, info, instrument, warn};

/// The four extractors a scrape cycle runs.
///
/// Generic so tests can substitute fixed-value extractors; production code
/// uses [`Sources::live`].
pub struct Sources<A, B, C, D> {
    pub campus: A,
    pub peer_bi: B,
    pub peer_sheet: C,
    pub county: D,
}

/// The production source set, each extractor under a deadline.
pub type LiveSources =
    Sources<Timed<CampusDashboard>, Timed<PeerBiQuery>, Timed<PeerSheetFeed>, Timed<CountyCsv>>;

impl LiveSources {
    pub fn live(sources: &crate::config::SourcesConfig, deadline: Duration) -> Self {
        Sources {
            campus: Timed::new(CampusDashboard::new(sources.dashboard_url.clone()), deadline),
            peer_bi: Timed::new(PeerBiQuery::new(sources.bi_query_url.clone()), deadline),
            peer_sheet: Timed::new(PeerSheetFeed::new(sources.sheet_feed_url.clone()), deadline),
            county: Timed::new(CountyCsv::new(sources.county_csv_url.clone()), deadline),
        }
    }
}

/// What a successful cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A new record was inserted under this id.
    Persisted(u64),
    /// The candidate matched the latest stored record; nothing was written.
    Unchanged,
}

/// Run one full scrape cycle against `store`.
#[instrument(level = "info", skip_all)]
pub async fn run_cycle<A, B, C, D, S>(
    sources: &Sources<A, B, C, D>,
    client: &Client,
    store: &S,
) -> Result<CycleOutcome, ScrapeError>
where
    A: SourceExtractor<Partial = CampusCounts>,
    B: SourceExtractor<Partial = PeerBiCount>,
    C: SourceExtractor<Partial = PeerSheetCount>,
    D: SourceExtractor<Partial = CountyCounts>,
    S: RecordStore,
{
    info!("scrape cycle starting");
    let start = Instant::now();

    // Fail-fast join: the first extractor error cancels the cycle.
    let (campus, peer_bi, peer_sheet, county) = futures::try_join!(
        sources.campus.extract(client),
        sources.peer_bi.extract(client),
        sources.peer_sheet.extract(client),
        sources.county.extract(client),
    )?;

    info!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        "all sources scraped"
    );

    let candidate = CovidRecord::assemble(Utc::now(), campus, peer_bi, peer_sheet, county);
    let latest = store.find_latest()?;

    match diff::decide(&candidate, latest.as_ref().map(|stored| &stored.record)) {
        Decision::Skip => {
            info!("data unchanged since last record; skipping");
            Ok(CycleOutcome::Unchanged)
        }
        Decision::Persist => {
            if let Some(previous) = &latest {
                let changed = diff::changed_fields(&candidate, &previous.record);
                info!(?changed, "tracked fields changed");
                warn_on_regression(&candidate, &previous.record);
            } else {
                info!("store is empty; persisting first record");
            }

            let id = store.insert(&candidate)?;
            info!(id, "record persisted");
            Ok(CycleOutcome::Persisted(id))
        }
    }
}

/// Run a cycle, logging the outcome and reporting failures to the notifier.
///
/// This is the entry point the scheduler calls; it never propagates errors
/// because a failed cycle ends with the store untouched and the next tick
/// recomputes everything from live sources.
pub async fn run_and_report<A, B, C, D, S>(
    sources: &Sources<A, B, C, D>,
    client: &Client,
    store: &S,
    notifier: &Notifier,
) where
    A: SourceExtractor<Partial = CampusCounts>,
    B: SourceExtractor<Partial = PeerBiCount>,
    C: SourceExtractor<Partial = PeerSheetCount>,
    D: SourceExtractor<Partial = CountyCounts>,
    S: RecordStore,
{
    let start = Instant::now();
    match run_cycle(sources, client, store).await {
        Ok(CycleOutcome::Persisted(id)) => {
            info!(
                id,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "scrape cycle persisted a new record"
            );
        }
        Ok(CycleOutcome::Unchanged) => {
            info!(
                elapsed_ms = start.elapsed().as_millis() as u64,
                "scrape cycle finished with no changes"
            );
        }
        Err(err) => {
            error!(error = %err, "scrape cycle failed; store untouched");
            notifier
                .report(&format!("bccovid scrape cycle failed: {err}"))
                .await;
        }
    }
}

/// Cumulative counters should not go down. The sources occasionally revise
/// figures downward anyway, so a regression is stored as published and only
/// flagged in the logs.
fn warn_on_regression(candidate: &CovidRecord, previous: &CovidRecord) {
    let cumulative = [
        ("total_tested", candidate.total_tested, previous.total_tested),
        ("total_positive", candidate.total_positive, previous.total_positive),
        ("undergrad_tested", candidate.undergrad_tested, previous.undergrad_tested),
        ("undergrad_positive", candidate.undergrad_positive, previous.undergrad_positive),
        ("recovered", candidate.recovered, previous.recovered),
        ("state_positive", candidate.state_positive, previous.state_positive),
    ];

    for (field, new_value, old_value) in cumulative {
        if new_value < old_value {
            warn!(field, new_value, old_value, "cumulative counter regressed");
        }
    }
}
