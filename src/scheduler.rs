//! Periodic trigger for scrape cycles.
//!
//! A plain tokio interval stands in for cron: the first tick fires
//! immediately (the startup scrape), then once per configured interval.
//! Cycles are serialized by construction since the loop awaits each one;
//! missed ticks are skipped rather than bunched up, so a slow cycle never
//! causes a burst of back-to-back scrapes.

use crate::models::{CampusCounts, CountyCounts, PeerBiCount, PeerSheetCount};
use crate::notify::Notifier;
use crate::pipeline::{self, Sources};
use crate::scrapers::SourceExtractor;
use crate::store::RecordStore;
use chrono::{Datelike, Local, Weekday};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Whether a cycle should run on `today` given the configured filter.
fn should_run(today: Weekday, weekdays: Option<&[Weekday]>) -> bool {
    match weekdays {
        Some(days) => days.contains(&today),
        None => true,
    }
}

/// Run scrape cycles forever on the configured cadence.
pub async fn run<A, B, C, D, S>(
    sources: Sources<A, B, C, D>,
    client: Client,
    store: Arc<S>,
    notifier: Notifier,
    interval: Duration,
    weekdays: Option<Vec<Weekday>>,
) where
    A: SourceExtractor<Partial = CampusCounts>,
    B: SourceExtractor<Partial = PeerBiCount>,
    C: SourceExtractor<Partial = PeerSheetCount>,
    D: SourceExtractor<Partial = CountyCounts>,
    S: RecordStore,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        let today = Local::now().weekday();
        if !should_run(today, weekdays.as_deref()) {
            debug!(?today, "source does not publish today; skipping cycle");
            continue;
        }

        pipeline::run_and_report(&sources, &client, store.as_ref(), &notifier).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_filter_runs_every_day() {
        for day in [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ] {
            assert!(should_run(day, None));
        }
    }

    #[test]
    fn test_filter_limits_to_publishing_days() {
        let days = [Weekday::Tue, Weekday::Thu, Weekday::Sat];
        assert!(should_run(Weekday::Tue, Some(&days)));
        assert!(should_run(Weekday::Sat, Some(&days)));
        assert!(!should_run(Weekday::Mon, Some(&days)));
        assert!(!should_run(Weekday::Sun, Some(&days)));
    }
}
