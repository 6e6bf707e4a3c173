//! Source extractors for the external COVID-19 data sources.
//!
//! Each submodule scrapes one third-party source into a typed partial
//! record. All four follow the same template: fetch, validate the source
//! still has the expected shape, parse numbers defensively. A validation
//! failure is always an error naming the expectation that broke; extractors
//! never substitute a default value.
//!
//! # Sources
//!
//! | Source | Module | Method |
//! |--------|--------|--------|
//! | BC reopening dashboard | [`campus`] | HTML scraping (labeled figure grid) |
//! | BU testing dashboard | [`peer_bi`] | PowerBI query API |
//! | NEU testing dashboard | [`peer_sheet`] | Google Sheets cell feed |
//! | Massachusetts counties | [`county_csv`] | USAFacts CSV download |
//!
//! The [`SourceExtractor`] trait is the shared capability; [`Timed`] wraps
//! any extractor with a deadline, since an unbounded hang on one source
//! would stall every future scheduled cycle.

use crate::error::ScrapeError;
use reqwest::Client;
use std::time::Duration;
use tracing::warn;

pub mod campus;
pub mod county_csv;
pub mod json_path;
pub mod peer_bi;
pub mod peer_sheet;

/// One external source's fetch-and-parse capability.
///
/// Implementations are stateless beyond their configured endpoint; given a
/// client they either produce their partial record or fail with a
/// descriptive [`ScrapeError`].
pub trait SourceExtractor {
    /// The typed subset of record fields this extractor is responsible for.
    type Partial;

    /// Short source name used in errors and logs.
    fn source(&self) -> &'static str;

    /// Fetch and parse one snapshot of the source.
    async fn extract(&self, client: &Client) -> Result<Self::Partial, ScrapeError>;
}

/// Deadline decorator for any [`SourceExtractor`].
///
/// External sources are uncontrolled third parties; a source that stops
/// answering becomes an extractor failure instead of a hung cycle.
#[derive(Debug)]
pub struct Timed<T> {
    inner: T,
    deadline: Duration,
}

impl<T> Timed<T> {
    pub fn new(inner: T, deadline: Duration) -> Self {
        Self { inner, deadline }
    }
}

impl<T> SourceExtractor for Timed<T>
where
    T: SourceExtractor,
{
    type Partial = T::Partial;

    fn source(&self) -> &'static str {
        self.inner.source()
    }

    async fn extract(&self, client: &Client) -> Result<Self::Partial, ScrapeError> {
        match tokio::time::timeout(self.deadline, self.inner.extract(client)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(source = self.source(), deadline = ?self.deadline, "extractor timed out");
                Err(ScrapeError::Timeout {
                    scraper: self.source(),
                    deadline: self.deadline,
                })
            }
        }
    }
}

/// Parse a figure that may carry thousands separators, e.g. `"151,372"`.
///
/// Strips commas only. Anything that still does not parse is a
/// [`ScrapeError::Parse`] carrying the offending text, never a zero.
pub(crate) fn parse_count(source: &'static str, raw: &str) -> Result<u64, ScrapeError> {
    let trimmed = raw.trim();
    trimmed
        .replace(',', "")
        .parse::<u64>()
        .map_err(|_| ScrapeError::Parse {
            scraper: source,
            value: trimmed.to_string(),
        })
}

/// GET `url` and return the body, failing on transport errors and non-2xx
/// statuses alike.
pub(crate) async fn fetch_text(
    client: &Client,
    source: &'static str,
    url: &url::Url,
) -> Result<String, ScrapeError> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|err| ScrapeError::Fetch { scraper: source, err })?;

    let status = response.status();
    if !status.is_success() {
        return Err(ScrapeError::Status { scraper: source, status });
    }

    response
        .text()
        .await
        .map_err(|err| ScrapeError::Fetch { scraper: source, err })
}
