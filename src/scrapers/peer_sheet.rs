//! Peer institution extractor for the NEU testing dashboard.
//!
//! NEU's dashboard is backed by a public Google spreadsheet whose cell feed
//! is available as JSON. The feed is a flat list of cells in row-major
//! order, so "the cumulative positive cell" is simply a fixed offset from
//! the end of the entry list. Fragile, but that is the contract the sheet
//! layout gives us; any layout change shows up as a shape or parse failure.

use crate::error::ScrapeError;
use crate::models::PeerSheetCount;
use crate::scrapers::json_path::{Step, walk};
use crate::scrapers::{SourceExtractor, fetch_text, parse_count};
use reqwest::Client;
use serde_json::Value;
use tracing::{info, instrument};
use url::Url;

pub const SOURCE: &str = "neu";

const INSTITUTION: &str = "NEU";

/// Public cell feed of the dashboard spreadsheet.
pub const FEED_URL: &str = "https://spreadsheets.google.com/feeds/cells/1C8PDCqHB9DbUYbvrEMN2ZKyeDGAMAxdcNkmO2QSZJsE/1/public/full?alt=json";

/// The cumulative positive count sits five cells before the end of the feed,
/// a consequence of the sheet's fixed column layout.
const CELL_PATH: [Step; 5] = [
    Step::Key("feed"),
    Step::Key("entry"),
    Step::FromEnd(5),
    Step::Key("content"),
    Step::Key("$t"),
];

/// Extractor for NEU's spreadsheet cell feed.
#[derive(Debug)]
pub struct PeerSheetFeed {
    url: Url,
}

impl PeerSheetFeed {
    pub fn new(url: Url) -> Self {
        Self { url }
    }
}

impl SourceExtractor for PeerSheetFeed {
    type Partial = PeerSheetCount;

    fn source(&self) -> &'static str {
        SOURCE
    }

    #[instrument(level = "info", skip_all, fields(source = SOURCE))]
    async fn extract(&self, client: &Client) -> Result<PeerSheetCount, ScrapeError> {
        let body = fetch_text(client, SOURCE, &self.url).await?;
        let feed: Value = serde_json::from_str(&body).map_err(|err| {
            ScrapeError::shape(SOURCE, format!("feed is not valid JSON: {err}"))
        })?;

        let positive = parse_feed(&feed)?;
        info!(institution = INSTITUTION, positive, "sheet feed scraped");
        Ok(PeerSheetCount {
            institution: INSTITUTION,
            positive,
        })
    }
}

/// Pull the cumulative positive count out of the cell feed.
pub fn parse_feed(feed: &Value) -> Result<u64, ScrapeError> {
    let cell = walk(feed, &CELL_PATH).map_err(|segment| ScrapeError::shape(SOURCE, segment))?;

    let text = cell.as_str().ok_or_else(|| ScrapeError::shape(
        SOURCE,
        format!("cell content is not a string: {cell}"),
    ))?;

    parse_count(SOURCE, text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feed_with_cells(cells: &[&str]) -> Value {
        let entries: Vec<Value> = cells
            .iter()
            .map(|text| json!({ "content": { "$t": text } }))
            .collect();
        json!({ "feed": { "entry": entries } })
    }

    #[test]
    fn test_reads_fifth_cell_from_the_end() {
        let feed = feed_with_cells(&["a", "b", "1,498", "c", "d", "e", "f"]);
        assert_eq!(parse_feed(&feed).unwrap(), 1498);
    }

    #[test]
    fn test_short_feed_is_a_shape_mismatch() {
        let feed = feed_with_cells(&["only", "four", "cells", "here"]);
        let msg = parse_feed(&feed).unwrap_err().to_string();
        assert!(msg.contains("[len-5]"), "got: {msg}");
    }

    #[test]
    fn test_missing_entry_list_is_named() {
        let feed = json!({ "feed": {} });
        let msg = parse_feed(&feed).unwrap_err().to_string();
        assert!(msg.contains("'entry'"), "got: {msg}");
    }

    #[test]
    fn test_non_numeric_cell_is_a_parse_error() {
        let feed = feed_with_cells(&["a", "b", "TBD", "c", "d", "e", "f"]);
        match parse_feed(&feed).unwrap_err() {
            ScrapeError::Parse { value, .. } => assert_eq!(value, "TBD"),
            other => panic!("expected Parse error, got {other:?}"),
        }
    }
}
