//! County-level extractor for the USAFacts confirmed-cases CSV.
//!
//! USAFacts publishes one nation-wide CSV with a row per county and a column
//! per day, appending a new column daily. Today's figure is therefore always
//! the last column, and the Massachusetts counties occupy a fixed block of
//! rows partway down the file. The extractor skips the preamble rows, reads
//! just that block, sums the date column into a state-wide total and keeps
//! the Suffolk County row (where the university sits) as its own datum.

use crate::error::ScrapeError;
use crate::models::CountyCounts;
use crate::scrapers::{SourceExtractor, fetch_text, parse_count};
use reqwest::Client;
use std::io;
use tracing::{debug, info, instrument};
use url::Url;

pub const SOURCE: &str = "mass";

/// Nation-wide confirmed cases, one row per county, one column per day.
pub const CSV_URL: &str =
    "https://usafactsstatic.blob.core.windows.net/public/data/covid-19/covid_confirmed_usafacts.csv";

/// FIPS code for Suffolk County, MA.
const SUFFOLK_FIPS: &str = "25025";

/// Data rows before the Massachusetts block.
const SKIP_ROWS: usize = 1239;

/// Massachusetts has 14 counties; one spare row absorbs an upstream
/// off-by-one without reading the whole country.
const MAX_ROWS: usize = 15;

const FIPS_HEADER: &str = "countyFIPS";

/// Extractor for the county cases CSV.
#[derive(Debug)]
pub struct CountyCsv {
    url: Url,
}

impl CountyCsv {
    pub fn new(url: Url) -> Self {
        Self { url }
    }
}

impl SourceExtractor for CountyCsv {
    type Partial = CountyCounts;

    fn source(&self) -> &'static str {
        SOURCE
    }

    #[instrument(level = "info", skip_all, fields(source = SOURCE))]
    async fn extract(&self, client: &Client) -> Result<CountyCounts, ScrapeError> {
        let body = fetch_text(client, SOURCE, &self.url).await?;
        let counts = parse_counties(body.as_bytes())?;
        info!(
            suffolk_positive = counts.suffolk_positive,
            state_positive = counts.state_positive,
            "county CSV scraped"
        );
        Ok(counts)
    }
}

/// Aggregate the Massachusetts block of the CSV.
///
/// Reads at most [`MAX_ROWS`] data rows after skipping [`SKIP_ROWS`]. Every
/// read row must have a numeric value in the date column; a single bad cell
/// aborts the whole read. The designated county row must appear within the
/// window.
pub fn parse_counties(reader: impl io::Read) -> Result<CountyCounts, ScrapeError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|err| ScrapeError::shape(SOURCE, format!("unreadable header row: {err}")))?
        .clone();

    let fips_column = headers
        .iter()
        .position(|name| name == FIPS_HEADER)
        .ok_or_else(|| {
            ScrapeError::shape(SOURCE, format!("header column '{FIPS_HEADER}' not found"))
        })?;

    // The source appends a column per day, so today is always last.
    if headers.len() < 5 {
        return Err(ScrapeError::shape(
            SOURCE,
            format!("expected at least 5 header columns, found {}", headers.len()),
        ));
    }
    let date_column = headers.len() - 1;
    debug!(date = headers.get(date_column), "using last CSV column");

    let mut suffolk_positive = None;
    let mut state_positive = 0u64;
    let mut rows_read = 0usize;

    for (index, row) in csv_reader.records().enumerate() {
        if index < SKIP_ROWS {
            continue;
        }
        if index >= SKIP_ROWS + MAX_ROWS {
            break;
        }

        let row = row.map_err(|err| {
            ScrapeError::shape(SOURCE, format!("unreadable CSV row {index}: {err}"))
        })?;
        let cell = row.get(date_column).ok_or_else(|| {
            ScrapeError::shape(SOURCE, format!("row {index} shorter than the header row"))
        })?;

        let cases = parse_count(SOURCE, cell)?;
        if row.get(fips_column) == Some(SUFFOLK_FIPS) {
            suffolk_positive = Some(cases);
        }
        state_positive += cases;
        rows_read += 1;
    }

    debug!(rows_read, "county rows aggregated");

    let suffolk_positive = suffolk_positive.ok_or_else(|| {
        ScrapeError::shape(
            SOURCE,
            format!("county FIPS {SUFFOLK_FIPS} not found within the read window"),
        )
    })?;

    Ok(CountyCounts {
        suffolk_positive,
        state_positive,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a CSV whose Massachusetts block starts right after the skipped
    /// preamble. `block` rows are (fips, county, value-in-last-column).
    fn csv_with_block(block: &[(&str, &str, &str)]) -> String {
        let mut out = String::from("countyFIPS,County Name,State,StateFIPS,1/22/20,1/23/20\n");
        // Preamble rows the extractor must skip without validating.
        for i in 0..SKIP_ROWS {
            out.push_str(&format!("{i},Elsewhere County,XX,00,9,not-a-number\n"));
        }
        for (fips, county, value) in block {
            out.push_str(&format!("{fips},{county},MA,25,1,{value}\n"));
        }
        out
    }

    #[test]
    fn test_sums_block_and_captures_designated_county() {
        let csv = csv_with_block(&[
            ("25021", "Norfolk County", "100"),
            ("25025", "Suffolk County", "50"),
            ("25027", "Worcester County", "75"),
        ]);

        let counts = parse_counties(csv.as_bytes()).unwrap();
        assert_eq!(counts.state_positive, 225);
        assert_eq!(counts.suffolk_positive, 50);
    }

    #[test]
    fn test_skipped_preamble_rows_are_not_validated() {
        // The preamble carries a non-numeric cell in the date column; it must
        // not abort the read because it is outside the window.
        let csv = csv_with_block(&[("25025", "Suffolk County", "7")]);
        let counts = parse_counties(csv.as_bytes()).unwrap();
        assert_eq!(counts.suffolk_positive, 7);
        assert_eq!(counts.state_positive, 7);
    }

    #[test]
    fn test_uses_last_column_even_with_commas() {
        let csv = csv_with_block(&[("25025", "Suffolk County", "\"1,234\"")]);
        let counts = parse_counties(csv.as_bytes()).unwrap();
        assert_eq!(counts.suffolk_positive, 1234);
    }

    #[test]
    fn test_non_numeric_cell_in_window_aborts() {
        let csv = csv_with_block(&[
            ("25021", "Norfolk County", "100"),
            ("25025", "Suffolk County", "pending"),
        ]);

        match parse_counties(csv.as_bytes()).unwrap_err() {
            ScrapeError::Parse { value, .. } => assert_eq!(value, "pending"),
            other => panic!("expected Parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_designated_county_is_a_shape_mismatch() {
        let csv = csv_with_block(&[("25021", "Norfolk County", "100")]);
        let msg = parse_counties(csv.as_bytes()).unwrap_err().to_string();
        assert!(msg.contains(SUFFOLK_FIPS), "got: {msg}");
    }

    #[test]
    fn test_missing_fips_header_is_a_shape_mismatch() {
        let csv = "fips,County Name,State,StateFIPS,1/22/20\n25025,Suffolk,MA,25,1\n";
        let msg = parse_counties(csv.as_bytes()).unwrap_err().to_string();
        assert!(msg.contains(FIPS_HEADER), "got: {msg}");
    }

    #[test]
    fn test_window_is_bounded() {
        // A row one past the window must be ignored entirely, even if bad.
        let mut csv = csv_with_block(&[
            ("25025", "Suffolk County", "50"),
            ("25021", "Norfolk County", "25"),
        ]);
        for _ in 0..(MAX_ROWS - 2) {
            csv.push_str("25099,Filler County,MA,25,1,0\n");
        }
        csv.push_str("36001,Albany County,NY,36,1,not-a-number\n");

        let counts = parse_counties(csv.as_bytes()).unwrap();
        assert_eq!(counts.state_positive, 75);
    }
}
