//! Campus HTML dashboard extractor.
//!
//! The university publishes its testing numbers as a grid of labeled figure
//! boxes on the reopening page. The markup carries no ids, so the extractor
//! pins the grid down by structural position and then asserts the label
//! texts still read exactly as expected. When the communications office
//! reshuffles the page, the error names every label that no longer matches
//! so the selectors can be fixed quickly.
//!
//! The isolation and recovered counts live in their own single-pair boxes
//! outside the main grid and are validated the same way.

use crate::error::ScrapeError;
use crate::models::CampusCounts;
use crate::scrapers::{SourceExtractor, fetch_text, parse_count};
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument};
use url::Url;

pub const SOURCE: &str = "bc";

/// The reopening dashboard page.
pub const DASHBOARD_URL: &str =
    "https://www.bc.edu/content/bc-web/sites/reopening-boston-college.html";

/// Labels of the main grid, in display order. The figure at each position is
/// only trusted if the label at the same position still matches.
const EXPECTED_LABELS: [&str; 4] = [
    "BC Community tests performed",
    "Total Positives",
    "Undergrads Tested",
    "Undergrads Testing Positive",
];

const EXPECTED_ISOLATION_LABEL: &str = "Undergrads Currently in Isolation";
const EXPECTED_RECOVERED_LABEL: &str = "Undergrads Recovered";

// Structural selectors for a page without stable ids.
static GRID: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(".fact-gray-new > div:nth-child(1) > div:nth-child(1) > div:nth-child(1)")
        .unwrap()
});
static ISOLATION_BOX: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".column1 > div:nth-child(2) > div:nth-child(1)").unwrap());
static RECOVERED_BOX: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".column1 > div:nth-child(3) > div:nth-child(1)").unwrap());
static FIGURE: Lazy<Selector> = Lazy::new(|| Selector::parse(".figure").unwrap());
static FACT: Lazy<Selector> = Lazy::new(|| Selector::parse(".fact").unwrap());

/// Extractor for the campus dashboard page.
#[derive(Debug)]
pub struct CampusDashboard {
    url: Url,
}

impl CampusDashboard {
    pub fn new(url: Url) -> Self {
        Self { url }
    }
}

impl SourceExtractor for CampusDashboard {
    type Partial = CampusCounts;

    fn source(&self) -> &'static str {
        SOURCE
    }

    #[instrument(level = "info", skip_all, fields(source = SOURCE))]
    async fn extract(&self, client: &Client) -> Result<CampusCounts, ScrapeError> {
        let html = fetch_text(client, SOURCE, &self.url).await?;
        let counts = parse_dashboard(&html)?;
        info!(
            total_tested = counts.total_tested,
            total_positive = counts.total_positive,
            isolation = counts.isolation,
            "campus dashboard scraped"
        );
        Ok(counts)
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Parse the dashboard markup into campus counts.
///
/// Fails on any of: grid not found, wrong number of label/figure pairs, any
/// label text drifting from [`EXPECTED_LABELS`], or a non-numeric figure.
pub fn parse_dashboard(html: &str) -> Result<CampusCounts, ScrapeError> {
    let document = Html::parse_document(html);

    let grids: Vec<_> = document.select(&GRID).collect();
    if grids.len() != 1 {
        return Err(ScrapeError::shape(
            SOURCE,
            format!("did not find the statistics grid (matched {})", grids.len()),
        ));
    }
    let grid = grids[0];

    let labels: Vec<String> = grid.select(&FACT).map(element_text).collect();
    let figures: Vec<String> = grid.select(&FIGURE).map(element_text).collect();

    if labels.len() != EXPECTED_LABELS.len() || figures.len() != EXPECTED_LABELS.len() {
        return Err(ScrapeError::shape(
            SOURCE,
            format!(
                "expected {} label/figure pairs in the grid, found {} labels and {} figures",
                EXPECTED_LABELS.len(),
                labels.len(),
                figures.len()
            ),
        ));
    }

    let failed: Vec<&str> = EXPECTED_LABELS
        .iter()
        .zip(&labels)
        .filter(|(expected, actual)| **expected != actual.as_str())
        .map(|(expected, _)| *expected)
        .collect();
    if !failed.is_empty() {
        return Err(ScrapeError::shape(
            SOURCE,
            format!(
                "labels have changed, fix the scraper; failed labels: {}",
                failed.join(", ")
            ),
        ));
    }

    let mut values = Vec::with_capacity(figures.len());
    for figure in &figures {
        values.push(parse_count(SOURCE, figure)?);
    }
    debug!(?values, "grid figures parsed");

    let isolation = labeled_box(&document, &ISOLATION_BOX, EXPECTED_ISOLATION_LABEL)?;
    let recovered = labeled_box(&document, &RECOVERED_BOX, EXPECTED_RECOVERED_LABEL)?;

    Ok(CampusCounts {
        total_tested: values[0],
        total_positive: values[1],
        undergrad_tested: values[2],
        undergrad_positive: values[3],
        isolation,
        recovered,
    })
}

/// Validate and parse a single-pair figure box outside the main grid.
fn labeled_box(
    document: &Html,
    selector: &Selector,
    expected_label: &'static str,
) -> Result<u64, ScrapeError> {
    let boxes: Vec<_> = document.select(selector).collect();
    if boxes.len() != 1 {
        return Err(ScrapeError::shape(
            SOURCE,
            format!(
                "did not find the '{expected_label}' box (matched {})",
                boxes.len()
            ),
        ));
    }

    let figures: Vec<_> = boxes[0].select(&FIGURE).collect();
    let labels: Vec<_> = boxes[0].select(&FACT).collect();
    if figures.len() != 1 || labels.len() != 1 {
        return Err(ScrapeError::shape(
            SOURCE,
            format!(
                "expected one label/figure pair in the '{expected_label}' box, \
                 found {} labels and {} figures",
                labels.len(),
                figures.len()
            ),
        ));
    }

    let label = element_text(labels[0]);
    if label != expected_label {
        return Err(ScrapeError::shape(
            SOURCE,
            format!("labels have changed, fix the scraper; failed labels: {expected_label}"),
        ));
    }

    parse_count(SOURCE, &element_text(figures[0]))
}
