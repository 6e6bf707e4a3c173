//! Peer institution extractor for the BU PowerBI dashboard.
//!
//! BU publishes its testing dashboard as an embedded PowerBI report. The
//! report's public query endpoint accepts the same semantic query the embed
//! issues, so the extractor posts a fixed query for the cumulative positive
//! measure and digs the single numeric leaf out of PowerBI's deeply nested
//! response envelope.
//!
//! The payload constants (dataset, report, model ids and the resource key)
//! come from the public embed URL and are contract constants: if BU rotates
//! the report, every one of them changes together.

use crate::error::ScrapeError;
use crate::models::PeerBiCount;
use crate::scrapers::json_path::{Step, walk};
use crate::scrapers::SourceExtractor;
use once_cell::sync::Lazy;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::{info, instrument};
use url::Url;

pub const SOURCE: &str = "bu";

const INSTITUTION: &str = "BU";

/// Public query endpoint for embedded PowerBI reports.
pub const QUERY_URL: &str =
    "https://wabi-us-north-central-api.analysis.windows.net/public/reports/querydata?synchronous=true";

const RESOURCE_KEY: &str = "32890e38-8890-48a0-8e02-4bb47c05988d";
const DATASET_ID: &str = "05640cb4-075c-4bec-87d1-2b0b7df65918";
const REPORT_ID: &str = "0f711970-f662-4b15-9c08-1d4090b80ec9";
const MODEL_ID: u64 = 11_982_553;

/// Route from the response root to the one numeric leaf we want.
const RESULT_PATH: [Step; 12] = [
    Step::Key("results"),
    Step::Index(0),
    Step::Key("result"),
    Step::Key("data"),
    Step::Key("dsr"),
    Step::Key("DS"),
    Step::Index(0),
    Step::Key("PH"),
    Step::Index(0),
    Step::Key("DM0"),
    Step::Index(0),
    Step::Key("M0"),
];

/// The fixed semantic query for the "Cumulative Positives" measure.
static QUERY_PAYLOAD: Lazy<Value> = Lazy::new(|| {
    let command = json!({
        "Query": {
            "Version": 2,
            "From": [{ "Name": "c", "Entity": "Cumulative Testing Combined", "Type": 0 }],
            "Select": [{
                "Measure": {
                    "Expression": { "SourceRef": { "Source": "c" } },
                    "Property": "Cumulative Positives",
                },
                "Name": "Cumulative Testing Combined.Cumulative Positives",
            }],
            "OrderBy": [{
                "Direction": 2,
                "Expression": {
                    "Measure": {
                        "Expression": { "SourceRef": { "Source": "c" } },
                        "Property": "Cumulative Results",
                    },
                },
            }],
        },
        "Binding": {
            "Primary": { "Groupings": [{ "Projections": [0] }] },
            "DataReduction": { "DataVolume": 3, "Primary": { "Window": {} } },
            "Version": 1,
        },
    });

    json!({
        "version": "1.0.0",
        "queries": [{
            "Query": { "Commands": [{ "SemanticQueryDataShapeCommand": command }] },
            "QueryId": "",
            "ApplicationContext": {
                "DatasetId": DATASET_ID,
                "Sources": [{ "ReportId": REPORT_ID }],
            },
        }],
        "cancelQueries": [],
        "modelId": MODEL_ID,
    })
});

/// Extractor for BU's PowerBI query endpoint.
#[derive(Debug)]
pub struct PeerBiQuery {
    url: Url,
}

impl PeerBiQuery {
    pub fn new(url: Url) -> Self {
        Self { url }
    }
}

impl SourceExtractor for PeerBiQuery {
    type Partial = PeerBiCount;

    fn source(&self) -> &'static str {
        SOURCE
    }

    #[instrument(level = "info", skip_all, fields(source = SOURCE))]
    async fn extract(&self, client: &Client) -> Result<PeerBiCount, ScrapeError> {
        let response = client
            .post(self.url.clone())
            .json(&*QUERY_PAYLOAD)
            .header("X-PowerBI-ResourceKey", RESOURCE_KEY)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| ScrapeError::Fetch { scraper: SOURCE, err })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status { scraper: SOURCE, status });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|err| ScrapeError::Fetch { scraper: SOURCE, err })?;

        let positive = parse_response(&body)?;
        info!(institution = INSTITUTION, positive, "BI query scraped");
        Ok(PeerBiCount {
            institution: INSTITUTION,
            positive,
        })
    }
}

/// Walk the fixed result path and read the numeric leaf.
pub fn parse_response(body: &Value) -> Result<u64, ScrapeError> {
    let leaf = walk(body, &RESULT_PATH).map_err(|segment| ScrapeError::shape(SOURCE, segment))?;

    leaf.as_u64().ok_or_else(|| ScrapeError::Parse {
        scraper: SOURCE,
        value: leaf.to_string(),
    })
}
