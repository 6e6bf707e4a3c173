//! Error taxonomy for the scrape pipeline and the record store.
//!
//! Every extractor failure carries the name of the source that produced it,
//! and shape mismatches always name the expectation that stopped holding.
//! Third parties change their pages and schemas without notice; the error
//! text is what an operator reads to find out which hard-coded assumption
//! needs updating.

use std::time::Duration;
use thiserror::Error;

/// Anything that can abort a scrape cycle.
///
/// All four extractors share this type. A single failing extractor fails the
/// whole cycle; no partial record is ever persisted.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Network or transport failure while talking to a source.
    #[error("{scraper}: request failed: {err}")]
    Fetch {
        scraper: &'static str,
        #[source]
        err: reqwest::Error,
    },

    /// The source answered with a non-success HTTP status.
    #[error("{scraper}: request failed with status {status}")]
    Status {
        scraper: &'static str,
        status: reqwest::StatusCode,
    },

    /// The source's structure no longer matches the hard-coded expectation
    /// (label text, field count, JSON path, column layout).
    #[error("{scraper}: shape mismatch: {expectation}")]
    ShapeMismatch {
        scraper: &'static str,
        expectation: String,
    },

    /// A field that should have been numeric was not, after separator
    /// stripping. A parse failure is a failure, never a zero.
    #[error("{scraper}: expected a numeric value, got {value:?}")]
    Parse {
        scraper: &'static str,
        value: String,
    },

    /// The extractor did not settle within its deadline.
    #[error("{scraper}: no response within {}s", deadline.as_secs())]
    Timeout {
        scraper: &'static str,
        deadline: Duration,
    },

    /// The persistence gateway could not complete an insert or read.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ScrapeError {
    /// Build a shape mismatch for `scraper` from anything displayable.
    pub fn shape(scraper: &'static str, expectation: impl Into<String>) -> Self {
        ScrapeError::ShapeMismatch {
            scraper,
            expectation: expectation.into(),
        }
    }
}

/// Failures inside the record store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Db(#[from] sled::Error),

    #[error("record encoding failed: {0}")]
    Encode(#[from] bincode::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch_names_the_expectation() {
        let err = ScrapeError::shape("bc", "did not find the statistics grid");
        assert_eq!(
            err.to_string(),
            "bc: shape mismatch: did not find the statistics grid"
        );
    }

    #[test]
    fn test_parse_error_quotes_the_offending_value() {
        let err = ScrapeError::Parse {
            scraper: "mass",
            value: "n/a".to_string(),
        };
        assert!(err.to_string().contains("\"n/a\""));
    }

    #[test]
    fn test_timeout_reports_seconds() {
        let err = ScrapeError::Timeout {
            scraper: "bu",
            deadline: Duration::from_secs(30),
        };
        assert_eq!(err.to_string(), "bu: no response within 30s");
    }
}
