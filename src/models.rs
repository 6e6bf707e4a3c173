//! Data models for scraped COVID-19 statistics.
//!
//! Three representations exist on purpose:
//!
//! - [`CovidRecord`]: the canonical merged record, one per scrape cycle that
//!   produced new numbers. This is what the pipeline builds and compares.
//! - [`StoredRecord`]: the persisted envelope around a record, carrying the
//!   store-assigned id and a schema version marker. Internal only.
//! - [`PublicRecord`]: the JSON shape served by the read API. Internal
//!   markers never leak; the mapping from stored to public is explicit.
//!
//! The partial record types ([`CampusCounts`], [`PeerBiCount`],
//! [`PeerSheetCount`], [`CountyCounts`]) are what the individual extractors
//! produce. They carry disjoint field sets and only live for one cycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Version marker written into every stored record, bumped when the on-disk
/// layout changes.
pub const SCHEMA_VERSION: u32 = 1;

/// Counts published on the campus HTML dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampusCounts {
    /// Community-wide cumulative tests performed.
    pub total_tested: u64,
    /// Community-wide cumulative positives.
    pub total_positive: u64,
    /// Undergraduate cumulative tests performed.
    pub undergrad_tested: u64,
    /// Undergraduate cumulative positives.
    pub undergrad_positive: u64,
    /// Undergraduates currently in isolation. Point-in-time, not cumulative.
    pub isolation: u64,
    /// Undergraduates cumulatively recovered.
    pub recovered: u64,
}

/// One peer institution's cumulative positive count, from a BI query API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerBiCount {
    /// Peer institution identifier, e.g. "BU".
    pub institution: &'static str,
    pub positive: u64,
}

/// One peer institution's cumulative positive count, from a spreadsheet feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerSheetCount {
    /// Peer institution identifier, e.g. "NEU".
    pub institution: &'static str,
    pub positive: u64,
}

/// County-level cumulative positives from the state CSV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountyCounts {
    /// Cumulative positives for the designated county (Suffolk).
    pub suffolk_positive: u64,
    /// State-wide sum across all counties in the data file.
    pub state_positive: u64,
}

/// The canonical merged record for one scrape cycle.
///
/// Every field except `date` and `flags` is a tracked field: the change
/// detector compares tracked fields exactly, with no tolerance, to decide
/// whether a cycle's result is worth persisting. Once persisted a record is
/// never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CovidRecord {
    /// The point in time this record represents (scrape time).
    pub date: DateTime<Utc>,
    pub total_tested: u64,
    pub total_positive: u64,
    pub undergrad_tested: u64,
    pub undergrad_positive: u64,
    /// Students currently in isolation. The only non-cumulative count.
    pub isolation: u64,
    pub recovered: u64,
    /// Peer institution identifier -> cumulative positives.
    pub peer_positives: BTreeMap<String, u64>,
    /// County identifier -> cumulative positives.
    pub county_positives: BTreeMap<String, u64>,
    /// State-wide cumulative positives.
    pub state_positive: u64,
    /// Manual data-quality annotations. Always empty when scraped; operators
    /// may attach notes out of band.
    pub flags: Vec<String>,
}

impl CovidRecord {
    /// Merge the four partial records into one candidate stamped with `date`.
    ///
    /// The field sets are disjoint, so arrival order never matters.
    pub fn assemble(
        date: DateTime<Utc>,
        campus: CampusCounts,
        peer_bi: PeerBiCount,
        peer_sheet: PeerSheetCount,
        county: CountyCounts,
    ) -> Self {
        let mut peer_positives = BTreeMap::new();
        peer_positives.insert(peer_bi.institution.to_string(), peer_bi.positive);
        peer_positives.insert(peer_sheet.institution.to_string(), peer_sheet.positive);

        let mut county_positives = BTreeMap::new();
        county_positives.insert("Suffolk".to_string(), county.suffolk_positive);

        CovidRecord {
            date,
            total_tested: campus.total_tested,
            total_positive: campus.total_positive,
            undergrad_tested: campus.undergrad_tested,
            undergrad_positive: campus.undergrad_positive,
            isolation: campus.isolation,
            recovered: campus.recovered,
            peer_positives,
            county_positives,
            state_positive: county.state_positive,
            flags: Vec::new(),
        }
    }
}

/// A record as it sits in the store: the canonical record plus internal
/// bookkeeping that must never reach API consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Store-assigned identifier (the timestamp-derived key).
    pub id: u64,
    /// On-disk schema version, see [`SCHEMA_VERSION`].
    pub schema: u32,
    pub record: CovidRecord,
}

/// The public JSON shape served by the read API.
///
/// Field names are camelCase to match what the dashboard frontend consumes.
/// The internal key is renamed to `id` and the schema marker is dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicRecord {
    pub id: String,
    pub date: DateTime<Utc>,
    pub total_tested: u64,
    pub total_positive: u64,
    pub undergrad_tested: u64,
    pub undergrad_positive: u64,
    pub isolation: u64,
    pub recovered: u64,
    pub peer_positives: BTreeMap<String, u64>,
    pub county_positives: BTreeMap<String, u64>,
    pub state_positive: u64,
    pub flags: Vec<String>,
}

impl From<StoredRecord> for PublicRecord {
    fn from(stored: StoredRecord) -> Self {
        let StoredRecord { id, schema: _, record } = stored;
        PublicRecord {
            id: format!("{id:016x}"),
            date: record.date,
            total_tested: record.total_tested,
            total_positive: record.total_positive,
            undergrad_tested: record.undergrad_tested,
            undergrad_positive: record.undergrad_positive,
            isolation: record.isolation,
            recovered: record.recovered,
            peer_positives: record.peer_positives,
            county_positives: record.county_positives,
            state_positive: record.state_positive,
            flags: record.flags,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::sample_record;
    use super::*;

    #[test]
    fn test_assemble_merges_disjoint_fields() {
        let record = sample_record(Utc::now());
        assert_eq!(record.total_tested, 7000);
        assert_eq!(record.peer_positives.get("BU"), Some(&10));
        assert_eq!(record.peer_positives.get("NEU"), Some(&8));
        assert_eq!(record.county_positives.get("Suffolk"), Some(&50));
        assert_eq!(record.state_positive, 500);
        assert!(record.flags.is_empty());
    }

    #[test]
    fn test_public_record_renames_id_and_drops_schema() {
        let stored = StoredRecord {
            id: 0x1234,
            schema: SCHEMA_VERSION,
            record: sample_record(Utc::now()),
        };

        let public = PublicRecord::from(stored);
        assert_eq!(public.id, "0000000000001234");

        let json = serde_json::to_value(&public).unwrap();
        assert!(json.get("schema").is_none());
        assert!(json.get("id").is_some());
    }

    #[test]
    fn test_public_record_uses_camel_case() {
        let stored = StoredRecord {
            id: 1,
            schema: SCHEMA_VERSION,
            record: sample_record(Utc::now()),
        };

        let json = serde_json::to_value(PublicRecord::from(stored)).unwrap();
        assert!(json.get("totalTested").is_some());
        assert!(json.get("undergradPositive").is_some());
        assert!(json.get("statePositive").is_some());
        assert!(json.get("total_tested").is_none());
    }

    #[test]
    fn test_record_bincode_round_trip() {
        let record = sample_record(Utc::now());
        let bytes = bincode::serialize(&record).unwrap();
        let back: CovidRecord = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, record);
    }
}
