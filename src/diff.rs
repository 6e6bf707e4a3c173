//! Change detection between a candidate record and the latest stored one.
//!
//! Sources update on their own schedules, so most scrape cycles see the same
//! numbers as the previous cycle. Persisting only on change keeps the series
//! append-only and free of duplicate same-value entries. Comparison is exact
//! per-field equality over tracked fields; there is no tolerance, any drift
//! is a persist-worthy change.

use crate::models::CovidRecord;

/// The two-outcome decision for one scrape cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Persist,
    Skip,
}

/// List the tracked fields on which `candidate` differs from `previous`.
///
/// Tracked fields are everything except `date` and `flags`. The field names
/// returned here end up in log lines, so they match the struct fields.
pub fn changed_fields(candidate: &CovidRecord, previous: &CovidRecord) -> Vec<&'static str> {
    let mut changed = Vec::new();

    macro_rules! track {
        ($field:ident) => {
            if candidate.$field != previous.$field {
                changed.push(stringify!($field));
            }
        };
    }

    track!(total_tested);
    track!(total_positive);
    track!(undergrad_tested);
    track!(undergrad_positive);
    track!(isolation);
    track!(recovered);
    track!(peer_positives);
    track!(county_positives);
    track!(state_positive);

    changed
}

/// Decide whether `candidate` warrants a new stored record.
///
/// An empty store always persists; otherwise persist exactly when at least
/// one tracked field differs from the latest stored record.
pub fn decide(candidate: &CovidRecord, latest: Option<&CovidRecord>) -> Decision {
    let Some(previous) = latest else {
        return Decision::Persist;
    };

    if changed_fields(candidate, previous).is_empty() {
        Decision::Skip
    } else {
        Decision::Persist
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::sample_record;
    use chrono::{Duration, Utc};

    #[test]
    fn test_empty_store_always_persists() {
        let candidate = sample_record(Utc::now());
        assert_eq!(decide(&candidate, None), Decision::Persist);
    }

    #[test]
    fn test_identical_tracked_fields_skip() {
        let previous = sample_record(Utc::now() - Duration::hours(1));
        let mut candidate = previous.clone();
        // Timestamp and flags are not tracked.
        candidate.date = Utc::now();
        candidate.flags = vec!["manual note".to_string()];

        assert_eq!(decide(&candidate, Some(&previous)), Decision::Skip);
    }

    #[test]
    fn test_each_single_field_change_persists() {
        let previous = sample_record(Utc::now());

        let mutations: Vec<(&str, Box<dyn Fn(&mut CovidRecord)>)> = vec![
            ("total_tested", Box::new(|r| r.total_tested += 1)),
            ("total_positive", Box::new(|r| r.total_positive += 1)),
            ("undergrad_tested", Box::new(|r| r.undergrad_tested += 1)),
            ("undergrad_positive", Box::new(|r| r.undergrad_positive += 1)),
            ("isolation", Box::new(|r| r.isolation += 1)),
            ("recovered", Box::new(|r| r.recovered += 1)),
            (
                "peer_positives",
                Box::new(|r| {
                    r.peer_positives.insert("BU".to_string(), 11);
                }),
            ),
            (
                "county_positives",
                Box::new(|r| {
                    r.county_positives.insert("Suffolk".to_string(), 51);
                }),
            ),
            ("state_positive", Box::new(|r| r.state_positive += 1)),
        ];

        for (name, mutate) in mutations {
            let mut candidate = previous.clone();
            mutate(&mut candidate);
            assert_eq!(
                decide(&candidate, Some(&previous)),
                Decision::Persist,
                "change in {name} should persist"
            );
            assert_eq!(changed_fields(&candidate, &previous), vec![name]);
        }
    }

    #[test]
    fn test_regressed_value_still_counts_as_change() {
        // Source data can regress; a lower value is still new information.
        let previous = sample_record(Utc::now());
        let mut candidate = previous.clone();
        candidate.total_positive -= 1;

        assert_eq!(decide(&candidate, Some(&previous)), Decision::Persist);
    }
}
