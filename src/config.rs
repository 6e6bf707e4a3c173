//! Runtime configuration, loaded from an optional YAML file.
//!
//! Every field has a sensible default, so the binary runs with no config at
//! all. Cadence is configuration, not logic: the upstream dashboard moved
//! from daily updates to publishing only on Tuesday, Thursday and Saturday,
//! and that change is a one-line `weekdays` edit here, not a code change.
//!
//! ```yaml
//! listen_addr: 0.0.0.0:5000
//! db_path: ./data/records
//! webhook_url: https://hooks.example.com/T000/B000/XXXX
//! scrape:
//!   interval_minutes: 60
//!   weekdays: [tue, thu, sat]
//!   timeout_secs: 30
//! ```

use crate::scrapers::{campus, county_csv, peer_bi, peer_sheet};
use anyhow::{Context, Result};
use chrono::Weekday;
use serde::Deserialize;
use std::path::Path;
use tracing::info;
use url::Url;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Address the read API listens on.
    pub listen_addr: String,
    /// Directory of the embedded record database.
    pub db_path: String,
    /// Optional webhook for failure notifications.
    pub webhook_url: Option<Url>,
    pub scrape: ScrapeConfig,
    pub sources: SourcesConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listen_addr: "0.0.0.0:5000".to_string(),
            db_path: "./data/records".to_string(),
            webhook_url: None,
            scrape: ScrapeConfig::default(),
            sources: SourcesConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScrapeConfig {
    /// Minutes between scrape cycles.
    pub interval_minutes: u64,
    /// If set, only run cycles on these weekdays (e.g. `[tue, thu, sat]`).
    pub weekdays: Option<Vec<String>>,
    /// Per-extractor deadline in seconds.
    pub timeout_secs: u64,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        ScrapeConfig {
            interval_minutes: 60,
            weekdays: None,
            timeout_secs: 30,
        }
    }
}

impl ScrapeConfig {
    /// Parse the configured weekday names, rejecting anything chrono does
    /// not recognize.
    pub fn weekday_filter(&self) -> Result<Option<Vec<Weekday>>> {
        let Some(names) = &self.weekdays else {
            return Ok(None);
        };

        let mut days = Vec::with_capacity(names.len());
        for name in names {
            let day: Weekday = name
                .parse()
                .ok()
                .with_context(|| format!("invalid weekday in config: {name:?}"))?;
            days.push(day);
        }
        Ok(Some(days))
    }
}

/// Endpoints of the four external sources. Overridable mainly so local
/// testing can point at fixtures; production uses the defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourcesConfig {
    pub dashboard_url: Url,
    pub bi_query_url: Url,
    pub sheet_feed_url: Url,
    pub county_csv_url: Url,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        SourcesConfig {
            dashboard_url: Url::parse(campus::DASHBOARD_URL).unwrap(),
            bi_query_url: Url::parse(peer_bi::QUERY_URL).unwrap(),
            sheet_feed_url: Url::parse(peer_sheet::FEED_URL).unwrap(),
            county_csv_url: Url::parse(county_csv::CSV_URL).unwrap(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, or the defaults when no path is given.
    pub fn load(path: Option<&str>) -> Result<Config> {
        let Some(path) = path else {
            info!("no config file given; using defaults");
            return Ok(Config::default());
        };

        let raw = std::fs::read_to_string(Path::new(path))
            .with_context(|| format!("failed to read config file {path}"))?;
        let config: Config = serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {path}"))?;
        info!(path, "configuration loaded");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_point_at_the_real_endpoints() {
        let config = Config::default();
        assert_eq!(config.listen_addr, "0.0.0.0:5000");
        assert_eq!(config.scrape.interval_minutes, 60);
        assert!(config.scrape.weekdays.is_none());
        assert!(
            config
                .sources
                .dashboard_url
                .as_str()
                .contains("reopening-boston-college")
        );
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let config: Config = serde_yaml::from_str(
            "scrape:\n  interval_minutes: 30\n  weekdays: [tue, thu, sat]\n",
        )
        .unwrap();
        assert_eq!(config.scrape.interval_minutes, 30);
        assert_eq!(config.scrape.timeout_secs, 30);
        assert_eq!(config.listen_addr, "0.0.0.0:5000");
    }

    #[test]
    fn test_weekday_filter_parses_short_names() {
        let config = ScrapeConfig {
            weekdays: Some(vec!["tue".into(), "thu".into(), "sat".into()]),
            ..ScrapeConfig::default()
        };
        let days = config.weekday_filter().unwrap().unwrap();
        assert_eq!(days, vec![Weekday::Tue, Weekday::Thu, Weekday::Sat]);
    }

    #[test]
    fn test_weekday_filter_rejects_unknown_names() {
        let config = ScrapeConfig {
            weekdays: Some(vec!["someday".into()]),
            ..ScrapeConfig::default()
        };
        let err = config.weekday_filter().unwrap_err();
        assert!(err.to_string().contains("someday"));
    }

    #[test]
    fn test_unknown_top_level_key_is_rejected() {
        let result: Result<Config, _> = serde_yaml::from_str("listen_adress: 1.2.3.4:80\n");
        assert!(result.is_err());
    }
}
