//! Command-line interface definitions.
//!
//! All options can also come from the environment, which is how the
//! deployment passes secrets like the webhook URL.

use clap::Parser;
use url::Url;

/// Command-line arguments for the bccovid daemon.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the YAML config file
    #[arg(short, long, env = "BCCOVID_CONFIG")]
    pub config: Option<String>,

    /// Override the record database directory
    #[arg(long, env = "BCCOVID_DB_PATH")]
    pub db_path: Option<String>,

    /// Override the API listen address
    #[arg(long, env = "BCCOVID_LISTEN_ADDR")]
    pub listen_addr: Option<String>,

    /// Webhook URL for failure notifications
    #[arg(long, env = "BCCOVID_WEBHOOK_URL")]
    pub webhook_url: Option<Url>,

    /// Run exactly one scrape cycle and exit instead of serving
    #[arg(long)]
    pub once: bool,
}
