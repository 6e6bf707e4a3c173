//! Best-effort failure notifications for operator visibility.
//!
//! Scrape failures are delivered to a configured webhook as a small JSON
//! payload. Delivery is strictly best effort: a notifier problem is logged
//! and swallowed, never surfaced to the pipeline, since losing a
//! notification must not make a failing cycle worse. With no webhook
//! configured the notifier is a no-op and says so once at startup.

use reqwest::Client;
use serde_json::json;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Webhook-backed notification sink.
#[derive(Debug, Clone)]
pub struct Notifier {
    client: Client,
    webhook: Option<Url>,
}

impl Notifier {
    pub fn new(client: Client, webhook: Option<Url>) -> Self {
        match &webhook {
            Some(url) => info!(webhook = %url, "failure notifications enabled"),
            None => info!("no webhook configured; failure notifications disabled"),
        }
        Self { client, webhook }
    }

    /// Deliver `message` to the webhook, if one is configured.
    #[instrument(level = "info", skip_all)]
    pub async fn report(&self, message: &str) {
        let Some(url) = &self.webhook else {
            debug!("notification dropped, no webhook configured");
            return;
        };

        let payload = json!({ "text": message });
        match self.client.post(url.clone()).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                debug!("notification delivered");
            }
            Ok(response) => {
                warn!(status = %response.status(), "webhook rejected notification");
            }
            Err(err) => {
                warn!(error = %err, "failed to deliver notification");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_report_without_webhook_is_a_no_op() {
        let notifier = Notifier::new(Client::new(), None);
        // Must return without attempting any network activity.
        notifier.report("scrape failed").await;
    }
}
