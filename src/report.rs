//! Fire-and-forget usage reporting.
//!
//! Every report is a JSON POST carrying one incremented counter and zeros
//! for the rest; the endpoint accumulates them. Reporting never affects a
//! batch: failures are logged at `warn` and dropped, and no caller waits
//! on the HTTP round trip unless it explicitly awaits
//! [`UsageReporter::record_use`].

use crate::mode::ConversionMode;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Counter names understood by the log endpoint.
const COUNTER_FIELDS: [&str; 6] = [
    "total_visit",
    "use_pdftojpg",
    "use_pdftopng",
    "use_imgtopdf",
    "use_changeimg",
    "use_imgresizer",
];

/// Posts usage counters to a log endpoint.
///
/// One reporter corresponds to one session: the visit counter fires at
/// most once per reporter regardless of how many batches run through it.
pub struct UsageReporter {
    client: reqwest::Client,
    endpoint: String,
    visit_recorded: AtomicBool,
}

impl UsageReporter {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            endpoint: endpoint.into(),
            visit_recorded: AtomicBool::new(false),
        }
    }

    /// Record the session visit. Subsequent calls on the same reporter are
    /// no-ops.
    pub async fn record_visit(&self) {
        if self.visit_recorded.swap(true, Ordering::SeqCst) {
            return;
        }
        self.post("total_visit").await;
    }

    /// Record one completed use of `mode`.
    pub async fn record_use(&self, mode: ConversionMode) {
        self.post(mode.counter_field()).await;
    }

    /// Fire [`record_use`](Self::record_use) on a background task so the
    /// caller never waits on the log endpoint.
    pub fn spawn_use(self: &Arc<Self>, mode: ConversionMode) {
        let reporter = Arc::clone(self);
        tokio::spawn(async move {
            reporter.record_use(mode).await;
        });
    }

    /// Fire [`record_visit`](Self::record_visit) on a background task.
    pub fn spawn_visit(self: &Arc<Self>) {
        let reporter = Arc::clone(self);
        tokio::spawn(async move {
            reporter.record_visit().await;
        });
    }

    async fn post(&self, field: &str) {
        let mut payload = serde_json::Map::new();
        for name in COUNTER_FIELDS {
            payload.insert(name.to_string(), json!(u8::from(name == field)));
        }

        match self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => {
                debug!("Reported '{}' to {}", field, self.endpoint);
            }
            Ok(resp) => {
                warn!(
                    "Usage report '{}' rejected by {}: HTTP {}",
                    field,
                    self.endpoint,
                    resp.status()
                );
            }
            Err(e) => {
                warn!("Usage report '{}' failed: {}", field, e);
            }
        }
    }
}
