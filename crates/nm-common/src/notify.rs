use serde::Serialize;
use tracing::{debug, warn};

/// Outbound notifications the workflow produces. Delivery is
/// fire-and-forget: a failed send is logged and never propagated, so a
/// flaky email provider cannot fail a shortlist or a proceed decision.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    ShortlistReady {
        host_email: String,
        shortlist_id: String,
        review_links: Vec<String>,
    },
    MatchProceeded {
        match_id: String,
        host_email: Option<String>,
        nanny_email: Option<String>,
    },
    InterviewRequested {
        interview_request_id: String,
        nanny_email: Option<String>,
        slot_link: String,
    },
    SlotSelected {
        interview_request_id: String,
        host_email: Option<String>,
        selected_slot_index: usize,
    },
}

pub struct Notifier {
    http: reqwest::Client,
    endpoint: Option<String>,
    api_key: Option<String>,
}

impl Notifier {
    pub fn new(endpoint: Option<String>, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
            api_key,
        }
    }

    /// Log-only notifier for environments without a delivery endpoint.
    pub fn disabled() -> Self {
        Self::new(None, None)
    }

    /// Deliver a notification, swallowing all failures.
    pub async fn dispatch(&self, notification: Notification) {
        let Some(endpoint) = self.endpoint.as_deref() else {
            debug!(?notification, "notification endpoint not configured; skipping delivery");
            return;
        };

        let mut request = self.http.post(endpoint).json(&notification);
        if let Some(key) = self.api_key.as_deref() {
            request = request.bearer_auth(key);
        }

        match request.send().await {
            Ok(response) if response.status().is_success() => {
                debug!(?notification, "notification delivered");
            }
            Ok(response) => {
                warn!(
                    status = response.status().as_u16(),
                    ?notification,
                    "notification delivery rejected"
                );
            }
            Err(err) => {
                warn!(error = %err, ?notification, "notification delivery failed");
            }
        }
    }
}
