use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A busy window on the concierge's calendar. Free windows are derived
/// by the caller; the calendar API only reports busy time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusyInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum CalendarError {
    #[error("calendar request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("calendar API returned {status}: {message}")]
    Api { status: u16, message: String },
}

/// Seam for the free/busy dependency so the overlap filter can be
/// exercised without a live calendar.
#[async_trait]
pub trait FreeBusyLookup: Send + Sync {
    async fn busy_intervals(
        &self,
        calendar_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<BusyInterval>, CalendarError>;
}

/// Free/busy client against the calendar provider's REST endpoint.
pub struct HttpFreeBusyClient {
    http: reqwest::Client,
    endpoint: String,
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct FreeBusyResponse {
    busy: Vec<FreeBusyWindow>,
}

#[derive(Debug, Deserialize)]
struct FreeBusyWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl HttpFreeBusyClient {
    pub fn new(endpoint: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            access_token: access_token.into(),
        }
    }
}

#[async_trait]
impl FreeBusyLookup for HttpFreeBusyClient {
    async fn busy_intervals(
        &self,
        calendar_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<BusyInterval>, CalendarError> {
        let body = serde_json::json!({
            "timeMin": from.to_rfc3339(),
            "timeMax": to.to_rfc3339(),
            "items": [{ "id": calendar_id }],
        });

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CalendarError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: FreeBusyResponse = response.json().await?;
        Ok(parsed
            .busy
            .into_iter()
            .map(|window| BusyInterval {
                start: window.start,
                end: window.end,
            })
            .collect())
    }
}
