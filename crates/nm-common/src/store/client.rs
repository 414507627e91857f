use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use super::fields::Fields;

pub const DEFAULT_API_URL: &str = "https://api.airtable.com/v0";

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub api_url: String,
    pub base_id: String,
    pub api_token: String,
}

impl StoreConfig {
    pub fn new(base_id: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            base_id: base_id.into(),
            api_token: api_token.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("profile store request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{table} record not found: {id}")]
    RecordNotFound { table: &'static str, id: String },
    #[error("profile store returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("malformed {table} record {id}: {reason}")]
    Malformed {
        table: &'static str,
        id: String,
        reason: String,
    },
}

/// One record from the tabular backend: opaque id plus loose fields.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreRecord {
    pub id: String,
    #[serde(default)]
    pub fields: Fields,
    #[serde(default, rename = "createdTime")]
    pub created_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct RecordPage {
    records: Vec<StoreRecord>,
    offset: Option<String>,
}

/// Thin client over the spreadsheet-backed REST store. No caching, no
/// retries: a failed call propagates to the request handler. The one
/// graceful-degradation path lives in the calendar-overlap filter, not
/// here.
pub struct ProfileStore {
    http: reqwest::Client,
    config: StoreConfig,
}

impl ProfileStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.api_url,
            self.config.base_id,
            urlencoding::encode(table)
        )
    }

    fn record_url(&self, table: &str, id: &str) -> String {
        format!("{}/{}", self.table_url(table), urlencoding::encode(id))
    }

    async fn check(
        response: reqwest::Response,
        table: &'static str,
        id: Option<&str>,
    ) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::RecordNotFound {
                table,
                id: id.unwrap_or("<query>").to_string(),
            });
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }

    #[instrument(skip(self))]
    pub async fn get_record(&self, table: &'static str, id: &str) -> Result<StoreRecord, StoreError> {
        let response = self
            .http
            .get(self.record_url(table, id))
            .bearer_auth(&self.config.api_token)
            .send()
            .await?;

        let response = Self::check(response, table, Some(id)).await?;
        Ok(response.json().await?)
    }

    /// List records, following pagination offsets until exhausted.
    #[instrument(skip(self))]
    pub async fn list_records(
        &self,
        table: &'static str,
        filter_by_formula: Option<&str>,
    ) -> Result<Vec<StoreRecord>, StoreError> {
        let mut records = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let mut query: Vec<(&str, String)> = vec![("pageSize", "100".into())];
            if let Some(formula) = filter_by_formula {
                query.push(("filterByFormula", formula.to_string()));
            }
            if let Some(cursor) = offset.as_deref() {
                query.push(("offset", cursor.to_string()));
            }

            let response = self
                .http
                .get(self.table_url(table))
                .bearer_auth(&self.config.api_token)
                .query(&query)
                .send()
                .await?;

            let response = Self::check(response, table, None).await?;
            let page: RecordPage = response.json().await?;
            records.extend(page.records);

            match page.offset {
                Some(cursor) => offset = Some(cursor),
                None => break,
            }
        }

        Ok(records)
    }

    #[instrument(skip(self, fields))]
    pub async fn create_record(
        &self,
        table: &'static str,
        fields: Value,
    ) -> Result<StoreRecord, StoreError> {
        let response = self
            .http
            .post(self.table_url(table))
            .bearer_auth(&self.config.api_token)
            .json(&serde_json::json!({ "fields": fields }))
            .send()
            .await?;

        let response = Self::check(response, table, None).await?;
        Ok(response.json().await?)
    }

    #[instrument(skip(self, fields))]
    pub async fn update_record(
        &self,
        table: &'static str,
        id: &str,
        fields: Value,
    ) -> Result<StoreRecord, StoreError> {
        let response = self
            .http
            .patch(self.record_url(table, id))
            .bearer_auth(&self.config.api_token)
            .json(&serde_json::json!({ "fields": fields }))
            .send()
            .await?;

        let response = Self::check(response, table, Some(id)).await?;
        Ok(response.json().await?)
    }
}

/// Escape a value for interpolation into a filterByFormula string.
pub fn formula_text(value: &str) -> String {
    format!("'{}'", value.replace('\'', "\\'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_encoded_urls() {
        let store = ProfileStore::new(StoreConfig::new("appBase1", "key"));
        assert_eq!(
            store.table_url("InterviewRequests"),
            "https://api.airtable.com/v0/appBase1/InterviewRequests"
        );
        assert_eq!(
            store.record_url("Hosts", "recHost1"),
            "https://api.airtable.com/v0/appBase1/Hosts/recHost1"
        );
    }

    #[test]
    fn formula_text_escapes_quotes() {
        assert_eq!(formula_text("recAbc"), "'recAbc'");
        assert_eq!(formula_text("O'Brien"), "'O\\'Brien'");
    }

    #[test]
    fn deserializes_record_pages() {
        let page: RecordPage = serde_json::from_str(
            r#"{"records":[{"id":"rec1","createdTime":"2025-06-01T10:00:00.000Z","fields":{"Name":"A"}}],"offset":"itr2"}"#,
        )
        .unwrap();

        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].id, "rec1");
        assert_eq!(page.records[0].fields.str("Name"), Some("A"));
        assert_eq!(page.offset.as_deref(), Some("itr2"));
    }
}
