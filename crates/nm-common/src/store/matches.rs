use serde_json::Value;
use tracing::instrument;

use super::client::{ProfileStore, StoreError, StoreRecord};
use crate::lifecycle::match_state::{DecisionState, MatchStatus};

pub const MATCHES_TABLE: &str = "Matches";

/// A pairing of one host with one nanny. The score is written once by
/// the engine; only a matchmaker may overwrite it afterwards. The
/// decision fields are written solely through the lifecycle transition.
#[derive(Debug, Clone)]
pub struct MatchRecord {
    pub id: String,
    pub host_id: String,
    pub nanny_id: String,
    pub score: f64,
    pub status: MatchStatus,
    pub host_proceed: Option<bool>,
    pub nanny_proceed: Option<bool>,
    pub both_proceed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl MatchRecord {
    pub fn decision_state(&self) -> DecisionState {
        DecisionState {
            status: self.status,
            host_proceed: self.host_proceed,
            nanny_proceed: self.nanny_proceed,
            both_proceed_at: self.both_proceed_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MatchInsert {
    pub host_id: String,
    pub nanny_id: String,
    pub score: f64,
    pub score_breakdown: Option<Value>,
}

fn map_match(record: &StoreRecord) -> Result<MatchRecord, StoreError> {
    let f = &record.fields;

    let malformed = |reason: &str| StoreError::Malformed {
        table: MATCHES_TABLE,
        id: record.id.clone(),
        reason: reason.to_string(),
    };

    Ok(MatchRecord {
        id: record.id.clone(),
        host_id: f.string("Host Id").ok_or_else(|| malformed("missing Host Id"))?,
        nanny_id: f
            .string("Nanny Id")
            .ok_or_else(|| malformed("missing Nanny Id"))?,
        score: f.f64("Score").unwrap_or(0.0),
        status: f
            .str("Status")
            .and_then(MatchStatus::parse)
            .unwrap_or(MatchStatus::Pending),
        host_proceed: f.opt_bool("Host Proceed"),
        nanny_proceed: f.opt_bool("Nanny Proceed"),
        both_proceed_at: f.datetime("Both Proceed At"),
    })
}

/// Persist a new pending match produced by the shortlist generator or a
/// manual matchmaker action.
#[instrument(skip(store, insert))]
pub async fn create_match(
    store: &ProfileStore,
    insert: &MatchInsert,
) -> Result<MatchRecord, StoreError> {
    let mut fields = serde_json::json!({
        "Host Id": insert.host_id,
        "Nanny Id": insert.nanny_id,
        "Score": insert.score,
        "Status": MatchStatus::Pending.as_str(),
    });
    if let Some(breakdown) = &insert.score_breakdown {
        fields["Score Breakdown"] = Value::String(breakdown.to_string());
    }

    let record = store.create_record(MATCHES_TABLE, fields).await?;
    map_match(&record)
}

#[instrument(skip(store))]
pub async fn fetch_match(store: &ProfileStore, match_id: &str) -> Result<MatchRecord, StoreError> {
    let record = store.get_record(MATCHES_TABLE, match_id).await?;
    map_match(&record)
}

/// Write the outcome of a lifecycle transition back to the store.
#[instrument(skip(store, state))]
pub async fn update_match_decision(
    store: &ProfileStore,
    match_id: &str,
    state: &DecisionState,
) -> Result<MatchRecord, StoreError> {
    let mut fields = serde_json::Map::new();
    fields.insert("Status".into(), Value::String(state.status.as_str().into()));
    if let Some(host_proceed) = state.host_proceed {
        fields.insert("Host Proceed".into(), Value::Bool(host_proceed));
    }
    if let Some(nanny_proceed) = state.nanny_proceed {
        fields.insert("Nanny Proceed".into(), Value::Bool(nanny_proceed));
    }
    if let Some(at) = state.both_proceed_at {
        fields.insert("Both Proceed At".into(), Value::String(at.to_rfc3339()));
    }

    let record = store
        .update_record(MATCHES_TABLE, match_id, Value::Object(fields))
        .await?;
    map_match(&record)
}

/// Matchmaker-only score overwrite.
#[instrument(skip(store))]
pub async fn update_match_score(
    store: &ProfileStore,
    match_id: &str,
    score: f64,
) -> Result<MatchRecord, StoreError> {
    let record = store
        .update_record(MATCHES_TABLE, match_id, serde_json::json!({ "Score": score }))
        .await?;
    map_match(&record)
}
