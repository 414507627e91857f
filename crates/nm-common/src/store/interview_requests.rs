use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::instrument;

use super::client::{ProfileStore, StoreError, StoreRecord};
use crate::lifecycle::interview_state::{InterviewStatus, SlotSelection, INTERVIEW_SLOT_COUNT};

pub const INTERVIEW_REQUESTS_TABLE: &str = "InterviewRequests";

const SLOT_FIELDS: [&str; INTERVIEW_SLOT_COUNT] =
    ["Slot 1", "Slot 2", "Slot 3", "Slot 4", "Slot 5"];

/// One scheduling attempt for a match: five proposed slots, the nanny's
/// selection, and the VIP flag that turns on concierge filtering.
#[derive(Debug, Clone)]
pub struct InterviewRequestRecord {
    pub id: String,
    pub match_id: String,
    pub host_id: String,
    pub nanny_id: String,
    pub slots: [Option<DateTime<Utc>>; INTERVIEW_SLOT_COUNT],
    pub selected_slot_index: Option<usize>,
    pub status: InterviewStatus,
    pub is_vip: bool,
}

#[derive(Debug, Clone)]
pub struct InterviewRequestInsert {
    pub match_id: String,
    pub host_id: String,
    pub nanny_id: String,
    pub slots: [DateTime<Utc>; INTERVIEW_SLOT_COUNT],
    pub is_vip: bool,
}

fn map_interview_request(record: &StoreRecord) -> Result<InterviewRequestRecord, StoreError> {
    let f = &record.fields;
    let malformed = |reason: &str| StoreError::Malformed {
        table: INTERVIEW_REQUESTS_TABLE,
        id: record.id.clone(),
        reason: reason.to_string(),
    };

    let mut slots = [None; INTERVIEW_SLOT_COUNT];
    for (slot, field) in slots.iter_mut().zip(SLOT_FIELDS) {
        *slot = f.datetime(field);
    }

    Ok(InterviewRequestRecord {
        id: record.id.clone(),
        match_id: f
            .string("Match Id")
            .ok_or_else(|| malformed("missing Match Id"))?,
        host_id: f
            .string("Host Id")
            .ok_or_else(|| malformed("missing Host Id"))?,
        nanny_id: f
            .string("Nanny Id")
            .ok_or_else(|| malformed("missing Nanny Id"))?,
        slots,
        selected_slot_index: f.usize("Selected Slot Index"),
        status: f
            .str("Status")
            .and_then(InterviewStatus::parse)
            .unwrap_or(InterviewStatus::PendingSlots),
        is_vip: f.bool_flag("Is VIP"),
    })
}

#[instrument(skip(store, insert), fields(match_id = %insert.match_id))]
pub async fn create_interview_request(
    store: &ProfileStore,
    insert: &InterviewRequestInsert,
) -> Result<InterviewRequestRecord, StoreError> {
    let mut fields = serde_json::Map::new();
    fields.insert("Match Id".into(), Value::String(insert.match_id.clone()));
    fields.insert("Host Id".into(), Value::String(insert.host_id.clone()));
    fields.insert("Nanny Id".into(), Value::String(insert.nanny_id.clone()));
    fields.insert(
        "Status".into(),
        Value::String(InterviewStatus::PendingSlots.as_str().into()),
    );
    fields.insert("Is VIP".into(), Value::Bool(insert.is_vip));
    for (slot, field) in insert.slots.iter().zip(SLOT_FIELDS) {
        fields.insert(field.into(), Value::String(slot.to_rfc3339()));
    }

    let record = store
        .create_record(INTERVIEW_REQUESTS_TABLE, Value::Object(fields))
        .await?;
    map_interview_request(&record)
}

#[instrument(skip(store))]
pub async fn fetch_interview_request(
    store: &ProfileStore,
    request_id: &str,
) -> Result<InterviewRequestRecord, StoreError> {
    let record = store.get_record(INTERVIEW_REQUESTS_TABLE, request_id).await?;
    map_interview_request(&record)
}

/// Persist the outcome of a slot-choice transition.
#[instrument(skip(store))]
pub async fn update_interview_selection(
    store: &ProfileStore,
    request_id: &str,
    selection: &SlotSelection,
) -> Result<InterviewRequestRecord, StoreError> {
    let mut fields = serde_json::Map::new();
    fields.insert(
        "Status".into(),
        Value::String(selection.status.as_str().into()),
    );
    if let Some(index) = selection.selected_slot_index {
        fields.insert("Selected Slot Index".into(), Value::from(index));
    }

    let record = store
        .update_record(INTERVIEW_REQUESTS_TABLE, request_id, Value::Object(fields))
        .await?;
    map_interview_request(&record)
}

/// Status-only update, used by the out-of-band meeting step.
#[instrument(skip(store))]
pub async fn update_interview_status(
    store: &ProfileStore,
    request_id: &str,
    status: InterviewStatus,
) -> Result<InterviewRequestRecord, StoreError> {
    let record = store
        .update_record(
            INTERVIEW_REQUESTS_TABLE,
            request_id,
            serde_json::json!({ "Status": status.as_str() }),
        )
        .await?;
    map_interview_request(&record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(fields: serde_json::Value) -> StoreRecord {
        serde_json::from_value(json!({"id": "recIr1", "fields": fields})).unwrap()
    }

    #[test]
    fn maps_slots_positionally_with_gaps() {
        let request = map_interview_request(&record(json!({
            "Match Id": "recMatch1",
            "Host Id": "recHost1",
            "Nanny Id": "recNanny1",
            "Slot 1": "2025-06-10T09:00:00Z",
            "Slot 3": "2025-06-10T11:00:00Z",
            "Status": "pending_slots",
            "Is VIP": true,
        })))
        .unwrap();

        assert!(request.slots[0].is_some());
        assert!(request.slots[1].is_none());
        assert!(request.slots[2].is_some());
        assert!(request.is_vip);
        assert_eq!(request.status, InterviewStatus::PendingSlots);
        assert_eq!(request.selected_slot_index, None);
    }

    #[test]
    fn unparseable_slot_reads_as_empty() {
        let request = map_interview_request(&record(json!({
            "Match Id": "recMatch1",
            "Host Id": "recHost1",
            "Nanny Id": "recNanny1",
            "Slot 1": "sometime tuesday",
        })))
        .unwrap();

        assert!(request.slots[0].is_none());
    }
}
