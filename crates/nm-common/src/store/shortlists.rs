use tracing::instrument;

use super::client::{ProfileStore, StoreError, StoreRecord};

pub const SHORTLISTS_TABLE: &str = "Shortlists";

/// An ordered batch of match ids delivered to one host at one time.
/// The list is immutable after creation; a later shortlist-generation
/// event creates a new record.
#[derive(Debug, Clone)]
pub struct ShortlistRecord {
    pub id: String,
    pub host_id: String,
    pub match_ids: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ShortlistInsert {
    pub host_id: String,
    pub match_ids: Vec<String>,
}

fn map_shortlist(record: &StoreRecord) -> Result<ShortlistRecord, StoreError> {
    let host_id = record
        .fields
        .string("Host Id")
        .ok_or_else(|| StoreError::Malformed {
            table: SHORTLISTS_TABLE,
            id: record.id.clone(),
            reason: "missing Host Id".into(),
        })?;

    Ok(ShortlistRecord {
        id: record.id.clone(),
        host_id,
        match_ids: record.fields.string_list("Match Ids"),
    })
}

#[instrument(skip(store, insert), fields(host_id = %insert.host_id, matches = insert.match_ids.len()))]
pub async fn create_shortlist(
    store: &ProfileStore,
    insert: &ShortlistInsert,
) -> Result<ShortlistRecord, StoreError> {
    let record = store
        .create_record(
            SHORTLISTS_TABLE,
            serde_json::json!({
                "Host Id": insert.host_id,
                "Match Ids": insert.match_ids,
            }),
        )
        .await?;
    map_shortlist(&record)
}

#[instrument(skip(store))]
pub async fn fetch_shortlist(
    store: &ProfileStore,
    shortlist_id: &str,
) -> Result<ShortlistRecord, StoreError> {
    let record = store.get_record(SHORTLISTS_TABLE, shortlist_id).await?;
    map_shortlist(&record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_ordered_match_ids() {
        let record: StoreRecord = serde_json::from_value(json!({
            "id": "recShort1",
            "fields": {
                "Host Id": "recHost1",
                "Match Ids": ["recMatch3", "recMatch1", "recMatch2"],
            },
        }))
        .unwrap();

        let shortlist = map_shortlist(&record).unwrap();
        assert_eq!(shortlist.host_id, "recHost1");
        assert_eq!(
            shortlist.match_ids,
            vec!["recMatch3", "recMatch1", "recMatch2"]
        );
    }
}
