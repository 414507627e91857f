use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::client::{formula_text, ProfileStore, StoreError, StoreRecord};
use super::matches::MatchRecord;

pub const CONVERSATIONS_TABLE: &str = "Conversations";
pub const MESSAGES_TABLE: &str = "Messages";

#[derive(Debug, Clone)]
pub struct ConversationRecord {
    pub id: String,
    pub match_id: String,
    pub host_id: String,
    pub nanny_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderType {
    Host,
    Nanny,
}

impl SenderType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "host" => Some(SenderType::Host),
            "nanny" => Some(SenderType::Nanny),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SenderType::Host => "host",
            SenderType::Nanny => "nanny",
        }
    }
}

/// Messages are append-only and attributed to one side of the match.
#[derive(Debug, Clone)]
pub struct MessageRecord {
    pub id: String,
    pub conversation_id: String,
    pub sender_type: SenderType,
    pub body: String,
    pub created_at: Option<DateTime<Utc>>,
}

fn map_conversation(record: &StoreRecord) -> Result<ConversationRecord, StoreError> {
    let malformed = |reason: &str| StoreError::Malformed {
        table: CONVERSATIONS_TABLE,
        id: record.id.clone(),
        reason: reason.to_string(),
    };

    Ok(ConversationRecord {
        id: record.id.clone(),
        match_id: record
            .fields
            .string("Match Id")
            .ok_or_else(|| malformed("missing Match Id"))?,
        host_id: record
            .fields
            .string("Host Id")
            .ok_or_else(|| malformed("missing Host Id"))?,
        nanny_id: record
            .fields
            .string("Nanny Id")
            .ok_or_else(|| malformed("missing Nanny Id"))?,
    })
}

fn map_message(record: &StoreRecord) -> Result<MessageRecord, StoreError> {
    let malformed = |reason: &str| StoreError::Malformed {
        table: MESSAGES_TABLE,
        id: record.id.clone(),
        reason: reason.to_string(),
    };

    Ok(MessageRecord {
        id: record.id.clone(),
        conversation_id: record
            .fields
            .string("Conversation Id")
            .ok_or_else(|| malformed("missing Conversation Id"))?,
        sender_type: record
            .fields
            .str("Sender Type")
            .and_then(SenderType::parse)
            .ok_or_else(|| malformed("missing Sender Type"))?,
        body: record.fields.string("Body").unwrap_or_default(),
        created_at: record.created_time,
    })
}

#[instrument(skip(store))]
pub async fn fetch_conversation(
    store: &ProfileStore,
    conversation_id: &str,
) -> Result<ConversationRecord, StoreError> {
    let record = store.get_record(CONVERSATIONS_TABLE, conversation_id).await?;
    map_conversation(&record)
}

async fn find_conversation_by_match(
    store: &ProfileStore,
    match_id: &str,
) -> Result<Option<ConversationRecord>, StoreError> {
    let formula = format!("{{Match Id}} = {}", formula_text(match_id));
    let records = store.list_records(CONVERSATIONS_TABLE, Some(&formula)).await?;
    records.first().map(map_conversation).transpose()
}

/// Create the conversation for a mutually proceeded match, exactly once.
/// A lookup by match id runs first so racing callers converge on the
/// existing record. Returns the record and whether this call created it.
#[instrument(skip(store, matched), fields(match_id = %matched.id))]
pub async fn ensure_conversation_for_match(
    store: &ProfileStore,
    matched: &MatchRecord,
) -> Result<(ConversationRecord, bool), StoreError> {
    if let Some(existing) = find_conversation_by_match(store, &matched.id).await? {
        return Ok((existing, false));
    }

    let record = store
        .create_record(
            CONVERSATIONS_TABLE,
            serde_json::json!({
                "Match Id": matched.id,
                "Host Id": matched.host_id,
                "Nanny Id": matched.nanny_id,
            }),
        )
        .await?;

    info!(conversation_id = %record.id, "conversation opened for mutual proceed");
    Ok((map_conversation(&record)?, true))
}

#[instrument(skip(store, body))]
pub async fn append_message(
    store: &ProfileStore,
    conversation_id: &str,
    sender: SenderType,
    body: &str,
) -> Result<MessageRecord, StoreError> {
    let record = store
        .create_record(
            MESSAGES_TABLE,
            serde_json::json!({
                "Conversation Id": conversation_id,
                "Sender Type": sender.as_str(),
                "Body": body,
            }),
        )
        .await?;
    map_message(&record)
}

/// Messages for one conversation, oldest first. Clients poll this on a
/// fixed interval; there is no push delivery.
#[instrument(skip(store))]
pub async fn list_messages(
    store: &ProfileStore,
    conversation_id: &str,
) -> Result<Vec<MessageRecord>, StoreError> {
    let formula = format!("{{Conversation Id}} = {}", formula_text(conversation_id));
    let records = store.list_records(MESSAGES_TABLE, Some(&formula)).await?;

    let mut messages = records
        .iter()
        .map(map_message)
        .collect::<Result<Vec<_>, _>>()?;
    messages.sort_by_key(|message| message.created_at);
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_messages_with_creation_time() {
        let record: StoreRecord = serde_json::from_value(json!({
            "id": "recMsg1",
            "createdTime": "2025-06-01T10:00:00.000Z",
            "fields": {
                "Conversation Id": "recConv1",
                "Sender Type": "nanny",
                "Body": "Hello!",
            },
        }))
        .unwrap();

        let message = map_message(&record).unwrap();
        assert_eq!(message.sender_type, SenderType::Nanny);
        assert_eq!(message.body, "Hello!");
        assert!(message.created_at.is_some());
    }

    #[test]
    fn unknown_sender_type_is_malformed() {
        let record: StoreRecord = serde_json::from_value(json!({
            "id": "recMsg2",
            "fields": {"Conversation Id": "recConv1", "Sender Type": "robot"},
        }))
        .unwrap();

        assert!(map_message(&record).is_err());
    }
}
