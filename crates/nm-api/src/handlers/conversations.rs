use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use nm_common::store::{
    append_message, fetch_conversation, list_messages, ConversationRecord, SenderType,
};
use nm_common::token::{validate_link_token, LinkTokenKind};

use crate::auth::{SessionRole, SessionUser};
use crate::error::ApiError;
use crate::SharedState;

#[derive(Debug, Deserialize)]
pub struct ChatQuery {
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageView {
    pub id: String,
    pub sender_type: SenderType,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct AppendMessageRequest {
    pub token: Option<String>,
    pub body: String,
    /// Required with a chat token, which does not identify the sender
    /// side by itself.
    pub sender_type: Option<SenderType>,
}

/// Resolve which side of the conversation the caller is. Sessions are
/// matched against the participant ids; a chat token must be bound to
/// this conversation via its room claim.
fn resolve_sender(
    session: Option<&SessionUser>,
    token: Option<&str>,
    declared: Option<SenderType>,
    link_secret: &str,
    conversation: &ConversationRecord,
) -> Result<SenderType, ApiError> {
    if let Some(user) = session {
        match user.role {
            SessionRole::Host if user.subject == conversation.host_id => {
                return Ok(SenderType::Host)
            }
            SessionRole::Nanny if user.subject == conversation.nanny_id => {
                return Ok(SenderType::Nanny)
            }
            _ => {}
        }
    }

    let token = token.ok_or_else(|| ApiError::Unauthorized("no session or token".into()))?;
    let claims = validate_link_token(link_secret, token)?;

    let bound = claims.kind == LinkTokenKind::Chat
        && claims.room_id.as_deref() == Some(conversation.id.as_str());
    if !bound {
        return Err(ApiError::Unauthorized("token does not open this room".into()));
    }

    declared.ok_or_else(|| ApiError::BadRequest("sender_type is required".into()))
}

/// Poll endpoint: all messages for the conversation, oldest first.
pub async fn list(
    State(state): State<SharedState>,
    Path(conversation_id): Path<String>,
    session: Option<SessionUser>,
    Query(query): Query<ChatQuery>,
) -> Result<Json<Vec<MessageView>>, ApiError> {
    let conversation = fetch_conversation(&state.store, &conversation_id).await?;
    // Reading only needs access, not a sender side; host is a harmless
    // default for the token path.
    resolve_sender(
        session.as_ref(),
        query.token.as_deref(),
        Some(SenderType::Host),
        &state.config.auth.link_secret,
        &conversation,
    )?;

    let messages = list_messages(&state.store, &conversation.id).await?;
    Ok(Json(
        messages
            .into_iter()
            .map(|message| MessageView {
                id: message.id,
                sender_type: message.sender_type,
                body: message.body,
                created_at: message.created_at,
            })
            .collect(),
    ))
}

pub async fn append(
    State(state): State<SharedState>,
    Path(conversation_id): Path<String>,
    session: Option<SessionUser>,
    Json(payload): Json<AppendMessageRequest>,
) -> Result<Json<MessageView>, ApiError> {
    let conversation = fetch_conversation(&state.store, &conversation_id).await?;
    let sender = resolve_sender(
        session.as_ref(),
        payload.token.as_deref(),
        payload.sender_type,
        &state.config.auth.link_secret,
        &conversation,
    )?;

    let body = payload.body.trim();
    if body.is_empty() {
        return Err(ApiError::BadRequest("message body must not be empty".into()));
    }

    let message = append_message(&state.store, &conversation.id, sender, body).await?;
    Ok(Json(MessageView {
        id: message.id,
        sender_type: message.sender_type,
        body: message.body,
        created_at: message.created_at,
    }))
}
