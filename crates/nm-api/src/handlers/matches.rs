use axum::extract::Path;
use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use nm_common::lifecycle::match_state::{apply_choice, Choice, MatchStatus, Party};
use nm_common::notify::Notification;
use nm_common::store::{
    ensure_conversation_for_match, fetch_host, fetch_match, fetch_nanny, update_match_decision,
    update_match_score, MatchRecord,
};
use nm_common::token::{validate_link_token, LinkClaims, LinkTokenKind};

use crate::auth::{SessionRole, SessionUser};
use crate::error::ApiError;
use crate::SharedState;

#[derive(Debug, Deserialize)]
pub struct ProceedPassRequest {
    pub token: String,
    pub choice: Choice,
}

#[derive(Debug, Serialize)]
pub struct ProceedPassResponse {
    pub match_id: String,
    pub status: MatchStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub both_proceed_at: Option<chrono::DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

/// The acting party clicked an emailed review link, so authorization is
/// the link token alone: its kind fixes the role, its claims fix the
/// match. Verified before any mutation.
fn authorize(claims: &LinkClaims, matched: &MatchRecord) -> Result<Party, ApiError> {
    let party = match claims.kind {
        LinkTokenKind::HostReview => Party::Host,
        LinkTokenKind::NannyReview => Party::Nanny,
        _ => return Err(ApiError::Unauthorized("wrong token kind for proceed-pass".into())),
    };

    let bound_to_match = claims.match_id.as_deref() == Some(matched.id.as_str());
    let bound_to_party = match party {
        Party::Host => claims.host_id.as_deref() == Some(matched.host_id.as_str()),
        Party::Nanny => claims.nanny_id.as_deref() == Some(matched.nanny_id.as_str()),
    };
    if !bound_to_match || !bound_to_party {
        return Err(ApiError::Unauthorized("token does not match this record".into()));
    }

    Ok(party)
}

pub async fn proceed_pass(
    State(state): State<SharedState>,
    Json(payload): Json<ProceedPassRequest>,
) -> Result<Json<ProceedPassResponse>, ApiError> {
    let claims = validate_link_token(&state.config.auth.link_secret, &payload.token)?;
    let match_id = claims
        .match_id
        .clone()
        .ok_or_else(|| ApiError::Unauthorized("token carries no match".into()))?;

    let matched = fetch_match(&state.store, &match_id).await?;
    let party = authorize(&claims, &matched)?;

    let transition = apply_choice(&matched.decision_state(), party, payload.choice, Utc::now())?;

    let matched = if transition.changed {
        update_match_decision(&state.store, &matched.id, &transition.state).await?
    } else {
        matched
    };

    let mut conversation_id = None;
    if transition.newly_mutual {
        let (conversation, created) = ensure_conversation_for_match(&state.store, &matched).await?;
        conversation_id = Some(conversation.id);

        if created {
            info!(match_id = %matched.id, "mutual proceed; chat and scheduling unlocked");

            let host_email = fetch_host(&state.store, &matched.host_id)
                .await
                .ok()
                .and_then(|host| host.email);
            let nanny_email = fetch_nanny(&state.store, &matched.nanny_id)
                .await
                .ok()
                .and_then(|nanny| nanny.email);
            state
                .notifier
                .dispatch(Notification::MatchProceeded {
                    match_id: matched.id.clone(),
                    host_email,
                    nanny_email,
                })
                .await;
        }
    }

    Ok(Json(ProceedPassResponse {
        match_id: matched.id.clone(),
        status: transition.state.status,
        both_proceed_at: transition.state.both_proceed_at,
        conversation_id,
    }))
}

#[derive(Debug, Deserialize)]
pub struct OverrideScoreRequest {
    pub score: f64,
}

#[derive(Debug, Serialize)]
pub struct OverrideScoreResponse {
    pub match_id: String,
    pub score: f64,
}

/// Matchmaker-only: overwrite the engine's score on a match. The engine
/// never rewrites a score once set; this is the one human escape hatch.
pub async fn override_score(
    State(state): State<SharedState>,
    session: SessionUser,
    Path(match_id): Path<String>,
    Json(payload): Json<OverrideScoreRequest>,
) -> Result<Json<OverrideScoreResponse>, ApiError> {
    if session.role != SessionRole::Matchmaker {
        return Err(ApiError::Forbidden("matchmaker role required".into()));
    }
    if !(0.0..=100.0).contains(&payload.score) {
        return Err(ApiError::BadRequest("score must be between 0 and 100".into()));
    }

    let matched = fetch_match(&state.store, &match_id).await?;
    let updated = update_match_score(&state.store, &matched.id, payload.score).await?;

    info!(match_id = %updated.id, score = payload.score, "matchmaker overrode match score");

    Ok(Json(OverrideScoreResponse {
        match_id: updated.id,
        score: updated.score,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matched() -> MatchRecord {
        MatchRecord {
            id: "recMatch1".into(),
            host_id: "recHost1".into(),
            nanny_id: "recNanny1".into(),
            score: 82.0,
            status: MatchStatus::Pending,
            host_proceed: None,
            nanny_proceed: None,
            both_proceed_at: None,
        }
    }

    #[test]
    fn host_review_token_acts_as_the_host() {
        let claims = LinkClaims::for_match(LinkTokenKind::HostReview, "recMatch1")
            .with_host("recHost1")
            .with_nanny("recNanny1");

        assert_eq!(authorize(&claims, &matched()).unwrap(), Party::Host);
    }

    #[test]
    fn chat_tokens_cannot_drive_decisions() {
        let claims = LinkClaims::for_match(LinkTokenKind::Chat, "recMatch1")
            .with_host("recHost1");

        assert!(authorize(&claims, &matched()).is_err());
    }

    #[test]
    fn token_bound_to_another_match_is_rejected() {
        let claims = LinkClaims::for_match(LinkTokenKind::NannyReview, "recMatchOther")
            .with_nanny("recNanny1");

        assert!(authorize(&claims, &matched()).is_err());
    }

    #[test]
    fn token_bound_to_another_party_is_rejected() {
        let claims = LinkClaims::for_match(LinkTokenKind::NannyReview, "recMatch1")
            .with_nanny("recSomeoneElse");

        assert!(authorize(&claims, &matched()).is_err());
    }
}
