use axum::extract::Path;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use nm_common::matching::MatchingEngine;
use nm_common::notify::Notification;
use nm_common::store::{
    create_match, create_shortlist, fetch_host, fetch_shortlist, list_nannies_by_badges,
    MatchInsert, ShortlistInsert,
};
use nm_common::token::{issue_link_token, LinkClaims, LinkTokenKind};

use crate::auth::SessionUser;
use crate::error::ApiError;
use crate::SharedState;

#[derive(Debug, Deserialize)]
pub struct GenerateShortlistRequest {
    /// Matchmakers pass the host explicitly; hosts omit it and act on
    /// their own record.
    pub host_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ShortlistMatch {
    pub match_id: String,
    pub nanny_id: String,
    pub score: f64,
}

#[derive(Debug, Serialize)]
pub struct ShortlistResponse {
    pub shortlist_id: String,
    pub matches: Vec<ShortlistMatch>,
}

/// Generate a shortlist for a host: resolve the canonical host record
/// (failing fast when it does not exist), rank the tier-gated candidate
/// pool, persist one pending match per survivor, then persist the
/// shortlist referencing them. The host's review links go out as a
/// fire-and-forget notification.
pub async fn generate_shortlist(
    State(state): State<SharedState>,
    session: SessionUser,
    Json(payload): Json<GenerateShortlistRequest>,
) -> Result<Json<ShortlistResponse>, ApiError> {
    let host_id = match payload.host_id {
        Some(id) if !id.trim().is_empty() => id,
        _ => session.subject.clone(),
    };
    session.authorize_host(&host_id)?;

    // Missing host fails the whole operation; no partial shortlist.
    let host = fetch_host(&state.store, &host_id).await?;

    let pool = list_nannies_by_badges(&state.store, MatchingEngine::eligible_badges(host.tier)).await?;
    let engine = MatchingEngine::new(state.config.selection());
    let ranked = engine.rank_candidates(&host, &pool);

    let mut matches = Vec::with_capacity(ranked.len());
    let mut review_links = Vec::with_capacity(ranked.len());
    for candidate in &ranked {
        let nanny_id = candidate
            .nanny
            .id
            .clone()
            .ok_or_else(|| ApiError::Internal("ranked candidate without an id".into()))?;

        let created = create_match(
            &state.store,
            &MatchInsert {
                host_id: host_id.clone(),
                nanny_id: nanny_id.clone(),
                score: candidate.score.total,
                score_breakdown: Some(candidate.score.breakdown_json()),
            },
        )
        .await?;

        let claims = LinkClaims::for_match(LinkTokenKind::HostReview, created.id.clone())
            .with_host(host_id.clone())
            .with_nanny(nanny_id.clone());
        let token = issue_link_token(&state.config.auth.link_secret, &claims)?;
        review_links.push(format!(
            "{}/matches/review?token={}",
            state.config.app_base_url, token
        ));

        matches.push(ShortlistMatch {
            match_id: created.id,
            nanny_id,
            score: candidate.score.total,
        });
    }

    let shortlist = create_shortlist(
        &state.store,
        &ShortlistInsert {
            host_id: host_id.clone(),
            match_ids: matches.iter().map(|m| m.match_id.clone()).collect(),
        },
    )
    .await?;

    info!(
        shortlist_id = %shortlist.id,
        host_id = %host_id,
        candidates = matches.len(),
        "shortlist generated"
    );

    if let Some(host_email) = host.email {
        state
            .notifier
            .dispatch(Notification::ShortlistReady {
                host_email,
                shortlist_id: shortlist.id.clone(),
                review_links,
            })
            .await;
    }

    Ok(Json(ShortlistResponse {
        shortlist_id: shortlist.id,
        matches,
    }))
}

#[derive(Debug, Serialize)]
pub struct ShortlistView {
    pub shortlist_id: String,
    pub host_id: String,
    pub match_ids: Vec<String>,
}

/// A host (or a matchmaker) reads back a delivered shortlist. The match
/// id list is immutable after creation.
pub async fn get_shortlist(
    State(state): State<SharedState>,
    session: SessionUser,
    Path(shortlist_id): Path<String>,
) -> Result<Json<ShortlistView>, ApiError> {
    let shortlist = fetch_shortlist(&state.store, &shortlist_id).await?;
    session.authorize_host(&shortlist.host_id)?;

    Ok(Json(ShortlistView {
        shortlist_id: shortlist.id,
        host_id: shortlist.host_id,
        match_ids: shortlist.match_ids,
    }))
}
