use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use nm_common::lifecycle::interview_state::{
    apply_slot_choice, mark_meeting_created, InterviewStatus, SlotChoice, INTERVIEW_SLOT_COUNT,
};
use nm_common::lifecycle::match_state::MatchStatus;
use nm_common::notify::Notification;
use nm_common::scheduling::{
    create_meeting_stub, filter_slots_by_concierge_free, PresentedSlot, SlotPresentation,
};
use nm_common::store::{
    create_interview_request, fetch_host, fetch_interview_request, fetch_match, fetch_nanny,
    update_interview_selection, update_interview_status, InterviewRequestInsert,
    InterviewRequestRecord,
};
use nm_common::token::{issue_link_token, validate_link_token, LinkClaims, LinkTokenKind};

use crate::auth::SessionUser;
use crate::error::ApiError;
use crate::SharedState;

#[derive(Debug, Deserialize)]
pub struct CreateInterviewRequest {
    pub match_id: String,
    pub slot1: Option<String>,
    pub slot2: Option<String>,
    pub slot3: Option<String>,
    pub slot4: Option<String>,
    pub slot5: Option<String>,
    #[serde(default)]
    pub is_vip: bool,
}

#[derive(Debug, Serialize)]
pub struct InterviewRequestResponse {
    pub interview_request_id: String,
    pub match_id: String,
    pub status: InterviewStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_slot_index: Option<usize>,
}

/// All five slots are required, no fewer and no more; the record shape
/// has exactly slot1..slot5. Each must parse as an RFC 3339 datetime.
fn parse_slots(payload: &CreateInterviewRequest) -> Result<[DateTime<Utc>; INTERVIEW_SLOT_COUNT], ApiError> {
    let raw = [
        ("slot1", &payload.slot1),
        ("slot2", &payload.slot2),
        ("slot3", &payload.slot3),
        ("slot4", &payload.slot4),
        ("slot5", &payload.slot5),
    ];

    let mut slots = [DateTime::<Utc>::MIN_UTC; INTERVIEW_SLOT_COUNT];
    for (parsed, (name, value)) in slots.iter_mut().zip(raw) {
        let value = value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::BadRequest(format!("{name} is required")))?;

        *parsed = DateTime::parse_from_rfc3339(value)
            .map_err(|_| ApiError::BadRequest(format!("{name} is not a valid datetime")))?
            .with_timezone(&Utc);
    }

    Ok(slots)
}

/// Host proposes five candidate slots for an interview. Only legal once
/// both parties have proceeded on the parent match.
pub async fn create(
    State(state): State<SharedState>,
    session: SessionUser,
    Json(payload): Json<CreateInterviewRequest>,
) -> Result<Json<InterviewRequestResponse>, ApiError> {
    let slots = parse_slots(&payload)?;

    let matched = fetch_match(&state.store, &payload.match_id).await?;
    session.authorize_host(&matched.host_id)?;

    if matched.status != MatchStatus::Proceeded {
        return Err(ApiError::Conflict(
            "interview scheduling requires both parties to have proceeded".into(),
        ));
    }

    let record = create_interview_request(
        &state.store,
        &InterviewRequestInsert {
            match_id: matched.id.clone(),
            host_id: matched.host_id.clone(),
            nanny_id: matched.nanny_id.clone(),
            slots,
            is_vip: payload.is_vip,
        },
    )
    .await?;

    info!(interview_request_id = %record.id, match_id = %matched.id, "interview slots proposed");

    let claims = LinkClaims::for_match(LinkTokenKind::Interview, matched.id.clone())
        .with_nanny(matched.nanny_id.clone());
    let token = issue_link_token(&state.config.auth.link_secret, &claims)?;
    let nanny_email = fetch_nanny(&state.store, &matched.nanny_id)
        .await
        .ok()
        .and_then(|nanny| nanny.email);
    state
        .notifier
        .dispatch(Notification::InterviewRequested {
            interview_request_id: record.id.clone(),
            nanny_email,
            slot_link: format!(
                "{}/interviews/select?id={}&token={}",
                state.config.app_base_url, record.id, token
            ),
        })
        .await;

    Ok(Json(InterviewRequestResponse {
        interview_request_id: record.id,
        match_id: matched.id,
        status: InterviewStatus::PendingSlots,
        selected_slot_index: None,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ViewQuery {
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SlotView {
    pub index: usize,
    pub start: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct InterviewRequestView {
    pub interview_request_id: String,
    pub status: InterviewStatus,
    pub slots: Vec<SlotView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_slot_index: Option<usize>,
}

fn authorize_nanny_access(
    session: Option<&SessionUser>,
    token: Option<&str>,
    link_secret: &str,
    record: &InterviewRequestRecord,
) -> Result<(), ApiError> {
    if session.is_some_and(|user| user.is_nanny(&record.nanny_id)) {
        return Ok(());
    }

    let token = token.ok_or_else(|| ApiError::Unauthorized("no session or token".into()))?;
    let claims = validate_link_token(link_secret, token)?;

    let bound = claims.kind == LinkTokenKind::Interview
        && claims.match_id.as_deref() == Some(record.match_id.as_str())
        && claims.nanny_id.as_deref() == Some(record.nanny_id.as_str());
    if !bound {
        return Err(ApiError::Unauthorized("token does not match this record".into()));
    }

    Ok(())
}

/// The nanny-facing slot presentation. For VIP requests the five slots
/// are first narrowed to those free on the concierge calendar; when
/// that removes everything, the response carries a message instead of a
/// slot picker. A failed or unconfigured lookup presents all slots.
pub async fn view(
    State(state): State<SharedState>,
    Path(request_id): Path<String>,
    session: Option<SessionUser>,
    Query(query): Query<ViewQuery>,
) -> Result<Json<InterviewRequestView>, ApiError> {
    let record = fetch_interview_request(&state.store, &request_id).await?;
    authorize_nanny_access(
        session.as_ref(),
        query.token.as_deref(),
        &state.config.auth.link_secret,
        &record,
    )?;

    let presentation = match (
        record.is_vip,
        state.calendar.as_deref(),
        state.config.concierge_calendar_id.as_deref(),
    ) {
        (true, Some(calendar), Some(calendar_id)) => {
            filter_slots_by_concierge_free(calendar, calendar_id, &record.slots).await
        }
        _ => SlotPresentation {
            slots: record
                .slots
                .iter()
                .enumerate()
                .filter_map(|(index, slot)| slot.map(|start| PresentedSlot { index, start }))
                .collect(),
            message: None,
        },
    };

    Ok(Json(InterviewRequestView {
        interview_request_id: record.id,
        status: record.status,
        slots: presentation
            .slots
            .into_iter()
            .map(|slot| SlotView {
                index: slot.index,
                start: slot.start,
            })
            .collect(),
        message: presentation.message,
        selected_slot_index: record.selected_slot_index,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SelectSlotRequest {
    pub token: Option<String>,
    pub selected_slot_index: Option<usize>,
    #[serde(default)]
    pub none_available: bool,
}

/// The nanny picks one slot or declines them all. Legal only while the
/// request is awaiting a selection; a resolved request is never
/// silently overwritten and the host offers new times with a fresh
/// request instead.
pub async fn select_slot(
    State(state): State<SharedState>,
    Path(request_id): Path<String>,
    session: Option<SessionUser>,
    Json(payload): Json<SelectSlotRequest>,
) -> Result<Json<InterviewRequestResponse>, ApiError> {
    let record = fetch_interview_request(&state.store, &request_id).await?;
    authorize_nanny_access(
        session.as_ref(),
        payload.token.as_deref(),
        &state.config.auth.link_secret,
        &record,
    )?;

    let choice = match (payload.selected_slot_index, payload.none_available) {
        (Some(index), false) => SlotChoice::Select(index),
        (None, true) => SlotChoice::NoneAvailable,
        _ => {
            return Err(ApiError::BadRequest(
                "provide exactly one of selected_slot_index or none_available".into(),
            ))
        }
    };

    let selection = apply_slot_choice(record.status, &record.slots, choice)?;
    let record = update_interview_selection(&state.store, &record.id, &selection).await?;

    if let Some(index) = selection.selected_slot_index {
        info!(interview_request_id = %record.id, index, "nanny selected an interview slot");
        let host_email = fetch_host(&state.store, &record.host_id)
            .await
            .ok()
            .and_then(|host| host.email);
        state
            .notifier
            .dispatch(Notification::SlotSelected {
                interview_request_id: record.id.clone(),
                host_email,
                selected_slot_index: index,
            })
            .await;
    } else {
        info!(interview_request_id = %record.id, "nanny declined all slots");
    }

    Ok(Json(InterviewRequestResponse {
        interview_request_id: record.id,
        match_id: record.match_id,
        status: selection.status,
        selected_slot_index: selection.selected_slot_index,
    }))
}

#[derive(Debug, Serialize)]
pub struct MeetingResponse {
    pub interview_request_id: String,
    pub status: InterviewStatus,
    pub meeting_id: String,
    pub join_url: String,
    pub start_url: String,
}

/// Staff-driven follow-up once a slot is selected: create the meeting
/// and move the request to `meeting_created`. Meeting creation itself
/// is still the stub, so the urls come back empty.
pub async fn create_meeting(
    State(state): State<SharedState>,
    session: SessionUser,
    Path(request_id): Path<String>,
) -> Result<Json<MeetingResponse>, ApiError> {
    if session.role != crate::auth::SessionRole::Matchmaker {
        return Err(ApiError::Forbidden("matchmaker role required".into()));
    }

    let record = fetch_interview_request(&state.store, &request_id).await?;
    let status = mark_meeting_created(record.status)?;
    let meeting = create_meeting_stub();
    let record = update_interview_status(&state.store, &record.id, status).await?;

    info!(interview_request_id = %record.id, "meeting step recorded");

    Ok(Json(MeetingResponse {
        interview_request_id: record.id,
        status,
        meeting_id: meeting.id,
        join_url: meeting.join_url,
        start_url: meeting.start_url,
    }))
}
