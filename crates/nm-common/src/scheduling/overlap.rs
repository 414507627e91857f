use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use super::calendar::FreeBusyLookup;
use crate::lifecycle::interview_state::INTERVIEW_SLOT_COUNT;

/// Each proposed slot is a fixed 30-minute window.
pub const INTERVIEW_SLOT_MINUTES: i64 = 30;

/// Shown instead of the slot picker when concierge filtering removed
/// every slot. A terminal soft-failure, not an error.
pub const NO_OVERLAP_MESSAGE: &str =
    "None of the proposed times overlap with concierge availability. The host will send new times.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresentedSlot {
    /// Index into the original slot1..slot5 positions, so a selection
    /// made from a filtered list still references the right slot.
    pub index: usize,
    pub start: DateTime<Utc>,
}

/// What the nanny is shown: the surviving slots, or a message when
/// filtering left nothing to pick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotPresentation {
    pub slots: Vec<PresentedSlot>,
    pub message: Option<String>,
}

fn present_all(slots: &[Option<DateTime<Utc>>; INTERVIEW_SLOT_COUNT]) -> Vec<PresentedSlot> {
    slots
        .iter()
        .enumerate()
        .filter_map(|(index, slot)| slot.map(|start| PresentedSlot { index, start }))
        .collect()
}

/// VIP concierge filtering: drop any slot whose 30-minute window
/// overlaps a busy interval on the concierge's calendar.
///
/// The lookup is an optional enhancement. If it fails for any reason
/// the nanny is shown all five unfiltered slots with no message; an
/// error here must never block the core flow.
pub async fn filter_slots_by_concierge_free(
    lookup: &dyn FreeBusyLookup,
    calendar_id: &str,
    slots: &[Option<DateTime<Utc>>; INTERVIEW_SLOT_COUNT],
) -> SlotPresentation {
    let proposed = present_all(slots);
    let Some(span_start) = proposed.iter().map(|s| s.start).min() else {
        return SlotPresentation {
            slots: proposed,
            message: None,
        };
    };
    let span_end = proposed
        .iter()
        .map(|s| s.start)
        .max()
        .unwrap_or(span_start)
        + Duration::minutes(INTERVIEW_SLOT_MINUTES);

    let busy = match lookup.busy_intervals(calendar_id, span_start, span_end).await {
        Ok(busy) => busy,
        Err(err) => {
            warn!(error = %err, "concierge free/busy lookup failed; presenting all slots");
            return SlotPresentation {
                slots: proposed,
                message: None,
            };
        }
    };

    let free: Vec<PresentedSlot> = proposed
        .into_iter()
        .filter(|slot| {
            let slot_end = slot.start + Duration::minutes(INTERVIEW_SLOT_MINUTES);
            !busy
                .iter()
                .any(|window| slot.start < window.end && window.start < slot_end)
        })
        .collect();

    if free.is_empty() {
        SlotPresentation {
            slots: Vec::new(),
            message: Some(NO_OVERLAP_MESSAGE.to_string()),
        }
    } else {
        SlotPresentation {
            slots: free,
            message: None,
        }
    }
}
