use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An interview request always carries exactly five candidate slots.
pub const INTERVIEW_SLOT_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewStatus {
    PendingSlots,
    NannySelected,
    NoneAvailable,
    MeetingCreated,
}

impl InterviewStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending_slots" => Some(InterviewStatus::PendingSlots),
            "nanny_selected" => Some(InterviewStatus::NannySelected),
            "none_available" => Some(InterviewStatus::NoneAvailable),
            "meeting_created" => Some(InterviewStatus::MeetingCreated),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewStatus::PendingSlots => "pending_slots",
            InterviewStatus::NannySelected => "nanny_selected",
            InterviewStatus::NoneAvailable => "none_available",
            InterviewStatus::MeetingCreated => "meeting_created",
        }
    }
}

/// What the nanny submitted: one of the five slots, or none of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotChoice {
    Select(usize),
    NoneAvailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotSelection {
    pub status: InterviewStatus,
    pub selected_slot_index: Option<usize>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SlotSelectionError {
    /// Selection is only legal while slots are pending. A host offers
    /// new times through a fresh interview request, never by reopening
    /// a resolved one.
    #[error("interview request is {status}, not awaiting a slot selection", status = .0.as_str())]
    NotPending(InterviewStatus),
    #[error("slot index {0} is out of range")]
    IndexOutOfRange(usize),
    /// The slot exists positionally but holds no time.
    #[error("Selected slot is not available")]
    SlotUnavailable(usize),
}

/// The single legal-transition function for the slot machine:
/// `pending_slots -> nanny_selected | none_available`. Everything else
/// is rejected, so a prior selection can never be silently overwritten.
pub fn apply_slot_choice(
    status: InterviewStatus,
    slots: &[Option<DateTime<Utc>>; INTERVIEW_SLOT_COUNT],
    choice: SlotChoice,
) -> Result<SlotSelection, SlotSelectionError> {
    if status != InterviewStatus::PendingSlots {
        return Err(SlotSelectionError::NotPending(status));
    }

    match choice {
        SlotChoice::Select(index) => {
            if index >= INTERVIEW_SLOT_COUNT {
                return Err(SlotSelectionError::IndexOutOfRange(index));
            }
            if slots[index].is_none() {
                return Err(SlotSelectionError::SlotUnavailable(index));
            }

            Ok(SlotSelection {
                status: InterviewStatus::NannySelected,
                selected_slot_index: Some(index),
            })
        }
        SlotChoice::NoneAvailable => Ok(SlotSelection {
            status: InterviewStatus::NoneAvailable,
            selected_slot_index: None,
        }),
    }
}

/// Out-of-band follow-up once the meeting has actually been booked.
pub fn mark_meeting_created(status: InterviewStatus) -> Result<InterviewStatus, SlotSelectionError> {
    match status {
        InterviewStatus::NannySelected => Ok(InterviewStatus::MeetingCreated),
        other => Err(SlotSelectionError::NotPending(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(hour: u32) -> Option<DateTime<Utc>> {
        Some(
            format!("2025-06-10T{hour:02}:00:00Z")
                .parse()
                .unwrap(),
        )
    }

    fn full_slots() -> [Option<DateTime<Utc>>; INTERVIEW_SLOT_COUNT] {
        [slot(9), slot(10), slot(11), slot(14), slot(15)]
    }

    #[test]
    fn selecting_a_populated_slot_resolves_the_request() {
        let selection =
            apply_slot_choice(InterviewStatus::PendingSlots, &full_slots(), SlotChoice::Select(2))
                .unwrap();

        assert_eq!(selection.status, InterviewStatus::NannySelected);
        assert_eq!(selection.selected_slot_index, Some(2));
    }

    #[test]
    fn none_available_is_a_terminal_resolution() {
        let selection = apply_slot_choice(
            InterviewStatus::PendingSlots,
            &full_slots(),
            SlotChoice::NoneAvailable,
        )
        .unwrap();

        assert_eq!(selection.status, InterviewStatus::NoneAvailable);
        assert_eq!(selection.selected_slot_index, None);
    }

    #[test]
    fn empty_slot_cannot_be_selected() {
        let mut slots = full_slots();
        slots[2] = None;

        let err = apply_slot_choice(InterviewStatus::PendingSlots, &slots, SlotChoice::Select(2))
            .unwrap_err();

        assert_eq!(err, SlotSelectionError::SlotUnavailable(2));
        assert_eq!(err.to_string(), "Selected slot is not available");
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let err = apply_slot_choice(InterviewStatus::PendingSlots, &full_slots(), SlotChoice::Select(5))
            .unwrap_err();
        assert_eq!(err, SlotSelectionError::IndexOutOfRange(5));
    }

    #[test]
    fn resolved_requests_reject_any_further_choice() {
        for status in [
            InterviewStatus::NannySelected,
            InterviewStatus::NoneAvailable,
            InterviewStatus::MeetingCreated,
        ] {
            let err = apply_slot_choice(status, &full_slots(), SlotChoice::Select(0)).unwrap_err();
            assert_eq!(err, SlotSelectionError::NotPending(status));

            let err =
                apply_slot_choice(status, &full_slots(), SlotChoice::NoneAvailable).unwrap_err();
            assert_eq!(err, SlotSelectionError::NotPending(status));
        }
    }

    #[test]
    fn meeting_creation_follows_selection_only() {
        assert_eq!(
            mark_meeting_created(InterviewStatus::NannySelected).unwrap(),
            InterviewStatus::MeetingCreated
        );
        assert!(mark_meeting_created(InterviewStatus::PendingSlots).is_err());
        assert!(mark_meeting_created(InterviewStatus::NoneAvailable).is_err());
    }
}
