pub mod interview_state;
pub mod match_state;

pub use interview_state::{
    apply_slot_choice, mark_meeting_created, InterviewStatus, SlotChoice, SlotSelection,
    SlotSelectionError, INTERVIEW_SLOT_COUNT,
};
pub use match_state::{
    apply_choice, Choice, DecisionState, MatchStatus, Party, Transition, TransitionError,
};
