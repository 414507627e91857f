pub mod calendar;
pub mod meeting;
pub mod overlap;

pub use calendar::{BusyInterval, CalendarError, FreeBusyLookup, HttpFreeBusyClient};
pub use meeting::{create_meeting_stub, MeetingDetails};
pub use overlap::{
    filter_slots_by_concierge_free, PresentedSlot, SlotPresentation, INTERVIEW_SLOT_MINUTES,
    NO_OVERLAP_MESSAGE,
};
