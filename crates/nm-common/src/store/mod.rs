pub mod client;
pub mod conversations;
pub mod fields;
pub mod hosts;
pub mod interview_requests;
pub mod matches;
pub mod nannies;
pub mod shortlists;

// Keep re-exports unique so downstream crates see a single symbol per helper.
pub use client::{ProfileStore, StoreConfig, StoreError, StoreRecord};
pub use conversations::{
    append_message, ensure_conversation_for_match, fetch_conversation, list_messages,
    ConversationRecord, MessageRecord, SenderType,
};
pub use fields::Fields;
pub use hosts::fetch_host;
pub use interview_requests::{
    create_interview_request, fetch_interview_request, update_interview_selection,
    update_interview_status, InterviewRequestInsert, InterviewRequestRecord,
};
pub use matches::{
    create_match, fetch_match, update_match_decision, update_match_score, MatchInsert, MatchRecord,
};
pub use nannies::{fetch_nanny, list_nannies_by_badges};
pub use shortlists::{create_shortlist, fetch_shortlist, ShortlistInsert, ShortlistRecord};
