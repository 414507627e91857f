/// Shape returned by the meeting provider once a slot is confirmed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeetingDetails {
    pub id: String,
    pub join_url: String,
    pub start_url: String,
}

/// Meeting creation is not wired up yet; the shape is stable so callers
/// can already depend on it.
///
/// TODO: call the video provider's create-meeting endpoint once the
/// account credentials are provisioned.
pub fn create_meeting_stub() -> MeetingDetails {
    MeetingDetails::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_returns_the_agreed_shape_with_empty_fields() {
        let meeting = create_meeting_stub();
        assert_eq!(meeting.id, "");
        assert_eq!(meeting.join_url, "");
        assert_eq!(meeting.start_url, "");
    }
}
