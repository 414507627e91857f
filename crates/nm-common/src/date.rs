use chrono::{DateTime, NaiveDate};

/// Parse a date string the onboarding forms may have produced in a few
/// shapes (ISO date, slash-separated, or a full RFC 3339 timestamp).
///
/// Returns `None` on anything unparseable. Callers treat a missing date
/// as "no requirement"; a malformed date must never block a match.
pub fn parse_flexible_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(ts.date_naive());
    }

    for format in ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }

    None
}

/// Start-date compatibility: the nanny can start on or before the day
/// the host needs cover. Either side missing counts as compatible.
pub fn start_dates_compatible(
    host_desired: Option<NaiveDate>,
    nanny_available: Option<NaiveDate>,
) -> bool {
    match (host_desired, nanny_available) {
        (Some(desired), Some(available)) => available <= desired,
        _ => true,
    }
}
