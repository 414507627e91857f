use crate::{Host, Nanny};

/// Outcome of comparing the two location field sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationMatch {
    /// Some pair of fields is equal (case-insensitive).
    Exact,
    /// Some pair of fields contains the other as a substring.
    Partial,
    /// One side declared nothing. Not a mismatch.
    Unknown,
    Mismatch,
}

#[derive(Debug, Clone)]
pub struct LocationEvaluation {
    pub level: LocationMatch,
    pub details: String,
}

fn normalized_fields(fields: &[&Option<String>]) -> Vec<String> {
    fields
        .iter()
        .filter_map(|field| field.as_deref())
        .map(|value| value.trim().to_lowercase())
        .filter(|value| !value.is_empty())
        .collect()
}

/// The single location comparison both the must-match filter and the
/// scorer call. Host side contributes home location, job location and
/// country; nanny side contributes home location, current location and
/// country. Any cross pair can establish the match.
pub fn evaluate_location(host: &Host, nanny: &Nanny) -> LocationEvaluation {
    let host_fields = normalized_fields(&[&host.location, &host.job_location, &host.country]);
    let nanny_fields = normalized_fields(&[
        &nanny.location,
        &nanny.current_location,
        &nanny.country,
    ]);

    if host_fields.is_empty() || nanny_fields.is_empty() {
        return LocationEvaluation {
            level: LocationMatch::Unknown,
            details: "location not declared on one side".into(),
        };
    }

    let mut partial: Option<(String, String)> = None;
    for h in &host_fields {
        for n in &nanny_fields {
            if h == n {
                return LocationEvaluation {
                    level: LocationMatch::Exact,
                    details: format!("location exact match: {h}"),
                };
            }
            if partial.is_none() && (h.contains(n.as_str()) || n.contains(h.as_str())) {
                partial = Some((h.clone(), n.clone()));
            }
        }
    }

    if let Some((h, n)) = partial {
        return LocationEvaluation {
            level: LocationMatch::Partial,
            details: format!("location partial match: {h} ~ {n}"),
        };
    }

    LocationEvaluation {
        level: LocationMatch::Mismatch,
        details: format!(
            "location mismatch: host=[{}] vs nanny=[{}]",
            host_fields.join(", "),
            nanny_fields.join(", ")
        ),
    }
}
