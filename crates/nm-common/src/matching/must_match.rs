use super::location::{evaluate_location, LocationMatch};
use crate::date::start_dates_compatible;
use crate::{Accommodation, Host, Nanny};

/// Result of one must-match filter.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterDecision {
    Pass,
    Fail { reason: String },
}

impl FilterDecision {
    pub fn is_pass(&self) -> bool {
        matches!(self, FilterDecision::Pass)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            FilterDecision::Pass => None,
            FilterDecision::Fail { reason } => Some(reason),
        }
    }
}

/// Aggregate of all must-match filters for one host/nanny pair.
/// A nanny failing any filter is excluded before scoring.
#[derive(Debug, Clone)]
pub struct MustMatchResult {
    /// All decisions in evaluation order (filter name, decision).
    pub decisions: Vec<(&'static str, FilterDecision)>,
}

impl MustMatchResult {
    pub fn passes(&self) -> bool {
        self.decisions.iter().all(|(_, d)| d.is_pass())
    }

    pub fn failure_reasons(&self) -> Vec<&str> {
        self.decisions
            .iter()
            .filter_map(|(_, d)| d.reason())
            .collect()
    }
}

/// Run every must-match filter. Pure and total: missing data on either
/// side is treated as "no requirement", never as a failure. Strictness
/// is reserved for explicit mismatches and the special-needs gate.
pub fn run_must_match_filters(host: &Host, nanny: &Nanny) -> MustMatchResult {
    let decisions = vec![
        ("location", check_location(host, nanny)),
        ("start_date", check_start_date(host, nanny)),
        ("accommodation", check_accommodation(host, nanny)),
        ("availability", check_availability(host, nanny)),
        ("age_groups", check_age_groups(host, nanny)),
        ("special_needs", check_special_needs(host, nanny)),
    ];

    MustMatchResult { decisions }
}

/// Convenience boolean form of [`run_must_match_filters`].
pub fn passes_must_match_filters(host: &Host, nanny: &Nanny) -> bool {
    run_must_match_filters(host, nanny).passes()
}

fn check_location(host: &Host, nanny: &Nanny) -> FilterDecision {
    let evaluation = evaluate_location(host, nanny);
    match evaluation.level {
        LocationMatch::Mismatch => FilterDecision::Fail {
            reason: evaluation.details,
        },
        _ => FilterDecision::Pass,
    }
}

fn check_start_date(host: &Host, nanny: &Nanny) -> FilterDecision {
    if start_dates_compatible(host.desired_start_date, nanny.available_start_date) {
        FilterDecision::Pass
    } else {
        FilterDecision::Fail {
            reason: format!(
                "start_date: nanny available {:?} after host desired {:?}",
                nanny.available_start_date, host.desired_start_date
            ),
        }
    }
}

fn check_accommodation(host: &Host, nanny: &Nanny) -> FilterDecision {
    match (host.accommodation, nanny.accommodation) {
        (Some(Accommodation::Either), _) | (_, Some(Accommodation::Either)) => FilterDecision::Pass,
        (Some(required), Some(offered)) if required == offered => FilterDecision::Pass,
        (Some(required), Some(offered)) => FilterDecision::Fail {
            reason: format!("accommodation: host wants {required:?}, nanny wants {offered:?}"),
        },
        // No stated preference on either side is no requirement.
        _ => FilterDecision::Pass,
    }
}

fn normalize_day(day: &str) -> String {
    day.trim().to_lowercase()
}

fn check_availability(host: &Host, nanny: &Nanny) -> FilterDecision {
    if host.required_days.is_empty() || nanny.available_days.is_empty() {
        return FilterDecision::Pass;
    }

    let available: Vec<String> = nanny.available_days.iter().map(|d| normalize_day(d)).collect();
    let overlap = host
        .required_days
        .iter()
        .any(|day| available.contains(&normalize_day(day)));

    if overlap {
        FilterDecision::Pass
    } else {
        FilterDecision::Fail {
            reason: format!(
                "availability: no shared day between host [{}] and nanny [{}]",
                host.required_days.join(", "),
                nanny.available_days.join(", ")
            ),
        }
    }
}

fn age_group_covered(required: &str, experience: &[String]) -> bool {
    let wanted = required.trim().to_lowercase();
    experience.iter().any(|group| {
        let have = group.trim().to_lowercase();
        have == wanted || have.contains(&wanted) || wanted.contains(&have)
    })
}

fn check_age_groups(host: &Host, nanny: &Nanny) -> FilterDecision {
    if host.required_age_groups.is_empty() {
        return FilterDecision::Pass;
    }

    if nanny.age_group_experience.is_empty() {
        return FilterDecision::Fail {
            reason: "age_groups: host requires age groups but nanny declared none".into(),
        };
    }

    let missing: Vec<&str> = host
        .required_age_groups
        .iter()
        .filter(|group| !age_group_covered(group, &nanny.age_group_experience))
        .map(|group| group.as_str())
        .collect();

    if missing.is_empty() {
        FilterDecision::Pass
    } else {
        FilterDecision::Fail {
            reason: format!("age_groups: uncovered [{}]", missing.join(", ")),
        }
    }
}

fn check_special_needs(host: &Host, nanny: &Nanny) -> FilterDecision {
    if host.requires_special_needs && !nanny.special_needs_experience {
        FilterDecision::Fail {
            reason: "special_needs: host requires special-needs experience".into(),
        }
    } else {
        FilterDecision::Pass
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn base_host() -> Host {
        Host {
            location: Some("London".into()),
            desired_start_date: NaiveDate::from_ymd_opt(2025, 6, 1),
            accommodation: Some(Accommodation::LiveIn),
            required_days: vec!["Monday".into(), "Tuesday".into()],
            required_age_groups: vec!["Toddler".into()],
            ..Host::default()
        }
    }

    fn base_nanny() -> Nanny {
        Nanny {
            location: Some("London".into()),
            available_start_date: NaiveDate::from_ymd_opt(2025, 5, 1),
            accommodation: Some(Accommodation::LiveIn),
            available_days: vec!["Monday".into(), "Friday".into()],
            age_group_experience: vec!["Toddler (1-3)".into()],
            ..Nanny::default()
        }
    }

    #[test]
    fn compatible_pair_passes_every_filter() {
        let result = run_must_match_filters(&base_host(), &base_nanny());
        assert!(result.passes());
        assert_eq!(result.decisions.len(), 6);
        assert!(result.failure_reasons().is_empty());
    }

    #[test]
    fn empty_profiles_pass_vacuously() {
        assert!(passes_must_match_filters(&Host::default(), &Nanny::default()));
    }

    #[test]
    fn late_start_date_fails() {
        let mut nanny = base_nanny();
        nanny.available_start_date = NaiveDate::from_ymd_opt(2025, 7, 1);

        let result = run_must_match_filters(&base_host(), &nanny);
        assert!(!result.passes());
        assert!(result.failure_reasons().iter().any(|r| r.contains("start_date")));
    }

    #[test]
    fn missing_start_date_never_blocks() {
        let mut nanny = base_nanny();
        nanny.available_start_date = None;
        assert!(passes_must_match_filters(&base_host(), &nanny));
    }

    #[test]
    fn either_accommodation_is_compatible_with_anything() {
        let mut host = base_host();
        host.accommodation = Some(Accommodation::LiveOut);
        let mut nanny = base_nanny();
        nanny.accommodation = Some(Accommodation::Either);

        assert!(passes_must_match_filters(&host, &nanny));
    }

    #[test]
    fn opposed_accommodation_fails() {
        let mut nanny = base_nanny();
        nanny.accommodation = Some(Accommodation::LiveOut);

        let result = run_must_match_filters(&base_host(), &nanny);
        assert!(!result.passes());
        assert!(result.failure_reasons().iter().any(|r| r.contains("accommodation")));
    }

    #[test]
    fn one_shared_day_is_enough() {
        let mut nanny = base_nanny();
        nanny.available_days = vec!["monday".into()];
        assert!(passes_must_match_filters(&base_host(), &nanny));
    }

    #[test]
    fn disjoint_days_fail() {
        let mut nanny = base_nanny();
        nanny.available_days = vec!["Saturday".into()];

        assert!(!passes_must_match_filters(&base_host(), &nanny));
    }

    #[test]
    fn all_required_age_groups_must_be_covered() {
        let mut host = base_host();
        host.required_age_groups = vec!["Toddler".into(), "Newborn".into()];

        let result = run_must_match_filters(&host, &base_nanny());
        assert!(!result.passes());
        assert!(result
            .failure_reasons()
            .iter()
            .any(|r| r.contains("Newborn")));
    }

    #[test]
    fn declared_requirement_with_no_experience_fails() {
        let mut nanny = base_nanny();
        nanny.age_group_experience = vec![];

        assert!(!passes_must_match_filters(&base_host(), &nanny));
    }

    #[test]
    fn special_needs_requirement_is_not_overridable() {
        // Fully compatible pair except the one safety gate.
        let mut host = base_host();
        host.requires_special_needs = true;

        let result = run_must_match_filters(&host, &base_nanny());
        assert!(!result.passes());

        let mut nanny = base_nanny();
        nanny.special_needs_experience = true;
        assert!(passes_must_match_filters(&host, &nanny));
    }
}
