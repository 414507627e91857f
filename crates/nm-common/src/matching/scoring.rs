use super::location::{evaluate_location, LocationMatch};
use super::weights::*;
use crate::date::start_dates_compatible;
use crate::{Accommodation, Host, Nanny, NannyBadge, SmokingPolicy};

/// One scored section with its ceiling and a human-readable trail for
/// the matchmaker dashboard.
#[derive(Debug, Clone)]
pub struct SectionScore {
    pub points: f64,
    pub max_points: f64,
    pub details: String,
}

#[derive(Debug, Clone)]
pub struct MatchScore {
    pub total: f64,
    pub core: SectionScore,
    pub skills: SectionScore,
    pub values: SectionScore,
    pub bonus: SectionScore,
}

impl MatchScore {
    pub fn breakdown_json(&self) -> serde_json::Value {
        serde_json::json!({
            "total": self.total,
            "core": self.core.points,
            "skills": self.skills.points,
            "values": self.values.points,
            "bonus": self.bonus.points,
        })
    }
}

/// Compute the weighted multi-factor score for a host/nanny pair.
///
/// Pure and deterministic. Callers are expected to have already applied
/// the must-match filters; nothing here re-checks them. Every section is
/// clamped to its ceiling, so the total is bounded to 0-100.
pub fn compute_match_score(host: &Host, nanny: &Nanny) -> MatchScore {
    let core = score_core(host, nanny);
    let skills = score_skills(host, nanny);
    let values = score_values(host, nanny);
    let bonus = score_bonus(host, nanny);

    let total = core.points + skills.points + values.points + bonus.points;

    MatchScore {
        total,
        core,
        skills,
        values,
        bonus,
    }
}

/// Core (max 40): location, start date, accommodation, day overlap and
/// age-group coverage. Components are additive and independent; a
/// location mismatch does not zero out date compatibility.
fn score_core(host: &Host, nanny: &Nanny) -> SectionScore {
    let mut points = 0.0;
    let mut details: Vec<String> = Vec::new();

    let location = evaluate_location(host, nanny);
    match location.level {
        LocationMatch::Exact => {
            points += LOCATION_EXACT_POINTS;
            details.push(location.details);
        }
        LocationMatch::Partial => {
            points += LOCATION_PARTIAL_POINTS;
            details.push(location.details);
        }
        LocationMatch::Unknown | LocationMatch::Mismatch => details.push(location.details),
    }

    if start_dates_compatible(host.desired_start_date, nanny.available_start_date) {
        points += START_DATE_POINTS;
        details.push("start date compatible".into());
    } else {
        details.push("start date incompatible".into());
    }

    if accommodation_compatible(host.accommodation, nanny.accommodation) {
        points += ACCOMMODATION_POINTS;
        details.push("accommodation compatible".into());
    } else {
        details.push("accommodation incompatible".into());
    }

    let (day_points, day_detail) = score_day_overlap(host, nanny);
    points += day_points;
    details.push(day_detail);

    let (age_points, age_detail) = score_age_groups(host, nanny);
    points += age_points;
    details.push(age_detail);

    SectionScore {
        points: points.clamp(0.0, CORE_MAX),
        max_points: CORE_MAX,
        details: details.join(" / "),
    }
}

fn accommodation_compatible(
    host: Option<Accommodation>,
    nanny: Option<Accommodation>,
) -> bool {
    match (host, nanny) {
        (Some(Accommodation::Either), _) | (_, Some(Accommodation::Either)) => true,
        (Some(required), Some(offered)) => required == offered,
        _ => true,
    }
}

/// Up to 10 points, proportional to shared days over required days.
/// A host with no required days takes the full component.
fn score_day_overlap(host: &Host, nanny: &Nanny) -> (f64, String) {
    if host.required_days.is_empty() {
        return (DAY_OVERLAP_MAX, "no required days".into());
    }

    let available: Vec<String> = nanny
        .available_days
        .iter()
        .map(|d| d.trim().to_lowercase())
        .collect();
    let matched = host
        .required_days
        .iter()
        .filter(|day| available.contains(&day.trim().to_lowercase()))
        .count();

    let ratio = matched as f64 / host.required_days.len() as f64;
    (
        DAY_OVERLAP_MAX * ratio,
        format!("{matched}/{} required days covered", host.required_days.len()),
    )
}

/// Up to 10 points. Full coverage scores the full component; partial
/// coverage scales by matched/required. No requirement scores full.
fn score_age_groups(host: &Host, nanny: &Nanny) -> (f64, String) {
    if host.required_age_groups.is_empty() {
        return (AGE_GROUP_MAX, "no required age groups".into());
    }

    let matched = host
        .required_age_groups
        .iter()
        .filter(|group| {
            let wanted = group.trim().to_lowercase();
            nanny.age_group_experience.iter().any(|have| {
                let have = have.trim().to_lowercase();
                have == wanted || have.contains(&wanted) || wanted.contains(&have)
            })
        })
        .count();

    let ratio = matched as f64 / host.required_age_groups.len() as f64;
    (
        AGE_GROUP_MAX * ratio,
        format!(
            "{matched}/{} age groups covered",
            host.required_age_groups.len()
        ),
    )
}

/// Skills (max 20): proportion of the host's required skill flags the
/// nanny offers. A host requiring none of the five tracked skills takes
/// the full section; an unexpressed preference is never penalized.
fn score_skills(host: &Host, nanny: &Nanny) -> SectionScore {
    let required = host.required_skills.count();
    if required == 0 {
        return SectionScore {
            points: SKILLS_MAX,
            max_points: SKILLS_MAX,
            details: "no required skills".into(),
        };
    }

    let matched = nanny.offered_skills.covered(&host.required_skills);
    let points = SKILLS_MAX * matched as f64 / required as f64;

    SectionScore {
        points: points.clamp(0.0, SKILLS_MAX),
        max_points: SKILLS_MAX,
        details: format!("{matched}/{required} required skills offered"),
    }
}

fn lifestyle_alignment(host: Option<&str>, nanny: Option<&str>) -> f64 {
    match (host, nanny) {
        (Some(a), Some(b)) if a.trim().eq_ignore_ascii_case(b.trim()) => VALUES_EXACT_POINTS,
        (Some(_), Some(_)) => VALUES_PARTIAL_POINTS,
        _ => 0.0,
    }
}

/// Values (max 20, floor 0): parenting style, pets, smoking, religion.
/// The smoking conflict is the one component that can go negative, so
/// the section result is clamped at zero.
fn score_values(host: &Host, nanny: &Nanny) -> SectionScore {
    let mut points = 0.0;
    let mut details: Vec<String> = Vec::new();

    let parenting = lifestyle_alignment(
        host.parenting_style.as_deref(),
        nanny.parenting_style.as_deref(),
    );
    if parenting > 0.0 {
        details.push(format!("parenting alignment +{parenting}"));
    }
    points += parenting;

    if let (Some(pets), Some(tolerance)) = (host.pets.as_deref(), nanny.pet_tolerance.as_deref()) {
        if pets.trim().eq_ignore_ascii_case(tolerance.trim()) {
            points += VALUES_EXACT_POINTS;
            details.push("pet tolerance match".into());
        }
    }

    match (host.smoking_policy, nanny.smokes) {
        (Some(SmokingPolicy::NoSmoking), Some(true)) => {
            points += SMOKING_CONFLICT_PENALTY;
            details.push("smoking conflict".into());
        }
        (Some(_), Some(false)) => {
            points += SMOKING_COMPATIBLE_POINTS;
            details.push("smoking compatible".into());
        }
        _ => {}
    }

    let religion = lifestyle_alignment(host.religion.as_deref(), nanny.religion.as_deref());
    if religion > 0.0 {
        details.push(format!("religious alignment +{religion}"));
    }
    points += religion;

    SectionScore {
        points: points.clamp(0.0, VALUES_MAX),
        max_points: VALUES_MAX,
        details: if details.is_empty() {
            "no declared values".into()
        } else {
            details.join(" / ")
        },
    }
}

/// Bonus (max 20): required language found in the nanny's language
/// skills, salary information present on both sides, and the badge.
fn score_bonus(host: &Host, nanny: &Nanny) -> SectionScore {
    let mut points = 0.0;
    let mut details: Vec<String> = Vec::new();

    if let Some(language) = host.primary_language.as_deref() {
        let wanted = language.trim().to_lowercase();
        if !wanted.is_empty()
            && nanny
                .languages
                .iter()
                .any(|spoken| spoken.to_lowercase().contains(&wanted))
        {
            points += LANGUAGE_BONUS;
            details.push(format!("speaks required language {language}"));
        }
    }

    // TODO: compare the actual salary ranges once the onboarding form
    // captures structured numbers; today both sides are free text so
    // this stays a presence check.
    if host.salary_range.as_deref().is_some_and(|s| !s.trim().is_empty())
        && nanny
            .expected_salary
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty())
    {
        points += SALARY_PRESENCE_BONUS;
        details.push("salary information on both sides".into());
    }

    match nanny.badge {
        Some(NannyBadge::Certified) => {
            points += BADGE_CERTIFIED_BONUS;
            details.push("certified badge".into());
        }
        Some(NannyBadge::Verified) => {
            points += BADGE_VERIFIED_BONUS;
            details.push("verified badge".into());
        }
        Some(NannyBadge::Basic) | None => {}
    }

    SectionScore {
        points: points.clamp(0.0, BONUS_MAX),
        max_points: BONUS_MAX,
        details: if details.is_empty() {
            "no bonus factors".into()
        } else {
            details.join(" / ")
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SkillSet;
    use chrono::NaiveDate;

    fn full_host() -> Host {
        Host {
            location: Some("London".into()),
            desired_start_date: NaiveDate::from_ymd_opt(2025, 6, 1),
            accommodation: Some(Accommodation::LiveIn),
            required_days: vec!["Monday".into(), "Tuesday".into()],
            required_age_groups: vec!["Toddler".into()],
            required_skills: SkillSet {
                cooking: true,
                driving: true,
                ..SkillSet::default()
            },
            parenting_style: Some("Gentle".into()),
            pets: Some("Dogs".into()),
            smoking_policy: Some(SmokingPolicy::NoSmoking),
            religion: Some("None".into()),
            primary_language: Some("French".into()),
            salary_range: Some("400-500/week".into()),
            ..Host::default()
        }
    }

    fn full_nanny() -> Nanny {
        Nanny {
            badge: Some(NannyBadge::Certified),
            location: Some("London".into()),
            available_start_date: NaiveDate::from_ymd_opt(2025, 5, 1),
            accommodation: Some(Accommodation::LiveIn),
            available_days: vec!["Monday".into(), "Tuesday".into(), "Friday".into()],
            age_group_experience: vec!["Toddler".into()],
            offered_skills: SkillSet {
                cooking: true,
                driving: true,
                tutoring: true,
                ..SkillSet::default()
            },
            parenting_style: Some("gentle".into()),
            pet_tolerance: Some("Dogs".into()),
            smokes: Some(false),
            religion: Some("none".into()),
            languages: vec!["English".into(), "French".into()],
            expected_salary: Some("450/week".into()),
            ..Nanny::default()
        }
    }

    #[test]
    fn perfect_pair_reaches_every_ceiling() {
        let score = compute_match_score(&full_host(), &full_nanny());

        assert_eq!(score.core.points, CORE_MAX);
        assert_eq!(score.skills.points, SKILLS_MAX);
        assert_eq!(score.values.points, VALUES_MAX);
        assert_eq!(score.bonus.points, BONUS_MAX);
        assert_eq!(score.total, 100.0);
    }

    #[test]
    fn sections_stay_within_bounds_for_empty_profiles() {
        let score = compute_match_score(&Host::default(), &Nanny::default());

        assert!(score.core.points >= 0.0 && score.core.points <= CORE_MAX);
        assert!(score.skills.points >= 0.0 && score.skills.points <= SKILLS_MAX);
        assert!(score.values.points >= 0.0 && score.values.points <= VALUES_MAX);
        assert!(score.bonus.points >= 0.0 && score.bonus.points <= BONUS_MAX);
        assert_eq!(
            score.total,
            score.core.points + score.skills.points + score.values.points + score.bonus.points
        );
    }

    #[test]
    fn skills_default_to_full_when_host_requires_none() {
        let mut host = full_host();
        host.required_skills = SkillSet::default();

        let score = compute_match_score(&host, &Nanny::default());
        assert_eq!(score.skills.points, SKILLS_MAX);
    }

    #[test]
    fn skills_scale_with_matched_fraction() {
        let mut host = full_host();
        host.required_skills = SkillSet {
            cooking: true,
            driving: true,
            housekeeping: true,
            travel_assistance: true,
            ..SkillSet::default()
        };
        let mut nanny = full_nanny();
        nanny.offered_skills = SkillSet {
            cooking: true,
            ..SkillSet::default()
        };

        let score = compute_match_score(&host, &nanny);
        assert_eq!(score.skills.points, SKILLS_MAX * 0.25);
    }

    #[test]
    fn partial_day_overlap_is_proportional() {
        // Host requires Saturday and Sunday, nanny offers Saturday only:
        // the day component is 10 * (1/2) = 5.
        let host = Host {
            required_days: vec!["Saturday".into(), "Sunday".into()],
            ..Host::default()
        };
        let nanny = Nanny {
            available_days: vec!["Saturday".into()],
            ..Nanny::default()
        };

        assert!(passes_day_overlap(&host, &nanny));
        let (points, _) = score_day_overlap(&host, &nanny);
        assert_eq!(points, 5.0);
    }

    fn passes_day_overlap(host: &Host, nanny: &Nanny) -> bool {
        crate::matching::must_match::passes_must_match_filters(host, nanny)
    }

    #[test]
    fn location_mismatch_does_not_zero_date_compatibility() {
        let mut host = full_host();
        host.location = Some("Berlin".into());
        host.country = Some("Germany".into());
        let mut nanny = full_nanny();
        nanny.location = Some("Madrid".into());
        nanny.country = Some("Spain".into());

        let score = compute_match_score(&host, &nanny);
        // Everything but the 10 location points survives.
        assert_eq!(score.core.points, CORE_MAX - LOCATION_EXACT_POINTS);
    }

    #[test]
    fn smoking_conflict_can_push_values_down_but_not_negative() {
        let host = Host {
            smoking_policy: Some(SmokingPolicy::NoSmoking),
            ..Host::default()
        };
        let nanny = Nanny {
            smokes: Some(true),
            ..Nanny::default()
        };

        let score = compute_match_score(&host, &nanny);
        assert_eq!(score.values.points, 0.0);
    }

    #[test]
    fn lifestyle_mismatch_with_both_present_earns_partial_credit() {
        let host = Host {
            parenting_style: Some("Gentle".into()),
            religion: Some("Catholic".into()),
            ..Host::default()
        };
        let nanny = Nanny {
            parenting_style: Some("Structured".into()),
            religion: Some("Muslim".into()),
            ..Nanny::default()
        };

        let score = compute_match_score(&host, &nanny);
        assert_eq!(score.values.points, VALUES_PARTIAL_POINTS * 2.0);
    }

    #[test]
    fn salary_bonus_is_a_presence_check_only() {
        let host = Host {
            salary_range: Some("anything".into()),
            ..Host::default()
        };
        let nanny = Nanny {
            expected_salary: Some("way out of range".into()),
            ..Nanny::default()
        };

        let score = compute_match_score(&host, &nanny);
        assert_eq!(score.bonus.points, SALARY_PRESENCE_BONUS);
    }

    #[test]
    fn badge_bonus_ladder() {
        let host = Host::default();

        let mut nanny = Nanny::default();
        nanny.badge = Some(NannyBadge::Certified);
        assert_eq!(compute_match_score(&host, &nanny).bonus.points, BADGE_CERTIFIED_BONUS);

        nanny.badge = Some(NannyBadge::Verified);
        assert_eq!(compute_match_score(&host, &nanny).bonus.points, BADGE_VERIFIED_BONUS);

        nanny.badge = Some(NannyBadge::Basic);
        assert_eq!(compute_match_score(&host, &nanny).bonus.points, 0.0);
    }

    #[test]
    fn language_match_is_substring_based() {
        let host = Host {
            primary_language: Some("French".into()),
            ..Host::default()
        };
        let nanny = Nanny {
            languages: vec!["Fluent french, some Spanish".into()],
            ..Nanny::default()
        };

        let score = compute_match_score(&host, &nanny);
        assert_eq!(score.bonus.points, LANGUAGE_BONUS);
    }
}
