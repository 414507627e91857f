pub mod date;
pub mod lifecycle;
pub mod logging;
pub mod matching;
pub mod notify;
pub mod scheduling;
pub mod store;
pub mod token;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Service tier attached to a host family. Controls how wide the
/// candidate pool is during shortlist generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostTier {
    #[default]
    Standard,
    FastTrack,
    Vip,
}

impl HostTier {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "vip" => HostTier::Vip,
            "fast track" | "fast_track" | "fasttrack" => HostTier::FastTrack,
            _ => HostTier::Standard,
        }
    }
}

/// Vetting badge attached to a nanny. Doubles as a bonus-score factor
/// and as a pool-membership gate (Certified nannies are VIP-only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NannyBadge {
    Basic,
    Verified,
    Certified,
}

impl NannyBadge {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "basic" => Some(NannyBadge::Basic),
            "verified" => Some(NannyBadge::Verified),
            "certified" => Some(NannyBadge::Certified),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NannyBadge::Basic => "Basic",
            NannyBadge::Verified => "Verified",
            NannyBadge::Certified => "Certified",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accommodation {
    LiveIn,
    LiveOut,
    Either,
}

impl Accommodation {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "live-in" | "live in" | "livein" => Some(Accommodation::LiveIn),
            "live-out" | "live out" | "liveout" => Some(Accommodation::LiveOut),
            "either" => Some(Accommodation::Either),
            _ => None,
        }
    }
}

/// Household smoking policy as stated by the host. Anything present that
/// is not an explicit ban is treated as flexible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmokingPolicy {
    NoSmoking,
    Flexible,
}

impl SmokingPolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        let lowered = raw.trim().to_ascii_lowercase();
        if lowered.is_empty() {
            return None;
        }
        if lowered.contains("no") {
            Some(SmokingPolicy::NoSmoking)
        } else {
            Some(SmokingPolicy::Flexible)
        }
    }
}

/// The five skill flags tracked by the scoring engine. Used both as a
/// host requirement set and as a nanny offering set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillSet {
    pub cooking: bool,
    pub tutoring: bool,
    pub driving: bool,
    pub travel_assistance: bool,
    pub housekeeping: bool,
}

impl SkillSet {
    pub fn flags(&self) -> [(&'static str, bool); 5] {
        [
            ("cooking", self.cooking),
            ("tutoring", self.tutoring),
            ("driving", self.driving),
            ("travel_assistance", self.travel_assistance),
            ("housekeeping", self.housekeeping),
        ]
    }

    /// Number of flags that are set.
    pub fn count(&self) -> usize {
        self.flags().iter().filter(|(_, on)| *on).count()
    }

    /// Number of `required` flags also present in `self`.
    pub fn covered(&self, required: &SkillSet) -> usize {
        self.flags()
            .iter()
            .zip(required.flags().iter())
            .filter(|((_, offered), (_, wanted))| *wanted && *offered)
            .count()
    }
}

// Commonly used data models for the matching functions. All fields the
// onboarding forms may leave blank are optional; the engine treats
// missing data permissively rather than failing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Host {
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub tier: HostTier,
    pub location: Option<String>,
    pub job_location: Option<String>,
    pub country: Option<String>,
    pub desired_start_date: Option<NaiveDate>,
    pub accommodation: Option<Accommodation>,
    pub required_days: Vec<String>,
    pub required_age_groups: Vec<String>,
    pub requires_special_needs: bool,
    pub required_skills: SkillSet,
    pub parenting_style: Option<String>,
    pub pets: Option<String>,
    pub smoking_policy: Option<SmokingPolicy>,
    pub religion: Option<String>,
    pub primary_language: Option<String>,
    pub salary_range: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Nanny {
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub badge: Option<NannyBadge>,
    pub location: Option<String>,
    pub current_location: Option<String>,
    pub country: Option<String>,
    pub available_start_date: Option<NaiveDate>,
    pub accommodation: Option<Accommodation>,
    pub available_days: Vec<String>,
    pub age_group_experience: Vec<String>,
    pub special_needs_experience: bool,
    pub offered_skills: SkillSet,
    pub parenting_style: Option<String>,
    pub pet_tolerance: Option<String>,
    pub smokes: Option<bool>,
    pub religion: Option<String>,
    pub languages: Vec<String>,
    pub expected_salary: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_parsing_is_lenient() {
        assert_eq!(HostTier::parse("VIP"), HostTier::Vip);
        assert_eq!(HostTier::parse("Fast Track"), HostTier::FastTrack);
        assert_eq!(HostTier::parse("anything else"), HostTier::Standard);
    }

    #[test]
    fn badge_parsing_rejects_unknown_values() {
        assert_eq!(NannyBadge::parse("certified"), Some(NannyBadge::Certified));
        assert_eq!(NannyBadge::parse("gold"), None);
    }

    #[test]
    fn smoking_policy_reads_bans_from_text() {
        assert_eq!(SmokingPolicy::parse("No smoking"), Some(SmokingPolicy::NoSmoking));
        assert_eq!(SmokingPolicy::parse("Outdoors ok"), Some(SmokingPolicy::Flexible));
        assert_eq!(SmokingPolicy::parse("  "), None);
    }

    #[test]
    fn skill_set_coverage_counts_required_flags_only() {
        let required = SkillSet {
            cooking: true,
            driving: true,
            ..SkillSet::default()
        };
        let offered = SkillSet {
            cooking: true,
            tutoring: true,
            ..SkillSet::default()
        };

        assert_eq!(required.count(), 2);
        assert_eq!(offered.covered(&required), 1);
    }
}
