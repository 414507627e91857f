use std::cmp::Ordering;

use super::must_match::{run_must_match_filters, MustMatchResult};
use super::scoring::{compute_match_score, MatchScore};
use crate::{Host, HostTier, Nanny, NannyBadge};

/// Candidate pool per host tier, in pool-assembly priority order.
/// Certified nannies are reserved for VIP hosts.
pub const VIP_POOL: &[NannyBadge] = &[
    NannyBadge::Certified,
    NannyBadge::Verified,
    NannyBadge::Basic,
];
pub const STANDARD_POOL: &[NannyBadge] = &[NannyBadge::Verified, NannyBadge::Basic];

/// Tiebreak priority when totals are equal.
pub fn badge_priority(badge: Option<NannyBadge>) -> u8 {
    match badge {
        Some(NannyBadge::Certified) => 3,
        Some(NannyBadge::Verified) => 2,
        Some(NannyBadge::Basic) => 1,
        None => 0,
    }
}

#[derive(Debug, Clone)]
pub struct SelectionConfig {
    /// Candidates scoring below this total are excluded.
    pub min_score: f64,
    /// Maximum candidates returned after ranking.
    pub max_candidates: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            min_score: 60.0,
            max_candidates: 100,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RankedCandidate {
    pub nanny: Nanny,
    pub score: MatchScore,
    pub filter: MustMatchResult,
}

pub struct MatchingEngine {
    config: SelectionConfig,
}

impl MatchingEngine {
    pub fn new(config: SelectionConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(SelectionConfig::default())
    }

    /// Badges admitted to the candidate pool for this tier.
    pub fn eligible_badges(tier: HostTier) -> &'static [NannyBadge] {
        match tier {
            HostTier::Vip => VIP_POOL,
            HostTier::Standard | HostTier::FastTrack => STANDARD_POOL,
        }
    }

    /// Filter, score and rank one candidate. `None` when the candidate
    /// fails a must-match filter, sits outside the tier pool, or scores
    /// below the minimum.
    pub fn evaluate_candidate(&self, host: &Host, nanny: &Nanny) -> Option<RankedCandidate> {
        let pool = Self::eligible_badges(host.tier);
        if !nanny.badge.is_some_and(|badge| pool.contains(&badge)) {
            return None;
        }

        let filter = run_must_match_filters(host, nanny);
        if !filter.passes() {
            return None;
        }

        let score = compute_match_score(host, nanny);
        if score.total < self.config.min_score {
            return None;
        }

        Some(RankedCandidate {
            nanny: nanny.clone(),
            score,
            filter,
        })
    }

    /// Rank the candidate nannies for a host: tier pool gate, must-match
    /// filters, scoring, minimum-score cut, then sort by total descending
    /// with badge priority as the tiebreak, truncated to the configured
    /// maximum.
    pub fn rank_candidates(&self, host: &Host, nannies: &[Nanny]) -> Vec<RankedCandidate> {
        let mut ranked: Vec<_> = nannies
            .iter()
            .filter_map(|nanny| self.evaluate_candidate(host, nanny))
            .collect();

        ranked.sort_by(|a, b| {
            match b
                .score
                .total
                .partial_cmp(&a.score.total)
                .unwrap_or(Ordering::Equal)
            {
                Ordering::Equal => {
                    badge_priority(b.nanny.badge).cmp(&badge_priority(a.nanny.badge))
                }
                other => other,
            }
        });
        ranked.truncate(self.config.max_candidates);
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Accommodation, SkillSet};
    use chrono::NaiveDate;

    fn base_host() -> Host {
        Host {
            tier: HostTier::Standard,
            location: Some("London".into()),
            desired_start_date: NaiveDate::from_ymd_opt(2025, 6, 1),
            accommodation: Some(Accommodation::Either),
            required_days: vec!["Monday".into()],
            required_age_groups: vec!["Toddler".into()],
            required_skills: SkillSet {
                cooking: true,
                ..SkillSet::default()
            },
            primary_language: Some("English".into()),
            ..Host::default()
        }
    }

    fn base_nanny(badge: NannyBadge) -> Nanny {
        Nanny {
            badge: Some(badge),
            location: Some("London".into()),
            available_start_date: NaiveDate::from_ymd_opt(2025, 5, 1),
            available_days: vec!["Monday".into()],
            age_group_experience: vec!["Toddler".into()],
            offered_skills: SkillSet {
                cooking: true,
                ..SkillSet::default()
            },
            languages: vec!["English".into()],
            ..Nanny::default()
        }
    }

    #[test]
    fn certified_nannies_are_excluded_from_non_vip_pools() {
        let engine = MatchingEngine::with_defaults();
        let host = base_host();

        let ranked = engine.rank_candidates(
            &host,
            &[base_nanny(NannyBadge::Certified), base_nanny(NannyBadge::Verified)],
        );

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].nanny.badge, Some(NannyBadge::Verified));
    }

    #[test]
    fn vip_pool_spans_all_badges() {
        let engine = MatchingEngine::with_defaults();
        let mut host = base_host();
        host.tier = HostTier::Vip;

        let ranked = engine.rank_candidates(
            &host,
            &[
                base_nanny(NannyBadge::Certified),
                base_nanny(NannyBadge::Verified),
                base_nanny(NannyBadge::Basic),
            ],
        );

        assert_eq!(ranked.len(), 3);
    }

    #[test]
    fn filter_failures_are_excluded_before_scoring() {
        let engine = MatchingEngine::with_defaults();
        let mut incompatible = base_nanny(NannyBadge::Verified);
        incompatible.available_days = vec!["Saturday".into()];

        let ranked = engine.rank_candidates(
            &base_host(),
            &[base_nanny(NannyBadge::Verified), incompatible],
        );

        assert_eq!(ranked.len(), 1);
    }

    #[test]
    fn low_scores_are_cut_at_the_minimum() {
        let engine = MatchingEngine::new(SelectionConfig {
            min_score: 99.0,
            max_candidates: 10,
        });

        let ranked = engine.rank_candidates(&base_host(), &[base_nanny(NannyBadge::Verified)]);
        assert!(ranked.is_empty());
    }

    #[test]
    fn output_is_sorted_descending_with_badge_tiebreak() {
        let engine = MatchingEngine::with_defaults();
        let mut host = base_host();
        host.tier = HostTier::Vip;

        // Identical profiles, so totals differ only by the badge bonus and
        // the tiebreak kicks in between equal-scoring pairs.
        let nannies = vec![
            base_nanny(NannyBadge::Basic),
            base_nanny(NannyBadge::Certified),
            base_nanny(NannyBadge::Verified),
            base_nanny(NannyBadge::Basic),
        ];

        let ranked = engine.rank_candidates(&host, &nannies);
        assert_eq!(ranked.len(), 4);
        assert!(ranked
            .windows(2)
            .all(|w| w[0].score.total >= w[1].score.total));
        assert!(ranked
            .windows(2)
            .all(|w| w[0].score.total > w[1].score.total
                || badge_priority(w[0].nanny.badge) >= badge_priority(w[1].nanny.badge)));
        assert_eq!(ranked[0].nanny.badge, Some(NannyBadge::Certified));
    }

    #[test]
    fn truncates_to_max_candidates() {
        let engine = MatchingEngine::new(SelectionConfig {
            min_score: 0.0,
            max_candidates: 2,
        });

        let nannies = vec![
            base_nanny(NannyBadge::Verified),
            base_nanny(NannyBadge::Verified),
            base_nanny(NannyBadge::Verified),
        ];

        let ranked = engine.rank_candidates(&base_host(), &nannies);
        assert_eq!(ranked.len(), 2);
    }

    #[test]
    fn unbadged_nannies_never_enter_a_pool() {
        let engine = MatchingEngine::new(SelectionConfig {
            min_score: 0.0,
            max_candidates: 10,
        });
        let mut unbadged = base_nanny(NannyBadge::Verified);
        unbadged.badge = None;

        let ranked = engine.rank_candidates(&base_host(), &[unbadged]);
        assert!(ranked.is_empty());
    }
}
