/// Section maxima for the weighted score. The four sections are
/// independent and sum to the 0-100 total.
pub const CORE_MAX: f64 = 40.0;
pub const SKILLS_MAX: f64 = 20.0;
pub const VALUES_MAX: f64 = 20.0;
pub const BONUS_MAX: f64 = 20.0;

// Core section components (sum to CORE_MAX when everything matches).
pub const LOCATION_EXACT_POINTS: f64 = 10.0;
pub const LOCATION_PARTIAL_POINTS: f64 = 7.0;
pub const START_DATE_POINTS: f64 = 5.0;
pub const ACCOMMODATION_POINTS: f64 = 5.0;
pub const DAY_OVERLAP_MAX: f64 = 10.0;
pub const AGE_GROUP_MAX: f64 = 10.0;

// Values section components. The section is clamped to [0, VALUES_MAX]
// because the smoking conflict can push it negative.
pub const VALUES_EXACT_POINTS: f64 = 5.0;
pub const VALUES_PARTIAL_POINTS: f64 = 2.0;
pub const SMOKING_COMPATIBLE_POINTS: f64 = 5.0;
pub const SMOKING_CONFLICT_PENALTY: f64 = -5.0;

// Bonus section components.
pub const LANGUAGE_BONUS: f64 = 10.0;
pub const SALARY_PRESENCE_BONUS: f64 = 5.0;
pub const BADGE_CERTIFIED_BONUS: f64 = 5.0;
pub const BADGE_VERIFIED_BONUS: f64 = 3.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_components_sum_to_core_max() {
        let full = LOCATION_EXACT_POINTS
            + START_DATE_POINTS
            + ACCOMMODATION_POINTS
            + DAY_OVERLAP_MAX
            + AGE_GROUP_MAX;
        assert!((full - CORE_MAX).abs() < f64::EPSILON);
    }

    #[test]
    fn sections_sum_to_one_hundred() {
        assert!((CORE_MAX + SKILLS_MAX + VALUES_MAX + BONUS_MAX - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn bonus_components_fit_inside_bonus_max() {
        assert!(LANGUAGE_BONUS + SALARY_PRESENCE_BONUS + BADGE_CERTIFIED_BONUS <= BONUS_MAX);
    }
}
