use tracing::instrument;

use super::client::{formula_text, ProfileStore, StoreError, StoreRecord};
use crate::{Accommodation, Nanny, NannyBadge, SkillSet};

pub const NANNIES_TABLE: &str = "Nannies";

#[instrument(skip(store))]
pub async fn fetch_nanny(store: &ProfileStore, nanny_id: &str) -> Result<Nanny, StoreError> {
    let record = store.get_record(NANNIES_TABLE, nanny_id).await?;
    Ok(map_nanny(&record))
}

/// Fetch the candidate pool for a set of badges, e.g. the VIP pool
/// `[Certified, Verified, Basic]`. Pool-assembly order is preserved:
/// records come back grouped by badge in the order given.
#[instrument(skip(store))]
pub async fn list_nannies_by_badges(
    store: &ProfileStore,
    badges: &[NannyBadge],
) -> Result<Vec<Nanny>, StoreError> {
    if badges.is_empty() {
        return Ok(Vec::new());
    }

    let clauses: Vec<String> = badges
        .iter()
        .map(|badge| format!("{{Badge}} = {}", formula_text(badge.as_str())))
        .collect();
    let formula = if clauses.len() == 1 {
        clauses.into_iter().next().unwrap_or_default()
    } else {
        format!("OR({})", clauses.join(", "))
    };

    let records = store.list_records(NANNIES_TABLE, Some(&formula)).await?;
    let mut nannies: Vec<Nanny> = records.iter().map(map_nanny).collect();

    nannies.sort_by_key(|nanny| {
        badges
            .iter()
            .position(|badge| nanny.badge == Some(*badge))
            .unwrap_or(badges.len())
    });

    Ok(nannies)
}

fn map_nanny(record: &StoreRecord) -> Nanny {
    let f = &record.fields;

    Nanny {
        id: Some(record.id.clone()),
        name: f.string("Name"),
        email: f.string("Email"),
        badge: f.str("Badge").and_then(NannyBadge::parse),
        location: f.string("Location"),
        current_location: f.string("Current Location"),
        country: f.string("Country"),
        available_start_date: f.date("Available Start Date"),
        accommodation: f.str("Accommodation").and_then(Accommodation::parse),
        available_days: f.string_list("Available Days"),
        age_group_experience: f.string_list("Age Group Experience"),
        special_needs_experience: f.bool_flag("Special Needs Experience"),
        offered_skills: SkillSet {
            cooking: f.bool_flag("Offers Cooking"),
            tutoring: f.bool_flag("Offers Tutoring"),
            driving: f.bool_flag("Offers Driving"),
            travel_assistance: f.bool_flag("Offers Travel Assistance"),
            housekeeping: f.bool_flag("Offers Housekeeping"),
        },
        parenting_style: f.string("Parenting Style"),
        pet_tolerance: f.string("Pet Tolerance"),
        smokes: f.opt_bool("Smokes"),
        religion: f.string("Religion"),
        languages: f.string_list("Languages"),
        expected_salary: f.string("Expected Salary"),
    }
}
