use tracing::instrument;

use super::client::{ProfileStore, StoreError, StoreRecord};
use crate::{Accommodation, Host, HostTier, SkillSet, SmokingPolicy};

pub const HOSTS_TABLE: &str = "Hosts";

/// Fetch the canonical host record by id.
#[instrument(skip(store))]
pub async fn fetch_host(store: &ProfileStore, host_id: &str) -> Result<Host, StoreError> {
    let record = store.get_record(HOSTS_TABLE, host_id).await?;
    Ok(map_host(&record))
}

fn map_host(record: &StoreRecord) -> Host {
    let f = &record.fields;

    Host {
        id: Some(record.id.clone()),
        name: f.string("Name"),
        email: f.string("Email"),
        tier: f.str("Tier").map(HostTier::parse).unwrap_or_default(),
        location: f.string("Location"),
        job_location: f.string("Job Location"),
        country: f.string("Country"),
        desired_start_date: f.date("Desired Start Date"),
        accommodation: f.str("Accommodation").and_then(Accommodation::parse),
        required_days: f.string_list("Required Days"),
        required_age_groups: f.string_list("Required Age Groups"),
        requires_special_needs: f.bool_flag("Special Needs Required"),
        required_skills: SkillSet {
            cooking: f.bool_flag("Needs Cooking"),
            tutoring: f.bool_flag("Needs Tutoring"),
            driving: f.bool_flag("Needs Driving"),
            travel_assistance: f.bool_flag("Needs Travel Assistance"),
            housekeeping: f.bool_flag("Needs Housekeeping"),
        },
        parenting_style: f.string("Parenting Style"),
        pets: f.string("Pets"),
        smoking_policy: f.str("Smoking Policy").and_then(SmokingPolicy::parse),
        religion: f.string("Religion"),
        primary_language: f.string("Primary Language"),
        salary_range: f.string("Salary Range"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(fields: serde_json::Value) -> StoreRecord {
        serde_json::from_value(json!({"id": "recHost1", "fields": fields})).unwrap()
    }

    #[test]
    fn maps_a_complete_record() {
        let host = map_host(&record(json!({
            "Name": "The Walker Family",
            "Tier": "VIP",
            "Location": "London",
            "Desired Start Date": "2025-06-01",
            "Accommodation": "Live-in",
            "Required Days": ["Monday", "Tuesday"],
            "Required Age Groups": ["Toddler"],
            "Special Needs Required": true,
            "Needs Cooking": true,
            "Needs Driving": true,
            "Smoking Policy": "No smoking",
            "Primary Language": "French",
        })));

        assert_eq!(host.id.as_deref(), Some("recHost1"));
        assert_eq!(host.tier, HostTier::Vip);
        assert_eq!(host.accommodation, Some(Accommodation::LiveIn));
        assert_eq!(host.required_days.len(), 2);
        assert!(host.requires_special_needs);
        assert!(host.required_skills.cooking);
        assert!(host.required_skills.driving);
        assert!(!host.required_skills.tutoring);
        assert_eq!(host.smoking_policy, Some(SmokingPolicy::NoSmoking));
    }

    #[test]
    fn sparse_records_map_to_permissive_defaults() {
        let host = map_host(&record(json!({})));

        assert_eq!(host.tier, HostTier::Standard);
        assert_eq!(host.desired_start_date, None);
        assert!(host.required_days.is_empty());
        assert!(!host.requires_special_needs);
        assert_eq!(host.required_skills.count(), 0);
    }
}
