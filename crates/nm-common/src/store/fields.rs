use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::date::parse_flexible_date;

/// The loose key-value payload of a store record. All typed reads go
/// through this adapter so the matching and lifecycle code never touches
/// raw JSON: a field that is absent, null, or the wrong shape reads as
/// missing rather than erroring.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Fields(pub Map<String, Value>);

impl Fields {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn string(&self, name: &str) -> Option<String> {
        self.str(name).map(str::to_string)
    }

    pub fn bool_flag(&self, name: &str) -> bool {
        match self.get(name) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => {
                let s = s.trim();
                s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("yes") || s == "1"
            }
            _ => false,
        }
    }

    pub fn opt_bool(&self, name: &str) -> Option<bool> {
        match self.get(name) {
            Some(Value::Bool(b)) => Some(*b),
            Some(Value::String(s)) if !s.trim().is_empty() => Some(self.bool_flag(name)),
            _ => None,
        }
    }

    pub fn f64(&self, name: &str) -> Option<f64> {
        match self.get(name) {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn usize(&self, name: &str) -> Option<usize> {
        self.f64(name)
            .filter(|v| *v >= 0.0 && v.fract() == 0.0)
            .map(|v| v as usize)
    }

    /// Multi-select fields arrive as string arrays; older records hold a
    /// comma-separated string. Both read the same way.
    pub fn string_list(&self, name: &str) -> Vec<String> {
        match self.get(name) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            Some(Value::String(s)) => s
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn date(&self, name: &str) -> Option<NaiveDate> {
        self.str(name).and_then(parse_flexible_date)
    }

    pub fn datetime(&self, name: &str) -> Option<DateTime<Utc>> {
        self.str(name)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|ts| ts.with_timezone(&Utc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn blank_strings_read_as_missing() {
        let f = fields(json!({"Location": "  ", "Country": "France"}));
        assert_eq!(f.str("Location"), None);
        assert_eq!(f.str("Country"), Some("France"));
        assert_eq!(f.str("Absent"), None);
    }

    #[test]
    fn bool_flags_accept_checkbox_and_text_shapes() {
        let f = fields(json!({"A": true, "B": "Yes", "C": "no", "D": 1}));
        assert!(f.bool_flag("A"));
        assert!(f.bool_flag("B"));
        assert!(!f.bool_flag("C"));
        assert!(!f.bool_flag("D"));
        assert_eq!(f.opt_bool("C"), Some(false));
        assert_eq!(f.opt_bool("Absent"), None);
    }

    #[test]
    fn string_lists_accept_arrays_and_comma_text() {
        let f = fields(json!({
            "Days": ["Monday", " Tuesday ", ""],
            "Legacy": "Saturday, Sunday",
        }));
        assert_eq!(f.string_list("Days"), vec!["Monday", "Tuesday"]);
        assert_eq!(f.string_list("Legacy"), vec!["Saturday", "Sunday"]);
        assert!(f.string_list("Absent").is_empty());
    }

    #[test]
    fn numbers_read_from_either_shape() {
        let f = fields(json!({"Score": 72.5, "Index": "3"}));
        assert_eq!(f.f64("Score"), Some(72.5));
        assert_eq!(f.usize("Index"), Some(3));
        assert_eq!(f.usize("Score"), None);
    }

    #[test]
    fn malformed_dates_read_as_missing() {
        let f = fields(json!({"Start": "2025-06-01", "Bad": "whenever"}));
        assert!(f.date("Start").is_some());
        assert_eq!(f.date("Bad"), None);
    }
}
