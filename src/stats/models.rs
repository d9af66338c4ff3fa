use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-user aggregate statistics, one singleton document per user.
///
/// The camelCase field names are the persisted wire contract with the
/// document store; missing fields deserialize to their zero values so
/// partially-written legacy documents stay readable.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatsSummary {
    pub total_items: i64,
    pub completed_items: i64,
    pub average_rating: f64,
    /// Completions bucketed by ISO year-week key, e.g. "2025-W10".
    pub counts_by_week: BTreeMap<String, i64>,
    /// Item counts per media type key ("movie" / "tv" / "book").
    pub counts_by_type: BTreeMap<String, i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_with_wire_contract_field_names() {
        let mut summary = StatsSummary::default();
        summary.total_items = 2;
        summary.completed_items = 1;
        summary.average_rating = 7.5;
        summary.counts_by_week.insert("2025-W12".to_string(), 1);
        summary.counts_by_type.insert("movie".to_string(), 2);

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(
            value,
            json!({
                "totalItems": 2,
                "completedItems": 1,
                "averageRating": 7.5,
                "countsByWeek": {"2025-W12": 1},
                "countsByType": {"movie": 2},
            })
        );
    }

    #[test]
    fn missing_fields_deserialize_to_zero_values() {
        let summary: StatsSummary = serde_json::from_value(json!({"totalItems": 3})).unwrap();
        assert_eq!(summary.total_items, 3);
        assert_eq!(summary.completed_items, 0);
        assert_eq!(summary.average_rating, 0.0);
        assert!(summary.counts_by_week.is_empty());
        assert!(summary.counts_by_type.is_empty());
    }
}
