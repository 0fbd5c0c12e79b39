//! Shared transport-layer types for the placement tracking API.
//! These structs are produced by the statistics and import endpoints and
//! consumed by the integration tests, so they live outside the binary crate.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Number of placement progress records currently in one status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StatusCount {
    pub status: String,
    pub count: u64,
}

/// Number of placed students in one academic branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BranchCount {
    pub branch: String,
    pub count: u64,
}

/// Aggregate placement statistics, computed on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PlacementStatistics {
    pub total_students: u64,
    pub placed_students: u64,
    /// `placed / total * 100`, rounded to two decimals; 0 when there are no
    /// students.
    pub placement_percentage: f64,
    /// Count of active companies only.
    pub total_companies: u64,
    pub total_applications: u64,
    pub offers_received: u64,
    pub offers_accepted: u64,
    /// Mean package across accepted-offer applications, two decimals.
    pub average_package: Decimal,
    pub status_breakdown: Vec<StatusCount>,
    pub branch_wise_placement: Vec<BranchCount>,
}

/// Outcome of a bulk CSV student import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ImportSummary {
    pub created: u64,
    pub updated: u64,
    /// One "Row N: ..." message per failed row; failures never abort the
    /// batch.
    pub errors: Vec<String>,
}

impl ImportSummary {
    pub fn new() -> Self {
        Self {
            created: 0,
            updated: 0,
            errors: Vec::new(),
        }
    }
}

impl Default for ImportSummary {
    fn default() -> Self {
        Self::new()
    }
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Round a decimal to two places and pin its scale, so `9.1` and `9.10`
/// both serialize as `"9.10"`. SQLite drops trailing zeros on the round
/// trip, so response values are normalized through this.
pub fn two_places(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp(2);
    rounded.rescale(2);
    rounded
}

/// Placement percentage with the zero-student case defined as 0.
pub fn placement_percentage(placed: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round2(placed as f64 / total as f64 * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_of_zero_students_is_zero() {
        assert_eq!(placement_percentage(0, 0), 0.0);
    }

    #[test]
    fn percentage_rounds_to_two_decimals() {
        assert_eq!(placement_percentage(1, 3), 33.33);
        assert_eq!(placement_percentage(2, 3), 66.67);
        assert_eq!(placement_percentage(1, 2), 50.0);
        assert_eq!(placement_percentage(5, 5), 100.0);
    }

    #[test]
    fn round2_behaves_on_edges() {
        assert_eq!(round2(12.345), 12.35);
        assert_eq!(round2(12.344), 12.34);
        assert_eq!(round2(0.0), 0.0);
    }

    #[test]
    fn two_places_pins_the_scale() {
        assert_eq!(two_places(Decimal::new(91, 1)).to_string(), "9.10");
        assert_eq!(two_places(Decimal::new(12, 0)).to_string(), "12.00");
        assert_eq!(two_places(Decimal::new(12345, 3)).to_string(), "12.35");
        assert_eq!(two_places(Decimal::ZERO).to_string(), "0.00");
    }

    #[test]
    fn statistics_serialize_with_decimal_as_string() {
        let stats = PlacementStatistics {
            total_students: 10,
            placed_students: 4,
            placement_percentage: 40.0,
            total_companies: 3,
            total_applications: 12,
            offers_received: 5,
            offers_accepted: 4,
            average_package: Decimal::new(1250, 2),
            status_breakdown: vec![StatusCount {
                status: "APPLIED".to_string(),
                count: 7,
            }],
            branch_wise_placement: vec![BranchCount {
                branch: "CSE".to_string(),
                count: 3,
            }],
        };

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["average_package"], "12.50");
        assert_eq!(json["placement_percentage"], 40.0);
    }
}
