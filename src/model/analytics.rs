use crate::model::Amount;
use serde::{Deserialize, Serialize};

/// Totals across all of the user's transactions, computed by the server.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_income: Amount,
    pub total_expense: Amount,
    pub savings: Amount,
}

/// The total spent in one category.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    #[serde(alias = "_id")]
    pub category: String,
    pub total: Amount,
}

/// Income and expense for one month. `month` is 1 for January through 12 for December.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTotal {
    #[serde(alias = "_id")]
    pub month: u32,
    pub income: Amount,
    pub expense: Amount,
}

impl MonthlyTotal {
    /// The label used on the trend chart, e.g. `M3`.
    pub fn label(&self) -> String {
        format!("M{}", self.month)
    }
}

/// Ordered per-category totals.
pub type CategoryBreakdown = Vec<CategoryTotal>;

/// Ordered per-month totals.
pub type MonthlyTrend = Vec<MonthlyTotal>;

/// Everything the dashboard shows. Replaced as a whole, never field by field.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    pub summary: AnalyticsSummary,
    pub by_category: CategoryBreakdown,
    pub monthly_trend: MonthlyTrend,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_summary_from_api_json() {
        let json = r#"{"totalIncome": 50000, "totalExpense": 12345.5, "savings": 37654.5}"#;
        let summary: AnalyticsSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.total_income, Amount::from_str("50000").unwrap());
        assert_eq!(summary.total_expense, Amount::from_str("12345.5").unwrap());
        assert_eq!(summary.savings, Amount::from_str("37654.5").unwrap());
    }

    #[test]
    fn test_monthly_trend_from_api_json() {
        let json = r#"[{"month": 1, "income": 100, "expense": 40}, {"month": 2, "income": 0, "expense": 15.25}]"#;
        let trend: MonthlyTrend = serde_json::from_str(json).unwrap();
        assert_eq!(trend.len(), 2);
        assert_eq!(trend[1].label(), "M2");
        assert_eq!(trend[1].expense, Amount::from_str("15.25").unwrap());
    }

    #[test]
    fn test_breakdown_accepts_underscore_id() {
        let json = r#"[{"_id": "Food", "total": 320}]"#;
        let breakdown: CategoryBreakdown = serde_json::from_str(json).unwrap();
        assert_eq!(breakdown[0].category, "Food");
    }
}
