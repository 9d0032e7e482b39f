use serde::{Deserialize, Serialize};

/// Whether money came in or went out.
#[derive(
    Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    #[default]
    Expense,
}

serde_plain::derive_display_from_serialize!(TransactionType);
serde_plain::derive_fromstr_from_deserialize!(TransactionType);

/// The fixed set of categories a transaction can be filed under.
#[derive(
    Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Default, Serialize, Deserialize,
)]
pub enum Category {
    #[default]
    Food,
    Travel,
    Rent,
    Shopping,
    Entertainment,
    Misc,
    Income,
}

serde_plain::derive_display_from_serialize!(Category);
serde_plain::derive_fromstr_from_deserialize!(Category);

impl Category {
    /// All categories, in the order they are offered to the user.
    pub const ALL: [Category; 7] = [
        Category::Food,
        Category::Travel,
        Category::Rent,
        Category::Shopping,
        Category::Entertainment,
        Category::Misc,
        Category::Income,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_category_round_trips_through_display() {
        for category in Category::ALL {
            assert_eq!(Category::from_str(&category.to_string()).unwrap(), category);
        }
    }

    #[test]
    fn test_category_names_match_the_api() {
        assert_eq!(Category::Entertainment.to_string(), "Entertainment");
        assert_eq!(
            serde_json::to_string(&Category::Misc).unwrap(),
            "\"Misc\""
        );
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        assert!(Category::from_str("Groceries").is_err());
        assert!(Category::from_str("food").is_err());
    }

    #[test]
    fn test_transaction_type_is_lowercase() {
        assert_eq!(TransactionType::Income.to_string(), "income");
        assert_eq!(
            TransactionType::from_str("expense").unwrap(),
            TransactionType::Expense
        );
        assert!(TransactionType::from_str("Expense").is_err());
    }
}
