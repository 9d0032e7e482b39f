use crate::error::Res;
use crate::model::{Amount, Category, TransactionType};
use anyhow::{anyhow, ensure, Context};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A single transaction as stored by the API. Records are never edited in place; the whole list is
/// replaced after every successful fetch.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub category: Category,
    pub amount: Amount,
    #[serde(with = "api_date")]
    pub date: NaiveDate,
    #[serde(default)]
    pub description: String,
}

/// The payload for creating a transaction.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: Amount,
    pub category: Category,
    #[serde(with = "api_date")]
    pub date: NaiveDate,
    #[serde(default)]
    pub description: String,
}

impl NewTransaction {
    pub fn new(
        kind: TransactionType,
        amount: Amount,
        category: Category,
        date: NaiveDate,
        description: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            amount,
            category,
            date,
            description: description.into(),
        }
    }

    /// Client-side pre-check before anything is sent. The server has the final word; this only
    /// catches input that can never be valid. `kind` and `category` are closed enums, so only the
    /// amount needs checking here.
    pub(crate) fn validate(&self) -> Res<()> {
        ensure!(
            self.amount.is_positive(),
            "The amount must be greater than zero, got {}",
            self.amount
        );
        Ok(())
    }

    /// Builds the record the server would return for this payload.
    pub(crate) fn into_transaction(self, id: impl Into<String>) -> Transaction {
        Transaction {
            id: id.into(),
            kind: self.kind,
            category: self.category,
            amount: self.amount,
            date: self.date,
            description: self.description,
        }
    }
}

/// Unparsed input for a new transaction, as typed on the command line.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct TransactionForm {
    pub kind: String,
    pub amount: String,
    pub category: String,
    /// `YYYY-MM-DD`. Empty means today.
    pub date: String,
    pub description: String,
}

impl TransactionForm {
    /// Parses every field and runs the same pre-check as `NewTransaction::validate`. Nothing that
    /// fails here should ever reach the API.
    pub(crate) fn parse(&self) -> Res<NewTransaction> {
        let kind = TransactionType::from_str(self.kind.trim()).map_err(|_| {
            anyhow!(
                "Unknown transaction type '{}', expected income or expense",
                self.kind
            )
        })?;
        let amount = Amount::from_str(&self.amount).context("The amount is not a number")?;
        let category = Category::from_str(self.category.trim()).map_err(|_| {
            let known: Vec<String> = Category::ALL.iter().map(|c| c.to_string()).collect();
            anyhow!(
                "Unknown category '{}', expected one of {}",
                self.category,
                known.join(", ")
            )
        })?;
        let date = match self.date.trim() {
            "" => chrono::Local::now().date_naive(),
            s => api_date::parse(s).map_err(|e| anyhow!(e))?,
        };
        let input = NewTransaction::new(kind, amount, category, date, self.description.trim());
        input.validate()?;
        Ok(input)
    }
}

/// Dates go out as `YYYY-MM-DD`. They come back either that way or as a full RFC 3339 timestamp,
/// in which case only the calendar date is kept.
pub(crate) mod api_date {
    use chrono::{DateTime, NaiveDate};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub(crate) fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }

    pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse(&s).map_err(serde::de::Error::custom)
    }

    pub(crate) fn parse(s: &str) -> Result<NaiveDate, String> {
        let s = s.trim();
        if let Ok(date) = NaiveDate::parse_from_str(s, FORMAT) {
            return Ok(date);
        }
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.date_naive())
            .map_err(|_| format!("Invalid date '{s}', expected YYYY-MM-DD"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_from_api_json() {
        let json = r#"{
            "_id": "6650a1",
            "type": "expense",
            "category": "Food",
            "amount": 250.5,
            "date": "2025-03-04T00:00:00.000Z",
            "user": "u1",
            "__v": 0
        }"#;
        let tx: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.id, "6650a1");
        assert_eq!(tx.kind, TransactionType::Expense);
        assert_eq!(tx.category, Category::Food);
        assert_eq!(tx.amount, Amount::from_str("250.5").unwrap());
        assert_eq!(tx.date, NaiveDate::from_ymd_opt(2025, 3, 4).unwrap());
        assert_eq!(tx.description, "");
    }

    #[test]
    fn test_transaction_rejects_unknown_category() {
        let json = r#"{"id":"1","type":"income","category":"Bonus","amount":1,"date":"2025-01-01"}"#;
        assert!(serde_json::from_str::<Transaction>(json).is_err());
    }

    #[test]
    fn test_new_transaction_wire_format() {
        let input = NewTransaction::new(
            TransactionType::Income,
            Amount::from_str("1200").unwrap(),
            Category::Income,
            NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
            "salary",
        );
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(value["type"], "income");
        assert_eq!(value["category"], "Income");
        assert_eq!(value["date"], "2025-01-31");
        assert_eq!(value["amount"], 1200.0);
        assert_eq!(value["description"], "salary");
    }

    #[test]
    fn test_validate_amount() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let make = |amount: &str| {
            NewTransaction::new(
                TransactionType::Expense,
                Amount::from_str(amount).unwrap(),
                Category::Misc,
                date,
                "",
            )
        };
        assert!(make("0.01").validate().is_ok());
        assert!(make("0").validate().is_err());
        assert!(make("-5").validate().is_err());
    }

    fn form(amount: &str, category: &str) -> TransactionForm {
        TransactionForm {
            kind: "expense".to_string(),
            amount: amount.to_string(),
            category: category.to_string(),
            date: "2025-04-02".to_string(),
            description: " lunch ".to_string(),
        }
    }

    #[test]
    fn test_form_parse() {
        let input = form("1,250.00", "Food").parse().unwrap();
        assert_eq!(input.kind, TransactionType::Expense);
        assert_eq!(input.amount, Amount::from_str("1250").unwrap());
        assert_eq!(input.category, Category::Food);
        assert_eq!(input.date, NaiveDate::from_ymd_opt(2025, 4, 2).unwrap());
        assert_eq!(input.description, "lunch");
    }

    #[test]
    fn test_form_rejects_bad_input() {
        let err = form("10", "Bonus").parse().unwrap_err();
        assert!(err.to_string().contains("Unknown category 'Bonus'"));
        assert!(form("0", "Food").parse().is_err());
        assert!(form("abc", "Food").parse().is_err());

        let mut bad_kind = form("10", "Food");
        bad_kind.kind = "refund".to_string();
        assert!(bad_kind.parse().is_err());
    }

    #[test]
    fn test_form_date_defaults_to_today() {
        let mut f = form("10", "Misc");
        f.date = String::new();
        assert_eq!(f.parse().unwrap().date, chrono::Local::now().date_naive());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            api_date::parse("2024-12-25").unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 25).unwrap()
        );
        assert_eq!(
            api_date::parse("2024-12-25T23:30:00+05:30").unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 25).unwrap()
        );
        assert!(api_date::parse("25/12/2024").is_err());
    }
}
