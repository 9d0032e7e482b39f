use crate::model::{Category, TransactionType};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

const TYPE_KEY: &str = "type";
const CATEGORY_KEY: &str = "category";
const START_DATE_KEY: &str = "startDate";
const END_DATE_KEY: &str = "endDate";
const SEARCH_KEY: &str = "search";

/// The criteria used to list transactions. Every field is optional and absent fields are left out
/// of the query entirely.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFilter {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<TransactionType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl TransactionFilter {
    /// Merges `update` into this filter. Fields the update does not mention are kept.
    pub fn apply(&mut self, update: FilterUpdate) {
        if let Some(kind) = update.kind {
            self.kind = kind;
        }
        if let Some(category) = update.category {
            self.category = category;
        }
        if let Some(start_date) = update.start_date {
            self.start_date = start_date;
        }
        if let Some(end_date) = update.end_date {
            self.end_date = end_date;
        }
        if let Some(search) = update.search {
            self.search = search;
        }
    }

    /// The query parameters for the present fields, always in the order
    /// `type, category, startDate, endDate, search`.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(kind) = self.kind {
            pairs.push((TYPE_KEY, kind.to_string()));
        }
        if let Some(category) = self.category {
            pairs.push((CATEGORY_KEY, category.to_string()));
        }
        if let Some(start_date) = self.start_date {
            pairs.push((START_DATE_KEY, start_date.format("%Y-%m-%d").to_string()));
        }
        if let Some(end_date) = self.end_date {
            pairs.push((END_DATE_KEY, end_date.format("%Y-%m-%d").to_string()));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            pairs.push((SEARCH_KEY, search.to_string()));
        }
        pairs
    }

    /// The form-url-encoded query string, without a leading `?`. Empty when no field is present.
    pub fn query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query_pairs())
            .finish()
    }

    pub fn is_empty(&self) -> bool {
        self.query_pairs().is_empty()
    }
}

/// A partial change to a `TransactionFilter`. Each field is either left alone (`None`), set
/// (`Some(Some(..))`) or cleared (`Some(None)`).
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct FilterUpdate {
    kind: Option<Option<TransactionType>>,
    category: Option<Option<Category>>,
    start_date: Option<Option<NaiveDate>>,
    end_date: Option<Option<NaiveDate>>,
    search: Option<Option<String>>,
}

impl FilterUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the type, or clears it with `None`.
    pub fn kind(mut self, kind: impl Into<Option<TransactionType>>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Sets the category, or clears it with `None`.
    pub fn category(mut self, category: impl Into<Option<Category>>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn start_date(mut self, start_date: impl Into<Option<NaiveDate>>) -> Self {
        self.start_date = Some(start_date.into());
        self
    }

    pub fn end_date(mut self, end_date: impl Into<Option<NaiveDate>>) -> Self {
        self.end_date = Some(end_date.into());
        self
    }

    /// Sets the search text. An empty string clears it.
    pub fn search(mut self, search: impl AsRef<str>) -> Self {
        let search = search.as_ref();
        self.search = Some(if search.is_empty() {
            None
        } else {
            Some(search.to_string())
        });
        self
    }
}

impl From<TransactionFilter> for FilterUpdate {
    /// An update that replaces every field.
    fn from(filter: TransactionFilter) -> Self {
        FilterUpdate::new()
            .kind(filter.kind)
            .category(filter.category)
            .start_date(filter.start_date)
            .end_date(filter.end_date)
            .search(filter.search.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_query_string_type_and_category() {
        let filter = TransactionFilter {
            kind: Some(TransactionType::Expense),
            category: Some(Category::Food),
            ..Default::default()
        };
        assert_eq!(filter.query_string(), "type=expense&category=Food");
    }

    #[test]
    fn test_query_string_fixed_order() {
        let mut filter = TransactionFilter::default();
        filter.apply(
            FilterUpdate::new()
                .search("rent march")
                .end_date(date(2025, 3, 31))
                .start_date(date(2025, 3, 1))
                .kind(TransactionType::Expense),
        );
        assert_eq!(
            filter.query_string(),
            "type=expense&startDate=2025-03-01&endDate=2025-03-31&search=rent+march"
        );
    }

    #[test]
    fn test_query_string_empty() {
        let filter = TransactionFilter::default();
        assert!(filter.is_empty());
        assert_eq!(filter.query_string(), "");
    }

    #[test]
    fn test_empty_search_is_omitted() {
        let filter = TransactionFilter {
            search: Some(String::new()),
            ..Default::default()
        };
        assert!(filter.is_empty());
    }

    #[test]
    fn test_apply_merges_and_clears() {
        let mut filter = TransactionFilter::default();
        filter.apply(
            FilterUpdate::new()
                .kind(TransactionType::Income)
                .category(Category::Income),
        );
        filter.apply(FilterUpdate::new().search("bonus"));
        assert_eq!(filter.kind, Some(TransactionType::Income));
        assert_eq!(filter.category, Some(Category::Income));
        assert_eq!(filter.search.as_deref(), Some("bonus"));

        filter.apply(FilterUpdate::new().category(None).search(""));
        assert_eq!(filter.kind, Some(TransactionType::Income));
        assert_eq!(filter.category, None);
        assert_eq!(filter.search, None);
    }

    #[test]
    fn test_from_filter_replaces_everything() {
        let mut current = TransactionFilter {
            kind: Some(TransactionType::Expense),
            search: Some("taxi".to_string()),
            ..Default::default()
        };
        let replacement = TransactionFilter {
            category: Some(Category::Travel),
            ..Default::default()
        };
        current.apply(replacement.clone().into());
        assert_eq!(current, replacement);
    }
}
