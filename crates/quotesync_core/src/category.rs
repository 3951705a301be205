//! Category index and filter selection.

use crate::quote::Quote;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The active category filter.
///
/// `All` is a synthetic selector that matches every quote. It is written as
/// the string `"all"` wherever a filter is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CategoryFilter {
    /// Matches every quote.
    #[default]
    All,
    /// Matches quotes whose category equals this value exactly.
    Category(String),
}

impl CategoryFilter {
    /// Name of the synthetic selector.
    pub const ALL: &'static str = "all";

    /// Parses a persisted or user-supplied selector.
    pub fn parse(name: &str) -> Self {
        if name == Self::ALL {
            CategoryFilter::All
        } else {
            CategoryFilter::Category(name.to_string())
        }
    }

    /// Returns the selector name.
    pub fn as_str(&self) -> &str {
        match self {
            CategoryFilter::All => Self::ALL,
            CategoryFilter::Category(name) => name,
        }
    }

    /// Returns true if `quote` passes this filter.
    pub fn matches(&self, quote: &Quote) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Category(name) => quote.category == *name,
        }
    }
}

impl From<String> for CategoryFilter {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl From<CategoryFilter> for String {
    fn from(filter: CategoryFilter) -> Self {
        filter.as_str().to_string()
    }
}

/// Distinct categories present in a store.
///
/// Case-sensitive and kept in lexicographic order for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryIndex {
    categories: BTreeSet<String>,
}

impl CategoryIndex {
    /// Derives the index from a quote list.
    pub fn from_quotes(quotes: &[Quote]) -> Self {
        Self {
            categories: quotes.iter().map(|q| q.category.clone()).collect(),
        }
    }

    /// Returns true if some quote carries `category`.
    pub fn contains(&self, category: &str) -> bool {
        self.categories.contains(category)
    }

    /// Number of distinct categories, excluding the `all` selector.
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Returns true if the store has no quotes.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Iterates over categories in display order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(String::as_str)
    }

    /// Selector options as shown in a filter control: `all` first.
    pub fn options(&self) -> Vec<String> {
        std::iter::once(CategoryFilter::ALL.to_string())
            .chain(self.categories.iter().cloned())
            .collect()
    }

    /// Returns `filter` if it is still valid, otherwise `All`.
    pub fn validate(&self, filter: CategoryFilter) -> CategoryFilter {
        match filter {
            CategoryFilter::Category(ref name) if !self.contains(name) => CategoryFilter::All,
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote::QuoteId;

    fn quote(category: &str) -> Quote {
        Quote::new(QuoteId::generate(), "t", "a", category, 0)
    }

    #[test]
    fn index_is_sorted_and_distinct() {
        let quotes = vec![quote("Motivation"), quote("Humor"), quote("Motivation")];
        let index = CategoryIndex::from_quotes(&quotes);

        assert_eq!(index.len(), 2);
        assert_eq!(index.iter().collect::<Vec<_>>(), vec!["Humor", "Motivation"]);
        assert_eq!(index.options(), vec!["all", "Humor", "Motivation"]);
    }

    #[test]
    fn index_is_case_sensitive() {
        let index = CategoryIndex::from_quotes(&[quote("life"), quote("Life")]);
        assert_eq!(index.len(), 2);
        assert!(!index.contains("LIFE"));
    }

    #[test]
    fn stale_filter_falls_back_to_all() {
        let index = CategoryIndex::from_quotes(&[quote("Humor")]);

        assert_eq!(
            index.validate(CategoryFilter::parse("Humor")),
            CategoryFilter::Category("Humor".into())
        );
        assert_eq!(index.validate(CategoryFilter::parse("Gone")), CategoryFilter::All);
        assert_eq!(index.validate(CategoryFilter::All), CategoryFilter::All);
    }

    #[test]
    fn filter_matching() {
        let q = quote("Humor");
        assert!(CategoryFilter::All.matches(&q));
        assert!(CategoryFilter::parse("Humor").matches(&q));
        assert!(!CategoryFilter::parse("humor").matches(&q));
    }

    #[test]
    fn filter_serializes_as_plain_string() {
        let json = serde_json::to_string(&CategoryFilter::parse("Humor")).unwrap();
        assert_eq!(json, "\"Humor\"");

        let all: CategoryFilter = serde_json::from_str("\"all\"").unwrap();
        assert_eq!(all, CategoryFilter::All);
    }
}
