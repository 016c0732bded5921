//! Suggested-question catalog.
//!
//! The catalog is a two-level mapping `category -> subcategory -> questions`
//! shown before any chat has started. It is loaded once per session by
//! [`CatalogFetcher`] and never mutated afterwards.

mod fallback;
mod fetcher;

pub use fallback::{default_cards, fallback_catalog};
pub use fetcher::{CatalogError, CatalogFetcher, CATALOG_CACHE_KEY, DEFAULT_CATALOG_TTL};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `category -> subcategory -> ordered questions`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionCatalog(BTreeMap<String, BTreeMap<String, Vec<String>>>);

impl QuestionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Questions for a category/subcategory pair, empty if either is unknown.
    pub fn questions(&self, category: &str, subcategory: &str) -> &[String] {
        self.0
            .get(category)
            .and_then(|subs| subs.get(subcategory))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn subcategories(&self, category: &str) -> impl Iterator<Item = &str> {
        self.0
            .get(category)
            .into_iter()
            .flat_map(|subs| subs.keys().map(String::as_str))
    }

    /// Builder-style insert, used for the built-in catalog and tests.
    pub fn with(
        mut self,
        category: &str,
        subcategory: &str,
        questions: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.0
            .entry(category.to_string())
            .or_default()
            .insert(
                subcategory.to_string(),
                questions.into_iter().map(Into::into).collect(),
            );
        self
    }
}

/// One browsable card: a category with its ordered subcategory tabs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCard {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub sub_tabs: Vec<String>,
}

impl CategoryCard {
    pub fn new(name: &str, description: &str, sub_tabs: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            sub_tabs: sub_tabs.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn has_sub_tab(&self, name: &str) -> bool {
        self.sub_tabs.iter().any(|s| s == name)
    }

    pub fn first_sub_tab(&self) -> Option<&str> {
        self.sub_tabs.first().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_questions_lookup() {
        let catalog = QuestionCatalog::new().with("Exams", "Dates", ["When?"]);
        assert_eq!(catalog.questions("Exams", "Dates").to_vec(), vec!["When?".to_string()]);
        assert!(catalog.questions("Exams", "Syllabus").is_empty());
        assert!(catalog.questions("Colleges", "All").is_empty());
    }

    #[test]
    fn test_deserializes_plain_nested_object() {
        let json = r#"{"Colleges": {"All": ["A", "B"], "Fees": []}}"#;
        let catalog: QuestionCatalog = serde_json::from_str(json).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.questions("Colleges", "All").len(), 2);
        assert_eq!(
            catalog.subcategories("Colleges").collect::<Vec<_>>(),
            vec!["All", "Fees"]
        );
    }

    #[test]
    fn test_rejects_wrong_shape() {
        assert!(serde_json::from_str::<QuestionCatalog>(r#"{"Colleges": ["A"]}"#).is_err());
        assert!(serde_json::from_str::<QuestionCatalog>("[]").is_err());
    }

    #[test]
    fn test_empty_object_is_empty_catalog() {
        let catalog: QuestionCatalog = serde_json::from_str("{}").unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_card_sub_tabs() {
        let card = CategoryCard::new("Exams", "", &["All", "Dates"]);
        assert!(card.has_sub_tab("Dates"));
        assert!(!card.has_sub_tab("Fees"));
        assert_eq!(card.first_sub_tab(), Some("All"));
    }
}
