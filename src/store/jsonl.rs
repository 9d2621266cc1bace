//! In-memory example store loaded from a labeled JSONL file
//!
//! Similarity is scored by normalized-word overlap between the query item's
//! text and each example's text. Good enough to surface obviously related
//! products without pulling in an embedding stack.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::model::{HazmatInputItem, HazmatLabeledItem};
use crate::store::{ExampleStore, StoreError};

/// Example store backed by a flat list of labeled items.
#[derive(Debug, Default)]
pub struct JsonlExampleStore {
    examples: Vec<HazmatLabeledItem>,
}

impl JsonlExampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a store from a JSONL file of labeled items.
    pub fn from_path(path: &Path) -> Result<Self, StoreError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let mut store = Self::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let example: HazmatLabeledItem = serde_json::from_str(&line)?;
            store.add(example);
        }

        tracing::info!(
            path = %path.display(),
            example_count = store.len(),
            "Loaded example store"
        );
        Ok(store)
    }
}

impl ExampleStore for JsonlExampleStore {
    fn add(&mut self, example: HazmatLabeledItem) {
        if let Some(existing) = self
            .examples
            .iter_mut()
            .find(|e| e.item_id == example.item_id)
        {
            tracing::debug!(item_id = %example.item_id, "Updating existing example");
            *existing = example;
        } else {
            self.examples.push(example);
        }
    }

    fn retrieve(&self, item: &HazmatInputItem, count: usize) -> Vec<HazmatLabeledItem> {
        let query_words = word_set(&query_text(item));
        if query_words.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(usize, &HazmatLabeledItem)> = self
            .examples
            .iter()
            .map(|example| (overlap_score(&query_words, &example_text(example)), example))
            .filter(|(score, _)| *score > 0)
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0));

        scored
            .into_iter()
            .take(count)
            .map(|(_, example)| example.clone())
            .collect()
    }

    fn len(&self) -> usize {
        self.examples.len()
    }
}

/// Searchable text for a query item.
fn query_text(item: &HazmatInputItem) -> String {
    let mut parts = vec![format!("Product: {}", item.name)];
    if let Some(description) = item.description.as_deref() {
        parts.push(format!("Description: {description}"));
    }
    if let Some(short_description) = item.short_description.as_deref() {
        parts.push(format!("Short Description: {short_description}"));
    }
    if let Some(keywords) = item.keywords.as_deref() {
        parts.push(format!("Keywords: {keywords}"));
    }
    parts.join("\n")
}

/// Searchable text for a stored example, including its annotation.
fn example_text(example: &HazmatLabeledItem) -> String {
    let mut parts = vec![
        format!("Product: {}", example.name),
        format!("Domain: {}", example.domain_id),
        format!("Family: {}", example.family_name),
    ];
    if let Some(description) = example.description.as_deref() {
        parts.push(format!("Description: {description}"));
    }
    if let Some(short_description) = example.short_description.as_deref() {
        parts.push(format!("Short Description: {short_description}"));
    }
    if let Some(keywords) = example.keywords.as_deref() {
        parts.push(format!("Keywords: {keywords}"));
    }
    parts.push(format!(
        "Classification: {}",
        if example.is_hazmat {
            "HAZMAT"
        } else {
            "NOT HAZMAT"
        }
    ));
    parts.push(format!("Reason: {}", example.reason));
    parts.join("\n")
}

/// Normalize a word for comparison (lowercase, strip leading/trailing punctuation)
fn normalize_word(word: &str) -> String {
    word.trim_matches(|c: char| c.is_ascii_punctuation())
        .to_lowercase()
}

fn word_set(text: &str) -> HashSet<String> {
    text.split_whitespace()
        .map(normalize_word)
        .filter(|w| !w.is_empty())
        .collect()
}

/// Count how many of the query words appear in the candidate text.
fn overlap_score(query_words: &HashSet<String>, text: &str) -> usize {
    word_set(text)
        .intersection(query_words)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::KnownHazmatTrait;
    use std::io::Write;

    fn labeled(item_id: &str, name: &str, keywords: &str, is_hazmat: bool) -> HazmatLabeledItem {
        HazmatLabeledItem {
            item_id: item_id.to_string(),
            name: name.to_string(),
            domain_id: "MLB-TOOLS".to_string(),
            family_name: "Chemicals".to_string(),
            description: None,
            short_description: None,
            keywords: Some(keywords.to_string()),
            is_hazmat,
            traits: if is_hazmat {
                vec![KnownHazmatTrait::Flammable.into()]
            } else {
                Vec::new()
            },
            reason: "test annotation".to_string(),
        }
    }

    fn query(name: &str, keywords: &str) -> HazmatInputItem {
        HazmatInputItem {
            item_id: "Q1".to_string(),
            name: name.to_string(),
            domain_id: "MLB-TOOLS".to_string(),
            family_name: "Chemicals".to_string(),
            permalink: None,
            description: None,
            short_description: None,
            keywords: Some(keywords.to_string()),
            attributes: Vec::new(),
            main_features: Vec::new(),
        }
    }

    #[test]
    fn test_retrieves_most_similar_first() {
        let mut store = JsonlExampleStore::new();
        store.add(labeled("KB1", "Acetone Nail Polish Remover", "acetone flammable", true));
        store.add(labeled("KB2", "Organic Shampoo", "shampoo hair care", false));

        let results = store.retrieve(&query("Acetone Solvent 1L", "acetone solvent"), 2);
        assert!(!results.is_empty());
        assert_eq!(results[0].item_id, "KB1");
    }

    #[test]
    fn test_unrelated_examples_are_not_returned() {
        let mut store = JsonlExampleStore::new();
        store.add(labeled("KB2", "Organic Shampoo", "shampoo hair care", false));

        let results = store.retrieve(&query("Propane Cartridge", "propane gas"), 3);
        assert!(results.is_empty());
    }

    #[test]
    fn test_add_replaces_existing_item() {
        let mut store = JsonlExampleStore::new();
        store.add(labeled("KB1", "Acetone Remover", "acetone", true));
        store.add(labeled("KB1", "Acetone Remover 500ml", "acetone", true));

        assert_eq!(store.len(), 1);
        let results = store.retrieve(&query("Acetone", "acetone"), 1);
        assert_eq!(results[0].name, "Acetone Remover 500ml");
    }

    #[test]
    fn test_from_path_skips_blank_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let record = serde_json::to_string(&labeled("KB1", "Acetone", "acetone", true)).unwrap();
        writeln!(file, "{record}").unwrap();
        writeln!(file).unwrap();

        let store = JsonlExampleStore::from_path(file.path()).unwrap();
        assert_eq!(store.len(), 1);
    }
}
