use std::collections::{BTreeSet, HashMap};

use super::record::{ContentRecord, Features};

/// Stable bijection between categorical labels and small integer codes.
///
/// Codes follow the lexicographic order of the distinct labels, so the same
/// set of labels always encodes the same way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoricalEncoding {
    labels: Vec<String>,
    codes: HashMap<String, usize>,
}

impl CategoricalEncoding {
    /// Builds an encoding from every label occurrence (duplicates allowed)
    pub fn from_labels<'a, I>(labels: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let distinct: BTreeSet<&str> = labels.into_iter().collect();
        let labels: Vec<String> = distinct.into_iter().map(str::to_string).collect();
        let codes = labels
            .iter()
            .enumerate()
            .map(|(code, label)| (label.clone(), code))
            .collect();

        Self { labels, codes }
    }

    pub fn code(&self, label: &str) -> Option<usize> {
        self.codes.get(label).copied()
    }

    pub fn label(&self, code: usize) -> Option<&str> {
        self.labels.get(code).map(String::as_str)
    }

    /// Labels in code order
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// A normalized corpus together with its categorical encodings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    records: Vec<ContentRecord>,
    languages: CategoricalEncoding,
    content_types: CategoricalEncoding,
}

impl Dataset {
    pub(crate) fn new(
        records: Vec<ContentRecord>,
        languages: CategoricalEncoding,
        content_types: CategoricalEncoding,
    ) -> Self {
        Self {
            records,
            languages,
            content_types,
        }
    }

    pub fn records(&self) -> &[ContentRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn languages(&self) -> &CategoricalEncoding {
        &self.languages
    }

    pub fn content_types(&self) -> &CategoricalEncoding {
        &self.content_types
    }

    /// Record by content id
    pub fn get(&self, content_id: usize) -> Option<&ContentRecord> {
        self.records.get(content_id)
    }

    /// All titles in dataset order
    pub fn titles(&self) -> Vec<String> {
        self.records.iter().map(|r| r.title.clone()).collect()
    }

    /// First record whose title contains `fragment`, ignoring case
    pub fn find_by_title(&self, fragment: &str) -> Option<&ContentRecord> {
        let needle = fragment.to_lowercase();
        self.records
            .iter()
            .find(|r| r.title.to_lowercase().contains(&needle))
    }

    /// Model inputs and their target ids, one pair per record
    pub fn training_samples(&self) -> Vec<(Features, usize)> {
        self.records
            .iter()
            .map(|r| (r.features(), r.content_id))
            .collect()
    }
}
