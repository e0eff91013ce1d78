use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use super::ResolvedAuthor;

/// Normalizes a catalog subject tag so that "Fantasy" and "fantasy " share one key
pub fn normalize_subject(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Subject name → number of distinct authors known for it
///
/// Each author contributes at most 1 to any subject; `add_author` takes the author's
/// already-deduplicated subject set to keep that true.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SubjectWeights(BTreeMap<String, u32>);

impl SubjectWeights {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one author's subject set into the aggregate
    pub fn add_author(&mut self, subjects: &BTreeSet<String>) {
        for subject in subjects {
            *self.0.entry(subject.clone()).or_insert(0) += 1;
        }
    }

    /// Weight for a subject, 0 when no author carries it
    pub fn weight(&self, subject: &str) -> u32 {
        self.0.get(subject).copied().unwrap_or(0)
    }

    pub fn get(&self, subject: &str) -> Option<u32> {
        self.0.get(subject).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.0.iter().map(|(subject, weight)| (subject.as_str(), *weight))
    }
}

impl<S: Into<String>> FromIterator<(S, u32)> for SubjectWeights {
    fn from_iter<T: IntoIterator<Item = (S, u32)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(s, w)| (s.into(), w)).collect())
    }
}

/// The subject both readers share, with its combined weight
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharedSubject {
    pub name: String,
    pub combined_weight: u32,
}

/// Output of subject aggregation for one reader
#[derive(Debug, Clone, Default, Serialize)]
pub struct SubjectProfile {
    pub weights: SubjectWeights,
    /// Author name → that author's subject set; diagnostics only
    pub per_author: BTreeMap<String, BTreeSet<String>>,
}

/// Everything one reader's half of the pipeline produced
#[derive(Debug, Clone, Serialize)]
pub struct ReaderProfile {
    pub reader_id: i64,
    pub authors: Vec<ResolvedAuthor>,
    pub subjects: SubjectProfile,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(subjects: &[&str]) -> BTreeSet<String> {
        subjects.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize_subject() {
        assert_eq!(normalize_subject("Fantasy"), "fantasy");
        assert_eq!(normalize_subject("  fantasy "), "fantasy");
        assert_eq!(normalize_subject("Science Fiction"), "science fiction");
    }

    #[test]
    fn test_add_author_counts_each_author_once() {
        let mut weights = SubjectWeights::new();
        weights.add_author(&set(&["fantasy", "magic"]));
        weights.add_author(&set(&["fantasy"]));

        assert_eq!(weights.weight("fantasy"), 2);
        assert_eq!(weights.weight("magic"), 1);
        assert_eq!(weights.weight("history"), 0);
        assert_eq!(weights.get("history"), None);
        assert_eq!(weights.len(), 2);
    }

    #[test]
    fn test_weights_serialize_as_map() {
        let weights: SubjectWeights = [("fantasy", 3), ("science_fiction", 1)]
            .into_iter()
            .collect();
        let json = serde_json::to_value(&weights).unwrap();
        assert_eq!(json, serde_json::json!({"fantasy": 3, "science_fiction": 1}));
    }
}
