// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Keyed cache for server reads.
//!
//! Entries are never locked. Invalidation evicts matching entries so the next
//! read refetches.

use std::collections::HashMap;

/// Identity of a cached server read.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum QueryKey {
    MetadataSummary {
        dataset_id: String,
        document_ids: Vec<String>,
    },
    DocumentList {
        dataset_id: String,
    },
    Dataset {
        dataset_id: String,
    },
}

impl QueryKey {
    pub fn dataset_id(&self) -> &str {
        match self {
            Self::MetadataSummary { dataset_id, .. }
            | Self::DocumentList { dataset_id }
            | Self::Dataset { dataset_id } => dataset_id,
        }
    }
}

/// Which entries an invalidation touches.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Invalidation {
    /// Every metadata summary of a dataset, whatever the document filter.
    MetadataSummaries { dataset_id: String },
    /// The document list of a dataset.
    DocumentList { dataset_id: String },
    /// The dataset detail.
    Dataset { dataset_id: String },
}

impl Invalidation {
    fn matches(&self, key: &QueryKey) -> bool {
        match (self, key) {
            (Self::MetadataSummaries { dataset_id }, QueryKey::MetadataSummary { .. })
            | (Self::DocumentList { dataset_id }, QueryKey::DocumentList { .. })
            | (Self::Dataset { dataset_id }, QueryKey::Dataset { .. }) => {
                key.dataset_id() == dataset_id
            }
            _ => false,
        }
    }
}

/// Cache of server reads keyed by [`QueryKey`].
pub struct QueryCache<T> {
    entries: HashMap<QueryKey, T>,
}

impl<T> Default for QueryCache<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T: Clone> QueryCache<T> {
    pub fn insert(&mut self, key: QueryKey, value: T) {
        self.entries.insert(key, value);
    }

    /// Cached value for `key`, if it has not been invalidated since.
    pub fn fresh(&self, key: &QueryKey) -> Option<T> {
        self.entries.get(key).cloned()
    }

    /// Drop matching entries and return how many were evicted.
    pub fn invalidate(&mut self, invalidation: &Invalidation) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !invalidation.matches(key));
        before - self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(dataset: &str, docs: &[&str]) -> QueryKey {
        QueryKey::MetadataSummary {
            dataset_id: dataset.into(),
            document_ids: docs.iter().map(|d| d.to_string()).collect(),
        }
    }

    #[test]
    fn document_filter_is_part_of_the_key() {
        let mut cache = QueryCache::default();
        cache.insert(summary("kb", &[]), 1);
        cache.insert(summary("kb", &["d1"]), 2);

        assert_eq!(cache.fresh(&summary("kb", &[])), Some(1));
        assert_eq!(cache.fresh(&summary("kb", &["d1"])), Some(2));
        assert_eq!(cache.fresh(&summary("kb", &["d2"])), None);
    }

    #[test]
    fn invalidation_evicts_matching_entries() {
        let mut cache = QueryCache::default();
        cache.insert(summary("kb", &[]), 1);
        cache.insert(summary("kb", &["d1"]), 2);
        cache.insert(summary("other", &[]), 3);
        cache.insert(
            QueryKey::DocumentList {
                dataset_id: "kb".into(),
            },
            4,
        );

        let evicted = cache.invalidate(&Invalidation::MetadataSummaries {
            dataset_id: "kb".into(),
        });

        assert_eq!(evicted, 2);
        assert_eq!(cache.entries.len(), 2);
        assert_eq!(cache.fresh(&summary("kb", &[])), None);
        assert_eq!(cache.fresh(&summary("other", &[])), Some(3));
        assert_eq!(
            cache.fresh(&QueryKey::DocumentList {
                dataset_id: "kb".into()
            }),
            Some(4)
        );
    }

    #[test]
    fn repeated_filters_do_not_accumulate_entries() {
        let mut cache = QueryCache::default();
        for round in 0..3 {
            cache.insert(summary("kb", &["d1"]), round);
            cache.invalidate(&Invalidation::MetadataSummaries {
                dataset_id: "kb".into(),
            });
        }

        assert!(cache.entries.is_empty());
    }
}
