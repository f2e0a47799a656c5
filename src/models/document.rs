// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Document and dataset summaries read from the knowledge-base server.

use serde_json::Value;

use crate::models::builtin::BuiltInMetadataItem;

/// A document row as listed for a dataset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DocumentSummary {
    pub id: String,
    pub name: String,
    /// Flat metadata object of the document.
    pub meta_fields: Value,
    /// Field schema configured for this document, if any.
    pub metadata_schema: Value,
}

impl DocumentSummary {
    /// Number of metadata keys attached to the document.
    pub fn meta_count(&self) -> usize {
        self.meta_fields.as_object().map(|m| m.len()).unwrap_or(0)
    }
}

/// Dataset detail needed to seed schema editing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DatasetSummary {
    pub id: String,
    pub name: String,
    pub metadata_schema: Value,
    pub built_in_metadata: Vec<BuiltInMetadataItem>,
}
