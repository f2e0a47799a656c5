// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Reserved document attributes a dataset schema can expose as metadata.

use serde::{Deserialize, Serialize};

use crate::models::metadata::ValueType;

/// One opted-in built-in attribute with its primitive type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuiltInMetadataItem {
    pub key: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
}

/// Attributes every document carries regardless of user metadata.
pub const BUILT_IN_FIELDS: &[(&str, ValueType)] = &[
    ("update_time", ValueType::Time),
    ("create_time", ValueType::Time),
    ("file_name", ValueType::String),
    ("file_type", ValueType::String),
    ("size", ValueType::Number),
];

/// Whether `key` names a reserved attribute.
pub fn is_built_in(key: &str) -> bool {
    BUILT_IN_FIELDS.iter().any(|(k, _)| *k == key)
}

/// Build the typed selection payload for the given keys, in catalogue order.
///
/// Unknown keys are ignored.
pub fn selection<S: AsRef<str>>(keys: &[S]) -> Vec<BuiltInMetadataItem> {
    BUILT_IN_FIELDS
        .iter()
        .filter(|(key, _)| keys.iter().any(|k| k.as_ref() == *key))
        .map(|(key, value_type)| BuiltInMetadataItem {
            key: key.to_string(),
            value_type: *value_type,
        })
        .collect()
}
