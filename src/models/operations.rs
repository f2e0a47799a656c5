// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Pending metadata operations journal.
//!
//! Nothing here talks to the server: the log only accumulates delete and update
//! intents until a save consumes it. Updates use `match` to name the value being
//! replaced; an empty `match` marks a brand-new value.

use serde::{Deserialize, Serialize};

use crate::models::metadata::ValueType;

/// Delete a whole field (`value == None`) or one of its values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOp {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Replacement payload of an update.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UpdateValue {
    Single(String),
    List(Vec<String>),
}

impl From<&str> for UpdateValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<String> for UpdateValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<String>> for UpdateValue {
    fn from(values: Vec<String>) -> Self {
        Self::List(values)
    }
}

/// Replace `match` with `value` under `key`, or add `value` when `match` is empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOp {
    pub key: String,
    #[serde(rename = "match")]
    pub match_value: String,
    pub value: UpdateValue,
    #[serde(
        rename = "valueType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub value_type: Option<ValueType>,
}

/// Session-scoped journal of pending deletes and updates.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationLog {
    pub deletes: Vec<DeleteOp>,
    pub updates: Vec<UpdateOp>,
}

impl OperationLog {
    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty() && self.updates.is_empty()
    }

    pub fn deletes(&self) -> &[DeleteOp] {
        &self.deletes
    }

    pub fn updates(&self) -> &[UpdateOp] {
        &self.updates
    }

    /// Mark a whole field for deletion. Repeated marks are kept as-is.
    pub fn record_field_delete(&mut self, key: &str) {
        self.deletes.push(DeleteOp {
            key: key.to_string(),
            value: None,
        });
    }

    pub fn record_value_delete(&mut self, key: &str, value: &str) {
        self.deletes.push(DeleteOp {
            key: key.to_string(),
            value: Some(value.to_string()),
        });
    }

    pub fn record_batch_field_delete<S: AsRef<str>>(&mut self, keys: &[S]) {
        for key in keys {
            self.record_field_delete(key.as_ref());
        }
    }

    /// Record a value replacement (or addition, when `original` is empty).
    ///
    /// An existing entry for the same `(key, original)` is overwritten in place when
    /// `original` is non-empty; identical `(key, match, value)` entries collapse to the
    /// first one.
    pub fn record_value_update(
        &mut self,
        key: &str,
        original: &str,
        new_value: impl Into<UpdateValue>,
        value_type: Option<ValueType>,
    ) {
        let value = match new_value.into() {
            UpdateValue::List(values) if value_type != Some(ValueType::List) => {
                UpdateValue::Single(values.into_iter().next().unwrap_or_default())
            }
            other => other,
        };

        let existing = self
            .updates
            .iter_mut()
            .find(|u| !original.is_empty() && u.key == key && u.match_value == original);
        match existing {
            Some(update) => {
                update.value = value;
                update.value_type = value_type;
            }
            None => self.updates.push(UpdateOp {
                key: key.to_string(),
                match_value: original.to_string(),
                value,
                value_type,
            }),
        }

        self.dedup_updates();
    }

    /// Drop staged updates for `(key, match)` whose value equals `value`.
    pub fn discard_update(&mut self, key: &str, match_value: &str, value: &str) {
        self.updates.retain(|u| {
            !(u.key == key
                && u.match_value == match_value
                && u.value == UpdateValue::Single(value.to_string()))
        });
    }

    /// Drop every staged update for `(key, match)`.
    pub fn discard_updates_for(&mut self, key: &str, match_value: &str) {
        self.updates
            .retain(|u| !(u.key == key && u.match_value == match_value));
    }

    /// Append everything from `other`, applying the usual update rules.
    pub fn absorb(&mut self, other: OperationLog) {
        self.deletes.extend(other.deletes);
        for update in other.updates {
            self.record_value_update(
                &update.key,
                &update.match_value,
                update.value,
                update.value_type,
            );
        }
    }

    pub fn reset(&mut self) {
        self.deletes.clear();
        self.updates.clear();
    }

    fn dedup_updates(&mut self) {
        let mut seen: Vec<(String, String, UpdateValue)> = Vec::new();
        self.updates.retain(|u| {
            let triple = (u.key.clone(), u.match_value.clone(), u.value.clone());
            if seen.contains(&triple) {
                false
            } else {
                seen.push(triple);
                true
            }
        });
    }
}
