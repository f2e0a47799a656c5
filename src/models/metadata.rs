// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Unified row model shared by the manage table, the value editor and the transcoder.

use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

/// Value kinds a metadata field can hold.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    #[default]
    String,
    Number,
    Time,
    List,
}

impl ValueType {
    pub const ALL: [ValueType; 4] = [Self::String, Self::Number, Self::Time, Self::List];

    /// Parse a server type token, falling back to `String` for anything unknown.
    pub fn from_token(raw: &str) -> Self {
        match raw.trim() {
            "number" => Self::Number,
            "time" => Self::Time,
            "list" => Self::List,
            _ => Self::String,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Number => "Number",
            Self::Time => "Time",
            Self::List => "List",
        }
    }

    /// Whether fields of this type carry an enumeration of allowed values.
    pub fn supports_enum(&self) -> bool {
        matches!(self, Self::String | Self::List)
    }

    /// Input placeholder for value inputs of this type.
    pub fn hint(&self) -> &'static str {
        match self {
            Self::Number => "Number",
            Self::Time => "YYYY-MM-DDTHH:MM:SS",
            _ => "",
        }
    }

    /// Coerce raw user input into the canonical stored form.
    ///
    /// Returns a reason code when the input does not fit the type. Empty input is
    /// passed through untouched so blank slots can be filled in later.
    pub fn coerce(&self, raw: &str) -> Result<String, &'static str> {
        let value = raw.trim();
        if value.is_empty() {
            return Ok(String::new());
        }
        match self {
            Self::String | Self::List => Ok(raw.to_string()),
            Self::Number => match value.parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(value.to_string()),
                _ => Err("invalid_number"),
            },
            Self::Time => normalize_time(value).ok_or("invalid_time"),
        }
    }
}

/// Normalize RFC 3339 or naive ISO timestamps to `YYYY-MM-DDTHH:MM:SS`.
fn normalize_time(value: &str) -> Option<String> {
    let naive = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    let parsed = match time::OffsetDateTime::parse(value, &Rfc3339) {
        Ok(dt) => PrimitiveDateTime::new(dt.date(), dt.time()),
        Err(_) => PrimitiveDateTime::parse(value, naive).ok()?,
    };
    parsed.format(naive).ok()
}

/// One row of the metadata table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetadataRow {
    pub field: String,
    pub description: String,
    pub values: Vec<String>,
    pub value_type: ValueType,
    pub restrict_defined_values: bool,
}

impl MetadataRow {
    pub fn new(field: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            field: field.into(),
            values,
            ..Default::default()
        }
    }

    /// Switch the value type, dropping enumeration state the new type cannot carry.
    pub fn set_value_type(&mut self, value_type: ValueType) {
        self.value_type = value_type;
        if !value_type.supports_enum() {
            self.values.clear();
            self.restrict_defined_values = false;
        }
    }
}

/// Deduplicate values keeping the first occurrence of each.
pub fn dedup_values(values: &mut Vec<String>) {
    let mut seen = Vec::<String>::with_capacity(values.len());
    values.retain(|v| {
        if seen.contains(v) {
            false
        } else {
            seen.push(v.clone());
            true
        }
    });
}

/// Collapse rows sharing a field name into one.
///
/// The merged row sits at the position of the first occurrence, its values are the
/// order-preserving union of all occurrences, and the other attributes come from the
/// latest occurrence.
pub fn merge_by_field(rows: Vec<MetadataRow>) -> Vec<MetadataRow> {
    let mut merged: Vec<MetadataRow> = Vec::with_capacity(rows.len());
    for row in rows {
        match merged.iter_mut().find(|existing| existing.field == row.field) {
            Some(existing) => {
                let mut values = std::mem::take(&mut existing.values);
                values.extend(row.values);
                dedup_values(&mut values);
                *existing = MetadataRow { values, ..row };
            }
            None => {
                let mut row = row;
                dedup_values(&mut row.values);
                merged.push(row);
            }
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn merge_unions_values_of_duplicate_fields() {
        let rows = vec![
            MetadataRow::new("x", strings(&["a", "b"])),
            MetadataRow::new("x", strings(&["b", "c"])),
        ];

        let merged = merge_by_field(rows);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].values, strings(&["a", "b", "c"]));
    }

    #[test]
    fn merge_prefers_later_attributes_and_keeps_first_position() {
        let rows = vec![
            MetadataRow::new("x", strings(&["a"])),
            MetadataRow::new("y", strings(&["1"])),
            MetadataRow {
                field: "x".into(),
                description: "later".into(),
                values: strings(&["b"]),
                value_type: ValueType::List,
                restrict_defined_values: true,
            },
        ];

        let merged = merge_by_field(rows);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].field, "x");
        assert_eq!(merged[0].description, "later");
        assert_eq!(merged[0].value_type, ValueType::List);
        assert!(merged[0].restrict_defined_values);
        assert_eq!(merged[0].values, strings(&["a", "b"]));
        assert_eq!(merged[1].field, "y");
    }

    #[test]
    fn switching_to_number_clears_enumeration() {
        let mut row = MetadataRow {
            field: "size".into(),
            values: strings(&["small", "large"]),
            restrict_defined_values: true,
            ..Default::default()
        };

        row.set_value_type(ValueType::Number);

        assert!(row.values.is_empty());
        assert!(!row.restrict_defined_values);
        assert_eq!(row.value_type, ValueType::Number);
    }

    #[test]
    fn switching_to_list_keeps_values() {
        let mut row = MetadataRow {
            field: "tags".into(),
            values: strings(&["a"]),
            restrict_defined_values: true,
            ..Default::default()
        };

        row.set_value_type(ValueType::List);

        assert_eq!(row.values, strings(&["a"]));
        assert!(row.restrict_defined_values);
    }

    #[test]
    fn coerce_checks_numbers_and_times() {
        assert_eq!(ValueType::Number.coerce(" 4.5 "), Ok("4.5".to_string()));
        assert_eq!(ValueType::Number.coerce("abc"), Err("invalid_number"));
        assert_eq!(ValueType::Number.coerce("NaN"), Err("invalid_number"));
        assert_eq!(
            ValueType::Time.coerce("2026-02-03T10:20:30"),
            Ok("2026-02-03T10:20:30".to_string())
        );
        assert_eq!(
            ValueType::Time.coerce("2026-02-03T10:20:30+02:00"),
            Ok("2026-02-03T10:20:30".to_string())
        );
        assert_eq!(ValueType::Time.coerce("yesterday"), Err("invalid_time"));
        assert_eq!(ValueType::String.coerce(" keep "), Ok(" keep ".to_string()));
        assert_eq!(ValueType::Time.coerce("   "), Ok(String::new()));
    }

    #[test]
    fn unknown_type_tokens_fall_back_to_string() {
        assert_eq!(ValueType::from_token("list"), ValueType::List);
        assert_eq!(ValueType::from_token("bool"), ValueType::String);
    }
}
