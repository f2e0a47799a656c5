// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Conversions between server metadata payloads and [`MetadataRow`]s.
//!
//! Every reader here is permissive: missing or oddly shaped members degrade to empty
//! strings and lists instead of failing, since partial metadata is still worth showing.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::models::metadata::{MetadataRow, ValueType};

/// One entry of the array-shaped field schema.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SchemaEntry {
    pub key: String,
    pub description: String,
    #[serde(rename = "enum")]
    pub values: Vec<String>,
}

/// Wire shape used when a field schema is saved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaFormat {
    /// `[{key, description, enum}]`
    #[default]
    Array,
    /// `{type: "object", properties, additionalProperties}`
    JsonSchema,
}

/// Encode `rows` as a field schema in the requested shape.
pub fn encode_schema(rows: &[MetadataRow], format: SchemaFormat) -> Value {
    match format {
        SchemaFormat::Array => json!(to_schema_json(rows)),
        SchemaFormat::JsonSchema => to_json_schema(rows),
    }
}

/// Rows from the aggregated summary (`field -> [[value, count], ...]` or
/// `field -> {type, values}`).
pub fn from_aggregated_summary(summary: &Value) -> Vec<MetadataRow> {
    let Some(fields) = summary.as_object() else {
        return Vec::new();
    };

    fields
        .iter()
        .map(|(field, entry)| {
            let (value_type, pairs) = match entry {
                Value::Array(pairs) => (ValueType::default(), pairs.as_slice()),
                Value::Object(obj) => (
                    obj.get("type")
                        .and_then(Value::as_str)
                        .map(ValueType::from_token)
                        .unwrap_or_default(),
                    obj.get("values")
                        .and_then(Value::as_array)
                        .map(Vec::as_slice)
                        .unwrap_or_default(),
                ),
                _ => (ValueType::default(), &[][..]),
            };

            let values = pairs
                .iter()
                .filter_map(|pair| match pair {
                    Value::Array(items) => items.first().and_then(scalar_to_string),
                    other => scalar_to_string(other),
                })
                .collect();

            MetadataRow {
                field: field.clone(),
                values,
                value_type,
                ..Default::default()
            }
        })
        .collect()
}

/// Rows from a document's flat metadata object.
pub fn from_flat_json(obj: &Value) -> Vec<MetadataRow> {
    let Some(fields) = obj.as_object() else {
        return Vec::new();
    };

    fields
        .iter()
        .map(|(field, value)| {
            let values = match value {
                Value::Null => Vec::new(),
                Value::Array(items) => items.iter().filter_map(scalar_to_string).collect(),
                Value::String(s) => vec![s.clone()],
                Value::Object(_) => vec![value.to_string()],
                other => vec![other.to_string()],
            };
            MetadataRow::new(field.clone(), values)
        })
        .collect()
}

/// Flat metadata object keeping every value of every row.
pub fn to_flat_json(rows: &[MetadataRow]) -> Value {
    let map: Map<String, Value> = rows
        .iter()
        .map(|row| {
            let values = row.values.iter().cloned().map(Value::String).collect();
            (row.field.clone(), Value::Array(values))
        })
        .collect();
    Value::Object(map)
}

/// Array-shaped field schema. Rows without a field name are skipped.
pub fn to_schema_json(rows: &[MetadataRow]) -> Vec<SchemaEntry> {
    rows.iter()
        .filter(|row| !row.field.trim().is_empty())
        .map(|row| SchemaEntry {
            key: row.field.clone(),
            description: row.description.clone(),
            values: row.values.clone(),
        })
        .collect()
}

/// JSON-Schema object shape of the field schema.
///
/// Enumerations are only emitted for enumerable types with the restriction flag on.
pub fn to_json_schema(rows: &[MetadataRow]) -> Value {
    let properties: Map<String, Value> = rows
        .iter()
        .filter(|row| !row.field.trim().is_empty())
        .map(|row| {
            let values = if row.value_type.supports_enum() && row.restrict_defined_values {
                row.values.as_slice()
            } else {
                &[]
            };
            (
                row.field.clone(),
                property_for(row.value_type, &row.description, values),
            )
        })
        .collect();

    json!({
        "type": "object",
        "properties": properties,
        "additionalProperties": false,
    })
}

fn property_for(value_type: ValueType, description: &str, values: &[String]) -> Value {
    let mut property = Map::new();
    property.insert("description".into(), json!(description));
    match value_type {
        ValueType::Number => {
            property.insert("type".into(), json!("number"));
        }
        ValueType::Time => {
            property.insert("type".into(), json!("string"));
            property.insert("format".into(), json!("date-time"));
        }
        ValueType::List => {
            property.insert("type".into(), json!("array"));
            let mut items = Map::new();
            items.insert("type".into(), json!("string"));
            if !values.is_empty() {
                items.insert("enum".into(), json!(values));
            }
            property.insert("items".into(), Value::Object(items));
        }
        ValueType::String => {
            property.insert("type".into(), json!("string"));
            if !values.is_empty() {
                property.insert("enum".into(), json!(values));
            }
        }
    }
    Value::Object(property)
}

/// Rows from either schema shape: `[{key, description, enum}]` or `{properties: {..}}`.
pub fn from_schema_json(data: &Value) -> Vec<MetadataRow> {
    match data {
        Value::Array(entries) => entries
            .iter()
            .filter_map(Value::as_object)
            .map(|entry| {
                let values = string_list(entry.get("enum"));
                MetadataRow {
                    field: str_member(entry.get("key")),
                    description: str_member(entry.get("description")),
                    restrict_defined_values: !values.is_empty(),
                    values,
                    value_type: ValueType::default(),
                }
            })
            .collect(),
        Value::Object(obj) => {
            let Some(properties) = obj.get("properties").and_then(Value::as_object) else {
                return Vec::new();
            };
            properties
                .iter()
                .map(|(field, property)| {
                    let values = match property.get("enum") {
                        Some(Value::Array(_)) => string_list(property.get("enum")),
                        _ => string_list(property.get("items").and_then(|i| i.get("enum"))),
                    };
                    MetadataRow {
                        field: field.clone(),
                        description: str_member(property.get("description")),
                        restrict_defined_values: !values.is_empty(),
                        values,
                        value_type: value_type_of(property),
                    }
                })
                .collect()
        }
        _ => Vec::new(),
    }
}

/// Derive the row value type from a JSON-Schema property.
fn value_type_of(property: &Value) -> ValueType {
    match property.get("type").and_then(Value::as_str) {
        Some("array") => ValueType::List,
        Some("number") | Some("integer") => ValueType::Number,
        Some("string") if property.get("format").is_some() => ValueType::Time,
        _ => ValueType::String,
    }
}

fn str_member(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_default()
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(scalar_to_string).collect())
        .unwrap_or_default()
}

/// Stringify a JSON scalar; `null` yields nothing, containers their JSON text.
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
