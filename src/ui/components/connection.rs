// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Connection settings form.
//!
//! The form is a static list of typed field definitions; each field carries its own
//! validator, and the values are kept as strings until the form is submitted.

use std::collections::BTreeMap;

use eframe::egui;

use crate::config::{Config, parse_duration, validate_base_url};
use crate::logic::transcode::SchemaFormat;

/// Input widget of a form field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Secret,
    Toggle,
    Choice(&'static [(&'static str, &'static str)]),
}

/// One form field definition.
#[derive(Clone, Copy, Debug)]
pub struct FormField {
    pub key: &'static str,
    pub label: &'static str,
    pub hint: &'static str,
    pub kind: FieldKind,
    pub validate: fn(&str) -> Option<&'static str>,
}

const SCHEMA_FORMATS: &[(&str, &str)] = &[("array", "Array"), ("json_schema", "JSON Schema")];

pub const CONNECTION_FIELDS: &[FormField] = &[
    FormField {
        key: "base_url",
        label: "Server URL",
        hint: "http://localhost:9380",
        kind: FieldKind::Text,
        validate: check_base_url,
    },
    FormField {
        key: "api_key",
        label: "API key",
        hint: "optional",
        kind: FieldKind::Secret,
        validate: accept_any,
    },
    FormField {
        key: "timeout",
        label: "Timeout",
        hint: "10s",
        kind: FieldKind::Text,
        validate: check_timeout,
    },
    FormField {
        key: "dataset_id",
        label: "Dataset ID",
        hint: "knowledge base id",
        kind: FieldKind::Text,
        validate: check_required,
    },
    FormField {
        key: "schema_format",
        label: "Schema format",
        hint: "",
        kind: FieldKind::Choice(SCHEMA_FORMATS),
        validate: check_schema_format,
    },
    FormField {
        key: "legacy_document_meta",
        label: "Save single documents via set_meta",
        hint: "",
        kind: FieldKind::Toggle,
        validate: accept_any,
    },
];

fn accept_any(_: &str) -> Option<&'static str> {
    None
}

fn check_required(value: &str) -> Option<&'static str> {
    value.trim().is_empty().then_some("required")
}

fn check_base_url(value: &str) -> Option<&'static str> {
    if value.trim().is_empty() {
        return Some("required");
    }
    validate_base_url(value).err().map(|_| "invalid_url")
}

fn check_timeout(value: &str) -> Option<&'static str> {
    match parse_duration(value) {
        Ok(d) if !d.is_zero() => None,
        _ => Some("invalid_duration"),
    }
}

fn check_schema_format(value: &str) -> Option<&'static str> {
    SCHEMA_FORMATS
        .iter()
        .all(|(token, _)| *token != value)
        .then_some("invalid_choice")
}

fn error_text(code: &str) -> &'static str {
    match code {
        "required" => "This field is required.",
        "invalid_url" => "Must be an http(s) URL.",
        "invalid_duration" => "Use e.g. 500ms, 10s or 2m.",
        "invalid_choice" => "Pick one of the listed options.",
        _ => "Invalid value.",
    }
}

/// Validated connection settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: std::time::Duration,
    pub dataset_id: String,
    pub schema_format: SchemaFormat,
    pub legacy_document_meta: bool,
}

/// Form state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConnectionModel {
    open: bool,
    values: BTreeMap<&'static str, String>,
    errors: BTreeMap<&'static str, &'static str>,
}

impl ConnectionModel {
    /// Prefill the form from the loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        let schema_format = match config.schema_format() {
            SchemaFormat::Array => "array",
            SchemaFormat::JsonSchema => "json_schema",
        };
        let timeout = config
            .server
            .timeout
            .clone()
            .unwrap_or_else(|| "10s".to_string());
        let values = [
            ("base_url", config.base_url().to_string()),
            ("api_key", config.api_key().unwrap_or_default().to_string()),
            ("timeout", timeout),
            ("dataset_id", config.dataset_id().unwrap_or_default().to_string()),
            ("schema_format", schema_format.to_string()),
            (
                "legacy_document_meta",
                config.legacy_document_meta().to_string(),
            ),
        ];
        Self {
            open: false,
            values: values.into_iter().collect(),
            errors: BTreeMap::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn value(&self, key: &str) -> &str {
        self.values.get(key).map(String::as_str).unwrap_or_default()
    }

    pub fn error(&self, key: &str) -> Option<&'static str> {
        self.errors.get(key).copied()
    }

    /// Settings from the current values, if every field validates.
    pub fn settings(&self) -> Option<ConnectionSettings> {
        if CONNECTION_FIELDS
            .iter()
            .any(|f| (f.validate)(self.value(f.key)).is_some())
        {
            return None;
        }
        let schema_format = match self.value("schema_format") {
            "json_schema" => SchemaFormat::JsonSchema,
            _ => SchemaFormat::Array,
        };
        let api_key = Some(self.value("api_key").trim())
            .filter(|k| !k.is_empty())
            .map(str::to_string);
        Some(ConnectionSettings {
            base_url: self.value("base_url").trim().trim_end_matches('/').to_string(),
            api_key,
            timeout: parse_duration(self.value("timeout")).ok()?,
            dataset_id: self.value("dataset_id").trim().to_string(),
            schema_format,
            legacy_document_meta: self.value("legacy_document_meta") == "true",
        })
    }
}

/// Messages produced by the form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectionMsg {
    Open,
    Close,
    Changed { key: &'static str, value: String },
    Submit,
}

/// Commands requested by the form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectionCommand {
    Connect(ConnectionSettings),
}

/// Feedback surfaced to the status bar/modal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionEvent {
    pub message: String,
    pub is_error: bool,
}

/// Update the form based on a message.
pub fn update(
    model: &mut ConnectionModel,
    msg: ConnectionMsg,
    cmds: &mut Vec<ConnectionCommand>,
) -> Option<ConnectionEvent> {
    match msg {
        ConnectionMsg::Open => {
            model.open = true;
            None
        }
        ConnectionMsg::Close => {
            model.open = false;
            model.errors.clear();
            None
        }
        ConnectionMsg::Changed { key, value } => {
            model.errors.remove(key);
            model.values.insert(key, value);
            None
        }
        ConnectionMsg::Submit => {
            model.errors = CONNECTION_FIELDS
                .iter()
                .filter_map(|f| (f.validate)(model.value(f.key)).map(|code| (f.key, code)))
                .collect();
            match model.settings() {
                Some(settings) => {
                    model.open = false;
                    cmds.push(ConnectionCommand::Connect(settings));
                    None
                }
                None => Some(ConnectionEvent {
                    message: "Please fix the highlighted connection settings.".into(),
                    is_error: true,
                }),
            }
        }
    }
}

/// Render the form window and return triggered messages.
pub fn view(ctx: &egui::Context, model: &ConnectionModel) -> Vec<ConnectionMsg> {
    let mut msgs = Vec::new();
    if !model.is_open() {
        return msgs;
    }

    egui::Window::new("Connection")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
        .show(ctx, |ui| {
            egui::Grid::new("connection-form")
                .num_columns(2)
                .spacing([12.0, 6.0])
                .show(ui, |ui| {
                    for field in CONNECTION_FIELDS {
                        ui.label(field.label);
                        ui.vertical(|ui| {
                            render_field(ui, model, field, &mut msgs);
                            if let Some(code) = model.error(field.key) {
                                ui.colored_label(ui.visuals().error_fg_color, error_text(code));
                            }
                        });
                        ui.end_row();
                    }
                });
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.button("Connect").clicked() {
                    msgs.push(ConnectionMsg::Submit);
                }
                if ui.button("Cancel").clicked() {
                    msgs.push(ConnectionMsg::Close);
                }
            });
        });

    msgs
}

fn render_field(
    ui: &mut egui::Ui,
    model: &ConnectionModel,
    field: &FormField,
    msgs: &mut Vec<ConnectionMsg>,
) {
    let current = model.value(field.key);
    match field.kind {
        FieldKind::Text | FieldKind::Secret => {
            let mut text = current.to_string();
            let edit = egui::TextEdit::singleline(&mut text)
                .hint_text(field.hint)
                .password(field.kind == FieldKind::Secret);
            if ui.add(edit).changed() {
                msgs.push(ConnectionMsg::Changed {
                    key: field.key,
                    value: text,
                });
            }
        }
        FieldKind::Toggle => {
            let mut on = current == "true";
            if ui.checkbox(&mut on, "").changed() {
                msgs.push(ConnectionMsg::Changed {
                    key: field.key,
                    value: on.to_string(),
                });
            }
        }
        FieldKind::Choice(options) => {
            let selected = options
                .iter()
                .find(|(token, _)| *token == current)
                .map(|(_, label)| *label)
                .unwrap_or("-");
            egui::ComboBox::from_id_salt(field.key)
                .selected_text(selected)
                .show_ui(ui, |ui| {
                    for (token, label) in options {
                        if ui.selectable_label(*token == current, *label).clicked() {
                            msgs.push(ConnectionMsg::Changed {
                                key: field.key,
                                value: token.to_string(),
                            });
                        }
                    }
                });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn filled() -> ConnectionModel {
        let mut model = ConnectionModel::from_config(&Config::default());
        let mut cmds = Vec::new();
        update(
            &mut model,
            ConnectionMsg::Changed {
                key: "dataset_id",
                value: "kb1".into(),
            },
            &mut cmds,
        );
        model
    }

    #[test]
    fn defaults_prefill_every_field() {
        let model = ConnectionModel::from_config(&Config::default());

        for field in CONNECTION_FIELDS {
            assert!(model.values.contains_key(field.key), "{}", field.key);
        }
        assert_eq!(model.value("base_url"), "http://localhost:9380");
        assert_eq!(model.value("schema_format"), "array");
    }

    #[test]
    fn missing_dataset_blocks_submit() {
        let mut model = ConnectionModel::from_config(&Config::default());
        let mut cmds = Vec::new();
        update(&mut model, ConnectionMsg::Open, &mut cmds);

        let event = update(&mut model, ConnectionMsg::Submit, &mut cmds);

        assert!(event.is_some_and(|e| e.is_error));
        assert!(cmds.is_empty());
        assert!(model.is_open());
        assert_eq!(model.error("dataset_id"), Some("required"));
    }

    #[test]
    fn invalid_url_and_timeout_are_reported_per_field() {
        let mut model = filled();
        let mut cmds = Vec::new();
        for (key, value) in [("base_url", "not a url"), ("timeout", "0s")] {
            update(
                &mut model,
                ConnectionMsg::Changed {
                    key,
                    value: value.into(),
                },
                &mut cmds,
            );
        }

        update(&mut model, ConnectionMsg::Submit, &mut cmds);

        assert_eq!(model.error("base_url"), Some("invalid_url"));
        assert_eq!(model.error("timeout"), Some("invalid_duration"));
        assert_eq!(model.error("dataset_id"), None);
        assert!(cmds.is_empty());
    }

    #[test]
    fn valid_form_submits_typed_settings() {
        let mut model = filled();
        let mut cmds = Vec::new();
        for (key, value) in [
            ("base_url", "https://kb.example.org/"),
            ("api_key", "  token "),
            ("schema_format", "json_schema"),
            ("legacy_document_meta", "true"),
        ] {
            update(
                &mut model,
                ConnectionMsg::Changed {
                    key,
                    value: value.into(),
                },
                &mut cmds,
            );
        }
        update(&mut model, ConnectionMsg::Open, &mut cmds);

        let event = update(&mut model, ConnectionMsg::Submit, &mut cmds);

        assert!(event.is_none());
        assert!(!model.is_open());
        assert_eq!(
            cmds,
            vec![ConnectionCommand::Connect(ConnectionSettings {
                base_url: "https://kb.example.org".into(),
                api_key: Some("token".into()),
                timeout: Duration::from_secs(10),
                dataset_id: "kb1".into(),
                schema_format: SchemaFormat::JsonSchema,
                legacy_document_meta: true,
            })]
        );
    }

    #[test]
    fn editing_a_field_clears_its_error() {
        let mut model = ConnectionModel::from_config(&Config::default());
        let mut cmds = Vec::new();
        update(&mut model, ConnectionMsg::Submit, &mut cmds);
        assert!(model.error("dataset_id").is_some());

        update(
            &mut model,
            ConnectionMsg::Changed {
                key: "dataset_id",
                value: "x".into(),
            },
            &mut cmds,
        );

        assert!(model.error("dataset_id").is_none());
    }
}
