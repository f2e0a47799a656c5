// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Per-field add/edit dialog.
//!
//! The dialog works on a draft copy of one row. Value edits are diffed against the
//! values the row had when the dialog opened and staged as operations; nothing
//! reaches the manage table or its operation log until the dialog is saved.

use eframe::egui;

use crate::models::metadata::{MetadataRow, ValueType, dedup_values};
use crate::models::mode::MetadataMode;
use crate::models::operations::OperationLog;

/// Which parts of the dialog are editable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EditorOptions {
    pub can_edit_field: bool,
    pub can_add_value: bool,
    pub show_description: bool,
    pub show_value_switch: bool,
}

/// Editing session for a single field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValueEditorModel {
    mode: MetadataMode,
    options: EditorOptions,
    row_index: usize,
    draft: MetadataRow,
    snapshot: Vec<String>,
    temp_values: Vec<String>,
    exists_keys: Vec<String>,
    staged: OperationLog,
    field_error: Option<String>,
    duplicate_warning: Option<String>,
    invalid_value: Option<(usize, &'static str)>,
}

impl ValueEditorModel {
    /// Start editing `row`, which sits at `row_index` of the table (or one past the
    /// end for a new row). `exists_keys` are the field names of all other rows.
    pub fn open(
        mode: MetadataMode,
        row: MetadataRow,
        row_index: usize,
        exists_keys: Vec<String>,
        options: EditorOptions,
    ) -> Self {
        Self {
            mode,
            options,
            row_index,
            snapshot: row.values.clone(),
            temp_values: row.values.clone(),
            draft: row,
            exists_keys,
            staged: OperationLog::default(),
            field_error: None,
            duplicate_warning: None,
            invalid_value: None,
        }
    }

    #[cfg(test)]
    pub fn draft(&self) -> &MetadataRow {
        &self.draft
    }

    #[cfg(test)]
    pub fn temp_values(&self) -> &[String] {
        &self.temp_values
    }

    #[cfg(test)]
    pub fn staged(&self) -> &OperationLog {
        &self.staged
    }

    #[cfg(test)]
    pub fn row_index(&self) -> usize {
        self.row_index
    }

    #[cfg(test)]
    pub fn field_error(&self) -> Option<&str> {
        self.field_error.as_deref()
    }

    #[cfg(test)]
    pub fn duplicate_warning(&self) -> Option<&str> {
        self.duplicate_warning.as_deref()
    }

    /// Save is blocked for empty names, values that fail type coercion, and (in
    /// schema modes only) field names that collide with another row.
    pub fn can_save(&self) -> bool {
        !self.draft.field.trim().is_empty()
            && self.invalid_value.is_none()
            && !(self.mode.is_schema() && self.field_error.is_some())
    }
}

/// Messages produced by the dialog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValueEditorMsg {
    FieldChanged(String),
    DescriptionChanged(String),
    ValueTypeChanged(ValueType),
    RestrictToggled(bool),
    ValueChanged { index: usize, value: String },
    ValueBlur,
    DeleteValue(usize),
    AddValue,
    Save,
    Cancel,
}

/// How the dialog ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValueEditorOutcome {
    Saved {
        row: MetadataRow,
        row_index: usize,
        operations: OperationLog,
    },
    Cancelled,
}

/// Apply a message. Returns an outcome once the dialog is saved or cancelled.
pub fn update(model: &mut ValueEditorModel, msg: ValueEditorMsg) -> Option<ValueEditorOutcome> {
    match msg {
        ValueEditorMsg::FieldChanged(name) => {
            if !model.options.can_edit_field {
                return None;
            }
            let taken = model.exists_keys.iter().any(|k| k == name.trim());
            model.field_error = taken.then(|| model.mode.copy().warn_field_exists.to_string());
            model.draft.field = name;
            None
        }
        ValueEditorMsg::DescriptionChanged(text) => {
            model.draft.description = text;
            None
        }
        ValueEditorMsg::ValueTypeChanged(value_type) => {
            model.draft.set_value_type(value_type);
            if !value_type.supports_enum() {
                model.temp_values.clear();
                model.snapshot.clear();
                model.duplicate_warning = None;
            }
            model.invalid_value = None;
            None
        }
        ValueEditorMsg::RestrictToggled(enabled) => {
            if model.draft.value_type.supports_enum() {
                model.draft.restrict_defined_values = enabled;
            }
            None
        }
        ValueEditorMsg::ValueChanged { index, value } => {
            let Some(slot) = model.temp_values.get_mut(index) else {
                return None;
            };
            *slot = value;
            let current = &model.temp_values[index];
            let duplicate = !current.is_empty()
                && model
                    .temp_values
                    .iter()
                    .enumerate()
                    .any(|(i, v)| i != index && v == current);
            model.duplicate_warning =
                duplicate.then(|| model.mode.copy().warn_value_exists.to_string());
            if matches!(model.invalid_value, Some((i, _)) if i == index) {
                model.invalid_value = None;
            }
            None
        }
        ValueEditorMsg::ValueBlur => {
            reconcile(model);
            None
        }
        ValueEditorMsg::DeleteValue(index) => {
            delete_value(model, index);
            None
        }
        ValueEditorMsg::AddValue => {
            model.temp_values.push(String::new());
            model.draft.values.push(String::new());
            dedup_values(&mut model.draft.values);
            None
        }
        ValueEditorMsg::Save => {
            if !model.can_save() || !reconcile(model) {
                return None;
            }
            let operations = std::mem::take(&mut model.staged);
            let mut row = model.draft.clone();
            row.field = row.field.trim().to_string();
            row.values.retain(|v| !v.is_empty());
            Some(ValueEditorOutcome::Saved {
                row,
                row_index: model.row_index,
                operations,
            })
        }
        ValueEditorMsg::Cancel => Some(ValueEditorOutcome::Cancelled),
    }
}

/// Diff the draft values against the snapshot, stage the resulting updates, and
/// commit the draft into the row. Returns `false` when a value fails coercion.
fn reconcile(model: &mut ValueEditorModel) -> bool {
    let value_type = model.draft.value_type;
    let mut coerced = Vec::with_capacity(model.temp_values.len());
    for (index, raw) in model.temp_values.iter().enumerate() {
        match value_type.coerce(raw) {
            Ok(value) => coerced.push(value),
            Err(reason) => {
                model.invalid_value = Some((index, reason));
                return false;
            }
        }
    }
    model.invalid_value = None;
    model.temp_values = coerced;

    let key = staged_key(model);
    // New values are restaged from scratch so earlier blurs leave no stale entries.
    model.staged.discard_updates_for(&key, "");
    for (index, value) in model.temp_values.iter().enumerate() {
        match model.snapshot.get(index) {
            Some(original) if original == value => {
                model.staged.discard_updates_for(&key, original);
            }
            Some(original) => {
                model
                    .staged
                    .record_value_update(&key, original, value.as_str(), Some(value_type));
            }
            None if !value.is_empty() => {
                model
                    .staged
                    .record_value_update(&key, "", value.as_str(), Some(value_type));
            }
            None => {}
        }
    }

    model.draft.values = model.temp_values.clone();
    dedup_values(&mut model.draft.values);
    true
}

/// Point every staged operation at the current (trimmed) field name and return it.
/// The name can change while values are being edited.
fn staged_key(model: &mut ValueEditorModel) -> String {
    let key = model.draft.field.trim().to_string();
    for op in model.staged.deletes.iter_mut() {
        op.key.clone_from(&key);
    }
    for op in model.staged.updates.iter_mut() {
        op.key.clone_from(&key);
    }
    key
}

fn delete_value(model: &mut ValueEditorModel, index: usize) {
    if index >= model.temp_values.len() {
        return;
    }
    let key = staged_key(model);
    let removed = model.temp_values.remove(index);
    if index < model.snapshot.len() {
        let original = model.snapshot.remove(index);
        model.staged.discard_updates_for(&key, &original);
        if !original.is_empty() {
            model.staged.record_value_delete(&key, &original);
        }
    } else {
        model.staged.discard_update(&key, "", &removed);
    }

    model.draft.values = model.temp_values.clone();
    dedup_values(&mut model.draft.values);
    if matches!(model.invalid_value, Some((i, _)) if i == index) {
        model.invalid_value = None;
    }
    model.duplicate_warning = None;
}

fn invalid_value_text(reason: &str) -> &'static str {
    match reason {
        "invalid_number" => "Value must be a number.",
        "invalid_time" => "Value must be a date-time like 2026-02-03T10:00:00.",
        _ => "Value is invalid.",
    }
}

/// Render the dialog and return triggered messages.
pub fn view(ctx: &egui::Context, model: &ValueEditorModel) -> Vec<ValueEditorMsg> {
    let mut msgs = Vec::new();

    egui::Window::new(model.mode.editor_title())
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
        .show(ctx, |ui| {
            ui.set_min_width(360.0);
            render_field_inputs(ui, model, &mut msgs);
            ui.add_space(8.0);
            render_values(ui, model, &mut msgs);
            ui.add_space(10.0);

            ui.horizontal(|ui| {
                if ui
                    .add_enabled(model.can_save(), egui::Button::new("Save"))
                    .clicked()
                {
                    msgs.push(ValueEditorMsg::Save);
                }
                if ui.button("Cancel").clicked() {
                    msgs.push(ValueEditorMsg::Cancel);
                }
            });
        });

    msgs
}

fn render_field_inputs(ui: &mut egui::Ui, model: &ValueEditorModel, msgs: &mut Vec<ValueEditorMsg>) {
    ui.label("Field");
    let mut field = model.draft.field.clone();
    if ui
        .add_enabled(
            model.options.can_edit_field,
            egui::TextEdit::singleline(&mut field).hint_text("e.g. author"),
        )
        .changed()
    {
        msgs.push(ValueEditorMsg::FieldChanged(field));
    }
    if let Some(err) = &model.field_error {
        ui.colored_label(ui.visuals().error_fg_color, err);
    }

    if model.options.show_description {
        ui.add_space(4.0);
        ui.label("Description");
        let mut description = model.draft.description.clone();
        if ui
            .add(egui::TextEdit::multiline(&mut description).desired_rows(2))
            .changed()
        {
            msgs.push(ValueEditorMsg::DescriptionChanged(description));
        }
    }

    if model.mode.is_schema() {
        ui.add_space(4.0);
        ui.horizontal(|ui| {
            ui.label("Type");
            let mut current = model.draft.value_type;
            egui::ComboBox::from_id_salt("value-type")
                .selected_text(current.label())
                .show_ui(ui, |ui| {
                    for value_type in ValueType::ALL {
                        if ui
                            .selectable_value(&mut current, value_type, value_type.label())
                            .clicked()
                        {
                            msgs.push(ValueEditorMsg::ValueTypeChanged(value_type));
                        }
                    }
                });
        });
    }

    if model.options.show_value_switch && model.draft.value_type.supports_enum() {
        let mut restrict = model.draft.restrict_defined_values;
        if ui
            .checkbox(&mut restrict, "Restrict to defined values")
            .changed()
        {
            msgs.push(ValueEditorMsg::RestrictToggled(restrict));
        }
    }
}

fn render_values(ui: &mut egui::Ui, model: &ValueEditorModel, msgs: &mut Vec<ValueEditorMsg>) {
    let enumerable = model.draft.value_type.supports_enum();
    if model.mode.is_schema() && !enumerable {
        return;
    }

    ui.horizontal(|ui| {
        ui.label("Values");
        if model.options.can_add_value
            && ui
                .button(egui_phosphor::regular::PLUS)
                .on_hover_text("Add value")
                .clicked()
        {
            msgs.push(ValueEditorMsg::AddValue);
        }
    });

    for (index, value) in model.temp_values.iter().enumerate() {
        ui.horizontal(|ui| {
            let mut text = value.clone();
            let resp = ui.add(
                egui::TextEdit::singleline(&mut text).hint_text(model.draft.value_type.hint()),
            );
            if resp.changed() {
                msgs.push(ValueEditorMsg::ValueChanged { index, value: text });
            }
            if resp.lost_focus() {
                msgs.push(ValueEditorMsg::ValueBlur);
            }
            if ui
                .button(egui_phosphor::regular::TRASH)
                .on_hover_text("Remove value")
                .clicked()
            {
                msgs.push(ValueEditorMsg::DeleteValue(index));
            }
        });
        if let Some((bad, reason)) = model.invalid_value
            && bad == index
        {
            ui.colored_label(ui.visuals().error_fg_color, invalid_value_text(reason));
        }
    }

    if let Some(warning) = &model.duplicate_warning {
        ui.colored_label(ui.visuals().warn_fg_color, warning);
    }
}
