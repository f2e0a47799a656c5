// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Manage dialog: the metadata table of one editing session.
//!
//! A session is opened in one [`MetadataMode`] and keeps it until closed. Row edits
//! mutate the table optimistically and are journalled in an [`OperationLog`]; the
//! mode's save strategy decides whether that log or a transcoded schema is sent.

use std::collections::BTreeSet;

use eframe::egui;
use egui_extras::{Column, TableBuilder};
use serde_json::Value;

use crate::logic::cache::{Invalidation, QueryKey};
use crate::logic::transcode::{self, SchemaFormat};
use crate::models::builtin::{self, BuiltInMetadataItem, BUILT_IN_FIELDS};
use crate::models::metadata::{MetadataRow, dedup_values, merge_by_field};
use crate::models::mode::{FetchStrategy, MetadataMode, SaveStrategy};
use crate::models::operations::OperationLog;
use crate::ui::components::value_editor::{
    self, EditorOptions, ValueEditorModel, ValueEditorMsg, ValueEditorOutcome,
};

/// Values shown per row while the row is collapsed.
const COLLAPSED_VALUES: usize = 2;

/// Capabilities of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ManageOptions {
    pub can_add: bool,
    pub can_delete_single_value: bool,
    pub can_edit_field: bool,
    pub can_add_value: bool,
    pub show_description: bool,
    pub show_value_switch: bool,
    /// Save `UpdateSingle` sessions through the flat single-document endpoint.
    pub legacy_document_meta: bool,
    pub schema_format: SchemaFormat,
}

impl ManageOptions {
    /// Defaults matching how each mode is normally presented.
    pub fn for_mode(mode: MetadataMode) -> Self {
        let schema = mode.is_schema();
        Self {
            can_add: true,
            can_delete_single_value: true,
            can_edit_field: true,
            can_add_value: true,
            show_description: schema,
            show_value_switch: schema,
            legacy_document_meta: false,
            schema_format: SchemaFormat::default(),
        }
    }
}

/// Where a session reads from and writes to.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionTarget {
    pub dataset_id: Option<String>,
    pub document_ids: Vec<String>,
}

impl SessionTarget {
    fn dataset_id(&self) -> Option<&str> {
        self.dataset_id.as_deref().filter(|id| !id.trim().is_empty())
    }

    fn document_id(&self) -> Option<&str> {
        self.document_ids
            .first()
            .map(String::as_str)
            .filter(|id| !id.trim().is_empty())
    }
}

/// Everything needed to open a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenRequest {
    pub mode: MetadataMode,
    pub target: SessionTarget,
    /// Rows provided by the caller; used directly by seed modes and as a fallback
    /// when a fetch mode has no dataset to fetch from.
    pub seed: Vec<MetadataRow>,
    /// Selected built-in field keys (dataset schema sessions).
    pub built_in: Vec<String>,
    pub options: ManageOptions,
}

/// What a pending delete confirmation would remove, keyed by field name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeleteTarget {
    Row(String),
    Value { field: String, value: String },
    Batch(Vec<String>),
}

/// Open delete confirmation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfirmDelete {
    pub target: DeleteTarget,
    pub title: &'static str,
    pub warning: &'static str,
}

/// In-place edit of one value chip.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineEdit {
    pub row: usize,
    pub value_index: usize,
    pub original: String,
    pub buffer: String,
}

/// State of the manage dialog.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ManageModel {
    open: bool,
    mode: MetadataMode,
    options: Option<ManageOptions>,
    target: SessionTarget,
    rows: Vec<MetadataRow>,
    operations: OperationLog,
    selected: BTreeSet<String>,
    expanded: BTreeSet<String>,
    built_in: Vec<String>,
    loading: bool,
    saving: bool,
    confirm: Option<ConfirmDelete>,
    inline_edit: Option<InlineEdit>,
    editor: Option<ValueEditorModel>,
    /// Bumped on every open; save replies carry the number they were issued under.
    session: u64,
}

impl ManageModel {
    pub fn is_open(&self) -> bool {
        self.open
    }

    #[cfg(test)]
    pub fn rows(&self) -> &[MetadataRow] {
        &self.rows
    }

    #[cfg(test)]
    pub fn operations(&self) -> &OperationLog {
        &self.operations
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    #[cfg(test)]
    pub fn confirm(&self) -> Option<&ConfirmDelete> {
        self.confirm.as_ref()
    }

    #[cfg(test)]
    pub fn editor(&self) -> Option<&ValueEditorModel> {
        self.editor.as_ref()
    }

    #[cfg(test)]
    pub fn selected(&self) -> &BTreeSet<String> {
        &self.selected
    }

    #[cfg(test)]
    pub fn built_in(&self) -> &[String] {
        &self.built_in
    }

    fn options(&self) -> ManageOptions {
        self.options
            .unwrap_or_else(|| ManageOptions::for_mode(self.mode))
    }

    /// Cache key of the summary this session reads.
    pub fn summary_key(&self) -> Option<QueryKey> {
        let dataset_id = self.target.dataset_id()?;
        let document_ids = match self.mode {
            MetadataMode::UpdateSingle => self.target.document_ids.clone(),
            _ => Vec::new(),
        };
        Some(QueryKey::MetadataSummary {
            dataset_id: dataset_id.to_string(),
            document_ids,
        })
    }

    /// Save strategy in effect, including the legacy single-document override.
    pub fn save_strategy(&self) -> SaveStrategy {
        if self.mode == MetadataMode::UpdateSingle && self.options().legacy_document_meta {
            SaveStrategy::FlatDocumentMeta
        } else {
            self.mode.strategy().save
        }
    }
}

/// Messages produced by the manage dialog.
#[derive(Clone, Debug, PartialEq)]
pub enum ManageMsg {
    Open(OpenRequest),
    Close,
    SummaryLoaded {
        key: QueryKey,
        rows: Result<Vec<MetadataRow>, String>,
    },
    RequestDelete(DeleteTarget),
    ConfirmDelete,
    CancelDelete,
    ToggleSelect(String),
    ClearSelection,
    ToggleExpanded(String),
    ToggleBuiltIn(String),
    StartAddRow,
    StartEditRow(usize),
    Editor(ValueEditorMsg),
    StartInlineEdit { row: usize, value_index: usize },
    InlineEditChanged(String),
    CommitInlineEdit,
    CancelInlineEdit,
    SaveRequested,
    SaveCompleted {
        ticket: SaveTicket,
        result: Result<(), String>,
    },
}

/// Identity of one save, echoed back with its reply.
///
/// The reply may arrive after the session that issued it was closed or replaced,
/// so everything needed to finish the save travels with the ticket.
#[derive(Clone, Debug, PartialEq)]
pub struct SaveTicket {
    pub session: u64,
    pub mode: MetadataMode,
    pub strategy: SaveStrategy,
    pub dataset_id: Option<String>,
    pub document_id: Option<String>,
    /// Transcoded schema of schema saves.
    pub schema: Option<Value>,
}

impl SaveTicket {
    /// Caches invalidated by a successful save.
    pub fn invalidations(&self) -> Vec<Invalidation> {
        let Some(dataset_id) = self.dataset_id.clone() else {
            return Vec::new();
        };
        match self.strategy {
            SaveStrategy::ApplyOperations
            | SaveStrategy::ApplyOperationsForDocuments
            | SaveStrategy::FlatDocumentMeta => vec![
                Invalidation::DocumentList {
                    dataset_id: dataset_id.clone(),
                },
                Invalidation::MetadataSummaries { dataset_id },
            ],
            SaveStrategy::FieldSchema => vec![Invalidation::Dataset { dataset_id }],
            SaveStrategy::DocumentFieldSchema => vec![Invalidation::DocumentList { dataset_id }],
        }
    }
}

/// Payload of one save call.
#[derive(Clone, Debug, PartialEq)]
pub enum SaveRequest {
    ApplyOperations {
        dataset_id: String,
        document_ids: Vec<String>,
        operations: OperationLog,
    },
    FieldSchema {
        dataset_id: String,
        schema: Value,
        built_in: Vec<BuiltInMetadataItem>,
    },
    DocumentFieldSchema {
        document_id: String,
        schema: Value,
    },
    DocumentMeta {
        document_id: String,
        meta: Value,
    },
}

/// Side effects requested by the manage dialog.
#[derive(Clone, Debug, PartialEq)]
pub enum ManageCommand {
    FetchSummary(QueryKey),
    Save {
        ticket: SaveTicket,
        request: SaveRequest,
    },
    Invalidate(Invalidation),
}

/// Feedback surfaced to the status bar/modal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManageEvent {
    pub message: String,
    pub is_error: bool,
}

impl ManageEvent {
    fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: false,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: true,
        }
    }
}

/// Update the model based on a message.
pub fn update(
    model: &mut ManageModel,
    msg: ManageMsg,
    cmds: &mut Vec<ManageCommand>,
) -> Option<ManageEvent> {
    match msg {
        ManageMsg::Open(request) => {
            open_session(model, request, cmds);
            None
        }
        ManageMsg::Close => {
            close_session(model);
            None
        }
        ManageMsg::SummaryLoaded { key, rows } => {
            if !model.open || model.summary_key().as_ref() != Some(&key) {
                return None;
            }
            model.loading = false;
            match rows {
                Ok(rows) => {
                    model.rows = merge_by_field(rows);
                    None
                }
                Err(err) => Some(ManageEvent::error(format!(
                    "Failed to load metadata:\n\n{err}"
                ))),
            }
        }
        ManageMsg::RequestDelete(target) => {
            let copy = model.mode.copy();
            let warning = match target {
                DeleteTarget::Value { .. } => copy.warn_value_delete,
                DeleteTarget::Row(_) | DeleteTarget::Batch(_) => copy.warn_field_delete,
            };
            model.confirm = Some(ConfirmDelete {
                target,
                title: copy.delete_title,
                warning,
            });
            None
        }
        ManageMsg::ConfirmDelete => {
            if let Some(confirm) = model.confirm.take() {
                match confirm.target {
                    DeleteTarget::Row(field) => handle_delete_single_row(model, &field),
                    DeleteTarget::Value { field, value } => {
                        handle_delete_single_value(model, &field, &value)
                    }
                    DeleteTarget::Batch(fields) => handle_delete_batch_rows(model, &fields),
                }
            }
            None
        }
        ManageMsg::CancelDelete => {
            model.confirm = None;
            None
        }
        ManageMsg::ToggleSelect(field) => {
            if !model.selected.remove(&field) {
                model.selected.insert(field);
            }
            None
        }
        ManageMsg::ClearSelection => {
            model.selected.clear();
            None
        }
        ManageMsg::ToggleExpanded(field) => {
            if !model.expanded.remove(&field) {
                model.expanded.insert(field);
            }
            None
        }
        ManageMsg::ToggleBuiltIn(key) => {
            if let Some(pos) = model.built_in.iter().position(|k| *k == key) {
                model.built_in.remove(pos);
            } else if builtin::is_built_in(&key) {
                model.built_in.push(key);
            }
            None
        }
        ManageMsg::StartAddRow => {
            if model.options().can_add {
                let index = model.rows.len();
                model.editor = Some(open_editor(model, MetadataRow::default(), index));
            }
            None
        }
        ManageMsg::StartEditRow(index) => {
            if let Some(row) = model.rows.get(index).cloned() {
                model.editor = Some(open_editor(model, row, index));
            }
            None
        }
        ManageMsg::Editor(msg) => {
            let outcome = model
                .editor
                .as_mut()
                .and_then(|editor| value_editor::update(editor, msg));
            match outcome {
                Some(ValueEditorOutcome::Saved {
                    row,
                    row_index,
                    operations,
                }) => {
                    model.editor = None;
                    model.operations.absorb(operations);
                    handle_save_values(model, row, row_index);
                }
                Some(ValueEditorOutcome::Cancelled) => model.editor = None,
                None => {}
            }
            None
        }
        ManageMsg::StartInlineEdit { row, value_index } => {
            let original = model
                .rows
                .get(row)
                .and_then(|r| r.values.get(value_index))
                .cloned();
            model.inline_edit = original.map(|original| InlineEdit {
                row,
                value_index,
                buffer: original.clone(),
                original,
            });
            None
        }
        ManageMsg::InlineEditChanged(text) => {
            if let Some(edit) = model.inline_edit.as_mut() {
                edit.buffer = text;
            }
            None
        }
        ManageMsg::CommitInlineEdit => commit_inline_edit(model),
        ManageMsg::CancelInlineEdit => {
            model.inline_edit = None;
            None
        }
        ManageMsg::SaveRequested => request_save(model, cmds),
        ManageMsg::SaveCompleted { ticket, result } => complete_save(model, ticket, result, cmds),
    }
}

fn open_session(model: &mut ManageModel, request: OpenRequest, cmds: &mut Vec<ManageCommand>) {
    *model = ManageModel {
        open: true,
        session: model.session.wrapping_add(1),
        mode: request.mode,
        options: Some(request.options),
        target: request.target,
        built_in: request.built_in,
        ..Default::default()
    };

    match request.mode.strategy().fetch {
        FetchStrategy::AggregatedSummary => match model.summary_key() {
            Some(key) => {
                model.loading = true;
                cmds.push(ManageCommand::FetchSummary(key));
            }
            None => model.rows = merge_by_field(request.seed),
        },
        FetchStrategy::CallerSeed => model.rows = merge_by_field(request.seed),
    }
    tracing::debug!(mode = ?model.mode, rows = model.rows.len(), "manage session opened");
}

/// Closing without saving discards every pending operation.
fn close_session(model: &mut ManageModel) {
    if !model.operations.is_empty() {
        tracing::debug!(
            deletes = model.operations.deletes().len(),
            updates = model.operations.updates().len(),
            "discarding unsaved metadata operations"
        );
    }
    *model = ManageModel {
        session: model.session,
        ..Default::default()
    };
}

fn open_editor(model: &ManageModel, row: MetadataRow, row_index: usize) -> ValueEditorModel {
    let options = model.options();
    let is_new = row_index >= model.rows.len();
    let exists_keys = model
        .rows
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != row_index)
        .map(|(_, r)| r.field.clone())
        .collect();
    // Value operations are keyed by field name, so existing fields keep their name
    // outside the schema modes.
    let can_edit_field = options.can_edit_field && (is_new || model.mode.is_schema());
    ValueEditorModel::open(
        model.mode,
        row,
        row_index,
        exists_keys,
        EditorOptions {
            can_edit_field,
            can_add_value: options.can_add_value,
            show_description: options.show_description,
            show_value_switch: options.show_value_switch,
        },
    )
}

/// Remove one value from the row of `field` and journal the delete.
pub fn handle_delete_single_value(model: &mut ManageModel, field: &str, value: &str) {
    let Some(row) = model.rows.iter_mut().find(|row| row.field == field) else {
        return;
    };
    let before = row.values.len();
    row.values.retain(|v| v != value);
    if row.values.len() != before {
        model.operations.record_value_delete(&row.field, value);
    }
}

/// Remove the row of `field` and journal the field delete.
pub fn handle_delete_single_row(model: &mut ManageModel, field: &str) {
    let Some(index) = model.rows.iter().position(|row| row.field == field) else {
        return;
    };
    let row = model.rows.remove(index);
    model.selected.remove(&row.field);
    model.expanded.remove(&row.field);
    model.operations.record_field_delete(&row.field);
}

/// Remove every row whose field is listed and journal one field delete per key.
pub fn handle_delete_batch_rows(model: &mut ManageModel, fields: &[String]) {
    model.rows.retain(|row| !fields.contains(&row.field));
    for field in fields {
        model.selected.remove(field);
        model.expanded.remove(field);
    }
    model.operations.record_batch_field_delete(fields);
}

/// Put `row` at `index` (or append it) and merge rows sharing a field name.
pub fn handle_save_values(model: &mut ManageModel, row: MetadataRow, index: usize) {
    if index < model.rows.len() {
        model.rows[index] = row;
    } else {
        model.rows.push(row);
    }
    model.rows = merge_by_field(std::mem::take(&mut model.rows));
}

fn commit_inline_edit(model: &mut ManageModel) -> Option<ManageEvent> {
    let edit = model.inline_edit.take()?;
    let row = model.rows.get_mut(edit.row)?;
    let replacement = match row.value_type.coerce(edit.buffer.trim()) {
        Ok(value) => value,
        Err(reason) => {
            return Some(ManageEvent::error(format!(
                "Value '{}' for '{}' is invalid ({reason}).",
                edit.buffer.trim(),
                row.field
            )));
        }
    };
    if replacement.is_empty() || replacement == edit.original {
        return None;
    }

    let slot = row.values.get_mut(edit.value_index)?;
    *slot = replacement.clone();
    dedup_values(&mut row.values);
    model.operations.record_value_update(
        &row.field,
        &edit.original,
        replacement,
        Some(row.value_type),
    );
    None
}

fn request_save(model: &mut ManageModel, cmds: &mut Vec<ManageCommand>) -> Option<ManageEvent> {
    if model.saving || model.loading {
        return None;
    }

    let strategy = model.save_strategy();
    let mut ticket = SaveTicket {
        session: model.session,
        mode: model.mode,
        strategy,
        dataset_id: model.target.dataset_id().map(str::to_string),
        document_id: model.target.document_id().map(str::to_string),
        schema: None,
    };
    let request = match strategy {
        SaveStrategy::ApplyOperations | SaveStrategy::ApplyOperationsForDocuments => {
            if model.operations.is_empty() {
                return Some(ManageEvent::info("No pending metadata changes."));
            }
            let Some(dataset_id) = ticket.dataset_id.clone() else {
                return Some(ManageEvent::error("No dataset selected."));
            };
            let document_ids = match model.mode {
                MetadataMode::UpdateSingle => model.target.document_ids.clone(),
                _ => Vec::new(),
            };
            SaveRequest::ApplyOperations {
                dataset_id,
                document_ids,
                operations: model.operations.clone(),
            }
        }
        SaveStrategy::FlatDocumentMeta => {
            let Some(document_id) = ticket.document_id.clone() else {
                return Some(ManageEvent::error("No document selected."));
            };
            SaveRequest::DocumentMeta {
                document_id,
                meta: transcode::to_flat_json(&model.rows),
            }
        }
        SaveStrategy::FieldSchema => {
            let Some(dataset_id) = ticket.dataset_id.clone() else {
                return Some(ManageEvent::error("No dataset selected."));
            };
            let schema = transcode::encode_schema(&model.rows, model.options().schema_format);
            ticket.schema = Some(schema.clone());
            SaveRequest::FieldSchema {
                dataset_id,
                schema,
                built_in: builtin::selection(model.built_in.as_slice()),
            }
        }
        SaveStrategy::DocumentFieldSchema => {
            let Some(document_id) = ticket.document_id.clone() else {
                return Some(ManageEvent::error("No document selected."));
            };
            let schema = transcode::encode_schema(&model.rows, model.options().schema_format);
            ticket.schema = Some(schema.clone());
            SaveRequest::DocumentFieldSchema {
                document_id,
                schema,
            }
        }
    };

    model.saving = true;
    cmds.push(ManageCommand::Save { ticket, request });
    None
}

/// Finish a save. Invalidation follows the ticket; the session is only reset and
/// closed when it is still the one that issued the save.
fn complete_save(
    model: &mut ManageModel,
    ticket: SaveTicket,
    result: Result<(), String>,
    cmds: &mut Vec<ManageCommand>,
) -> Option<ManageEvent> {
    let current = model.open && model.saving && model.session == ticket.session;
    if !current {
        tracing::debug!(session = ticket.session, "save reply for a closed session");
    }

    if let Err(err) = result {
        if current {
            model.saving = false;
        }
        return Some(ManageEvent::error(format!(
            "Failed to save metadata:\n\n{err}"
        )));
    }

    cmds.extend(ticket.invalidations().into_iter().map(ManageCommand::Invalidate));
    if current {
        model.operations.reset();
        close_session(model);
    }
    Some(ManageEvent::info(format!("{}: saved.", ticket.mode.label())))
}

/// Render the dialog and return triggered messages.
pub fn view(ctx: &egui::Context, model: &ManageModel) -> Vec<ManageMsg> {
    let mut msgs = Vec::new();
    if !model.is_open() {
        return msgs;
    }

    let mut still_open = true;
    let window = egui::Window::new(model.mode.label());
    // No close button while a save is in flight.
    let window = if model.is_saving() {
        window
    } else {
        window.open(&mut still_open)
    };
    window
        .collapsible(false)
        .resizable(true)
        .default_width(720.0)
        .show(ctx, |ui| {
            render_toolbar(ui, model, &mut msgs);
            ui.separator();
            if model.is_loading() {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Loading metadata...");
                });
            } else if model.rows.is_empty() {
                ui.weak("No metadata fields.");
            } else {
                render_table(ui, model, &mut msgs);
            }
            if model.mode == MetadataMode::Setting {
                ui.separator();
                render_built_in(ui, model, &mut msgs);
            }
            ui.separator();
            render_footer(ui, model, &mut msgs);
        });
    if !still_open {
        msgs.push(ManageMsg::Close);
    }

    if let Some(confirm) = &model.confirm {
        render_confirm(ctx, confirm, &mut msgs);
    }
    if let Some(editor) = &model.editor {
        msgs.extend(
            value_editor::view(ctx, editor)
                .into_iter()
                .map(ManageMsg::Editor),
        );
    }

    msgs
}

fn render_toolbar(ui: &mut egui::Ui, model: &ManageModel, msgs: &mut Vec<ManageMsg>) {
    ui.horizontal(|ui| {
        if model.options().can_add
            && ui
                .button(format!("{} Add field", egui_phosphor::regular::PLUS))
                .clicked()
        {
            msgs.push(ManageMsg::StartAddRow);
        }
        let selected = model.selected.len();
        if ui
            .add_enabled(
                selected > 0,
                egui::Button::new(format!(
                    "{} Delete selected ({selected})",
                    egui_phosphor::regular::TRASH
                )),
            )
            .clicked()
        {
            let fields = model.selected.iter().cloned().collect();
            msgs.push(ManageMsg::RequestDelete(DeleteTarget::Batch(fields)));
        }
        if selected > 0 && ui.small_button("Clear").clicked() {
            msgs.push(ManageMsg::ClearSelection);
        }
    });
}

fn render_table(ui: &mut egui::Ui, model: &ManageModel, msgs: &mut Vec<ManageMsg>) {
    let options = model.options();
    let mut table = TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .column(Column::exact(24.0))
        .column(Column::initial(140.0));
    if options.show_description {
        table = table.column(Column::initial(160.0));
    }
    table = table
        .column(Column::remainder().at_least(200.0))
        .column(Column::exact(64.0));

    table
        .header(20.0, |mut header| {
            header.col(|_| {});
            header.col(|ui| {
                ui.strong("Field");
            });
            if options.show_description {
                header.col(|ui| {
                    ui.strong("Description");
                });
            }
            header.col(|ui| {
                ui.strong("Values");
            });
            header.col(|_| {});
        })
        .body(|mut body| {
            for (index, row) in model.rows.iter().enumerate() {
                body.row(28.0, |mut table_row| {
                    table_row.col(|ui| {
                        let mut checked = model.selected.contains(&row.field);
                        if ui.checkbox(&mut checked, "").changed() {
                            msgs.push(ManageMsg::ToggleSelect(row.field.clone()));
                        }
                    });
                    table_row.col(|ui| {
                        ui.label(row.field.as_str());
                    });
                    if options.show_description {
                        table_row.col(|ui| {
                            ui.weak(row.description.as_str());
                        });
                    }
                    table_row.col(|ui| render_values(ui, model, index, row, msgs));
                    table_row.col(|ui| {
                        if ui
                            .small_button(egui_phosphor::regular::PENCIL_SIMPLE)
                            .on_hover_text("Edit field")
                            .clicked()
                        {
                            msgs.push(ManageMsg::StartEditRow(index));
                        }
                        if ui
                            .small_button(egui_phosphor::regular::TRASH)
                            .on_hover_text("Delete field")
                            .clicked()
                        {
                            msgs.push(ManageMsg::RequestDelete(DeleteTarget::Row(row.field.clone())));
                        }
                    });
                });
            }
        });
}

fn render_values(
    ui: &mut egui::Ui,
    model: &ManageModel,
    index: usize,
    row: &MetadataRow,
    msgs: &mut Vec<ManageMsg>,
) {
    let expanded = model.expanded.contains(&row.field);
    let shown = if expanded {
        row.values.len()
    } else {
        row.values.len().min(COLLAPSED_VALUES)
    };

    for (value_index, value) in row.values.iter().take(shown).enumerate() {
        let editing = model
            .inline_edit
            .as_ref()
            .filter(|e| e.row == index && e.value_index == value_index);
        if let Some(edit) = editing {
            let mut buffer = edit.buffer.clone();
            let resp = ui.add(egui::TextEdit::singleline(&mut buffer).desired_width(90.0));
            if resp.changed() {
                msgs.push(ManageMsg::InlineEditChanged(buffer));
            }
            if resp.lost_focus() {
                if ui.input(|i| i.key_pressed(egui::Key::Escape)) {
                    msgs.push(ManageMsg::CancelInlineEdit);
                } else {
                    msgs.push(ManageMsg::CommitInlineEdit);
                }
            }
            continue;
        }

        if ui
            .small_button(value.as_str())
            .on_hover_text("Click to edit")
            .clicked()
        {
            msgs.push(ManageMsg::StartInlineEdit { row: index, value_index });
        }
        if model.options().can_delete_single_value
            && ui
                .small_button(egui_phosphor::regular::X)
                .on_hover_text("Delete value")
                .clicked()
        {
            msgs.push(ManageMsg::RequestDelete(DeleteTarget::Value {
                field: row.field.clone(),
                value: value.clone(),
            }));
        }
    }

    if row.values.len() > COLLAPSED_VALUES {
        let label = if expanded {
            "less".to_string()
        } else {
            format!("+{}", row.values.len() - COLLAPSED_VALUES)
        };
        if ui.small_button(label).clicked() {
            msgs.push(ManageMsg::ToggleExpanded(row.field.clone()));
        }
    }
}

fn render_built_in(ui: &mut egui::Ui, model: &ManageModel, msgs: &mut Vec<ManageMsg>) {
    ui.label("Built-in fields");
    ui.horizontal_wrapped(|ui| {
        for (key, value_type) in BUILT_IN_FIELDS {
            let mut checked = model.built_in.iter().any(|k| k == key);
            if ui
                .checkbox(&mut checked, *key)
                .on_hover_text(value_type.label())
                .changed()
            {
                msgs.push(ManageMsg::ToggleBuiltIn(key.to_string()));
            }
        }
    });
}

fn render_footer(ui: &mut egui::Ui, model: &ManageModel, msgs: &mut Vec<ManageMsg>) {
    ui.horizontal(|ui| {
        let pending = model.operations.deletes().len() + model.operations.updates().len();
        if !model.mode.is_schema() {
            ui.weak(format!("{pending} pending change(s)"));
        }
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let enabled = !model.is_saving() && !model.is_loading();
            let label = if model.is_saving() { "Saving..." } else { "Save" };
            if ui
                .add_enabled(
                    enabled,
                    egui::Button::new(format!("{} {label}", egui_phosphor::regular::FLOPPY_DISK)),
                )
                .clicked()
            {
                msgs.push(ManageMsg::SaveRequested);
            }
            if ui
                .add_enabled(!model.is_saving(), egui::Button::new("Cancel"))
                .clicked()
            {
                msgs.push(ManageMsg::Close);
            }
        });
    });
}

fn render_confirm(ctx: &egui::Context, confirm: &ConfirmDelete, msgs: &mut Vec<ManageMsg>) {
    egui::Window::new(confirm.title)
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
        .show(ctx, |ui| {
            ui.label(confirm.warning);
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui
                    .button(
                        egui::RichText::new("Delete").color(ui.visuals().error_fg_color),
                    )
                    .clicked()
                {
                    msgs.push(ManageMsg::ConfirmDelete);
                }
                if ui.button("Cancel").clicked() {
                    msgs.push(ManageMsg::CancelDelete);
                }
            });
        });
}
