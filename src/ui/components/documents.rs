// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Dataset overview: the document list and the entry points into the manage dialog.

use std::collections::BTreeSet;

use eframe::egui;
use egui_extras::{Column, TableBuilder};
use serde_json::Value;

use crate::logic::transcode;
use crate::models::document::{DatasetSummary, DocumentSummary};
use crate::models::metadata::MetadataRow;
use crate::models::mode::MetadataMode;

/// Document panel state for the connected dataset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DocumentsModel {
    dataset_id: Option<String>,
    dataset: Option<DatasetSummary>,
    documents: Vec<DocumentSummary>,
    selected: BTreeSet<String>,
    loading: bool,
}

impl DocumentsModel {
    pub fn dataset_id(&self) -> Option<&str> {
        self.dataset_id.as_deref()
    }

    #[cfg(test)]
    pub fn dataset(&self) -> Option<&DatasetSummary> {
        self.dataset.as_ref()
    }

    #[cfg(test)]
    pub fn documents(&self) -> &[DocumentSummary] {
        &self.documents
    }

    #[cfg(test)]
    pub fn selected(&self) -> &BTreeSet<String> {
        &self.selected
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    fn document(&self, id: &str) -> Option<&DocumentSummary> {
        self.documents.iter().find(|d| d.id == id)
    }
}

/// What the caller should open the manage dialog with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSeed {
    pub mode: MetadataMode,
    pub document_ids: Vec<String>,
    pub rows: Vec<MetadataRow>,
    pub built_in: Vec<String>,
}

/// Messages produced by the documents panel.
#[derive(Clone, Debug, PartialEq)]
pub enum DocumentsMsg {
    /// (Re)load everything for `dataset_id`.
    Load(String),
    Refresh,
    DocumentsLoaded {
        dataset_id: String,
        documents: Result<Vec<DocumentSummary>, String>,
    },
    DatasetLoaded {
        dataset_id: String,
        dataset: Result<DatasetSummary, String>,
    },
    ToggleSelect(String),
    OpenManage,
    OpenSettings,
    OpenDocumentMetadata,
    OpenDocumentSettings(String),
    /// A schema save handed its payload back; `document_id` is set for document schemas.
    SchemaSaved {
        document_id: Option<String>,
        schema: Value,
    },
}

/// Commands requested by the documents panel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DocumentsCommand {
    LoadDocuments { dataset_id: String },
    LoadDataset { dataset_id: String },
    OpenSession(SessionSeed),
}

/// Feedback surfaced to the status bar/modal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentsEvent {
    pub message: String,
    pub is_error: bool,
}

/// Update the panel based on a message.
pub fn update(
    model: &mut DocumentsModel,
    msg: DocumentsMsg,
    cmds: &mut Vec<DocumentsCommand>,
) -> Option<DocumentsEvent> {
    match msg {
        DocumentsMsg::Load(dataset_id) => {
            if model.dataset_id.as_deref() != Some(dataset_id.as_str()) {
                *model = DocumentsModel {
                    dataset_id: Some(dataset_id),
                    ..Default::default()
                };
            }
            request_reload(model, cmds);
            None
        }
        DocumentsMsg::Refresh => {
            request_reload(model, cmds);
            None
        }
        DocumentsMsg::DocumentsLoaded {
            dataset_id,
            documents,
        } => {
            if model.dataset_id.as_deref() != Some(dataset_id.as_str()) {
                return None;
            }
            model.loading = false;
            match documents {
                Ok(documents) => {
                    model
                        .selected
                        .retain(|id| documents.iter().any(|d| d.id == *id));
                    model.documents = documents;
                    None
                }
                Err(err) => Some(DocumentsEvent {
                    message: format!("Failed to load documents:\n\n{err}"),
                    is_error: true,
                }),
            }
        }
        DocumentsMsg::DatasetLoaded {
            dataset_id,
            dataset,
        } => {
            if model.dataset_id.as_deref() != Some(dataset_id.as_str()) {
                return None;
            }
            match dataset {
                Ok(dataset) => {
                    model.dataset = Some(dataset);
                    None
                }
                Err(err) => Some(DocumentsEvent {
                    message: format!("Failed to load dataset:\n\n{err}"),
                    is_error: true,
                }),
            }
        }
        DocumentsMsg::ToggleSelect(id) => {
            if !model.selected.remove(&id) {
                model.selected.insert(id);
            }
            None
        }
        DocumentsMsg::OpenManage => {
            cmds.push(DocumentsCommand::OpenSession(SessionSeed {
                mode: MetadataMode::Manage,
                document_ids: Vec::new(),
                rows: Vec::new(),
                built_in: Vec::new(),
            }));
            None
        }
        DocumentsMsg::OpenSettings => {
            let (rows, built_in) = model
                .dataset
                .as_ref()
                .map(|d| {
                    (
                        transcode::from_schema_json(&d.metadata_schema),
                        d.built_in_metadata
                            .iter()
                            .map(|b| b.key.clone())
                            .collect::<Vec<_>>(),
                    )
                })
                .unwrap_or_default();
            cmds.push(DocumentsCommand::OpenSession(SessionSeed {
                mode: MetadataMode::Setting,
                document_ids: Vec::new(),
                rows,
                built_in,
            }));
            None
        }
        DocumentsMsg::OpenDocumentMetadata => {
            if model.selected.is_empty() {
                return Some(DocumentsEvent {
                    message: "Select at least one document.".into(),
                    is_error: false,
                });
            }
            let document_ids: Vec<String> = model.selected.iter().cloned().collect();
            // A single document can be seeded from its own flat metadata.
            let rows = match document_ids.as_slice() {
                [only] => model
                    .document(only)
                    .map(|d| transcode::from_flat_json(&d.meta_fields))
                    .unwrap_or_default(),
                _ => Vec::new(),
            };
            cmds.push(DocumentsCommand::OpenSession(SessionSeed {
                mode: MetadataMode::UpdateSingle,
                document_ids,
                rows,
                built_in: Vec::new(),
            }));
            None
        }
        DocumentsMsg::OpenDocumentSettings(id) => {
            let document = model.document(&id)?;
            let mut rows = transcode::from_schema_json(&document.metadata_schema);
            if rows.is_empty()
                && let Some(dataset) = &model.dataset
            {
                rows = transcode::from_schema_json(&dataset.metadata_schema);
            }
            cmds.push(DocumentsCommand::OpenSession(SessionSeed {
                mode: MetadataMode::SingleFileSetting,
                document_ids: vec![id],
                rows,
                built_in: Vec::new(),
            }));
            None
        }
        DocumentsMsg::SchemaSaved {
            document_id,
            schema,
        } => {
            match document_id {
                Some(id) => {
                    if let Some(document) = model.documents.iter_mut().find(|d| d.id == id) {
                        document.metadata_schema = schema;
                    }
                }
                None => {
                    if let Some(dataset) = model.dataset.as_mut() {
                        dataset.metadata_schema = schema;
                    }
                }
            }
            None
        }
    }
}

fn request_reload(model: &mut DocumentsModel, cmds: &mut Vec<DocumentsCommand>) {
    let Some(dataset_id) = model.dataset_id.clone() else {
        return;
    };
    model.loading = true;
    cmds.push(DocumentsCommand::LoadDocuments {
        dataset_id: dataset_id.clone(),
    });
    cmds.push(DocumentsCommand::LoadDataset { dataset_id });
}

/// Render the panel and return triggered messages.
pub fn view(ui: &mut egui::Ui, model: &DocumentsModel) -> Vec<DocumentsMsg> {
    let mut msgs = Vec::new();

    let Some(dataset_id) = model.dataset_id.as_deref() else {
        ui.weak("Not connected. Open the connection settings to pick a dataset.");
        return msgs;
    };

    ui.horizontal(|ui| {
        let name = model
            .dataset
            .as_ref()
            .map(|d| d.name.as_str())
            .filter(|n| !n.is_empty())
            .unwrap_or(dataset_id);
        ui.heading(name);
        if model.is_loading() {
            ui.spinner();
        }
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui
                .button(egui_phosphor::regular::ARROWS_CLOCKWISE)
                .on_hover_text("Reload")
                .clicked()
            {
                msgs.push(DocumentsMsg::Refresh);
            }
        });
    });
    ui.add_space(6.0);

    ui.horizontal(|ui| {
        if ui
            .button(format!("{} Manage metadata", egui_phosphor::regular::TAG))
            .clicked()
        {
            msgs.push(DocumentsMsg::OpenManage);
        }
        if ui
            .button(format!("{} Metadata settings", egui_phosphor::regular::GEAR))
            .clicked()
        {
            msgs.push(DocumentsMsg::OpenSettings);
        }
        let count = model.selected.len();
        if ui
            .add_enabled(
                count > 0,
                egui::Button::new(format!(
                    "{} Edit selected ({count})",
                    egui_phosphor::regular::PENCIL_SIMPLE
                )),
            )
            .clicked()
        {
            msgs.push(DocumentsMsg::OpenDocumentMetadata);
        }
    });
    ui.add_space(6.0);

    if model.documents.is_empty() {
        if !model.is_loading() {
            ui.weak("No documents in this dataset.");
        }
        return msgs;
    }

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .column(Column::exact(24.0))
        .column(Column::remainder().at_least(200.0))
        .column(Column::initial(80.0))
        .column(Column::exact(32.0))
        .header(20.0, |mut header| {
            header.col(|_| {});
            header.col(|ui| {
                ui.strong("Document");
            });
            header.col(|ui| {
                ui.strong("Metadata");
            });
            header.col(|_| {});
        })
        .body(|mut body| {
            for document in &model.documents {
                body.row(24.0, |mut row| {
                    row.col(|ui| {
                        let mut checked = model.selected.contains(&document.id);
                        if ui.checkbox(&mut checked, "").changed() {
                            msgs.push(DocumentsMsg::ToggleSelect(document.id.clone()));
                        }
                    });
                    row.col(|ui| {
                        ui.label(document.name.as_str());
                    });
                    row.col(|ui| {
                        ui.label(format!("{} field(s)", document.meta_count()));
                    });
                    row.col(|ui| {
                        if ui
                            .small_button(egui_phosphor::regular::GEAR)
                            .on_hover_text("Document metadata settings")
                            .clicked()
                        {
                            msgs.push(DocumentsMsg::OpenDocumentSettings(document.id.clone()));
                        }
                    });
                });
            }
        });

    msgs
}
