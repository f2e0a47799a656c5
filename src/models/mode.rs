// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Editing modes of the manage dialog and the per-mode behaviour table.

/// Editing context fixed for the lifetime of one manage session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MetadataMode {
    /// Bulk, dataset-wide value management.
    #[default]
    Manage,
    /// Values of a selected set of documents.
    UpdateSingle,
    /// Dataset-level field schema.
    Setting,
    /// Field schema of a single document.
    SingleFileSetting,
}

/// Where the row model comes from when a session opens.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchStrategy {
    /// Aggregated summary fetched from the server.
    AggregatedSummary,
    /// Rows handed over by the caller.
    CallerSeed,
}

/// Which persistence call a save issues.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveStrategy {
    /// Send the operation log for the whole dataset.
    ApplyOperations,
    /// Send the operation log restricted to explicit document ids.
    ApplyOperationsForDocuments,
    /// Send the flat JSON of the rows for one document (legacy path).
    FlatDocumentMeta,
    /// Send the schema JSON for the dataset along with built-in selections.
    FieldSchema,
    /// Send the schema JSON for one document.
    DocumentFieldSchema,
}

/// Fetch and save behaviour of a mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModeStrategy {
    pub fetch: FetchStrategy,
    pub save: SaveStrategy,
}

/// User-facing copy for delete confirmations and duplicate warnings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModeCopy {
    pub delete_title: &'static str,
    pub warn_field_delete: &'static str,
    pub warn_value_delete: &'static str,
    pub warn_field_exists: &'static str,
    pub warn_value_exists: &'static str,
}

impl MetadataMode {
    #[cfg(test)]
    pub const ALL: [MetadataMode; 4] = [
        Self::Manage,
        Self::UpdateSingle,
        Self::Setting,
        Self::SingleFileSetting,
    ];

    pub const fn strategy(self) -> ModeStrategy {
        match self {
            Self::Manage => ModeStrategy {
                fetch: FetchStrategy::AggregatedSummary,
                save: SaveStrategy::ApplyOperations,
            },
            Self::UpdateSingle => ModeStrategy {
                fetch: FetchStrategy::AggregatedSummary,
                save: SaveStrategy::ApplyOperationsForDocuments,
            },
            Self::Setting => ModeStrategy {
                fetch: FetchStrategy::CallerSeed,
                save: SaveStrategy::FieldSchema,
            },
            Self::SingleFileSetting => ModeStrategy {
                fetch: FetchStrategy::CallerSeed,
                save: SaveStrategy::DocumentFieldSchema,
            },
        }
    }

    /// Schema modes edit field definitions rather than stored values.
    pub fn is_schema(self) -> bool {
        matches!(self, Self::Setting | Self::SingleFileSetting)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Manage => "Manage metadata",
            Self::UpdateSingle => "Document metadata",
            Self::Setting => "Metadata settings",
            Self::SingleFileSetting => "Document metadata settings",
        }
    }

    /// Title of the per-field sub-dialog.
    pub fn editor_title(self) -> &'static str {
        if self.is_schema() {
            "Field setting"
        } else {
            "Edit metadata"
        }
    }

    pub const fn copy(self) -> ModeCopy {
        match self {
            Self::Manage => ModeCopy {
                delete_title: "Delete metadata",
                warn_field_delete: "This field and all its values will be removed from every document in the dataset.",
                warn_value_delete: "This value will be removed from every document in the dataset.",
                warn_field_exists: "A field with this name already exists.",
                warn_value_exists: "This value already exists.",
            },
            Self::UpdateSingle => ModeCopy {
                delete_title: "Delete metadata",
                warn_field_delete: "This field and its values will be removed from the selected documents.",
                warn_value_delete: "This value will be removed from the selected documents.",
                warn_field_exists: "This document already has a field with this name.",
                warn_value_exists: "This document already has this value.",
            },
            Self::Setting => ModeCopy {
                delete_title: "Delete metadata",
                warn_field_delete: "The field definition will be removed from the dataset settings.",
                warn_value_delete: "The value will be removed from the allowed values.",
                warn_field_exists: "Field name already defined.",
                warn_value_exists: "This value already exists.",
            },
            Self::SingleFileSetting => ModeCopy {
                delete_title: "Delete metadata",
                warn_field_delete: "The field definition will be removed from the dataset settings.",
                warn_value_delete: "The value will be removed from the allowed values.",
                warn_field_exists: "Field name already defined.",
                warn_value_exists: "This document already has this value.",
            },
        }
    }
}
