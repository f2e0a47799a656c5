// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Root Model-View-Update kernel wiring component state, messages, and commands.

use serde_json::Value;

use crate::config::Config;
use crate::logic::cache::{Invalidation, QueryCache, QueryKey};
use crate::logic::client::{MetadataBackend, Reply};
use crate::logic::transcode::{self, SchemaFormat};
use crate::models::document::{DatasetSummary, DocumentSummary};
use crate::models::metadata::MetadataRow;
use crate::models::mode::MetadataMode;
use crate::ui::components::connection::{
    self, ConnectionCommand, ConnectionModel, ConnectionMsg, ConnectionSettings,
};
use crate::ui::components::documents::{
    self, DocumentsCommand, DocumentsModel, DocumentsMsg, SessionSeed,
};
use crate::ui::components::manage_modal::{
    self, ManageCommand, ManageModel, ManageMsg, ManageOptions, OpenRequest, SaveRequest,
    SaveTicket, SessionTarget,
};

/// Session defaults applied to every manage dialog.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionDefaults {
    pub dataset_id: Option<String>,
    pub legacy_document_meta: bool,
    pub schema_format: SchemaFormat,
}

impl SessionDefaults {
    pub fn from_config(config: &Config) -> Self {
        Self {
            dataset_id: config.dataset_id().map(str::to_string),
            legacy_document_meta: config.legacy_document_meta(),
            schema_format: config.schema_format(),
        }
    }
}

/// Values kept in the query cache.
#[derive(Clone, Debug, PartialEq)]
pub enum CachedValue {
    Rows(Vec<MetadataRow>),
    Documents(Vec<DocumentSummary>),
    Dataset(DatasetSummary),
}

/// Top-level application state.
#[derive(Default)]
pub struct AppModel {
    /// Dataset and save options of new sessions.
    pub session: SessionDefaults,
    /// Connection settings form.
    pub connection: ConnectionModel,
    /// Document list of the connected dataset.
    pub documents: DocumentsModel,
    /// Manage dialog.
    pub manage: ManageModel,
    /// Server reads shared between the panel and the dialog.
    pub cache: QueryCache<CachedValue>,
    /// Latest status message to display.
    pub status: Option<String>,
    /// Latest error message to display in modal.
    pub error: Option<String>,
    /// Count of queued background commands.
    pub pending_commands: usize,
}

/// Application messages routed through the update function.
#[derive(Debug)]
pub enum Msg {
    DismissError,
    /// Backend swap finished on the UI thread.
    Connected(Result<ConnectionSettings, String>),
    SummaryFetched {
        key: QueryKey,
        rows: Result<Vec<MetadataRow>, String>,
    },
    DocumentsFetched {
        dataset_id: String,
        documents: Result<Vec<DocumentSummary>, String>,
    },
    DatasetFetched {
        dataset_id: String,
        dataset: Result<DatasetSummary, String>,
    },
    Connection(ConnectionMsg),
    Documents(DocumentsMsg),
    Manage(ManageMsg),
}

/// Commands represent side-effects executed between frames.
#[derive(Debug)]
pub enum Command {
    /// Replace the backend; handled on the UI thread, never sent to workers.
    Reconnect(ConnectionSettings),
    FetchSummary(QueryKey),
    LoadDocuments {
        dataset_id: String,
    },
    LoadDataset {
        dataset_id: String,
    },
    /// Persist a manage session; the ticket comes back with the reply.
    Save {
        ticket: SaveTicket,
        request: SaveRequest,
    },
}

impl AppModel {
    pub fn from_config(config: &Config) -> Self {
        Self {
            session: SessionDefaults::from_config(config),
            connection: ConnectionModel::from_config(config),
            ..Default::default()
        }
    }
}

/// Update the application model and enqueue commands.
pub fn update(model: &mut AppModel, msg: Msg, cmds: &mut Vec<Command>) {
    match msg {
        Msg::DismissError => model.error = None,
        Msg::Connected(Ok(settings)) => {
            tracing::info!(base_url = %settings.base_url, dataset = %settings.dataset_id, "connected");
            model.cache = QueryCache::default();
            model.session = SessionDefaults {
                dataset_id: Some(settings.dataset_id.clone()),
                legacy_document_meta: settings.legacy_document_meta,
                schema_format: settings.schema_format,
            };
            surface_event(model, format!("Connected to {}", settings.base_url), false);
            update(
                model,
                Msg::Documents(DocumentsMsg::Load(settings.dataset_id)),
                cmds,
            );
        }
        Msg::Connected(Err(err)) => {
            surface_event(model, format!("Failed to connect:\n\n{err}"), true);
        }
        Msg::SummaryFetched { key, rows } => {
            if let Ok(rows) = &rows {
                model.cache.insert(key.clone(), CachedValue::Rows(rows.clone()));
            }
            update(model, Msg::Manage(ManageMsg::SummaryLoaded { key, rows }), cmds);
        }
        Msg::DocumentsFetched {
            dataset_id,
            documents,
        } => {
            if let Ok(documents) = &documents {
                model.cache.insert(
                    QueryKey::DocumentList {
                        dataset_id: dataset_id.clone(),
                    },
                    CachedValue::Documents(documents.clone()),
                );
            }
            update(
                model,
                Msg::Documents(DocumentsMsg::DocumentsLoaded {
                    dataset_id,
                    documents,
                }),
                cmds,
            );
        }
        Msg::DatasetFetched {
            dataset_id,
            dataset,
        } => {
            if let Ok(dataset) = &dataset {
                model.cache.insert(
                    QueryKey::Dataset {
                        dataset_id: dataset_id.clone(),
                    },
                    CachedValue::Dataset(dataset.clone()),
                );
            }
            update(
                model,
                Msg::Documents(DocumentsMsg::DatasetLoaded {
                    dataset_id,
                    dataset,
                }),
                cmds,
            );
        }
        Msg::Connection(m) => {
            let mut conn_cmds = Vec::new();
            if let Some(event) = connection::update(&mut model.connection, m, &mut conn_cmds) {
                surface_event(model, event.message, event.is_error);
            }
            for c in conn_cmds {
                match c {
                    ConnectionCommand::Connect(settings) => cmds.push(Command::Reconnect(settings)),
                }
            }
        }
        Msg::Documents(m) => {
            if matches!(m, DocumentsMsg::Refresh)
                && let Some(dataset_id) = model.documents.dataset_id().map(str::to_string)
            {
                invalidate(model, Invalidation::DocumentList {
                    dataset_id: dataset_id.clone(),
                });
                invalidate(model, Invalidation::Dataset { dataset_id });
            }
            let mut doc_cmds = Vec::new();
            if let Some(event) = documents::update(&mut model.documents, m, &mut doc_cmds) {
                surface_event(model, event.message, event.is_error);
            }
            for c in doc_cmds {
                dispatch_documents_command(model, c, cmds);
            }
        }
        Msg::Manage(m) => {
            // Schemas the server accepted are applied to the document panel.
            let accepted_schema = match &m {
                ManageMsg::SaveCompleted {
                    ticket,
                    result: Ok(()),
                } => ticket.schema.clone().map(|schema| {
                    let document_id = match ticket.mode {
                        MetadataMode::SingleFileSetting => ticket.document_id.clone(),
                        _ => None,
                    };
                    (document_id, schema)
                }),
                _ => None,
            };

            let mut manage_cmds = Vec::new();
            if let Some(event) = manage_modal::update(&mut model.manage, m, &mut manage_cmds) {
                surface_event(model, event.message, event.is_error);
            }
            if let Some((document_id, schema)) = accepted_schema {
                update(
                    model,
                    Msg::Documents(DocumentsMsg::SchemaSaved {
                        document_id,
                        schema,
                    }),
                    cmds,
                );
            }
            for c in manage_cmds {
                dispatch_manage_command(model, c, cmds);
            }
        }
    }
}

fn dispatch_documents_command(model: &mut AppModel, cmd: DocumentsCommand, cmds: &mut Vec<Command>) {
    match cmd {
        DocumentsCommand::LoadDocuments { dataset_id } => {
            let key = QueryKey::DocumentList {
                dataset_id: dataset_id.clone(),
            };
            match model.cache.fresh(&key) {
                Some(CachedValue::Documents(documents)) => update(
                    model,
                    Msg::Documents(DocumentsMsg::DocumentsLoaded {
                        dataset_id,
                        documents: Ok(documents),
                    }),
                    cmds,
                ),
                _ => cmds.push(Command::LoadDocuments { dataset_id }),
            }
        }
        DocumentsCommand::LoadDataset { dataset_id } => {
            let key = QueryKey::Dataset {
                dataset_id: dataset_id.clone(),
            };
            match model.cache.fresh(&key) {
                Some(CachedValue::Dataset(dataset)) => update(
                    model,
                    Msg::Documents(DocumentsMsg::DatasetLoaded {
                        dataset_id,
                        dataset: Ok(dataset),
                    }),
                    cmds,
                ),
                _ => cmds.push(Command::LoadDataset { dataset_id }),
            }
        }
        DocumentsCommand::OpenSession(seed) => {
            let request = open_request(&model.session, seed);
            update(model, Msg::Manage(ManageMsg::Open(request)), cmds);
        }
    }
}

fn dispatch_manage_command(model: &mut AppModel, cmd: ManageCommand, cmds: &mut Vec<Command>) {
    match cmd {
        ManageCommand::FetchSummary(key) => match model.cache.fresh(&key) {
            Some(CachedValue::Rows(rows)) => {
                tracing::debug!(?key, "metadata summary served from cache");
                update(
                    model,
                    Msg::Manage(ManageMsg::SummaryLoaded { key, rows: Ok(rows) }),
                    cmds,
                );
            }
            _ => cmds.push(Command::FetchSummary(key)),
        },
        ManageCommand::Save { ticket, request } => cmds.push(Command::Save { ticket, request }),
        ManageCommand::Invalidate(invalidation) => {
            let refresh_documents = matches!(
                &invalidation,
                Invalidation::DocumentList { dataset_id } | Invalidation::Dataset { dataset_id }
                    if model.documents.dataset_id() == Some(dataset_id.as_str())
            );
            invalidate(model, invalidation);
            if refresh_documents {
                update(model, Msg::Documents(DocumentsMsg::Refresh), cmds);
            }
        }
    }
}

fn open_request(session: &SessionDefaults, seed: SessionSeed) -> OpenRequest {
    let options = ManageOptions {
        legacy_document_meta: session.legacy_document_meta,
        schema_format: session.schema_format,
        ..ManageOptions::for_mode(seed.mode)
    };
    OpenRequest {
        mode: seed.mode,
        target: SessionTarget {
            dataset_id: session.dataset_id.clone(),
            document_ids: seed.document_ids,
        },
        seed: seed.rows,
        built_in: seed.built_in,
        options,
    }
}

fn invalidate(model: &mut AppModel, invalidation: Invalidation) {
    let evicted = model.cache.invalidate(&invalidation);
    tracing::debug!(?invalidation, evicted, "cache invalidated");
}

/// Execute a command against the backend and return the resulting message.
pub fn run_command(cmd: Command, backend: &dyn MetadataBackend) -> Msg {
    match cmd {
        Command::Reconnect(settings) => Msg::Connected(Err(format!(
            "reconnect to {} must be handled by the UI thread",
            settings.base_url
        ))),
        Command::FetchSummary(key) => {
            let rows = match &key {
                QueryKey::MetadataSummary {
                    dataset_id,
                    document_ids,
                } => settle(backend.fetch_aggregated_metadata(dataset_id, document_ids))
                    .map(|summary| transcode::from_aggregated_summary(&summary.unwrap_or_default())),
                other => Err(format!("not a metadata summary query: {other:?}")),
            };
            Msg::SummaryFetched { key, rows }
        }
        Command::LoadDocuments { dataset_id } => {
            let documents =
                settle(backend.list_documents(&dataset_id)).map(Option::unwrap_or_default);
            Msg::DocumentsFetched {
                dataset_id,
                documents,
            }
        }
        Command::LoadDataset { dataset_id } => {
            let dataset = settle(backend.fetch_dataset(&dataset_id)).map(Option::unwrap_or_default);
            Msg::DatasetFetched {
                dataset_id,
                dataset,
            }
        }
        Command::Save { ticket, request } => {
            let result = settle(send_save(request, backend)).map(|_| ());
            Msg::Manage(ManageMsg::SaveCompleted { ticket, result })
        }
    }
}

fn send_save(request: SaveRequest, backend: &dyn MetadataBackend) -> anyhow::Result<Reply<Value>> {
    match request {
        SaveRequest::ApplyOperations {
            dataset_id,
            document_ids,
            operations,
        } => {
            tracing::info!(
                dataset = %dataset_id,
                documents = document_ids.len(),
                deletes = operations.deletes().len(),
                updates = operations.updates().len(),
                "applying metadata operations"
            );
            backend.apply_metadata_operations(&dataset_id, &operations, &document_ids)
        }
        SaveRequest::FieldSchema {
            dataset_id,
            schema,
            built_in,
        } => {
            tracing::info!(dataset = %dataset_id, built_in = built_in.len(), "saving field schema");
            backend.save_field_schema(&dataset_id, &schema, &built_in)
        }
        SaveRequest::DocumentFieldSchema {
            document_id,
            schema,
        } => {
            tracing::info!(document = %document_id, "saving document field schema");
            backend.save_document_field_schema(&document_id, &schema)
        }
        SaveRequest::DocumentMeta { document_id, meta } => {
            tracing::info!(document = %document_id, "saving document metadata");
            backend.set_single_document_meta(&document_id, &meta)
        }
    }
}

/// Collapse transport errors and non-zero reply codes into one error string.
fn settle<T>(result: anyhow::Result<Reply<T>>) -> Result<Option<T>, String> {
    match result {
        Ok(reply) if reply.is_success() => Ok(reply.data),
        Ok(reply) => {
            tracing::warn!(code = reply.code, message = %reply.message, "server rejected request");
            Err(if reply.message.is_empty() {
                format!("server returned code {}", reply.code)
            } else {
                format!("{} (code {})", reply.message, reply.code)
            })
        }
        Err(err) => {
            tracing::warn!(error = %format!("{err:#}"), "request failed");
            Err(format!("{err:#}"))
        }
    }
}

/// Update status/error fields consistently for user feedback.
fn surface_event(model: &mut AppModel, message: String, is_error: bool) {
    if is_error {
        model.error = Some(message.clone());
    }
    model.status = Some(message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use serde_json::json;
    use std::sync::Mutex;

    use crate::models::builtin::BuiltInMetadataItem;
    use crate::models::operations::OperationLog;
    use crate::ui::components::manage_modal::handle_delete_single_row;

    /// In-memory backend recording every call.
    #[derive(Default)]
    struct FakeBackend {
        calls: Mutex<Vec<String>>,
        save_code: i64,
        dataset_schema: Mutex<Value>,
    }

    impl FakeBackend {
        fn record(&self, call: impl Into<String>) {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(call.into());
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().map(|c| c.clone()).unwrap_or_default()
        }

        fn save_reply(&self) -> Reply<Value> {
            if self.save_code == 0 {
                Reply::ok(json!(true))
            } else {
                Reply::failed(self.save_code, "denied")
            }
        }
    }

    impl MetadataBackend for FakeBackend {
        fn fetch_aggregated_metadata(
            &self,
            dataset_id: &str,
            document_ids: &[String],
        ) -> Result<Reply<Value>> {
            self.record(format!("summary {dataset_id} {}", document_ids.join(",")));
            Ok(Reply::ok(json!({"author": [["alice", 2], ["bob", 1]]})))
        }

        fn apply_metadata_operations(
            &self,
            dataset_id: &str,
            operations: &OperationLog,
            _document_ids: &[String],
        ) -> Result<Reply<Value>> {
            self.record(format!(
                "apply {dataset_id} {}",
                serde_json::to_string(operations)?
            ));
            Ok(self.save_reply())
        }

        fn save_field_schema(
            &self,
            dataset_id: &str,
            schema: &Value,
            _built_in: &[BuiltInMetadataItem],
        ) -> Result<Reply<Value>> {
            self.record(format!("schema {dataset_id}"));
            if self.save_code == 0
                && let Ok(mut stored) = self.dataset_schema.lock()
            {
                *stored = schema.clone();
            }
            Ok(self.save_reply())
        }

        fn save_document_field_schema(
            &self,
            document_id: &str,
            _schema: &Value,
        ) -> Result<Reply<Value>> {
            self.record(format!("doc-schema {document_id}"));
            Ok(self.save_reply())
        }

        fn set_single_document_meta(
            &self,
            document_id: &str,
            _meta: &Value,
        ) -> Result<Reply<Value>> {
            self.record(format!("set-meta {document_id}"));
            Ok(self.save_reply())
        }

        fn list_documents(&self, dataset_id: &str) -> Result<Reply<Vec<DocumentSummary>>> {
            self.record(format!("documents {dataset_id}"));
            Ok(Reply::ok(vec![DocumentSummary {
                id: "d1".into(),
                name: "paper.pdf".into(),
                meta_fields: json!({"author": "alice"}),
                metadata_schema: Value::Null,
            }]))
        }

        fn fetch_dataset(&self, dataset_id: &str) -> Result<Reply<DatasetSummary>> {
            self.record(format!("dataset {dataset_id}"));
            let metadata_schema = self
                .dataset_schema
                .lock()
                .map(|s| s.clone())
                .unwrap_or_default();
            Ok(Reply::ok(DatasetSummary {
                id: dataset_id.into(),
                name: "Papers".into(),
                metadata_schema,
                ..Default::default()
            }))
        }
    }

    /// Feed `msg` and run every resulting command until the queue drains.
    fn drive(model: &mut AppModel, backend: &FakeBackend, msg: Msg) {
        let mut queue = Vec::new();
        update(model, msg, &mut queue);
        while let Some(cmd) = queue.pop() {
            let reply = run_command(cmd, backend);
            update(model, reply, &mut queue);
        }
    }

    fn connected(backend: &FakeBackend) -> AppModel {
        let mut model = AppModel::default();
        let settings = ConnectionSettings {
            base_url: "http://kb.test".into(),
            api_key: None,
            timeout: std::time::Duration::from_secs(1),
            dataset_id: "kb1".into(),
            schema_format: SchemaFormat::Array,
            legacy_document_meta: false,
        };
        drive(&mut model, backend, Msg::Connected(Ok(settings)));
        model
    }

    #[test]
    fn connecting_loads_documents_and_dataset() {
        let backend = FakeBackend::default();
        let model = connected(&backend);

        assert_eq!(model.session.dataset_id.as_deref(), Some("kb1"));
        assert_eq!(model.documents.documents().len(), 1);
        assert_eq!(model.documents.dataset().map(|d| d.name.as_str()), Some("Papers"));
        assert!(model.error.is_none());
        let calls = backend.calls();
        assert!(calls.contains(&"documents kb1".to_string()));
        assert!(calls.contains(&"dataset kb1".to_string()));
    }

    #[test]
    fn manage_session_fetches_once_then_uses_cache() {
        let backend = FakeBackend::default();
        let mut model = connected(&backend);

        drive(&mut model, &backend, Msg::Documents(DocumentsMsg::OpenManage));
        assert!(model.manage.is_open());
        assert_eq!(model.manage.rows()[0].values, vec!["alice", "bob"]);

        drive(&mut model, &backend, Msg::Manage(ManageMsg::Close));
        drive(&mut model, &backend, Msg::Documents(DocumentsMsg::OpenManage));

        let summaries = backend
            .calls()
            .iter()
            .filter(|c| c.starts_with("summary"))
            .count();
        assert_eq!(summaries, 1);
        assert_eq!(model.manage.rows().len(), 1);
    }

    #[test]
    fn successful_save_invalidates_and_refetches() {
        let backend = FakeBackend::default();
        let mut model = connected(&backend);
        drive(&mut model, &backend, Msg::Documents(DocumentsMsg::OpenManage));
        handle_delete_single_row(&mut model.manage, "author");

        drive(&mut model, &backend, Msg::Manage(ManageMsg::SaveRequested));

        assert!(!model.manage.is_open());
        assert!(model.error.is_none());
        let calls = backend.calls();
        assert!(
            calls
                .iter()
                .any(|c| c.starts_with("apply kb1") && c.contains("\"deletes\":[{\"key\":\"author\"}]"))
        );
        assert_eq!(calls.iter().filter(|c| *c == "documents kb1").count(), 2);

        drive(&mut model, &backend, Msg::Documents(DocumentsMsg::OpenManage));
        let summaries = backend
            .calls()
            .iter()
            .filter(|c| c.starts_with("summary"))
            .count();
        assert_eq!(summaries, 2);
    }

    #[test]
    fn rejected_save_surfaces_error_and_keeps_session() {
        let backend = FakeBackend {
            save_code: 102,
            ..Default::default()
        };
        let mut model = connected(&backend);
        drive(&mut model, &backend, Msg::Documents(DocumentsMsg::OpenManage));
        handle_delete_single_row(&mut model.manage, "author");

        drive(&mut model, &backend, Msg::Manage(ManageMsg::SaveRequested));

        assert!(model.manage.is_open());
        assert!(!model.manage.is_saving());
        assert_eq!(model.manage.operations().deletes().len(), 1);
        assert!(model.error.as_deref().is_some_and(|e| e.contains("denied (code 102)")));
    }

    #[test]
    fn setting_save_hands_schema_back_to_dataset() {
        let backend = FakeBackend::default();
        let mut model = connected(&backend);
        drive(&mut model, &backend, Msg::Documents(DocumentsMsg::OpenSettings));
        manage_modal::handle_save_values(
            &mut model.manage,
            MetadataRow::new("topic", vec!["nlp".into()]),
            0,
        );

        drive(&mut model, &backend, Msg::Manage(ManageMsg::SaveRequested));

        assert!(backend.calls().contains(&"schema kb1".to_string()));
        let schema = model
            .documents
            .dataset()
            .map(|d| d.metadata_schema.clone())
            .unwrap_or_default();
        assert_eq!(schema[0]["key"], "topic");
    }

    #[test]
    fn rejected_setting_save_leaves_dataset_schema_untouched() {
        let backend = FakeBackend {
            save_code: 102,
            ..Default::default()
        };
        let mut model = connected(&backend);
        drive(&mut model, &backend, Msg::Documents(DocumentsMsg::OpenSettings));
        manage_modal::handle_save_values(
            &mut model.manage,
            MetadataRow::new("topic", vec!["nlp".into()]),
            0,
        );

        drive(&mut model, &backend, Msg::Manage(ManageMsg::SaveRequested));

        assert!(model.error.is_some());
        assert!(model.manage.is_open());
        assert!(
            model
                .documents
                .dataset()
                .is_some_and(|d| d.metadata_schema.is_null())
        );
    }

    #[test]
    fn save_finishing_after_close_still_refreshes_caches() {
        let backend = FakeBackend::default();
        let mut model = connected(&backend);
        drive(&mut model, &backend, Msg::Documents(DocumentsMsg::OpenManage));
        handle_delete_single_row(&mut model.manage, "author");

        let mut in_flight = Vec::new();
        update(&mut model, Msg::Manage(ManageMsg::SaveRequested), &mut in_flight);
        drive(&mut model, &backend, Msg::Manage(ManageMsg::Close));
        for cmd in in_flight {
            let reply = run_command(cmd, &backend);
            drive(&mut model, &backend, reply);
        }

        assert!(model.error.is_none());
        assert_eq!(
            backend.calls().iter().filter(|c| *c == "documents kb1").count(),
            2
        );
        drive(&mut model, &backend, Msg::Documents(DocumentsMsg::OpenManage));
        let summaries = backend
            .calls()
            .iter()
            .filter(|c| c.starts_with("summary"))
            .count();
        assert_eq!(summaries, 2);
    }

    #[test]
    fn refresh_bypasses_cached_documents() {
        let backend = FakeBackend::default();
        let mut model = connected(&backend);

        drive(&mut model, &backend, Msg::Documents(DocumentsMsg::Load("kb1".into())));
        assert_eq!(
            backend.calls().iter().filter(|c| *c == "documents kb1").count(),
            1,
            "second load is served from cache"
        );

        drive(&mut model, &backend, Msg::Documents(DocumentsMsg::Refresh));
        assert_eq!(
            backend.calls().iter().filter(|c| *c == "documents kb1").count(),
            2
        );
    }

    #[test]
    fn transport_errors_become_messages() {
        struct Offline;
        impl MetadataBackend for Offline {
            fn fetch_aggregated_metadata(&self, _: &str, _: &[String]) -> Result<Reply<Value>> {
                anyhow::bail!("cannot reach knowledge-base server")
            }
            fn apply_metadata_operations(
                &self,
                _: &str,
                _: &OperationLog,
                _: &[String],
            ) -> Result<Reply<Value>> {
                anyhow::bail!("offline")
            }
            fn save_field_schema(
                &self,
                _: &str,
                _: &Value,
                _: &[BuiltInMetadataItem],
            ) -> Result<Reply<Value>> {
                anyhow::bail!("offline")
            }
            fn save_document_field_schema(&self, _: &str, _: &Value) -> Result<Reply<Value>> {
                anyhow::bail!("offline")
            }
            fn set_single_document_meta(&self, _: &str, _: &Value) -> Result<Reply<Value>> {
                anyhow::bail!("offline")
            }
            fn list_documents(&self, _: &str) -> Result<Reply<Vec<DocumentSummary>>> {
                anyhow::bail!("offline")
            }
            fn fetch_dataset(&self, _: &str) -> Result<Reply<DatasetSummary>> {
                anyhow::bail!("offline")
            }
        }

        let key = QueryKey::MetadataSummary {
            dataset_id: "kb1".into(),
            document_ids: Vec::new(),
        };
        match run_command(Command::FetchSummary(key), &Offline) {
            Msg::SummaryFetched { rows: Err(err), .. } => {
                assert!(err.contains("cannot reach"));
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }
}
