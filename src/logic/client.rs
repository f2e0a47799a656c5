// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Persistence calls against the knowledge-base server.
//!
//! Every endpoint answers with a `{code, message, data}` envelope where `code == 0`
//! means success. Transport problems and non-2xx responses are `Err`; application
//! failures come back as a [`Reply`] with a non-zero code.

use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::models::builtin::BuiltInMetadataItem;
use crate::models::document::{DatasetSummary, DocumentSummary};
use crate::models::operations::OperationLog;

/// Server response envelope.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Reply<T> {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

impl<T> Reply<T> {
    pub fn is_success(&self) -> bool {
        self.code == 0
    }

    #[cfg(test)]
    pub fn ok(data: T) -> Self {
        Self {
            code: 0,
            message: String::new(),
            data: Some(data),
        }
    }

    #[cfg(test)]
    pub fn failed(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reply<U> {
        Reply {
            code: self.code,
            message: self.message,
            data: self.data.map(f),
        }
    }
}

/// Persistence operations consumed by the manage dialog and the app shell.
pub trait MetadataBackend: Send + Sync {
    /// Aggregated `field -> values` summary, optionally restricted to documents.
    fn fetch_aggregated_metadata(
        &self,
        dataset_id: &str,
        document_ids: &[String],
    ) -> Result<Reply<Value>>;

    /// Bulk write of pending operations, optionally restricted to documents.
    fn apply_metadata_operations(
        &self,
        dataset_id: &str,
        operations: &OperationLog,
        document_ids: &[String],
    ) -> Result<Reply<Value>>;

    fn save_field_schema(
        &self,
        dataset_id: &str,
        schema: &Value,
        built_in: &[BuiltInMetadataItem],
    ) -> Result<Reply<Value>>;

    fn save_document_field_schema(&self, document_id: &str, schema: &Value)
    -> Result<Reply<Value>>;

    /// Legacy single-document write of a flat metadata object.
    fn set_single_document_meta(&self, document_id: &str, meta: &Value) -> Result<Reply<Value>>;

    fn list_documents(&self, dataset_id: &str) -> Result<Reply<Vec<DocumentSummary>>>;

    fn fetch_dataset(&self, dataset_id: &str) -> Result<Reply<DatasetSummary>>;
}

/// Blocking HTTP implementation of [`MetadataBackend`].
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    api_key: Option<String>,
    http: HttpClient,
}

impl HttpBackend {
    pub fn new(base_url: &str, api_key: Option<&str>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("server.base_url must not be empty");
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            api_key: api_key
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_owned),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    fn post<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<Reply<T>> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, "POST");
        let request = self.authorize(self.http.post(&url).json(body));
        self.send(request, path)
    }

    fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<Reply<T>> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, "GET");
        let request = self.authorize(self.http.get(&url).query(query));
        self.send(request, path)
    }

    fn send<T: DeserializeOwned>(&self, request: RequestBuilder, path: &str) -> Result<Reply<T>> {
        let response = request
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        let reply: Reply<T> = response
            .json()
            .with_context(|| format!("decode response of {path}"))?;
        tracing::debug!(path, code = reply.code, "reply");
        Ok(reply)
    }
}

#[derive(Deserialize)]
struct SummaryData {
    #[serde(default)]
    summary: Value,
}

#[derive(Deserialize)]
struct DocumentListData {
    #[serde(default)]
    docs: Vec<Value>,
}

impl MetadataBackend for HttpBackend {
    fn fetch_aggregated_metadata(
        &self,
        dataset_id: &str,
        document_ids: &[String],
    ) -> Result<Reply<Value>> {
        let mut body = json!({ "kb_id": dataset_id });
        if !document_ids.is_empty() {
            body["doc_ids"] = json!(document_ids);
        }
        let reply: Reply<SummaryData> = self.post("/v1/document/metadata/summary", &body)?;
        Ok(reply.map(|data| data.summary))
    }

    fn apply_metadata_operations(
        &self,
        dataset_id: &str,
        operations: &OperationLog,
        document_ids: &[String],
    ) -> Result<Reply<Value>> {
        let mut body = json!({
            "kb_id": dataset_id,
            "updates": operations.updates(),
            "deletes": operations.deletes(),
        });
        if !document_ids.is_empty() {
            body["doc_ids"] = json!(document_ids);
        }
        self.post("/v1/document/metadata/update", &body)
    }

    fn save_field_schema(
        &self,
        dataset_id: &str,
        schema: &Value,
        built_in: &[BuiltInMetadataItem],
    ) -> Result<Reply<Value>> {
        let body = json!({
            "kb_id": dataset_id,
            "metadata": schema,
            "built_in_metadata": built_in,
        });
        self.post("/v1/kb/update_metadata_setting", &body)
    }

    fn save_document_field_schema(
        &self,
        document_id: &str,
        schema: &Value,
    ) -> Result<Reply<Value>> {
        let body = json!({ "doc_id": document_id, "metadata": schema });
        self.post("/v1/document/update_metadata_setting", &body)
    }

    fn set_single_document_meta(&self, document_id: &str, meta: &Value) -> Result<Reply<Value>> {
        let body = json!({ "doc_id": document_id, "meta": meta.to_string() });
        self.post("/v1/document/set_meta", &body)
    }

    fn list_documents(&self, dataset_id: &str) -> Result<Reply<Vec<DocumentSummary>>> {
        let reply: Reply<DocumentListData> =
            self.get("/v1/document/list", &[("kb_id", dataset_id)])?;
        Ok(reply.map(|data| data.docs.iter().map(document_from_json).collect()))
    }

    fn fetch_dataset(&self, dataset_id: &str) -> Result<Reply<DatasetSummary>> {
        let reply: Reply<Value> = self.get("/v1/kb/detail", &[("kb_id", dataset_id)])?;
        Ok(reply.map(|data| dataset_from_json(&data)))
    }
}

/// Build a document summary from a list entry, tolerating missing members.
fn document_from_json(doc: &Value) -> DocumentSummary {
    DocumentSummary {
        id: str_at(doc, "id"),
        name: str_at(doc, "name"),
        meta_fields: doc.get("meta_fields").cloned().unwrap_or(Value::Null),
        metadata_schema: doc
            .pointer("/parser_config/metadata")
            .cloned()
            .unwrap_or(Value::Null),
    }
}

fn dataset_from_json(data: &Value) -> DatasetSummary {
    let built_in_metadata = data
        .pointer("/parser_config/built_in_metadata")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default();
    DatasetSummary {
        id: str_at(data, "id"),
        name: str_at(data, "name"),
        metadata_schema: data
            .pointer("/parser_config/metadata")
            .cloned()
            .unwrap_or(Value::Null),
        built_in_metadata,
    }
}

fn str_at(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        anyhow!("request to {base_url} timed out -- check the server or raise server.timeout")
    } else {
        anyhow!("cannot reach knowledge-base server at {base_url}: {error}")
    }
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_owned)
        })
        .unwrap_or_else(|| body.trim().to_owned());

    if message.is_empty() {
        anyhow!("server returned {status}")
    } else {
        anyhow!("server returned {status}: {message}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::thread;
    use tiny_http::{Header, Response, Server};

    fn json_response(body: &str) -> Response<std::io::Cursor<Vec<u8>>> {
        Response::from_string(body)
            .with_status_code(200)
            .with_header(
                Header::from_bytes("Content-Type", "application/json")
                    .expect("valid content type header"),
            )
    }

    #[test]
    fn unreachable_server_reports_address() {
        let backend =
            HttpBackend::new("http://127.0.0.1:1", None, Duration::from_millis(50)).unwrap();

        let error = backend
            .fetch_aggregated_metadata("kb", &[])
            .expect_err("request should fail");

        assert!(error.to_string().contains("127.0.0.1:1"));
    }

    #[test]
    fn empty_base_url_is_rejected() {
        assert!(HttpBackend::new("/", None, Duration::from_secs(1)).is_err());
        assert!(HttpBackend::new("", None, Duration::from_secs(1)).is_err());
    }

    #[test]
    fn summary_request_carries_filter_and_token() -> Result<()> {
        let server =
            Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
        let addr = format!("http://{}", server.server_addr());

        let handle = thread::spawn(move || {
            let mut request = server.recv().expect("request expected");
            assert_eq!(request.url(), "/v1/document/metadata/summary");
            let auth = request
                .headers()
                .iter()
                .find(|h| h.field.equiv("Authorization"))
                .map(|h| h.value.to_string());
            assert_eq!(auth.as_deref(), Some("Bearer secret"));

            let mut body = String::new();
            request.as_reader().read_to_string(&mut body).unwrap();
            let body: Value = serde_json::from_str(&body).unwrap();
            assert_eq!(body, json!({"kb_id": "kb1", "doc_ids": ["d1"]}));

            request
                .respond(json_response(
                    r#"{"code":0,"data":{"summary":{"author":[["alice",2]]}}}"#,
                ))
                .expect("response should succeed");
        });

        let backend = HttpBackend::new(&addr, Some("secret"), Duration::from_secs(1))?;
        let reply = backend.fetch_aggregated_metadata("kb1", &["d1".to_string()])?;

        assert!(reply.is_success());
        assert_eq!(reply.data, Some(json!({"author": [["alice", 2]]})));

        handle.join().expect("server thread should join");
        Ok(())
    }

    #[test]
    fn apply_operations_posts_log_and_surfaces_app_error() -> Result<()> {
        let server =
            Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
        let addr = format!("http://{}/", server.server_addr());

        let handle = thread::spawn(move || {
            let mut request = server.recv().expect("request expected");
            assert_eq!(request.url(), "/v1/document/metadata/update");
            let mut body = String::new();
            request.as_reader().read_to_string(&mut body).unwrap();
            let body: Value = serde_json::from_str(&body).unwrap();
            assert_eq!(body["kb_id"], json!("kb1"));
            assert_eq!(body["deletes"], json!([{"key": "old"}]));
            assert!(body.get("doc_ids").is_none());

            request
                .respond(json_response(r#"{"code":102,"message":"no documents"}"#))
                .expect("response should succeed");
        });

        let backend = HttpBackend::new(&addr, None, Duration::from_secs(1))?;
        let mut ops = OperationLog::default();
        ops.record_field_delete("old");
        let reply = backend.apply_metadata_operations("kb1", &ops, &[])?;

        assert!(!reply.is_success());
        assert_eq!(reply.message, "no documents");

        handle.join().expect("server thread should join");
        Ok(())
    }

    #[test]
    fn http_error_status_becomes_err_with_server_message() -> Result<()> {
        let server =
            Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
        let addr = format!("http://{}", server.server_addr());

        let handle = thread::spawn(move || {
            let request = server.recv().expect("request expected");
            request
                .respond(json_response(r#"{"message":"token expired"}"#).with_status_code(401))
                .expect("response should succeed");
        });

        let backend = HttpBackend::new(&addr, None, Duration::from_secs(1))?;
        let error = backend
            .save_document_field_schema("doc", &json!([]))
            .expect_err("401 should fail");

        assert!(error.to_string().contains("token expired"));

        handle.join().expect("server thread should join");
        Ok(())
    }

    #[test]
    fn document_list_is_read_permissively() -> Result<()> {
        let server =
            Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
        let addr = format!("http://{}", server.server_addr());

        let handle = thread::spawn(move || {
            let request = server.recv().expect("request expected");
            assert_eq!(request.url(), "/v1/document/list?kb_id=kb1");
            request
                .respond(json_response(
                    r#"{"code":0,"data":{"docs":[
                        {"id":"d1","name":"a.pdf","meta_fields":{"author":"alice"},
                         "parser_config":{"metadata":[{"key":"author","enum":[]}]}},
                        {"id":"d2"}
                    ],"total":2}}"#,
                ))
                .expect("response should succeed");
        });

        let backend = HttpBackend::new(&addr, None, Duration::from_secs(1))?;
        let docs = backend.list_documents("kb1")?.data.unwrap_or_default();

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].name, "a.pdf");
        assert_eq!(docs[0].meta_count(), 1);
        assert!(docs[0].metadata_schema.is_array());
        assert_eq!(docs[1].name, "");
        assert_eq!(docs[1].meta_count(), 0);

        handle.join().expect("server thread should join");
        Ok(())
    }
}
