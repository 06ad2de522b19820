//! Firestore REST document backend.
//!
//! Mutations go through the `documents:commit` endpoint, which applies the
//! whole write list atomically. Precondition failures come back as HTTP 409
//! (`ALREADY_EXISTS`) and 404 (`NOT_FOUND`).

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};
use url::Url;

use super::{
    DocumentBackend, FieldValue, Fields, Precondition, ServerValue, StoreError, StoredDocument,
    Write,
};

const FIRESTORE_API_BASE: &str = "https://firestore.googleapis.com/v1";
const LIST_PAGE_SIZE: usize = 300;

#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    pub project_id: String,
    pub database: String,
    pub collection: String,
    /// API root, overridable for emulators.
    pub api_base: String,
    pub timeout: Duration,
}

impl FirestoreConfig {
    pub fn new(project_id: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            database: "(default)".to_string(),
            collection: collection.into(),
            api_base: FIRESTORE_API_BASE.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resource path of the database's document root.
    fn database_path(&self) -> String {
        format!(
            "projects/{}/databases/{}/documents",
            self.project_id, self.database
        )
    }

    /// Fully qualified document name used inside commit bodies.
    fn document_name(&self, id: &str) -> String {
        format!("{}/{}/{}", self.database_path(), self.collection, id)
    }

    /// URL of one document. `id` is percent-encoded as a single path segment.
    fn document_url(&self, id: &str) -> Result<Url, StoreError> {
        let collection_url = format!("{}/{}", self.documents_url(), self.collection);
        let mut url =
            Url::parse(&collection_url).map_err(|e| StoreError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidUrl(collection_url.clone()))?
            .push(id);
        Ok(url)
    }

    fn documents_url(&self) -> String {
        format!(
            "{}/{}",
            self.api_base.trim_end_matches('/'),
            self.database_path()
        )
    }
}

pub struct FirestoreBackend {
    client: Client,
    config: FirestoreConfig,
}

impl FirestoreBackend {
    pub fn new(config: FirestoreConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to create Firestore HTTP client")?;
        Ok(Self { client, config })
    }

    fn authorized(&self, request: RequestBuilder, credential: Option<&str>) -> RequestBuilder {
        match credential {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn encode_write(&self, write: &Write) -> Value {
        match write {
            Write::Update {
                id,
                fields,
                mask,
                precondition,
            } => {
                let mut body = json!({
                    "update": {
                        "name": self.config.document_name(id),
                        "fields": encode_fields(fields),
                    }
                });
                if let Some(paths) = mask {
                    body["updateMask"] = json!({ "fieldPaths": paths });
                }
                if let Some(precondition) = precondition {
                    body["currentDocument"] = encode_precondition(*precondition);
                }
                body
            }
            Write::Transform { id, transforms } => {
                let field_transforms: Vec<Value> = transforms
                    .iter()
                    .map(|t| match t.value {
                        ServerValue::RequestTime => json!({
                            "fieldPath": t.field_path,
                            "setToServerValue": "REQUEST_TIME",
                        }),
                    })
                    .collect();
                json!({
                    "transform": {
                        "document": self.config.document_name(id),
                        "fieldTransforms": field_transforms,
                    }
                })
            }
            Write::Delete { id, precondition } => {
                let mut body = json!({ "delete": self.config.document_name(id) });
                if let Some(precondition) = precondition {
                    body["currentDocument"] = encode_precondition(*precondition);
                }
                body
            }
        }
    }
}

fn encode_precondition(precondition: Precondition) -> Value {
    match precondition {
        Precondition::Exists => json!({ "exists": true }),
        Precondition::Missing => json!({ "exists": false }),
    }
}

fn encode_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::String(s) => json!({ "stringValue": s }),
        FieldValue::Integer(i) => json!({ "integerValue": i.to_string() }),
        FieldValue::Boolean(b) => json!({ "booleanValue": b }),
        FieldValue::Timestamp(t) => {
            json!({ "timestampValue": t.to_rfc3339_opts(SecondsFormat::Micros, true) })
        }
    }
}

fn encode_fields(fields: &Fields) -> Value {
    let map: serde_json::Map<String, Value> = fields
        .iter()
        .map(|(k, v)| (k.clone(), encode_value(v)))
        .collect();
    Value::Object(map)
}

/// Firestore's typed value wrapper. Types the directory never writes are
/// dropped when decoding.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
enum WireValue {
    StringValue(String),
    IntegerValue(String),
    BooleanValue(bool),
    TimestampValue(String),
}

impl WireValue {
    fn into_field(self) -> Option<FieldValue> {
        match self {
            Self::StringValue(s) => Some(FieldValue::String(s)),
            Self::IntegerValue(raw) => raw.parse().ok().map(FieldValue::Integer),
            Self::BooleanValue(b) => Some(FieldValue::Boolean(b)),
            Self::TimestampValue(raw) => DateTime::parse_from_rfc3339(&raw)
                .ok()
                .map(|t| FieldValue::Timestamp(t.with_timezone(&Utc))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireDocument {
    name: String,
    #[serde(default)]
    fields: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<WireDocument>,
    next_page_token: Option<String>,
}

fn decode_document(document: WireDocument) -> StoredDocument {
    let id = document
        .name
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string();
    let fields = document
        .fields
        .into_iter()
        .filter_map(|(key, raw)| {
            serde_json::from_value::<WireValue>(raw)
                .ok()
                .and_then(WireValue::into_field)
                .map(|value| (key, value))
        })
        .collect();
    StoredDocument { id, fields }
}

async fn error_body(response: reqwest::Response) -> String {
    response.text().await.unwrap_or_default()
}

/// Id of the document the commit targets, for error reporting.
fn target_id(writes: &[Write]) -> String {
    match writes.first() {
        Some(Write::Update { id, .. })
        | Some(Write::Transform { id, .. })
        | Some(Write::Delete { id, .. }) => id.clone(),
        None => String::new(),
    }
}

#[async_trait]
impl DocumentBackend for FirestoreBackend {
    async fn commit(&self, writes: Vec<Write>, credential: Option<&str>) -> Result<(), StoreError> {
        let encoded: Vec<Value> = writes.iter().map(|w| self.encode_write(w)).collect();
        let body = json!({ "writes": encoded });
        let url = format!("{}:commit", self.config.documents_url());
        debug!(url = %url, writes = writes.len(), "firestore commit");

        let response = self
            .authorized(self.client.post(&url), credential)
            .json(&body)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::CONFLICT => Err(StoreError::AlreadyExists(target_id(&writes))),
            StatusCode::NOT_FOUND => Err(StoreError::NotFound(target_id(&writes))),
            status => {
                let message = error_body(response).await;
                warn!(status = status.as_u16(), "firestore commit failed");
                Err(StoreError::Backend {
                    status: status.as_u16(),
                    message: format!("Firestore write failed: {message}"),
                })
            }
        }
    }

    async fn get(
        &self,
        id: &str,
        credential: Option<&str>,
    ) -> Result<Option<StoredDocument>, StoreError> {
        let url = self.config.document_url(id)?;
        let response = self
            .authorized(self.client.get(url), credential)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let document: WireDocument = response
                    .json()
                    .await
                    .map_err(|e| StoreError::Decode(e.to_string()))?;
                Ok(Some(decode_document(document)))
            }
            status => Err(StoreError::Backend {
                status: status.as_u16(),
                message: format!("Failed to read document {id}: {}", error_body(response).await),
            }),
        }
    }

    async fn list(&self) -> Result<Vec<StoredDocument>, StoreError> {
        let url = format!("{}/{}", self.config.documents_url(), self.config.collection);
        let page_size = LIST_PAGE_SIZE.to_string();
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("pageSize", page_size.clone())];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }
            let response = self.client.get(&url).query(&query).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(StoreError::Backend {
                    status: status.as_u16(),
                    message: format!(
                        "Failed to read internal directory: {}",
                        error_body(response).await
                    ),
                });
            }

            let page: ListResponse = response
                .json()
                .await
                .map_err(|e| StoreError::Decode(e.to_string()))?;
            documents.extend(page.documents.into_iter().map(decode_document));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!(count = documents.len(), "firestore list");
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FieldTransform;

    fn backend() -> FirestoreBackend {
        FirestoreBackend::new(FirestoreConfig::new("demo-project", "beamWebsiteDirectory")).unwrap()
    }

    #[test]
    fn create_writes_encode_precondition_and_transform() {
        let backend = backend();
        let update = backend.encode_write(&Write::Update {
            id: "abc".into(),
            fields: Fields::from([
                ("sortOrder".to_string(), FieldValue::Integer(12)),
                ("isActive".to_string(), FieldValue::Boolean(true)),
            ]),
            mask: None,
            precondition: Some(Precondition::Missing),
        });
        assert_eq!(
            update["update"]["name"],
            "projects/demo-project/databases/(default)/documents/beamWebsiteDirectory/abc"
        );
        assert_eq!(update["update"]["fields"]["sortOrder"]["integerValue"], "12");
        assert_eq!(update["update"]["fields"]["isActive"]["booleanValue"], true);
        assert_eq!(update["currentDocument"]["exists"], false);
        assert!(update.get("updateMask").is_none());

        let transform = backend.encode_write(&Write::Transform {
            id: "abc".into(),
            transforms: vec![FieldTransform::request_time("updatedAt")],
        });
        assert_eq!(
            transform["transform"]["fieldTransforms"][0],
            json!({ "fieldPath": "updatedAt", "setToServerValue": "REQUEST_TIME" })
        );
    }

    #[test]
    fn document_url_encodes_id_as_one_segment() {
        let config = FirestoreConfig::new("demo-project", "beamWebsiteDirectory");
        assert_eq!(
            config.document_url("beam-home-site").unwrap().as_str(),
            "https://firestore.googleapis.com/v1/projects/demo-project/databases/(default)/documents/beamWebsiteDirectory/beam-home-site"
        );
        assert_eq!(
            config.document_url("a b/c?d").unwrap().path(),
            "/v1/projects/demo-project/databases/(default)/documents/beamWebsiteDirectory/a%20b%2Fc%3Fd"
        );
    }

    #[test]
    fn masked_update_and_delete_encoding() {
        let backend = backend();
        let update = backend.encode_write(&Write::Update {
            id: "abc".into(),
            fields: Fields::from([("title".to_string(), FieldValue::String("T".into()))]),
            mask: Some(vec!["title".into()]),
            precondition: Some(Precondition::Exists),
        });
        assert_eq!(update["updateMask"]["fieldPaths"], json!(["title"]));
        assert_eq!(update["currentDocument"]["exists"], true);

        let delete = backend.encode_write(&Write::Delete {
            id: "abc".into(),
            precondition: Some(Precondition::Exists),
        });
        assert_eq!(
            delete["delete"],
            "projects/demo-project/databases/(default)/documents/beamWebsiteDirectory/abc"
        );
        assert_eq!(delete["currentDocument"]["exists"], true);
    }

    #[test]
    fn decode_skips_unknown_value_types() {
        let document: WireDocument = serde_json::from_value(json!({
            "name": "projects/p/databases/(default)/documents/beamWebsiteDirectory/site-1",
            "fields": {
                "title": { "stringValue": "Site" },
                "sortOrder": { "integerValue": "7" },
                "isActive": { "booleanValue": true },
                "updatedAt": { "timestampValue": "2025-01-02T03:04:05.123456Z" },
                "rating": { "doubleValue": 4.5 },
                "broken": { "integerValue": "seven" }
            }
        }))
        .unwrap();
        let stored = decode_document(document);
        assert_eq!(stored.id, "site-1");
        assert_eq!(stored.fields["title"], FieldValue::String("Site".into()));
        assert_eq!(stored.fields["sortOrder"], FieldValue::Integer(7));
        assert_eq!(stored.fields["isActive"], FieldValue::Boolean(true));
        assert!(matches!(stored.fields["updatedAt"], FieldValue::Timestamp(_)));
        assert!(!stored.fields.contains_key("rating"));
        assert!(!stored.fields.contains_key("broken"));
    }

    #[test]
    fn api_base_trailing_slash_is_ignored() {
        let config = FirestoreConfig::new("p", "c").with_api_base("http://127.0.0.1:8080/v1/");
        assert_eq!(
            config.documents_url(),
            "http://127.0.0.1:8080/v1/projects/p/databases/(default)/documents"
        );
    }
}
