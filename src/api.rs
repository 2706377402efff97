//! HTTP surface for the document pipeline.
//!
//! This module exposes a compact Axum router over the lifecycle handlers:
//!
//! - `POST /documents` – Validate and store a new document (`PENDING`).
//! - `GET /documents` – List up to 100 records; `?exclusiveStartKey=<id>` resumes a scan.
//! - `GET /documents/:id` – Return metadata merged with stored content.
//! - `DELETE /documents/:id` – Remove the content object and its metadata record.
//! - `POST /events` – Run processing for an "Object Created" storage event.
//! - `GET /metrics` – Observe lifecycle counters.
//!
//! Every response is JSON. Failures keep a per-endpoint body shape; see [`AppError`].

use crate::document::DocumentRecord;
use crate::events::ObjectCreatedEvent;
use crate::service::{DocumentApi, DocumentError, ErrorKind, UploadRequest, ValidationError};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

const UPLOAD_HELP: &str = "For PDF files, please ensure you convert the file to base64 before uploading.";
const PDF_INSTRUCTIONS: &str = "PDF will be processed for text extraction and analysis";

/// Build the HTTP router exposing the document API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: DocumentApi + 'static,
{
    Router::new()
        .route(
            "/documents",
            get(list_documents::<S>)
                .post(upload_document::<S>)
                .delete(delete_without_id),
        )
        .route(
            "/documents/:id",
            get(get_document::<S>).delete(delete_document::<S>),
        )
        .route("/events", post(process_event::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .layer(CorsLayer::permissive())
        .with_state(service)
}

/// Success response for `POST /documents`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    message: &'static str,
    document_id: String,
    #[serde(rename = "type")]
    doc_type: &'static str,
    instructions: Option<&'static str>,
}

/// Validate and store an uploaded document.
///
/// The body is parsed here rather than through the `Json` extractor so that malformed input
/// produces the upload error shape instead of Axum's rejection text.
async fn upload_document<S>(
    State(service): State<Arc<S>>,
    body: Bytes,
) -> Result<Json<UploadResponse>, AppError>
where
    S: DocumentApi,
{
    let request: UploadRequest = serde_json::from_slice(&body)
        .map_err(|err| AppError::upload(ValidationError::MalformedBody(err.to_string()).into()))?;
    let outcome = service.upload(request).await.map_err(AppError::upload)?;

    Ok(Json(UploadResponse {
        message: "Document uploaded successfully",
        document_id: outcome.document_id,
        doc_type: outcome.doc_type.mime(),
        instructions: outcome.doc_type.is_binary().then_some(PDF_INSTRUCTIONS),
    }))
}

/// Full document as returned by `GET /documents/:id`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DocumentResponse {
    id: String,
    name: Option<String>,
    created_at: Option<String>,
    status: Option<&'static str>,
    #[serde(rename = "type")]
    doc_type: Option<String>,
    content: Value,
    analysis: Option<Value>,
    processed_at: Option<String>,
}

/// Return metadata merged with stored content.
async fn get_document<S>(
    State(service): State<Arc<S>>,
    Path(id): Path<String>,
) -> Result<Json<DocumentResponse>, AppError>
where
    S: DocumentApi,
{
    let view = service.get(&id).await.map_err(AppError::get)?;
    let record = view.record;
    Ok(Json(DocumentResponse {
        id: record.id,
        name: record.name,
        created_at: record.created_at,
        status: record.status.map(|status| status.as_str()),
        doc_type: record.doc_type,
        content: view.content,
        analysis: record.analysis,
        processed_at: record.processed_at,
    }))
}

/// Query parameters accepted by `GET /documents`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    #[serde(default)]
    exclusive_start_key: Option<String>,
}

/// Listing entry: a metadata record without content.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DocumentSummary {
    id: String,
    name: Option<String>,
    created_at: Option<String>,
    status: Option<&'static str>,
    #[serde(rename = "type")]
    doc_type: Option<String>,
    analysis: Option<Value>,
    processed_at: Option<String>,
}

impl From<DocumentRecord> for DocumentSummary {
    fn from(record: DocumentRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            created_at: record.created_at,
            status: record.status.map(|status| status.as_str()),
            doc_type: record.doc_type,
            analysis: record.analysis,
            processed_at: record.processed_at,
        }
    }
}

/// Response body for `GET /documents`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    documents: Vec<DocumentSummary>,
    count: usize,
    last_evaluated_key: Option<Value>,
}

/// List one page of document metadata.
async fn list_documents<S>(
    State(service): State<Arc<S>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, AppError>
where
    S: DocumentApi,
{
    let start = query
        .exclusive_start_key
        .as_deref()
        .filter(|key| !key.is_empty());
    let outcome = service.list(start).await.map_err(AppError::list)?;
    let documents: Vec<DocumentSummary> =
        outcome.documents.into_iter().map(Into::into).collect();

    Ok(Json(ListResponse {
        count: documents.len(),
        documents,
        last_evaluated_key: outcome.last_evaluated_key.map(|id| json!({ "id": id })),
    }))
}

/// Response body for a successful delete.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteResponse {
    message: &'static str,
    document_id: String,
}

/// Delete a document's content object and metadata record.
async fn delete_document<S>(
    State(service): State<Arc<S>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError>
where
    S: DocumentApi,
{
    let id = id.trim();
    service.delete(id).await.map_err(AppError::delete)?;
    Ok(Json(DeleteResponse {
        message: "Document deleted successfully",
        document_id: id.to_string(),
    }))
}

/// `DELETE /documents` without an id.
async fn delete_without_id() -> AppError {
    AppError::delete(ValidationError::MissingId.into())
}

/// Response body for a successful processing run.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProcessResponse {
    message: &'static str,
    document_id: String,
    analysis: Value,
}

/// Run processing for a storage event.
async fn process_event<S>(
    State(service): State<Arc<S>>,
    body: Bytes,
) -> Result<Json<ProcessResponse>, AppError>
where
    S: DocumentApi,
{
    let event: ObjectCreatedEvent = serde_json::from_slice(&body).map_err(|err| {
        AppError::process(DocumentError::InvalidEvent(format!(
            "malformed event body: {err}"
        )))
    })?;
    let outcome = service.process(event).await.map_err(AppError::process)?;
    Ok(Json(ProcessResponse {
        message: "Document processed successfully",
        document_id: outcome.document_id,
        analysis: outcome.analysis,
    }))
}

/// Return lifecycle counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<crate::metrics::MetricsSnapshot>
where
    S: DocumentApi,
{
    Json(service.metrics_snapshot())
}

/// Handler that produced an [`AppError`]; each keeps its own failure body shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Upload,
    Get,
    List,
    Delete,
    Process,
}

/// Error returned by route handlers, rendered per operation.
struct AppError {
    operation: Operation,
    error: DocumentError,
}

impl AppError {
    fn upload(error: DocumentError) -> Self {
        Self {
            operation: Operation::Upload,
            error,
        }
    }

    fn get(error: DocumentError) -> Self {
        Self {
            operation: Operation::Get,
            error,
        }
    }

    fn list(error: DocumentError) -> Self {
        Self {
            operation: Operation::List,
            error,
        }
    }

    fn delete(error: DocumentError) -> Self {
        Self {
            operation: Operation::Delete,
            error,
        }
    }

    fn process(error: DocumentError) -> Self {
        Self {
            operation: Operation::Process,
            error,
        }
    }

    fn status(&self) -> StatusCode {
        match (self.operation, self.error.kind()) {
            (Operation::Upload, _) => StatusCode::BAD_REQUEST,
            // Process runs off an event; a bad event is still a failed invocation.
            (Operation::Process, _) => StatusCode::INTERNAL_SERVER_ERROR,
            (_, ErrorKind::Validation) => StatusCode::BAD_REQUEST,
            (_, ErrorKind::NotFound) => StatusCode::NOT_FOUND,
            (_, ErrorKind::Internal) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> Value {
        let error = self.error.to_string();
        match (self.operation, self.error.kind()) {
            (Operation::Upload, _) => json!({
                "message": "Error uploading document",
                "error": error,
                "help": UPLOAD_HELP,
            }),
            (Operation::Delete, ErrorKind::Validation) => json!({ "error": error }),
            (Operation::Delete, ErrorKind::NotFound) => json!({ "error": "Document not found" }),
            (Operation::Delete, ErrorKind::Internal) => json!({
                "error": "Could not delete document",
                "details": error,
            }),
            (Operation::Get, ErrorKind::NotFound) => json!({ "message": "Document not found" }),
            (Operation::Get, _) => json!({
                "message": "Error retrieving document",
                "error": error,
            }),
            (Operation::List, _) => json!({
                "message": "Error retrieving documents",
                "error": error,
            }),
            (Operation::Process, _) => json!({
                "message": "Error processing document",
                "error": error,
            }),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::create_router;
    use crate::document::{DocumentRecord, DocumentStatus};
    use crate::events::ObjectCreatedEvent;
    use crate::metadata::MetadataError;
    use crate::metrics::MetricsSnapshot;
    use crate::service::{
        DocumentApi, DocumentError, DocumentView, ListOutcome, ProcessOutcome, UploadOutcome,
        UploadRequest,
    };
    use async_trait::async_trait;
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode},
    };
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    /// Stub whose reads fail with a backend error and whose list echoes the start key.
    #[derive(Default)]
    struct StubDocumentService {
        list_calls: Mutex<Vec<Option<String>>>,
    }

    fn backend_failure() -> DocumentError {
        DocumentError::Metadata(MetadataError::Backend("table unavailable".into()))
    }

    #[async_trait]
    impl DocumentApi for StubDocumentService {
        async fn upload(&self, _request: UploadRequest) -> Result<UploadOutcome, DocumentError> {
            Err(backend_failure())
        }

        async fn process(
            &self,
            event: ObjectCreatedEvent,
        ) -> Result<ProcessOutcome, DocumentError> {
            Ok(ProcessOutcome {
                document_id: event.key().trim_end_matches(".txt").to_string(),
                analysis: json!({ "completion": "summary" }),
            })
        }

        async fn get(&self, _id: &str) -> Result<DocumentView, DocumentError> {
            Err(backend_failure())
        }

        async fn list(
            &self,
            exclusive_start_key: Option<&str>,
        ) -> Result<ListOutcome, DocumentError> {
            self.list_calls
                .lock()
                .await
                .push(exclusive_start_key.map(str::to_string));
            Ok(ListOutcome {
                documents: vec![DocumentRecord {
                    id: "doc-1".into(),
                    status: Some(DocumentStatus::Pending),
                    ..DocumentRecord::default()
                }],
                last_evaluated_key: Some("doc-1".into()),
            })
        }

        async fn delete(&self, _id: &str) -> Result<(), DocumentError> {
            Err(backend_failure())
        }

        fn metrics_snapshot(&self) -> MetricsSnapshot {
            MetricsSnapshot {
                documents_uploaded: 3,
                ..MetricsSnapshot::default()
            }
        }
    }

    async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .oneshot(builder.body(body).expect("request"))
            .await
            .expect("router response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn upload_failures_always_map_to_bad_request() {
        let app = create_router(Arc::new(StubDocumentService::default()));
        let (status, body) = send(
            app,
            Method::POST,
            "/documents",
            Some(json!({ "name": "a.txt", "type": "text/plain", "content": "hi" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Error uploading document");
        assert!(body["error"].as_str().unwrap_or_default().contains("table unavailable"));
        assert!(body["help"].is_string());
    }

    #[tokio::test]
    async fn malformed_upload_body_is_rejected() {
        let app = create_router(Arc::new(StubDocumentService::default()));
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/documents")
                    .body(Body::from("{not json"))
                    .expect("request"),
            )
            .await
            .expect("router response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn get_backend_failure_is_internal_error() {
        let app = create_router(Arc::new(StubDocumentService::default()));
        let (status, body) = send(app, Method::GET, "/documents/doc-1", None).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Error retrieving document");
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn delete_backend_failure_reports_details() {
        let app = create_router(Arc::new(StubDocumentService::default()));
        let (status, body) = send(app, Method::DELETE, "/documents/doc-1", None).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Could not delete document");
        assert!(body["details"].as_str().unwrap_or_default().contains("table unavailable"));
    }

    #[tokio::test]
    async fn delete_without_id_is_bad_request() {
        let app = create_router(Arc::new(StubDocumentService::default()));
        let (status, body) = send(app, Method::DELETE, "/documents", None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Document ID is required" }));
    }

    #[tokio::test]
    async fn list_forwards_start_key_and_wraps_continuation() {
        let service = Arc::new(StubDocumentService::default());
        let app = create_router(service.clone());
        let (status, body) = send(
            app,
            Method::GET,
            "/documents?exclusiveStartKey=doc-0",
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);
        assert_eq!(body["lastEvaluatedKey"], json!({ "id": "doc-1" }));
        assert_eq!(body["documents"][0]["status"], "PENDING");
        assert_eq!(body["documents"][0]["analysis"], Value::Null);
        assert_eq!(
            service.list_calls.lock().await.as_slice(),
            &[Some("doc-0".to_string())]
        );
    }

    #[tokio::test]
    async fn events_route_runs_processing() {
        let app = create_router(Arc::new(StubDocumentService::default()));
        let event = json!({
            "source": "aws.s3",
            "detail-type": "Object Created",
            "detail": { "bucket": { "name": "docs" }, "object": { "key": "doc-9.txt" } }
        });
        let (status, body) = send(app, Method::POST, "/events", Some(event)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Document processed successfully");
        assert_eq!(body["documentId"], "doc-9");
        assert_eq!(body["analysis"]["completion"], "summary");
    }

    #[tokio::test]
    async fn malformed_event_is_processing_failure() {
        let app = create_router(Arc::new(StubDocumentService::default()));
        let (status, body) =
            send(app, Method::POST, "/events", Some(json!({ "detail": {} }))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Error processing document");
    }

    #[tokio::test]
    async fn metrics_route_returns_snapshot() {
        let app = create_router(Arc::new(StubDocumentService::default()));
        let (status, body) = send(app, Method::GET, "/metrics", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["documentsUploaded"], 3);
        assert_eq!(body["failedRequests"], 0);
    }
}
