//! Lifecycle handlers sequencing the storage, metadata, extraction, and analysis components.

use crate::{
    analysis::{AnalysisClient, AnalysisError, BedrockAnalysisClient, HttpAnalysisClient},
    config::{AnalysisProvider, Config},
    document::{DocumentRecord, DocumentType, ProcessedUpdate},
    events::ObjectCreatedEvent,
    extraction::{self, ContentFormat},
    logging::SERVICE_NAME,
    metadata::{DynamoMetadataStore, MetadataStore, SCAN_PAGE_SIZE},
    metrics::{LifecycleMetrics, MetricsSnapshot},
    service::types::{
        DocumentError, DocumentView, ListOutcome, ProcessOutcome, UploadOutcome, UploadRequest,
        ValidationError,
    },
    storage::{ContentStore, S3ContentStore, object_key, split_object_key},
};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// Extension assumed for records written before `fileExtension` was stored.
const FALLBACK_EXTENSION: &str = "json";

/// Coordinates the five document lifecycle handlers.
///
/// The service owns long-lived handles to the content store, metadata store, and analysis
/// provider. Construct it once near process start and share it through an `Arc`; handlers keep
/// no state between invocations.
pub struct DocumentService {
    content: Arc<dyn ContentStore>,
    metadata: Arc<dyn MetadataStore>,
    analyzer: Arc<dyn AnalysisClient>,
    metrics: Arc<LifecycleMetrics>,
}

/// Abstraction over the lifecycle handlers used by external surfaces (HTTP, event CLI).
#[async_trait]
pub trait DocumentApi: Send + Sync {
    /// Validate and store a new document in the `PENDING` state.
    async fn upload(&self, request: UploadRequest) -> Result<UploadOutcome, DocumentError>;

    /// Extract and analyze a stored object, marking its record `PROCESSED`.
    async fn process(&self, event: ObjectCreatedEvent) -> Result<ProcessOutcome, DocumentError>;

    /// Return metadata merged with stored content.
    async fn get(&self, id: &str) -> Result<DocumentView, DocumentError>;

    /// Return one page of metadata records.
    async fn list(&self, exclusive_start_key: Option<&str>)
    -> Result<ListOutcome, DocumentError>;

    /// Remove the content object, then the metadata record.
    async fn delete(&self, id: &str) -> Result<(), DocumentError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl DocumentService {
    /// Assemble a service from explicit components.
    pub fn new(
        content: Arc<dyn ContentStore>,
        metadata: Arc<dyn MetadataStore>,
        analyzer: Arc<dyn AnalysisClient>,
    ) -> Self {
        Self {
            content,
            metadata,
            analyzer,
            metrics: Arc::new(LifecycleMetrics::new()),
        }
    }

    /// Build the AWS-backed service described by `config`.
    pub async fn from_config(config: &Config) -> Result<Self, AnalysisError> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &config.aws_region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &config.aws_endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        let content = S3ContentStore::new(
            &sdk_config,
            config.bucket_name.clone(),
            config.aws_endpoint_url.is_some(),
        );
        let metadata = DynamoMetadataStore::new(&sdk_config, config.table_name.clone());
        let analyzer: Arc<dyn AnalysisClient> = match config.analysis_provider {
            AnalysisProvider::Bedrock => Arc::new(BedrockAnalysisClient::new(
                &sdk_config,
                config.model_id.clone(),
            )),
            AnalysisProvider::Http => {
                let base_url = config.analysis_url.clone().ok_or_else(|| {
                    AnalysisError::Request("ANALYSIS_URL is not configured".to_string())
                })?;
                Arc::new(HttpAnalysisClient::new(base_url, config.model_id.clone())?)
            }
        };
        tracing::info!(
            bucket = %config.bucket_name,
            table = %config.table_name,
            provider = ?config.analysis_provider,
            "Document service initialized"
        );

        Ok(Self::new(Arc::new(content), Arc::new(metadata), analyzer))
    }

    /// Validate and store a new document.
    ///
    /// The content object is written before the metadata record; a failed metadata write leaves
    /// the object orphaned.
    #[tracing::instrument(
        name = "upload",
        skip_all,
        fields(service = SERVICE_NAME, request_id = %Uuid::new_v4(), document_id = tracing::field::Empty)
    )]
    pub async fn upload(&self, request: UploadRequest) -> Result<UploadOutcome, DocumentError> {
        let result = self.upload_inner(request).await;
        self.track(result)
    }

    async fn upload_inner(&self, request: UploadRequest) -> Result<UploadOutcome, DocumentError> {
        let document_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("document_id", document_id.as_str());
        let UploadRequest {
            name,
            doc_type: declared,
            content,
        } = request;
        tracing::info!(declared_type = ?declared, "Processing upload request");

        let doc_type = declared
            .as_deref()
            .and_then(DocumentType::from_mime)
            .ok_or_else(|| {
                tracing::warn!(declared_type = ?declared, "Unsupported document type");
                ValidationError::UnsupportedType {
                    declared: declared.clone(),
                    supported: DocumentType::supported_list(),
                }
            })?;
        let name = name.ok_or(ValidationError::MissingField("name"))?;
        let body = encode_upload_content(doc_type, content).inspect_err(|error| {
            tracing::warn!(error = %error, doc_type = doc_type.mime(), "Invalid upload content");
        })?;

        let key = object_key(&document_id, doc_type.extension());
        tracing::debug!(key = %key, size_bytes = body.len(), "Uploading document to storage");
        self.content
            .put_object(&key, body, doc_type.mime())
            .await?;
        tracing::info!(doc_type = doc_type.mime(), "Document uploaded to storage");

        self.metadata
            .put_item(&DocumentRecord::pending(document_id.clone(), name, doc_type))
            .await?;
        tracing::info!("Document metadata stored");
        self.metrics.record_upload();

        Ok(UploadOutcome {
            document_id,
            doc_type,
        })
    }

    /// Extract, analyze, and mark the document named by `event` as processed.
    ///
    /// Re-running against an already processed document overwrites its analysis.
    #[tracing::instrument(
        name = "process",
        skip_all,
        fields(service = SERVICE_NAME, request_id = %Uuid::new_v4(), document_id = tracing::field::Empty)
    )]
    pub async fn process(
        &self,
        event: ObjectCreatedEvent,
    ) -> Result<ProcessOutcome, DocumentError> {
        let result = self.process_inner(event).await;
        self.track(result)
    }

    async fn process_inner(
        &self,
        event: ObjectCreatedEvent,
    ) -> Result<ProcessOutcome, DocumentError> {
        tracing::info!(bucket = event.bucket(), key = event.key(), "Processing document event");
        if event.bucket() != self.content.bucket() {
            return Err(DocumentError::InvalidEvent(format!(
                "event bucket '{}' does not match configured bucket '{}'",
                event.bucket(),
                self.content.bucket()
            )));
        }

        let key = event.key();
        let (document_id, extension) = split_object_key(key).ok_or_else(|| {
            DocumentError::Extraction(extraction::ExtractionError::UnsupportedType(
                key.to_string(),
            ))
        })?;
        tracing::Span::current().record("document_id", document_id);
        tracing::debug!(key, extension = %extension, "Extracted file information");

        let bytes = self.content.get_object(key).await?;
        let content = tokio::task::spawn_blocking(move || extraction::extract(bytes, &extension))
            .await
            .map_err(|err| DocumentError::Internal(format!("extraction task failed: {err}")))??;
        tracing::info!(content_bytes = content.len(), "Document extracted successfully");

        let analysis = self.analyzer.analyze(&content).await?;
        tracing::info!("Document analysis completed");

        self.metadata
            .update_item(document_id, &ProcessedUpdate::now(analysis.clone()))
            .await?;
        self.metrics.record_processed();
        tracing::info!("Document processing completed successfully");

        Ok(ProcessOutcome {
            document_id: document_id.to_string(),
            analysis,
        })
    }

    /// Return a document's metadata merged with its stored content.
    ///
    /// The content key uses the record's `fileExtension`.
    #[tracing::instrument(
        name = "get",
        skip_all,
        fields(service = SERVICE_NAME, request_id = %Uuid::new_v4(), document_id = id)
    )]
    pub async fn get(&self, id: &str) -> Result<DocumentView, DocumentError> {
        let result = self.get_inner(id).await;
        self.track(result)
    }

    async fn get_inner(&self, id: &str) -> Result<DocumentView, DocumentError> {
        let id = require_id(id)?;
        tracing::info!("Retrieving document");
        let record = self.find_record(id).await?;
        tracing::debug!("Retrieved document metadata");

        let extension = record
            .file_extension
            .clone()
            .unwrap_or_else(|| FALLBACK_EXTENSION.to_string());
        let bytes = self.content.get_object(&object_key(id, &extension)).await?;
        let content = render_content(&extension, bytes)?;
        tracing::info!("Document retrieved successfully");

        Ok(DocumentView { record, content })
    }

    /// Return up to one page of metadata records.
    #[tracing::instrument(
        name = "list",
        skip_all,
        fields(service = SERVICE_NAME, request_id = %Uuid::new_v4())
    )]
    pub async fn list(
        &self,
        exclusive_start_key: Option<&str>,
    ) -> Result<ListOutcome, DocumentError> {
        let result = self.list_inner(exclusive_start_key).await;
        self.track(result)
    }

    async fn list_inner(
        &self,
        exclusive_start_key: Option<&str>,
    ) -> Result<ListOutcome, DocumentError> {
        tracing::info!(start = ?exclusive_start_key, "Retrieving documents");
        let page = self
            .metadata
            .scan(SCAN_PAGE_SIZE, exclusive_start_key)
            .await?;
        tracing::info!(
            count = page.items.len(),
            truncated = page.last_evaluated_key.is_some(),
            "Documents retrieved successfully"
        );
        Ok(ListOutcome {
            documents: page.items,
            last_evaluated_key: page.last_evaluated_key,
        })
    }

    /// Delete the content object, then the metadata record.
    ///
    /// A failed metadata delete leaves the record in place with its object already removed.
    #[tracing::instrument(
        name = "delete",
        skip_all,
        fields(service = SERVICE_NAME, request_id = %Uuid::new_v4(), document_id = id)
    )]
    pub async fn delete(&self, id: &str) -> Result<(), DocumentError> {
        let result = self.delete_inner(id).await;
        self.track(result)
    }

    async fn delete_inner(&self, id: &str) -> Result<(), DocumentError> {
        let id = require_id(id)?;
        tracing::info!("Attempting to delete document");
        let record = self.find_record(id).await?;

        let extension = record
            .file_extension
            .as_deref()
            .unwrap_or(FALLBACK_EXTENSION);
        let key = object_key(id, extension);
        tracing::debug!(key = %key, "Deleting document from storage");
        self.content.delete_object(&key).await?;
        tracing::info!("Document deleted from storage");

        self.metadata.delete_item(id).await?;
        self.metrics.record_delete();
        tracing::info!("Document deleted successfully");
        Ok(())
    }

    /// Return the current lifecycle metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    async fn find_record(&self, id: &str) -> Result<DocumentRecord, DocumentError> {
        self.metadata.get_item(id).await?.ok_or_else(|| {
            tracing::warn!("Document not found");
            DocumentError::NotFound(id.to_string())
        })
    }

    fn track<T>(&self, result: Result<T, DocumentError>) -> Result<T, DocumentError> {
        if let Err(error) = &result {
            self.metrics.record_failure();
            tracing::error!(error = %error, kind = ?error.kind(), "Request failed");
        }
        result
    }
}

fn require_id(id: &str) -> Result<&str, ValidationError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(ValidationError::MissingId)
    } else {
        Ok(trimmed)
    }
}

/// Turn upload content into the bytes stored for `doc_type`.
fn encode_upload_content(
    doc_type: DocumentType,
    content: Option<Value>,
) -> Result<Vec<u8>, ValidationError> {
    let content = content.ok_or(ValidationError::MissingField("content"))?;
    match doc_type {
        DocumentType::Json => serde_json::to_vec(&content)
            .map_err(|err| ValidationError::InvalidContent(err.to_string())),
        DocumentType::PlainText => match content {
            Value::String(text) => Ok(text.into_bytes()),
            _ => Err(ValidationError::InvalidContent(
                "For text/plain, content must be a string.".to_string(),
            )),
        },
        DocumentType::Pdf => match content {
            Value::String(encoded) if !encoded.is_empty() => {
                decode_canonical_base64(&encoded)
                    .ok_or(ValidationError::InvalidEncoding(doc_type.mime()))
            }
            _ => Err(ValidationError::InvalidContent(format!(
                "For {}, content must be a base64 encoded string. Please convert your file to base64 before uploading.",
                doc_type.mime()
            ))),
        },
    }
}

/// Decode standard base64, accepting only input that re-encodes to itself.
fn decode_canonical_base64(encoded: &str) -> Option<Vec<u8>> {
    let bytes = STANDARD.decode(encoded).ok()?;
    (STANDARD.encode(&bytes) == encoded).then_some(bytes)
}

/// Render stored bytes for a Get response.
fn render_content(extension: &str, bytes: Vec<u8>) -> Result<Value, DocumentError> {
    match ContentFormat::from_extension(extension) {
        Some(ContentFormat::Json) => Ok(serde_json::from_slice(&bytes)
            .map_err(extraction::ExtractionError::from)?),
        Some(ContentFormat::Text) => Ok(Value::String(
            String::from_utf8(bytes).map_err(extraction::ExtractionError::from)?,
        )),
        Some(ContentFormat::Pdf) | None => Ok(Value::String(STANDARD.encode(bytes))),
    }
}

#[async_trait]
impl DocumentApi for DocumentService {
    async fn upload(&self, request: UploadRequest) -> Result<UploadOutcome, DocumentError> {
        DocumentService::upload(self, request).await
    }

    async fn process(&self, event: ObjectCreatedEvent) -> Result<ProcessOutcome, DocumentError> {
        DocumentService::process(self, event).await
    }

    async fn get(&self, id: &str) -> Result<DocumentView, DocumentError> {
        DocumentService::get(self, id).await
    }

    async fn list(
        &self,
        exclusive_start_key: Option<&str>,
    ) -> Result<ListOutcome, DocumentError> {
        DocumentService::list(self, exclusive_start_key).await
    }

    async fn delete(&self, id: &str) -> Result<(), DocumentError> {
        DocumentService::delete(self, id).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        DocumentService::metrics_snapshot(self)
    }
}
