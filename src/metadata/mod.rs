//! Metadata gateway: document records in the key-value table.
//!
//! The table stores every field as a typed attribute. Encoding and decoding between those
//! attributes and [`DocumentRecord`] happens in [`codec`] and nowhere else.

pub mod codec;
mod dynamo;
mod memory;

pub use dynamo::DynamoMetadataStore;
pub use memory::InMemoryMetadataStore;

use crate::document::{DocumentRecord, ProcessedUpdate};
use async_trait::async_trait;
use thiserror::Error;

/// Maximum number of records returned by a single scan.
pub const SCAN_PAGE_SIZE: usize = 100;

/// Errors raised by metadata store backends.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// Backend rejected the request or was unreachable.
    #[error("Metadata request failed: {0}")]
    Backend(String),
    /// A stored record could not be mapped to the document model.
    #[error("Malformed metadata record '{id}': {message}")]
    Decode {
        /// Identifier of the offending record, when known.
        id: String,
        /// Description of the decoding failure.
        message: String,
    },
}

/// One page of an unordered table scan.
#[derive(Debug, Clone, Default)]
pub struct ScanPage {
    /// Records in this page.
    pub items: Vec<DocumentRecord>,
    /// Id of the last record read when more records may follow.
    pub last_evaluated_key: Option<String>,
}

/// Record-level access to the metadata table.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Insert or replace a record.
    async fn put_item(&self, record: &DocumentRecord) -> Result<(), MetadataError>;

    /// Fetch a record by id.
    async fn get_item(&self, id: &str) -> Result<Option<DocumentRecord>, MetadataError>;

    /// Mark a record processed. Like the table's native update, this creates the record when
    /// it does not exist.
    async fn update_item(&self, id: &str, update: &ProcessedUpdate) -> Result<(), MetadataError>;

    /// Remove a record.
    async fn delete_item(&self, id: &str) -> Result<(), MetadataError>;

    /// Read up to `limit` records, resuming after `exclusive_start_key` when given.
    async fn scan(
        &self,
        limit: usize,
        exclusive_start_key: Option<&str>,
    ) -> Result<ScanPage, MetadataError>;
}
