//! DynamoDB-backed metadata store.

use super::codec::{self, ANALYSIS, PROCESSED_AT, STATUS};
use super::{MetadataError, MetadataStore, ScanPage};
use crate::document::{DocumentRecord, ProcessedUpdate};
use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::error::DisplayErrorContext;

const PROCESSED_UPDATE_EXPRESSION: &str =
    "SET #status = :status, analysis = :analysis, processedAt = :processedAt";

/// Metadata store backed by a single DynamoDB table keyed by `id`.
#[derive(Clone)]
pub struct DynamoMetadataStore {
    client: Client,
    table_name: String,
}

impl DynamoMetadataStore {
    /// Build a store from shared AWS configuration.
    pub fn new(sdk_config: &aws_config::SdkConfig, table_name: String) -> Self {
        tracing::debug!(table = %table_name, "Initialized DynamoDB client");
        Self {
            client: Client::new(sdk_config),
            table_name,
        }
    }
}

fn backend_error<E>(table: &str, action: &str, err: E) -> MetadataError
where
    E: std::error::Error,
{
    let message = DisplayErrorContext(err).to_string();
    tracing::error!(table, error = %message, "DynamoDB {action} failed");
    MetadataError::Backend(message)
}

#[async_trait]
impl MetadataStore for DynamoMetadataStore {
    async fn put_item(&self, record: &DocumentRecord) -> Result<(), MetadataError> {
        let item = codec::encode_record(record)?;
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|err| backend_error(&self.table_name, "put_item", err))?;
        tracing::debug!(table = %self.table_name, document_id = %record.id, "Stored metadata record");
        Ok(())
    }

    async fn get_item(&self, id: &str) -> Result<Option<DocumentRecord>, MetadataError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(codec::key_for(id)))
            .send()
            .await
            .map_err(|err| backend_error(&self.table_name, "get_item", err))?;
        output.item().map(codec::decode_record).transpose()
    }

    async fn update_item(&self, id: &str, update: &ProcessedUpdate) -> Result<(), MetadataError> {
        let mut values = codec::encode_update(id, update)?;
        let take = |values: &mut codec::Item, name: &str| {
            values.remove(name).ok_or_else(|| MetadataError::Decode {
                id: id.to_string(),
                message: format!("update is missing '{name}'"),
            })
        };
        let status = take(&mut values, STATUS)?;
        let analysis = take(&mut values, ANALYSIS)?;
        let processed_at = take(&mut values, PROCESSED_AT)?;

        self.client
            .update_item()
            .table_name(&self.table_name)
            .set_key(Some(codec::key_for(id)))
            .update_expression(PROCESSED_UPDATE_EXPRESSION)
            .expression_attribute_names("#status", STATUS)
            .expression_attribute_values(":status", status)
            .expression_attribute_values(":analysis", analysis)
            .expression_attribute_values(":processedAt", processed_at)
            .send()
            .await
            .map_err(|err| backend_error(&self.table_name, "update_item", err))?;
        tracing::debug!(table = %self.table_name, document_id = id, "Updated metadata record");
        Ok(())
    }

    async fn delete_item(&self, id: &str) -> Result<(), MetadataError> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .set_key(Some(codec::key_for(id)))
            .send()
            .await
            .map_err(|err| backend_error(&self.table_name, "delete_item", err))?;
        tracing::debug!(table = %self.table_name, document_id = id, "Deleted metadata record");
        Ok(())
    }

    async fn scan(
        &self,
        limit: usize,
        exclusive_start_key: Option<&str>,
    ) -> Result<ScanPage, MetadataError> {
        let limit = i32::try_from(limit.max(1)).unwrap_or(i32::MAX);
        let output = self
            .client
            .scan()
            .table_name(&self.table_name)
            .limit(limit)
            .set_exclusive_start_key(exclusive_start_key.map(codec::key_for))
            .send()
            .await
            .map_err(|err| backend_error(&self.table_name, "scan", err))?;

        let items = output
            .items()
            .iter()
            .map(codec::decode_record)
            .collect::<Result<Vec<_>, _>>()?;
        let last_evaluated_key = output.last_evaluated_key().and_then(codec::decode_key);
        tracing::debug!(
            table = %self.table_name,
            count = items.len(),
            truncated = last_evaluated_key.is_some(),
            "Scanned metadata table"
        );
        Ok(ScanPage {
            items,
            last_evaluated_key,
        })
    }
}
