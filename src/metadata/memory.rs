//! Process-local metadata store used for tests and local runs.
//!
//! Records are kept in their encoded attribute form so the codec is exercised exactly as it is
//! against the real table.

use super::codec::{self, Item};
use super::{MetadataError, MetadataStore, ScanPage};
use crate::document::{DocumentRecord, ProcessedUpdate};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::ops::Bound;
use tokio::sync::RwLock;

/// Metadata store holding encoded items in memory, ordered by id.
#[derive(Default)]
pub struct InMemoryMetadataStore {
    items: RwLock<BTreeMap<String, Item>>,
}

impl InMemoryMetadataStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a raw attribute map, bypassing record encoding.
    pub async fn insert_raw(&self, item: Item) -> Result<(), MetadataError> {
        let id = codec::decode_key(&item).ok_or_else(|| MetadataError::Decode {
            id: String::new(),
            message: "item has no string id".to_string(),
        })?;
        self.items.write().await.insert(id, item);
        Ok(())
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    /// Whether the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn put_item(&self, record: &DocumentRecord) -> Result<(), MetadataError> {
        let item = codec::encode_record(record)?;
        self.items.write().await.insert(record.id.clone(), item);
        Ok(())
    }

    async fn get_item(&self, id: &str) -> Result<Option<DocumentRecord>, MetadataError> {
        self.items
            .read()
            .await
            .get(id)
            .map(codec::decode_record)
            .transpose()
    }

    async fn update_item(&self, id: &str, update: &ProcessedUpdate) -> Result<(), MetadataError> {
        let values = codec::encode_update(id, update)?;
        let mut items = self.items.write().await;
        let item = items
            .entry(id.to_string())
            .or_insert_with(|| codec::key_for(id));
        item.extend(values);
        Ok(())
    }

    async fn delete_item(&self, id: &str) -> Result<(), MetadataError> {
        self.items.write().await.remove(id);
        Ok(())
    }

    async fn scan(
        &self,
        limit: usize,
        exclusive_start_key: Option<&str>,
    ) -> Result<ScanPage, MetadataError> {
        let items = self.items.read().await;
        let lower = match exclusive_start_key {
            Some(key) => Bound::Excluded(key.to_string()),
            None => Bound::Unbounded,
        };
        let mut remaining = items.range((lower, Bound::Unbounded));

        let page = remaining
            .by_ref()
            .take(limit)
            .map(|(_, item)| codec::decode_record(item))
            .collect::<Result<Vec<_>, _>>()?;
        let last_evaluated_key = if remaining.next().is_some() {
            page.last().map(|record| record.id.clone())
        } else {
            None
        };

        Ok(ScanPage {
            items: page,
            last_evaluated_key,
        })
    }
}
