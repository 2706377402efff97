//! Conversion between typed table attributes and [`DocumentRecord`].
//!
//! Every field is stored as a string attribute; `analysis` holds serialized JSON. Absent
//! attributes decode to `None`.

use super::MetadataError;
use crate::document::{DocumentRecord, DocumentStatus, ProcessedUpdate};
use aws_sdk_dynamodb::types::AttributeValue;
use std::collections::HashMap;

/// Attribute map as stored in the table.
pub type Item = HashMap<String, AttributeValue>;

/// Primary key attribute name.
pub const ID: &str = "id";
const NAME: &str = "name";
const TYPE: &str = "type";
const FILE_EXTENSION: &str = "fileExtension";
/// Status attribute name.
pub const STATUS: &str = "status";
/// Creation timestamp attribute name.
pub const CREATED_AT: &str = "createdAt";
/// Processing timestamp attribute name.
pub const PROCESSED_AT: &str = "processedAt";
/// Serialized analysis attribute name.
pub const ANALYSIS: &str = "analysis";

/// Key map addressing a single record.
pub fn key_for(id: &str) -> Item {
    HashMap::from([(ID.to_string(), AttributeValue::S(id.to_string()))])
}

/// Encode a record, omitting absent fields.
pub fn encode_record(record: &DocumentRecord) -> Result<Item, MetadataError> {
    let mut item = key_for(&record.id);
    let mut put = |name: &str, value: Option<String>| {
        if let Some(value) = value {
            item.insert(name.to_string(), AttributeValue::S(value));
        }
    };
    put(NAME, record.name.clone());
    put(TYPE, record.doc_type.clone());
    put(FILE_EXTENSION, record.file_extension.clone());
    put(STATUS, record.status.map(|status| status.as_str().to_string()));
    put(CREATED_AT, record.created_at.clone());
    put(PROCESSED_AT, record.processed_at.clone());
    let analysis = record
        .analysis
        .as_ref()
        .map(|value| encode_analysis(&record.id, value))
        .transpose()?;
    put(ANALYSIS, analysis);
    Ok(item)
}

/// Attribute values written by a processed update, keyed by attribute name.
pub fn encode_update(id: &str, update: &ProcessedUpdate) -> Result<Item, MetadataError> {
    Ok(HashMap::from([
        (
            STATUS.to_string(),
            AttributeValue::S(DocumentStatus::Processed.as_str().to_string()),
        ),
        (
            ANALYSIS.to_string(),
            AttributeValue::S(encode_analysis(id, &update.analysis)?),
        ),
        (
            PROCESSED_AT.to_string(),
            AttributeValue::S(update.processed_at.clone()),
        ),
    ]))
}

/// Decode a stored item.
pub fn decode_record(item: &Item) -> Result<DocumentRecord, MetadataError> {
    let id = string_attr(item, ID, "")?.ok_or_else(|| MetadataError::Decode {
        id: String::new(),
        message: "record has no id".to_string(),
    })?;

    let status = string_attr(item, STATUS, &id)?
        .map(|raw| {
            DocumentStatus::parse(&raw).ok_or_else(|| MetadataError::Decode {
                id: id.clone(),
                message: format!("unknown status '{raw}'"),
            })
        })
        .transpose()?;

    let analysis = string_attr(item, ANALYSIS, &id)?
        .map(|raw| {
            serde_json::from_str(&raw).map_err(|err| MetadataError::Decode {
                id: id.clone(),
                message: format!("analysis is not valid JSON: {err}"),
            })
        })
        .transpose()?;

    Ok(DocumentRecord {
        name: string_attr(item, NAME, &id)?,
        doc_type: string_attr(item, TYPE, &id)?,
        file_extension: string_attr(item, FILE_EXTENSION, &id)?,
        status,
        created_at: string_attr(item, CREATED_AT, &id)?,
        processed_at: string_attr(item, PROCESSED_AT, &id)?,
        analysis,
        id,
    })
}

/// Read the id out of a key map such as a scan's last evaluated key.
pub fn decode_key(key: &Item) -> Option<String> {
    key.get(ID).and_then(|value| value.as_s().ok()).cloned()
}

fn string_attr(item: &Item, name: &str, id: &str) -> Result<Option<String>, MetadataError> {
    match item.get(name) {
        None | Some(AttributeValue::Null(_)) => Ok(None),
        Some(AttributeValue::S(value)) => Ok(Some(value.clone())),
        Some(_) => Err(MetadataError::Decode {
            id: id.to_string(),
            message: format!("attribute '{name}' is not a string"),
        }),
    }
}

fn encode_analysis(id: &str, analysis: &serde_json::Value) -> Result<String, MetadataError> {
    serde_json::to_string(analysis).map_err(|err| MetadataError::Decode {
        id: id.to_string(),
        message: format!("analysis could not be serialized: {err}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentType;
    use serde_json::json;

    #[test]
    fn pending_record_omits_processing_fields() {
        let record =
            DocumentRecord::pending("doc-1".into(), "report.pdf".into(), DocumentType::Pdf);
        let item = encode_record(&record).expect("encode");

        assert_eq!(item.get("id").and_then(|v| v.as_s().ok()).map(String::as_str), Some("doc-1"));
        assert_eq!(
            item.get("fileExtension").and_then(|v| v.as_s().ok()).map(String::as_str),
            Some("pdf")
        );
        assert_eq!(
            item.get("status").and_then(|v| v.as_s().ok()).map(String::as_str),
            Some("PENDING")
        );
        assert!(!item.contains_key("analysis"));
        assert!(!item.contains_key("processedAt"));

        assert_eq!(decode_record(&item).expect("decode"), record);
    }

    #[test]
    fn absent_attributes_decode_to_none() {
        let item = key_for("sparse");
        let record = decode_record(&item).expect("decode");
        assert_eq!(record.id, "sparse");
        assert!(record.name.is_none());
        assert!(record.status.is_none());
        assert!(record.file_extension.is_none());
        assert!(record.analysis.is_none());
    }

    #[test]
    fn analysis_is_stored_as_json_string() {
        let update = ProcessedUpdate {
            analysis: json!({ "completion": "summary" }),
            processed_at: "2024-01-01T00:00:00Z".into(),
        };
        let attrs = encode_update("doc-2", &update).expect("encode");
        let raw = attrs.get("analysis").and_then(|v| v.as_s().ok()).expect("analysis");
        let parsed: serde_json::Value = serde_json::from_str(raw).expect("json");
        assert_eq!(parsed, update.analysis);
        assert_eq!(
            attrs.get("status").and_then(|v| v.as_s().ok()).map(String::as_str),
            Some("PROCESSED")
        );
    }

    #[test]
    fn malformed_analysis_fails_decoding() {
        let mut item = key_for("doc-3");
        item.insert("analysis".into(), AttributeValue::S("{not json".into()));
        let error = decode_record(&item).unwrap_err();
        assert!(matches!(error, MetadataError::Decode { id, .. } if id == "doc-3"));
    }

    #[test]
    fn unknown_status_fails_decoding() {
        let mut item = key_for("doc-4");
        item.insert("status".into(), AttributeValue::S("ARCHIVED".into()));
        assert!(decode_record(&item).is_err());
    }

    #[test]
    fn non_string_attribute_is_rejected() {
        let mut item = key_for("doc-5");
        item.insert("name".into(), AttributeValue::N("7".into()));
        assert!(decode_record(&item).is_err());
    }

    #[test]
    fn decode_key_reads_id() {
        assert_eq!(decode_key(&key_for("abc")), Some("abc".to_string()));
        assert_eq!(decode_key(&HashMap::new()), None);
    }
}
