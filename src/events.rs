//! Storage notifications that trigger document processing.

use serde::Deserialize;

/// "Object Created" notification as delivered by the event bus.
///
/// Only the fields processing needs are modelled; everything else in the envelope is ignored.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ObjectCreatedEvent {
    /// Event payload.
    pub detail: ObjectCreatedDetail,
}

/// Payload of an [`ObjectCreatedEvent`].
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ObjectCreatedDetail {
    /// Bucket holding the new object.
    pub bucket: BucketRef,
    /// The new object.
    pub object: ObjectRef,
}

/// Bucket reference inside an event.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct BucketRef {
    /// Bucket name.
    pub name: String,
}

/// Object reference inside an event.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ObjectRef {
    /// Object key.
    pub key: String,
}

impl ObjectCreatedEvent {
    /// Build an event for `key` in `bucket`.
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            detail: ObjectCreatedDetail {
                bucket: BucketRef { name: bucket.into() },
                object: ObjectRef { key: key.into() },
            },
        }
    }

    /// Bucket named by the event.
    pub fn bucket(&self) -> &str {
        &self.detail.bucket.name
    }

    /// Object key named by the event.
    pub fn key(&self) -> &str {
        &self.detail.object.key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_event_bus_envelope() {
        let raw = json!({
            "version": "0",
            "detail-type": "Object Created",
            "source": "aws.s3",
            "detail": {
                "version": "0",
                "bucket": { "name": "documents" },
                "object": { "key": "abc.pdf", "size": 1024, "etag": "x" },
                "reason": "PutObject"
            }
        });
        let event: ObjectCreatedEvent = serde_json::from_value(raw).expect("event");
        assert_eq!(event, ObjectCreatedEvent::new("documents", "abc.pdf"));
        assert_eq!(event.bucket(), "documents");
        assert_eq!(event.key(), "abc.pdf");
    }

    #[test]
    fn missing_object_key_is_rejected() {
        let raw = json!({ "detail": { "bucket": { "name": "documents" }, "object": {} } });
        assert!(serde_json::from_value::<ObjectCreatedEvent>(raw).is_err());
    }
}
