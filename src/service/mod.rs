//! Document lifecycle handlers: upload, process, get, list, delete.
//!
//! Handlers are independent and stateless between calls. Each one performs its store calls
//! in sequence and stops at the first failure; no step is compensated or retried, so a
//! partial failure can leave an object without a record (upload) or a record without its
//! object (delete).

mod lifecycle;
pub mod types;

pub use lifecycle::{DocumentApi, DocumentService};
pub use types::{
    DocumentError, DocumentView, ErrorKind, ListOutcome, ProcessOutcome, UploadOutcome,
    UploadRequest, ValidationError,
};
