#![deny(missing_docs)]

//! Core library for the docflow document pipeline.

/// Model-backed analysis of extracted content.
pub mod analysis;
/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Document data model.
pub mod document;
/// Storage notifications that trigger processing.
pub mod events;
/// Type-specific content extraction.
pub mod extraction;
/// Structured logging and tracing setup.
pub mod logging;
/// Metadata gateway over the key-value table.
pub mod metadata;
/// Lifecycle metrics helpers.
pub mod metrics;
/// Front-end relay: static files and API proxy.
pub mod relay;
/// Document lifecycle handlers.
pub mod service;
/// Storage gateway over the content bucket.
pub mod storage;
