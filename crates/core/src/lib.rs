//! Domain logic for the champitech labeling backend.
//!
//! Two pipelines share the on-disk dataset layout and nothing else:
//! ingestion ([`ingest`]) writes image/label/metadata triples, and the
//! exporter ([`export`], [`report`]) reads them back into spreadsheets
//! and zip bundles. The HTTP layer lives in `champi-api`; this crate has
//! no axum types.

pub mod error;
pub mod export;
pub mod ingest;
pub mod labels;
pub mod report;
pub mod storage;
pub mod types;

pub use error::CoreError;
