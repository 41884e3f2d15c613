//! Application layer: ingestion, rendering and the pipeline service
//!
//! This layer orchestrates domain logic and depends on I/O boundary traits.

pub mod error;
pub mod error_ext;
pub mod ingest;
pub mod render;
pub mod services;

pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::IoResultExt;
pub use ingest::{FieldNames, Ingested, Ingestor, InputFormat};
pub use render::{render, OutputFormat};
