pub mod ingest_service;

pub use ingest_service::{IngestError, IngestReport, IngestService, SourceReport, TableFailure};
