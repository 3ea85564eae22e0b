//! Event handlers for the document-ingestion pipeline.
//!
//! Two independent Lambda functions live in this crate:
//! 1. `init-pgvector`: enables the `vector` extension in the document database,
//!    invoked once after provisioning.
//! 2. `status-dlq`: consumes the ingestion task dead-letter queue and marks the
//!    affected documents as `failed` / `delete_failed` on the management API.
//!
//! # Architecture
//!
//! - AWS Lambda for serverless execution, SQS as the DLQ trigger
//! - Secrets Manager / SSM Parameter Store for credentials
//! - reqwest for the management API, tokio-postgres for the database
//! - Tokio for the async runtime
//!
//! Clients are created once per process and handed to the handlers, so tests
//! can swap in fakes for [`core::secrets::SecretStore`],
//! [`dlq::StatusReporter`] and [`db_init::SchemaConnector`].
pub mod core;
pub mod db_init;
pub mod dlq;
pub mod errors;
pub mod utils;

pub use utils::text::truncate_chars;

/// Configure structured logging with JSON format for AWS Lambda environments.
///
/// Log level follows `RUST_LOG` and defaults to `info`. Safe to call more than
/// once; only the first call installs the subscriber.
///
/// # Example
///
/// ```
/// ingest_handlers::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_target(true)
        .with_current_span(true);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
