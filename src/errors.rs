use thiserror::Error;

/// Failures that abort a whole invocation.
///
/// Anything surfacing as an `IngestError` propagates out of the Lambda handler
/// so the trigger (SQS redrive, the provisioning hook) can retry it.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Failed to retrieve secret: {0}")]
    SecretError(String),

    #[error("Failed to send HTTP request: {0}")]
    HttpError(String),

    #[error("Management API returned {status}: {body}")]
    ApiError { status: u16, body: String },

    #[error("Database operation failed: {0}")]
    DatabaseError(String),

    #[error("Failed to serialize payload: {0}")]
    SerializationError(String),
}

impl From<reqwest::Error> for IngestError {
    fn from(error: reqwest::Error) -> Self {
        IngestError::HttpError(error.to_string())
    }
}

impl From<tokio_postgres::Error> for IngestError {
    fn from(error: tokio_postgres::Error) -> Self {
        IngestError::DatabaseError(error.to_string())
    }
}

impl From<serde_json::Error> for IngestError {
    fn from(error: serde_json::Error) -> Self {
        IngestError::SerializationError(error.to_string())
    }
}

/// Reasons a single DLQ record is dropped without a status report.
///
/// These never leave the batch loop: the record is logged and the next one is
/// processed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("message body is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("unrecognized payload shape (detail-type: {detail_type:?}, keys: {keys:?})")]
    UnrecognizedShape {
        detail_type: Option<String>,
        keys: Vec<String>,
    },

    #[error("missing S3_OBJECT_KEY or EVENT_TYPE in container overrides")]
    MissingFields,

    #[error("unknown EVENT_TYPE: {0}")]
    UnknownEventType(String),

    #[error("object key has no file name: {0:?}")]
    InvalidObjectKey(String),
}
