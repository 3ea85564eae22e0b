use serde::{Deserialize, Serialize};

pub const OBJECT_KEY_VAR: &str = "S3_OBJECT_KEY";
pub const EVENT_TYPE_VAR: &str = "EVENT_TYPE";
pub const ECS_TASK_STATE_CHANGE: &str = "ECS Task State Change";

/// One `{"name": .., "value": ..}` pair from a container override.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentVariable {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerOverride {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub environment: Vec<EnvironmentVariable>,
}

/// Failure status the management API understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Failed,
    DeleteFailed,
}

impl DocumentStatus {
    /// Maps the pipeline's `EVENT_TYPE` to the status reported on failure.
    pub fn from_event_type(event_type: &str) -> Option<Self> {
        match event_type {
            "Object Created" => Some(DocumentStatus::Failed),
            "Object Deleted" => Some(DocumentStatus::DeleteFailed),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentStatus::Failed => "failed",
            DocumentStatus::DeleteFailed => "delete_failed",
        }
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which envelope a DLQ message arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadSource {
    EcsTaskStateChange,
    RunTask,
}

/// A fully classified record, ready to be reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub document_id: String,
    pub object_key: String,
    pub event_type: String,
    pub status: DocumentStatus,
    pub source: PayloadSource,
}

/// JSON body of the status PATCH.
#[derive(Debug, Serialize)]
pub struct StatusPatchBody {
    pub status: DocumentStatus,
}

/// Credentials attached to every management API call of one invocation.
#[derive(Clone)]
pub struct ApiCredentials {
    pub api_token: String,
    pub origin_verify: Option<String>,
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_token", &"<redacted>")
            .field(
                "origin_verify",
                &self.origin_verify.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Outcome counts for one DLQ invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub received: usize,
    pub reported: usize,
    pub skipped: usize,
}
