//! Turns a raw DLQ message body into a [`StatusUpdate`] or a [`SkipReason`].
//!
//! Nothing in here performs I/O; every failure is a per-record skip.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::core::models::{
    ContainerOverride, DocumentStatus, ECS_TASK_STATE_CHANGE, EVENT_TYPE_VAR, OBJECT_KEY_VAR,
    PayloadSource, StatusUpdate,
};
use crate::errors::SkipReason;

/// Parses and classifies one message body.
pub fn classify_body(body: &str) -> Result<StatusUpdate, SkipReason> {
    let payload: Value =
        serde_json::from_str(body).map_err(|e| SkipReason::InvalidJson(e.to_string()))?;
    classify_payload(&payload)
}

/// Classifies an already-decoded payload.
///
/// ECS task-state-change events carry their overrides under
/// `detail.overrides.containerOverrides`; direct `RunTask` payloads carry
/// `containerOverrides` at the top level.
pub fn classify_payload(payload: &Value) -> Result<StatusUpdate, SkipReason> {
    let detail_type = payload.get("detail-type").and_then(Value::as_str);

    let (source, overrides) = if detail_type == Some(ECS_TASK_STATE_CHANGE) {
        (
            PayloadSource::EcsTaskStateChange,
            payload.pointer("/detail/overrides/containerOverrides"),
        )
    } else if let Some(overrides) = payload.get("containerOverrides") {
        (PayloadSource::RunTask, Some(overrides))
    } else {
        return Err(SkipReason::UnrecognizedShape {
            detail_type: detail_type.map(str::to_string),
            keys: payload
                .as_object()
                .map(|o| o.keys().cloned().collect())
                .unwrap_or_default(),
        });
    };

    let overrides = overrides
        .and_then(|v| Vec::<ContainerOverride>::deserialize(v).ok())
        .unwrap_or_default();

    let (object_key, event_type) =
        key_and_event_type(&overrides).ok_or(SkipReason::MissingFields)?;

    let status = DocumentStatus::from_event_type(&event_type)
        .ok_or_else(|| SkipReason::UnknownEventType(event_type.clone()))?;

    let document_id = document_id_from_key(&object_key)
        .ok_or_else(|| SkipReason::InvalidObjectKey(object_key.clone()))?;

    Ok(StatusUpdate {
        document_id,
        object_key,
        event_type,
        status,
        source,
    })
}

/// Returns `S3_OBJECT_KEY` and `EVENT_TYPE` from the first override that
/// carries both as non-empty values.
pub fn key_and_event_type(overrides: &[ContainerOverride]) -> Option<(String, String)> {
    overrides.iter().find_map(|o| {
        // later duplicates win
        let env: HashMap<&str, &str> = o
            .environment
            .iter()
            .filter_map(|var| Some((var.name.as_deref()?, var.value.as_deref()?)))
            .collect();

        let key = env.get(OBJECT_KEY_VAR).filter(|v| !v.is_empty())?;
        let event_type = env.get(EVENT_TYPE_VAR).filter(|v| !v.is_empty())?;
        Some(((*key).to_string(), (*event_type).to_string()))
    })
}

/// The document id is the object key's file name without its extension:
/// `documents/abc123.pdf` becomes `abc123`.
pub fn document_id_from_key(object_key: &str) -> Option<String> {
    Path::new(object_key)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
}
