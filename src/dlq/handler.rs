use aws_lambda_events::event::sqs::{SqsEvent, SqsMessage};
use lambda_runtime::{Error, LambdaEvent};
use tracing::{Instrument, error, info, info_span, warn};

use crate::core::config::DlqConfig;
use crate::core::models::{ApiCredentials, BatchSummary, PayloadSource};
use crate::core::secrets::SecretStore;
use crate::errors::{IngestError, SkipReason};
use crate::truncate_chars;

use super::classify::classify_body;
use super::reporter::StatusReporter;

pub const LOGGED_BODY_CHARS: usize = 200;

/// Clients and settings that live for the whole process.
pub struct DlqDeps<S, R> {
    pub config: DlqConfig,
    pub secrets: S,
    pub reporter: R,
}

/// Lambda entry point for the status DLQ.
pub async fn function_handler<S, R>(
    deps: &DlqDeps<S, R>,
    event: LambdaEvent<SqsEvent>,
) -> Result<BatchSummary, Error>
where
    S: SecretStore,
    R: StatusReporter,
{
    let span = info_span!("status_dlq", aws_request_id = %event.context.request_id);
    process_batch(
        &deps.config,
        &deps.secrets,
        &deps.reporter,
        &event.payload.records,
    )
    .instrument(span)
    .await
    .map_err(Error::from)
}

/// Reports a failure status for every classifiable record, in order.
///
/// Records that cannot be classified are logged and skipped. A failed report
/// aborts the batch: the remaining records are left for redelivery.
///
/// # Errors
///
/// Secret retrieval failures and any reporting failure.
pub async fn process_batch(
    config: &DlqConfig,
    secrets: &dyn SecretStore,
    reporter: &dyn StatusReporter,
    records: &[SqsMessage],
) -> Result<BatchSummary, IngestError> {
    info!(
        record_count = records.len(),
        "Status DLQ Lambda invocation received"
    );

    let mut summary = BatchSummary {
        received: records.len(),
        ..BatchSummary::default()
    };

    if records.is_empty() {
        info!("No records in event; nothing to process");
        return Ok(summary);
    }

    let credentials = fetch_credentials(config, secrets).await?;

    for record in records {
        let message_id = record.message_id.as_deref().unwrap_or_default();
        let body = record.body.as_deref().unwrap_or_default();

        let reported = process_record(body, &credentials, reporter)
            .instrument(info_span!("dlq_record", message_id))
            .await?;

        if reported {
            summary.reported += 1;
        } else {
            summary.skipped += 1;
        }
    }

    info!(
        received = summary.received,
        reported = summary.reported,
        skipped = summary.skipped,
        "Status DLQ batch complete"
    );
    Ok(summary)
}

/// Returns `Ok(false)` when the record was skipped.
async fn process_record(
    body: &str,
    credentials: &ApiCredentials,
    reporter: &dyn StatusReporter,
) -> Result<bool, IngestError> {
    let update = match classify_body(body) {
        Ok(update) => update,
        Err(reason) => {
            log_skip(&reason, body);
            return Ok(false);
        }
    };

    let kind = match update.source {
        PayloadSource::EcsTaskStateChange => "Handling ECS Task failure event",
        PayloadSource::RunTask => "Handling RunTask DLQ message",
    };
    info!(
        document_id = %update.document_id,
        key = %update.object_key,
        event_type = %update.event_type,
        status = %update.status,
        "{kind}"
    );

    reporter.report(&update, credentials).await?;
    Ok(true)
}

fn log_skip(reason: &SkipReason, body: &str) {
    match reason {
        SkipReason::InvalidJson(_) => error!(
            reason = %reason,
            raw_body = %truncate_chars(body, LOGGED_BODY_CHARS),
            "Bad JSON body in SQS message; skipping"
        ),
        SkipReason::UnrecognizedShape { detail_type, keys } => error!(
            payload_keys = ?keys,
            detail_type = ?detail_type,
            "Unrecognized payload shape; skipping"
        ),
        _ => error!(reason = %reason, "Unusable DLQ message; skipping"),
    }
}

async fn fetch_credentials(
    config: &DlqConfig,
    secrets: &dyn SecretStore,
) -> Result<ApiCredentials, IngestError> {
    let api_token = secrets
        .get_secret(&config.ingestion_token_id)
        .await
        .inspect_err(|e| error!(error = %e, "Aborting batch: could not fetch ingestion token"))?;
    info!("Successfully fetched ingestion API token");

    let origin_verify = match config.origin_verify_id.as_deref() {
        Some(id) => {
            let secret = secrets.get_secret(id).await.inspect_err(|e| {
                error!(error = %e, "Aborting batch: could not fetch Origin Verify Secret")
            })?;
            info!("Successfully fetched Origin Verify Secret");
            Some(secret)
        }
        None => {
            warn!("ORIGIN_VERIFY_ARN not set; sending requests without X-Origin-Verify");
            None
        }
    };

    Ok(ApiCredentials {
        api_token,
        origin_verify,
    })
}
