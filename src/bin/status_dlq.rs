// Lambda bootstrap for the status DLQ consumer
use std::sync::Arc;

use aws_lambda_events::event::sqs::SqsEvent;
use ingest_handlers::core::config::DlqConfig;
use ingest_handlers::core::secrets::AwsSecretStore;
use ingest_handlers::dlq::{self, DlqDeps, HttpStatusReporter};
use lambda_runtime::{Error, LambdaEvent, run, service_fn};
use tracing::error;

#[tokio::main]
async fn main() -> Result<(), Error> {
    ingest_handlers::setup_logging();

    let config = DlqConfig::from_env().inspect_err(|e| error!("Config error: {}", e))?;
    let shared_config = aws_config::from_env().load().await;

    let deps = Arc::new(DlqDeps {
        secrets: AwsSecretStore::new(&shared_config),
        reporter: HttpStatusReporter::from_config(&config)?,
        config,
    });

    run(service_fn(move |event: LambdaEvent<SqsEvent>| {
        let deps = Arc::clone(&deps);
        async move { dlq::handler(&deps, event).await }
    }))
    .await
}
