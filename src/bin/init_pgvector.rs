// Lambda bootstrap for the pgvector initializer
use std::sync::Arc;

use ingest_handlers::core::config::DbInitConfig;
use ingest_handlers::core::secrets::AwsSecretStore;
use ingest_handlers::db_init::{self, DbInitDeps, PostgresConnector};
use lambda_runtime::{Error, LambdaEvent, run, service_fn};
use serde_json::Value;
use tracing::error;

#[tokio::main]
async fn main() -> Result<(), Error> {
    ingest_handlers::setup_logging();

    let config = DbInitConfig::from_env().inspect_err(|e| error!("Config error: {}", e))?;
    let shared_config = aws_config::from_env().load().await;

    let deps = Arc::new(DbInitDeps {
        secrets: AwsSecretStore::new(&shared_config),
        connector: PostgresConnector::new()?,
        config,
    });

    run(service_fn(move |event: LambdaEvent<Value>| {
        let deps = Arc::clone(&deps);
        async move { db_init::handler(&deps, event).await }
    }))
    .await
}
