use lambda_runtime::{Error, LambdaEvent};
use serde_json::{Value, json};
use tracing::{Instrument, error, info, info_span};

use crate::core::config::DbInitConfig;
use crate::core::secrets::SecretStore;
use crate::errors::IngestError;

use super::postgres::{ConnectParams, SchemaConnector};

pub const VECTOR_EXTENSION: &str = "vector";

pub fn create_extension_sql(extension: &str) -> String {
    format!("CREATE EXTENSION IF NOT EXISTS {extension};")
}

pub struct DbInitDeps<S, C> {
    pub config: DbInitConfig,
    pub secrets: S,
    pub connector: C,
}

/// Lambda entry point for the pgvector initializer. The event payload is
/// ignored.
pub async fn function_handler<S, C>(
    deps: &DbInitDeps<S, C>,
    event: LambdaEvent<Value>,
) -> Result<Value, Error>
where
    S: SecretStore,
    C: SchemaConnector,
{
    let span = info_span!("init_pgvector", aws_request_id = %event.context.request_id);
    let extension = ensure_vector_extension(&deps.config, &deps.secrets, &deps.connector)
        .instrument(span)
        .await?;
    Ok(json!({ "extension": extension, "status": "ok" }))
}

/// Makes sure the `vector` extension exists in the configured database.
///
/// Safe to call repeatedly. The session is closed whether or not the
/// statement succeeds.
///
/// # Errors
///
/// Secret retrieval, connection and statement failures.
pub async fn ensure_vector_extension(
    config: &DbInitConfig,
    secrets: &dyn SecretStore,
    connector: &dyn SchemaConnector,
) -> Result<String, IngestError> {
    let password = secrets
        .get_secret(&config.password_secret_id)
        .await
        .inspect_err(|e| error!(error = %e, "Failed to fetch database password"))?;

    let params = ConnectParams {
        host: config.endpoint.clone(),
        port: config.port,
        database: config.database.clone(),
        user: config.user.clone(),
        password,
        connect_timeout: config.connect_timeout,
    };

    let mut session = connector
        .connect(&params)
        .await
        .inspect_err(|e| error!(error = %e, "Failed to connect to database"))?;

    let result = session
        .execute_committed(&create_extension_sql(VECTOR_EXTENSION))
        .await;
    session.close().await;

    result.inspect_err(|e| error!(error = %e, "Failed to create extension"))?;
    info!(extension = VECTOR_EXTENSION, database = %config.database, "Extension is installed");
    Ok(VECTOR_EXTENSION.to_string())
}
