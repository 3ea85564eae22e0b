use std::time::Duration;

use async_trait::async_trait;
use openssl::ssl::{SslConnector, SslMethod, SslVerifyMode};
use postgres_openssl::MakeTlsConnector;
use tokio::task::JoinHandle;
use tokio_postgres::Client;
use tokio_postgres::config::{Config, SslMode};
use tracing::{error, info};

use crate::errors::IngestError;

/// Standard connect parameters for one short-lived session.
#[derive(Clone)]
pub struct ConnectParams {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub connect_timeout: Duration,
}

impl std::fmt::Debug for ConnectParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

/// An open database session.
#[async_trait]
pub trait SchemaSession: Send {
    /// Runs `statement` in its own transaction and commits it.
    async fn execute_committed(&mut self, statement: &str) -> Result<(), IngestError>;

    /// Ends the session cleanly. Dropping without closing still releases the
    /// connection, just without waiting for it.
    async fn close(self: Box<Self>);
}

#[async_trait]
pub trait SchemaConnector: Send + Sync {
    async fn connect(&self, params: &ConnectParams)
    -> Result<Box<dyn SchemaSession>, IngestError>;
}

/// `tokio-postgres` connector with opportunistic TLS, like libpq's
/// `sslmode=prefer`: encrypted when the server offers it, certificate not
/// verified.
#[derive(Clone)]
pub struct PostgresConnector {
    tls: MakeTlsConnector,
}

impl PostgresConnector {
    /// # Errors
    ///
    /// Returns an error if the OpenSSL context cannot be created.
    pub fn new() -> Result<Self, IngestError> {
        let mut builder = SslConnector::builder(SslMethod::tls())
            .map_err(|e| IngestError::DatabaseError(format!("tls setup: {e}")))?;
        builder.set_verify(SslVerifyMode::NONE);
        Ok(Self {
            tls: MakeTlsConnector::new(builder.build()),
        })
    }
}

#[async_trait]
impl SchemaConnector for PostgresConnector {
    async fn connect(
        &self,
        params: &ConnectParams,
    ) -> Result<Box<dyn SchemaSession>, IngestError> {
        let mut config = Config::new();
        config
            .host(&params.host)
            .port(params.port)
            .dbname(&params.database)
            .user(&params.user)
            .password(&params.password)
            .connect_timeout(params.connect_timeout)
            .ssl_mode(SslMode::Prefer);

        info!(
            host = %params.host,
            port = params.port,
            database = %params.database,
            "Connecting to PostgreSQL"
        );

        let (client, connection) =
            tokio::time::timeout(params.connect_timeout, config.connect(self.tls.clone()))
                .await
                .map_err(|_| {
                    IngestError::DatabaseError(format!(
                        "connect to {}:{} timed out after {:?}",
                        params.host, params.port, params.connect_timeout
                    ))
                })??;

        let driver = tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("PostgreSQL connection error: {}", e);
            }
        });

        Ok(Box::new(PostgresSession {
            client: Some(client),
            driver: Some(driver),
        }))
    }
}

/// How long `close` waits for the server to acknowledge termination.
const CLOSE_GRACE: Duration = Duration::from_secs(5);

struct PostgresSession {
    client: Option<Client>,
    driver: Option<JoinHandle<()>>,
}

#[async_trait]
impl SchemaSession for PostgresSession {
    async fn execute_committed(&mut self, statement: &str) -> Result<(), IngestError> {
        let client = self
            .client
            .as_mut()
            .ok_or_else(|| IngestError::DatabaseError("session already closed".to_string()))?;
        let tx = client.transaction().await?;
        tx.batch_execute(statement).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn close(self: Box<Self>) {
        let mut session = self;
        // dropping the client sends Terminate; the driver then runs to completion
        drop(session.client.take());
        if let Some(mut driver) = session.driver.take() {
            if tokio::time::timeout(CLOSE_GRACE, &mut driver).await.is_err() {
                error!("PostgreSQL connection did not shut down in time; aborting");
                driver.abort();
            }
        }
    }
}

impl Drop for PostgresSession {
    fn drop(&mut self) {
        // client goes first so the detached driver can finish the Terminate
        // handshake on its own
        drop(self.client.take());
    }
}
