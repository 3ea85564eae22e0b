use async_trait::async_trait;
use aws_sdk_secretsmanager::Client as SecretsManagerClient;
use aws_sdk_secretsmanager::error::DisplayErrorContext;
use aws_sdk_ssm::Client as SsmClient;
use tracing::info;

use crate::errors::IngestError;

/// Lookup of opaque secret strings by identifier.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// # Errors
    ///
    /// Returns `IngestError::SecretError` if the secret cannot be read or has
    /// no string value.
    async fn get_secret(&self, secret_id: &str) -> Result<String, IngestError>;
}

/// Secrets Manager and SSM Parameter Store behind one lookup.
///
/// SSM parameter ARNs and `/`-prefixed parameter paths are read from Parameter
/// Store with decryption; any other identifier is treated as a Secrets Manager
/// secret id or ARN.
#[derive(Clone)]
pub struct AwsSecretStore {
    secrets_manager: SecretsManagerClient,
    ssm: SsmClient,
}

impl AwsSecretStore {
    pub fn new(shared_config: &aws_config::SdkConfig) -> Self {
        Self {
            secrets_manager: SecretsManagerClient::new(shared_config),
            ssm: SsmClient::new(shared_config),
        }
    }

    async fn get_parameter(&self, name: &str) -> Result<String, IngestError> {
        let resp = self
            .ssm
            .get_parameter()
            .name(name)
            .with_decryption(true)
            .send()
            .await
            .map_err(|e| {
                IngestError::SecretError(format!(
                    "ssm get_parameter {name}: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        resp.parameter()
            .and_then(|p| p.value())
            .map(str::to_string)
            .ok_or_else(|| IngestError::SecretError(format!("ssm parameter {name} has no value")))
    }

    async fn get_secret_value(&self, secret_id: &str) -> Result<String, IngestError> {
        let resp = self
            .secrets_manager
            .get_secret_value()
            .secret_id(secret_id)
            .send()
            .await
            .map_err(|e| {
                IngestError::SecretError(format!(
                    "secretsmanager get_secret_value {secret_id}: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        resp.secret_string()
            .map(str::to_string)
            .ok_or_else(|| IngestError::SecretError(format!("secret {secret_id} has no SecretString")))
    }
}

#[async_trait]
impl SecretStore for AwsSecretStore {
    async fn get_secret(&self, secret_id: &str) -> Result<String, IngestError> {
        if is_ssm_parameter(secret_id) {
            info!(secret_id, "Fetching secret from SSM Parameter Store");
            self.get_parameter(secret_id).await
        } else {
            info!(secret_id, "Fetching secret from Secrets Manager");
            self.get_secret_value(secret_id).await
        }
    }
}

pub fn is_ssm_parameter(secret_id: &str) -> bool {
    secret_id.starts_with('/') || secret_id.starts_with("arn:aws:ssm:")
}
