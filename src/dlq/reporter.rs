use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::redirect::Policy;
use tracing::{error, info};

use crate::core::config::DlqConfig;
use crate::core::models::{ApiCredentials, StatusPatchBody, StatusUpdate};
use crate::errors::IngestError;
use crate::truncate_chars;

pub const API_TOKEN_HEADER: &str = "x-api-token";
pub const ORIGIN_VERIFY_HEADER: &str = "x-origin-verify";
pub const LOGGED_RESPONSE_CHARS: usize = 500;

/// Pushes a document status change to the management API.
#[async_trait]
pub trait StatusReporter: Send + Sync {
    /// # Errors
    ///
    /// Any transport failure or non-success response. Callers must let this
    /// propagate so the invocation fails and the queue redelivers.
    async fn report(
        &self,
        update: &StatusUpdate,
        credentials: &ApiCredentials,
    ) -> Result<(), IngestError>;
}

/// `PATCH {base_url}{docs_api_path}/{document_id}` over `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpStatusReporter {
    client: HttpClient,
    base_url: String,
    docs_api_path: String,
}

impl HttpStatusReporter {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        docs_api_path: &str,
        timeout: Duration,
    ) -> Result<Self, IngestError> {
        // a redirected PATCH is a failed report, not something to follow
        let client = HttpClient::builder()
            .timeout(timeout)
            .redirect(Policy::none())
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            docs_api_path: docs_api_path.to_string(),
        })
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &DlqConfig) -> Result<Self, IngestError> {
        Self::new(
            &config.alb_base_url,
            &config.docs_api_path,
            config.http_timeout,
        )
    }

    pub fn document_url(&self, document_id: &str) -> String {
        format!(
            "{}{}/{}",
            self.base_url,
            self.docs_api_path,
            urlencoding::encode(document_id)
        )
    }

    fn headers(credentials: &ApiCredentials) -> Result<HeaderMap, IngestError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            HeaderName::from_static(API_TOKEN_HEADER),
            secret_header_value(&credentials.api_token)?,
        );
        if let Some(origin) = credentials.origin_verify.as_deref() {
            headers.insert(
                HeaderName::from_static(ORIGIN_VERIFY_HEADER),
                secret_header_value(origin)?,
            );
        }
        Ok(headers)
    }
}

fn secret_header_value(value: &str) -> Result<HeaderValue, IngestError> {
    let mut header = HeaderValue::from_str(value).map_err(|_| {
        IngestError::ConfigError("secret contains characters not allowed in a header".to_string())
    })?;
    header.set_sensitive(true);
    Ok(header)
}

#[async_trait]
impl StatusReporter for HttpStatusReporter {
    async fn report(
        &self,
        update: &StatusUpdate,
        credentials: &ApiCredentials,
    ) -> Result<(), IngestError> {
        let url = self.document_url(&update.document_id);
        info!(
            document_id = %update.document_id,
            status = %update.status,
            url = %url,
            "Patching document status via management-api"
        );

        let resp = self
            .client
            .patch(&url)
            .headers(Self::headers(credentials)?)
            .json(&StatusPatchBody {
                status: update.status,
            })
            .send()
            .await
            .map_err(|e| {
                error!(
                    document_id = %update.document_id,
                    status = %update.status,
                    reason = %e,
                    "Transport error while patching document status"
                );
                IngestError::from(e)
            })?;

        let http_status = resp.status();
        let body = resp
            .text()
            .await
            .unwrap_or_else(|_| "<failed to read body>".to_string());
        let body = truncate_chars(&body, LOGGED_RESPONSE_CHARS).to_string();

        if !http_status.is_success() {
            error!(
                document_id = %update.document_id,
                status = %update.status,
                http_status = http_status.as_u16(),
                response_body = %body,
                "Management API rejected document status patch"
            );
            return Err(IngestError::ApiError {
                status: http_status.as_u16(),
                body,
            });
        }

        info!(
            document_id = %update.document_id,
            status = %update.status,
            http_status = http_status.as_u16(),
            response_body = %body,
            "Patch status response"
        );
        Ok(())
    }
}
