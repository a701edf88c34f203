//! Transport seam between the fetch client and the Overpass endpoint

use std::future::Future;

use log::{debug, trace, warn};

use super::error::FetchError;
use crate::Error;
use crate::loading::FetchConfig;

/// Sends an Overpass QL query and returns the raw response body.
///
/// Implementations classify failures into [`FetchError`] variants so the
/// client can tell transient from fatal errors.
pub trait OverpassTransport: Send + Sync {
    fn post_query(&self, query: &str) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send;
}

/// HTTP transport using reqwest: POST with a URL-encoded `data=` body
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl ReqwestTransport {
    pub fn new(config: &FetchConfig) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| Error::InvalidConfig(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn classify(error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout(error.to_string())
    } else if let Some(status) = error.status() {
        FetchError::Status {
            status: status.as_u16(),
        }
    } else if error.is_decode() {
        FetchError::Malformed(error.to_string())
    } else {
        FetchError::Network(error.to_string())
    }
}

impl OverpassTransport for ReqwestTransport {
    async fn post_query(&self, query: &str) -> Result<Vec<u8>, FetchError> {
        trace!("POST {} ({} byte query)", self.endpoint, query.len());

        let response = self
            .client
            .post(&self.endpoint)
            .form(&[("data", query)])
            .send()
            .await
            .map_err(|e| {
                debug!("Request to {} failed: {}", self.endpoint, e);
                classify(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("HTTP {} from {}", status, self.endpoint);
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(classify)?;
        debug!("Received {} bytes from {}", body.len(), self.endpoint);
        Ok(body.to_vec())
    }
}
