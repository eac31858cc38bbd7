//! Esplora HTTP backend.
//!
//! Talks to a Blockstream-compatible Esplora REST API:
//!
//! | Call | Endpoint |
//! |------|----------|
//! | submit | `POST /tx` (hex body, txid response) |
//! | tx_status | `GET /tx/{id}/status` |
//! | tip_height | `GET /blocks/tip/height` |

use crate::algorithms::{classify_error, ErrorClass};
use crate::domain::{BackendError, TxId};
use crate::ports::{BackendTxStatus, ChainBackend};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use shared_types::ChainId;
use std::time::Duration;
use tracing::{debug, info};

/// Esplora REST client.
#[derive(Debug, Clone)]
pub struct EsploraBackend {
    client: Client,
    base_url: String,
    chain: ChainId,
}

impl EsploraBackend {
    /// Per-request timeout used by `new`.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a client for `base_url` (e.g. `https://blockstream.info/api`).
    pub fn new(base_url: impl Into<String>, chain: ChainId) -> Result<Self, BackendError> {
        Self::with_timeout(base_url, chain, Self::DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom request timeout.
    pub fn with_timeout(
        base_url: impl Into<String>,
        chain: ChainId,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Malformed(format!("http client: {e}")))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        info!(base_url = %base_url, chain = %chain, "Esplora backend configured");
        Ok(Self {
            client,
            base_url,
            chain,
        })
    }

    /// Base URL without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn read_body(response: reqwest::Response) -> Result<String, BackendError> {
        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(http_error(status, &body))
        }
    }
}

#[async_trait]
impl ChainBackend for EsploraBackend {
    fn chain(&self) -> ChainId {
        self.chain
    }

    async fn submit(&self, raw: &[u8]) -> Result<TxId, BackendError> {
        let response = self
            .client
            .post(self.url("tx"))
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(hex::encode(raw))
            .send()
            .await
            .map_err(transport_error)?;
        let body = Self::read_body(response).await?;
        let id = parse_txid(&body)?;
        debug!(tx_id = %id, "Esplora accepted transaction");
        Ok(id)
    }

    async fn tx_status(&self, id: &TxId) -> Result<BackendTxStatus, BackendError> {
        let response = self
            .client
            .get(self.url(&format!("tx/{}/status", id.as_str())))
            .send()
            .await
            .map_err(transport_error)?;
        let body = Self::read_body(response).await?;
        serde_json::from_str(&body).map_err(|e| BackendError::Malformed(e.to_string()))
    }

    async fn tip_height(&self) -> Result<u64, BackendError> {
        let response = self
            .client
            .get(self.url("blocks/tip/height"))
            .send()
            .await
            .map_err(transport_error)?;
        let body = Self::read_body(response).await?;
        parse_height(&body)
    }
}

/// Map a request that never got a response.
fn transport_error(error: reqwest::Error) -> BackendError {
    if error.is_timeout() || error.is_connect() || error.is_request() {
        return BackendError::Transient(error.to_string());
    }
    match classify_error(&error.to_string()) {
        ErrorClass::Transient | ErrorClass::Unknown => BackendError::Transient(error.to_string()),
        ErrorClass::Permanent => BackendError::Rejected(error.to_string()),
    }
}

/// Map a non-success HTTP response.
fn http_error(status: StatusCode, body: &str) -> BackendError {
    let message = format!("HTTP {}: {}", status.as_u16(), body.trim());
    if status == StatusCode::NOT_FOUND {
        return BackendError::NotFound;
    }
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        return BackendError::Transient(message);
    }
    match classify_error(body) {
        ErrorClass::Transient => BackendError::Transient(message),
        ErrorClass::Permanent | ErrorClass::Unknown => BackendError::Rejected(message),
    }
}

fn parse_txid(body: &str) -> Result<TxId, BackendError> {
    let id = body.trim();
    if id.len() != 64 || !id.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(BackendError::Malformed(format!("unexpected txid: {id}")));
    }
    Ok(TxId::new(id.to_ascii_lowercase()))
}

fn parse_height(body: &str) -> Result<u64, BackendError> {
    body.trim()
        .parse()
        .map_err(|_| BackendError::Malformed(format!("unexpected height: {}", body.trim())))
}
