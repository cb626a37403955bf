//! FleetLock protocol client.
//!
//! # Design
//! `FleetLockClient` holds only validated configuration and carries no
//! mutable state between calls. Each operation is a `build_request` step
//! producing an `HttpRequest`, a round trip through the configured
//! `Transport`, and `parse_response` classifying the `HttpResponse`. The build
//! and parse steps are public so they can be exercised without any I/O.

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::{Config, DEFAULT_GROUP};
use crate::error::{ClientError, ConfigError, TransportError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{Payload, ServerError};

/// Header marking a request as speaking the FleetLock protocol.
pub const PROTOCOL_HEADER: &str = "fleet-lock-protocol";

/// Protocol endpoints, relative to the server's base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Acquire a reboot slot.
    PreReboot,
    /// Release a reboot slot once the instance is healthy again.
    SteadyState,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::PreReboot => "v1/pre-reboot",
            Endpoint::SteadyState => "v1/steady-state",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Clone)]
pub struct FleetLockClient {
    base_url: String,
    group: String,
    id: String,
    transport: Arc<dyn Transport>,
}

impl FleetLockClient {
    /// Validate `config` and fill in defaults. Performs no I/O.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        let Config {
            url,
            group,
            id,
            transport,
        } = config;

        if id.is_empty() {
            return Err(ConfigError::MissingId);
        }
        if url.is_empty() {
            return Err(ConfigError::MissingUrl);
        }
        if let Err(reason) = url::Url::parse(&url) {
            return Err(ConfigError::InvalidUrl { url, reason });
        }

        let group = if group.is_empty() {
            DEFAULT_GROUP.to_string()
        } else {
            group
        };
        let transport =
            transport.unwrap_or_else(|| Arc::new(ReqwestTransport::new()) as Arc<dyn Transport>);

        Ok(Self {
            base_url: url.trim_end_matches('/').to_string(),
            group,
            id,
            transport,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Try to reserve (lock) a slot for rebooting.
    ///
    /// A server refusal, e.g. because the group has no free slot, is returned
    /// as an error; waiting and retrying is up to the caller.
    pub async fn recursive_lock(&self, cancel: &CancellationToken) -> Result<(), ClientError> {
        self.call(Endpoint::PreReboot, cancel).await
    }

    /// Try to release (unlock) a slot previously held by this instance.
    ///
    /// Calling it without holding a slot is a valid request; the server
    /// decides the outcome.
    pub async fn unlock_if_held(&self, cancel: &CancellationToken) -> Result<(), ClientError> {
        self.call(Endpoint::SteadyState, cancel).await
    }

    pub fn build_request(&self, endpoint: Endpoint) -> Result<HttpRequest, ClientError> {
        let payload = Payload::new(self.id.as_str(), self.group.as_str());
        let body = serde_json::to_string(&payload).map_err(ClientError::Encode)?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: format!("{}/{}", self.base_url, endpoint.path()),
            headers: vec![(PROTOCOL_HEADER.to_string(), "true".to_string())],
            body: Some(body),
        })
    }

    async fn call(&self, endpoint: Endpoint, cancel: &CancellationToken) -> Result<(), ClientError> {
        let request = self.build_request(endpoint)?;
        tracing::debug!(
            %endpoint,
            url = %request.url,
            group = %self.group,
            id = %self.id,
            "sending fleetlock request"
        );

        // Cancellation is polled first so an already-cancelled token never
        // reaches the transport. Losing the race drops the in-flight send.
        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::debug!(%endpoint, "fleetlock request cancelled");
                return Err(TransportError::Cancelled.into());
            }
            result = self.transport.send(request) => result?,
        };

        tracing::debug!(%endpoint, status = response.status, "fleetlock response received");
        parse_response(response)
    }
}

impl fmt::Debug for FleetLockClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FleetLockClient")
            .field("base_url", &self.base_url)
            .field("group", &self.group)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Classify a response by status code.
///
/// 2xx succeeds whatever the body. 3xx to 5xx must carry a `ServerError`
/// envelope. Every other code is unexpected.
pub fn parse_response(response: HttpResponse) -> Result<(), ClientError> {
    match response.status {
        200..=299 => Ok(()),
        300..=599 => {
            let err: ServerError =
                serde_json::from_slice(&response.body).map_err(ClientError::Decode)?;
            tracing::warn!(
                status = response.status,
                kind = %err.kind,
                value = %err.value,
                "fleetlock server returned an error"
            );
            Err(ClientError::Server(err))
        }
        status => Err(ClientError::UnexpectedStatus(status)),
    }
}
