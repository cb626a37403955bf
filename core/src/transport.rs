//! The send-one-request capability the client depends on.
//!
//! # Design
//! `Transport` is the only seam between the protocol logic and the network.
//! The default `ReqwestTransport` speaks real HTTP; decorators such as
//! [`BasicAuthTransport`](crate::BasicAuthTransport) wrap another transport,
//! and tests substitute recording doubles. Implementations shared between
//! concurrent calls must be `Send + Sync`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request and return its response with the body fully read.
    ///
    /// Any status code counts as a response; only failures to obtain one are
    /// errors. Dropping the returned future must abort the request.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request).await
    }
}

/// HTTP transport backed by a pooled `reqwest::Client`.
///
/// Imposes no timeout of its own; configure one on the inner client with
/// [`ReqwestTransport::with_client`] if needed.
///
/// The default client follows redirects, so a 3xx carrying a `Location`
/// header is never seen by the response interpreter. Use
/// [`ReqwestTransport::without_redirects`] to hand every 3xx back as is.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// A transport whose client never follows redirects.
    pub fn without_redirects() -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self::with_client(client))
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let method = match request.method {
            HttpMethod::Post => reqwest::Method::POST,
        };

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| {
                v.to_str()
                    .ok()
                    .map(|v| (k.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await?.to_vec();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
