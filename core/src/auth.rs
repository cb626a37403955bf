//! HTTP Basic authentication as a transport decorator.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;

const AUTHORIZATION: &str = "authorization";

/// Forwards every request to `inner`, adding Basic credentials to requests
/// that do not already carry an `Authorization` header.
///
/// Decorators nest: the outermost one that sets credentials wins, since
/// inner ones see the header already present.
#[derive(Clone)]
pub struct BasicAuthTransport<T> {
    username: String,
    password: String,
    inner: T,
}

impl<T> BasicAuthTransport<T> {
    pub fn new(username: impl Into<String>, password: impl Into<String>, inner: T) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            inner,
        }
    }

    /// The request as it will be forwarded. `request` itself is left untouched.
    pub fn authorize(&self, request: &HttpRequest) -> HttpRequest {
        let mut forwarded = request.clone();
        if request.header(AUTHORIZATION).is_none() {
            let credentials = STANDARD.encode(format!("{}:{}", self.username, self.password));
            forwarded.set_header(AUTHORIZATION, format!("Basic {credentials}"));
        }
        forwarded
    }
}

impl<T> std::fmt::Debug for BasicAuthTransport<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuthTransport")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<T: Transport> Transport for BasicAuthTransport<T> {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        if request.header(AUTHORIZATION).is_some() {
            tracing::debug!(url = %request.url, "authorization already set, forwarding as is");
            return self.inner.send(request).await;
        }
        tracing::debug!(url = %request.url, username = %self.username, "injecting basic auth");
        let authorized = self.authorize(&request);
        self.inner.send(authorized).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::http::HttpMethod;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<HttpRequest>>,
    }

    #[async_trait]
    impl Transport for Recorder {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.seen.lock().unwrap().push(request);
            Ok(HttpResponse::new(200, ""))
        }
    }

    fn request() -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Post,
            url: "http://1.2.3.4/v1/pre-reboot".to_string(),
            headers: vec![("fleet-lock-protocol".to_string(), "true".to_string())],
            body: Some("{}".to_string()),
        }
    }

    #[tokio::test]
    async fn injects_credentials_when_missing() {
        let recorder = Arc::new(Recorder::default());
        let transport = BasicAuthTransport::new("flatcar", "p4ssw0rd", recorder.clone());

        transport.send(request()).await.unwrap();

        let seen = recorder.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        // base64("flatcar:p4ssw0rd")
        assert_eq!(
            seen[0].header("Authorization"),
            Some("Basic ZmxhdGNhcjpwNHNzdzByZA==")
        );
        assert_eq!(seen[0].header("fleet-lock-protocol"), Some("true"));
        assert_eq!(seen[0].body.as_deref(), Some("{}"));
    }

    #[tokio::test]
    async fn keeps_existing_authorization_untouched() {
        let recorder = Arc::new(Recorder::default());
        let transport = BasicAuthTransport::new("flatcar", "p4ssw0rd", recorder.clone());
        let mut req = request();
        req.set_header("Authorization", "Bearer token");

        transport.send(req.clone()).await.unwrap();

        let seen = recorder.seen.lock().unwrap();
        assert_eq!(seen[0], req);
    }

    #[test]
    fn authorize_does_not_mutate_original() {
        let transport = BasicAuthTransport::new("user", "pass", Recorder::default());
        let original = request();

        let forwarded = transport.authorize(&original);

        assert_eq!(original, request());
        assert!(original.header("authorization").is_none());
        assert_eq!(forwarded.header("authorization"), Some("Basic dXNlcjpwYXNz"));
    }

    #[tokio::test]
    async fn outer_decorator_wins_when_chained() {
        let recorder = Arc::new(Recorder::default());
        let inner = BasicAuthTransport::new("inner", "secret", recorder.clone());
        let outer = BasicAuthTransport::new("user", "pass", inner);

        outer.send(request()).await.unwrap();

        let seen = recorder.seen.lock().unwrap();
        assert_eq!(seen[0].header("authorization"), Some("Basic dXNlcjpwYXNz"));
        assert_eq!(
            seen[0]
                .headers
                .iter()
                .filter(|(k, _)| k.eq_ignore_ascii_case("authorization"))
                .count(),
            1
        );
    }

    #[test]
    fn debug_output_hides_password() {
        let transport = BasicAuthTransport::new("user", "hunter2", Recorder::default());
        let rendered = format!("{transport:?}");
        assert!(rendered.contains("user"));
        assert!(!rendered.contains("hunter2"));
    }
}
