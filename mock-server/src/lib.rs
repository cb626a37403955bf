use std::{sync::Arc, time::Duration};

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};

pub const PROTOCOL_HEADER: &str = "fleet-lock-protocol";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Params {
    pub id: String,
    pub group: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Payload {
    pub client_params: Params,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub kind: String,
    pub value: String,
}

/// A request that passed the protocol checks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedRequest {
    pub path: String,
    pub payload: Payload,
    pub authorization: Option<String>,
}

/// What the server answers to every valid request.
#[derive(Clone, Debug)]
pub struct Reply {
    pub status: u16,
    pub body: String,
    pub delay: Option<Duration>,
    /// Sent as the `Location` header, for redirect replies.
    pub location: Option<String>,
}

impl Default for Reply {
    fn default() -> Self {
        Self::raw(200, "")
    }
}

impl Reply {
    pub fn raw(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            delay: None,
            location: None,
        }
    }

    pub fn error(status: u16, kind: &str, value: &str) -> Self {
        let body = ErrorBody {
            kind: kind.to_string(),
            value: value.to_string(),
        };
        Self::raw(status, serde_json::to_string(&body).unwrap_or_default())
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

#[derive(Default)]
struct Shared {
    requests: RwLock<Vec<RecordedRequest>>,
    reply: RwLock<Reply>,
}

/// Scripted FleetLock server: records what it receives and replays `Reply`.
#[derive(Clone, Default)]
pub struct MockServer {
    shared: Arc<Shared>,
}

impl MockServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn app(&self) -> Router {
        Router::new()
            .route("/v1/pre-reboot", post(pre_reboot))
            .route("/v1/steady-state", post(steady_state))
            .with_state(self.clone())
    }

    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.shared.requests.read().await.clone()
    }

    pub async fn set_reply(&self, reply: Reply) {
        *self.shared.reply.write().await = reply;
    }

    pub async fn clear(&self) {
        self.shared.requests.write().await.clear();
        *self.shared.reply.write().await = Reply::default();
    }
}

pub fn app() -> Router {
    MockServer::new().app()
}

pub async fn run(listener: TcpListener, server: MockServer) -> Result<(), std::io::Error> {
    axum::serve(listener, server.app()).await
}

async fn pre_reboot(State(server): State<MockServer>, headers: HeaderMap, body: Bytes) -> Response {
    handle(server, "/v1/pre-reboot", headers, body).await
}

async fn steady_state(
    State(server): State<MockServer>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    handle(server, "/v1/steady-state", headers, body).await
}

async fn handle(server: MockServer, path: &str, headers: HeaderMap, body: Bytes) -> Response {
    let marked = headers
        .get(PROTOCOL_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == "true");
    if !marked {
        tracing::info!(path, "rejecting request without protocol header");
        return error_response(
            StatusCode::BAD_REQUEST,
            "missing_fleet_lock_header",
            "fleet-lock-protocol header must be set to true",
        );
    }

    let payload: Payload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::info!(path, error = %e, "rejecting malformed payload");
            return error_response(StatusCode::BAD_REQUEST, "invalid_payload", &e.to_string());
        }
    };

    tracing::info!(
        path,
        id = %payload.client_params.id,
        group = %payload.client_params.group,
        "fleetlock request"
    );

    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    server.shared.requests.write().await.push(RecordedRequest {
        path: path.to_string(),
        payload,
        authorization,
    });

    let reply = server.shared.reply.read().await.clone();
    if let Some(delay) = reply.delay {
        tokio::time::sleep(delay).await;
    }

    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = if reply.body.is_empty() {
        status.into_response()
    } else {
        (status, [(header::CONTENT_TYPE, "application/json")], reply.body).into_response()
    };
    if let Some(location) = reply.location.and_then(|l| HeaderValue::from_str(&l).ok()) {
        response.headers_mut().insert(header::LOCATION, location);
    }
    response
}

fn error_response(status: StatusCode, kind: &str, value: &str) -> Response {
    let body = ErrorBody {
        kind: kind.to_string(),
        value: value.to_string(),
    };
    (status, axum::Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_deserializes_from_protocol_body() {
        let payload: Payload =
            serde_json::from_str(r#"{"client_params":{"id":"1234","group":"default"}}"#).unwrap();
        assert_eq!(payload.client_params.id, "1234");
        assert_eq!(payload.client_params.group, "default");
    }

    #[test]
    fn payload_rejects_missing_group() {
        let result: Result<Payload, _> = serde_json::from_str(r#"{"client_params":{"id":"1234"}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn error_reply_encodes_envelope() {
        let reply = Reply::error(500, "error_kind", "this is an error");
        assert_eq!(reply.status, 500);
        let body: ErrorBody = serde_json::from_str(&reply.body).unwrap();
        assert_eq!(body.kind, "error_kind");
        assert_eq!(body.value, "this is an error");
    }

    #[test]
    fn default_reply_is_empty_ok() {
        let reply = Reply::default();
        assert_eq!(reply.status, 200);
        assert!(reply.body.is_empty());
        assert!(reply.delay.is_none());
    }

    #[tokio::test]
    async fn clear_resets_reply_and_requests() {
        let server = MockServer::new();
        server.set_reply(Reply::raw(503, "x")).await;
        server.clear().await;
        assert!(server.requests().await.is_empty());
        assert_eq!(server.shared.reply.read().await.status, 200);
    }
}
