//! Client for the FleetLock reboot-coordination protocol.
//!
//! # Overview
//! Fleet nodes call [`FleetLockClient::recursive_lock`] before rebooting to
//! acquire a slot from the server, and [`FleetLockClient::unlock_if_held`]
//! once they reach steady state to release it. The server decides who gets a
//! slot; this crate only speaks the calling side of the protocol.
//!
//! # Design
//! - `FleetLockClient` is stateless beyond its validated `Config`, so one
//!   instance can serve concurrent callers.
//! - Requests and responses are plain data (`HttpRequest`, `HttpResponse`)
//!   passed through a pluggable [`Transport`]. `ReqwestTransport` is the
//!   default; [`BasicAuthTransport`] decorates any other transport.
//! - Every call takes a `CancellationToken`. Cancelling it drops the
//!   in-flight request and the call fails with `TransportError::Cancelled`.
//! - No retries or timeouts are applied here.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;

pub use auth::BasicAuthTransport;
pub use client::{parse_response, Endpoint, FleetLockClient, PROTOCOL_HEADER};
pub use config::{Config, DEFAULT_GROUP};
pub use error::{ClientError, ConfigError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{ReqwestTransport, Transport};
pub use types::{Params, Payload, ServerError};

pub use tokio_util::sync::CancellationToken;
