//! Wire DTOs for the FleetLock protocol.
//!
//! # Design
//! The request envelope nests the instance parameters under `client_params`,
//! exactly as the protocol names it. These types are independent of the
//! mock-server crate; integration tests catch schema drift between the two.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Body of every FleetLock request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Payload {
    pub client_params: Params,
}

/// Identity of the calling instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Params {
    /// Instance identifier, e.g. node name or machine id.
    pub id: String,
    /// Reboot group the instance belongs to.
    pub group: String,
}

impl Payload {
    pub fn new(id: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            client_params: Params {
                id: id.into(),
                group: group.into(),
            },
        }
    }
}

/// Structured error returned by the server in a non-2xx body.
///
/// Missing fields decode as empty strings; only a body that is not a JSON
/// object fails to decode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerError {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub value: String,
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.value, self.kind)
    }
}
