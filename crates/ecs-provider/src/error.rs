//! Errors raised while resolving and reading ECS servers
use thiserror::Error;
use tracing::warn;

/// ECS error code for a server that cannot be found.
///
/// Other codes are documented at
/// https://support.huaweicloud.com/en-us/api-ecs/ecs_07_0002.html
pub const ECS_ERROR_NOT_EXIST: &str = "Ecs.0114";

/// An error looking up or interpreting an ECS server
#[derive(Debug, Error)]
pub enum InstanceError {
    /// No server matches the ID or name
    #[error("failed to find server {0}")]
    NotFound(String),
    /// The provider ID carries no usable server ID
    #[error("provider ID {0:?} does not name a server")]
    InvalidProviderId(String),
    /// More than one server carries the name; the caller must not guess
    #[error("found {count} servers with the same name: {name}, which is not allowed")]
    Ambiguous {
        /// The server name looked up
        name: String,
        /// How many servers the API reported
        count: u32,
    },
    /// The server record carries no flavor
    #[error("failed to parse instance type from server as flavor info missing, server ID: {server_id}")]
    MissingFlavorInfo {
        /// The server ID
        server_id: String,
    },
    /// The server flavor has an empty ID
    #[error("flavor ID is empty, server ID: {server_id}")]
    EmptyFlavorId {
        /// The server ID
        server_id: String,
    },
    /// The API call failed for any other reason
    #[error("failed to retrieve server {key}: {source}")]
    Client {
        /// The server ID or name looked up
        key: String,
        /// The client error
        source: ecs_client::Error,
    },
}

impl From<InstanceError> for cloud_provider::Error {
    fn from(e: InstanceError) -> Self {
        match e {
            InstanceError::NotFound(_) => cloud_provider::Error::InstanceNotFound,
            other => cloud_provider::Error::Other(other.into()),
        }
    }
}

/// Tells if an API error means the server does not exist.
///
/// The body of every API error is decoded against the service error envelope;
/// anything that does not decode is treated as some other failure.
pub fn is_non_exist_error(err: &ecs_client::Error) -> bool {
    match err.service_error() {
        Some(sre) => sre.error_code == ECS_ERROR_NOT_EXIST,
        None => {
            if let ecs_client::Error::Api { status, .. } = err {
                warn!("unable to decode ECS error body, status: {}", status);
            }
            false
        }
    }
}
