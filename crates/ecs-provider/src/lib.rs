//! A cloud provider [`Instances`] implementation backed by Elastic Cloud
//! Server (ECS).
//!
//! [`EcsInstances`] resolves node provider IDs and names to ECS servers and
//! translates the server records into what the cloud-controller-manager
//! expects. It holds nothing but a pre-built API client, so a single value
//! can be shared between all controller workers.
//!
//! ```rust,no_run
//! use cloud_provider::config::{Config, PartialConfig};
//! use cloud_provider::Instances;
//! use ecs_provider::EcsInstances;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let flags = PartialConfig {
//!     region: Some("cn-north-4".into()),
//!     project_id: Some("0605767c2f00d2c92f2ac01f2f8a3e91".into()),
//!     ..Default::default()
//! };
//! let config = Config::from_partial(flags, PartialConfig::default())?;
//! let instances = EcsInstances::from_config(&config)?;
//! let exists = instances
//!     .instance_exists_by_provider_id("huaweicloud://a44af098-7548-4519-8243-a88ba3e5de4f")
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), deny(missing_docs))]

pub mod error;
pub mod server;

use async_trait::async_trait;
use cloud_provider::config::Config;
use cloud_provider::instances::{Instances, NodeAddress, NodeName, Result};
use cloud_provider::provider_id::strip_provider_prefix;
use ecs_client::models::ServerDetail;
use ecs_client::{Client, ClientConfig, Credentials};
use tracing::{debug, error, info, warn};

pub use error::InstanceError;
use error::is_non_exist_error;
use server::{derive_addresses, derive_instance_type, derive_shutdown_state};

/// Resolves Kubernetes nodes to ECS servers.
#[derive(Clone, Debug)]
pub struct EcsInstances {
    client: Client,
    provider_name: String,
}

impl EcsInstances {
    /// Create an instance resolver around an existing client.
    ///
    /// `provider_name` is the scheme of the provider IDs this resolver accepts.
    pub fn new(client: Client, provider_name: impl Into<String>) -> Self {
        EcsInstances {
            client,
            provider_name: provider_name.into(),
        }
    }

    /// Build the credentials and the client described by `config`.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let mut credentials = Credentials::builder().with_project_id(&config.project_id);
        if let Some(token) = &config.auth_token {
            credentials = credentials.with_token(token);
        }
        let client_config = ClientConfig {
            endpoint: config.endpoint.clone(),
            timeout: config.request_timeout,
        };
        let client = Client::new(client_config, credentials.build()?)?;
        Ok(Self::new(client, &config.provider_name))
    }

    /// Fetch the server a provider ID refers to.
    ///
    /// The provider ID may or may not carry the `<provider-name>://` prefix.
    /// A server that does not exist yields [`InstanceError::NotFound`]; every
    /// other failure yields [`InstanceError::Client`]. IDs that would address
    /// the server collection instead of a server are rejected without a call.
    pub async fn resolve_by_provider_id(
        &self,
        provider_id: &str,
    ) -> std::result::Result<ServerDetail, InstanceError> {
        let server_id = strip_provider_prefix(provider_id, &self.provider_name);
        if matches!(server_id, "" | "." | "..") {
            warn!("provider ID {:?} carries no server ID", provider_id);
            return Err(InstanceError::InvalidProviderId(provider_id.to_owned()));
        }

        match self.client.show_server(server_id).await {
            Ok(rsp) => Ok(rsp.server),
            Err(e) => {
                warn!(
                    "failed to retrieve server by server ID: {}, error: {}",
                    server_id, e
                );
                if is_non_exist_error(&e) {
                    Err(InstanceError::NotFound(server_id.to_owned()))
                } else {
                    Err(InstanceError::Client {
                        key: server_id.to_owned(),
                        source: e,
                    })
                }
            }
        }
    }

    /// Fetch the only server named `name`.
    ///
    /// No match yields [`InstanceError::NotFound`], several matches yield
    /// [`InstanceError::Ambiguous`].
    pub async fn resolve_by_name(
        &self,
        name: &str,
    ) -> std::result::Result<ServerDetail, InstanceError> {
        let rsp = self
            .client
            .list_servers_details(name)
            .await
            .map_err(|e| InstanceError::Client {
                key: name.to_owned(),
                source: e,
            })?;

        match rsp.count.unwrap_or(0) {
            0 => {
                warn!("no server found with name: {}", name);
                Err(InstanceError::NotFound(name.to_owned()))
            }
            1 => rsp.servers.into_iter().next().ok_or_else(|| {
                warn!("server count is 1 but no server listed, name: {}", name);
                InstanceError::NotFound(name.to_owned())
            }),
            count => Err(InstanceError::Ambiguous {
                name: name.to_owned(),
                count,
            }),
        }
    }
}

#[async_trait]
impl Instances for EcsInstances {
    async fn node_addresses_by_provider_id(&self, provider_id: &str) -> Result<Vec<NodeAddress>> {
        info!(
            "NodeAddressesByProviderID is called. input provider ID: {}",
            provider_id
        );

        let server = self.resolve_by_provider_id(provider_id).await.map_err(|e| {
            error!(
                "Get server info failed. provider id: {}, error: {}",
                provider_id, e
            );
            e
        })?;
        debug!("server info: {:?}", server);

        let node_addresses = derive_addresses(&server);
        info!(
            "NodeAddressesByProviderID, input provider ID: {}, output addresses: {:?}",
            provider_id, node_addresses
        );

        Ok(node_addresses)
    }

    async fn instance_id(&self, node_name: &NodeName) -> Result<String> {
        info!("InstanceID is called. input nodeName: {}", node_name);

        let server = self
            .resolve_by_name(node_name.as_str())
            .await
            .map_err(|e| {
                warn!("failed to get ECS by name: {}, error: {}", node_name, e);
                e
            })?;

        Ok(server.id)
    }

    async fn instance_type_by_provider_id(&self, provider_id: &str) -> Result<String> {
        info!(
            "InstanceTypeByProviderID is called. input provider ID: {}",
            provider_id
        );

        let server = self.resolve_by_provider_id(provider_id).await.map_err(|e| {
            error!(
                "Get server info failed. provider id: {}, error: {}",
                provider_id, e
            );
            e
        })?;

        Ok(derive_instance_type(&server)?)
    }

    async fn instance_exists_by_provider_id(&self, provider_id: &str) -> Result<bool> {
        info!(
            "InstanceExistsByProviderID is called. input provider ID: {}",
            provider_id
        );

        match self.resolve_by_provider_id(provider_id).await {
            Ok(_) => Ok(true),
            Err(InstanceError::NotFound(_)) => {
                info!("Instance not exist. provider ID: {}", provider_id);
                Ok(false)
            }
            Err(e) => {
                error!(
                    "Get server info failed. provider id: {}, error: {}",
                    provider_id, e
                );
                Err(e.into())
            }
        }
    }

    async fn instance_shutdown_by_provider_id(&self, provider_id: &str) -> Result<bool> {
        info!(
            "InstanceShutdownByProviderID is called. input provider ID: {}",
            provider_id
        );

        let server = self.resolve_by_provider_id(provider_id).await.map_err(|e| {
            error!(
                "Get server info failed. provider id: {}, error: {}",
                provider_id, e
            );
            e
        })?;

        let shutdown = derive_shutdown_state(&server);
        if shutdown {
            warn!("instance has been shut down. provider id: {}", provider_id);
        }
        Ok(shutdown)
    }
}
