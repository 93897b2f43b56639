//! The `Instances` contract a cloud provider implements for the
//! cloud-controller-manager.
use std::fmt;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

/// Address of a node as reported in the node status.
pub use k8s_openapi::api::core::v1::NodeAddress;

/// Node address type for addresses only routable within the cluster network.
pub const NODE_INTERNAL_IP: &str = "InternalIP";
/// Node address type for addresses routable from outside the cluster.
pub const NODE_EXTERNAL_IP: &str = "ExternalIP";

/// The name of a node object in Kubernetes.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct NodeName(String);

impl NodeName {
    /// The name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeName {
    fn from(name: &str) -> Self {
        NodeName(name.to_owned())
    }
}

impl From<String> for NodeName {
    fn from(name: String) -> Self {
        NodeName(name)
    }
}

/// Errors the cloud-controller-manager branches on.
#[derive(Debug, Error)]
pub enum Error {
    /// The instance does not exist in the cloud.
    ///
    /// Must not be returned for instances that exist but are stopped.
    #[error("instance not found")]
    InstanceNotFound,
    /// The operation is not supported by this cloud provider.
    #[error("operation not implemented")]
    NotImplemented,
    /// Any other failure.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type of [`Instances`] methods
pub type Result<T> = std::result::Result<T, Error>;

/// Instance queries the cloud-controller-manager makes against a cloud.
///
/// Methods that have no natural implementation for a cloud can be left to
/// their defaults, which return [`Error::NotImplemented`] without doing any
/// work.
///
/// **Note**: this trait is defined using [async-trait](https://crates.io/crates/async-trait).
/// Implementations are shared between the controller's workers, hence the
/// `Send + Sync` bound.
///
/// # Example
/// ```rust
/// use async_trait::async_trait;
/// use cloud_provider::instances::{Instances, NodeAddress, NodeName, Result};
///
/// struct MyCloud;
///
/// #[async_trait]
/// impl Instances for MyCloud {
///     async fn node_addresses_by_provider_id(&self, provider_id: &str) -> Result<Vec<NodeAddress>> {
///         todo!("Implement Instances::node_addresses_by_provider_id")
///     }
///
///     // Implement the rest of the required methods ...
///     # async fn instance_id(&self, node_name: &NodeName) -> Result<String> { todo!() }
///     # async fn instance_type_by_provider_id(&self, provider_id: &str) -> Result<String> { todo!() }
///     # async fn instance_exists_by_provider_id(&self, provider_id: &str) -> Result<bool> { todo!() }
///     # async fn instance_shutdown_by_provider_id(&self, provider_id: &str) -> Result<bool> { todo!() }
/// }
/// ```
#[async_trait]
pub trait Instances: Send + Sync {
    /// Returns the addresses of the named instance.
    ///
    /// The default implementation reports that this is not available.
    async fn node_addresses(&self, name: &NodeName) -> Result<Vec<NodeAddress>> {
        info!("NodeAddresses is called. input name: {}", name);
        Err(Error::NotImplemented)
    }

    /// Returns the addresses of the instance identified by its provider ID.
    ///
    /// This is not called from the node being queried, so local metadata
    /// services cannot be used.
    async fn node_addresses_by_provider_id(&self, provider_id: &str)
        -> Result<Vec<NodeAddress>>;

    /// Returns the cloud ID of the named node.
    ///
    /// Returns [`Error::InstanceNotFound`] if the instance does not exist.
    async fn instance_id(&self, node_name: &NodeName) -> Result<String>;

    /// Returns the type of the named instance.
    ///
    /// The default implementation reports that this is not available.
    async fn instance_type(&self, name: &NodeName) -> Result<String> {
        info!("InstanceType is called. input name: {}", name);
        Err(Error::NotImplemented)
    }

    /// Returns the type of the instance identified by its provider ID.
    async fn instance_type_by_provider_id(&self, provider_id: &str) -> Result<String>;

    /// Adds an SSH public key (`<protocol> <blob>`) as a legal identity for
    /// all instances.
    ///
    /// The default implementation reports that this is not available.
    async fn add_ssh_key_to_all_instances(&self, user: &str, key_data: &[u8]) -> Result<()> {
        info!(
            "AddSSHKeyToAllInstances is called. input user: {}, key length: {}",
            user,
            key_data.len()
        );
        Err(Error::NotImplemented)
    }

    /// Returns the name of the node we are currently running on.
    ///
    /// On most clouds this is the hostname, which is what the default
    /// implementation returns.
    async fn current_node_name(&self, hostname: &str) -> Result<NodeName> {
        info!(
            "CurrentNodeName is called. input hostname: {}, output node name: {}",
            hostname, hostname
        );
        Ok(NodeName::from(hostname))
    }

    /// Returns true if the instance for the given provider ID exists.
    ///
    /// When `false` is returned without an error the controller deletes the
    /// node immediately, so stopped instances must still report `true`.
    async fn instance_exists_by_provider_id(&self, provider_id: &str) -> Result<bool>;

    /// Returns true if the instance is shut down.
    async fn instance_shutdown_by_provider_id(&self, provider_id: &str) -> Result<bool>;
}

#[cfg(test)]
mod test {
    use super::*;

    struct Unsupported;

    #[async_trait]
    impl Instances for Unsupported {
        async fn node_addresses_by_provider_id(&self, _: &str) -> Result<Vec<NodeAddress>> {
            Err(Error::InstanceNotFound)
        }
        async fn instance_id(&self, _: &NodeName) -> Result<String> {
            Err(Error::InstanceNotFound)
        }
        async fn instance_type_by_provider_id(&self, _: &str) -> Result<String> {
            Err(Error::InstanceNotFound)
        }
        async fn instance_exists_by_provider_id(&self, _: &str) -> Result<bool> {
            Ok(false)
        }
        async fn instance_shutdown_by_provider_id(&self, _: &str) -> Result<bool> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn test_defaults_are_not_implemented() {
        let name = NodeName::from("node-1");
        assert!(matches!(
            Unsupported.node_addresses(&name).await,
            Err(Error::NotImplemented)
        ));
        assert!(matches!(
            Unsupported.instance_type(&name).await,
            Err(Error::NotImplemented)
        ));
        assert!(matches!(
            Unsupported
                .add_ssh_key_to_all_instances("root", b"ssh-rsa AAAA")
                .await,
            Err(Error::NotImplemented)
        ));
    }

    #[tokio::test]
    async fn test_current_node_name_is_hostname() {
        let name = Unsupported
            .current_node_name("ip-10-0-0-5")
            .await
            .expect("current node name");
        assert_eq!("ip-10-0-0-5", name.as_str());
    }

    #[test]
    fn test_other_errors_keep_their_source() {
        #[derive(Debug, Error)]
        #[error("boom")]
        struct Boom;

        let err: Error = anyhow::Error::new(Boom).into();
        match err {
            Error::Other(e) => assert!(e.is::<Boom>()),
            _ => panic!("expected Error::Other"),
        }
    }
}
