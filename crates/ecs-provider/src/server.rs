//! Projection of ECS server records onto Kubernetes node fields
use cloud_provider::instances::{NodeAddress, NODE_EXTERNAL_IP, NODE_INTERNAL_IP};
use ecs_client::models::{ServerDetail, ADDRESS_TYPE_FIXED, ADDRESS_TYPE_FLOATING};
use tracing::debug;

use crate::error::InstanceError;

/// Power status of a server that is shut down.
pub const INSTANCE_SHUTOFF: &str = "SHUTOFF";

/// Node addresses of a server.
///
/// Fixed (VPC) addresses become internal IPs and floating (elastic) addresses
/// become external IPs, in the order the API listed them. Addresses with any
/// other attachment type are dropped.
pub fn derive_addresses(server: &ServerDetail) -> Vec<NodeAddress> {
    let mut node_addresses = Vec::new();

    for group in &server.addresses {
        for addr in &group.addresses {
            let address_type = match addr.address_type.as_str() {
                ADDRESS_TYPE_FIXED => NODE_INTERNAL_IP,
                ADDRESS_TYPE_FLOATING => NODE_EXTERNAL_IP,
                other => {
                    debug!("skip address {} with type {:?}", addr.addr, other);
                    continue;
                }
            };
            debug!(
                "get a node address, type: {}, address: {}",
                address_type, addr.addr
            );
            node_addresses.push(NodeAddress {
                type_: address_type.to_owned(),
                address: addr.addr.clone(),
            });
        }
    }

    node_addresses
}

/// The instance type of a server, i.e. its flavor ID.
pub fn derive_instance_type(server: &ServerDetail) -> Result<String, InstanceError> {
    let flavor = server
        .flavor
        .as_ref()
        .ok_or_else(|| InstanceError::MissingFlavorInfo {
            server_id: server.id.clone(),
        })?;

    if flavor.id.is_empty() {
        return Err(InstanceError::EmptyFlavorId {
            server_id: server.id.clone(),
        });
    }

    Ok(flavor.id.clone())
}

/// Whether the server is shut down. Unknown statuses count as running.
pub fn derive_shutdown_state(server: &ServerDetail) -> bool {
    server.status == INSTANCE_SHUTOFF
}
