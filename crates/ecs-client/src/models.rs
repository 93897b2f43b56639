//! ECS server records as returned by the cloudservers API

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Attachment tag of a private (VPC) address.
pub const ADDRESS_TYPE_FIXED: &str = "fixed";
/// Attachment tag of a public (elastic IP) address.
pub const ADDRESS_TYPE_FLOATING: &str = "floating";

/// A single ECS server.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ServerDetail {
    /// The server ID
    pub id: String,
    /// The server name
    #[serde(default)]
    pub name: String,
    /// Power status, e.g. `ACTIVE` or `SHUTOFF`
    #[serde(default)]
    pub status: String,
    /// Addresses grouped by the network they are attached to, in the order
    /// the API reported them
    #[serde(
        default,
        deserialize_with = "deserialize_address_groups",
        serialize_with = "serialize_address_groups"
    )]
    pub addresses: Vec<AddressGroup>,
    /// The flavor the server was created with
    #[serde(default)]
    pub flavor: Option<ServerFlavor>,
    /// Availability zone
    #[serde(default, rename = "OS-EXT-AZ:availability_zone")]
    pub availability_zone: Option<String>,
    /// Creation timestamp
    #[serde(default)]
    pub created: Option<String>,
    /// Last update timestamp
    #[serde(default)]
    pub updated: Option<String>,
}

/// All addresses a server has on one network.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AddressGroup {
    /// The network (VPC) ID the group is keyed by
    pub network: String,
    /// The addresses, in API order
    pub addresses: Vec<ServerAddress>,
}

/// One address of a server.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ServerAddress {
    /// The IP address
    pub addr: String,
    /// IP version, 4 or 6
    #[serde(default)]
    pub version: Option<String>,
    /// Attachment tag: [`ADDRESS_TYPE_FIXED`], [`ADDRESS_TYPE_FLOATING`] or
    /// anything else the API chooses to report
    #[serde(default, rename = "OS-EXT-IPS:type")]
    pub address_type: String,
    /// MAC address of the port
    #[serde(default, rename = "OS-EXT-IPS-MAC:mac_addr")]
    pub mac_addr: Option<String>,
}

/// The resource sizing class of a server.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ServerFlavor {
    /// The flavor ID, e.g. `s3.large.2`
    #[serde(default)]
    pub id: String,
    /// The flavor name
    #[serde(default)]
    pub name: String,
    /// Number of vCPUs
    #[serde(default)]
    pub vcpus: Option<String>,
    /// Memory in MiB
    #[serde(default)]
    pub ram: Option<String>,
}

/// Response of `GET /v1/{project_id}/cloudservers/{server_id}`.
#[derive(Debug, Deserialize)]
pub struct ShowServerResponse {
    /// The server
    pub server: ServerDetail,
}

/// Response of `GET /v1/{project_id}/cloudservers/detail`.
#[derive(Debug, Default, Deserialize)]
pub struct ListServersDetailsResponse {
    /// Number of servers matching the query
    #[serde(default)]
    pub count: Option<u32>,
    /// The matching servers
    #[serde(default)]
    pub servers: Vec<ServerDetail>,
}

// Groups are written back as an object keyed by network ID, in order, so a
// serialized server reads the same as an API response.
fn serialize_address_groups<S>(groups: &[AddressGroup], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(groups.len()))?;
    for group in groups {
        map.serialize_entry(&group.network, &group.addresses)?;
    }
    map.end()
}

// The API reports addresses as a JSON object keyed by network ID. A map type
// would lose the order of the groups, so read the entries one by one.
fn deserialize_address_groups<'de, D>(deserializer: D) -> Result<Vec<AddressGroup>, D::Error>
where
    D: Deserializer<'de>,
{
    struct GroupsVisitor;

    impl<'de> Visitor<'de> for GroupsVisitor {
        type Value = Vec<AddressGroup>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of network IDs to address lists")
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Vec::new())
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut groups = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((network, addresses)) = map.next_entry::<String, Vec<ServerAddress>>()? {
                groups.push(AddressGroup { network, addresses });
            }
            Ok(groups)
        }
    }

    deserializer.deserialize_any(GroupsVisitor)
}

#[cfg(test)]
mod test {
    use super::*;

    const EXAMPLE_SERVER: &str = r#"
      {"server":{
        "id":"a44af098-7548-4519-8243-a88ba3e5de4f",
        "name":"node-1",
        "status":"ACTIVE",
        "addresses":{
          "zz-vpc":[{"addr":"10.0.0.5","version":"4","OS-EXT-IPS:type":"fixed","OS-EXT-IPS-MAC:mac_addr":"fa:16:3e:00:00:01"}],
          "aa-vpc":[{"addr":"1.2.3.4","version":"4","OS-EXT-IPS:type":"floating"}]
        },
        "flavor":{"id":"s3.large.2","name":"s3.large.2","vcpus":"2","ram":"4096"},
        "OS-EXT-AZ:availability_zone":"cn-north-4a"
      }}
      "#;

    #[test]
    fn test_deserialize_server() {
        let rsp: ShowServerResponse = serde_json::from_str(EXAMPLE_SERVER).expect("parse server");
        let server = rsp.server;
        assert_eq!("a44af098-7548-4519-8243-a88ba3e5de4f", server.id);
        assert_eq!("ACTIVE", server.status);
        assert_eq!(Some("cn-north-4a".to_owned()), server.availability_zone);
        assert_eq!("s3.large.2", server.flavor.expect("flavor").id);
        assert_eq!(
            Some("fa:16:3e:00:00:01"),
            server.addresses[0].addresses[0].mac_addr.as_deref()
        );
    }

    #[test]
    fn test_address_groups_keep_document_order() {
        let rsp: ShowServerResponse = serde_json::from_str(EXAMPLE_SERVER).expect("parse server");
        let networks: Vec<&str> = rsp
            .server
            .addresses
            .iter()
            .map(|g| g.network.as_str())
            .collect();
        assert_eq!(vec!["zz-vpc", "aa-vpc"], networks);
        assert_eq!(ADDRESS_TYPE_FIXED, rsp.server.addresses[0].addresses[0].address_type);
        assert_eq!(ADDRESS_TYPE_FLOATING, rsp.server.addresses[1].addresses[0].address_type);
    }

    #[test]
    fn test_serialized_server_reads_back() {
        let rsp: ShowServerResponse = serde_json::from_str(EXAMPLE_SERVER).expect("parse server");
        let written = serde_json::to_string(&rsp.server).expect("serialize server");
        assert!(written.contains(r#""addresses":{"zz-vpc":["#));

        let read: ServerDetail = serde_json::from_str(&written).expect("parse written server");
        assert_eq!(rsp.server, read);
    }

    #[test]
    fn test_deserialize_minimal_server() {
        let rsp: ShowServerResponse =
            serde_json::from_str(r#"{"server":{"id":"abc","addresses":null}}"#)
                .expect("parse server");
        assert!(rsp.server.addresses.is_empty());
        assert!(rsp.server.flavor.is_none());
        assert_eq!("", rsp.server.status);
    }

    #[test]
    fn test_deserialize_list_without_count() {
        let rsp: ListServersDetailsResponse =
            serde_json::from_str(r#"{"servers":[]}"#).expect("parse list");
        assert_eq!(None, rsp.count);
        assert!(rsp.servers.is_empty());
    }
}
