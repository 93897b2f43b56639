//! A client for the Elastic Cloud Server (ECS) API, covering the calls a
//! Kubernetes cloud provider needs to look up servers.
#![cfg_attr(not(test), deny(missing_docs))]

pub mod client;
pub mod errors;
pub mod models;
pub mod secrets;

#[doc(inline)]
pub use client::{Client, ClientConfig};
#[doc(inline)]
pub use errors::{Error, ServiceResponseError};
#[doc(inline)]
pub use secrets::Credentials;
