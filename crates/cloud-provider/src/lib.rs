//! A crate for building Kubernetes cloud provider backends.
//!
//! The crate provides the [`Instances`] trait the cloud-controller-manager
//! queries to learn about nodes, the error taxonomy it branches on, helpers
//! for node provider IDs and the configuration shared by providers.

#![warn(missing_docs)]

pub mod config;
pub mod instances;
pub mod provider_id;

#[doc(inline)]
pub use instances::{Error, Instances, NodeAddress, NodeName};
