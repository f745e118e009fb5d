//! Shared foundation for the Strata cluster master.
//!
//! This crate carries the types that every other Strata crate agrees on:
//! the resource-type and store-mode enums that discriminate node capacity,
//! the `Peer` shape handed to the replication layer, binary capacity units,
//! and the TOML-loadable master configuration.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod types;
pub mod units;

pub use config::{Config, LimitsConfig, PlacementConfig};
pub use error::{Error, Result};
pub use types::{NodeResourceType, Peer, StoreMode};
