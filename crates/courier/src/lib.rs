//! Resto Courier - delivery agent provisioning over the restaurant API Gateway.
//!
//! A courier logs in as a client of the restaurant platform. Before they can
//! take deliveries, the delivery service must hold exactly one delivery agent
//! record for their client identity. [`Provisioner::ensure_agent`] finds or
//! creates that record idempotently, tolerating stale local state and races
//! with other sessions of the same user.
//!
//! # Modules
//!
//! - [`gateway`] - HTTP client for the API Gateway and its error type
//! - [`directory`] - Collaborator traits implemented by the gateway client
//! - [`store`] - Durable key-value store standing in for browser local storage
//! - [`session`] - Explicit login session (bearer token, role, client id)
//! - [`provisioning`] - The agent provisioner and its retry policy
//! - [`deliveries`] - Delivery listing and status workflow
//! - [`config`] - Environment configuration

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod deliveries;
pub mod directory;
pub mod gateway;
pub mod provisioning;
pub mod session;
pub mod store;

#[cfg(test)]
mod testing;

pub use config::{ConfigError, CourierConfig};
pub use deliveries::{DeliveryError, DeliveryService};
pub use directory::{AgentDirectory, ClientDirectory, DeliveryBoard};
pub use gateway::{GatewayClient, GatewayError};
pub use provisioning::{Backoff, ConflictStrategy, ProvisionError, Provisioner, RetryPolicy};
pub use session::{Session, SessionError, SessionManager};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
