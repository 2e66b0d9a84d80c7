//! Resto Core - Shared domain types.
//!
//! This crate provides the types exchanged with the restaurant API Gateway,
//! shared by:
//! - `resto-courier` - Agent provisioning and delivery workflow library
//! - `resto-cli` - Command-line caller for couriers and the kitchen
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no HTTP
//! clients, no clock. Wire formats follow the backend services: the client
//! service speaks camelCase, the delivery service uses French field names.
//!
//! # Modules
//!
//! - [`types`] - Typed ids, emails, prices, statuses and the records built on them

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
