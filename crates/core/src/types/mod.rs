//! Core types for Resto.
//!
//! This module provides type-safe wrappers and records for the restaurant
//! backend's client and delivery services.

pub mod agent;
pub mod client;
pub mod delivery;
pub mod email;
pub mod id;
pub mod price;
pub mod status;

pub use agent::{DeliveryAgent, NewDeliveryAgent};
pub use client::ClientProfile;
pub use delivery::{Delivery, DeliveryUpdate, NewDelivery};
pub use email::{Email, EmailError};
pub use id::{AgentId, ClientId, DeliveryId, OrderId, ParseIdError};
pub use price::Price;
pub use status::*;
