//! Collaborator interfaces consumed by the provisioner and delivery workflow.
//!
//! [`GatewayClient`](crate::GatewayClient) implements all of them over HTTP;
//! tests substitute in-memory directories.

use async_trait::async_trait;

use resto_core::{
    AgentId, ClientId, ClientProfile, Delivery, DeliveryAgent, DeliveryId, DeliveryUpdate,
    NewDelivery, NewDeliveryAgent,
};

use crate::gateway::GatewayError;

/// Read access to client profiles.
#[async_trait]
pub trait ClientDirectory: Send + Sync {
    /// Fetch a client profile by id.
    async fn client(&self, client_id: &ClientId) -> Result<ClientProfile, GatewayError>;
}

/// The delivery-agent directory.
///
/// The backend keeps at most one agent per email and answers a duplicate
/// creation with [`GatewayError::Conflict`].
#[async_trait]
pub trait AgentDirectory: Send + Sync {
    /// Fetch one agent by id.
    async fn agent(&self, agent_id: &AgentId) -> Result<DeliveryAgent, GatewayError>;

    /// List all agents.
    async fn agents(&self) -> Result<Vec<DeliveryAgent>, GatewayError>;

    /// Create an agent and return the stored record.
    async fn create_agent(&self, agent: &NewDeliveryAgent) -> Result<DeliveryAgent, GatewayError>;

    /// Delete an agent.
    async fn delete_agent(&self, agent_id: &AgentId) -> Result<(), GatewayError>;
}

/// Deliveries as seen by couriers and the kitchen.
#[async_trait]
pub trait DeliveryBoard: Send + Sync {
    /// Deliveries assigned to an agent.
    async fn deliveries_for_agent(&self, agent_id: &AgentId) -> Result<Vec<Delivery>, GatewayError>;

    /// Patch a delivery's status.
    async fn update_delivery(
        &self,
        delivery_id: &DeliveryId,
        update: &DeliveryUpdate,
    ) -> Result<(), GatewayError>;

    /// Create a delivery for a ready order.
    async fn create_delivery(&self, delivery: &NewDelivery) -> Result<Delivery, GatewayError>;
}
