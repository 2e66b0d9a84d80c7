//! Delivery listing and status workflow for a provisioned agent.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument};

use resto_core::{AgentId, Delivery, DeliveryId, DeliveryStatus, DeliveryUpdate, NewDelivery, OrderId};

use crate::directory::DeliveryBoard;
use crate::gateway::GatewayError;

/// Errors from the delivery workflow.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Gateway call failed.
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// The delivery is finished or cancelled.
    #[error("Delivery {id} is already {status}")]
    Terminal { id: DeliveryId, status: DeliveryStatus },

    /// The requested status does not follow the current one.
    #[error("Delivery {id} cannot go from {from} to {to}")]
    InvalidTransition {
        id: DeliveryId,
        from: DeliveryStatus,
        to: DeliveryStatus,
    },

    /// The delivery is not in the agent's list.
    #[error("Delivery {0} is not assigned to this agent")]
    NotAssigned(DeliveryId),

    /// A delivery already exists for the order.
    #[error("Order {0} already has a delivery")]
    AlreadyDispatched(OrderId),
}

/// Courier-side and kitchen-side delivery operations.
pub struct DeliveryService {
    board: Arc<dyn DeliveryBoard>,
}

impl DeliveryService {
    #[must_use]
    pub fn new(board: Arc<dyn DeliveryBoard>) -> Self {
        Self { board }
    }

    /// Deliveries assigned to `agent_id`.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Gateway`] if the request fails.
    #[instrument(skip(self), fields(agent_id = %agent_id))]
    pub async fn list(&self, agent_id: &AgentId) -> Result<Vec<Delivery>, DeliveryError> {
        Ok(self.board.deliveries_for_agent(agent_id).await?)
    }

    /// One of the agent's deliveries.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::NotAssigned`] if the agent does not hold it.
    pub async fn find(
        &self,
        agent_id: &AgentId,
        delivery_id: &DeliveryId,
    ) -> Result<Delivery, DeliveryError> {
        self.list(agent_id)
            .await?
            .into_iter()
            .find(|d| &d.id == delivery_id)
            .ok_or_else(|| DeliveryError::NotAssigned(delivery_id.clone()))
    }

    /// Set a delivery's status without checking the current one.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Gateway`] if the request fails.
    #[instrument(skip(self), fields(delivery_id = %delivery_id, agent_id = %agent_id, status = %status))]
    pub async fn update(
        &self,
        delivery_id: &DeliveryId,
        agent_id: &AgentId,
        status: DeliveryStatus,
    ) -> Result<(), DeliveryError> {
        let update = DeliveryUpdate {
            statut: status,
            livreur_id: agent_id.clone(),
        };
        self.board.update_delivery(delivery_id, &update).await?;
        info!("Delivery status updated");
        Ok(())
    }

    /// Move a delivery to `target`, checking the transition first.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Terminal`] or
    /// [`DeliveryError::InvalidTransition`] without sending anything, or the
    /// gateway error.
    pub async fn transition(
        &self,
        delivery: &Delivery,
        agent_id: &AgentId,
        target: DeliveryStatus,
    ) -> Result<(), DeliveryError> {
        if delivery.statut.is_terminal() {
            return Err(DeliveryError::Terminal {
                id: delivery.id.clone(),
                status: delivery.statut,
            });
        }
        if !delivery.statut.can_transition_to(target) {
            return Err(DeliveryError::InvalidTransition {
                id: delivery.id.clone(),
                from: delivery.statut,
                to: target,
            });
        }
        self.update(&delivery.id, agent_id, target).await
    }

    /// Move a delivery one step forward and return the new status.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Terminal`] for a finished delivery.
    pub async fn advance(
        &self,
        delivery: &Delivery,
        agent_id: &AgentId,
    ) -> Result<DeliveryStatus, DeliveryError> {
        let next = delivery.statut.next().ok_or_else(|| DeliveryError::Terminal {
            id: delivery.id.clone(),
            status: delivery.statut,
        })?;
        self.transition(delivery, agent_id, next).await?;
        Ok(next)
    }

    /// Cancel a delivery.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Terminal`] for a finished delivery.
    pub async fn cancel(&self, delivery: &Delivery, agent_id: &AgentId) -> Result<(), DeliveryError> {
        self.transition(delivery, agent_id, DeliveryStatus::Annulee).await
    }

    /// Create the delivery of a ready order.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::AlreadyDispatched`] when the service answers
    /// 400, which it does for an order that already has a delivery.
    #[instrument(skip(self, delivery), fields(order_id = %delivery.commande_id))]
    pub async fn dispatch(&self, delivery: &NewDelivery) -> Result<Delivery, DeliveryError> {
        match self.board.create_delivery(delivery).await {
            Ok(created) => {
                info!(delivery_id = %created.id, "Delivery created");
                Ok(created)
            }
            Err(e) if e.status() == Some(400) => {
                Err(DeliveryError::AlreadyDispatched(delivery.commande_id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{FakeBackend, delivery};

    fn agent_a1() -> AgentId {
        AgentId::parse("A1").unwrap()
    }

    fn service(backend: &Arc<FakeBackend>) -> DeliveryService {
        DeliveryService::new(backend.clone())
    }

    #[tokio::test]
    async fn test_list_only_returns_assigned() {
        let backend = Arc::new(
            FakeBackend::new()
                .with_delivery(delivery("D1", "A1", DeliveryStatus::EnAttente))
                .with_delivery(delivery("D2", "A2", DeliveryStatus::EnAttente)),
        );

        let deliveries = service(&backend).list(&agent_a1()).await.unwrap();

        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].id.as_str(), "D1");
    }

    #[tokio::test]
    async fn test_find_rejects_other_agents_delivery() {
        let backend = Arc::new(
            FakeBackend::new().with_delivery(delivery("D2", "A2", DeliveryStatus::EnAttente)),
        );

        let result = service(&backend)
            .find(&agent_a1(), &DeliveryId::parse("D2").unwrap())
            .await;

        assert!(matches!(result, Err(DeliveryError::NotAssigned(_))));
    }

    #[tokio::test]
    async fn test_advance_walks_the_lifecycle() {
        let backend = Arc::new(
            FakeBackend::new().with_delivery(delivery("D1", "A1", DeliveryStatus::EnAttente)),
        );
        let service = service(&backend);
        let agent_id = agent_a1();
        let id = DeliveryId::parse("D1").unwrap();

        let mut seen = Vec::new();
        loop {
            let current = service.find(&agent_id, &id).await.unwrap();
            match service.advance(&current, &agent_id).await {
                Ok(status) => seen.push(status),
                Err(DeliveryError::Terminal { status, .. }) => {
                    assert_eq!(status, DeliveryStatus::Livree);
                    break;
                }
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(
            seen,
            vec![
                DeliveryStatus::EnRouteRestaurant,
                DeliveryStatus::Recuperee,
                DeliveryStatus::EnRouteClient,
                DeliveryStatus::Livree,
            ]
        );
        assert_eq!(backend.calls().delivery_updates, 4);
    }

    #[tokio::test]
    async fn test_terminal_delivery_sends_nothing() {
        let backend = Arc::new(FakeBackend::new());
        let done = delivery("D1", "A1", DeliveryStatus::Livree);

        let cancel = service(&backend).cancel(&done, &agent_a1()).await;
        let advance = service(&backend).advance(&done, &agent_a1()).await;

        assert!(matches!(cancel, Err(DeliveryError::Terminal { .. })));
        assert!(matches!(advance, Err(DeliveryError::Terminal { .. })));
        assert_eq!(backend.calls().delivery_updates, 0);
    }

    #[tokio::test]
    async fn test_invalid_transition_sends_nothing() {
        let backend = Arc::new(FakeBackend::new());
        let waiting = delivery("D1", "A1", DeliveryStatus::EnAttente);

        let result = service(&backend)
            .transition(&waiting, &agent_a1(), DeliveryStatus::Livree)
            .await;

        assert!(matches!(result, Err(DeliveryError::InvalidTransition { .. })));
        assert_eq!(backend.calls().delivery_updates, 0);
    }

    #[tokio::test]
    async fn test_cancel_in_progress_delivery() {
        let backend = Arc::new(
            FakeBackend::new().with_delivery(delivery("D1", "A1", DeliveryStatus::Recuperee)),
        );
        let current = delivery("D1", "A1", DeliveryStatus::Recuperee);

        service(&backend).cancel(&current, &agent_a1()).await.unwrap();

        assert_eq!(backend.deliveries()[0].statut, DeliveryStatus::Annulee);
    }

    #[tokio::test]
    async fn test_dispatch_twice_is_already_dispatched() {
        let backend = Arc::new(FakeBackend::new());
        let order = OrderId::parse("12").unwrap();
        let new = NewDelivery::standard(order, "5 avenue Foch", "0600000000");

        let created = service(&backend).dispatch(&new).await.unwrap();
        assert_eq!(created.statut, DeliveryStatus::EnAttente);

        let again = service(&backend).dispatch(&new).await;
        assert!(matches!(again, Err(DeliveryError::AlreadyDispatched(id)) if id.as_str() == "12"));
    }
}
