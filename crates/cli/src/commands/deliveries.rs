//! Delivery commands.
//!
//! # Usage
//!
//! ```bash
//! resto deliveries list
//! resto deliveries advance 3
//! resto deliveries cancel 3
//! resto deliveries dispatch --order 12 --address "5 avenue Foch" --phone 0600000000
//! ```

use std::sync::Arc;

use resto_core::{DeliveryId, NewDelivery, OrderId, Role};
use resto_courier::DeliveryService;

use super::{CliError, Context};

/// Print the courier's deliveries.
pub async fn list(context: &Context) -> Result<(), CliError> {
    let (gateway, agent_id) = context.courier_agent().await?;
    let deliveries = DeliveryService::new(Arc::new(gateway)).list(&agent_id).await?;

    if deliveries.is_empty() {
        tracing::info!("No deliveries assigned to agent {}", agent_id);
        return Ok(());
    }

    for delivery in deliveries {
        let fee = delivery
            .fee()
            .map_or_else(|| "-".to_string(), |price| price.to_string());
        tracing::info!(
            "{:>6}  {:<20}  {:<32}  {}",
            delivery.id.as_str(),
            delivery.statut.label(),
            delivery.adresse_arrivee,
            fee
        );
    }
    Ok(())
}

/// Move a delivery to its next status.
pub async fn advance(context: &Context, id: &str) -> Result<(), CliError> {
    let delivery_id = DeliveryId::parse(id)?;
    let (gateway, agent_id) = context.courier_agent().await?;
    let service = DeliveryService::new(Arc::new(gateway));

    let delivery = service.find(&agent_id, &delivery_id).await?;
    let status = service.advance(&delivery, &agent_id).await?;
    tracing::info!("Delivery {} is now {}", delivery_id, status.label());
    Ok(())
}

/// Cancel a delivery.
pub async fn cancel(context: &Context, id: &str) -> Result<(), CliError> {
    let delivery_id = DeliveryId::parse(id)?;
    let (gateway, agent_id) = context.courier_agent().await?;
    let service = DeliveryService::new(Arc::new(gateway));

    let delivery = service.find(&agent_id, &delivery_id).await?;
    service.cancel(&delivery, &agent_id).await?;
    tracing::info!("Delivery {} cancelled", delivery_id);
    Ok(())
}

/// Create the delivery of a ready order.
pub async fn dispatch(context: &Context, order: &str, address: &str, phone: &str) -> Result<(), CliError> {
    let order_id = OrderId::parse(order)?;
    let (_, gateway) = context.authenticated(Role::Chef)?;

    let delivery = DeliveryService::new(Arc::new(gateway))
        .dispatch(&NewDelivery::standard(order_id, address, phone))
        .await?;
    tracing::info!("Delivery {} created for order {}", delivery.id, order);
    Ok(())
}
