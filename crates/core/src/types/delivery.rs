//! Deliveries, as tracked by the delivery service.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{AgentId, DeliveryId, DeliveryStatus, OrderId, Price};

/// A delivery assigned to (or waiting for) a courier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
    pub id: DeliveryId,
    #[serde(default)]
    pub commande_id: Option<OrderId>,
    #[serde(default)]
    pub statut: DeliveryStatus,
    #[serde(default)]
    pub adresse_depart: String,
    #[serde(default)]
    pub adresse_arrivee: String,
    #[serde(default)]
    pub client_nom: String,
    #[serde(default)]
    pub client_telephone: Option<String>,
    #[serde(default)]
    pub commentaires: Option<String>,
    #[serde(default)]
    pub livreur_id: Option<AgentId>,
    #[serde(default)]
    pub prix_livraison: Option<Decimal>,
    #[serde(default)]
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub temps_estime: Option<u32>,
}

impl Delivery {
    /// Delivery fee, when the service reports one.
    #[must_use]
    pub fn fee(&self) -> Option<Price> {
        self.prix_livraison.map(Price::eur)
    }
}

/// Creation payload for a delivery, sent by the kitchen once an order is ready.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDelivery {
    pub commande_id: OrderId,
    pub adresse_depart: String,
    pub adresse_arrivee: String,
    pub client_nom: String,
    pub client_telephone: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub prix_livraison: Decimal,
    pub distance_km: f64,
    pub temps_estime: u32,
    pub commentaires: String,
}

impl NewDelivery {
    /// Default pickup address.
    pub const DEFAULT_PICKUP: &'static str = "Restaurant ABC, Paris";

    /// A standard delivery for `order` with the restaurant's default terms.
    #[must_use]
    pub fn standard(order: OrderId, dropoff: &str, client_phone: &str) -> Self {
        Self {
            commande_id: order,
            adresse_depart: Self::DEFAULT_PICKUP.to_owned(),
            adresse_arrivee: dropoff.to_owned(),
            client_nom: "Client".to_owned(),
            client_telephone: client_phone.to_owned(),
            prix_livraison: Decimal::new(5, 0),
            distance_km: 2.5,
            temps_estime: 20,
            commentaires: "Livraison standard".to_owned(),
        }
    }
}

/// Status patch for a delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryUpdate {
    pub statut: DeliveryStatus,
    pub livreur_id: AgentId,
}
