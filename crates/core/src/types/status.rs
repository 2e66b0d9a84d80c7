//! Status enums and roles.
//!
//! Wire values are the ones used by the delivery service (`SCREAMING_SNAKE_CASE`
//! French labels) and by the auth service (lowercase role names).

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle of a delivery.
///
/// ```text
/// EN_ATTENTE -> EN_ROUTE_RESTAURANT -> RECUPEREE -> EN_ROUTE_CLIENT -> LIVREE
///      \______________\___________________\______________\________-> ANNULEE
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    /// Waiting for a courier to pick it up.
    #[default]
    EnAttente,
    /// Courier is heading to the restaurant.
    EnRouteRestaurant,
    /// Order collected at the restaurant.
    Recuperee,
    /// Courier is heading to the client.
    EnRouteClient,
    /// Delivered.
    Livree,
    /// Cancelled.
    Annulee,
}

impl DeliveryStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::EnAttente,
        Self::EnRouteRestaurant,
        Self::Recuperee,
        Self::EnRouteClient,
        Self::Livree,
        Self::Annulee,
    ];

    /// The single forward step from this status, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::EnAttente => Some(Self::EnRouteRestaurant),
            Self::EnRouteRestaurant => Some(Self::Recuperee),
            Self::Recuperee => Some(Self::EnRouteClient),
            Self::EnRouteClient => Some(Self::Livree),
            Self::Livree | Self::Annulee => None,
        }
    }

    /// Whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Livree | Self::Annulee)
    }

    /// Whether moving from `self` to `target` is a legal transition.
    #[must_use]
    pub fn can_transition_to(self, target: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        target == Self::Annulee || self.next() == Some(target)
    }

    /// Wire label, as sent to the delivery service.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EnAttente => "EN_ATTENTE",
            Self::EnRouteRestaurant => "EN_ROUTE_RESTAURANT",
            Self::Recuperee => "RECUPEREE",
            Self::EnRouteClient => "EN_ROUTE_CLIENT",
            Self::Livree => "LIVREE",
            Self::Annulee => "ANNULEE",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::EnAttente => "En attente",
            Self::EnRouteRestaurant => "En route restaurant",
            Self::Recuperee => "Récupérée",
            Self::EnRouteClient => "En route client",
            Self::Livree => "Livrée",
            Self::Annulee => "Annulée",
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == upper)
            .ok_or_else(|| format!("invalid delivery status: {s}"))
    }
}

/// Availability of a delivery agent, patched on the agent record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentAvailability {
    Disponible,
    EnLivraison,
    Indisponible,
}

impl fmt::Display for AgentAvailability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disponible => write!(f, "disponible"),
            Self::EnLivraison => write!(f, "en_livraison"),
            Self::Indisponible => write!(f, "indisponible"),
        }
    }
}

impl FromStr for AgentAvailability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disponible" => Ok(Self::Disponible),
            "en_livraison" => Ok(Self::EnLivraison),
            "indisponible" => Ok(Self::Indisponible),
            _ => Err(format!("invalid agent availability: {s}")),
        }
    }
}

/// Role granted by the auth service at login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Orders meals.
    #[serde(alias = "CLIENT")]
    Client,
    /// Prepares orders and dispatches deliveries.
    #[serde(alias = "CHEF")]
    Chef,
    /// Delivers orders.
    #[serde(alias = "LIVREUR")]
    Livreur,
    /// Manages client accounts.
    #[serde(alias = "ADMIN")]
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Client => write!(f, "client"),
            Self::Chef => write!(f, "chef"),
            Self::Livreur => write!(f, "livreur"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "client" => Ok(Self::Client),
            "chef" => Ok(Self::Chef),
            "livreur" => Ok(Self::Livreur),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}
