//! Delivery agent (livreur) records.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::{AgentId, ClientProfile, Email};

/// A delivery agent as returned by the delivery service.
///
/// Only `id` and `email` are relied upon; every other field is informative and
/// tolerated when missing so that one malformed record never hides the rest
/// of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryAgent {
    pub id: AgentId,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub nom: Option<String>,
    #[serde(default)]
    pub prenom: Option<String>,
    #[serde(default)]
    pub telephone: Option<String>,
    #[serde(default)]
    pub vehicule: Option<String>,
    #[serde(default, rename = "numeroLicence")]
    pub numero_licence: Option<String>,
    #[serde(default)]
    pub statut: Option<String>,
}

/// Creation payload for a delivery agent.
///
/// Built from a [`ClientProfile`]; the credential and licence number carry a
/// caller-supplied suffix that must be unique per creation attempt, because
/// the delivery service also enforces uniqueness on those fields.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDeliveryAgent {
    pub nom: String,
    pub prenom: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telephone: Option<String>,
    pub email: Email,
    pub mot_de_passe: String,
    pub vehicule: String,
    pub numero_licence: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adresse: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ville: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_postal: Option<String>,
}

impl NewDeliveryAgent {
    /// Build the creation payload for `profile`.
    #[must_use]
    pub fn from_profile(profile: &ClientProfile, vehicle: &str, unique_suffix: &str) -> Self {
        Self {
            nom: profile.first_name.clone(),
            prenom: profile.last_name.clone(),
            telephone: profile.phone.clone(),
            email: profile.email.clone(),
            mot_de_passe: format!("pwd_{unique_suffix}"),
            vehicule: vehicle.to_owned(),
            numero_licence: format!("LIC_{unique_suffix}"),
            adresse: profile.address.clone(),
            ville: profile.city.clone(),
            code_postal: profile.postal_code.clone(),
        }
    }
}

impl fmt::Debug for NewDeliveryAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewDeliveryAgent")
            .field("nom", &self.nom)
            .field("prenom", &self.prenom)
            .field("email", &self.email)
            .field("mot_de_passe", &"[REDACTED]")
            .field("vehicule", &self.vehicule)
            .field("numero_licence", &self.numero_licence)
            .finish_non_exhaustive()
    }
}
