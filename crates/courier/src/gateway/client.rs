//! HTTP client for the restaurant API Gateway.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use resto_core::{
    AgentAvailability, AgentId, ClientId, ClientProfile, Delivery, DeliveryAgent, DeliveryId,
    DeliveryUpdate, NewDelivery, NewDeliveryAgent, Role,
};

use super::GatewayError;
use crate::config::GatewayConfig;
use crate::directory::{AgentDirectory, ClientDirectory, DeliveryBoard};
use crate::session::Session;

/// Gateway paths of the backend services.
pub mod paths {
    /// Login endpoint of the auth service.
    pub const LOGIN: &str = "/auth/login";
    /// Client collection of the client service.
    pub const CLIENTS: &str = "/client-api/clients";
    /// Delivery agent collection of the delivery service.
    pub const AGENTS: &str = "/delivery-api/livreurs";
    /// Delivery collection of the delivery service.
    pub const DELIVERIES: &str = "/delivery-api/livraisons";
}

/// Successful login payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Bearer token for subsequent calls.
    pub token: String,
    /// Role granted to the user.
    pub role: Role,
    /// Client identity of the user, when the user is a client of the platform.
    #[serde(default)]
    pub client_id: Option<ClientId>,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct AgentStatusPatch {
    statut: AgentAvailability,
}

/// API Gateway client.
///
/// Cheap to clone. The bearer token, when present, is fixed at construction
/// from an explicit [`Session`]; a new client is built after each login.
#[derive(Clone)]
pub struct GatewayClient {
    inner: Arc<GatewayClientInner>,
}

struct GatewayClientInner {
    client: reqwest::Client,
    base_url: String,
}

impl std::fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayClient")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

impl GatewayClient {
    /// Create a client without credentials (used for login).
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn anonymous(config: &GatewayConfig) -> Result<Self, GatewayError> {
        Self::build(config, None)
    }

    /// Create a client sending the session's bearer token on every request.
    ///
    /// # Errors
    ///
    /// Returns error if the token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn authenticated(config: &GatewayConfig, session: &Session) -> Result<Self, GatewayError> {
        Self::build(config, Some(session.token()))
    }

    fn build(config: &GatewayConfig, token: Option<&SecretString>) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();

        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|e| GatewayError::InvalidRequest(format!("Invalid token format: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(GatewayClientInner {
                client,
                base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
            }),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    // =========================================================================
    // Auth service
    // =========================================================================

    /// Exchange credentials for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Unauthorized`] on rejected credentials, or any
    /// other gateway error.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<LoginResponse, GatewayError> {
        let request = LoginRequest {
            username,
            password: password.expose_secret(),
        };
        let response = self
            .inner
            .client
            .post(self.url(paths::LOGIN))
            .json(&request)
            .send()
            .await?;

        handle_json(response).await
    }

    // =========================================================================
    // Client service
    // =========================================================================

    /// Fetch a client profile.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] for an unknown client.
    #[instrument(skip(self), fields(client_id = %client_id))]
    pub async fn client_profile(&self, client_id: &ClientId) -> Result<ClientProfile, GatewayError> {
        self.get_json(&format!("{}/{client_id}", paths::CLIENTS)).await
    }

    // =========================================================================
    // Delivery service: agents
    // =========================================================================

    /// Fetch one delivery agent.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] for an unknown agent.
    #[instrument(skip(self), fields(agent_id = %agent_id))]
    pub async fn agent(&self, agent_id: &AgentId) -> Result<DeliveryAgent, GatewayError> {
        self.get_json(&format!("{}/{agent_id}", paths::AGENTS)).await
    }

    /// List every delivery agent.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn agents(&self) -> Result<Vec<DeliveryAgent>, GatewayError> {
        self.get_json(paths::AGENTS).await
    }

    /// Create a delivery agent.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Conflict`] when an agent with the same email
    /// (or credential) already exists.
    #[instrument(skip(self, agent), fields(email = %agent.email))]
    pub async fn create_agent(&self, agent: &NewDeliveryAgent) -> Result<DeliveryAgent, GatewayError> {
        let response = self
            .inner
            .client
            .post(self.url(paths::AGENTS))
            .json(agent)
            .send()
            .await?;

        handle_json(response).await
    }

    /// Delete a delivery agent.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] if the agent is already gone.
    #[instrument(skip(self), fields(agent_id = %agent_id))]
    pub async fn delete_agent(&self, agent_id: &AgentId) -> Result<(), GatewayError> {
        let response = self
            .inner
            .client
            .delete(self.url(&format!("{}/{agent_id}", paths::AGENTS)))
            .send()
            .await?;

        handle_empty(response).await
    }

    /// Update a delivery agent's availability.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self), fields(agent_id = %agent_id))]
    pub async fn set_agent_status(
        &self,
        agent_id: &AgentId,
        availability: AgentAvailability,
    ) -> Result<(), GatewayError> {
        let response = self
            .inner
            .client
            .patch(self.url(&format!("{}/{agent_id}", paths::AGENTS)))
            .json(&AgentStatusPatch {
                statut: availability,
            })
            .send()
            .await?;

        handle_empty(response).await
    }

    // =========================================================================
    // Delivery service: deliveries
    // =========================================================================

    /// List deliveries assigned to an agent.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self), fields(agent_id = %agent_id))]
    pub async fn deliveries_for_agent(&self, agent_id: &AgentId) -> Result<Vec<Delivery>, GatewayError> {
        let mut url = reqwest::Url::parse(&self.url(paths::DELIVERIES))
            .map_err(|e| GatewayError::InvalidRequest(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("livreurId", agent_id.as_str());

        let response = self.inner.client.get(url).send().await?;
        handle_json(response).await
    }

    /// Patch a delivery's status.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, update), fields(delivery_id = %delivery_id, statut = %update.statut))]
    pub async fn update_delivery(
        &self,
        delivery_id: &DeliveryId,
        update: &DeliveryUpdate,
    ) -> Result<(), GatewayError> {
        let response = self
            .inner
            .client
            .patch(self.url(&format!("{}/{delivery_id}", paths::DELIVERIES)))
            .json(update)
            .send()
            .await?;

        handle_empty(response).await
    }

    /// Create a delivery for a ready order.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Api`] with status 400 when the order already
    /// has a delivery.
    #[instrument(skip(self, delivery), fields(order_id = %delivery.commande_id))]
    pub async fn create_delivery(&self, delivery: &NewDelivery) -> Result<Delivery, GatewayError> {
        let response = self
            .inner
            .client
            .post(self.url(paths::DELIVERIES))
            .json(delivery)
            .send()
            .await?;

        handle_json(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        let response = self.inner.client.get(self.url(path)).send().await?;
        handle_json(response).await
    }
}

/// Decode a successful JSON response, or map the error status.
async fn handle_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, GatewayError> {
    let status = response.status();
    if !status.is_success() {
        return Err(handle_error_status(status, response).await);
    }

    let body = response.text().await?;
    serde_json::from_str(&body)
        .map_err(|e| GatewayError::Parse(format!("Failed to parse response: {e}")))
}

/// Accept any successful response, ignoring its body.
async fn handle_empty(response: reqwest::Response) -> Result<(), GatewayError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(handle_error_status(status, response).await)
    }
}

async fn handle_error_status(status: reqwest::StatusCode, response: reqwest::Response) -> GatewayError {
    let message = response.text().await.unwrap_or_default();
    debug!(status = status.as_u16(), %message, "Gateway returned an error status");
    GatewayError::from_status(status, extract_message(&message))
}

/// Pull the `message` field out of a JSON error body, falling back to the raw body.
fn extract_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("message")?.as_str().map(str::to_owned))
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl ClientDirectory for GatewayClient {
    async fn client(&self, client_id: &ClientId) -> Result<ClientProfile, GatewayError> {
        self.client_profile(client_id).await
    }
}

#[async_trait]
impl AgentDirectory for GatewayClient {
    async fn agent(&self, agent_id: &AgentId) -> Result<DeliveryAgent, GatewayError> {
        Self::agent(self, agent_id).await
    }

    async fn agents(&self) -> Result<Vec<DeliveryAgent>, GatewayError> {
        Self::agents(self).await
    }

    async fn create_agent(&self, agent: &NewDeliveryAgent) -> Result<DeliveryAgent, GatewayError> {
        Self::create_agent(self, agent).await
    }

    async fn delete_agent(&self, agent_id: &AgentId) -> Result<(), GatewayError> {
        Self::delete_agent(self, agent_id).await
    }
}

#[async_trait]
impl DeliveryBoard for GatewayClient {
    async fn deliveries_for_agent(&self, agent_id: &AgentId) -> Result<Vec<Delivery>, GatewayError> {
        Self::deliveries_for_agent(self, agent_id).await
    }

    async fn update_delivery(
        &self,
        delivery_id: &DeliveryId,
        update: &DeliveryUpdate,
    ) -> Result<(), GatewayError> {
        Self::update_delivery(self, delivery_id, update).await
    }

    async fn create_delivery(&self, delivery: &NewDelivery) -> Result<Delivery, GatewayError> {
        Self::create_delivery(self, delivery).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_message_from_json_body() {
        let body = r#"{"status": 409, "message": "Email déjà utilisé"}"#;
        assert_eq!(extract_message(body), "Email déjà utilisé");
    }

    #[test]
    fn test_extract_message_falls_back_to_raw_body() {
        assert_eq!(extract_message("  upstream timeout \n"), "upstream timeout");
        assert_eq!(extract_message(r#"{"error": "x"}"#), r#"{"error": "x"}"#);
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let config = GatewayConfig::new(url::Url::parse("http://gateway:8000/").expect("valid url"));
        let client = GatewayClient::anonymous(&config).expect("client builds");
        assert_eq!(
            client.url(paths::AGENTS),
            "http://gateway:8000/delivery-api/livreurs"
        );
    }
}
