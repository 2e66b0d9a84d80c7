//! HTTP-level tests for the Resto courier client.
//!
//! Every test starts a `mockito` server standing in for the API Gateway and
//! drives the real [`GatewayClient`] against it, so request paths, bodies and
//! headers are checked as they go over the wire.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p resto-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `provisioning` - Agent provisioning against a mocked delivery service
//! - `deliveries` - Delivery workflow requests
//! - `session` - Login, persistence and logout

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use serde_json::{Value, json};

use resto_core::{ClientId, Role};
use resto_courier::config::GatewayConfig;
use resto_courier::{
    Backoff, GatewayClient, MemoryStore, Provisioner, RetryPolicy, Session,
};

/// Bearer token used by [`courier_session`].
pub const TOKEN: &str = "tok-123";

/// Gateway settings pointing at a mock server.
#[must_use]
pub fn gateway_config(server_url: &str) -> GatewayConfig {
    GatewayConfig {
        base_url: url::Url::parse(server_url).expect("mock server URL is valid"),
        timeout: Duration::from_secs(2),
    }
}

/// A logged-in courier for client `client_id`.
#[must_use]
pub fn courier_session(client_id: &str) -> Session {
    Session::new(
        "jean".to_string(),
        Role::Livreur,
        SecretString::from(TOKEN),
        Some(ClientId::parse(client_id).expect("valid client id")),
    )
}

/// Gateway client authenticated as [`courier_session`].
#[must_use]
pub fn courier_gateway(server_url: &str) -> GatewayClient {
    GatewayClient::authenticated(&gateway_config(server_url), &courier_session("42"))
        .expect("client builds")
}

/// Retry policy without delays.
#[must_use]
pub fn instant_retry() -> RetryPolicy {
    RetryPolicy::new(3, Backoff::Fixed(Duration::ZERO))
}

/// Provisioner over `gateway` with an empty in-memory cache.
#[must_use]
pub fn provisioner(gateway: &GatewayClient, cache: Arc<MemoryStore>) -> Provisioner {
    let gateway = Arc::new(gateway.clone());
    Provisioner::new(gateway.clone(), gateway, cache).with_retry_policy(instant_retry())
}

/// Client service payload.
#[must_use]
pub fn client_json(id: u64, email: &str) -> Value {
    json!({
        "id": id,
        "firstName": "Jean",
        "lastName": "Dupont",
        "phone": "0601020304",
        "email": email,
        "address": "1 rue de la Paix",
        "city": "Paris",
        "postalCode": "75002"
    })
}

/// Delivery service agent payload.
#[must_use]
pub fn agent_json(id: &str, email: &str) -> Value {
    json!({
        "id": id,
        "nom": "Jean",
        "prenom": "Dupont",
        "email": email,
        "vehicule": "Scooter",
        "statut": "DISPONIBLE"
    })
}
