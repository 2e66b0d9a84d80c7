//! CLI command implementations.

pub mod courier;
pub mod deliveries;
pub mod session;

use std::sync::Arc;

use thiserror::Error;

use resto_core::{AgentId, ParseIdError, Role};
use resto_courier::config::ProvisioningConfig;
use resto_courier::{
    ConfigError, CourierConfig, DeliveryError, FileStore, GatewayClient, GatewayError,
    KeyValueStore, ProvisionError, Provisioner, Session, SessionError, SessionManager,
};

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Provision(#[from] ProvisionError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error("Invalid id: {0}")]
    InvalidId(#[from] ParseIdError),
}

/// State shared by every command: configuration and the local store.
pub struct Context {
    config: CourierConfig,
    store: Arc<FileStore>,
    sessions: SessionManager,
}

impl Context {
    /// Load configuration from the environment and open the state file.
    pub fn load() -> Result<Self, CliError> {
        let config = CourierConfig::from_env()?;
        let store = Arc::new(FileStore::open(config.state_file.clone()));
        let sessions = SessionManager::new(store.clone());
        Ok(Self {
            config,
            store,
            sessions,
        })
    }

    pub const fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// A client without credentials, for login.
    pub fn anonymous_gateway(&self) -> Result<GatewayClient, CliError> {
        Ok(GatewayClient::anonymous(&self.config.gateway)?)
    }

    /// The stored session, checked for `role`, and a gateway client using it.
    pub fn authenticated(&self, role: Role) -> Result<(Session, GatewayClient), CliError> {
        let session = self.sessions.current()?;
        session.require_role(role)?;
        let gateway = GatewayClient::authenticated(&self.config.gateway, &session)?;
        Ok((session, gateway))
    }

    pub const fn provisioning(&self) -> &ProvisioningConfig {
        &self.config.provisioning
    }

    /// Resolve the courier's agent id, provisioning it if needed.
    pub async fn courier_agent(&self) -> Result<(GatewayClient, AgentId), CliError> {
        let (session, gateway) = self.authenticated(Role::Livreur)?;
        let client_id = session.require_client_id()?;

        let gateway_arc = Arc::new(gateway.clone());
        let cache: Arc<dyn KeyValueStore> = self.store.clone();
        let provisioner =
            Provisioner::new(gateway_arc.clone(), gateway_arc, cache).configured(self.provisioning());

        let agent_id = provisioner.ensure_agent(client_id).await?;
        Ok((gateway, agent_id))
    }
}
