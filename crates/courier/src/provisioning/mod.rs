//! Delivery agent provisioning.
//!
//! [`Provisioner::ensure_agent`] guarantees that the delivery service holds an
//! agent for a client and returns its id:
//!
//! 1. A cached agent id is validated with a direct read and trusted if it
//!    still exists. A 404 drops the cache entry.
//! 2. The client profile is fetched; without it there is nothing to provision.
//! 3. Existing agents are searched by email. A match is adopted, which also
//!    recovers from a creation whose response was lost.
//! 4. A new agent is created under the [`RetryPolicy`], with fresh credentials
//!    for every attempt.
//! 5. A 409 means another session won the race. The winner is found by email
//!    and adopted, or, with [`ConflictStrategy::Replace`], deleted and
//!    recreated once.
//!
//! The backend is authoritative. The cache only ever holds an id the backend
//! just confirmed, and it is written after the call that confirmed it returns.

mod retry;

pub use retry::{Backoff, RetryError, RetryPolicy, Verdict};

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use resto_core::{AgentId, ClientId, ClientProfile, DeliveryAgent, Email, NewDeliveryAgent};

use crate::config::ProvisioningConfig;
use crate::directory::{AgentDirectory, ClientDirectory};
use crate::gateway::GatewayError;
use crate::store::{KeyValueStore, StoreError, keys};

/// How a 409 on agent creation is resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConflictStrategy {
    /// Adopt the agent that already holds the email.
    #[default]
    Adopt,
    /// Delete the agent holding the email, then create again once.
    ///
    /// Destroys whatever the other session created. Only safe when the
    /// backend guarantees a single owner per email.
    Replace,
}

impl fmt::Display for ConflictStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Adopt => "adopt",
            Self::Replace => "replace",
        })
    }
}

impl FromStr for ConflictStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "adopt" => Ok(Self::Adopt),
            "replace" => Ok(Self::Replace),
            other => Err(format!("unknown conflict strategy '{other}' (expected adopt or replace)")),
        }
    }
}

/// Errors returned by [`Provisioner::ensure_agent`].
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// The client profile could not be read.
    #[error("Client profile {client_id} unavailable: {source}")]
    ProfileUnavailable {
        client_id: ClientId,
        #[source]
        source: GatewayError,
    },

    /// The backend kept failing transiently.
    #[error("Delivery service unavailable after {attempts} attempt(s): {source}")]
    TransientBackendError {
        attempts: u32,
        #[source]
        source: GatewayError,
    },

    /// Creation conflicted and no agent could be adopted or recreated.
    #[error("Could not resolve conflicting delivery agent for {email}: {source}")]
    ConflictUnresolved {
        email: Email,
        #[source]
        source: GatewayError,
    },

    /// The backend refused in a way that retrying will not fix.
    #[error("Delivery agent provisioning failed: {0}")]
    Unknown(#[source] GatewayError),

    /// The local agent id cache failed.
    #[error("Agent cache error: {0}")]
    Cache(#[from] StoreError),
}

/// Finds or creates the delivery agent of a client.
pub struct Provisioner {
    clients: Arc<dyn ClientDirectory>,
    agents: Arc<dyn AgentDirectory>,
    cache: Arc<dyn KeyValueStore>,
    policy: RetryPolicy,
    strategy: ConflictStrategy,
    vehicle: String,
}

impl fmt::Debug for Provisioner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provisioner")
            .field("policy", &self.policy)
            .field("strategy", &self.strategy)
            .field("vehicle", &self.vehicle)
            .finish_non_exhaustive()
    }
}

impl Provisioner {
    /// Create a provisioner with the default settings.
    #[must_use]
    pub fn new(
        clients: Arc<dyn ClientDirectory>,
        agents: Arc<dyn AgentDirectory>,
        cache: Arc<dyn KeyValueStore>,
    ) -> Self {
        let defaults = ProvisioningConfig::default();
        Self {
            clients,
            agents,
            cache,
            policy: defaults.retry,
            strategy: defaults.conflict_strategy,
            vehicle: defaults.vehicle,
        }
    }

    /// Apply loaded configuration.
    #[must_use]
    pub fn configured(self, config: &ProvisioningConfig) -> Self {
        self.with_retry_policy(config.retry)
            .with_conflict_strategy(config.conflict_strategy)
            .with_vehicle(config.vehicle.clone())
    }

    #[must_use]
    pub const fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub const fn with_conflict_strategy(mut self, strategy: ConflictStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    #[must_use]
    pub fn with_vehicle(mut self, vehicle: impl Into<String>) -> Self {
        self.vehicle = vehicle.into();
        self
    }

    /// Ensure the client has a delivery agent and return its id.
    ///
    /// Repeated calls for the same client converge on the same id, across
    /// sessions, as long as [`ConflictStrategy::Adopt`] is used.
    ///
    /// # Errors
    ///
    /// - [`ProvisionError::ProfileUnavailable`] if the profile cannot be read
    /// - [`ProvisionError::TransientBackendError`] if the delivery service
    ///   keeps failing transiently
    /// - [`ProvisionError::ConflictUnresolved`] if a conflict cannot be
    ///   resolved
    /// - [`ProvisionError::Unknown`] for any other backend refusal
    /// - [`ProvisionError::Cache`] if the local cache fails
    #[instrument(skip(self), fields(client_id = %client_id))]
    pub async fn ensure_agent(&self, client_id: &ClientId) -> Result<AgentId, ProvisionError> {
        if let Some(agent_id) = self.validate_cached().await? {
            debug!(agent_id = %agent_id, "Cached delivery agent is valid");
            return Ok(agent_id);
        }

        let profile = self.clients.client(client_id).await.map_err(|source| {
            ProvisionError::ProfileUnavailable {
                client_id: client_id.clone(),
                source,
            }
        })?;

        let existing = self.find_by_email(&profile.email).await.map_err(|source| {
            ProvisionError::TransientBackendError {
                attempts: 1,
                source,
            }
        })?;
        if let Some(agent) = existing {
            info!(agent_id = %agent.id, "Adopted existing delivery agent");
            return self.remember(agent.id);
        }

        let agent_id = self.create(&profile).await?;
        self.remember(agent_id)
    }

    /// Read the cached agent back from the backend.
    ///
    /// Returns `None` when there is nothing usable in the cache, after
    /// dropping an entry the backend no longer knows.
    async fn validate_cached(&self) -> Result<Option<AgentId>, ProvisionError> {
        let Some(raw) = self.cache.get(keys::AGENT_ID)? else {
            return Ok(None);
        };
        let Ok(agent_id) = AgentId::parse(&raw) else {
            warn!("Discarding malformed cached agent id");
            self.cache.remove(keys::AGENT_ID)?;
            return Ok(None);
        };

        match self.agents.agent(&agent_id).await {
            Ok(_) => Ok(Some(agent_id)),
            Err(e) if e.is_not_found() => {
                warn!(agent_id = %agent_id, "Cached delivery agent no longer exists");
                self.cache.remove(keys::AGENT_ID)?;
                Ok(None)
            }
            Err(source) => Err(ProvisionError::TransientBackendError {
                attempts: 1,
                source,
            }),
        }
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<DeliveryAgent>, GatewayError> {
        let agents = self.agents.agents().await?;
        debug!(count = agents.len(), "Listed delivery agents");
        Ok(agents.into_iter().find(|agent| email.matches(&agent.email)))
    }

    async fn create(&self, profile: &ClientProfile) -> Result<AgentId, ProvisionError> {
        let agents = &self.agents;
        let vehicle = self.vehicle.as_str();

        let outcome = self
            .policy
            .run(
                |attempt| {
                    let payload = NewDeliveryAgent::from_profile(profile, vehicle, &unique_suffix());
                    async move {
                        debug!(attempt, "Creating delivery agent");
                        agents.create_agent(&payload).await
                    }
                },
                |e: &GatewayError| {
                    if e.is_transient() {
                        Verdict::Retry
                    } else {
                        Verdict::Abort
                    }
                },
            )
            .await;

        match outcome {
            Ok(agent) => {
                info!(agent_id = %agent.id, "Created delivery agent");
                Ok(agent.id)
            }
            Err(RetryError { error, .. }) if error.is_conflict() => {
                self.resolve_conflict(profile, error).await
            }
            Err(RetryError {
                attempts,
                error,
                exhausted: true,
            }) => Err(ProvisionError::TransientBackendError {
                attempts,
                source: error,
            }),
            Err(RetryError { error, .. }) => Err(ProvisionError::Unknown(error)),
        }
    }

    async fn resolve_conflict(
        &self,
        profile: &ClientProfile,
        conflict: GatewayError,
    ) -> Result<AgentId, ProvisionError> {
        warn!(strategy = %self.strategy, "Delivery agent creation conflicted");
        let unresolved = |source: GatewayError| ProvisionError::ConflictUnresolved {
            email: profile.email.clone(),
            source,
        };

        let Some(winner) = self.find_by_email(&profile.email).await.map_err(unresolved)? else {
            // The conflict was on some other unique field, or the record vanished.
            return Err(unresolved(conflict));
        };

        match self.strategy {
            ConflictStrategy::Adopt => {
                info!(agent_id = %winner.id, "Adopted concurrently created delivery agent");
                Ok(winner.id)
            }
            ConflictStrategy::Replace => {
                warn!(agent_id = %winner.id, "Deleting conflicting delivery agent");
                match self.agents.delete_agent(&winner.id).await {
                    Ok(()) => {}
                    Err(e) if e.is_not_found() => {}
                    Err(e) => return Err(unresolved(e)),
                }
                tokio::time::sleep(self.policy.backoff().delay(1)).await;

                let payload =
                    NewDeliveryAgent::from_profile(profile, &self.vehicle, &unique_suffix());
                let agent = self.agents.create_agent(&payload).await.map_err(unresolved)?;
                info!(agent_id = %agent.id, "Recreated delivery agent");
                Ok(agent.id)
            }
        }
    }

    fn remember(&self, agent_id: AgentId) -> Result<AgentId, ProvisionError> {
        self.cache.set(keys::AGENT_ID, agent_id.as_str())?;
        Ok(agent_id)
    }
}

/// Suffix making credentials unique per creation attempt.
fn unique_suffix() -> String {
    format!(
        "{}_{:08x}",
        Utc::now().timestamp_millis(),
        Uuid::new_v4().as_fields().0
    )
}
