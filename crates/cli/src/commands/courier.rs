//! Courier agent commands.
//!
//! # Usage
//!
//! ```bash
//! # Find or create the delivery agent of the logged-in client
//! resto courier init
//!
//! # Mark the agent as available
//! resto courier status disponible
//! ```

use resto_core::{AgentAvailability, AgentId};

use super::{CliError, Context};

/// Ensure the logged-in courier has a delivery agent.
pub async fn init(context: &Context) -> Result<AgentId, CliError> {
    let (_, agent_id) = context.courier_agent().await?;
    tracing::info!("Delivery agent ready: {}", agent_id);
    Ok(agent_id)
}

/// Update the courier's availability.
pub async fn set_status(context: &Context, availability: AgentAvailability) -> Result<(), CliError> {
    let (gateway, agent_id) = context.courier_agent().await?;
    gateway.set_agent_status(&agent_id, availability).await?;
    tracing::info!("Agent {} is now {}", agent_id, availability);
    Ok(())
}
