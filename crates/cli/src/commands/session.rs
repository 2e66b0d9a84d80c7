//! Session commands.
//!
//! # Usage
//!
//! ```bash
//! resto login -u jean -p secret
//! resto whoami
//! resto logout
//! ```

use secrecy::SecretString;

use super::{CliError, Context};

/// Log in and store the session.
pub async fn login(context: &Context, username: &str, password: SecretString) -> Result<(), CliError> {
    let gateway = context.anonymous_gateway()?;
    let session = context.sessions().login(&gateway, username, password).await?;

    tracing::info!(
        "Logged in as {} ({})",
        session.username(),
        session.role()
    );
    if session.client_id().is_none() {
        tracing::warn!("No client id in this session; courier commands will not work");
    }
    Ok(())
}

/// Forget the stored session.
pub fn logout(context: &Context) -> Result<(), CliError> {
    context.sessions().logout()?;
    Ok(())
}

/// Show the stored session.
pub fn whoami(context: &Context) -> Result<(), CliError> {
    let session = context.sessions().current()?;
    tracing::info!("User:   {}", session.username());
    tracing::info!("Role:   {}", session.role());
    if let Some(client_id) = session.client_id() {
        tracing::info!("Client: {}", client_id);
    }
    Ok(())
}
