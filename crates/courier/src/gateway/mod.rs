//! API Gateway client.
//!
//! # Architecture
//!
//! - Every backend service is reached through the gateway, under its own
//!   path prefix (`/auth`, `/client-api`, `/delivery-api`)
//! - The gateway is the source of truth; the only local state is the cached
//!   agent id and the session, both kept in the [`store`](crate::store)
//! - A fixed request timeout is applied by the HTTP client; timeouts surface
//!   as transient [`GatewayError::Http`] errors
//!
//! # Example
//!
//! ```rust,ignore
//! use resto_courier::{GatewayClient, CourierConfig};
//!
//! let config = CourierConfig::from_env()?;
//! let gateway = GatewayClient::authenticated(&config.gateway, &session)?;
//!
//! let profile = gateway.client_profile(&client_id).await?;
//! let agents = gateway.agents().await?;
//! ```

mod client;

pub use client::{GatewayClient, LoginResponse, paths};

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when calling the API Gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP transport failed (connection, timeout, body decoding).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Resource not found (404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Uniqueness constraint violated (409).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Missing, expired or insufficient bearer token (401/403).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Rate limited by the gateway (429).
    #[error("Rate limited")]
    RateLimited,

    /// Backend failure (5xx).
    #[error("Server error: {status} - {message}")]
    Server { status: u16, message: String },

    /// Any other non-success response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body did not match the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The request could not be built (bad header or URL).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl GatewayError {
    /// Map a non-success HTTP status and its body to an error.
    #[must_use]
    pub fn from_status(status: StatusCode, message: String) -> Self {
        match status {
            StatusCode::NOT_FOUND => Self::NotFound(message),
            StatusCode::CONFLICT => Self::Conflict(message),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Unauthorized(message),
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited,
            s if s.is_server_error() => Self::Server {
                status: s.as_u16(),
                message,
            },
            s => Self::Api {
                status: s.as_u16(),
                message,
            },
        }
    }

    /// Whether retrying the same request later may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::RateLimited | Self::Server { .. } => true,
            _ => false,
        }
    }

    /// Whether the backend reported the resource as missing.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Whether the backend reported a uniqueness conflict.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// HTTP status carried by the error, when the gateway answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::NotFound(_) => Some(404),
            Self::Conflict(_) => Some(409),
            Self::Unauthorized(_) => Some(401),
            Self::RateLimited => Some(429),
            Self::Server { status, .. } | Self::Api { status, .. } => Some(*status),
            Self::Parse(_) | Self::InvalidRequest(_) => None,
        }
    }
}
