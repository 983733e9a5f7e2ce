//! CLI command implementations.

pub mod address;
pub mod auth;
pub mod bag;
pub mod orders;

use std::sync::Arc;

use thiserror::Error;

use shopsync_client::{ApiError, ClientConfig, ConfigError, HttpApiClient};
use shopsync_session::{Outcome, Session};

/// Errors that can occur running CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration is missing or invalid.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Backend request failed outright.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// No persisted identity; the user must login first.
    #[error("Not signed in. Run `shopsync login` first.")]
    NotSignedIn,

    /// The operation was rejected by the synchronizer or the backend.
    #[error("{0}")]
    OperationFailed(String),
}

/// Build a signed-out session from the environment.
pub fn session_from_env() -> Result<Session, CliError> {
    let config = ClientConfig::from_env()?;
    let api = Arc::new(HttpApiClient::new(&config)?);
    Ok(Session::new(api, config.identity_path))
}

/// Build a session and resume the persisted identity.
pub async fn signed_in_session() -> Result<Session, CliError> {
    let session = session_from_env()?;
    match session.restore().await {
        Some(user) => {
            tracing::debug!(user = %user.id, "restored session");
            Ok(session)
        }
        None => Err(CliError::NotSignedIn),
    }
}

/// Run a forced refresh and wait out any round already in flight.
///
/// Login/restore schedule their own initial refresh; a directly awaited
/// `refresh` is a no-op while that round runs, so poll until the state is
/// settled before reading it.
pub async fn refresh_settled(session: &Session) {
    loop {
        session.refresh(true).await;
        if !session.is_refreshing() {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
}

/// Unwrap a mutation outcome into a CLI result.
pub fn expect_success<T>(outcome: Outcome<T>) -> Result<T, CliError> {
    if outcome.success {
        if let Some(message) = &outcome.message {
            tracing::info!("{message}");
        }
        outcome
            .data
            .ok_or_else(|| CliError::OperationFailed("operation returned no data".to_owned()))
    } else {
        Err(CliError::OperationFailed(
            outcome
                .message
                .unwrap_or_else(|| "operation failed".to_owned()),
        ))
    }
}
