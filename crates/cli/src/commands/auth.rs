//! Login, logout, and identity commands.

use super::{CliError, expect_success, refresh_settled, session_from_env, signed_in_session};

/// Sign in and persist the identity for later commands.
pub async fn login(email: &str, password: &str) -> Result<(), CliError> {
    let session = session_from_env()?;
    let user = expect_success(session.login(email, password).await)?;
    tracing::info!("Signed in as {} <{}>", user.name, user.email);

    // Wait for the initial refresh so the first status line is accurate
    refresh_settled(&session).await;
    tracing::info!(
        "{} bag item(s), {} wishlist item(s), {} order(s)",
        session.total_bag_items(),
        session.total_wishlist_items(),
        session.total_orders()
    );
    Ok(())
}

/// Sign out and clear the persisted identity.
pub async fn logout() -> Result<(), CliError> {
    let session = session_from_env()?;
    session.logout().await;
    tracing::info!("Signed out");
    Ok(())
}

/// Print the signed-in user.
pub async fn whoami() -> Result<(), CliError> {
    let session = signed_in_session().await?;
    let user = session.user().ok_or(CliError::NotSignedIn)?;
    tracing::info!("{} <{}> (id {})", user.name, user.email, user.id);
    Ok(())
}
