//! Address commands.

use shopsync_core::AddressId;

use super::{CliError, expect_success, refresh_settled, signed_in_session};

/// List saved addresses.
pub async fn list() -> Result<(), CliError> {
    let session = signed_in_session().await?;
    refresh_settled(&session).await;

    let addresses = session.addresses();
    if addresses.is_empty() {
        tracing::info!("No saved addresses");
        return Ok(());
    }

    let default_id = session.default_address_id();
    let mut entries: Vec<_> = addresses.values().collect();
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    for address in entries {
        let marker = if Some(&address.id) == default_id.as_ref() {
            " [default]"
        } else {
            ""
        };
        tracing::info!(
            "{}{}  {}, {}, {} {}  (id {})",
            address.name,
            marker,
            address.address_line1,
            address.city,
            address.state,
            address.pincode,
            address.id
        );
    }
    Ok(())
}

/// Mark an address as default.
pub async fn set_default(id: &str) -> Result<(), CliError> {
    let session = signed_in_session().await?;
    refresh_settled(&session).await;
    expect_success(session.set_default_address(&AddressId::new(id)).await)?;
    Ok(())
}

/// Delete an address.
pub async fn delete(id: &str) -> Result<(), CliError> {
    let session = signed_in_session().await?;
    refresh_settled(&session).await;
    expect_success(session.delete_address(&AddressId::new(id)).await)?;
    Ok(())
}
