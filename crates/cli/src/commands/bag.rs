//! Bag and coupon commands.

use shopsync_core::BagItemId;

use super::{CliError, expect_success, refresh_settled, signed_in_session};

/// Show bag lines and checkout totals.
pub async fn show() -> Result<(), CliError> {
    let session = signed_in_session().await?;
    refresh_settled(&session).await;

    let items = session.bag_items();
    if items.is_empty() {
        tracing::info!("Bag is empty");
        return Ok(());
    }

    let mut lines: Vec<_> = items.values().collect();
    lines.sort_by(|a, b| a.product.name.cmp(&b.product.name));
    for item in lines {
        tracing::info!(
            "{}  {} x{}  @ {}  (line id {})",
            item.product.brand,
            item.product.name,
            item.quantity,
            item.price_when_added,
            item.id
        );
    }

    let totals = session.bag_checkout_totals();
    tracing::info!(
        "subtotal {}  shipping {}  tax {}  coupon -{}  total {}",
        totals.subtotal,
        totals.shipping,
        totals.tax,
        totals.coupon_discount,
        totals.total
    );
    if let Some(coupon) = session.applied_coupon() {
        tracing::info!(
            "coupon applied ({}): -{}",
            coupon.code.as_deref().unwrap_or("code unknown"),
            coupon.discount_amount
        );
    }
    Ok(())
}

/// Change a bag line's quantity.
pub async fn set_quantity(item: &str, quantity: u32) -> Result<(), CliError> {
    let session = signed_in_session().await?;
    refresh_settled(&session).await;
    expect_success(
        session
            .set_bag_quantity(&BagItemId::new(item), quantity)
            .await,
    )?;
    tracing::info!("Quantity updated");
    Ok(())
}

/// Remove a bag line.
pub async fn remove(item: &str) -> Result<(), CliError> {
    let session = signed_in_session().await?;
    refresh_settled(&session).await;
    expect_success(session.remove_bag_item(&BagItemId::new(item)).await)?;
    tracing::info!("Item removed");
    Ok(())
}

/// Apply a coupon code.
pub async fn apply_coupon(code: &str) -> Result<(), CliError> {
    let session = signed_in_session().await?;
    refresh_settled(&session).await;
    let coupon = expect_success(session.apply_coupon(code).await)?;
    tracing::info!(
        "Coupon applied: -{} (total {} -> {})",
        coupon.discount_amount,
        coupon.cart_total,
        coupon.new_total
    );
    Ok(())
}

/// Remove the applied coupon.
pub async fn remove_coupon() -> Result<(), CliError> {
    let session = signed_in_session().await?;
    refresh_settled(&session).await;
    expect_success(session.remove_coupon().await)?;
    Ok(())
}
