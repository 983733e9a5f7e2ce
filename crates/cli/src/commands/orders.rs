//! Order commands.

use shopsync_core::OrderId;

use super::{CliError, expect_success, signed_in_session};

/// List orders, most recent first.
pub async fn list() -> Result<(), CliError> {
    let session = signed_in_session().await?;
    let orders = expect_success(session.sync_orders().await)?;

    if orders.is_empty() {
        tracing::info!("No orders yet");
        return Ok(());
    }

    for order in &orders {
        tracing::info!(
            "{}  {:?}  {} item(s)  total {}  placed {}  (id {})",
            order.order_id,
            order.status,
            order.item_count(),
            order.total(),
            order.order_date.format("%Y-%m-%d"),
            order.id
        );
    }
    Ok(())
}

/// Show one order in detail.
pub async fn show(id: &str) -> Result<(), CliError> {
    let session = signed_in_session().await?;
    let order = expect_success(session.fetch_order(&OrderId::new(id)).await)?;

    tracing::info!(
        "{}  {:?}  placed {}",
        order.order_id,
        order.status,
        order.order_date.format("%Y-%m-%d %H:%M")
    );
    for item in &order.items {
        tracing::info!(
            "  {} {}  x{}  @ {}",
            item.product_snapshot.brand,
            item.product_snapshot.name,
            item.quantity,
            item.price
        );
    }
    tracing::info!(
        "  subtotal {}  shipping {}  tax {}  discount -{}  total {}",
        order.pricing.subtotal,
        order.pricing.shipping,
        order.pricing.tax,
        order.pricing.discount,
        order.pricing.total
    );
    tracing::info!(
        "  ship to: {}, {}, {} {}",
        order.shipping_address.name,
        order.shipping_address.city,
        order.shipping_address.state,
        order.shipping_address.pincode
    );
    if let Some(expected) = order.expected_delivery_date {
        tracing::info!("  expected delivery {}", expected.format("%Y-%m-%d"));
    }
    Ok(())
}
