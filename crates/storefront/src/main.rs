use rust_decimal::Decimal;
use storefront::config::StorefrontConfig;
use storefront::lifecycle::{setup_tracing, Storefront};
use storefront::model::{AuthSession, OrderStatus, Product};
use tracing::{error, info, Instrument};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_tracing();

    let config = StorefrontConfig::from_env()?;
    info!(?config, "Starting storefront");
    let storefront = Storefront::start(config);

    // A customer fills a cart as a guest, signs up and checks out
    let customer = storefront.open_session();
    let mut notices = customer.notifier.subscribe();
    let notice_log = tokio::spawn(async move {
        while let Ok(notice) = notices.recv().await {
            info!(%notice, "Customer notice");
        }
    });

    customer.sign_out().await?;
    customer
        .cart
        .add_item(Product::new("mug", "Enamel Mug", Decimal::new(1250, 2)))
        .await?;

    customer
        .sign_up(AuthSession::new("ann", "ann@example.com").with_display_name("Ann"))
        .await?;
    customer
        .cart
        .add_item(Product::new("tee", "Logo Tee", Decimal::from(20)))
        .await?;
    customer
        .cart
        .add_item(Product::new("tee", "Logo Tee", Decimal::from(20)))
        .await?;
    info!(
        total = %customer.cart.total(),
        items = customer.cart.item_count(),
        "Cart ready"
    );

    let span = tracing::info_span!("checkout");
    let order_id = async { customer.checkout().await }
        .instrument(span)
        .await?;

    // The owner signs in elsewhere and ships it
    let back_office = storefront.open_session();
    back_office
        .sign_up(AuthSession::new("boss", "boss@example.com"))
        .await?;
    back_office.identity.grant_owner("boss@example.com").await?;
    back_office
        .sign_in(AuthSession::new("boss", "boss@example.com"))
        .await?;
    info!(decision = ?back_office.gate.enter("/admin/orders"), "Back office gate");

    let mut feed = back_office.orders.subscribe_orders();
    if let Some(orders) = feed.next().await {
        info!(count = orders.len(), "Orders visible to the back office");
    }

    let span = tracing::info_span!("fulfilment");
    let shipped = async {
        back_office
            .orders
            .update_status(&order_id, OrderStatus::Processing)
            .await?;
        back_office
            .orders
            .update_status(&order_id, OrderStatus::Shipped)
            .await
    }
    .instrument(span)
    .await;
    match shipped {
        Ok(()) => info!(%order_id, "Order shipped"),
        Err(e) => error!(%order_id, error = %e, "Fulfilment failed"),
    }
    feed.cancel();

    customer.shutdown().await?;
    back_office.shutdown().await?;
    storefront.shutdown().await?;
    let _ = notice_log.await;

    info!("Storefront stopped");
    Ok(())
}
