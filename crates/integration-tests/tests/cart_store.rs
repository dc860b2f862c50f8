//! Cart store behavior against a mock gateway: optimistic application,
//! rollback on failure, and the derived totals.

use std::sync::Arc;

use rust_decimal::Decimal;

use house_client::error::ClientError;
use house_client::stores::CartStore;
use house_core::{ProductId, UserId};
use house_integration_tests::{MockGateway, product};

fn store() -> (Arc<MockGateway>, CartStore<MockGateway>) {
    let gateway = Arc::new(MockGateway::new());
    let cart = CartStore::new(Arc::clone(&gateway), UserId::new("user-1"));
    (gateway, cart)
}

#[tokio::test]
async fn test_add_merges_duplicate_products_by_summing() {
    let (gateway, cart) = store();
    let mug = product("mug", 50_000);
    gateway.register(mug.clone());

    cart.add_to_cart(mug.clone(), 1).await.unwrap();
    cart.add_to_cart(mug, 2).await.unwrap();

    assert_eq!(cart.len(), 1);
    assert_eq!(cart.item_count(), 3);
    assert_eq!(
        gateway.remote_cart_quantity(&ProductId::new("mug")),
        Some(3)
    );
}

#[tokio::test]
async fn test_zero_quantity_add_is_rejected() {
    let (gateway, cart) = store();
    let mug = product("mug", 50_000);
    gateway.register(mug.clone());

    let err = cart.add_to_cart(mug, 0).await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidQuantity(0)));
    assert!(cart.is_empty());
    // Rejected before any gateway round trip
    assert_eq!(gateway.call_count(), 0);
}

#[tokio::test]
async fn test_total_is_linear_in_quantity() {
    let (gateway, cart) = store();
    let mug = product("mug", 50_000);
    let vase = product("vase", 75_000);
    gateway.register(mug.clone());
    gateway.register(vase.clone());

    cart.add_to_cart(mug, 2).await.unwrap();
    cart.add_to_cart(vase, 1).await.unwrap();

    assert_eq!(cart.get_total(), Decimal::from(175_000));
    assert_eq!(cart.item_count(), 3);
}

#[tokio::test]
async fn test_failed_add_rolls_back_local_state() {
    let (gateway, cart) = store();
    let mug = product("mug", 50_000);
    gateway.register(mug.clone());
    cart.add_to_cart(mug.clone(), 1).await.unwrap();

    gateway.fail_next();
    assert!(cart.add_to_cart(mug, 2).await.is_err());

    // Quantity back to the pre-call value, remote untouched
    assert_eq!(cart.item_count(), 1);
    assert_eq!(
        gateway.remote_cart_quantity(&ProductId::new("mug")),
        Some(1)
    );
}

#[tokio::test]
async fn test_remove_absent_product_skips_gateway() {
    let (gateway, cart) = store();

    cart.remove_from_cart(&ProductId::new("ghost")).await.unwrap();

    assert_eq!(gateway.call_count(), 0);
}

#[tokio::test]
async fn test_failed_remove_restores_line() {
    let (gateway, cart) = store();
    let mug = product("mug", 50_000);
    gateway.register(mug.clone());
    cart.add_to_cart(mug, 1).await.unwrap();

    gateway.fail_next();
    assert!(cart.remove_from_cart(&ProductId::new("mug")).await.is_err());

    assert!(cart.is_in_cart(&ProductId::new("mug")));
    assert_eq!(
        gateway.remote_cart_quantity(&ProductId::new("mug")),
        Some(1)
    );
}

#[tokio::test]
async fn test_update_quantity_overwrites() {
    let (gateway, cart) = store();
    let mug = product("mug", 50_000);
    gateway.register(mug.clone());
    cart.add_to_cart(mug, 2).await.unwrap();

    cart.update_quantity(&ProductId::new("mug"), 5).await.unwrap();

    assert_eq!(cart.item_count(), 5);
    assert_eq!(
        gateway.remote_cart_quantity(&ProductId::new("mug")),
        Some(5)
    );
}

#[tokio::test]
async fn test_update_quantity_below_one_is_a_no_op() {
    let (gateway, cart) = store();
    let mug = product("mug", 50_000);
    gateway.register(mug.clone());
    cart.add_to_cart(mug, 2).await.unwrap();
    let calls = gateway.call_count();

    cart.update_quantity(&ProductId::new("mug"), 0).await.unwrap();

    assert_eq!(cart.item_count(), 2);
    assert_eq!(gateway.call_count(), calls);
}

#[tokio::test]
async fn test_decrement_floors_at_one() {
    let (gateway, cart) = store();
    let mug = product("mug", 50_000);
    gateway.register(mug.clone());
    cart.add_to_cart(mug, 2).await.unwrap();

    cart.decrement_quantity(&ProductId::new("mug")).await.unwrap();
    assert_eq!(cart.item_count(), 1);

    // At 1, a further decrement does nothing rather than removing the line
    cart.decrement_quantity(&ProductId::new("mug")).await.unwrap();
    assert_eq!(cart.item_count(), 1);
    assert!(cart.is_in_cart(&ProductId::new("mug")));
}

#[tokio::test]
async fn test_increment_bumps_by_one() {
    let (gateway, cart) = store();
    let mug = product("mug", 50_000);
    gateway.register(mug.clone());
    cart.add_to_cart(mug, 1).await.unwrap();

    cart.increment_quantity(&ProductId::new("mug")).await.unwrap();

    assert_eq!(cart.item_count(), 2);
}

#[tokio::test]
async fn test_clear_empties_both_sides() {
    let (gateway, cart) = store();
    let mug = product("mug", 50_000);
    gateway.register(mug.clone());
    cart.add_to_cart(mug, 3).await.unwrap();

    cart.clear().await.unwrap();

    assert!(cart.is_empty());
    assert_eq!(gateway.remote_cart_quantity(&ProductId::new("mug")), None);
}

#[tokio::test]
async fn test_failed_clear_restores_items() {
    let (gateway, cart) = store();
    let mug = product("mug", 50_000);
    gateway.register(mug.clone());
    cart.add_to_cart(mug, 3).await.unwrap();

    gateway.fail_next();
    assert!(cart.clear().await.is_err());

    assert_eq!(cart.item_count(), 3);
}

#[tokio::test]
async fn test_fetch_replaces_local_state() {
    let (gateway, cart) = store();
    gateway.seed_cart(product("vase", 75_000), 2);

    cart.fetch().await.unwrap();

    assert_eq!(cart.len(), 1);
    assert_eq!(cart.item_count(), 2);
    assert_eq!(cart.get_total(), Decimal::from(150_000));
}

#[tokio::test]
async fn test_reset_is_local_only() {
    let (gateway, cart) = store();
    let mug = product("mug", 50_000);
    gateway.register(mug.clone());
    cart.add_to_cart(mug, 1).await.unwrap();

    cart.reset();

    assert!(cart.is_empty());
    // The durable copy is untouched; a fetch restores it
    assert_eq!(
        gateway.remote_cart_quantity(&ProductId::new("mug")),
        Some(1)
    );
    cart.fetch().await.unwrap();
    assert_eq!(cart.item_count(), 1);
}
