//! Runs against a live database: `DATABASE_URL=... cargo test -- --ignored`

use std::sync::Arc;

use storefront_ledger::domain::cart::CartService;
use storefront_ledger::domain::checkout::{CheckoutError, CheckoutOrchestrator};
use storefront_ledger::domain::inventory::Product;
use storefront_ledger::domain::ledger::TransactionType;
use storefront_ledger::domain::order::OrderCommandHandler;
use storefront_ledger::domain::returns::{ReturnReason, ReturnWorkflow};
use storefront_ledger::domain::Money;
use storefront_ledger::metrics::Metrics;
use storefront_ledger::storage::{PgStore, Store, UnitOfWork};
use uuid::Uuid;

async fn connect() -> Arc<PgStore> {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for Postgres tests");
    let store = PgStore::connect(&url, 16).await.unwrap();
    store.init().await.unwrap();
    Arc::new(store)
}

async fn stocked(store: &PgStore, price_minor: i64, stock: i32) -> Uuid {
    let id = Uuid::new_v4();
    store
        .upsert_product(&Product {
            id,
            price: Money::from_minor(price_minor),
            stock,
            critical_stock_level: 0,
            is_active: true,
        })
        .await
        .unwrap();
    id
}

async fn stock_of(store: &PgStore, product_id: Uuid) -> i32 {
    let mut uow = store.begin().await.unwrap();
    let stock = uow.product(product_id).await.unwrap().unwrap().stock;
    uow.rollback().await.unwrap();
    stock
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "Requires Postgres (DATABASE_URL)"]
async fn postgres_conditional_decrement_never_oversells() {
    let store = connect().await;
    let metrics = Arc::new(Metrics::new().unwrap());
    let cart = CartService::new(store.clone());
    let checkout = Arc::new(CheckoutOrchestrator::new(store.clone(), metrics));
    let product = stocked(&store, 1_000, 3).await;

    let mut handles = Vec::new();
    for _ in 0..10 {
        let user = Uuid::new_v4();
        cart.add(user, product, 1).await.unwrap();
        let checkout = checkout.clone();
        handles.push(tokio::spawn(async move { checkout.checkout(user, "1 Main St").await }));
    }

    let mut succeeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(CheckoutError::InsufficientStock { .. }) => {}
            Err(other) => panic!("unexpected checkout error: {other}"),
        }
    }

    assert_eq!(succeeded, 3);
    assert_eq!(stock_of(&store, product).await, 0);
}

#[tokio::test]
#[ignore = "Requires Postgres (DATABASE_URL)"]
async fn postgres_refund_round_trip() {
    let store = connect().await;
    let metrics = Arc::new(Metrics::new().unwrap());
    let cart = CartService::new(store.clone());
    let checkout = CheckoutOrchestrator::new(store.clone(), metrics.clone());
    let orders = OrderCommandHandler::new(store.clone(), metrics.clone());
    let returns = ReturnWorkflow::new(store.clone(), metrics);
    let product = stocked(&store, 10_000, 5).await;
    let user = Uuid::new_v4();
    let admin = Uuid::new_v4();

    cart.add(user, product, 1).await.unwrap();
    let order = checkout.checkout(user, "1 Main St").await.unwrap();
    orders.mark_paid(order.id(), admin).await.unwrap();
    orders.ship(order.id(), admin).await.unwrap();

    let loaded = orders.get_order(order.id()).await.unwrap();
    assert_eq!(loaded.items(), order.items());

    let ret = returns
        .request_return(order.id(), user, ReturnReason::DefectiveProduct, "cracked")
        .await
        .unwrap();
    returns
        .decide(ret.id, true, None, Some(Money::from_minor(10_000)), admin)
        .await
        .unwrap();
    let first = returns.complete_refund(ret.id, admin).await.unwrap();
    let second = returns.complete_refund(ret.id, admin).await.unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(stock_of(&store, product).await, 5);

    let mut uow = store.begin().await.unwrap();
    let transactions = uow.transactions_for_order(order.id()).await.unwrap();
    let trail = uow.audit_trail(ret.id).await.unwrap();
    uow.rollback().await.unwrap();

    let kinds: Vec<_> = transactions.iter().map(|t| t.transaction_type).collect();
    assert_eq!(kinds, [TransactionType::Purchase, TransactionType::Refund]);
    assert_eq!(trail.len(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "Requires Postgres (DATABASE_URL)"]
async fn postgres_concurrent_cart_adds_are_not_lost() {
    let store = connect().await;
    let cart = Arc::new(CartService::new(store.clone()));
    let product = stocked(&store, 1_000, 50).await;
    let user = Uuid::new_v4();

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let cart = cart.clone();
            tokio::spawn(async move { cart.add(user, product, 1).await })
        })
        .collect();

    let mut added = 0;
    for handle in handles {
        handle.await.unwrap().unwrap();
        added += 1;
    }

    let lines = cart.list(user).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].count.get(), added);

    cart.add(user, product, 90).await.unwrap();
    let err = cart.add(user, product, 1).await.unwrap_err();
    assert!(matches!(err, storefront_ledger::domain::cart::CartError::QuantityOutOfRange(101)));
    assert_eq!(cart.list(user).await.unwrap()[0].count.get(), 100);
}
