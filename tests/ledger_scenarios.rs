use std::sync::Arc;

use storefront_ledger::domain::cart::CartService;
use storefront_ledger::domain::checkout::{CheckoutError, CheckoutOrchestrator};
use storefront_ledger::domain::inventory::{InventoryLedger, Product};
use storefront_ledger::domain::ledger::{TransactionStatus, TransactionType};
use storefront_ledger::domain::order::{Order, OrderCommandHandler, OrderError, OrderStatus};
use storefront_ledger::domain::returns::{ReturnError, ReturnReason, ReturnStatus, ReturnWorkflow};
use storefront_ledger::domain::Money;
use storefront_ledger::metrics::Metrics;
use storefront_ledger::storage::{MemoryStore, Store, UnitOfWork};
use uuid::Uuid;

struct Ledger {
    store: Arc<MemoryStore>,
    metrics: Arc<Metrics>,
    cart: CartService<MemoryStore>,
    checkout: Arc<CheckoutOrchestrator<MemoryStore>>,
    orders: OrderCommandHandler<MemoryStore>,
    returns: ReturnWorkflow<MemoryStore>,
    admin: Uuid,
}

fn ledger() -> Ledger {
    let store = Arc::new(MemoryStore::new());
    let metrics = Arc::new(Metrics::new().unwrap());
    Ledger {
        cart: CartService::new(store.clone()),
        checkout: Arc::new(CheckoutOrchestrator::new(store.clone(), metrics.clone())),
        orders: OrderCommandHandler::new(store.clone(), metrics.clone()),
        returns: ReturnWorkflow::new(store.clone(), metrics.clone()),
        store,
        metrics,
        admin: Uuid::new_v4(),
    }
}

impl Ledger {
    async fn stocked(&self, price_minor: i64, stock: i32, critical: i32) -> Uuid {
        let id = Uuid::new_v4();
        self.store
            .put_product(Product {
                id,
                price: Money::from_minor(price_minor),
                stock,
                critical_stock_level: critical,
                is_active: true,
            })
            .await;
        id
    }

    async fn stock(&self, product_id: Uuid) -> i32 {
        self.store.product(product_id).await.unwrap().stock
    }

    async fn buy(&self, user: Uuid, lines: &[(Uuid, i32)]) -> Result<Order, CheckoutError> {
        for (product_id, count) in lines {
            self.cart.add(user, *product_id, *count).await.unwrap();
        }
        self.checkout.checkout(user, "221B Baker Street").await
    }

    async fn shipped(&self, user: Uuid, lines: &[(Uuid, i32)]) -> Order {
        let order = self.buy(user, lines).await.unwrap();
        self.orders.mark_paid(order.id(), self.admin).await.unwrap();
        self.orders.ship(order.id(), self.admin).await.unwrap()
    }

    fn counter(&self, name: &str) -> f64 {
        self.metrics
            .registry()
            .gather()
            .iter()
            .find(|m| m.name() == name)
            .map(|m| m.metric.iter().map(|c| c.counter.value.unwrap_or(0.0)).sum())
            .unwrap_or(0.0)
    }
}

// ----------------------------------------------------------------------------
// Checkout
// ----------------------------------------------------------------------------

// Memory units run one at a time; the interleaved case against real row locks is
// `postgres_conditional_decrement_never_oversells` (`DATABASE_URL=... cargo test -- --ignored`).
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_checkouts_for_last_unit_sell_exactly_once() {
    let l = ledger();
    let product = l.stocked(2_500, 1, 0).await;

    let mut users = Vec::new();
    for _ in 0..8 {
        let user = Uuid::new_v4();
        l.cart.add(user, product, 1).await.unwrap();
        users.push(user);
    }

    let handles: Vec<_> = users
        .into_iter()
        .map(|user| {
            let checkout = l.checkout.clone();
            tokio::spawn(async move { checkout.checkout(user, "1 Main St").await })
        })
        .collect();

    let mut succeeded = 0;
    let mut refused = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(CheckoutError::InsufficientStock { product_id }) => {
                assert_eq!(product_id, product);
                refused += 1;
            }
            Err(other) => panic!("unexpected checkout error: {other}"),
        }
    }

    assert_eq!(succeeded, 1);
    assert_eq!(refused, 7);
    assert_eq!(l.stock(product).await, 0);
    assert_eq!(l.store.order_count().await, 1);
    assert_eq!(l.store.transaction_count().await, 1);
    assert_eq!(l.counter("stock_reservation_failures_total"), 7.0);
}

#[tokio::test]
async fn failed_reservation_leaves_no_trace() {
    let l = ledger();
    let plenty = l.stocked(1_000, 5, 0).await;
    let scarce = l.stocked(1_000, 1, 0).await;
    let user = Uuid::new_v4();

    let err = l.buy(user, &[(plenty, 2), (scarce, 3)]).await.unwrap_err();

    assert!(matches!(err, CheckoutError::InsufficientStock { product_id } if product_id == scarce));
    assert_eq!(l.stock(plenty).await, 5);
    assert_eq!(l.stock(scarce).await, 1);
    assert_eq!(l.cart.list(user).await.unwrap().len(), 2);
    assert_eq!(l.store.order_count().await, 0);
    assert_eq!(l.store.transaction_count().await, 0);
}

#[tokio::test]
async fn checkout_writes_matching_purchase_and_empties_cart() {
    let l = ledger();
    let a = l.stocked(1_999, 10, 0).await;
    let b = l.stocked(500, 10, 0).await;
    let user = Uuid::new_v4();

    let order = l.buy(user, &[(a, 2), (b, 1)]).await.unwrap();

    assert_eq!(order.status(), OrderStatus::Pending);
    assert_eq!(order.total_amount(), Money::from_minor(4_498));
    assert_eq!(order.items().len(), 2);
    assert!(l.cart.list(user).await.unwrap().is_empty());
    assert_eq!(l.stock(a).await, 8);
    assert_eq!(l.stock(b).await, 9);

    let mut uow = l.store.begin().await.unwrap();
    let transactions = uow.transactions_for_order(order.id()).await.unwrap();
    uow.rollback().await.unwrap();

    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].transaction_type, TransactionType::Purchase);
    assert_eq!(transactions[0].status, TransactionStatus::Completed);
    assert_eq!(transactions[0].amount, order.total_amount());
    assert_eq!(transactions[0].user_id, user);
    assert_eq!(l.counter("checkouts_total"), 1.0);
}

#[tokio::test]
async fn low_stock_is_flagged_after_commit() {
    let l = ledger();
    let product = l.stocked(100, 3, 2).await;

    l.buy(Uuid::new_v4(), &[(product, 2)]).await.unwrap();

    let mut uow = l.store.begin().await.unwrap();
    let level = InventoryLedger::stock_level(&mut uow, product).await.unwrap();
    uow.rollback().await.unwrap();

    assert_eq!(level.stock, 1);
    assert!(level.below_critical);
    assert_eq!(l.counter("low_stock_alerts_total"), 1.0);
}

// ----------------------------------------------------------------------------
// Order lifecycle
// ----------------------------------------------------------------------------

#[tokio::test]
async fn cancelling_pending_order_restocks() {
    let l = ledger();
    let product = l.stocked(700, 4, 0).await;
    let user = Uuid::new_v4();
    let order = l.buy(user, &[(product, 3)]).await.unwrap();
    assert_eq!(l.stock(product).await, 1);

    let cancelled = l
        .orders
        .cancel(order.id(), user, Some("changed my mind".into()))
        .await
        .unwrap();

    assert_eq!(cancelled.status(), OrderStatus::Cancelled);
    assert_eq!(l.stock(product).await, 4);
}

#[tokio::test]
async fn shipped_order_cannot_be_cancelled() {
    let l = ledger();
    let product = l.stocked(700, 4, 0).await;
    let user = Uuid::new_v4();
    let order = l.shipped(user, &[(product, 1)]).await;

    let err = l.orders.cancel(order.id(), user, None).await.unwrap_err();

    assert!(matches!(
        err,
        OrderError::InvalidStatusTransition {
            from: OrderStatus::Shipped,
            to: OrderStatus::Cancelled
        }
    ));
    assert_eq!(l.stock(product).await, 3);
}

#[tokio::test]
async fn audit_trail_follows_order_lifecycle() {
    let l = ledger();
    let product = l.stocked(700, 4, 0).await;
    let user = Uuid::new_v4();
    let order = l.shipped(user, &[(product, 1)]).await;
    l.orders.complete(order.id(), l.admin).await.unwrap();

    let mut uow = l.store.begin().await.unwrap();
    let trail = uow.audit_trail(order.id()).await.unwrap();
    uow.rollback().await.unwrap();

    let types: Vec<_> = trail.iter().map(|r| r.event_type.as_str()).collect();
    assert_eq!(types, ["OrderPlaced", "OrderPaid", "OrderShipped", "OrderCompleted"]);
    assert_eq!(trail[0].user_id, Some(user));
    assert_eq!(trail[1].user_id, Some(l.admin));
    assert!(trail.iter().all(|r| r.aggregate_type == "Order"));
}

// ----------------------------------------------------------------------------
// Returns and refunds
// ----------------------------------------------------------------------------

#[tokio::test]
async fn approved_return_refunds_and_restocks() {
    let l = ledger();
    let product = l.stocked(10_000, 5, 0).await;
    let user = Uuid::new_v4();
    let order = l.shipped(user, &[(product, 1)]).await;
    assert_eq!(l.stock(product).await, 4);

    let requested = l
        .returns
        .request_return(order.id(), user, ReturnReason::DefectiveProduct, "screen cracked")
        .await
        .unwrap();
    assert_eq!(requested.status, ReturnStatus::Pending);

    let approved = l
        .returns
        .decide(requested.id, true, Some("ok".into()), Some(Money::from_minor(10_000)), l.admin)
        .await
        .unwrap();
    assert_eq!(approved.status, ReturnStatus::Approved);
    assert_eq!(approved.refund_amount, Some(Money::from_minor(10_000)));

    let refund = l.returns.complete_refund(requested.id, l.admin).await.unwrap();
    assert_eq!(refund.transaction_type, TransactionType::Refund);
    assert_eq!(refund.status, TransactionStatus::Completed);
    assert_eq!(refund.amount, Money::from_minor(10_000));
    assert_eq!(refund.order_id, order.id());
    assert_eq!(refund.user_id, user);
    assert_eq!(l.stock(product).await, 5);

    let completed = l.returns.get_return(requested.id).await.unwrap();
    assert_eq!(completed.status, ReturnStatus::Completed);
    assert_eq!(completed.refund_transaction_id, Some(refund.id));

    // Order status is untouched by a return
    assert_eq!(l.orders.get_order(order.id()).await.unwrap().status(), OrderStatus::Shipped);
    assert_eq!(l.counter("refunded_amount_minor_total"), 10_000.0);
}

#[tokio::test]
async fn repeated_refund_completion_is_idempotent() {
    let l = ledger();
    let product = l.stocked(3_000, 2, 0).await;
    let user = Uuid::new_v4();
    let order = l.shipped(user, &[(product, 2)]).await;

    let ret = l
        .returns
        .request_return(order.id(), user, ReturnReason::Damaged, "")
        .await
        .unwrap();
    l.returns
        .decide(ret.id, true, None, Some(Money::from_minor(4_000)), l.admin)
        .await
        .unwrap();

    let first = l.returns.complete_refund(ret.id, l.admin).await.unwrap();
    let second = l.returns.complete_refund(ret.id, l.admin).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(l.stock(product).await, 2);
    assert_eq!(l.store.transaction_count().await, 2);
    assert_eq!(l.counter("refunds_completed_total"), 1.0);
}

#[tokio::test]
async fn approval_validates_refund_amount() {
    let l = ledger();
    let product = l.stocked(5_000, 2, 0).await;
    let user = Uuid::new_v4();
    let order = l.shipped(user, &[(product, 1)]).await;
    let ret = l
        .returns
        .request_return(order.id(), user, ReturnReason::NotAsDescribed, "wrong colour")
        .await
        .unwrap();

    let missing = l.returns.decide(ret.id, true, None, None, l.admin).await.unwrap_err();
    assert!(matches!(missing, ReturnError::RefundAmountRequired));

    let zero = l
        .returns
        .decide(ret.id, true, None, Some(Money::ZERO), l.admin)
        .await
        .unwrap_err();
    assert!(matches!(zero, ReturnError::InvalidRefundAmount(_)));

    let excessive = l
        .returns
        .decide(ret.id, true, None, Some(Money::from_minor(5_001)), l.admin)
        .await
        .unwrap_err();
    assert!(matches!(excessive, ReturnError::RefundAmountExceedsOrderTotal { .. }));

    // Still pending after every refusal
    assert_eq!(l.returns.get_return(ret.id).await.unwrap().status, ReturnStatus::Pending);
}

#[tokio::test]
async fn rejected_return_is_final_but_allows_a_new_request() {
    let l = ledger();
    let product = l.stocked(5_000, 2, 0).await;
    let user = Uuid::new_v4();
    let order = l.shipped(user, &[(product, 1)]).await;
    let ret = l
        .returns
        .request_return(order.id(), user, ReturnReason::ChangeOfMind, "")
        .await
        .unwrap();

    let rejected = l
        .returns
        .decide(ret.id, false, Some("outside policy".into()), None, l.admin)
        .await
        .unwrap();
    assert_eq!(rejected.status, ReturnStatus::Rejected);

    let again = l
        .returns
        .decide(ret.id, true, None, Some(Money::from_minor(100)), l.admin)
        .await
        .unwrap_err();
    assert!(matches!(
        again,
        ReturnError::InvalidStateTransition {
            from: ReturnStatus::Rejected,
            ..
        }
    ));

    let refund = l.returns.complete_refund(ret.id, l.admin).await.unwrap_err();
    assert!(matches!(refund, ReturnError::InvalidStateTransition { .. }));
    assert_eq!(l.stock(product).await, 1);

    let second = l
        .returns
        .request_return(order.id(), user, ReturnReason::Damaged, "box crushed")
        .await
        .unwrap();
    assert_eq!(second.status, ReturnStatus::Pending);
}

#[tokio::test]
async fn open_or_completed_return_blocks_another() {
    let l = ledger();
    let product = l.stocked(5_000, 2, 0).await;
    let user = Uuid::new_v4();
    let order = l.shipped(user, &[(product, 1)]).await;
    let ret = l
        .returns
        .request_return(order.id(), user, ReturnReason::Other, "")
        .await
        .unwrap();

    let open = l
        .returns
        .request_return(order.id(), user, ReturnReason::Other, "")
        .await
        .unwrap_err();
    assert!(matches!(open, ReturnError::DuplicateReturn(id) if id == order.id()));

    l.returns
        .decide(ret.id, true, None, Some(Money::from_minor(5_000)), l.admin)
        .await
        .unwrap();
    l.returns.complete_refund(ret.id, l.admin).await.unwrap();

    let after = l
        .returns
        .request_return(order.id(), user, ReturnReason::Other, "")
        .await
        .unwrap_err();
    assert!(matches!(after, ReturnError::DuplicateReturn(_)));
}

#[tokio::test]
async fn return_requires_owner_and_shipped_order() {
    let l = ledger();
    let product = l.stocked(5_000, 4, 0).await;
    let user = Uuid::new_v4();

    let pending = l.buy(user, &[(product, 1)]).await.unwrap();
    let err = l
        .returns
        .request_return(pending.id(), user, ReturnReason::Other, "")
        .await
        .unwrap_err();
    assert!(matches!(err, ReturnError::InvalidOrderState(OrderStatus::Pending)));

    let shipped = l.shipped(user, &[(product, 1)]).await;
    let stranger = Uuid::new_v4();
    let err = l
        .returns
        .request_return(shipped.id(), stranger, ReturnReason::Other, "")
        .await
        .unwrap_err();
    assert!(matches!(err, ReturnError::NotOrderOwner { user_id, .. } if user_id == stranger));

    let err = l
        .returns
        .request_return(Uuid::new_v4(), user, ReturnReason::Other, "")
        .await
        .unwrap_err();
    assert!(matches!(err, ReturnError::OrderNotFound(_)));
}

#[tokio::test]
async fn refund_requires_approval_first() {
    let l = ledger();
    let product = l.stocked(5_000, 2, 0).await;
    let user = Uuid::new_v4();
    let order = l.shipped(user, &[(product, 1)]).await;
    let ret = l
        .returns
        .request_return(order.id(), user, ReturnReason::Other, "")
        .await
        .unwrap();

    let err = l.returns.complete_refund(ret.id, l.admin).await.unwrap_err();

    assert!(matches!(
        err,
        ReturnError::InvalidStateTransition {
            from: ReturnStatus::Pending,
            to: ReturnStatus::Completed
        }
    ));
    assert_eq!(l.store.transaction_count().await, 1);
    assert_eq!(l.stock(product).await, 1);
}
