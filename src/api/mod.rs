// ============================================================================
// HTTP API
// ============================================================================
//
// Thin actix-web layer over the ledger services. Identity comes from the
// `X-User-Id` header; admin actions are gated by the `RoleDirectory`.
//
// ============================================================================

mod errors;
mod handlers;
mod identity;

use std::sync::Arc;

use actix_web::web;

use crate::domain::cart::CartService;
use crate::domain::checkout::CheckoutOrchestrator;
use crate::domain::order::OrderCommandHandler;
use crate::domain::returns::ReturnWorkflow;
use crate::domain::ErrorKind;
use crate::metrics::Metrics;
use crate::storage::Store;

pub use errors::ApiError;
pub use identity::{CurrentUser, Role, RoleDirectory, USER_HEADER};

pub struct AppState<S: Store> {
    pub store: Arc<S>,
    pub cart: CartService<S>,
    pub checkout: CheckoutOrchestrator<S>,
    pub orders: OrderCommandHandler<S>,
    pub returns: ReturnWorkflow<S>,
    pub roles: RoleDirectory,
}

impl<S: Store> AppState<S> {
    pub fn new(store: Arc<S>, metrics: Arc<Metrics>, roles: RoleDirectory) -> Self {
        Self {
            cart: CartService::new(store.clone()),
            checkout: CheckoutOrchestrator::new(store.clone(), metrics.clone()),
            orders: OrderCommandHandler::new(store.clone(), metrics.clone()),
            returns: ReturnWorkflow::new(store.clone(), metrics),
            store,
            roles,
        }
    }
}

/// Register every ledger route; `AppState<S>` must be in app data.
pub fn configure<S: Store>(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::new(ErrorKind::Validation, err.to_string()).into()),
    )
    .service(
        web::scope("/cart")
            .route("", web::get().to(handlers::get_cart::<S>))
            .route("", web::delete().to(handlers::clear_cart::<S>))
            .route("/items", web::post().to(handlers::add_cart_item::<S>))
            .route("/items/{product_id}", web::put().to(handlers::update_cart_item::<S>))
            .route("/items/{product_id}", web::delete().to(handlers::remove_cart_item::<S>)),
    )
    .route("/checkout", web::post().to(handlers::checkout::<S>))
    .service(
        web::scope("/orders/{order_id}")
            .route("", web::get().to(handlers::get_order::<S>))
            .route("/cancel", web::post().to(handlers::cancel_order::<S>))
            .route("/pay", web::post().to(handlers::pay_order::<S>))
            .route("/ship", web::post().to(handlers::ship_order::<S>))
            .route("/complete", web::post().to(handlers::complete_order::<S>)),
    )
    .route("/returns", web::post().to(handlers::request_return::<S>))
    .service(
        web::scope("/returns/{return_id}")
            .route("", web::get().to(handlers::get_return::<S>))
            .route("/decide", web::post().to(handlers::decide_return::<S>))
            .route("/complete", web::post().to(handlers::complete_refund::<S>)),
    )
    .route("/products/{product_id}/stock", web::get().to(handlers::stock_level::<S>));
}
