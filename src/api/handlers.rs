use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::inventory::InventoryLedger;
use crate::domain::returns::ReturnReason;
use crate::domain::Money;
use crate::storage::{Store, UnitOfWork};
use super::errors::ApiError;
use super::identity::CurrentUser;
use super::AppState;

type Data<S> = web::Data<AppState<S>>;
type ApiResult = Result<HttpResponse, ApiError>;

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: Uuid,
    pub count: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub count: i32,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub shipping_address: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReturnRequest {
    pub order_id: Uuid,
    pub reason: ReturnReason,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct DecideRequest {
    pub approve: bool,
    pub admin_note: Option<String>,
    /// Minor currency units
    pub refund_amount: Option<Money>,
}

// ---------------------------------------------------------------------------
// Cart
// ---------------------------------------------------------------------------

pub async fn get_cart<S: Store>(state: Data<S>, user: CurrentUser) -> ApiResult {
    let lines = state.cart.list(user.id()).await?;
    Ok(HttpResponse::Ok().json(lines))
}

pub async fn add_cart_item<S: Store>(
    state: Data<S>,
    user: CurrentUser,
    body: web::Json<AddItemRequest>,
) -> ApiResult {
    let line = state.cart.add(user.id(), body.product_id, body.count).await?;
    Ok(HttpResponse::Ok().json(line))
}

pub async fn update_cart_item<S: Store>(
    state: Data<S>,
    user: CurrentUser,
    path: web::Path<Uuid>,
    body: web::Json<UpdateItemRequest>,
) -> ApiResult {
    let line = state.cart.update(user.id(), path.into_inner(), body.count).await?;
    Ok(HttpResponse::Ok().json(line))
}

pub async fn remove_cart_item<S: Store>(state: Data<S>, user: CurrentUser, path: web::Path<Uuid>) -> ApiResult {
    state.cart.remove(user.id(), path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn clear_cart<S: Store>(state: Data<S>, user: CurrentUser) -> ApiResult {
    state.cart.clear(user.id()).await?;
    Ok(HttpResponse::NoContent().finish())
}

// ---------------------------------------------------------------------------
// Checkout and orders
// ---------------------------------------------------------------------------

pub async fn checkout<S: Store>(state: Data<S>, user: CurrentUser, body: web::Json<CheckoutRequest>) -> ApiResult {
    let order = state.checkout.checkout(user.id(), &body.shipping_address).await?;
    Ok(HttpResponse::Created().json(order))
}

pub async fn get_order<S: Store>(state: Data<S>, user: CurrentUser, path: web::Path<Uuid>) -> ApiResult {
    let order = state.orders.get_order(path.into_inner()).await?;
    state.roles.require_owner_or_admin(user, order.user_id())?;
    Ok(HttpResponse::Ok().json(order))
}

pub async fn cancel_order<S: Store>(
    state: Data<S>,
    user: CurrentUser,
    path: web::Path<Uuid>,
    body: Option<web::Json<CancelRequest>>,
) -> ApiResult {
    let order_id = path.into_inner();
    let order = state.orders.get_order(order_id).await?;
    state.roles.require_owner_or_admin(user, order.user_id())?;

    let reason = body.and_then(|b| b.into_inner().reason);
    let order = state.orders.cancel(order_id, user.id(), reason).await?;
    Ok(HttpResponse::Ok().json(order))
}

pub async fn pay_order<S: Store>(state: Data<S>, user: CurrentUser, path: web::Path<Uuid>) -> ApiResult {
    state.roles.require_admin(user)?;
    let order = state.orders.mark_paid(path.into_inner(), user.id()).await?;
    Ok(HttpResponse::Ok().json(order))
}

pub async fn ship_order<S: Store>(state: Data<S>, user: CurrentUser, path: web::Path<Uuid>) -> ApiResult {
    state.roles.require_admin(user)?;
    let order = state.orders.ship(path.into_inner(), user.id()).await?;
    Ok(HttpResponse::Ok().json(order))
}

pub async fn complete_order<S: Store>(state: Data<S>, user: CurrentUser, path: web::Path<Uuid>) -> ApiResult {
    state.roles.require_admin(user)?;
    let order = state.orders.complete(path.into_inner(), user.id()).await?;
    Ok(HttpResponse::Ok().json(order))
}

// ---------------------------------------------------------------------------
// Returns
// ---------------------------------------------------------------------------

pub async fn request_return<S: Store>(state: Data<S>, user: CurrentUser, body: web::Json<ReturnRequest>) -> ApiResult {
    let body = body.into_inner();
    let order_return = state
        .returns
        .request_return(body.order_id, user.id(), body.reason, &body.description)
        .await?;
    Ok(HttpResponse::Created().json(order_return))
}

pub async fn get_return<S: Store>(state: Data<S>, user: CurrentUser, path: web::Path<Uuid>) -> ApiResult {
    let order_return = state.returns.get_return(path.into_inner()).await?;
    state.roles.require_owner_or_admin(user, order_return.user_id)?;
    Ok(HttpResponse::Ok().json(order_return))
}

pub async fn decide_return<S: Store>(
    state: Data<S>,
    user: CurrentUser,
    path: web::Path<Uuid>,
    body: web::Json<DecideRequest>,
) -> ApiResult {
    state.roles.require_admin(user)?;
    let body = body.into_inner();
    let order_return = state
        .returns
        .decide(path.into_inner(), body.approve, body.admin_note, body.refund_amount, user.id())
        .await?;
    Ok(HttpResponse::Ok().json(order_return))
}

/// Safe to repeat: a completed return answers with its existing refund.
pub async fn complete_refund<S: Store>(state: Data<S>, user: CurrentUser, path: web::Path<Uuid>) -> ApiResult {
    state.roles.require_admin(user)?;
    let refund = state.returns.complete_refund(path.into_inner(), user.id()).await?;
    Ok(HttpResponse::Ok().json(refund))
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

pub async fn stock_level<S: Store>(state: Data<S>, path: web::Path<Uuid>) -> ApiResult {
    let mut uow = state.store.begin().await?;
    let level = InventoryLedger::stock_level(&mut uow, path.into_inner()).await?;
    uow.rollback().await?;
    Ok(HttpResponse::Ok().json(level))
}
