//! 订单 API 路由。
//!
//! 支付回调不在本服务范围内，`confirm` 代替支付成功通知。

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use coursehub_api_types::commerce::{OrderItemResponse, OrderResponse};
use coursehub_core::domain::OrderId;

use super::cart::target_ids;
use super::error::ApiError;
use super::extract::{AuthUser, path_id};
use super::state::AppState;
use crate::repository::order_repository::OrderRecord;

/// 创建订单 API 路由。
pub fn create_orders_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/orders", get(list_orders).post(checkout))
        .route("/api/orders/{id}", get(get_order))
        .route("/api/orders/{id}/confirm", post(confirm_order))
        .route("/api/orders/{id}/cancel", post(cancel_order))
}

fn order_response(order: OrderRecord) -> OrderResponse {
    OrderResponse {
        id: order.id.to_string(),
        status: order.status.as_str().to_string(),
        total_cents: order.total.cents(),
        items: order
            .items
            .into_iter()
            .map(|item| {
                let (course_id, bundle_id) = target_ids(item.target);
                OrderItemResponse {
                    course_id,
                    bundle_id,
                    title: item.title,
                    price_cents: item.price.cents(),
                }
            })
            .collect(),
        created_at: order.created_at,
        paid_at: order.paid_at,
    }
}

/// 将购物车结算为待支付订单。
async fn checkout(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let order = state.commerce.checkout(&actor).await?;
    Ok((StatusCode::CREATED, Json(order_response(order))))
}

async fn list_orders(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.commerce.list_orders(&actor).await?;
    Ok(Json(orders.into_iter().map(order_response).collect()))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id: OrderId = path_id("order", &id)?;
    Ok(Json(order_response(
        state.commerce.get_order(&actor, order_id).await?,
    )))
}

/// 确认支付并开通课程。
async fn confirm_order(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id: OrderId = path_id("order", &id)?;
    let order = state.commerce.confirm_order(&actor, order_id).await?;
    Ok(Json(order_response(order)))
}

/// 取消待支付订单。
async fn cancel_order(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id: OrderId = path_id("order", &id)?;
    let order = state.commerce.cancel_order(&actor, order_id).await?;
    Ok(Json(order_response(order)))
}
