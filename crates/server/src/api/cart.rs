//! 购物车 API 路由。

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use coursehub_api_types::commerce::{AddCartItemRequest, CartItemResponse, CartResponse};
use coursehub_core::domain::CartItemId;

use super::error::ApiError;
use super::extract::{ApiJson, AuthUser, path_id};
use super::state::AppState;
use crate::repository::cart_repository::CartTarget;
use crate::service::commerce_service::CartView;

/// 创建购物车 API 路由。
pub fn create_cart_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/cart", get(get_cart).delete(clear_cart))
        .route("/api/cart/items", post(add_item))
        .route("/api/cart/items/{id}", delete(remove_item))
}

/// 课程或课程包 ID，二者恰有其一。
pub(crate) fn target_ids(target: CartTarget) -> (Option<String>, Option<String>) {
    match target {
        CartTarget::Course(course_id) => (Some(course_id.to_string()), None),
        CartTarget::Bundle(bundle_id) => (None, Some(bundle_id.to_string())),
    }
}

fn cart_response(cart: CartView) -> CartResponse {
    CartResponse {
        items: cart
            .lines
            .into_iter()
            .map(|line| {
                let (course_id, bundle_id) = target_ids(line.target);
                CartItemResponse {
                    id: line.id.to_string(),
                    course_id,
                    bundle_id,
                    title: line.title,
                    price_cents: line.price.cents(),
                }
            })
            .collect(),
        total_cents: cart.total.cents(),
    }
}

/// 查看购物车及总价。
async fn get_cart(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
) -> Result<Json<CartResponse>, ApiError> {
    Ok(Json(cart_response(state.commerce.cart(&actor).await?)))
}

/// 加入课程或课程包。
async fn add_item(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    ApiJson(request): ApiJson<AddCartItemRequest>,
) -> Result<(StatusCode, Json<CartResponse>), ApiError> {
    let cart = state.commerce.add_to_cart(&actor, request).await?;
    Ok((StatusCode::CREATED, Json(cart_response(cart))))
}

/// 移除购物车条目。
async fn remove_item(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<CartResponse>, ApiError> {
    let item_id: CartItemId = path_id("cart item", &id)?;
    let cart = state.commerce.remove_from_cart(&actor, item_id).await?;
    Ok(Json(cart_response(cart)))
}

/// 清空购物车。
async fn clear_cart(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
) -> Result<StatusCode, ApiError> {
    state.commerce.clear_cart(&actor).await?;
    Ok(StatusCode::NO_CONTENT)
}
