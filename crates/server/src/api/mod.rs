//! API 路由模块。
//!
//! 汇总各业务路由，并挂载请求追踪与 CORS 中间件。

pub mod bundles;
pub mod cart;
pub mod courses;
pub mod error;
pub mod exam;
pub mod extract;
pub mod orders;
pub mod reviews;
pub mod state;
pub mod streaks;
pub mod tests;
pub mod users;

use std::sync::Arc;

use axum::{Json, Router, http::HeaderValue, routing::get};
use coursehub_api_types::HealthCheckResponse;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

pub use error::ApiError;
pub use state::AppState;

/// 健康检查。
async fn health() -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse::ok())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(%origin, error = %err, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(allowed)
}

/// 创建完整的应用路由。
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/api/health", get(health))
        .merge(users::create_users_router())
        .merge(courses::create_courses_router())
        .merge(bundles::create_bundles_router())
        .merge(reviews::create_reviews_router())
        .merge(cart::create_cart_router())
        .merge(orders::create_orders_router())
        .merge(tests::create_tests_router())
        .merge(exam::create_exam_router())
        .merge(streaks::create_streaks_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
