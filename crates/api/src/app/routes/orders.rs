use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use mokka_core::{OrderId, UserId};

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(user_id): Path<i64>,
    Json(body): Json<dto::CreateOrderRequest>,
) -> axum::response::Response {
    let user_id = UserId::from_i64(user_id);
    match services.orders.create_order(user_id, body.into_draft()).await {
        Ok(order) => (StatusCode::CREATED, Json(order)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Path(user_id): Path<i64>,
) -> axum::response::Response {
    let user_id = UserId::from_i64(user_id);
    match services.orders.get_orders(user_id).await {
        Ok(orders) => (StatusCode::OK, Json(orders)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path((user_id, order_id)): Path<(i64, i64)>,
) -> axum::response::Response {
    let user_id = UserId::from_i64(user_id);
    let order_id = OrderId::from_i64(order_id);
    match services.orders.get_order(user_id, order_id).await {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path((user_id, order_id)): Path<(i64, i64)>,
) -> axum::response::Response {
    let user_id = UserId::from_i64(user_id);
    let order_id = OrderId::from_i64(order_id);
    match services.orders.delete_order(user_id, order_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Path(user_id): Path<i64>,
) -> axum::response::Response {
    let user_id = UserId::from_i64(user_id);
    match services.orders.delete_orders(user_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
