use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use mokka_core::UserId;

use crate::app::errors;
use crate::app::services::AppServices;

pub async fn create_cart(
    Extension(services): Extension<Arc<AppServices>>,
    Path(user_id): Path<i64>,
) -> axum::response::Response {
    let user_id = UserId::from_i64(user_id);
    match services.carts.create(user_id).await {
        Ok(cart) => (StatusCode::CREATED, Json(cart)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_cart(
    Extension(services): Extension<Arc<AppServices>>,
    Path(user_id): Path<i64>,
) -> axum::response::Response {
    let user_id = UserId::from_i64(user_id);
    match services.carts.get_by_user(user_id).await {
        Ok(cart) => (StatusCode::OK, Json(cart)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_cart(
    Extension(services): Extension<Arc<AppServices>>,
    Path(user_id): Path<i64>,
) -> axum::response::Response {
    let user_id = UserId::from_i64(user_id);
    match services.carts.delete_by_user(user_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
