use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use mokka_cart::CartItemPatch;
use mokka_core::{CartItemId, MealId, UserId};
use mokka_infra::UpdateOutcome;

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub async fn add_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(user_id): Path<i64>,
    Json(body): Json<dto::AddCartItemRequest>,
) -> axum::response::Response {
    let user_id = UserId::from_i64(user_id);
    let quantity = match errors::parse_add_quantity(body.quantity) {
        Ok(q) => q,
        Err(resp) => return resp,
    };

    match services
        .cart_items
        .add_item(user_id, MealId::from_i64(body.meal_id), quantity)
        .await
    {
        Ok(item) => (StatusCode::CREATED, Json(item)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    Path(user_id): Path<i64>,
) -> axum::response::Response {
    let user_id = UserId::from_i64(user_id);
    match services.cart_items.get_items(user_id).await {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path((user_id, item_id)): Path<(i64, i64)>,
) -> axum::response::Response {
    let user_id = UserId::from_i64(user_id);
    let item_id = CartItemId::from_i64(item_id);
    match services.cart_items.get_item(user_id, item_id).await {
        Ok(item) => (StatusCode::OK, Json(item)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path((user_id, item_id)): Path<(i64, i64)>,
    Json(body): Json<dto::UpdateCartItemRequest>,
) -> axum::response::Response {
    let user_id = UserId::from_i64(user_id);
    let item_id = CartItemId::from_i64(item_id);

    let quantity = match errors::parse_patch_quantity(body.quantity) {
        Ok(q) => q,
        Err(resp) => return resp,
    };

    match services
        .cart_items
        .update_item(user_id, item_id, CartItemPatch { quantity })
        .await
    {
        Ok(UpdateOutcome::Updated(item)) => (StatusCode::OK, Json(item)).into_response(),
        Ok(UpdateOutcome::Removed) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn remove_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path((user_id, item_id)): Path<(i64, i64)>,
) -> axum::response::Response {
    let user_id = UserId::from_i64(user_id);
    let item_id = CartItemId::from_i64(item_id);
    match services.cart_items.remove_item(user_id, item_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn remove_all_items(
    Extension(services): Extension<Arc<AppServices>>,
    Path(user_id): Path<i64>,
) -> axum::response::Response {
    let user_id = UserId::from_i64(user_id);
    match services.cart_items.remove_all_items(user_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
