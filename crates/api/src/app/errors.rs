use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use mokka_core::DomainError;
use mokka_infra::ServiceError;

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    let message = err.to_string();
    match err {
        ServiceError::CartNotFound(_)
        | ServiceError::CartItemNotFound(_)
        | ServiceError::CartItemsNotFound(_)
        | ServiceError::MealNotFound(_)
        | ServiceError::OrderNotFound(_, _)
        | ServiceError::OrdersNotFound(_) => {
            json_error(StatusCode::NOT_FOUND, "not_found", message)
        }
        ServiceError::CartAlreadyExists(_) => json_error(StatusCode::CONFLICT, "conflict", message),
        ServiceError::InvalidQuantity | ServiceError::NoUpdateData => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", message)
        }
        ServiceError::Domain(DomainError::Validation(_) | DomainError::InvalidId(_)) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", message)
        }
        ServiceError::Domain(DomainError::InvariantViolation(_)) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", message)
        }
        ServiceError::Store(_) => json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", message),
        ServiceError::Catalog(_) => json_error(StatusCode::BAD_GATEWAY, "catalog_error", message),
        ServiceError::Publish(_) => json_error(StatusCode::BAD_GATEWAY, "publish_error", message),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Quantity for a new line item: must be strictly positive.
pub fn parse_add_quantity(quantity: i64) -> Result<u32, axum::response::Response> {
    u32::try_from(quantity).ok().filter(|q| *q > 0).ok_or_else(|| {
        json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "quantity must be greater than zero",
        )
    })
}

/// Quantity in a patch: zero means removal, negative is rejected.
pub fn parse_patch_quantity(
    quantity: Option<i64>,
) -> Result<Option<u32>, axum::response::Response> {
    match quantity {
        None => Ok(None),
        Some(q) => u32::try_from(q).map(Some).map_err(|_| {
            json_error(
                StatusCode::BAD_REQUEST,
                "validation_error",
                "quantity must not be negative",
            )
        }),
    }
}
