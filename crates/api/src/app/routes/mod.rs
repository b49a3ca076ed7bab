use axum::{
    routing::{get, post},
    Router,
};

pub mod cart;
pub mod cart_items;
pub mod orders;
pub mod system;

/// Router for all user-scoped endpoints.
pub fn router() -> Router {
    Router::new().nest("/users", users_router())
}

fn users_router() -> Router {
    Router::new()
        .route(
            "/:user_id/cart",
            post(cart::create_cart)
                .get(cart::get_cart)
                .delete(cart::delete_cart),
        )
        .route(
            "/:user_id/cart/items",
            post(cart_items::add_item)
                .get(cart_items::list_items)
                .delete(cart_items::remove_all_items),
        )
        .route(
            "/:user_id/cart/items/:item_id",
            get(cart_items::get_item)
                .patch(cart_items::update_item)
                .delete(cart_items::remove_item),
        )
        .route(
            "/:user_id/orders",
            post(orders::create_order)
                .get(orders::list_orders)
                .delete(orders::delete_orders),
        )
        .route(
            "/:user_id/orders/:order_id",
            get(orders::get_order).delete(orders::delete_order),
        )
}
