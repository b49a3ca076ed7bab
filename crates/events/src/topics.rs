//! Logical topic names shared by publishers and consumers.

/// Carries `CartTotalChanged` payloads.
pub const TOPIC_CART_UPDATED: &str = "cart-updated";

/// Carries `UserCreated` payloads (published by the registration service).
pub const TOPIC_USER_CREATED: &str = "user-created";
