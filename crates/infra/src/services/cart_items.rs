//! The cart-item ledger: line-item CRUD plus propagation of the cart total.
//!
//! Every mutation goes through the store inside one per-cart-serialized
//! transaction that hands back the live items total; the ledger publishes
//! that absolute total as a `CartTotalChanged` event. The cached
//! `cart.total_price` is written later by the totals projector, so callers
//! may observe a read-after-write gap on the aggregate while the line items
//! themselves are immediately consistent.

use rust_decimal::Decimal;

use mokka_cart::{line_total, Cart, CartItem, CartItemPatch, NewCartItem};
use mokka_catalog::MealLookup;
use mokka_core::{CartItemId, MealId, UserId};
use mokka_events::{CartTotalChanged, EventBus, EventPublisher};

use crate::error::ServiceError;
use crate::stores::{CartItemStore, CartStore};

/// Result of a line-item patch: quantity 0 removes the row instead of
/// updating it.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    Updated(CartItem),
    Removed,
}

pub struct CartItemLedger<S, I, M, B> {
    carts: S,
    items: I,
    meals: M,
    publisher: EventPublisher<B>,
}

impl<S, I, M, B> CartItemLedger<S, I, M, B>
where
    S: CartStore,
    I: CartItemStore,
    M: MealLookup,
    B: EventBus,
{
    pub fn new(carts: S, items: I, meals: M, publisher: EventPublisher<B>) -> Self {
        Self {
            carts,
            items,
            meals,
            publisher,
        }
    }

    /// Add a meal to the user's cart.
    ///
    /// If the meal is already in the cart the quantities merge into the
    /// existing line; the line carries its frozen name/price snapshot, so the
    /// catalog is not consulted again on merge.
    pub async fn add_item(
        &self,
        user_id: UserId,
        meal_id: MealId,
        quantity: u32,
    ) -> Result<CartItem, ServiceError> {
        if quantity == 0 {
            tracing::warn!(%user_id, %meal_id, "rejecting add with zero quantity");
            return Err(ServiceError::InvalidQuantity);
        }

        tracing::info!(%user_id, %meal_id, quantity, "adding item to cart");
        let cart = self.require_cart(user_id).await?;

        if let Some(existing) = self.items.get_by_cart_and_meal(cart.id, meal_id).await? {
            let merged = existing.quantity + quantity;
            tracing::info!(
                item_id = %existing.id,
                from = existing.quantity,
                to = merged,
                "meal already in cart, merging quantities"
            );
            return self.set_quantity(user_id, existing, merged).await;
        }

        let meal = match self.meals.get(meal_id).await? {
            Some(meal) => meal,
            None => {
                tracing::warn!(%meal_id, "meal was not found");
                return Err(ServiceError::MealNotFound(meal_id));
            }
        };

        let item = NewCartItem::new(cart.id, meal_id, meal.name, quantity, meal.unit_price)?;
        let (stored, items_total) = self.items.insert(item).await?;
        self.publish_total(user_id, items_total)?;

        tracing::info!(%user_id, item_id = %stored.id, "cart item added");
        Ok(stored)
    }

    pub async fn get_items(&self, user_id: UserId) -> Result<Vec<CartItem>, ServiceError> {
        let cart = self.require_cart(user_id).await?;
        let items = self.items.list_by_cart(cart.id).await?;
        tracing::debug!(%user_id, count = items.len(), "fetched cart items");
        Ok(items)
    }

    pub async fn get_item(
        &self,
        user_id: UserId,
        item_id: CartItemId,
    ) -> Result<CartItem, ServiceError> {
        let cart = self.require_cart(user_id).await?;
        self.require_owned_item(&cart, item_id).await
    }

    /// Apply a patch to a line item.
    ///
    /// `quantity: Some(0)` removes the line (and is reported as
    /// [`UpdateOutcome::Removed`]); an empty patch is rejected.
    pub async fn update_item(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        patch: CartItemPatch,
    ) -> Result<UpdateOutcome, ServiceError> {
        if patch.is_empty() {
            tracing::warn!(%user_id, %item_id, "no update data provided");
            return Err(ServiceError::NoUpdateData);
        }

        let cart = self.require_cart(user_id).await?;
        let item = self.require_owned_item(&cart, item_id).await?;

        match patch.quantity {
            Some(0) => {
                tracing::info!(%item_id, "quantity set to 0, removing cart item");
                self.remove_owned(user_id, item).await?;
                Ok(UpdateOutcome::Removed)
            }
            Some(quantity) => Ok(UpdateOutcome::Updated(
                self.set_quantity(user_id, item, quantity).await?,
            )),
            None => Err(ServiceError::NoUpdateData),
        }
    }

    pub async fn remove_item(
        &self,
        user_id: UserId,
        item_id: CartItemId,
    ) -> Result<(), ServiceError> {
        let cart = self.require_cart(user_id).await?;
        let item = self.require_owned_item(&cart, item_id).await?;
        self.remove_owned(user_id, item).await
    }

    /// Clear the cart. Requires at least one line item.
    pub async fn remove_all_items(&self, user_id: UserId) -> Result<(), ServiceError> {
        let cart = self.require_cart(user_id).await?;

        let items = self.items.list_by_cart(cart.id).await?;
        if items.is_empty() {
            tracing::warn!(%user_id, "cart items were not found");
            return Err(ServiceError::CartItemsNotFound(user_id));
        }

        let removed = self.items.delete_all_by_cart(cart.id).await?;
        self.publish_total(user_id, Decimal::ZERO)?;

        tracing::info!(%user_id, removed, "cart cleared");
        Ok(())
    }

    async fn require_cart(&self, user_id: UserId) -> Result<Cart, ServiceError> {
        match self.carts.get_by_user(user_id).await? {
            Some(cart) => Ok(cart),
            None => {
                tracing::warn!(%user_id, "cart was not found");
                Err(ServiceError::CartNotFound(user_id))
            }
        }
    }

    async fn require_owned_item(
        &self,
        cart: &Cart,
        item_id: CartItemId,
    ) -> Result<CartItem, ServiceError> {
        match self.items.get(item_id).await? {
            Some(item) if item.cart_id == cart.id => Ok(item),
            _ => {
                tracing::warn!(%item_id, cart_id = %cart.id, "cart item was not found in cart");
                Err(ServiceError::CartItemNotFound(item_id))
            }
        }
    }

    async fn set_quantity(
        &self,
        user_id: UserId,
        item: CartItem,
        quantity: u32,
    ) -> Result<CartItem, ServiceError> {
        let total_price = line_total(quantity, item.unit_price);
        match self
            .items
            .update_quantity(item.id, quantity, total_price)
            .await?
        {
            Some((updated, items_total)) => {
                self.publish_total(user_id, items_total)?;
                tracing::info!(%user_id, item_id = %updated.id, quantity, "cart item updated");
                Ok(updated)
            }
            None => {
                tracing::warn!(item_id = %item.id, "cart item vanished during update");
                Err(ServiceError::CartItemNotFound(item.id))
            }
        }
    }

    async fn remove_owned(&self, user_id: UserId, item: CartItem) -> Result<(), ServiceError> {
        match self.items.delete(item.id).await? {
            Some(items_total) => {
                self.publish_total(user_id, items_total)?;
                tracing::info!(%user_id, item_id = %item.id, "cart item removed");
                Ok(())
            }
            None => {
                tracing::warn!(item_id = %item.id, "cart item vanished during removal");
                Err(ServiceError::CartItemNotFound(item.id))
            }
        }
    }

    fn publish_total(&self, user_id: UserId, total_price: Decimal) -> Result<(), ServiceError> {
        tracing::debug!(%user_id, %total_price, "publishing cart total update");
        self.publisher
            .publish(&CartTotalChanged::new(user_id, total_price))?;
        Ok(())
    }
}
