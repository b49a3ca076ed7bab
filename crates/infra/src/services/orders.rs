//! Order assembly: converting a cart's current contents into a durable order.

use rust_decimal::Decimal;

use mokka_cart::Cart;
use mokka_core::{OrderId, UserId};
use mokka_events::{CartTotalChanged, EventBus, EventPublisher};
use mokka_orders::{NewOrder, Order, OrderDraft};

use crate::error::ServiceError;
use crate::stores::{CartItemStore, CartStore, OrderStore};

pub struct OrderAssembler<S, I, O, B> {
    carts: S,
    items: I,
    orders: O,
    publisher: EventPublisher<B>,
}

impl<S, I, O, B> OrderAssembler<S, I, O, B>
where
    S: CartStore,
    I: CartItemStore,
    O: OrderStore,
    B: EventBus,
{
    pub fn new(carts: S, items: I, orders: O, publisher: EventPublisher<B>) -> Self {
        Self {
            carts,
            items,
            orders,
            publisher,
        }
    }

    /// Place an order from the user's cart.
    ///
    /// The order freezes the cart's **cached** total and copies every line
    /// verbatim. Order insert, item inserts and the cart drain are one store
    /// transaction; the `CartTotalChanged(0)` event goes out after commit so
    /// the cached aggregate catches up with the drained cart.
    pub async fn create_order(
        &self,
        user_id: UserId,
        draft: OrderDraft,
    ) -> Result<Order, ServiceError> {
        tracing::info!(%user_id, "creating order");
        let cart = self.require_cart(user_id).await?;

        let items = self.items.list_by_cart(cart.id).await?;
        if items.is_empty() {
            tracing::warn!(%user_id, "no cart items to order");
            return Err(ServiceError::CartItemsNotFound(user_id));
        }

        let new_order = NewOrder::from_cart(&cart, &items, draft)?;
        tracing::debug!(
            %user_id,
            item_count = new_order.items.len(),
            total = %new_order.total_price,
            "assembling order snapshot"
        );

        let order = self.orders.create_from_cart(new_order).await?;

        self.publisher
            .publish(&CartTotalChanged::new(user_id, Decimal::ZERO))?;

        tracing::info!(%user_id, order_id = %order.id, "order created");
        Ok(order)
    }

    pub async fn get_orders(&self, user_id: UserId) -> Result<Vec<Order>, ServiceError> {
        let orders = self.orders.list_by_user(user_id).await?;
        if orders.is_empty() {
            tracing::warn!(%user_id, "orders were not found");
            return Err(ServiceError::OrdersNotFound(user_id));
        }

        tracing::debug!(%user_id, count = orders.len(), "fetched orders");
        Ok(orders)
    }

    pub async fn get_order(
        &self,
        user_id: UserId,
        order_id: OrderId,
    ) -> Result<Order, ServiceError> {
        match self.orders.get_by_user_and_id(user_id, order_id).await? {
            Some(order) => Ok(order),
            None => {
                tracing::warn!(%user_id, %order_id, "order was not found");
                Err(ServiceError::OrderNotFound(user_id, order_id))
            }
        }
    }

    pub async fn delete_order(
        &self,
        user_id: UserId,
        order_id: OrderId,
    ) -> Result<(), ServiceError> {
        if !self.orders.delete_one(user_id, order_id).await? {
            tracing::warn!(%user_id, %order_id, "order was not found during deletion");
            return Err(ServiceError::OrderNotFound(user_id, order_id));
        }

        tracing::info!(%user_id, %order_id, "order deleted");
        Ok(())
    }

    pub async fn delete_orders(&self, user_id: UserId) -> Result<(), ServiceError> {
        let deleted = self.orders.delete_all(user_id).await?;
        if deleted == 0 {
            tracing::warn!(%user_id, "orders were not found during deletion");
            return Err(ServiceError::OrdersNotFound(user_id));
        }

        tracing::info!(%user_id, deleted, "orders deleted");
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
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal_macros::dec;

    use mokka_catalog::{InMemoryMealCatalog, MealSnapshot};
    use mokka_core::MealId;
    use mokka_events::{InMemoryEventBus, Subscription, TOPIC_CART_UPDATED};
    use mokka_orders::{DeliveryDetails, OrderStatus, PaymentMethod, PaymentStatus};

    use super::*;
    use crate::services::CartItemLedger;
    use crate::stores::{
        CartStore as _, InMemoryCartItemStore, InMemoryCartStore, InMemoryOrderStore,
    };

    const USER: UserId = UserId::from_i64(1);
    const MEAL: MealId = MealId::from_i64(1);

    struct Fixture {
        carts: Arc<InMemoryCartStore>,
        catalog: Arc<InMemoryMealCatalog>,
        ledger: CartItemLedger<
            Arc<InMemoryCartStore>,
            Arc<InMemoryCartItemStore>,
            Arc<InMemoryMealCatalog>,
            Arc<dyn EventBus>,
        >,
        assembler: OrderAssembler<
            Arc<InMemoryCartStore>,
            Arc<InMemoryCartItemStore>,
            Arc<InMemoryOrderStore>,
            Arc<dyn EventBus>,
        >,
        published: Subscription<mokka_events::EventMessage>,
    }

    async fn fixture() -> Fixture {
        let carts = Arc::new(InMemoryCartStore::new());
        let items = Arc::new(InMemoryCartItemStore::new());
        let orders = Arc::new(InMemoryOrderStore::new(items.clone()));
        let catalog = Arc::new(InMemoryMealCatalog::new());
        let bus: Arc<dyn EventBus> = Arc::new(InMemoryEventBus::new());
        let published = bus.subscribe(TOPIC_CART_UPDATED, "test-observer");

        catalog.insert(MealSnapshot {
            id: MEAL,
            name: "plov".to_string(),
            unit_price: dec!(5.00),
        });
        carts.create(USER).await.unwrap();

        let ledger = CartItemLedger::new(
            carts.clone(),
            items.clone(),
            catalog.clone(),
            EventPublisher::new(bus.clone()),
        );
        let assembler = OrderAssembler::new(
            carts.clone(),
            items,
            orders,
            EventPublisher::new(bus),
        );

        Fixture {
            carts,
            catalog,
            ledger,
            assembler,
            published,
        }
    }

    fn draft() -> OrderDraft {
        OrderDraft {
            delivery: DeliveryDetails {
                delivery_address: "12 Navoi street".to_string(),
                delivery_latitude: dec!(41.311),
                delivery_longitude: dec!(69.279),
                house_number: "12".to_string(),
                entrance_number: Some("3".to_string()),
                level: None,
                apartment_number: Some("17".to_string()),
                delivery_notes: None,
                phone_number: Some("+998900000000".to_string()),
            },
            payment_method: PaymentMethod::Card,
            scheduled_time: None,
        }
    }

    async fn last_published_total(sub: &mut Subscription<mokka_events::EventMessage>) -> Decimal {
        let mut last = None;
        while let Ok(message) = sub.try_recv() {
            let event: CartTotalChanged = serde_json::from_value(message.into_payload()).unwrap();
            last = Some(event.total_price());
        }
        last.expect("no CartTotalChanged was published")
    }

    #[tokio::test]
    async fn placing_an_order_freezes_the_cached_total_and_drains_the_cart() {
        let mut fx = fixture().await;

        fx.ledger.add_item(USER, MEAL, 2).await.unwrap();
        // Simulate the projector having applied the published total.
        fx.carts.set_total_by_user(USER, dec!(10.00)).await.unwrap();

        let order = fx.assembler.create_order(USER, draft()).await.unwrap();

        assert_eq!(order.user_id, USER);
        assert_eq!(order.total_price, dec!(10.00));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].meal_name, "plov");
        assert_eq!(order.items[0].quantity, 2);

        // Cart is empty and the drain was announced as an absolute zero.
        let items = fx.ledger.get_items(USER).await.unwrap();
        assert!(items.is_empty());
        assert_eq!(last_published_total(&mut fx.published).await, dec!(0));
    }

    #[tokio::test]
    async fn order_total_is_whatever_the_cache_said_at_placement() {
        let fx = fixture().await;

        fx.ledger.add_item(USER, MEAL, 2).await.unwrap();
        // A stale cache is frozen as-is; the assembler never recomputes.
        fx.carts.set_total_by_user(USER, dec!(999.99)).await.unwrap();

        let order = fx.assembler.create_order(USER, draft()).await.unwrap();
        assert_eq!(order.total_price, dec!(999.99));
    }

    #[tokio::test]
    async fn an_empty_cart_cannot_be_ordered() {
        let fx = fixture().await;

        let err = fx.assembler.create_order(USER, draft()).await.unwrap_err();
        assert!(matches!(err, ServiceError::CartItemsNotFound(_)));

        let err = fx
            .assembler
            .create_order(UserId::from_i64(9), draft())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::CartNotFound(_)));
    }

    #[tokio::test]
    async fn order_snapshot_survives_catalog_mutation_and_deletion() {
        let fx = fixture().await;

        fx.ledger.add_item(USER, MEAL, 3).await.unwrap();
        fx.carts.set_total_by_user(USER, dec!(15.00)).await.unwrap();
        let placed = fx.assembler.create_order(USER, draft()).await.unwrap();

        // Reprice, then delete, the originating meal.
        fx.catalog.insert(MealSnapshot {
            id: MEAL,
            name: "plov deluxe".to_string(),
            unit_price: dec!(12.00),
        });
        fx.catalog.remove(MEAL);

        let reread = fx.assembler.get_order(USER, placed.id).await.unwrap();
        assert_eq!(reread.items[0].meal_name, "plov");
        assert_eq!(reread.items[0].unit_price, dec!(5.00));
        assert_eq!(reread.items[0].total_price, dec!(15.00));
        assert_eq!(reread.total_price, dec!(15.00));
    }

    #[tokio::test]
    async fn order_reads_and_deletes_have_not_found_semantics() {
        let fx = fixture().await;

        let err = fx.assembler.get_orders(USER).await.unwrap_err();
        assert!(matches!(err, ServiceError::OrdersNotFound(_)));

        let err = fx
            .assembler
            .get_order(USER, OrderId::from_i64(5))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::OrderNotFound(_, _)));

        let err = fx
            .assembler
            .delete_order(USER, OrderId::from_i64(5))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::OrderNotFound(_, _)));

        let err = fx.assembler.delete_orders(USER).await.unwrap_err();
        assert!(matches!(err, ServiceError::OrdersNotFound(_)));

        fx.ledger.add_item(USER, MEAL, 1).await.unwrap();
        let order = fx.assembler.create_order(USER, draft()).await.unwrap();

        assert_eq!(fx.assembler.get_orders(USER).await.unwrap().len(), 1);
        fx.assembler.delete_order(USER, order.id).await.unwrap();
        let err = fx.assembler.get_orders(USER).await.unwrap_err();
        assert!(matches!(err, ServiceError::OrdersNotFound(_)));
    }
}
