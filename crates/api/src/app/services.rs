//! Infrastructure wiring: stores + bus + projectors + services.
//!
//! Handles are constructed once at process start and passed in explicitly;
//! the projector tasks spawned here live for the life of the process.

use std::sync::Arc;

use sqlx::PgPool;

use mokka_catalog::{InMemoryMealCatalog, MealLookup, MealSnapshot};
use mokka_core::MealId;
use mokka_events::{
    EventBus, EventPublisher, InMemoryEventBus, TOPIC_CART_UPDATED, TOPIC_USER_CREATED,
};
use mokka_infra::projections::{
    CartProvisioningProjection, CartTotalsProjection, CART_PROVISIONING_GROUP, CART_TOTALS_GROUP,
};
use mokka_infra::services::{CartItemLedger, CartService, OrderAssembler};
use mokka_infra::stores::{
    CartItemStore, CartStore, InMemoryCartItemStore, InMemoryCartStore, InMemoryOrderStore,
    OrderStore, PostgresCartItemStore, PostgresCartStore, PostgresMealLookup, PostgresOrderStore,
};
use rust_decimal_macros::dec;

pub type DynCartStore = Arc<dyn CartStore>;
pub type DynCartItemStore = Arc<dyn CartItemStore>;
pub type DynOrderStore = Arc<dyn OrderStore>;
pub type DynMealLookup = Arc<dyn MealLookup>;
pub type DynEventBus = Arc<dyn EventBus>;

/// Everything the HTTP handlers need, wired once at startup.
pub struct AppServices {
    pub carts: CartService<DynCartStore, DynCartItemStore>,
    pub cart_items: CartItemLedger<DynCartStore, DynCartItemStore, DynMealLookup, DynEventBus>,
    pub orders: OrderAssembler<DynCartStore, DynCartItemStore, DynOrderStore, DynEventBus>,
    /// Exposed so external producers (and tests) can publish onto the same bus.
    pub event_bus: DynEventBus,
}

pub async fn build_services() -> AppServices {
    let use_persistent = std::env::var("USE_PERSISTENT_STORES")
        .unwrap_or_else(|_| "false".to_string())
        .parse::<bool>()
        .unwrap_or(false);

    if use_persistent {
        build_persistent_services().await
    } else {
        build_in_memory_services()
    }
}

fn build_in_memory_services() -> AppServices {
    // In-memory wiring (dev/test): stores + bus + a small seeded menu so the
    // default process is exercisable end to end. In production the catalog
    // belongs to the external meal CRUD service.
    let carts = Arc::new(InMemoryCartStore::new());
    let items = Arc::new(InMemoryCartItemStore::new());
    let orders = Arc::new(InMemoryOrderStore::new(items.clone()));
    let catalog = Arc::new(InMemoryMealCatalog::new());
    seed_dev_menu(&catalog);

    let bus: DynEventBus = Arc::new(InMemoryEventBus::new());

    wire(carts, items, orders, catalog, bus)
}

async fn build_persistent_services() -> AppServices {
    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set when USE_PERSISTENT_STORES=true");

    let pool = PgPool::connect(&database_url)
        .await
        .expect("failed to connect to Postgres");

    let carts = Arc::new(PostgresCartStore::new(pool.clone()));
    let items = Arc::new(PostgresCartItemStore::new(pool.clone()));
    let orders = Arc::new(PostgresOrderStore::new(pool.clone()));
    let meals = Arc::new(PostgresMealLookup::new(pool));

    // The broker abstraction ships with the in-memory transport; a networked
    // broker client slots in behind the same `EventBus` trait.
    let bus: DynEventBus = Arc::new(InMemoryEventBus::new());

    wire(carts, items, orders, meals, bus)
}

fn wire<C, I, O, M>(carts: Arc<C>, items: Arc<I>, orders: Arc<O>, meals: Arc<M>, bus: DynEventBus) -> AppServices
where
    C: CartStore + 'static,
    I: CartItemStore + 'static,
    O: OrderStore + 'static,
    M: MealLookup + 'static,
{
    let carts: DynCartStore = carts;
    let items: DynCartItemStore = items;
    let orders: DynOrderStore = orders;
    let meals: DynMealLookup = meals;

    // Background consumers: bus -> cart projections. Subscriptions are taken
    // before the first request can publish, so nothing is missed.
    {
        let subscription = bus.subscribe(TOPIC_CART_UPDATED, CART_TOTALS_GROUP);
        let projection = CartTotalsProjection::new(carts.clone());
        tokio::spawn(async move { projection.run(subscription).await });
    }
    {
        let subscription = bus.subscribe(TOPIC_USER_CREATED, CART_PROVISIONING_GROUP);
        let projection = CartProvisioningProjection::new(carts.clone());
        tokio::spawn(async move { projection.run(subscription).await });
    }

    AppServices {
        carts: CartService::new(carts.clone(), items.clone()),
        cart_items: CartItemLedger::new(
            carts.clone(),
            items.clone(),
            meals,
            EventPublisher::new(bus.clone()),
        ),
        orders: OrderAssembler::new(carts, items, orders, EventPublisher::new(bus.clone())),
        event_bus: bus,
    }
}

fn seed_dev_menu(catalog: &InMemoryMealCatalog) {
    let menu = [
        (1, "plov", dec!(5.00)),
        (2, "lagman", dec!(4.50)),
        (3, "green tea", dec!(1.50)),
    ];

    for (id, name, unit_price) in menu {
        catalog.insert(MealSnapshot {
            id: MealId::from_i64(id),
            name: name.to_string(),
            unit_price,
        });
    }

    tracing::info!(meals = menu.len(), "seeded dev meal catalog");
}
