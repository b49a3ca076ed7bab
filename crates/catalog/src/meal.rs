//! Read-side view of the meal catalog.
//!
//! Meal/category CRUD is owned by a separate service; this backend only needs
//! the name and current price of a meal at the moment a line item is added.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use mokka_core::MealId;

/// Point-in-time view of a meal, copied into cart lines at add time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealSnapshot {
    pub id: MealId,
    pub name: String,
    pub unit_price: Decimal,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog backend could not be reached or answered garbage.
    #[error("meal catalog unavailable: {0}")]
    Unavailable(String),
}

/// Collaborator interface onto the external meal catalog.
///
/// `Ok(None)` means "no such meal"; the caller decides whether that is an
/// error in its context.
#[async_trait]
pub trait MealLookup: Send + Sync {
    async fn get(&self, meal_id: MealId) -> Result<Option<MealSnapshot>, CatalogError>;
}

#[async_trait]
impl<T> MealLookup for Arc<T>
where
    T: MealLookup + ?Sized,
{
    async fn get(&self, meal_id: MealId) -> Result<Option<MealSnapshot>, CatalogError> {
        (**self).get(meal_id).await
    }
}

/// In-memory catalog for dev/tests.
///
/// Mutations exist so tests can exercise snapshot semantics (reprice or
/// delete a meal after it was carted).
#[derive(Debug, Default)]
pub struct InMemoryMealCatalog {
    meals: Mutex<HashMap<MealId, MealSnapshot>>,
}

impl InMemoryMealCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, meal: MealSnapshot) {
        if let Ok(mut meals) = self.meals.lock() {
            meals.insert(meal.id, meal);
        }
    }

    pub fn remove(&self, meal_id: MealId) {
        if let Ok(mut meals) = self.meals.lock() {
            meals.remove(&meal_id);
        }
    }
}

#[async_trait]
impl MealLookup for InMemoryMealCatalog {
    async fn get(&self, meal_id: MealId) -> Result<Option<MealSnapshot>, CatalogError> {
        let meals = self
            .meals
            .lock()
            .map_err(|_| CatalogError::Unavailable("catalog lock poisoned".to_string()))?;
        Ok(meals.get(&meal_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn lookup_returns_none_for_unknown_meal() {
        let catalog = InMemoryMealCatalog::new();
        assert!(catalog.get(MealId::from_i64(1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn removed_meal_stops_resolving() {
        let catalog = InMemoryMealCatalog::new();
        let id = MealId::from_i64(1);
        catalog.insert(MealSnapshot {
            id,
            name: "flat white".to_string(),
            unit_price: dec!(4.50),
        });

        assert_eq!(
            catalog.get(id).await.unwrap().unwrap().unit_price,
            dec!(4.50)
        );

        catalog.remove(id);
        assert!(catalog.get(id).await.unwrap().is_none());
    }
}
