//! `mokka-catalog` — the narrow interface this backend consumes from the
//! external meal catalog service.

pub mod meal;

pub use meal::{CatalogError, InMemoryMealCatalog, MealLookup, MealSnapshot};
