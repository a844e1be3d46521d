//! Nutrition lookup for a recognized food name.
//!
//! Lookups go to an external service through the [`NutritionLookup`] trait.
//! Two services are provided: USDA FoodData Central ([`UsdaClient`]) and a
//! generative model ([`GeminiClient`]), which also names crops.

mod gemini;
mod usda;

pub use gemini::{extract_json_object, GeminiClient, GeminiConfig};
pub use usda::{parse_search_response, UsdaClient, UsdaClientConfig};

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

use crate::error::PlatescanError;

/// Nutrient name to amount, as reported by the service.
pub type Nutrition = BTreeMap<String, f64>;

/// Marker emitted in place of a nutrient table.
pub const NOT_FOUND: &str = "Not found";

/// Fetches nutrient amounts for a food name.
pub trait NutritionLookup {
    /// `Ok(None)` means the service answered but knows no such food.
    fn lookup(&self, food: &str) -> Result<Option<Nutrition>, PlatescanError>;
}

impl<N: NutritionLookup + ?Sized> NutritionLookup for &N {
    fn lookup(&self, food: &str) -> Result<Option<Nutrition>, PlatescanError> {
        (**self).lookup(food)
    }
}

/// Nutrition as it appears in output records: a table, or `"Not found"`.
#[derive(Clone, Debug, PartialEq)]
pub enum NutritionField {
    Found(Nutrition),
    NotFound,
}

impl NutritionField {
    pub fn is_found(&self) -> bool {
        matches!(self, NutritionField::Found(_))
    }

    /// Drops nutrients reported as exactly zero.
    pub fn without_zero_values(self) -> Self {
        match self {
            NutritionField::Found(table) => NutritionField::Found(without_zero_values(table)),
            NutritionField::NotFound => NutritionField::NotFound,
        }
    }
}

impl From<Option<Nutrition>> for NutritionField {
    fn from(value: Option<Nutrition>) -> Self {
        match value {
            Some(table) => NutritionField::Found(table),
            None => NutritionField::NotFound,
        }
    }
}

impl Serialize for NutritionField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            NutritionField::Found(table) => table.serialize(serializer),
            NutritionField::NotFound => serializer.serialize_str(NOT_FOUND),
        }
    }
}

pub fn without_zero_values(table: Nutrition) -> Nutrition {
    table.into_iter().filter(|(_, v)| *v != 0.0).collect()
}
