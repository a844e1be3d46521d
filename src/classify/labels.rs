//! The fruit and vegetable label table.

use serde::Serialize;

/// Coarse grouping shown next to a prediction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FoodCategory {
    Fruit,
    Vegetable,
    Unknown,
}

impl std::fmt::Display for FoodCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FoodCategory::Fruit => "Fruit",
            FoodCategory::Vegetable => "Vegetables",
            FoodCategory::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

use FoodCategory::{Fruit, Vegetable};

/// Output index of the fruit/vegetable model, in order.
pub(crate) const FRUIT_VEG_LABELS: [(&str, FoodCategory); 36] = [
    ("apple", Fruit),
    ("banana", Fruit),
    ("beetroot", Vegetable),
    ("bell pepper", Fruit),
    ("cabbage", Vegetable),
    ("capsicum", Vegetable),
    ("carrot", Vegetable),
    ("cauliflower", Vegetable),
    ("chilli pepper", Fruit),
    ("corn", Vegetable),
    ("cucumber", Vegetable),
    ("eggplant", Vegetable),
    ("garlic", Vegetable),
    ("ginger", Vegetable),
    ("grapes", Fruit),
    ("jalepeno", Fruit),
    ("kiwi", Fruit),
    ("lemon", Fruit),
    ("lettuce", Vegetable),
    ("mango", Fruit),
    ("onion", Vegetable),
    ("orange", Fruit),
    ("paprika", Fruit),
    ("pear", Fruit),
    ("peas", Vegetable),
    ("pineapple", Fruit),
    ("pomegranate", Fruit),
    ("potato", Vegetable),
    ("raddish", Vegetable),
    ("soy beans", Vegetable),
    ("spinach", Vegetable),
    ("sweetcorn", Vegetable),
    ("sweetpotato", Vegetable),
    ("tomato", Vegetable),
    ("turnip", Vegetable),
    ("watermelon", Fruit),
];
