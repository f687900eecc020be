use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;

/// Keys of the weekly meal plan, in display order.
pub const WEEKDAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// The four per-account document slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Ingredients,
    Recipes,
    Shopping,
    MealPlan,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Ingredients,
        Category::Recipes,
        Category::Shopping,
        Category::MealPlan,
    ];

    /// Path segment used by the HTTP API.
    pub fn route(&self) -> &'static str {
        match self {
            Category::Ingredients => "ingredients",
            Category::Recipes => "recipes",
            Category::Shopping => "shopping",
            Category::MealPlan => "mealplan",
        }
    }

    /// Backing SQL table.
    pub fn table(&self) -> &'static str {
        match self {
            Category::Ingredients => "ingredients",
            Category::Recipes => "recipes",
            Category::Shopping => "shopping_lists",
            Category::MealPlan => "meal_plans",
        }
    }

    /// Document returned for an account that never wrote this slot.
    pub fn default_document(&self) -> Value {
        match self {
            Category::Ingredients => json!({
                "pantry": [],
                "fridge": [],
                "freezer": [],
            }),
            Category::Recipes | Category::Shopping => json!([]),
            Category::MealPlan => {
                let days: Map<String, Value> = WEEKDAYS
                    .iter()
                    .map(|day| {
                        (
                            day.to_string(),
                            json!({ "breakfast": null, "lunch": null, "dinner": null }),
                        )
                    })
                    .collect();
                Value::Object(days)
            }
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.route())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ingredients" => Ok(Category::Ingredients),
            "recipes" => Ok(Category::Recipes),
            "shopping" => Ok(Category::Shopping),
            "mealplan" | "meal-plan" => Ok(Category::MealPlan),
            _ => Err(format!(
                "Invalid category '{}'. Valid options: ingredients, recipes, shopping, mealplan",
                s
            )),
        }
    }
}

/// A document as persisted in a slot.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub data: Value,
    pub updated_at: DateTime<Utc>,
}
