use std::fmt;
use std::str::FromStr;

use anyhow::bail;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Date format shared by every `date` field: zero-padded, so lexical order
/// equals calendar order.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    /// Display order used when grouping a day's entries.
    pub const ALL: [MealType; 4] = [
        MealType::Breakfast,
        MealType::Lunch,
        MealType::Dinner,
        MealType::Snack,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "breakfast" => Ok(MealType::Breakfast),
            "lunch" => Ok(MealType::Lunch),
            "dinner" => Ok(MealType::Dinner),
            "snack" => Ok(MealType::Snack),
            _ => bail!(
                "Invalid meal type '{s}'. Must be one of: {}",
                MEAL_TYPES.join(", ")
            ),
        }
    }
}

pub const MEAL_TYPES: &[&str] = &["breakfast", "lunch", "dinner", "snack"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodEntry {
    pub id: String,
    pub name: String,
    pub calories: i64,
    pub serving: Option<String>,
    pub meal_type: MealType,
    pub date: String,
    pub timestamp: DateTime<Utc>,
}

impl FoodEntry {
    /// Merge a patch into this record. `id` and `timestamp` are never touched.
    pub fn apply(&mut self, patch: FoodEntryPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(calories) = patch.calories {
            self.calories = calories;
        }
        if let Some(serving) = patch.serving {
            self.serving = serving;
        }
        if let Some(meal_type) = patch.meal_type {
            self.meal_type = meal_type;
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFoodEntry {
    pub name: String,
    pub calories: i64,
    pub serving: Option<String>,
    pub meal_type: MealType,
    pub date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[allow(clippy::option_option)]
pub struct FoodEntryPatch {
    pub name: Option<String>,
    pub calories: Option<i64>,
    /// `Some(None)` clears the serving, `None` leaves it unchanged.
    pub serving: Option<Option<String>>,
    pub meal_type: Option<MealType>,
    pub date: Option<String>,
}

impl FoodEntryPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.calories.is_none()
            && self.serving.is_none()
            && self.meal_type.is_none()
            && self.date.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalorieGoal {
    pub id: String,
    pub daily_calories_goal: i64,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCalorieGoal {
    pub daily_calories_goal: i64,
    pub date: String,
}
