//! Request shapes accepted at the API/CLI boundary and the rules that turn
//! them into model values. The store assumes its input already passed here.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::models::{FoodEntryPatch, MealType, NewCalorieGoal, NewFoodEntry};

/// Largest accepted calorie count or daily goal; both are 32-bit integer columns.
pub const MAX_CALORIES: i64 = 2_147_483_647;

static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("date pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid data: {}", join_issues(.issues))]
pub struct ValidationError {
    pub issues: Vec<FieldIssue>,
}

fn join_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Default)]
struct Issues(Vec<FieldIssue>);

impl Issues {
    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldIssue {
            field,
            message: message.into(),
        });
    }

    fn finish<T>(self, value: T) -> Result<T, ValidationError> {
        if self.0.is_empty() {
            Ok(value)
        } else {
            Err(ValidationError { issues: self.0 })
        }
    }
}

/// Whether `date` has the `YYYY-MM-DD` shape.
#[must_use]
pub fn is_valid_date(date: &str) -> bool {
    DATE_RE.is_match(date)
}

fn check_name(issues: &mut Issues, name: &str) -> String {
    let name = name.trim();
    if name.is_empty() {
        issues.push("name", "Name must not be empty");
    }
    name.to_string()
}

fn check_calories(issues: &mut Issues, calories: i64) {
    if calories < 0 {
        issues.push("calories", "Calories must be a positive number");
    } else if calories > MAX_CALORIES {
        issues.push("calories", format!("Calories must be at most {MAX_CALORIES}"));
    }
}

fn check_meal_type(issues: &mut Issues, meal_type: &str) -> Option<MealType> {
    match meal_type.parse() {
        Ok(m) => Some(m),
        Err(e) => {
            issues.push("mealType", e.to_string());
            None
        }
    }
}

fn check_date(issues: &mut Issues, field: &'static str, date: &str) {
    if !is_valid_date(date) {
        issues.push(field, format!("Invalid date format '{date}'. Use YYYY-MM-DD"));
    }
}

/// Blank servings are stored as absent.
fn normalize_serving(serving: Option<String>) -> Option<String> {
    serving.filter(|s| !s.trim().is_empty())
}

fn reject_null<T>(
    issues: &mut Issues,
    field: &'static str,
    value: Option<Option<T>>,
) -> Option<T> {
    match value {
        Some(None) => {
            issues.push(field, "Must not be null");
            None
        }
        Some(Some(v)) => Some(v),
        None => None,
    }
}

fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodEntryInput {
    pub name: String,
    pub calories: i64,
    #[serde(default)]
    pub serving: Option<String>,
    pub meal_type: String,
    pub date: String,
}

impl FoodEntryInput {
    pub fn validate(self) -> Result<NewFoodEntry, ValidationError> {
        let mut issues = Issues::default();
        let name = check_name(&mut issues, &self.name);
        check_calories(&mut issues, self.calories);
        let meal_type = check_meal_type(&mut issues, &self.meal_type);
        check_date(&mut issues, "date", &self.date);

        match meal_type {
            Some(meal_type) => issues.finish(NewFoodEntry {
                name,
                calories: self.calories,
                serving: normalize_serving(self.serving),
                meal_type,
                date: self.date,
            }),
            None => Err(ValidationError { issues: issues.0 }),
        }
    }
}

/// Every key is optional. An explicit `null` clears `serving` and is
/// rejected on the other fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::option_option)]
pub struct FoodEntryPatchInput {
    #[serde(default, deserialize_with = "deserialize_some")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub calories: Option<Option<i64>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub serving: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub meal_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub date: Option<Option<String>>,
}

impl FoodEntryPatchInput {
    pub fn validate(self) -> Result<FoodEntryPatch, ValidationError> {
        let mut issues = Issues::default();
        let name = reject_null(&mut issues, "name", self.name)
            .map(|n| check_name(&mut issues, &n));
        let calories = reject_null(&mut issues, "calories", self.calories);
        if let Some(calories) = calories {
            check_calories(&mut issues, calories);
        }
        let meal_type = reject_null(&mut issues, "mealType", self.meal_type)
            .and_then(|m| check_meal_type(&mut issues, &m));
        let date = reject_null(&mut issues, "date", self.date);
        if let Some(date) = &date {
            check_date(&mut issues, "date", date);
        }

        issues.finish(FoodEntryPatch {
            name,
            calories,
            serving: self.serving.map(normalize_serving),
            meal_type,
            date,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalorieGoalInput {
    pub daily_calories_goal: i64,
    pub date: String,
}

impl CalorieGoalInput {
    pub fn validate(self) -> Result<NewCalorieGoal, ValidationError> {
        let mut issues = Issues::default();
        if self.daily_calories_goal < 1 {
            issues.push(
                "dailyCaloriesGoal",
                "Daily calorie goal must be at least 1",
            );
        } else if self.daily_calories_goal > MAX_CALORIES {
            issues.push(
                "dailyCaloriesGoal",
                format!("Daily calorie goal must be at most {MAX_CALORIES}"),
            );
        }
        check_date(&mut issues, "date", &self.date);
        issues.finish(NewCalorieGoal {
            daily_calories_goal: self.daily_calories_goal,
            date: self.date,
        })
    }
}
