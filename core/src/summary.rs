use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use crate::models::{DATE_FORMAT, FoodEntry, MealType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    OnTrack,
    BelowGoal,
    OverGoal,
}

impl GoalStatus {
    /// Within 80%..=120% of the goal counts as on track.
    #[must_use]
    pub fn classify(total: i64, goal: i64) -> Self {
        let (total, goal) = (i128::from(total), i128::from(goal));
        if total * 10 < goal * 8 {
            GoalStatus::BelowGoal
        } else if total * 10 > goal * 12 {
            GoalStatus::OverGoal
        } else {
            GoalStatus::OnTrack
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            GoalStatus::OnTrack => "On track",
            GoalStatus::BelowGoal => "Below goal",
            GoalStatus::OverGoal => "Over goal",
        }
    }
}

fn sum_calories(calories: impl Iterator<Item = i64>) -> i64 {
    calories.fold(0, i64::saturating_add)
}

#[allow(clippy::cast_precision_loss)]
fn percent_of(total: i64, goal: i64) -> f64 {
    let goal = goal.max(1);
    (total as f64 / goal as f64 * 100.0).min(100.0)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MealGroup {
    pub meal_type: MealType,
    pub entries: Vec<FoodEntry>,
    pub subtotal_calories: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub date: String,
    pub meals: Vec<MealGroup>,
    pub total_calories: i64,
    pub daily_calories_goal: i64,
    pub remaining_calories: i64,
    pub progress_pct: f64,
    pub status: GoalStatus,
}

impl DailySummary {
    /// `entries` should already be in display order; groups keep it.
    #[must_use]
    pub fn build(date: &str, entries: Vec<FoodEntry>, daily_goal: i64) -> Self {
        let total_calories = sum_calories(entries.iter().map(|e| e.calories));

        let mut meals = Vec::new();
        for meal_type in MealType::ALL {
            let group: Vec<FoodEntry> = entries
                .iter()
                .filter(|e| e.meal_type == meal_type)
                .cloned()
                .collect();
            if group.is_empty() {
                continue;
            }
            let subtotal_calories = sum_calories(group.iter().map(|e| e.calories));
            meals.push(MealGroup {
                meal_type,
                entries: group,
                subtotal_calories,
            });
        }

        DailySummary {
            date: date.to_string(),
            meals,
            total_calories,
            daily_calories_goal: daily_goal,
            remaining_calories: daily_goal.saturating_sub(total_calories).max(0),
            progress_pct: percent_of(total_calories, daily_goal),
            status: GoalStatus::classify(total_calories, daily_goal),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayProgress {
    pub date: String,
    pub weekday: String,
    pub calories: i64,
    pub daily_calories_goal: i64,
    pub progress_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyProgress {
    pub start_date: String,
    pub end_date: String,
    pub days: Vec<DayProgress>,
    pub total_calories: i64,
    pub average_daily_calories: i64,
}

/// Monday and Sunday of the week containing `date`.
#[must_use]
pub fn week_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let monday = date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
    (monday, monday + Duration::days(6))
}

impl WeeklyProgress {
    /// `entries` may span more than the week; only days inside it count.
    pub fn build(
        date: NaiveDate,
        entries: &[FoodEntry],
        mut goal_for: impl FnMut(&str) -> i64,
    ) -> Self {
        let (monday, sunday) = week_bounds(date);

        let days: Vec<DayProgress> = monday
            .iter_days()
            .take(7)
            .map(|day| {
                let key = day.format(DATE_FORMAT).to_string();
                let calories = sum_calories(
                    entries
                        .iter()
                        .filter(|e| e.date == key)
                        .map(|e| e.calories),
                );
                let goal = goal_for(&key);
                DayProgress {
                    weekday: day.weekday().to_string(),
                    calories,
                    daily_calories_goal: goal,
                    progress_pct: percent_of(calories, goal),
                    date: key,
                }
            })
            .collect();

        let total_calories = sum_calories(days.iter().map(|d| d.calories));
        // round(total / 7); a seventh never lands exactly on .5
        let average_daily_calories =
            i64::try_from((i128::from(total_calories) * 2 + 7) / 14).unwrap_or(i64::MAX);

        WeeklyProgress {
            start_date: monday.format(DATE_FORMAT).to_string(),
            end_date: sunday.format(DATE_FORMAT).to_string(),
            days,
            total_calories,
            average_daily_calories,
        }
    }
}
