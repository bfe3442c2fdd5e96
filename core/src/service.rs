use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::models::{
    CalorieGoal, DATE_FORMAT, FoodEntry, FoodEntryPatch, NewCalorieGoal, NewFoodEntry,
};
use crate::query;
use crate::store::{DateRange, MemoryStore, SqliteStore, Storage};
use crate::summary::{DailySummary, WeeklyProgress, week_bounds};

/// Entry point shared by the HTTP handlers and the CLI.
///
/// Inputs are assumed to have passed `schema` validation already. Misses come
/// back as `None`/`false`; the default-goal fallback is left to the caller.
#[derive(Clone)]
pub struct CalorieService {
    store: Arc<dyn Storage>,
}

impl CalorieService {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::with_storage(Arc::new(MemoryStore::new()))
    }

    pub fn open(path: &Path) -> Result<Self> {
        let store = SqliteStore::open(path)?;
        Ok(Self::with_storage(Arc::new(store)))
    }

    #[must_use]
    pub fn with_storage(store: Arc<dyn Storage>) -> Self {
        Self { store }
    }

    // --- Food entries ---

    pub fn create_food_entry(&self, entry: NewFoodEntry) -> Result<FoodEntry> {
        self.store.create_food_entry(entry)
    }

    pub fn update_food_entry(&self, id: &str, patch: FoodEntryPatch) -> Result<Option<FoodEntry>> {
        self.store.update_food_entry(id, patch)
    }

    pub fn delete_food_entry(&self, id: &str) -> Result<bool> {
        self.store.delete_food_entry(id)
    }

    pub fn get_food_entry(&self, id: &str) -> Result<Option<FoodEntry>> {
        self.store.get_food_entry(id)
    }

    // --- Queries ---

    pub fn get_food_entries(&self, date: &str) -> Result<Vec<FoodEntry>> {
        let entries = self.store.scan_food_entries(&DateRange::day(date))?;
        Ok(query::sort_by_creation(entries))
    }

    pub fn get_food_entries_range(&self, start: &str, end: &str) -> Result<Vec<FoodEntry>> {
        let entries = self
            .store
            .scan_food_entries(&DateRange::between(start, end))?;
        Ok(query::sort_by_creation(entries))
    }

    pub fn get_recent_foods(&self, limit: usize) -> Result<Vec<FoodEntry>> {
        let entries = self.store.scan_food_entries(&DateRange::All)?;
        Ok(query::recent_unique(entries, limit))
    }

    // --- Goals ---

    pub fn set_calorie_goal(&self, goal: NewCalorieGoal) -> Result<CalorieGoal> {
        self.store.set_calorie_goal(goal)
    }

    pub fn get_calorie_goal(&self, date: &str) -> Result<Option<CalorieGoal>> {
        self.store.get_calorie_goal(date)
    }

    // --- Aggregates ---

    pub fn daily_summary(&self, date: &str, daily_goal: i64) -> Result<DailySummary> {
        let entries = self.get_food_entries(date)?;
        Ok(DailySummary::build(date, entries, daily_goal))
    }

    /// Progress for the Monday-started week containing `date`. Days without a
    /// stored goal use `default_goal`.
    pub fn weekly_progress(&self, date: &str, default_goal: i64) -> Result<WeeklyProgress> {
        let day = NaiveDate::parse_from_str(date, DATE_FORMAT)
            .with_context(|| format!("Invalid date '{date}'. Use YYYY-MM-DD"))?;
        let (monday, sunday) = week_bounds(day);
        let start = monday.format(DATE_FORMAT).to_string();
        let end = sunday.format(DATE_FORMAT).to_string();

        let entries = self.get_food_entries_range(&start, &end)?;

        let mut goals = Vec::with_capacity(7);
        for d in monday.iter_days().take(7) {
            let key = d.format(DATE_FORMAT).to_string();
            if let Some(goal) = self.store.get_calorie_goal(&key)? {
                goals.push(goal);
            }
        }

        Ok(WeeklyProgress::build(day, &entries, |key| {
            goals
                .iter()
                .find(|g| g.date == key)
                .map_or(default_goal, |g| g.daily_calories_goal)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MealType;
    use crate::query::DEFAULT_RECENT_LIMIT;
    use crate::store::testing::ScriptedClock;

    fn ticking_service() -> CalorieService {
        let store = MemoryStore::with_clock(Arc::new(ScriptedClock::ticking(100)));
        CalorieService::with_storage(Arc::new(store))
    }

    fn new_entry(name: &str, calories: i64, meal_type: MealType, date: &str) -> NewFoodEntry {
        NewFoodEntry {
            name: name.to_string(),
            calories,
            serving: None,
            meal_type,
            date: date.to_string(),
        }
    }

    #[test]
    fn test_apple_and_toast_scenario() {
        let service = CalorieService::in_memory();
        let apple = service
            .create_food_entry(new_entry("Apple", 95, MealType::Snack, "2024-03-01"))
            .unwrap();
        let toast = service
            .create_food_entry(new_entry("Toast", 120, MealType::Breakfast, "2024-03-01"))
            .unwrap();

        let entries = service.get_food_entries("2024-03-01").unwrap();
        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec![apple.id.as_str(), toast.id.as_str()]);
        let total: i64 = entries.iter().map(|e| e.calories).sum();
        assert_eq!(total, 215);
    }

    #[test]
    fn test_entries_for_date_excludes_other_dates() {
        let service = ticking_service();
        service
            .create_food_entry(new_entry("A", 1, MealType::Lunch, "2024-03-01"))
            .unwrap();
        service
            .create_food_entry(new_entry("B", 2, MealType::Lunch, "2024-03-02"))
            .unwrap();
        service
            .create_food_entry(new_entry("C", 3, MealType::Lunch, "2024-03-01"))
            .unwrap();

        let names: Vec<String> = service
            .get_food_entries("2024-03-01")
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["A", "C"]);
        assert!(service.get_food_entries("2024-03-03").unwrap().is_empty());
    }

    #[test]
    fn test_entries_for_date_ordered_by_timestamp_not_logged_date() {
        let service = ticking_service();
        for name in ["first", "second", "third"] {
            service
                .create_food_entry(new_entry(name, 10, MealType::Dinner, "2024-02-01"))
                .unwrap();
        }
        let entries = service.get_food_entries("2024-02-01").unwrap();
        assert!(entries.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert_eq!(entries[0].name, "first");
        assert_eq!(entries[2].name, "third");
    }

    #[test]
    fn test_range_is_closed_interval() {
        let service = ticking_service();
        for date in ["2024-02-29", "2024-03-01", "2024-03-15", "2024-03-31", "2024-04-01"] {
            service
                .create_food_entry(new_entry(date, 100, MealType::Lunch, date))
                .unwrap();
        }
        let dates: Vec<String> = service
            .get_food_entries_range("2024-03-01", "2024-03-31")
            .unwrap()
            .into_iter()
            .map(|e| e.date)
            .collect();
        assert_eq!(dates, vec!["2024-03-01", "2024-03-15", "2024-03-31"]);

        assert!(
            service
                .get_food_entries_range("2024-03-31", "2024-03-01")
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_recent_foods_dedup_through_service() {
        let service = ticking_service();
        service
            .create_food_entry(new_entry("Toast", 120, MealType::Breakfast, "2024-03-01"))
            .unwrap();
        service
            .create_food_entry(new_entry("Apple", 95, MealType::Snack, "2024-03-01"))
            .unwrap();
        let latest_toast = service
            .create_food_entry(new_entry("Toast", 130, MealType::Breakfast, "2024-03-02"))
            .unwrap();

        let recent = service.get_recent_foods(DEFAULT_RECENT_LIMIT).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, latest_toast.id);
        assert_eq!(recent[1].name, "Apple");
    }

    #[test]
    fn test_update_then_delete() {
        let service = CalorieService::in_memory();
        let entry = service
            .create_food_entry(new_entry("Apple", 95, MealType::Snack, "2024-03-01"))
            .unwrap();

        let updated = service
            .update_food_entry(
                &entry.id,
                FoodEntryPatch {
                    calories: Some(500),
                    ..FoodEntryPatch::default()
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(updated.calories, 500);
        assert_eq!(updated.name, "Apple");
        assert_eq!(updated.timestamp, entry.timestamp);

        assert!(service.delete_food_entry(&entry.id).unwrap());
        assert!(!service.delete_food_entry(&entry.id).unwrap());
        assert!(
            service
                .update_food_entry(&entry.id, FoodEntryPatch::default())
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_goal_upsert_and_absence() {
        let service = CalorieService::in_memory();
        assert!(service.get_calorie_goal("2024-01-01").unwrap().is_none());

        service
            .set_calorie_goal(NewCalorieGoal {
                daily_calories_goal: 1800,
                date: "2024-01-01".to_string(),
            })
            .unwrap();
        service
            .set_calorie_goal(NewCalorieGoal {
                daily_calories_goal: 2200,
                date: "2024-01-01".to_string(),
            })
            .unwrap();

        let goal = service.get_calorie_goal("2024-01-01").unwrap().unwrap();
        assert_eq!(goal.daily_calories_goal, 2200);
    }

    #[test]
    fn test_daily_summary() {
        let service = ticking_service();
        service
            .create_food_entry(new_entry("Apple", 95, MealType::Snack, "2024-03-01"))
            .unwrap();
        service
            .create_food_entry(new_entry("Toast", 120, MealType::Breakfast, "2024-03-01"))
            .unwrap();

        let summary = service.daily_summary("2024-03-01", 2000).unwrap();
        assert_eq!(summary.total_calories, 215);
        assert_eq!(summary.meals.len(), 2);
        assert_eq!(summary.meals[0].meal_type, MealType::Breakfast);
        assert_eq!(summary.remaining_calories, 1785);
    }

    #[test]
    fn test_weekly_progress_uses_each_days_goal() {
        let service = ticking_service();
        service
            .set_calorie_goal(NewCalorieGoal {
                daily_calories_goal: 1500,
                date: "2024-03-05".to_string(),
            })
            .unwrap();
        service
            .create_food_entry(new_entry("Lunch", 750, MealType::Lunch, "2024-03-05"))
            .unwrap();
        service
            .create_food_entry(new_entry("Prev week", 900, MealType::Lunch, "2024-03-03"))
            .unwrap();

        let week = service.weekly_progress("2024-03-07", 2000).unwrap();
        assert_eq!(week.start_date, "2024-03-04");
        assert_eq!(week.total_calories, 750);
        assert_eq!(week.days[0].daily_calories_goal, 2000);
        assert_eq!(week.days[1].daily_calories_goal, 1500);
        assert!((week.days[1].progress_pct - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_weekly_progress_rejects_bad_date() {
        let service = CalorieService::in_memory();
        assert!(service.weekly_progress("2024-13-45", 2000).is_err());
    }

    #[test]
    fn test_sqlite_backed_service() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("caltrack.db");
        {
            let service = CalorieService::open(&path).unwrap();
            service
                .create_food_entry(new_entry("Apple", 95, MealType::Snack, "2024-03-01"))
                .unwrap();
        }
        let service = CalorieService::open(&path).unwrap();
        assert_eq!(service.get_food_entries("2024-03-01").unwrap().len(), 1);
    }
}
