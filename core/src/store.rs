mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::models::{CalorieGoal, FoodEntry, FoodEntryPatch, NewCalorieGoal, NewFoodEntry};

/// Which `date` values a scan covers. Bounds are inclusive and compared
/// lexically, which matches calendar order for `YYYY-MM-DD` strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateRange {
    All,
    Between(String, String),
}

impl DateRange {
    #[must_use]
    pub fn day(date: &str) -> Self {
        DateRange::Between(date.to_string(), date.to_string())
    }

    #[must_use]
    pub fn between(start: &str, end: &str) -> Self {
        DateRange::Between(start.to_string(), end.to_string())
    }

    #[must_use]
    pub fn contains(&self, date: &str) -> bool {
        match self {
            DateRange::All => true,
            DateRange::Between(start, end) => start.as_str() <= date && date <= end.as_str(),
        }
    }
}

/// Source of creation timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Authoritative holder of food entries and calorie goals.
///
/// Every method is one atomic step relative to the others. Lookups that miss
/// come back as `None`/`false`; `Err` is reserved for backend faults.
pub trait Storage: Send + Sync {
    fn create_food_entry(&self, entry: NewFoodEntry) -> Result<FoodEntry>;

    fn update_food_entry(&self, id: &str, patch: FoodEntryPatch) -> Result<Option<FoodEntry>>;

    fn delete_food_entry(&self, id: &str) -> Result<bool>;

    fn get_food_entry(&self, id: &str) -> Result<Option<FoodEntry>>;

    /// Entries whose `date` falls in `range`, in creation order.
    fn scan_food_entries(&self, range: &DateRange) -> Result<Vec<FoodEntry>>;

    /// Upsert keyed by `date`; a replaced goal gets a fresh id.
    fn set_calorie_goal(&self, goal: NewCalorieGoal) -> Result<CalorieGoal>;

    fn get_calorie_goal(&self, date: &str) -> Result<Option<CalorieGoal>>;
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use chrono::{DateTime, Duration, Utc};

    use super::Clock;

    /// Clock that returns queued instants, then repeats the last one.
    pub(crate) struct ScriptedClock {
        times: Mutex<Vec<DateTime<Utc>>>,
    }

    impl ScriptedClock {
        pub(crate) fn new(times: Vec<DateTime<Utc>>) -> Self {
            let mut times = times;
            times.reverse();
            Self {
                times: Mutex::new(times),
            }
        }

        /// `count` instants one second apart starting at 2024-03-01T08:00Z.
        pub(crate) fn ticking(count: i64) -> Self {
            let base = at("2024-03-01T08:00:00Z");
            Self::new((0..count).map(|i| base + Duration::seconds(i)).collect())
        }
    }

    impl Clock for ScriptedClock {
        fn now(&self) -> DateTime<Utc> {
            let mut times = self.times.lock().unwrap();
            if times.len() > 1 {
                times.pop().unwrap()
            } else {
                *times.last().unwrap()
            }
        }
    }

    pub(crate) fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339)
            .unwrap()
            .with_timezone(&Utc)
    }
}
