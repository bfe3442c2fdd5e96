use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use anyhow::Result;
use uuid::Uuid;

use super::{Clock, DateRange, Storage, SystemClock};
use crate::models::{CalorieGoal, FoodEntry, FoodEntryPatch, NewCalorieGoal, NewFoodEntry};

/// Rows keyed by creation sequence, plus an id index into them.
#[derive(Default)]
struct EntryTable {
    rows: BTreeMap<u64, FoodEntry>,
    index: HashMap<String, u64>,
    next_seq: u64,
}

impl EntryTable {
    fn fresh_id(&self) -> String {
        loop {
            let id = Uuid::new_v4().to_string();
            if !self.index.contains_key(&id) {
                return id;
            }
        }
    }

    fn insert(&mut self, entry: FoodEntry) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.index.insert(entry.id.clone(), seq);
        self.rows.insert(seq, entry);
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut FoodEntry> {
        let seq = self.index.get(id)?;
        self.rows.get_mut(seq)
    }

    fn remove(&mut self, id: &str) -> bool {
        match self.index.remove(id) {
            Some(seq) => self.rows.remove(&seq).is_some(),
            None => false,
        }
    }
}

/// Process-local store. Food entries and goals sit behind separate locks;
/// every write holds its collection's lock for the whole operation.
pub struct MemoryStore {
    entries: RwLock<EntryTable>,
    goals: RwLock<HashMap<String, CalorieGoal>>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(EntryTable::default()),
            goals: RwLock::new(HashMap::new()),
            clock,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MemoryStore {
    fn create_food_entry(&self, entry: NewFoodEntry) -> Result<FoodEntry> {
        let mut table = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let record = FoodEntry {
            id: table.fresh_id(),
            name: entry.name,
            calories: entry.calories,
            serving: entry.serving,
            meal_type: entry.meal_type,
            date: entry.date,
            timestamp: self.clock.now(),
        };
        table.insert(record.clone());
        Ok(record)
    }

    fn update_food_entry(&self, id: &str, patch: FoodEntryPatch) -> Result<Option<FoodEntry>> {
        let mut table = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(table.get_mut(id).map(|existing| {
            existing.apply(patch);
            existing.clone()
        }))
    }

    fn delete_food_entry(&self, id: &str) -> Result<bool> {
        let mut table = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(table.remove(id))
    }

    fn get_food_entry(&self, id: &str) -> Result<Option<FoodEntry>> {
        let table = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(table
            .index
            .get(id)
            .and_then(|seq| table.rows.get(seq))
            .cloned())
    }

    fn scan_food_entries(&self, range: &DateRange) -> Result<Vec<FoodEntry>> {
        let table = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(table
            .rows
            .values()
            .filter(|e| range.contains(&e.date))
            .cloned()
            .collect())
    }

    fn set_calorie_goal(&self, goal: NewCalorieGoal) -> Result<CalorieGoal> {
        let mut goals = self.goals.write().unwrap_or_else(PoisonError::into_inner);
        let record = CalorieGoal {
            id: Uuid::new_v4().to_string(),
            daily_calories_goal: goal.daily_calories_goal,
            date: goal.date,
        };
        goals.insert(record.date.clone(), record.clone());
        Ok(record)
    }

    fn get_calorie_goal(&self, date: &str) -> Result<Option<CalorieGoal>> {
        let goals = self.goals.read().unwrap_or_else(PoisonError::into_inner);
        Ok(goals.get(date).cloned())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::thread;

    use super::*;
    use crate::models::MealType;
    use crate::store::testing::ScriptedClock;

    fn new_entry(name: &str, calories: i64, date: &str) -> NewFoodEntry {
        NewFoodEntry {
            name: name.to_string(),
            calories,
            serving: None,
            meal_type: MealType::Snack,
            date: date.to_string(),
        }
    }

    #[test]
    fn test_create_assigns_id_and_timestamp() {
        let store = MemoryStore::with_clock(Arc::new(ScriptedClock::ticking(1)));
        let entry = store
            .create_food_entry(new_entry("Apple", 95, "2024-03-01"))
            .unwrap();
        assert!(!entry.id.is_empty());
        assert_eq!(
            entry.timestamp,
            crate::store::testing::at("2024-03-01T08:00:00Z")
        );

        let fetched = store.get_food_entry(&entry.id).unwrap().unwrap();
        assert_eq!(fetched, entry);
    }

    #[test]
    fn test_ids_are_unique() {
        let store = MemoryStore::new();
        let mut ids = HashSet::new();
        for i in 0..500 {
            let entry = store
                .create_food_entry(new_entry("Rice", i, "2024-03-01"))
                .unwrap();
            assert!(ids.insert(entry.id));
        }
    }

    #[test]
    fn test_update_merges_fields() {
        let store = MemoryStore::new();
        let entry = store
            .create_food_entry(new_entry("Apple", 95, "2024-03-01"))
            .unwrap();

        let updated = store
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
        assert_eq!(updated.id, entry.id);
        assert_eq!(updated.timestamp, entry.timestamp);
        assert_eq!(updated.name, entry.name);
        assert_eq!(updated.date, entry.date);
        assert_eq!(store.get_food_entry(&entry.id).unwrap().unwrap(), updated);
    }

    #[test]
    fn test_update_missing_is_none() {
        let store = MemoryStore::new();
        let result = store
            .update_food_entry("nope", FoodEntryPatch::default())
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let store = MemoryStore::new();
        let entry = store
            .create_food_entry(new_entry("Apple", 95, "2024-03-01"))
            .unwrap();
        assert!(store.delete_food_entry(&entry.id).unwrap());
        assert!(!store.delete_food_entry(&entry.id).unwrap());
        assert!(store.get_food_entry(&entry.id).unwrap().is_none());
    }

    #[test]
    fn test_scan_keeps_creation_order_after_delete() {
        let store = MemoryStore::new();
        let a = store
            .create_food_entry(new_entry("A", 1, "2024-03-01"))
            .unwrap();
        let b = store
            .create_food_entry(new_entry("B", 2, "2024-03-01"))
            .unwrap();
        let c = store
            .create_food_entry(new_entry("C", 3, "2024-03-01"))
            .unwrap();
        store.delete_food_entry(&b.id).unwrap();
        let d = store
            .create_food_entry(new_entry("D", 4, "2024-03-01"))
            .unwrap();

        let ids: Vec<String> = store
            .scan_food_entries(&DateRange::All)
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![a.id, c.id, d.id]);
    }

    #[test]
    fn test_scan_filters_by_range() {
        let store = MemoryStore::new();
        store
            .create_food_entry(new_entry("A", 1, "2024-02-28"))
            .unwrap();
        store
            .create_food_entry(new_entry("B", 2, "2024-03-01"))
            .unwrap();
        store
            .create_food_entry(new_entry("C", 3, "2024-03-05"))
            .unwrap();

        let names: Vec<String> = store
            .scan_food_entries(&DateRange::between("2024-03-01", "2024-03-31"))
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["B", "C"]);
    }

    #[test]
    fn test_goal_upsert_by_date() {
        let store = MemoryStore::new();
        let first = store
            .set_calorie_goal(NewCalorieGoal {
                daily_calories_goal: 1800,
                date: "2024-01-01".to_string(),
            })
            .unwrap();
        let second = store
            .set_calorie_goal(NewCalorieGoal {
                daily_calories_goal: 2200,
                date: "2024-01-01".to_string(),
            })
            .unwrap();

        assert_ne!(first.id, second.id);
        let goal = store.get_calorie_goal("2024-01-01").unwrap().unwrap();
        assert_eq!(goal.daily_calories_goal, 2200);
        assert_eq!(goal.id, second.id);
        assert_eq!(store.goals.read().unwrap().len(), 1);
    }

    #[test]
    fn test_goal_missing_is_none() {
        let store = MemoryStore::new();
        assert!(store.get_calorie_goal("2024-01-01").unwrap().is_none());
    }

    #[test]
    fn test_concurrent_creates_are_all_kept() {
        let store = Arc::new(MemoryStore::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for i in 0..50 {
                        store
                            .create_food_entry(new_entry(&format!("f{t}-{i}"), i, "2024-03-01"))
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let all = store.scan_food_entries(&DateRange::All).unwrap();
        assert_eq!(all.len(), 400);
        let ids: HashSet<_> = all.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids.len(), 400);
    }
}
