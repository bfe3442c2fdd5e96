use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef};
use rusqlite::{Connection, OptionalExtension, params};
use uuid::Uuid;

use super::{Clock, DateRange, Storage, SystemClock};
use crate::models::{
    CalorieGoal, FoodEntry, FoodEntryPatch, MealType, NewCalorieGoal, NewFoodEntry,
};

const ENTRY_COLUMNS: &str = "id, name, calories, serving, meal_type, date, timestamp";

impl ToSql for MealType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for MealType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: anyhow::Error| FromSqlError::Other(e.into()))
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// SQLite-backed store. One connection behind a mutex, so each trait call is
/// a single critical section just like the in-memory store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    clock: Arc<dyn Clock>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let store = SqliteStore {
            conn: Mutex::new(conn),
            clock: Arc::new(SystemClock),
        };
        store.migrate()?;
        Ok(store)
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.conn();
        let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS food_entries (
                    seq INTEGER PRIMARY KEY AUTOINCREMENT,
                    id TEXT NOT NULL UNIQUE,
                    name TEXT NOT NULL,
                    calories INTEGER NOT NULL CHECK (calories >= 0),
                    serving TEXT,
                    meal_type TEXT NOT NULL,
                    date TEXT NOT NULL,
                    timestamp TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_food_entries_date ON food_entries(date);

                CREATE TABLE IF NOT EXISTS calorie_goals (
                    date TEXT PRIMARY KEY,
                    id TEXT NOT NULL UNIQUE,
                    daily_calories_goal INTEGER NOT NULL CHECK (daily_calories_goal >= 1)
                );

                PRAGMA user_version = 1;",
            )?;
        }

        Ok(())
    }

    // Expects columns in ENTRY_COLUMNS order.
    fn food_entry_from_row(row: &rusqlite::Row) -> rusqlite::Result<FoodEntry> {
        let raw_ts: String = row.get(6)?;
        let timestamp = DateTime::parse_from_rfc3339(&raw_ts)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?
            .with_timezone(&Utc);
        Ok(FoodEntry {
            id: row.get(0)?,
            name: row.get(1)?,
            calories: row.get(2)?,
            serving: row.get(3)?,
            meal_type: row.get(4)?,
            date: row.get(5)?,
            timestamp,
        })
    }

    fn find_entry(conn: &Connection, id: &str) -> Result<Option<FoodEntry>> {
        let entry = conn
            .query_row(
                &format!("SELECT {ENTRY_COLUMNS} FROM food_entries WHERE id = ?1"),
                params![id],
                Self::food_entry_from_row,
            )
            .optional()
            .context("failed to load food entry")?;
        Ok(entry)
    }
}

impl Storage for SqliteStore {
    fn create_food_entry(&self, entry: NewFoodEntry) -> Result<FoodEntry> {
        // Stamp under the lock so seq order and timestamp order agree.
        let conn = self.conn();
        let record = FoodEntry {
            id: Uuid::new_v4().to_string(),
            name: entry.name,
            calories: entry.calories,
            serving: entry.serving,
            meal_type: entry.meal_type,
            date: entry.date,
            timestamp: self.clock.now(),
        };
        conn.execute(
            "INSERT INTO food_entries (id, name, calories, serving, meal_type, date, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.id,
                record.name,
                record.calories,
                record.serving,
                record.meal_type,
                record.date,
                format_timestamp(&record.timestamp),
            ],
        )
        .context("failed to insert food entry")?;
        Ok(record)
    }

    fn update_food_entry(&self, id: &str, patch: FoodEntryPatch) -> Result<Option<FoodEntry>> {
        let conn = self.conn();
        let Some(mut entry) = Self::find_entry(&conn, id)? else {
            return Ok(None);
        };
        entry.apply(patch);
        conn.execute(
            "UPDATE food_entries
             SET name = ?1, calories = ?2, serving = ?3, meal_type = ?4, date = ?5
             WHERE id = ?6",
            params![
                entry.name,
                entry.calories,
                entry.serving,
                entry.meal_type,
                entry.date,
                id,
            ],
        )
        .context("failed to update food entry")?;
        Ok(Some(entry))
    }

    fn delete_food_entry(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM food_entries WHERE id = ?1", params![id])
            .context("failed to delete food entry")?;
        Ok(rows > 0)
    }

    fn get_food_entry(&self, id: &str) -> Result<Option<FoodEntry>> {
        Self::find_entry(&self.conn(), id)
    }

    fn scan_food_entries(&self, range: &DateRange) -> Result<Vec<FoodEntry>> {
        let conn = self.conn();
        let entries = match range {
            DateRange::All => {
                let mut stmt = conn
                    .prepare(&format!(
                        "SELECT {ENTRY_COLUMNS} FROM food_entries ORDER BY seq"
                    ))
                    .context("failed to scan food entries")?;
                stmt.query_map([], Self::food_entry_from_row)
                    .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
                    .context("failed to scan food entries")?
            }
            DateRange::Between(start, end) => {
                let mut stmt = conn
                    .prepare(&format!(
                        "SELECT {ENTRY_COLUMNS} FROM food_entries
                         WHERE date >= ?1 AND date <= ?2
                         ORDER BY seq"
                    ))
                    .context("failed to scan food entries")?;
                stmt.query_map(params![start, end], Self::food_entry_from_row)
                    .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
                    .context("failed to scan food entries")?
            }
        };
        Ok(entries)
    }

    fn set_calorie_goal(&self, goal: NewCalorieGoal) -> Result<CalorieGoal> {
        let record = CalorieGoal {
            id: Uuid::new_v4().to_string(),
            daily_calories_goal: goal.daily_calories_goal,
            date: goal.date,
        };
        self.conn()
            .execute(
                "INSERT OR REPLACE INTO calorie_goals (date, id, daily_calories_goal)
                 VALUES (?1, ?2, ?3)",
                params![record.date, record.id, record.daily_calories_goal],
            )
            .context("failed to set calorie goal")?;
        Ok(record)
    }

    fn get_calorie_goal(&self, date: &str) -> Result<Option<CalorieGoal>> {
        let goal = self
            .conn()
            .query_row(
                "SELECT id, daily_calories_goal, date FROM calorie_goals WHERE date = ?1",
                params![date],
                |row| {
                    Ok(CalorieGoal {
                        id: row.get(0)?,
                        daily_calories_goal: row.get(1)?,
                        date: row.get(2)?,
                    })
                },
            )
            .optional()
            .context("failed to load calorie goal")?;
        Ok(goal)
    }
}
