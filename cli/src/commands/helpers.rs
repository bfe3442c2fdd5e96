use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use caltrack_core::models::{DATE_FORMAT, FoodEntry};

/// Resolve a CLI date argument to `YYYY-MM-DD`, defaulting to today.
pub(crate) fn parse_date(date_str: Option<String>) -> Result<String> {
    let date = match date_str {
        None => Local::now().date_naive(),
        Some(s) => match s.as_str() {
            "today" => Local::now().date_naive(),
            "yesterday" => Local::now().date_naive() - chrono::Duration::days(1),
            "tomorrow" => Local::now().date_naive() + chrono::Duration::days(1),
            _ => NaiveDate::parse_from_str(&s, DATE_FORMAT).with_context(|| {
                format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday/tomorrow")
            })?,
        },
    };
    Ok(date.format(DATE_FORMAT).to_string())
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max.saturating_sub(3)).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

pub(crate) fn print_entry_table(entries: &[FoodEntry]) {
    #[derive(Tabled)]
    struct EntryRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Meal")]
        meal: String,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Serving")]
        serving: String,
        #[tabled(rename = "kcal")]
        calories: i64,
    }

    let rows: Vec<EntryRow> = entries
        .iter()
        .map(|e| EntryRow {
            id: e.id.clone(),
            date: e.date.clone(),
            meal: e.meal_type.to_string(),
            name: truncate(&e.name, 35),
            serving: e
                .serving
                .as_deref()
                .map(|s| truncate(s, 20))
                .unwrap_or_default(),
            calories: e.calories,
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(5..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}
