use anyhow::Result;

use caltrack_core::models::FoodEntry;
use caltrack_core::schema::FoodEntryInput;
use caltrack_core::service::CalorieService;

use super::helpers::parse_date;

pub(crate) fn format_entry_line(entry: &FoodEntry) -> String {
    let name = &entry.name;
    let meal = &entry.meal_type;
    let cal = entry.calories;
    let date = &entry.date;
    match &entry.serving {
        Some(serving) => format!("{name} ({serving}) for {meal} on {date} — {cal} kcal"),
        None => format!("{name} for {meal} on {date} — {cal} kcal"),
    }
}

pub(crate) fn cmd_log(
    service: &CalorieService,
    name: String,
    calories: i64,
    serving: Option<String>,
    meal: String,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let new_entry = FoodEntryInput {
        name,
        calories,
        serving,
        meal_type: meal,
        date: parse_date(date)?,
    }
    .validate()?;

    let entry = service.create_food_entry(new_entry)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        let id = &entry.id;
        println!("Logged {}", format_entry_line(&entry));
        println!("  id: {id}");
    }

    Ok(())
}
