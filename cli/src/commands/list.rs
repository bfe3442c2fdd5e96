use anyhow::Result;

use caltrack_core::service::CalorieService;

use super::helpers::{parse_date, print_entry_table};

pub(crate) fn cmd_list(service: &CalorieService, date: Option<String>, json: bool) -> Result<()> {
    let date = parse_date(date)?;
    let entries = service.get_food_entries(&date)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if entries.is_empty() {
        eprintln!("No entries for {date}");
    } else {
        print_entry_table(&entries);
        let total = entries.iter().map(|e| e.calories).fold(0, i64::saturating_add);
        println!("  TOTAL: {total} kcal");
    }
    Ok(())
}

pub(crate) fn cmd_range(
    service: &CalorieService,
    start: String,
    end: String,
    json: bool,
) -> Result<()> {
    let start = parse_date(Some(start))?;
    let end = parse_date(Some(end))?;
    let entries = service.get_food_entries_range(&start, &end)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if entries.is_empty() {
        eprintln!("No entries between {start} and {end}");
    } else {
        print_entry_table(&entries);
    }
    Ok(())
}

pub(crate) fn cmd_recent(service: &CalorieService, limit: usize, json: bool) -> Result<()> {
    let entries = service.get_recent_foods(limit)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if entries.is_empty() {
        eprintln!("Nothing logged yet");
    } else {
        print_entry_table(&entries);
    }
    Ok(())
}
