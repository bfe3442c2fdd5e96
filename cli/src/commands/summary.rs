use anyhow::Result;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use caltrack_core::service::CalorieService;

use super::helpers::parse_date;
use crate::goals::{DEFAULT_DAILY_CALORIES_GOAL, resolve_goal};

pub(crate) fn cmd_summary(service: &CalorieService, date: Option<String>, json: bool) -> Result<()> {
    let date = parse_date(date)?;
    let goal = resolve_goal(service, &date)?;
    let summary = service.daily_summary(&date, goal.daily_calories_goal())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if summary.meals.is_empty() {
        eprintln!("No entries for {date}");
        process::exit(2);
    }

    println!("=== {date} ===\n");

    for meal in &summary.meals {
        let meal_label = meal.meal_type.as_str().to_uppercase();
        let sub_cal = meal.subtotal_calories;
        println!("  {meal_label} ({sub_cal} kcal)");
        for e in &meal.entries {
            let name = &e.name;
            let serving = e
                .serving
                .as_ref()
                .map(|s| format!(" — {s}"))
                .unwrap_or_default();
            let cal = e.calories;
            let id = &e.id;
            println!("    {name}{serving} — {cal} kcal  [{id}]");
        }
        println!();
    }

    let total = summary.total_calories;
    let target = summary.daily_calories_goal;
    let remaining = summary.remaining_calories;
    let pct = summary.progress_pct;
    let status = summary.status.label();
    println!("  TOTAL: {total} kcal");
    println!("  GOAL: {target} kcal");
    println!("  REMAINING: {remaining} kcal ({pct:.0}% of goal, {status})");

    Ok(())
}

pub(crate) fn cmd_week(service: &CalorieService, date: Option<String>, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct DayRow {
        #[tabled(rename = "Day")]
        weekday: String,
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Calories")]
        calories: i64,
        #[tabled(rename = "Goal")]
        goal: i64,
        #[tabled(rename = "Progress")]
        progress: String,
    }

    let date = parse_date(date)?;
    let week = service.weekly_progress(&date, DEFAULT_DAILY_CALORIES_GOAL)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&week)?);
        return Ok(());
    }

    let rows: Vec<DayRow> = week
        .days
        .iter()
        .map(|d| DayRow {
            weekday: d.weekday.clone(),
            date: d.date.clone(),
            calories: d.calories,
            goal: d.daily_calories_goal,
            progress: format!("{:.0}%", d.progress_pct),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    let total = week.total_calories;
    let avg = week.average_daily_calories;
    println!("  TOTAL: {total} kcal | AVERAGE: {avg} kcal/day");

    Ok(())
}
