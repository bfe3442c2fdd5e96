use anyhow::Result;

use caltrack_core::schema::CalorieGoalInput;
use caltrack_core::service::CalorieService;

use super::helpers::parse_date;
use crate::goals::resolve_goal;

pub(crate) fn cmd_goal_set(
    service: &CalorieService,
    calories: i64,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let goal = CalorieGoalInput {
        daily_calories_goal: calories,
        date: parse_date(date)?,
    }
    .validate()?;
    let goal = service.set_calorie_goal(goal)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&goal)?);
    } else {
        let date = &goal.date;
        let cal = goal.daily_calories_goal;
        println!("{date}: {cal} kcal/day");
    }
    Ok(())
}

pub(crate) fn cmd_goal_show(service: &CalorieService, date: Option<String>, json: bool) -> Result<()> {
    let date = parse_date(date)?;
    let goal = resolve_goal(service, &date)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&goal)?);
    } else {
        let cal = goal.daily_calories_goal();
        if goal.is_default() {
            println!("{date}: {cal} kcal/day (default)");
        } else {
            println!("{date}: {cal} kcal/day");
        }
    }
    Ok(())
}
