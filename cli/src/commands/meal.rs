use anyhow::{Result, bail};
use std::process;

use caltrack_core::schema::FoodEntryPatchInput;
use caltrack_core::service::CalorieService;

use super::helpers::{json_error, parse_date};
use super::log::format_entry_line;

pub(crate) fn cmd_delete(service: &CalorieService, entry_id: &str, json: bool) -> Result<()> {
    if service.delete_food_entry(entry_id)? {
        if json {
            println!("{}", serde_json::json!({ "deleted": entry_id }));
        } else {
            println!("Deleted entry {entry_id}");
        }
        Ok(())
    } else {
        if json {
            println!("{}", json_error(&format!("Entry {entry_id} not found")));
        } else {
            eprintln!("Entry {entry_id} not found");
        }
        process::exit(2);
    }
}

pub(crate) struct EntryChanges {
    pub name: Option<String>,
    pub calories: Option<i64>,
    pub serving: Option<String>,
    pub clear_serving: bool,
    pub meal: Option<String>,
    pub date: Option<String>,
}

impl EntryChanges {
    fn into_patch_input(self) -> Result<FoodEntryPatchInput> {
        let serving = if self.clear_serving {
            Some(None)
        } else {
            self.serving.map(Some)
        };
        let date = self.date.map(Some).map(parse_date).transpose()?;
        let input = FoodEntryPatchInput {
            name: self.name.map(Some),
            calories: self.calories.map(Some),
            serving,
            meal_type: self.meal.map(Some),
            date: date.map(Some),
        };
        if input.name.is_none()
            && input.calories.is_none()
            && input.serving.is_none()
            && input.meal_type.is_none()
            && input.date.is_none()
        {
            bail!(
                "Nothing to update. Provide at least one of --name, --calories, --serving, --clear-serving, --meal, or --date"
            );
        }
        Ok(input)
    }
}

pub(crate) fn cmd_update(
    service: &CalorieService,
    entry_id: &str,
    changes: EntryChanges,
    json: bool,
) -> Result<()> {
    let patch = changes.into_patch_input()?.validate()?;

    if let Some(entry) = service.update_food_entry(entry_id, patch)? {
        if json {
            println!("{}", serde_json::to_string_pretty(&entry)?);
        } else {
            println!("Updated entry {entry_id}: {}", format_entry_line(&entry));
        }
        Ok(())
    } else {
        if json {
            println!("{}", json_error(&format!("Entry {entry_id} not found")));
        } else {
            eprintln!("Entry {entry_id} not found");
        }
        process::exit(2);
    }
}
