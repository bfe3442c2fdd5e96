use anyhow::Result;
use serde::Serialize;

use caltrack_core::models::CalorieGoal;
use caltrack_core::service::CalorieService;

/// Goal reported for a date nobody has set one for.
pub const DEFAULT_DAILY_CALORIES_GOAL: i64 = 2000;

/// A stored goal, or the default stand-in (which has no id).
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum EffectiveGoal {
    Stored(CalorieGoal),
    #[serde(rename_all = "camelCase")]
    Default { daily_calories_goal: i64, date: String },
}

impl EffectiveGoal {
    pub fn daily_calories_goal(&self) -> i64 {
        match self {
            EffectiveGoal::Stored(goal) => goal.daily_calories_goal,
            EffectiveGoal::Default {
                daily_calories_goal,
                ..
            } => *daily_calories_goal,
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, EffectiveGoal::Default { .. })
    }
}

pub fn resolve_goal(service: &CalorieService, date: &str) -> Result<EffectiveGoal> {
    Ok(match service.get_calorie_goal(date)? {
        Some(goal) => EffectiveGoal::Stored(goal),
        None => EffectiveGoal::Default {
            daily_calories_goal: DEFAULT_DAILY_CALORIES_GOAL,
            date: date.to_string(),
        },
    })
}
