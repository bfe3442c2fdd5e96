mod goal;
mod helpers;
mod list;
mod log;
mod meal;
mod summary;

pub(crate) use goal::{cmd_goal_set, cmd_goal_show};
pub(crate) use list::{cmd_list, cmd_range, cmd_recent};
pub(crate) use log::cmd_log;
pub(crate) use meal::{EntryChanges, cmd_delete, cmd_update};
pub(crate) use summary::{cmd_summary, cmd_week};
