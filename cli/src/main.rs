mod commands;
mod config;
mod goals;
mod server;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process;

use crate::commands::{
    EntryChanges, cmd_delete, cmd_goal_set, cmd_goal_show, cmd_list, cmd_log, cmd_range,
    cmd_recent, cmd_summary, cmd_update, cmd_week,
};
use crate::config::Config;
use caltrack_core::query::DEFAULT_RECENT_LIMIT;
use caltrack_core::service::CalorieService;

#[derive(Parser)]
#[command(
    name = "caltrack",
    version,
    about = "A small calorie tracker",
    long_about = "Log what you eat against meals and dates, set a daily calorie goal, \
                  and see how each day and week measures up."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log a food entry
    Log {
        /// Food name
        name: String,
        /// Calories for this entry
        calories: i64,
        /// Free-form serving description (e.g. "2 slices")
        #[arg(short, long)]
        serving: Option<String>,
        /// Meal type: breakfast, lunch, dinner, snack
        #[arg(short, long, default_value = "snack")]
        meal: String,
        /// Date to log for (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List entries for a date (defaults to today)
    List {
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List entries between two dates, inclusive
    Range {
        /// First date
        start: String,
        /// Last date
        end: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Update an entry; unspecified fields stay as they are
    Update {
        /// Entry ID to update
        entry_id: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New calorie count
        #[arg(long)]
        calories: Option<i64>,
        /// New serving description
        #[arg(short, long, conflicts_with = "clear_serving")]
        serving: Option<String>,
        /// Remove the serving description
        #[arg(long)]
        clear_serving: bool,
        /// New meal type: breakfast, lunch, dinner, snack
        #[arg(long)]
        meal: Option<String>,
        /// New date (YYYY-MM-DD or today/yesterday/tomorrow)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete an entry by ID
    Delete {
        /// Entry ID to delete
        entry_id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show recently logged foods, one per name and serving
    Recent {
        /// Maximum number of foods to show
        #[arg(short, long, default_value_t = DEFAULT_RECENT_LIMIT)]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage daily calorie goals
    Goal {
        #[command(subcommand)]
        command: GoalCommands,
    },
    /// Show daily summary (defaults to today)
    Summary {
        /// Date to show (YYYY-MM-DD, default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show progress for the Monday-started week containing a date
    Week {
        /// Any date in the week (default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start the REST API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Address to bind to (default: 127.0.0.1, use 0.0.0.0 to expose to network)
        #[arg(short, long, default_value = "127.0.0.1")]
        bind: String,
        /// Serve the on-disk database instead of a fresh in-memory store
        #[arg(long)]
        persist: bool,
    },
}

#[derive(Subcommand)]
enum GoalCommands {
    /// Set the calorie goal for a date, replacing any existing one
    Set {
        /// Daily calorie goal
        calories: i64,
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the goal in effect for a date
    Show {
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "caltrack=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v == "json");

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;

    let service = match &cli.command {
        Commands::Serve { persist: false, .. } => CalorieService::in_memory(),
        _ => CalorieService::open(&config.db_path)?,
    };

    match cli.command {
        Commands::Log {
            name,
            calories,
            serving,
            meal,
            date,
            json,
        } => cmd_log(&service, name, calories, serving, meal, date, json),
        Commands::List { date, json } => cmd_list(&service, date, json),
        Commands::Range { start, end, json } => cmd_range(&service, start, end, json),
        Commands::Update {
            entry_id,
            name,
            calories,
            serving,
            clear_serving,
            meal,
            date,
            json,
        } => cmd_update(
            &service,
            &entry_id,
            EntryChanges {
                name,
                calories,
                serving,
                clear_serving,
                meal,
                date,
            },
            json,
        ),
        Commands::Delete { entry_id, json } => cmd_delete(&service, &entry_id, json),
        Commands::Recent { limit, json } => cmd_recent(&service, limit, json),
        Commands::Goal { command } => match command {
            GoalCommands::Set {
                calories,
                date,
                json,
            } => cmd_goal_set(&service, calories, date, json),
            GoalCommands::Show { date, json } => cmd_goal_show(&service, date, json),
        },
        Commands::Summary { date, json } => cmd_summary(&service, date, json),
        Commands::Week { date, json } => cmd_week(&service, date, json),
        Commands::Serve {
            port,
            bind,
            persist,
        } => {
            if persist {
                tracing::info!(db = %config.db_path.display(), "serving persistent store");
            } else {
                tracing::info!("serving in-memory store; data is lost on exit");
            }
            server::start_server(service, port, &bind).await
        }
    }
}
