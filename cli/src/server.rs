use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Path, Query, Request, State, rejection::JsonRejection},
    http::{HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::goals::{EffectiveGoal, resolve_goal};
use caltrack_core::models::{CalorieGoal, DATE_FORMAT, FoodEntry};
use caltrack_core::query;
use caltrack_core::schema::{
    CalorieGoalInput, FieldIssue, FoodEntryInput, FoodEntryPatchInput, ValidationError,
    is_valid_date,
};
use caltrack_core::service::CalorieService;
use caltrack_core::summary::{DailySummary, WeeklyProgress};

const BODY_LIMIT: usize = 1024 * 1024; // 1 MiB

#[derive(Clone)]
struct AppState {
    service: CalorieService,
}

// --- Request / Response types ---

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RangeQuery {
    start_date: Option<String>,
    end_date: Option<String>,
}

#[derive(Deserialize)]
struct RecentQuery {
    limit: Option<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<FieldIssue>,
}

// --- Error handling ---

enum ApiError {
    NotFound(String),
    BadRequest(String),
    Invalid(ValidationError),
    PayloadTooLarge,
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, errors) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg, Vec::new()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, Vec::new()),
            Self::Invalid(err) => (StatusCode::BAD_REQUEST, err.to_string(), err.issues),
            Self::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "Request body too large".to_string(),
                Vec::new(),
            ),
            Self::Internal(err) => {
                tracing::error!("internal server error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    Vec::new(),
                )
            }
        };
        (status, Json(ErrorResponse { error, errors })).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::Invalid(err)
    }
}

// Malformed bodies are client errors, not axum's default 422.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge
        } else {
            Self::BadRequest(format!("Invalid data: {}", rejection.body_text()))
        }
    }
}

fn parse_calendar_date(date: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(date, DATE_FORMAT)
        .map_err(|_| ApiError::BadRequest(format!("Invalid date '{date}'. Use YYYY-MM-DD")))
}

// --- Middleware ---

async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'none'"),
    );
    response
}

// --- Food entry handlers ---

async fn list_entries_for_date(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<Vec<FoodEntry>>, ApiError> {
    let entries = state
        .service
        .get_food_entries(&date)
        .context("failed to list food entries")?;
    Ok(Json(entries))
}

async fn list_entries_in_range(
    State(state): State<AppState>,
    Query(params): Query<RangeQuery>,
) -> Result<Json<Vec<FoodEntry>>, ApiError> {
    let (Some(start), Some(end)) = (params.start_date, params.end_date) else {
        return Err(ApiError::BadRequest(
            "startDate and endDate are required".to_string(),
        ));
    };
    let entries = state
        .service
        .get_food_entries_range(&start, &end)
        .context("failed to list food entries")?;
    Ok(Json(entries))
}

async fn create_entry(
    State(state): State<AppState>,
    body: Result<Json<FoodEntryInput>, JsonRejection>,
) -> Result<(StatusCode, Json<FoodEntry>), ApiError> {
    let Json(input) = body?;
    let new_entry = input.validate()?;
    let entry = state
        .service
        .create_food_entry(new_entry)
        .context("failed to create food entry")?;
    tracing::debug!(id = %entry.id, date = %entry.date, "food entry created");
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn update_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<FoodEntryPatchInput>, JsonRejection>,
) -> Result<Json<FoodEntry>, ApiError> {
    let Json(input) = body?;
    let patch = input.validate()?;
    state
        .service
        .update_food_entry(&id, patch)
        .context("failed to update food entry")?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Food entry not found".to_string()))
}

async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state
        .service
        .delete_food_entry(&id)
        .context("failed to delete food entry")?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Food entry not found".to_string()))
    }
}

async fn recent_foods(
    State(state): State<AppState>,
    Query(params): Query<RecentQuery>,
) -> Result<Json<Vec<FoodEntry>>, ApiError> {
    let limit = query::parse_limit(params.limit.as_deref());
    let entries = state
        .service
        .get_recent_foods(limit)
        .context("failed to load recent foods")?;
    Ok(Json(entries))
}

// --- Goal handlers ---

async fn get_goal(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<EffectiveGoal>, ApiError> {
    let goal = resolve_goal(&state.service, &date).context("failed to load calorie goal")?;
    Ok(Json(goal))
}

async fn set_goal(
    State(state): State<AppState>,
    body: Result<Json<CalorieGoalInput>, JsonRejection>,
) -> Result<Json<CalorieGoal>, ApiError> {
    let Json(input) = body?;
    let goal = input.validate()?;
    let goal = state
        .service
        .set_calorie_goal(goal)
        .context("failed to set calorie goal")?;
    Ok(Json(goal))
}

// --- Aggregates ---

async fn daily_summary(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<DailySummary>, ApiError> {
    if !is_valid_date(&date) {
        return Err(ApiError::BadRequest(format!(
            "Invalid date '{date}'. Use YYYY-MM-DD"
        )));
    }
    let goal = resolve_goal(&state.service, &date).context("failed to load calorie goal")?;
    let summary = state
        .service
        .daily_summary(&date, goal.daily_calories_goal())
        .context("failed to build daily summary")?;
    Ok(Json(summary))
}

async fn weekly_progress(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<WeeklyProgress>, ApiError> {
    parse_calendar_date(&date)?;
    let progress = state
        .service
        .weekly_progress(&date, crate::goals::DEFAULT_DAILY_CALORIES_GOAL)
        .context("failed to build weekly progress")?;
    Ok(Json(progress))
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/food-entries",
            get(list_entries_in_range).post(create_entry),
        )
        // One pattern serves both keys: a date for GET, an id for PATCH/DELETE.
        .route(
            "/api/food-entries/{key}",
            get(list_entries_for_date)
                .patch(update_entry)
                .delete(delete_entry),
        )
        .route("/api/recent-foods", get(recent_foods))
        .route("/api/calorie-goals", post(set_goal))
        .route("/api/calorie-goals/{date}", get(get_goal))
        .route("/api/summary/{date}", get(daily_summary))
        .route("/api/weekly/{date}", get(weekly_progress))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(middleware::from_fn(security_headers))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        let status = res.status();
                        if status.is_server_error() {
                            tracing::error!(%status, ?latency, "response");
                        } else {
                            tracing::info!(%status, ?latency, "response");
                        }
                    },
                ),
        )
        .with_state(state)
}

// --- Server startup ---

pub async fn start_server(service: CalorieService, port: u16, bind: &str) -> anyhow::Result<()> {
    let app = build_router(AppState { service });

    if bind != "127.0.0.1" && bind != "localhost" {
        tracing::warn!(
            %bind,
            "listening beyond localhost with no authentication; anyone on the network can use this API"
        );
    }

    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}"))
        .await
        .with_context(|| format!("failed to bind {bind}:{port}"))?;
    tracing::info!("listening on http://{bind}:{port}");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}
