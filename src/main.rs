use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

mod calendar;
mod completion;
mod config;
mod dates;
mod error;
mod models;
mod remaining;
mod schedule;
mod session;
mod storage;
mod timetable;

use calendar::MonthGrid;
use config::Config;
use dates::{format_key, now_shifted, parse_key, DateRange, DisplayedMonth};
use error::{AppError, AppResult};
use models::{
    ApiResponse, DayClassesView, MonthInput, MonthQuery, RangeInput, SummaryView, ToggleInput,
    ToggleView,
};
use session::CalendarSession;
use storage::{KeyValueStore, MemoryStore, SqliteStore};
use timetable::{Period, Timetable};

/// Shared handler state.
/// The session sits behind one mutex so toggles and recomputations never interleave.
#[derive(Clone)]
struct AppState {
    session: Arc<Mutex<CalendarSession>>,
    today: fn() -> NaiveDate,
}

impl AppState {
    fn new(session: CalendarSession) -> Self {
        Self::with_clock(session, now_shifted)
    }

    fn with_clock(session: CalendarSession, today: fn() -> NaiveDate) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            today,
        }
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, CalendarSession>> {
        self.session.lock().map_err(|_| AppError::StatePoisoned)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env()?;
    let backend = open_backend(&config)?;
    let today = now_shifted();
    let mut session = CalendarSession::open(
        Timetable::standard(),
        backend,
        DateRange::new(today, config.default_end),
        today,
    );
    session.subscribe(Box::new(|notice| {
        info!(
            total = notice.summary.total,
            weekly = notice.summary.weekly,
            monthly = notice.summary.monthly,
            "remaining counts updated"
        );
    }));

    let app = router(AppState::new(session));

    let addr = config.addr();
    info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// `:memory:` keeps completions in process only, anything else is a SQLite file
fn open_backend(config: &Config) -> AppResult<Box<dyn KeyValueStore>> {
    if config.db_path.as_os_str() == ":memory:" {
        warn!("completions are kept in memory and lost on restart");
        return Ok(Box::new(MemoryStore::new()));
    }

    if let Some(parent) = config.db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::Config(format!("cannot create {}: {}", parent.display(), e)))?;
        }
    }

    info!("completion record at {}", config.db_path.display());
    Ok(Box::new(SqliteStore::open(&config.db_path)?))
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/summary", get(get_summary))
        .route("/range", put(set_range))
        .route("/calendar", get(get_calendar))
        .route("/calendar/month", put(show_month))
        .route("/calendar/prev", post(prev_month))
        .route("/calendar/next", post(next_month))
        .route("/classes/:date", get(get_classes))
        .route("/completions/toggle", post(toggle_completion))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root() -> &'static str {
    "Class Countdown API v0.1.0"
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

fn summary_view(session: &CalendarSession, today: NaiveDate) -> SummaryView {
    SummaryView::new(
        today,
        &session.range(),
        session.days_remaining(today),
        session.summary(today),
    )
}

/// Days left and the three remaining-class counters
async fn get_summary(State(state): State<AppState>) -> AppResult<Json<ApiResponse<SummaryView>>> {
    let today = (state.today)();
    let session = state.lock()?;
    Ok(Json(ApiResponse::success(summary_view(&session, today))))
}

/// Replace the selected range. Unparseable dates leave the current range untouched.
async fn set_range(
    State(state): State<AppState>,
    Json(input): Json<RangeInput>,
) -> AppResult<Json<ApiResponse<SummaryView>>> {
    let range = DateRange::parse(&input.start, &input.end)?;
    let today = (state.today)();

    let mut session = state.lock()?;
    session.set_range(range);
    info!("range set to {} .. {}", input.start.trim(), input.end.trim());

    Ok(Json(ApiResponse::success(summary_view(&session, today))))
}

/// Grid of the displayed month, or of `?year=&month=` without moving the view
async fn get_calendar(
    State(state): State<AppState>,
    Query(query): Query<MonthQuery>,
) -> AppResult<Json<ApiResponse<MonthGrid>>> {
    let today = (state.today)();
    let session = state.lock()?;

    let grid = match (query.year, query.month) {
        (Some(year), Some(month)) => session.grid_for(DisplayedMonth::new(year, month)?, today)?,
        (None, None) => session.grid(today)?,
        _ => {
            return Err(AppError::InvalidMonth(
                "year and month must be given together".to_string(),
            ))
        }
    };

    Ok(Json(ApiResponse::success(grid)))
}

/// Move the displayed month
async fn show_month(
    State(state): State<AppState>,
    Json(input): Json<MonthInput>,
) -> AppResult<Json<ApiResponse<MonthGrid>>> {
    let shown = DisplayedMonth::new(input.year, input.month)?;
    let today = (state.today)();

    let mut session = state.lock()?;
    let grid = session.grid_for(shown, today)?;
    session.show_month(shown);
    Ok(Json(ApiResponse::success(grid)))
}

async fn prev_month(State(state): State<AppState>) -> AppResult<Json<ApiResponse<MonthGrid>>> {
    let today = (state.today)();
    let mut session = state.lock()?;
    session.prev_month()?;
    Ok(Json(ApiResponse::success(session.grid(today)?)))
}

async fn next_month(State(state): State<AppState>) -> AppResult<Json<ApiResponse<MonthGrid>>> {
    let today = (state.today)();
    let mut session = state.lock()?;
    session.next_month()?;
    Ok(Json(ApiResponse::success(session.grid(today)?)))
}

async fn get_classes(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> AppResult<Json<ApiResponse<DayClassesView>>> {
    let date = parse_key(&date)?;
    let session = state.lock()?;

    Ok(Json(ApiResponse::success(DayClassesView {
        date: format_key(date),
        classes: session.classes_on(date),
    })))
}

/// Flip one (date, period) slot, persist, and return the recomputed counters
async fn toggle_completion(
    State(state): State<AppState>,
    Json(input): Json<ToggleInput>,
) -> AppResult<Json<ApiResponse<ToggleView>>> {
    let date = parse_key(&input.date)?;
    let period = u8::try_from(input.period)
        .ok()
        .and_then(Period::new)
        .ok_or(AppError::InvalidPeriod(input.period))?;
    let today = (state.today)();

    let mut session = state.lock()?;
    let notice = session.toggle(date, period, today)?;

    Ok(Json(ApiResponse::success(ToggleView {
        date: format_key(notice.date),
        period: notice.period.get(),
        completed: notice.completed,
        summary: summary_view(&session, today),
    })))
}
