use crate::errors::AppError;
use crate::models::{
    Category, CategoryPatch, DeletedPoint, JournalData, NewCategory, NewPoint, NewRating, Point,
    PointPatch, Rating, RatingsQuery, Removed, Snapshot, StatsQuery, StatsResponse, TrashEntry,
};
use crate::range::{resolve_range_at, Period};
use crate::state::AppState;
use crate::stats::{build_stats_at, trash_bin};
use crate::ui::render_index;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
    Json,
};
use chrono::NaiveDate;

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let journal = state.journal.lock().await;
    Html(render_index(journal.today(), journal.data()))
}

pub async fn list_categories(State(state): State<AppState>) -> Json<Vec<Category>> {
    let journal = state.journal.lock().await;
    Json(journal.categories().to_vec())
}

pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<NewCategory>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    let mut journal = state.journal.lock().await;
    let category = journal.add_category(payload)?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<CategoryPatch>,
) -> Result<Json<Category>, AppError> {
    let mut journal = state.journal.lock().await;
    Ok(Json(journal.update_category(&id, patch)?))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Removed>, AppError> {
    let mut journal = state.journal.lock().await;
    let removed = journal.delete_category(&id)?;
    Ok(Json(Removed { removed }))
}

pub async fn list_points(State(state): State<AppState>) -> Json<Vec<Point>> {
    let journal = state.journal.lock().await;
    Json(journal.active_points().to_vec())
}

pub async fn create_point(
    State(state): State<AppState>,
    Json(payload): Json<NewPoint>,
) -> Result<(StatusCode, Json<Point>), AppError> {
    let mut journal = state.journal.lock().await;
    let point = journal.add_point(payload)?;
    Ok((StatusCode::CREATED, Json(point)))
}

pub async fn update_point(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<PointPatch>,
) -> Result<Json<Point>, AppError> {
    let mut journal = state.journal.lock().await;
    Ok(Json(journal.update_point(&id, patch)?))
}

pub async fn delete_point(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeletedPoint>, AppError> {
    let mut journal = state.journal.lock().await;
    Ok(Json(journal.delete_point(&id)?))
}

pub async fn restore_point(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Point>, AppError> {
    let mut journal = state.journal.lock().await;
    Ok(Json(journal.restore_point(&id)?))
}

pub async fn get_trash(State(state): State<AppState>) -> Json<Vec<TrashEntry>> {
    let journal = state.journal.lock().await;
    Json(trash_bin(journal.data()))
}

pub async fn purge_point(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Removed>, AppError> {
    let mut journal = state.journal.lock().await;
    let removed = usize::from(journal.permanently_delete_point(&id)?);
    Ok(Json(Removed { removed }))
}

/// `?limit=` returns the latest ratings; otherwise `start`/`end` filter by
/// date, defaulting to everything up to today.
pub async fn list_ratings(
    State(state): State<AppState>,
    Query(query): Query<RatingsQuery>,
) -> Json<Vec<Rating>> {
    let journal = state.journal.lock().await;
    let ratings = match query.limit {
        Some(limit) => journal.latest_ratings(limit),
        None => {
            let all = resolve_range_at(journal.today(), Period::All);
            journal.ratings_by_date_range(
                query.start.unwrap_or(all.start),
                query.end.unwrap_or(all.end),
            )
        }
    };
    Json(ratings.into_iter().cloned().collect())
}

pub async fn create_rating(
    State(state): State<AppState>,
    Json(payload): Json<NewRating>,
) -> Result<(StatusCode, Json<Rating>), AppError> {
    let mut journal = state.journal.lock().await;
    let rating = journal.add_rating(payload)?;
    Ok((StatusCode::CREATED, Json(rating)))
}

pub async fn delete_rating(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let mut journal = state.journal.lock().await;
    journal.delete_rating(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_ratings_day(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
) -> Result<Json<Removed>, AppError> {
    let mut journal = state.journal.lock().await;
    let removed = journal.delete_ratings_by_date(date)?;
    Ok(Json(Removed { removed }))
}

pub async fn get_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<StatsResponse>, AppError> {
    let period = parse_period(&query)?;
    let journal = state.journal.lock().await;
    Ok(Json(build_stats_at(journal.data(), journal.today(), period)))
}

pub async fn export(State(state): State<AppState>) -> Json<Snapshot> {
    let journal = state.journal.lock().await;
    Json(journal.export())
}

pub async fn import(
    State(state): State<AppState>,
    Json(data): Json<JournalData>,
) -> Result<StatusCode, AppError> {
    let mut journal = state.journal.lock().await;
    journal.import(data)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reset(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    let mut journal = state.journal.lock().await;
    journal.clear_all()?;
    Ok(StatusCode::NO_CONTENT)
}

fn parse_period(query: &StatsQuery) -> Result<Period, AppError> {
    match query.period.as_deref().map(str::trim) {
        Some("custom") => match (query.start, query.end) {
            (Some(start), Some(end)) => Ok(Period::Custom { start, end }),
            _ => Err(AppError::bad_request("custom period needs start and end")),
        },
        Some(name) => Ok(Period::from_name(name)),
        None => Ok(Period::Week),
    }
}
