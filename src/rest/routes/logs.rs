// rest/routes/logs.rs — Habit log routes (CRUD, upsert, increment).

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;

use crate::error::ServiceError;
use crate::habits::model::{HabitLog, LogPatch, NewLogEntry, Paginated};
use crate::AppContext;

use super::clamp_pagination;

#[derive(Deserialize)]
pub struct ListQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

pub async fn list(
    State(ctx): State<Arc<AppContext>>,
    Path(habit_id): Path<i64>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Paginated<HabitLog>>, ServiceError> {
    let (page, page_size) = clamp_pagination(q.page, q.page_size);
    let result = ctx
        .log_service()
        .list(habit_id, q.start_date, q.end_date, page, page_size)
        .await?;
    Ok(Json(result))
}

pub async fn create(
    State(ctx): State<Arc<AppContext>>,
    Path(habit_id): Path<i64>,
    Json(body): Json<NewLogEntry>,
) -> Result<(StatusCode, Json<HabitLog>), ServiceError> {
    let log = ctx.log_service().create(habit_id, body).await?;
    Ok((StatusCode::CREATED, Json(log)))
}

pub async fn update(
    State(ctx): State<Arc<AppContext>>,
    Path((_habit_id, log_id)): Path<(i64, i64)>,
    Json(body): Json<LogPatch>,
) -> Result<Json<HabitLog>, ServiceError> {
    Ok(Json(ctx.log_service().update(log_id, body).await?))
}

pub async fn remove(
    State(ctx): State<Arc<AppContext>>,
    Path((_habit_id, log_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ServiceError> {
    ctx.log_service().delete(log_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Set the value for a date: one row per (habit, date), last write wins.
pub async fn upsert(
    State(ctx): State<Arc<AppContext>>,
    Path(habit_id): Path<i64>,
    Json(body): Json<NewLogEntry>,
) -> Result<Json<HabitLog>, ServiceError> {
    let log = ctx
        .log_service()
        .upsert(habit_id, body.log_date, body.value)
        .await?;
    Ok(Json(log))
}

/// Add to the value for a date, creating the row when absent.
pub async fn increment(
    State(ctx): State<Arc<AppContext>>,
    Path(habit_id): Path<i64>,
    Json(body): Json<NewLogEntry>,
) -> Result<Json<HabitLog>, ServiceError> {
    let log = ctx
        .log_service()
        .increment(habit_id, body.log_date, body.value)
        .await?;
    Ok(Json(log))
}
