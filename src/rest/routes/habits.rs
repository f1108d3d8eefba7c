// rest/routes/habits.rs — Habit CRUD, daily stats, and history routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::ServiceError;
use crate::habits::model::{
    Frequency, Habit, HabitHistory, HabitPatch, HabitTodayStats, NewHabit, Paginated,
};
use crate::AppContext;

use super::clamp_pagination;

#[derive(Deserialize)]
pub struct ListQuery {
    pub frequency: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

pub async fn list(
    State(ctx): State<Arc<AppContext>>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Paginated<Habit>>, ServiceError> {
    let frequency = q
        .frequency
        .as_deref()
        .map(|s| {
            Frequency::parse(s)
                .ok_or_else(|| ServiceError::validation(format!("Unknown frequency '{s}'")))
        })
        .transpose()?;
    let (page, page_size) = clamp_pagination(q.page, q.page_size);
    let result = ctx.habit_service().list(frequency, page, page_size).await?;
    Ok(Json(result))
}

pub async fn create(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<NewHabit>,
) -> Result<(StatusCode, Json<Habit>), ServiceError> {
    let habit = ctx.habit_service().create(body).await?;
    Ok((StatusCode::CREATED, Json(habit)))
}

pub async fn get_one(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<i64>,
) -> Result<Json<Habit>, ServiceError> {
    Ok(Json(ctx.habit_service().get(id).await?))
}

pub async fn update(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<i64>,
    Json(body): Json<HabitPatch>,
) -> Result<Json<Habit>, ServiceError> {
    Ok(Json(ctx.habit_service().update(id, body).await?))
}

pub async fn remove(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ServiceError> {
    ctx.habit_service().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct TodayQuery {
    /// Override the reference date (defaults to the current UTC date).
    pub date: Option<NaiveDate>,
}

pub async fn today(
    State(ctx): State<Arc<AppContext>>,
    Query(q): Query<TodayQuery>,
) -> Result<Json<Vec<HabitTodayStats>>, ServiceError> {
    let date = q.date.unwrap_or_else(|| Utc::now().date_naive());
    Ok(Json(ctx.habit_service().today(date).await?))
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub time_period: Option<String>,
}

pub async fn history(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<i64>,
    Query(q): Query<HistoryQuery>,
) -> Result<Json<HabitHistory>, ServiceError> {
    let today = Utc::now().date_naive();
    let result = ctx
        .habit_service()
        .history(id, q.start_date, q.end_date, q.time_period.as_deref(), today)
        .await?;
    Ok(Json(result))
}
