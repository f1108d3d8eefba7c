//! Integration tests for the aggregated history endpoint.

use chrono::NaiveDate;
use habitd::error::ServiceError;
use habitd::habits::model::{NewHabit, NewLogEntry};
use habitd::habits::service::{HabitLogService, HabitService};
use habitd::habits::storage::{HabitLogStore, HabitStore};
use habitd::storage::Storage;
use rust_decimal::Decimal;
use serde_json::json;
use std::str::FromStr;
use tempfile::TempDir;

async fn setup() -> (TempDir, HabitService, HabitLogService) {
    let dir = TempDir::new().unwrap();
    let storage = Storage::new(dir.path()).await.unwrap();
    let pool = storage.pool();
    let habits = HabitStore::new(pool.clone());
    let logs = HabitLogStore::new(pool);
    (
        dir,
        HabitService::new(habits.clone(), logs.clone()),
        HabitLogService::new(habits, logs),
    )
}

fn habit(body: serde_json::Value) -> NewHabit {
    serde_json::from_value(body).unwrap()
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

async fn log(logs: &HabitLogService, habit_id: i64, date: NaiveDate, value: &str) {
    logs.create(
        habit_id,
        NewLogEntry {
            log_date: date,
            value: dec(value),
        },
    )
    .await
    .unwrap();
}

const TODAY: (i32, u32, u32) = (2025, 6, 18);

#[tokio::test]
async fn empty_history_reports_zero_for_every_period() {
    let (_dir, habits, _logs) = setup().await;
    let h = habits
        .create(habit(json!({ "name": "Empty", "value_type": "boolean" })))
        .await
        .unwrap();
    let today = d(TODAY.0, TODAY.1, TODAY.2);

    let history = habits
        .history(h.id, Some(d(2025, 6, 16)), Some(today), None, today)
        .await
        .unwrap();

    assert_eq!(history.habit_id, h.id);
    assert_eq!(history.time_period, "daily");
    assert_eq!(history.periods.len(), 3);
    assert!(history.periods.iter().all(|p| p.total_value == dec("0")));
}

#[tokio::test]
async fn daily_periods_come_back_oldest_first() {
    // Logs 8 (T-2), 6 (T-1), 10 (T) — history must read [8, 6, 10].
    let (_dir, habits, logs) = setup().await;
    let h = habits
        .create(habit(json!({ "name": "Pages", "value_type": "numeric" })))
        .await
        .unwrap();
    let today = d(TODAY.0, TODAY.1, TODAY.2);
    log(&logs, h.id, d(2025, 6, 16), "8").await;
    log(&logs, h.id, d(2025, 6, 17), "6").await;
    log(&logs, h.id, today, "10").await;

    let history = habits
        .history(h.id, Some(d(2025, 6, 16)), Some(today), None, today)
        .await
        .unwrap();

    let totals: Vec<Decimal> = history.periods.iter().map(|p| p.total_value).collect();
    assert_eq!(totals, vec![dec("8"), dec("6"), dec("10")]);
}

#[tokio::test]
async fn weekly_aggregation_sums_the_week() {
    let (_dir, habits, logs) = setup().await;
    let h = habits
        .create(habit(json!({
            "name": "Gym",
            "value_type": "numeric",
            "frequency": "weekly",
        })))
        .await
        .unwrap();
    let today = d(TODAY.0, TODAY.1, TODAY.2);
    for day in [16, 17, 18] {
        log(&logs, h.id, d(2025, 6, day), "1").await;
    }

    let history = habits
        .history(h.id, Some(d(2025, 6, 12)), Some(today), Some("week"), today)
        .await
        .unwrap();

    assert_eq!(history.time_period, "week");
    let total: Decimal = history.periods.iter().map(|p| p.total_value).sum();
    assert_eq!(total, dec("3"));
}

#[tokio::test]
async fn monthly_aggregation_spans_the_calendar_month() {
    let (_dir, habits, logs) = setup().await;
    let h = habits
        .create(habit(json!({
            "name": "Books",
            "value_type": "numeric",
            "frequency": "monthly",
        })))
        .await
        .unwrap();
    let today = d(TODAY.0, TODAY.1, TODAY.2);
    log(&logs, h.id, today, "100").await;

    let history = habits
        .history(h.id, Some(d(2025, 6, 1)), Some(today), Some("month"), today)
        .await
        .unwrap();

    assert_eq!(history.time_period, "month");
    assert_eq!(history.periods.len(), 1);
    assert_eq!(history.periods[0].period_start, d(2025, 6, 1));
    assert_eq!(history.periods[0].period_end, today);
    assert_eq!(history.periods[0].total_value, dec("100"));
}

#[tokio::test]
async fn sparse_logs_still_tile_the_range() {
    let (_dir, habits, logs) = setup().await;
    let h = habits
        .create(habit(json!({ "name": "Sparse", "value_type": "boolean" })))
        .await
        .unwrap();
    let today = d(TODAY.0, TODAY.1, TODAY.2);
    log(&logs, h.id, today, "1").await;

    let history = habits
        .history(h.id, Some(d(2025, 6, 17)), Some(today), None, today)
        .await
        .unwrap();

    assert_eq!(history.periods.len(), 2);
    assert_eq!(history.periods[0].total_value, dec("0"));
    assert_eq!(history.periods[1].total_value, dec("1"));
}

#[tokio::test]
async fn default_time_period_is_the_habit_frequency() {
    let (_dir, habits, _logs) = setup().await;
    let h = habits
        .create(habit(json!({
            "name": "Weekly Habit",
            "value_type": "boolean",
            "frequency": "weekly",
        })))
        .await
        .unwrap();
    let today = d(TODAY.0, TODAY.1, TODAY.2);

    let history = habits.history(h.id, None, None, None, today).await.unwrap();
    assert_eq!(history.time_period, "weekly");
}

#[tokio::test]
async fn default_range_is_thirty_periods_back() {
    let (_dir, habits, _logs) = setup().await;
    let h = habits
        .create(habit(json!({ "name": "Daily", "value_type": "boolean" })))
        .await
        .unwrap();
    let today = d(TODAY.0, TODAY.1, TODAY.2);

    let history = habits.history(h.id, None, None, None, today).await.unwrap();
    assert_eq!(history.periods.len(), 31);
    assert_eq!(history.periods.first().unwrap().period_start, d(2025, 5, 19));
    assert_eq!(history.periods.last().unwrap().period_end, today);
}

#[tokio::test]
async fn single_day_range_has_exact_boundaries() {
    let (_dir, habits, _logs) = setup().await;
    let h = habits
        .create(habit(json!({ "name": "Boundaries", "value_type": "boolean" })))
        .await
        .unwrap();
    let today = d(TODAY.0, TODAY.1, TODAY.2);

    let history = habits
        .history(h.id, Some(today), Some(today), None, today)
        .await
        .unwrap();
    assert_eq!(history.periods.len(), 1);
    assert_eq!(history.periods[0].period_start, today);
    assert_eq!(history.periods[0].period_end, today);
}

#[tokio::test]
async fn unknown_time_period_is_rejected() {
    let (_dir, habits, _logs) = setup().await;
    let h = habits
        .create(habit(json!({ "name": "Daily", "value_type": "boolean" })))
        .await
        .unwrap();
    let today = d(TODAY.0, TODAY.1, TODAY.2);

    let err = habits
        .history(h.id, None, None, Some("fortnightly"), today)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn history_for_a_missing_habit_is_not_found() {
    let (_dir, habits, _logs) = setup().await;
    let today = d(TODAY.0, TODAY.1, TODAY.2);
    assert!(matches!(
        habits.history(77, None, None, None, today).await.unwrap_err(),
        ServiceError::NotFound(_)
    ));
}
