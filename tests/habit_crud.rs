//! Integration tests for habit CRUD against a temp SQLite database.

use habitd::error::ServiceError;
use habitd::habits::model::{Frequency, NewHabit, ValueType};
use habitd::habits::service::{HabitLogService, HabitService};
use habitd::habits::storage::{HabitLogStore, HabitStore};
use habitd::storage::Storage;
use serde_json::json;
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

#[tokio::test]
async fn create_applies_defaults() {
    let (_dir, habits, _logs) = setup().await;
    let created = habits
        .create(habit(json!({ "name": "  Meditate ", "value_type": "boolean" })))
        .await
        .unwrap();

    assert_eq!(created.name, "Meditate");
    assert_eq!(created.value_type, ValueType::Boolean);
    assert_eq!(created.frequency, Frequency::Daily);
    assert!(!created.streak_strict);
    assert_eq!(created.color, "#3B82F6");
    assert!(created.comparison_type.is_none());

    let fetched = habits.get(created.id).await.unwrap();
    assert_eq!(fetched.name, "Meditate");
}

#[tokio::test]
async fn duplicate_name_is_a_conflict() {
    let (_dir, habits, _logs) = setup().await;
    habits
        .create(habit(json!({ "name": "Run", "value_type": "boolean" })))
        .await
        .unwrap();
    let err = habits
        .create(habit(json!({ "name": "Run", "value_type": "numeric" })))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn boolean_habit_rejects_numeric_targets() {
    let (_dir, habits, _logs) = setup().await;
    let err = habits
        .create(habit(json!({
            "name": "Floss",
            "value_type": "boolean",
            "target_value": "5",
        })))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn in_range_requires_ordered_bounds() {
    let (_dir, habits, _logs) = setup().await;
    let err = habits
        .create(habit(json!({
            "name": "Weight",
            "value_type": "numeric",
            "comparison_type": "in_range",
            "target_min": "75",
            "target_max": "70",
        })))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn update_merges_and_revalidates() {
    let (_dir, habits, _logs) = setup().await;
    let created = habits
        .create(habit(json!({ "name": "Read", "value_type": "numeric" })))
        .await
        .unwrap();

    let updated = habits
        .update(
            created.id,
            serde_json::from_value(json!({
                "name": "Read books",
                "comparison_type": "greater_equal_than",
                "target_value": "30",
                "unit": "pages",
            }))
            .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Read books");
    assert_eq!(updated.unit.as_deref(), Some("pages"));

    // A merge producing an inconsistent config must be rejected.
    let err = habits
        .update(
            created.id,
            serde_json::from_value(json!({ "comparison_type": "in_range" })).unwrap(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn rename_to_existing_name_is_a_conflict() {
    let (_dir, habits, _logs) = setup().await;
    habits
        .create(habit(json!({ "name": "One", "value_type": "boolean" })))
        .await
        .unwrap();
    let two = habits
        .create(habit(json!({ "name": "Two", "value_type": "boolean" })))
        .await
        .unwrap();
    let err = habits
        .update(two.id, serde_json::from_value(json!({ "name": "One" })).unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn missing_habit_is_not_found() {
    let (_dir, habits, _logs) = setup().await;
    assert!(matches!(
        habits.get(999).await.unwrap_err(),
        ServiceError::NotFound(_)
    ));
    assert!(matches!(
        habits.delete(999).await.unwrap_err(),
        ServiceError::NotFound(_)
    ));
}

#[tokio::test]
async fn list_paginates_and_filters_by_frequency() {
    let (_dir, habits, _logs) = setup().await;
    for (name, freq) in [("A", "daily"), ("B", "daily"), ("C", "weekly")] {
        habits
            .create(habit(json!({ "name": name, "value_type": "boolean", "frequency": freq })))
            .await
            .unwrap();
    }

    let page = habits.list(None, 1, 2).await.unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.total_pages, 2);

    let weekly = habits.list(Some(Frequency::Weekly), 1, 50).await.unwrap();
    assert_eq!(weekly.total, 1);
    assert_eq!(weekly.items[0].name, "C");
}

#[tokio::test]
async fn today_respects_the_active_window() {
    let (_dir, habits, _logs) = setup().await;
    let today = chrono::NaiveDate::from_ymd_opt(2025, 6, 18).unwrap();

    habits
        .create(habit(json!({ "name": "Active", "value_type": "boolean" })))
        .await
        .unwrap();
    habits
        .create(habit(json!({
            "name": "Future",
            "value_type": "boolean",
            "start_date": "2025-06-19",
        })))
        .await
        .unwrap();
    habits
        .create(habit(json!({
            "name": "Ended",
            "value_type": "boolean",
            "end_date": "2025-06-17",
        })))
        .await
        .unwrap();

    let stats = habits.today(today).await.unwrap();
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].name, "Active");
}
