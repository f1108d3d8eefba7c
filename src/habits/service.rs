// SPDX-License-Identifier: MIT
//! Habit and log services.
//!
//! `HabitService` owns habit CRUD plus the derived statistics: the daily
//! dashboard (streaks, averages, completion rates) and the aggregated
//! history endpoint. `HabitLogService` owns log CRUD and the upsert /
//! increment entry points. Both validate explicitly before every write.

use std::collections::BTreeSet;

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;

use crate::error::ServiceError;

use super::model::{
    AggregatedPeriod, Frequency, Habit, HabitHistory, HabitLog, HabitPatch, HabitTodayStats,
    LogPatch, NewHabit, NewLogEntry, Paginated,
};
use super::storage::{HabitLogStore, HabitStore};
use super::{period, streak, validate};

fn paginate<T>(items: Vec<T>, total: i64, page: i64, page_size: i64) -> Paginated<T> {
    let total_pages = if total > 0 {
        (total + page_size - 1) / page_size
    } else {
        0
    };
    Paginated {
        items,
        total,
        page,
        page_size,
        total_pages,
    }
}

// ─── Habit service ───────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct HabitService {
    habits: HabitStore,
    logs: HabitLogStore,
}

impl HabitService {
    pub fn new(habits: HabitStore, logs: HabitLogStore) -> Self {
        Self { habits, logs }
    }

    pub async fn get(&self, habit_id: i64) -> Result<Habit, ServiceError> {
        self.habits
            .get(habit_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Habit not found"))
    }

    pub async fn list(
        &self,
        frequency: Option<Frequency>,
        page: i64,
        page_size: i64,
    ) -> Result<Paginated<Habit>, ServiceError> {
        let offset = (page - 1) * page_size;
        let total = self.habits.count(frequency).await?;
        let items = self.habits.list(frequency, page_size, offset).await?;
        Ok(paginate(items, total, page, page_size))
    }

    pub async fn create(&self, mut data: NewHabit) -> Result<Habit, ServiceError> {
        data.name = validate::sanitize_name(&data.name)?;
        data.description = validate::sanitize_description(data.description)?;
        data.unit = validate::sanitize_unit(data.unit)?;
        data.color = validate::sanitize_color(&data.color)?;
        validate::validate_target_config(
            data.value_type,
            data.comparison_type,
            data.target_value,
            data.target_min,
            data.target_max,
        )?;

        if self.habits.find_by_name(&data.name).await?.is_some() {
            return Err(ServiceError::conflict(format!(
                "Habit '{}' already exists",
                data.name
            )));
        }
        Ok(self.habits.create(&data).await?)
    }

    pub async fn update(&self, habit_id: i64, patch: HabitPatch) -> Result<Habit, ServiceError> {
        let mut habit = self.get(habit_id).await?;

        if let Some(name) = patch.name {
            let name = validate::sanitize_name(&name)?;
            if name != habit.name && self.habits.find_by_name(&name).await?.is_some() {
                return Err(ServiceError::conflict(format!(
                    "Habit '{name}' already exists"
                )));
            }
            habit.name = name;
        }
        if patch.description.is_some() {
            habit.description = validate::sanitize_description(patch.description)?;
        }
        if patch.unit.is_some() {
            habit.unit = validate::sanitize_unit(patch.unit)?;
        }
        if let Some(color) = patch.color {
            habit.color = validate::sanitize_color(&color)?;
        }
        if let Some(icon) = patch.icon {
            habit.icon = icon;
        }
        if let Some(frequency) = patch.frequency {
            habit.frequency = frequency;
        }
        if let Some(streak_strict) = patch.streak_strict {
            habit.streak_strict = streak_strict;
        }
        if patch.target_value.is_some() {
            habit.target_value = patch.target_value;
        }
        if patch.target_min.is_some() {
            habit.target_min = patch.target_min;
        }
        if patch.target_max.is_some() {
            habit.target_max = patch.target_max;
        }
        if patch.comparison_type.is_some() {
            habit.comparison_type = patch.comparison_type;
        }
        if patch.default_value.is_some() {
            habit.default_value = patch.default_value;
        }
        if patch.start_date.is_some() {
            habit.start_date = patch.start_date;
        }
        if patch.end_date.is_some() {
            habit.end_date = patch.end_date;
        }

        // The merged configuration must still be consistent.
        validate::validate_target_config(
            habit.value_type,
            habit.comparison_type,
            habit.target_value,
            habit.target_min,
            habit.target_max,
        )?;

        self.habits.update(&habit).await?;
        self.get(habit_id).await
    }

    pub async fn delete(&self, habit_id: i64) -> Result<(), ServiceError> {
        self.get(habit_id).await?;
        Ok(self.habits.delete(habit_id).await?)
    }

    // ─── Daily stats ─────────────────────────────────────────────────────────

    /// Stats for every habit active on `date`.
    pub async fn today(&self, date: NaiveDate) -> Result<Vec<HabitTodayStats>, ServiceError> {
        let habits = self.habits.active_on(date).await?;
        let mut results = Vec::with_capacity(habits.len());
        for habit in habits {
            results.push(self.calculate_stats(&habit, date).await?);
        }
        Ok(results)
    }

    /// Derive all statistics for one habit as of `today`.
    pub async fn calculate_stats(
        &self,
        habit: &Habit,
        today: NaiveDate,
    ) -> Result<HabitTodayStats, ServiceError> {
        let (period_start, period_end) = period::period_bounds(habit.frequency, today);
        let current_period_value = self
            .logs
            .sum_in_range(habit.id, period_start, period_end)
            .await?;

        // The exact-date value, falling back to the habit's default.
        let date_value = match self.logs.value_on_date(habit.id, today).await? {
            Some(v) => Some(v),
            None => habit.default_value,
        };

        // Trailing window: the last 30 periods before the current one.
        let stats_start = period::periods_ago(habit.frequency, today, 30);
        let stats_end = period_start.checked_sub_days(Days::new(1));
        let has_objective = habit.has_objective();

        let (average_value, average_completion_rate) = match stats_end {
            Some(stats_end) if stats_end >= stats_start => {
                let (_total_logs, average, periods_met) =
                    self.logs.range_stats(habit, stats_start, stats_end).await?;
                let rate = if has_objective {
                    let expected =
                        period::count_periods(habit.frequency, stats_start, stats_end).max(1);
                    let rate = Decimal::from(periods_met) / Decimal::from(expected)
                        * Decimal::from(100);
                    Some(rate.round_dp(1))
                } else {
                    None
                };
                (average, rate)
            }
            // Window is empty (habit too new): no average ("no data"), but an
            // objective-bearing habit reports zero completion.
            _ => (None, has_objective.then_some(Decimal::ZERO)),
        };

        let (current_streak, longest_streak) = self.streaks(habit, today).await?;

        Ok(HabitTodayStats {
            id: habit.id,
            name: habit.name.clone(),
            value_type: habit.value_type,
            unit: habit.unit.clone(),
            frequency: habit.frequency,
            target_value: habit.target_value,
            target_min: habit.target_min,
            target_max: habit.target_max,
            comparison_type: habit.comparison_type,
            default_value: habit.default_value,
            streak_strict: habit.streak_strict,
            color: habit.color.clone(),
            icon: habit.icon.clone(),
            current_streak,
            longest_streak,
            average_value,
            average_completion_rate,
            current_period_value,
            date_value,
        })
    }

    /// (current, longest) streak; both null when the habit has no objective.
    async fn streaks(
        &self,
        habit: &Habit,
        today: NaiveDate,
    ) -> Result<(Option<u32>, Option<u32>), ServiceError> {
        if !habit.has_objective() {
            return Ok((None, None));
        }

        let dates_met: BTreeSet<NaiveDate> = self
            .logs
            .dates_with_target_met(habit, None)
            .await?
            .into_iter()
            .collect();
        if dates_met.is_empty() {
            return Ok((Some(0), Some(0)));
        }

        let logged_dates: BTreeSet<NaiveDate> = self
            .logs
            .all_log_dates(habit.id, None)
            .await?
            .into_iter()
            .collect();

        Ok((
            Some(streak::current_streak(habit, today, &dates_met, &logged_dates)),
            Some(streak::longest_streak(habit, &dates_met, &logged_dates)),
        ))
    }

    // ─── History ─────────────────────────────────────────────────────────────

    /// Aggregated per-period sums over a date range, oldest first.
    ///
    /// Defaults: `end` = today, `time_period` = the habit's own frequency,
    /// `start` = 30 periods before `end` at the resolved frequency. Every
    /// period in range gets a reading; empty periods report zero.
    pub async fn history(
        &self,
        habit_id: i64,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        time_period: Option<&str>,
        today: NaiveDate,
    ) -> Result<HabitHistory, ServiceError> {
        let habit = self.get(habit_id).await?;

        let end = end.unwrap_or(today);
        let label = time_period.map(|s| s.trim().to_ascii_lowercase());
        let frequency = match &label {
            Some(s) => Frequency::parse_alias(s).ok_or_else(|| {
                ServiceError::validation(format!("Unknown time period '{s}'"))
            })?,
            None => habit.frequency,
        };
        let time_period = label.unwrap_or_else(|| habit.frequency.as_str().to_string());
        let start = start.unwrap_or_else(|| period::periods_ago(frequency, end, 30));

        let mut periods = Vec::new();
        for (period_start, period_end) in period::periods_in_range(frequency, start, end) {
            let total_value = self.logs.sum_in_range(habit_id, period_start, period_end).await?;
            periods.push(AggregatedPeriod {
                period_start,
                period_end,
                total_value,
            });
        }

        Ok(HabitHistory {
            habit_id,
            time_period,
            periods,
        })
    }
}

// ─── Log service ─────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct HabitLogService {
    habits: HabitStore,
    logs: HabitLogStore,
}

impl HabitLogService {
    pub fn new(habits: HabitStore, logs: HabitLogStore) -> Self {
        Self { habits, logs }
    }

    async fn get_habit(&self, habit_id: i64) -> Result<Habit, ServiceError> {
        self.habits
            .get(habit_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Habit not found"))
    }

    pub async fn get(&self, log_id: i64) -> Result<HabitLog, ServiceError> {
        self.logs
            .get(log_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Habit log not found"))
    }

    pub async fn list(
        &self,
        habit_id: i64,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        page: i64,
        page_size: i64,
    ) -> Result<Paginated<HabitLog>, ServiceError> {
        self.get_habit(habit_id).await?;
        let offset = (page - 1) * page_size;
        let total = self.logs.count(habit_id, start, end).await?;
        let items = self.logs.list(habit_id, start, end, page_size, offset).await?;
        Ok(paginate(items, total, page, page_size))
    }

    pub async fn create(&self, habit_id: i64, data: NewLogEntry) -> Result<HabitLog, ServiceError> {
        let habit = self.get_habit(habit_id).await?;
        validate::validate_log_date(&habit, data.log_date)?;
        validate::validate_log_value(data.value, habit.value_type)?;

        if self.logs.get_by_date(habit_id, data.log_date).await?.is_some() {
            return Err(ServiceError::conflict(format!(
                "Log already exists for this habit on {}. Use PATCH to update.",
                data.log_date
            )));
        }
        Ok(self.logs.create(habit_id, data.log_date, data.value).await?)
    }

    pub async fn update(&self, log_id: i64, patch: LogPatch) -> Result<HabitLog, ServiceError> {
        let mut log = self.get(log_id).await?;
        let habit = self.get_habit(log.habit_id).await?;

        if let Some(log_date) = patch.log_date {
            if log_date != log.log_date
                && self.logs.get_by_date(log.habit_id, log_date).await?.is_some()
            {
                return Err(ServiceError::conflict(format!(
                    "Log already exists for this habit on {log_date}"
                )));
            }
            validate::validate_log_date(&habit, log_date)?;
            log.log_date = log_date;
        }
        if let Some(value) = patch.value {
            validate::validate_log_value(value, habit.value_type)?;
            log.value = value;
        }

        self.logs.update(&log).await?;
        self.get(log_id).await
    }

    pub async fn delete(&self, log_id: i64) -> Result<(), ServiceError> {
        self.get(log_id).await?;
        Ok(self.logs.delete(log_id).await?)
    }

    /// Set the value for a date: update the existing row or create one.
    pub async fn upsert(
        &self,
        habit_id: i64,
        log_date: NaiveDate,
        value: Decimal,
    ) -> Result<HabitLog, ServiceError> {
        let habit = self.get_habit(habit_id).await?;
        validate::validate_log_date(&habit, log_date)?;
        validate::validate_log_value(value, habit.value_type)?;
        Ok(self.logs.upsert(habit_id, log_date, value).await?)
    }

    /// Add to the value for a date, creating the row when absent.
    pub async fn increment(
        &self,
        habit_id: i64,
        log_date: NaiveDate,
        value: Decimal,
    ) -> Result<HabitLog, ServiceError> {
        let habit = self.get_habit(habit_id).await?;
        validate::validate_log_date(&habit, log_date)?;

        let new_value = match self.logs.get_by_date(habit_id, log_date).await? {
            Some(existing) => existing.value + value,
            None => value,
        };
        validate::validate_log_value(new_value, habit.value_type)?;
        Ok(self.logs.upsert(habit_id, log_date, new_value).await?)
    }
}
