//! SQLite-backed habit and log stores.
//!
//! Decimal values persist as scale-2 integers (hundredths) so SQLite SUM()
//! aggregates stay exact; conversion happens only at this boundary. Dates
//! persist as ISO `YYYY-MM-DD` text, which compares correctly both in SQL
//! and lexicographically.

use anyhow::{anyhow, Context as _, Result};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::SqlitePool;

use super::model::{Comparison, Frequency, Habit, HabitLog, NewHabit, ValueType};
use super::target;

/// Default timeout for individual SQLite queries (same as storage/mod.rs).
const QUERY_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Execute a future with the standard query timeout.
async fn with_timeout<T>(fut: impl std::future::Future<Output = Result<T>>) -> Result<T> {
    match tokio::time::timeout(QUERY_TIMEOUT, fut).await {
        Ok(result) => result,
        Err(_) => Err(anyhow!(
            "database query timed out after {}s",
            QUERY_TIMEOUT.as_secs()
        )),
    }
}

// ─── Decimal / date codecs ───────────────────────────────────────────────────

/// Encode a (pre-validated, scale ≤ 2) decimal as hundredths.
fn to_raw(value: Decimal) -> i64 {
    let mut v = value;
    v.rescale(2);
    v.mantissa() as i64
}

fn from_raw(raw: i64) -> Decimal {
    Decimal::new(raw, 2).normalize()
}

fn fmt_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("malformed date '{s}'"))
}

// ─── Row types ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, sqlx::FromRow)]
struct HabitRow {
    id: i64,
    name: String,
    description: Option<String>,
    value_type: String,
    unit: Option<String>,
    frequency: String,
    target_value: Option<i64>,
    target_min: Option<i64>,
    target_max: Option<i64>,
    comparison_type: Option<String>,
    default_value: Option<i64>,
    streak_strict: bool,
    start_date: Option<String>,
    end_date: Option<String>,
    color: String,
    icon: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<HabitRow> for Habit {
    type Error = anyhow::Error;

    fn try_from(row: HabitRow) -> Result<Self> {
        let value_type = ValueType::parse(&row.value_type)
            .ok_or_else(|| anyhow!("unknown value_type '{}'", row.value_type))?;
        let frequency = Frequency::parse(&row.frequency)
            .ok_or_else(|| anyhow!("unknown frequency '{}'", row.frequency))?;
        let comparison_type = row
            .comparison_type
            .as_deref()
            .map(|s| Comparison::parse(s).ok_or_else(|| anyhow!("unknown comparison_type '{s}'")))
            .transpose()?;
        Ok(Habit {
            id: row.id,
            name: row.name,
            description: row.description,
            value_type,
            unit: row.unit,
            frequency,
            target_value: row.target_value.map(from_raw),
            target_min: row.target_min.map(from_raw),
            target_max: row.target_max.map(from_raw),
            comparison_type,
            default_value: row.default_value.map(from_raw),
            streak_strict: row.streak_strict,
            start_date: row.start_date.as_deref().map(parse_date).transpose()?,
            end_date: row.end_date.as_deref().map(parse_date).transpose()?,
            color: row.color,
            icon: row.icon,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct HabitLogRow {
    id: i64,
    habit_id: i64,
    log_date: String,
    value: i64,
    created_at: String,
    updated_at: String,
}

impl TryFrom<HabitLogRow> for HabitLog {
    type Error = anyhow::Error;

    fn try_from(row: HabitLogRow) -> Result<Self> {
        Ok(HabitLog {
            id: row.id,
            habit_id: row.habit_id,
            log_date: parse_date(&row.log_date)?,
            value: from_raw(row.value),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// ─── Habit store ─────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct HabitStore {
    pool: SqlitePool,
}

impl HabitStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, data: &NewHabit) -> Result<Habit> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "INSERT INTO habits
             (name, description, value_type, unit, frequency, target_value, target_min,
              target_max, comparison_type, default_value, streak_strict, start_date,
              end_date, color, icon, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.value_type.as_str())
        .bind(&data.unit)
        .bind(data.frequency.as_str())
        .bind(data.target_value.map(to_raw))
        .bind(data.target_min.map(to_raw))
        .bind(data.target_max.map(to_raw))
        .bind(data.comparison_type.map(|c| c.as_str()))
        .bind(data.default_value.map(to_raw))
        .bind(data.streak_strict)
        .bind(data.start_date.map(fmt_date))
        .bind(data.end_date.map(fmt_date))
        .bind(&data.color)
        .bind(&data.icon)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.get(result.last_insert_rowid())
            .await?
            .ok_or_else(|| anyhow!("habit not found after insert"))
    }

    pub async fn get(&self, id: i64) -> Result<Option<Habit>> {
        let row: Option<HabitRow> = sqlx::query_as("SELECT * FROM habits WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Habit::try_from).transpose()
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<Habit>> {
        let row: Option<HabitRow> = sqlx::query_as("SELECT * FROM habits WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Habit::try_from).transpose()
    }

    pub async fn list(
        &self,
        frequency: Option<Frequency>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Habit>> {
        with_timeout(async {
            let rows: Vec<HabitRow> = if let Some(freq) = frequency {
                sqlx::query_as(
                    "SELECT * FROM habits WHERE frequency = ?
                     ORDER BY created_at DESC LIMIT ? OFFSET ?",
                )
                .bind(freq.as_str())
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            } else {
                sqlx::query_as("SELECT * FROM habits ORDER BY created_at DESC LIMIT ? OFFSET ?")
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(&self.pool)
                    .await?
            };
            rows.into_iter().map(Habit::try_from).collect()
        })
        .await
    }

    pub async fn count(&self, frequency: Option<Frequency>) -> Result<i64> {
        let row: (i64,) = if let Some(freq) = frequency {
            sqlx::query_as("SELECT COUNT(*) FROM habits WHERE frequency = ?")
                .bind(freq.as_str())
                .fetch_one(&self.pool)
                .await?
        } else {
            sqlx::query_as("SELECT COUNT(*) FROM habits")
                .fetch_one(&self.pool)
                .await?
        };
        Ok(row.0)
    }

    /// Habits whose start/end window contains `date`.
    pub async fn active_on(&self, date: NaiveDate) -> Result<Vec<Habit>> {
        let date = fmt_date(date);
        let rows: Vec<HabitRow> = sqlx::query_as(
            "SELECT * FROM habits
             WHERE (start_date IS NULL OR start_date <= ?)
               AND (end_date IS NULL OR end_date >= ?)
             ORDER BY created_at DESC",
        )
        .bind(&date)
        .bind(&date)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Habit::try_from).collect()
    }

    /// Persist every configurable column of an already-validated habit.
    pub async fn update(&self, habit: &Habit) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "UPDATE habits SET
               name = ?, description = ?, value_type = ?, unit = ?, frequency = ?,
               target_value = ?, target_min = ?, target_max = ?, comparison_type = ?,
               default_value = ?, streak_strict = ?, start_date = ?, end_date = ?,
               color = ?, icon = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&habit.name)
        .bind(&habit.description)
        .bind(habit.value_type.as_str())
        .bind(&habit.unit)
        .bind(habit.frequency.as_str())
        .bind(habit.target_value.map(to_raw))
        .bind(habit.target_min.map(to_raw))
        .bind(habit.target_max.map(to_raw))
        .bind(habit.comparison_type.map(|c| c.as_str()))
        .bind(habit.default_value.map(to_raw))
        .bind(habit.streak_strict)
        .bind(habit.start_date.map(fmt_date))
        .bind(habit.end_date.map(fmt_date))
        .bind(&habit.color)
        .bind(&habit.icon)
        .bind(&now)
        .bind(habit.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Delete a habit; its logs cascade via the foreign key.
    pub async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM habits WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

// ─── Log store ───────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct HabitLogStore {
    pool: SqlitePool,
}

impl HabitLogStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, habit_id: i64, log_date: NaiveDate, value: Decimal) -> Result<HabitLog> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "INSERT INTO habit_logs (habit_id, log_date, value, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(habit_id)
        .bind(fmt_date(log_date))
        .bind(to_raw(value))
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.get(result.last_insert_rowid())
            .await?
            .ok_or_else(|| anyhow!("habit log not found after insert"))
    }

    pub async fn get(&self, id: i64) -> Result<Option<HabitLog>> {
        let row: Option<HabitLogRow> = sqlx::query_as("SELECT * FROM habit_logs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(HabitLog::try_from).transpose()
    }

    pub async fn get_by_date(&self, habit_id: i64, log_date: NaiveDate) -> Result<Option<HabitLog>> {
        let row: Option<HabitLogRow> =
            sqlx::query_as("SELECT * FROM habit_logs WHERE habit_id = ? AND log_date = ?")
                .bind(habit_id)
                .bind(fmt_date(log_date))
                .fetch_optional(&self.pool)
                .await?;
        row.map(HabitLog::try_from).transpose()
    }

    pub async fn list(
        &self,
        habit_id: i64,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<HabitLog>> {
        with_timeout(async {
            let start = start.map(fmt_date).unwrap_or_else(|| "0000-01-01".into());
            let end = end.map(fmt_date).unwrap_or_else(|| "9999-12-31".into());
            let rows: Vec<HabitLogRow> = sqlx::query_as(
                "SELECT * FROM habit_logs
                 WHERE habit_id = ? AND log_date >= ? AND log_date <= ?
                 ORDER BY log_date DESC LIMIT ? OFFSET ?",
            )
            .bind(habit_id)
            .bind(start)
            .bind(end)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
            rows.into_iter().map(HabitLog::try_from).collect()
        })
        .await
    }

    pub async fn count(
        &self,
        habit_id: i64,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<i64> {
        let start = start.map(fmt_date).unwrap_or_else(|| "0000-01-01".into());
        let end = end.map(fmt_date).unwrap_or_else(|| "9999-12-31".into());
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM habit_logs
             WHERE habit_id = ? AND log_date >= ? AND log_date <= ?",
        )
        .bind(habit_id)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }

    pub async fn update(&self, log: &HabitLog) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "UPDATE habit_logs SET log_date = ?, value = ?, updated_at = ? WHERE id = ?",
        )
        .bind(fmt_date(log.log_date))
        .bind(to_raw(log.value))
        .bind(&now)
        .bind(log.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM habit_logs WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Idempotent set: one row per (habit, date), last write wins. The
    /// unique constraint serialises concurrent writers for the same date.
    pub async fn upsert(&self, habit_id: i64, log_date: NaiveDate, value: Decimal) -> Result<HabitLog> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO habit_logs (habit_id, log_date, value, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(habit_id, log_date) DO UPDATE SET
               value = excluded.value,
               updated_at = excluded.updated_at",
        )
        .bind(habit_id)
        .bind(fmt_date(log_date))
        .bind(to_raw(value))
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.get_by_date(habit_id, log_date)
            .await?
            .ok_or_else(|| anyhow!("habit log not found after upsert"))
    }

    // ─── Aggregates ──────────────────────────────────────────────────────────

    /// Sum of log values in `[start, end]`, zero when no rows exist.
    pub async fn sum_in_range(&self, habit_id: i64, start: NaiveDate, end: NaiveDate) -> Result<Decimal> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(value), 0) FROM habit_logs
             WHERE habit_id = ? AND log_date >= ? AND log_date <= ?",
        )
        .bind(habit_id)
        .bind(fmt_date(start))
        .bind(fmt_date(end))
        .fetch_one(&self.pool)
        .await?;
        Ok(from_raw(row.0))
    }

    /// The single log value for an exact date, if any.
    pub async fn value_on_date(&self, habit_id: i64, date: NaiveDate) -> Result<Option<Decimal>> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT value FROM habit_logs WHERE habit_id = ? AND log_date = ?",
        )
        .bind(habit_id)
        .bind(fmt_date(date))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(v,)| from_raw(v)))
    }

    /// Aggregated stats over `[start, end]`:
    /// (log count, average log value rounded to 2 dp, met period count).
    pub async fn range_stats(
        &self,
        habit: &Habit,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<(i64, Option<Decimal>, i64)> {
        let row: (i64, i64) = sqlx::query_as(
            "SELECT COUNT(id), COALESCE(SUM(value), 0) FROM habit_logs
             WHERE habit_id = ? AND log_date >= ? AND log_date <= ?",
        )
        .bind(habit.id)
        .bind(fmt_date(start))
        .bind(fmt_date(end))
        .fetch_one(&self.pool)
        .await?;
        let (count, sum) = row;

        let average = if count > 0 {
            Some((Decimal::new(sum, 2) / Decimal::from(count)).round_dp(2).normalize())
        } else {
            None
        };

        let met = self
            .dates_with_target_met(habit, Some(start))
            .await?
            .into_iter()
            .filter(|d| *d <= end)
            .count() as i64;

        Ok((count, average, met))
    }

    /// Period start dates whose summed value met the habit's target.
    ///
    /// Logs are bucketed in SQL by day / Monday-anchored week / month start
    /// (so multi-log periods aggregate correctly), and each bucket sum is
    /// checked against the target evaluator's rule.
    pub async fn dates_with_target_met(
        &self,
        habit: &Habit,
        since: Option<NaiveDate>,
    ) -> Result<Vec<NaiveDate>> {
        let bucket = period_bucket_expr(habit.frequency);
        let sql = if since.is_some() {
            format!(
                "SELECT {bucket} AS period_start, SUM(value) AS total
                 FROM habit_logs WHERE habit_id = ? AND log_date >= ?
                 GROUP BY period_start ORDER BY period_start"
            )
        } else {
            format!(
                "SELECT {bucket} AS period_start, SUM(value) AS total
                 FROM habit_logs WHERE habit_id = ?
                 GROUP BY period_start ORDER BY period_start"
            )
        };

        with_timeout(async {
            let mut query = sqlx::query_as::<_, (String, i64)>(&sql).bind(habit.id);
            if let Some(since) = since {
                query = query.bind(fmt_date(since));
            }
            let rows = query.fetch_all(&self.pool).await?;

            let mut dates = Vec::with_capacity(rows.len());
            for (period_start, total) in rows {
                if target::target_met(habit, from_raw(total)) {
                    dates.push(parse_date(&period_start)?);
                }
            }
            Ok(dates)
        })
        .await
    }

    /// Every date with a log for this habit, ascending.
    pub async fn all_log_dates(
        &self,
        habit_id: i64,
        since: Option<NaiveDate>,
    ) -> Result<Vec<NaiveDate>> {
        let since = since.map(fmt_date).unwrap_or_else(|| "0000-01-01".into());
        with_timeout(async {
            let rows: Vec<(String,)> = sqlx::query_as(
                "SELECT log_date FROM habit_logs
                 WHERE habit_id = ? AND log_date >= ? ORDER BY log_date",
            )
            .bind(habit_id)
            .bind(since)
            .fetch_all(&self.pool)
            .await?;
            rows.iter().map(|(s,)| parse_date(s)).collect()
        })
        .await
    }
}

/// SQL expression truncating `log_date` to its period start.
fn period_bucket_expr(frequency: Frequency) -> &'static str {
    match frequency {
        Frequency::Daily => "log_date",
        // Monday anchor: %w is 0=Sunday..6=Saturday, so (w + 6) % 7 is the
        // number of days since Monday.
        Frequency::Weekly => {
            "date(log_date, '-' || ((strftime('%w', log_date) + 6) % 7) || ' days')"
        }
        Frequency::Monthly => "date(log_date, 'start of month')",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn decimal_roundtrip_through_raw() {
        for s in ["0", "1", "0.1", "10.25", "74", "75.7", "99999999.99"] {
            let d = Decimal::from_str(s).unwrap();
            assert_eq!(from_raw(to_raw(d)), d, "{s}");
        }
    }

    #[test]
    fn raw_encoding_is_hundredths() {
        assert_eq!(to_raw(Decimal::from_str("1").unwrap()), 100);
        assert_eq!(to_raw(Decimal::from_str("0.1").unwrap()), 10);
        assert_eq!(to_raw(Decimal::from_str("75.7").unwrap()), 7570);
    }

    #[test]
    fn date_codec_roundtrip() {
        let d = NaiveDate::from_ymd_opt(2025, 6, 9).unwrap();
        assert_eq!(parse_date(&fmt_date(d)).unwrap(), d);
        assert!(parse_date("not-a-date").is_err());
    }
}
