// SPDX-License-Identifier: MIT
//! Habit domain types — configuration, log entries, and the serialisable
//! shapes returned by the stats and history endpoints.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const DEFAULT_COLOR: &str = "#3B82F6";
pub const DEFAULT_ICON: &str = "fas fa-check";

// ─── Enums ───────────────────────────────────────────────────────────────────

/// Period granularity of a habit target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
        }
    }

    pub fn parse(s: &str) -> Option<Frequency> {
        match s {
            "daily" => Some(Frequency::Daily),
            "weekly" => Some(Frequency::Weekly),
            "monthly" => Some(Frequency::Monthly),
            _ => None,
        }
    }

    /// Parse a history `time_period` parameter, accepting the short aliases
    /// (`day`, `week`, `month`) alongside the canonical names.
    pub fn parse_alias(s: &str) -> Option<Frequency> {
        match s {
            "day" => Some(Frequency::Daily),
            "week" => Some(Frequency::Weekly),
            "month" => Some(Frequency::Monthly),
            other => Frequency::parse(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Boolean,
    Numeric,
}

impl ValueType {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::Boolean => "boolean",
            ValueType::Numeric => "numeric",
        }
    }

    pub fn parse(s: &str) -> Option<ValueType> {
        match s {
            "boolean" => Some(ValueType::Boolean),
            "numeric" => Some(ValueType::Numeric),
            _ => None,
        }
    }
}

/// How a logged (or period-summed) value is compared against the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Equals,
    GreaterThan,
    LessThan,
    GreaterEqualThan,
    LessEqualThan,
    InRange,
}

impl Comparison {
    pub fn as_str(self) -> &'static str {
        match self {
            Comparison::Equals => "equals",
            Comparison::GreaterThan => "greater_than",
            Comparison::LessThan => "less_than",
            Comparison::GreaterEqualThan => "greater_equal_than",
            Comparison::LessEqualThan => "less_equal_than",
            Comparison::InRange => "in_range",
        }
    }

    pub fn parse(s: &str) -> Option<Comparison> {
        match s {
            "equals" => Some(Comparison::Equals),
            "greater_than" => Some(Comparison::GreaterThan),
            "less_than" => Some(Comparison::LessThan),
            "greater_equal_than" => Some(Comparison::GreaterEqualThan),
            "less_equal_than" => Some(Comparison::LessEqualThan),
            "in_range" => Some(Comparison::InRange),
            _ => None,
        }
    }
}

// ─── Habit ───────────────────────────────────────────────────────────────────

/// A habit's configuration row.
#[derive(Debug, Clone, Serialize)]
pub struct Habit {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub value_type: ValueType,
    pub unit: Option<String>,
    pub frequency: Frequency,
    pub target_value: Option<Decimal>,
    pub target_min: Option<Decimal>,
    pub target_max: Option<Decimal>,
    pub comparison_type: Option<Comparison>,
    /// Substitute value for an unlogged date; presence also makes the habit
    /// lenient for streak purposes (unless `streak_strict` is set).
    pub default_value: Option<Decimal>,
    /// When true a missing period always breaks the streak, regardless of
    /// `default_value`.
    pub streak_strict: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub color: String,
    pub icon: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Habit {
    /// A habit has an objective when either a target value or a comparison
    /// rule is configured. Without one, "met" has no meaning and streaks are
    /// reported as null rather than 0.
    pub fn has_objective(&self) -> bool {
        self.target_value.is_some() || self.comparison_type.is_some()
    }

    /// Canonical streak-leniency rule: a missing period does not break the
    /// streak iff the habit carries a `default_value` and is not strict.
    pub fn streak_lenient(&self) -> bool {
        self.default_value.is_some() && !self.streak_strict
    }
}

/// One log entry; at most one per (habit, calendar date).
#[derive(Debug, Clone, Serialize)]
pub struct HabitLog {
    pub id: i64,
    pub habit_id: i64,
    pub log_date: NaiveDate,
    pub value: Decimal,
    pub created_at: String,
    pub updated_at: String,
}

// ─── Request shapes ──────────────────────────────────────────────────────────

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

fn default_icon() -> String {
    DEFAULT_ICON.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewHabit {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub value_type: ValueType,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default)]
    pub target_value: Option<Decimal>,
    #[serde(default)]
    pub target_min: Option<Decimal>,
    #[serde(default)]
    pub target_max: Option<Decimal>,
    #[serde(default)]
    pub comparison_type: Option<Comparison>,
    #[serde(default)]
    pub default_value: Option<Decimal>,
    #[serde(default)]
    pub streak_strict: bool,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_icon")]
    pub icon: String,
}

/// Partial habit update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HabitPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub frequency: Option<Frequency>,
    pub target_value: Option<Decimal>,
    pub target_min: Option<Decimal>,
    pub target_max: Option<Decimal>,
    pub comparison_type: Option<Comparison>,
    pub default_value: Option<Decimal>,
    pub streak_strict: Option<bool>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewLogEntry {
    pub log_date: NaiveDate,
    pub value: Decimal,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogPatch {
    pub log_date: Option<NaiveDate>,
    pub value: Option<Decimal>,
}

// ─── Response shapes ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

/// Per-habit statistics for the daily dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct HabitTodayStats {
    pub id: i64,
    pub name: String,
    pub value_type: ValueType,
    pub unit: Option<String>,
    pub frequency: Frequency,
    pub target_value: Option<Decimal>,
    pub target_min: Option<Decimal>,
    pub target_max: Option<Decimal>,
    pub comparison_type: Option<Comparison>,
    pub default_value: Option<Decimal>,
    pub streak_strict: bool,
    pub color: String,
    pub icon: String,
    /// Null when the habit has no objective (streaks are undefined, not 0).
    pub current_streak: Option<u32>,
    pub longest_streak: Option<u32>,
    /// Average logged value over the trailing stats window; null when the
    /// window holds no logs ("no data", distinct from zero performance).
    pub average_value: Option<Decimal>,
    /// Percentage of expected periods met over the trailing window, one
    /// decimal place; null when the habit has no objective.
    pub average_completion_rate: Option<Decimal>,
    /// Sum of log values in the current (still open) period.
    pub current_period_value: Decimal,
    /// The log value for the queried date; falls back to `default_value`
    /// when nothing was logged.
    pub date_value: Option<Decimal>,
}

/// A single aggregated time period in a habit's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregatedPeriod {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub total_value: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct HabitHistory {
    pub habit_id: i64,
    pub time_period: String,
    pub periods: Vec<AggregatedPeriod>,
}
