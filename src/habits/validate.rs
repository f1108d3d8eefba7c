//! Explicit validation for habit configuration and log values.
//!
//! Called by the service layer before every persistence operation; invalid
//! configurations block the write rather than being silently corrected.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::ServiceError;

use super::model::{Comparison, Habit, ValueType};

pub const NAME_MAX_LENGTH: usize = 25;
pub const UNIT_MAX_LENGTH: usize = 10;
pub const DESCRIPTION_MAX_LENGTH: usize = 500;

/// NUMERIC(10,2): 8 integer digits, 2 fractional digits.
const MAX_MAGNITUDE: i64 = 100_000_000;

// ─── Field sanitization ──────────────────────────────────────────────────────

pub fn sanitize_name(raw: &str) -> Result<String, ServiceError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ServiceError::validation("Name cannot be empty"));
    }
    if name.chars().count() > NAME_MAX_LENGTH {
        return Err(ServiceError::validation(format!(
            "Name cannot exceed {NAME_MAX_LENGTH} characters"
        )));
    }
    Ok(name.to_string())
}

pub fn sanitize_description(raw: Option<String>) -> Result<Option<String>, ServiceError> {
    let Some(trimmed) = raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    if trimmed.chars().count() > DESCRIPTION_MAX_LENGTH {
        return Err(ServiceError::validation(format!(
            "Description cannot exceed {DESCRIPTION_MAX_LENGTH} characters"
        )));
    }
    Ok(Some(trimmed))
}

pub fn sanitize_unit(raw: Option<String>) -> Result<Option<String>, ServiceError> {
    let Some(trimmed) = raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    if trimmed.chars().count() > UNIT_MAX_LENGTH {
        return Err(ServiceError::validation(format!(
            "Unit cannot exceed {UNIT_MAX_LENGTH} characters"
        )));
    }
    Ok(Some(trimmed))
}

/// Uppercase and validate a `#RRGGBB` color.
pub fn sanitize_color(raw: &str) -> Result<String, ServiceError> {
    let color = raw.trim().to_uppercase();
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(ServiceError::validation(
            "Invalid color format (must be #RRGGBB)",
        ));
    }
    Ok(color)
}

// ─── Target configuration ────────────────────────────────────────────────────

/// Validate that a habit's target configuration is consistent.
pub fn validate_target_config(
    value_type: ValueType,
    comparison_type: Option<Comparison>,
    target_value: Option<Decimal>,
    target_min: Option<Decimal>,
    target_max: Option<Decimal>,
) -> Result<(), ServiceError> {
    if value_type == ValueType::Boolean {
        if target_value.is_some() || target_min.is_some() || target_max.is_some() {
            return Err(ServiceError::validation(
                "Boolean habits cannot have numeric targets",
            ));
        }
        if comparison_type.is_some_and(|c| c != Comparison::Equals) {
            return Err(ServiceError::validation(
                "Boolean habits can only use 'equals' comparison",
            ));
        }
        return Ok(());
    }

    match comparison_type {
        Some(Comparison::InRange) => {
            let (Some(min), Some(max)) = (target_min, target_max) else {
                return Err(ServiceError::validation(
                    "Range comparison requires target_min and target_max",
                ));
            };
            if min >= max {
                return Err(ServiceError::validation(
                    "target_min must be less than target_max",
                ));
            }
        }
        Some(cmp) => {
            if target_value.is_none() {
                return Err(ServiceError::validation(format!(
                    "Comparison '{}' requires target_value",
                    cmp.as_str()
                )));
            }
        }
        None => {}
    }

    for (field, value) in [
        ("target_value", target_value),
        ("target_min", target_min),
        ("target_max", target_max),
    ] {
        if let Some(v) = value {
            check_precision(field, v)?;
        }
    }
    Ok(())
}

// ─── Log values ──────────────────────────────────────────────────────────────

/// Validate that a log value is compatible with the habit's value type and
/// fits the persisted NUMERIC(10,2) precision.
pub fn validate_log_value(value: Decimal, value_type: ValueType) -> Result<(), ServiceError> {
    match value_type {
        ValueType::Boolean => {
            if value != Decimal::ZERO && value != Decimal::ONE {
                return Err(ServiceError::validation("Boolean habits only accept 0 or 1"));
            }
        }
        ValueType::Numeric => {
            if value < Decimal::ZERO {
                return Err(ServiceError::validation(
                    "Numeric habit values must be non-negative",
                ));
            }
        }
    }
    check_precision("value", value)
}

fn check_precision(field: &str, value: Decimal) -> Result<(), ServiceError> {
    if value.normalize().scale() > 2 {
        return Err(ServiceError::validation(format!(
            "{field} supports at most 2 decimal places"
        )));
    }
    if value.abs() >= Decimal::from(MAX_MAGNITUDE) {
        return Err(ServiceError::validation(format!(
            "{field} exceeds the supported precision"
        )));
    }
    Ok(())
}

/// Validate that the log date falls inside the habit's active window.
pub fn validate_log_date(habit: &Habit, log_date: NaiveDate) -> Result<(), ServiceError> {
    if let Some(start) = habit.start_date {
        if log_date < start {
            return Err(ServiceError::validation(format!(
                "Cannot log before habit start date ({start})"
            )));
        }
    }
    if let Some(end) = habit.end_date {
        if log_date > end {
            return Err(ServiceError::validation(format!(
                "Cannot log after habit end date ({end})"
            )));
        }
    }
    Ok(())
}
