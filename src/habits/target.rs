//! Target comparison dispatch.
//!
//! Decides whether a logged value (or a period's summed value) satisfies a
//! habit's configured comparison rule. All comparisons are exact decimal
//! comparisons — never binary floats.

use rust_decimal::Decimal;

use super::model::{Comparison, Habit, ValueType};

/// True when `value` meets the habit's target.
///
/// Boolean habits are met iff the value is exactly 1. A habit without a
/// comparison rule (or without the value its rule needs) is vacuously met:
/// there is no objective to miss.
pub fn target_met(habit: &Habit, value: Decimal) -> bool {
    if habit.value_type == ValueType::Boolean {
        return value == Decimal::ONE;
    }

    let Some(comparison) = habit.comparison_type else {
        return true;
    };

    if comparison == Comparison::InRange {
        return match (habit.target_min, habit.target_max) {
            (Some(min), Some(max)) => min <= value && value <= max,
            _ => true,
        };
    }

    let Some(target) = habit.target_value else {
        return true;
    };
    match comparison {
        Comparison::Equals => value == target,
        Comparison::GreaterThan => value > target,
        Comparison::LessThan => value < target,
        Comparison::GreaterEqualThan => value >= target,
        Comparison::LessEqualThan => value <= target,
        // in_range handled above
        Comparison::InRange => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habits::model::Frequency;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn habit(
        value_type: ValueType,
        comparison_type: Option<Comparison>,
        target_value: Option<Decimal>,
        target_min: Option<Decimal>,
        target_max: Option<Decimal>,
    ) -> Habit {
        Habit {
            id: 1,
            name: "test".into(),
            description: None,
            value_type,
            unit: None,
            frequency: Frequency::Daily,
            target_value,
            target_min,
            target_max,
            comparison_type,
            default_value: None,
            streak_strict: false,
            start_date: None,
            end_date: None,
            color: "#3B82F6".into(),
            icon: "fas fa-check".into(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn boolean_met_only_at_one() {
        let h = habit(ValueType::Boolean, None, None, None, None);
        assert!(target_met(&h, Decimal::ONE));
        assert!(!target_met(&h, Decimal::ZERO));
        assert!(!target_met(&h, dec("2")));
    }

    #[test]
    fn no_rule_is_vacuously_met() {
        let h = habit(ValueType::Numeric, None, None, None, None);
        assert!(target_met(&h, Decimal::ZERO));
        assert!(target_met(&h, dec("999")));
    }

    #[test]
    fn comparison_without_target_is_vacuously_met() {
        let h = habit(ValueType::Numeric, Some(Comparison::GreaterThan), None, None, None);
        assert!(target_met(&h, Decimal::ZERO));
    }

    #[test]
    fn direct_comparisons() {
        let target = Some(dec("8"));
        let cases = [
            (Comparison::Equals, dec("8"), true),
            (Comparison::Equals, dec("8.01"), false),
            (Comparison::GreaterThan, dec("8"), false),
            (Comparison::GreaterThan, dec("8.01"), true),
            (Comparison::LessThan, dec("7.99"), true),
            (Comparison::LessThan, dec("8"), false),
            (Comparison::GreaterEqualThan, dec("8"), true),
            (Comparison::GreaterEqualThan, dec("7.99"), false),
            (Comparison::LessEqualThan, dec("8"), true),
            (Comparison::LessEqualThan, dec("8.01"), false),
        ];
        for (cmp, value, expected) in cases {
            let h = habit(ValueType::Numeric, Some(cmp), target, None, None);
            assert_eq!(target_met(&h, value), expected, "{cmp:?} {value}");
        }
    }

    #[test]
    fn in_range_is_inclusive() {
        let h = habit(
            ValueType::Numeric,
            Some(Comparison::InRange),
            None,
            Some(dec("70")),
            Some(dec("75")),
        );
        assert!(target_met(&h, dec("70")));
        assert!(target_met(&h, dec("73.0")));
        assert!(target_met(&h, dec("75")));
        assert!(!target_met(&h, dec("75.7")));
        assert!(!target_met(&h, dec("69.99")));
    }

    #[test]
    fn in_range_with_missing_bound_is_vacuously_met() {
        let h = habit(ValueType::Numeric, Some(Comparison::InRange), None, Some(dec("70")), None);
        assert!(target_met(&h, dec("1000")));
    }

    #[test]
    fn exact_decimal_comparison() {
        // 0.1 + 0.2 == 0.3 must hold exactly.
        let h = habit(
            ValueType::Numeric,
            Some(Comparison::Equals),
            Some(dec("0.3")),
            None,
            None,
        );
        assert!(target_met(&h, dec("0.1") + dec("0.2")));
    }
}
