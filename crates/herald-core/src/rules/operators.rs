//! Extension operators registered on the JSON-logic engine.
//!
//! Each operator receives its already-evaluated operands `(left, right)`.
//! Type mismatches never raise: they produce `false`. `=` is an alias of the
//! engine's loose `==`.

use datalogic_rs::arena::DataArena;
use datalogic_rs::{CustomOperator, DataValue, LogicError};

use super::RuleEvaluator;

/// Register the full extension set on an evaluator.
pub fn register_extensions(evaluator: RuleEvaluator) -> RuleEvaluator {
    evaluator
        .with_alias("=", "==")
        .with_operator("beginsWith", StringTest(|s, p| s.starts_with(p)))
        .with_operator("doesNotBeginWith", StringTest(|s, p| !s.starts_with(p)))
        .with_operator("endsWith", StringTest(|s, p| s.ends_with(p)))
        .with_operator("doesNotEndWith", StringTest(|s, p| !s.ends_with(p)))
        .with_operator("contains", StringTest(|s, p| s.contains(p)))
        .with_operator("doesNotContain", StringTest(|s, p| !s.contains(p)))
        .with_operator("null", NullTest { expect_null: true })
        .with_operator("notNull", NullTest { expect_null: false })
        .with_operator("notIn", NotIn)
        .with_operator("between", RangeTest { inside: true })
        .with_operator("notBetween", RangeTest { inside: false })
}

fn verdict<'a>(arena: &'a DataArena, value: bool) -> &'a DataValue<'a> {
    arena.alloc(DataValue::Bool(value))
}

/// Prefix, suffix, or substring test. Both operands must be strings.
#[derive(Debug)]
struct StringTest(fn(&str, &str) -> bool);

impl CustomOperator for StringTest {
    fn evaluate<'a>(
        &self,
        args: &'a [DataValue<'a>],
        arena: &'a DataArena,
    ) -> Result<&'a DataValue<'a>, LogicError> {
        let matched = match (args.first(), args.get(1)) {
            (Some(DataValue::String(subject)), Some(DataValue::String(pattern))) => {
                (self.0)(subject, pattern)
            }
            _ => false,
        };
        Ok(verdict(arena, matched))
    }
}

/// Strict identity with null. A missing operand counts as null.
#[derive(Debug)]
struct NullTest {
    expect_null: bool,
}

impl CustomOperator for NullTest {
    fn evaluate<'a>(
        &self,
        args: &'a [DataValue<'a>],
        arena: &'a DataArena,
    ) -> Result<&'a DataValue<'a>, LogicError> {
        let is_null = matches!(args.first(), None | Some(DataValue::Null));
        Ok(verdict(arena, is_null == self.expect_null))
    }
}

/// True iff `left` is strictly absent from the `right` array.
#[derive(Debug)]
struct NotIn;

impl CustomOperator for NotIn {
    fn evaluate<'a>(
        &self,
        args: &'a [DataValue<'a>],
        arena: &'a DataArena,
    ) -> Result<&'a DataValue<'a>, LogicError> {
        let absent = match (args.first(), args.get(1)) {
            (needle, Some(DataValue::Array(items))) => !items
                .iter()
                .any(|item| needle.is_some_and(|needle| strict_eq(item, needle))),
            _ => false,
        };
        Ok(verdict(arena, absent))
    }
}

/// Inclusive `[min, max]` test. `inside` selects `between` vs `notBetween`.
#[derive(Debug)]
struct RangeTest {
    inside: bool,
}

impl CustomOperator for RangeTest {
    fn evaluate<'a>(
        &self,
        args: &'a [DataValue<'a>],
        arena: &'a DataArena,
    ) -> Result<&'a DataValue<'a>, LogicError> {
        let within = match (number(args.first()), args.get(1)) {
            (Some(value), Some(DataValue::Array(bounds))) => match &bounds[..] {
                [min, max] => match (number(Some(min)), number(Some(max))) {
                    (Some(min), Some(max)) => Some(min <= value && value <= max),
                    _ => None,
                },
                _ => None,
            },
            _ => None,
        };
        let result = match within {
            Some(within) => within == self.inside,
            None => false,
        };
        Ok(verdict(arena, result))
    }
}

/// Numeric operands only; numeric strings do not count.
fn number(value: Option<&DataValue<'_>>) -> Option<f64> {
    match value {
        Some(value @ DataValue::Number(_)) => value.as_f64(),
        _ => None,
    }
}

/// Scalars compare by value, containers never match.
fn strict_eq(a: &DataValue<'_>, b: &DataValue<'_>) -> bool {
    match (a, b) {
        (DataValue::Null, DataValue::Null) => true,
        (DataValue::Bool(x), DataValue::Bool(y)) => x == y,
        (DataValue::String(x), DataValue::String(y)) => x == y,
        (DataValue::Number(_), DataValue::Number(_)) => a.as_f64() == b.as_f64(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use crate::rules::{EvaluationMode, RuleEvaluator};

    fn check(rule: Value, data: Value) -> bool {
        let outcome = RuleEvaluator::new()
            .evaluate(&rule, &data, EvaluationMode::Unsafe)
            .unwrap();
        assert!(outcome.error.is_none());
        outcome.result
    }

    fn payload(value: Value) -> Value {
        json!({ "payload": { "v": value } })
    }

    #[test]
    fn test_equals_loose() {
        assert!(check(json!({ "=": [{ "var": "payload.v" }, "5"] }), payload(json!(5))));
        assert!(!check(json!({ "=": [{ "var": "payload.v" }, "6"] }), payload(json!(5))));
    }

    #[test]
    fn test_begins_with() {
        let data = payload(json!("hello world"));
        assert!(check(json!({ "beginsWith": [{ "var": "payload.v" }, "hello"] }), data.clone()));
        assert!(!check(json!({ "beginsWith": [{ "var": "payload.v" }, "world"] }), data.clone()));
        assert!(check(json!({ "doesNotBeginWith": [{ "var": "payload.v" }, "world"] }), data.clone()));
        assert!(!check(json!({ "doesNotBeginWith": [{ "var": "payload.v" }, "hello"] }), data));
    }

    #[test]
    fn test_ends_with() {
        let data = payload(json!("report.pdf"));
        assert!(check(json!({ "endsWith": [{ "var": "payload.v" }, ".pdf"] }), data.clone()));
        assert!(!check(json!({ "endsWith": [{ "var": "payload.v" }, ".txt"] }), data.clone()));
        assert!(check(json!({ "doesNotEndWith": [{ "var": "payload.v" }, ".txt"] }), data.clone()));
        assert!(!check(json!({ "doesNotEndWith": [{ "var": "payload.v" }, ".pdf"] }), data));
    }

    #[test]
    fn test_contains() {
        let data = payload(json!("critical error occurred"));
        assert!(check(json!({ "contains": [{ "var": "payload.v" }, "error"] }), data.clone()));
        assert!(!check(json!({ "contains": [{ "var": "payload.v" }, "warning"] }), data.clone()));
        assert!(check(json!({ "doesNotContain": [{ "var": "payload.v" }, "warning"] }), data.clone()));
        assert!(!check(json!({ "doesNotContain": [{ "var": "payload.v" }, "error"] }), data));
    }

    #[test]
    fn test_string_operators_type_mismatch_is_false() {
        let data = payload(json!(42));
        for op in [
            "beginsWith",
            "doesNotBeginWith",
            "endsWith",
            "doesNotEndWith",
            "contains",
            "doesNotContain",
        ] {
            assert!(!check(json!({ op: [{ "var": "payload.v" }, "4"] }), data.clone()), "{op}");
        }
        // Missing left operand is null, not a string.
        assert!(!check(json!({ "doesNotContain": [{ "var": "payload.nope" }, "x"] }), data));
    }

    #[test]
    fn test_null_and_not_null() {
        assert!(check(json!({ "null": [{ "var": "payload.v" }] }), payload(Value::Null)));
        assert!(check(json!({ "null": [{ "var": "payload.missing" }] }), payload(json!(1))));
        assert!(!check(json!({ "null": [{ "var": "payload.v" }] }), payload(json!(0))));
        assert!(check(json!({ "notNull": [{ "var": "payload.v" }] }), payload(json!(""))));
        assert!(!check(json!({ "notNull": [{ "var": "payload.v" }] }), payload(Value::Null)));
    }

    #[test]
    fn test_not_in() {
        let data = payload(json!("gold"));
        assert!(check(json!({ "notIn": [{ "var": "payload.v" }, ["silver", "bronze"]] }), data.clone()));
        assert!(!check(json!({ "notIn": [{ "var": "payload.v" }, ["gold", "silver"]] }), data.clone()));
        assert!(!check(json!({ "notIn": [{ "var": "payload.v" }, "silver,bronze"] }), data));
    }

    #[test]
    fn test_between_inclusive() {
        assert!(check(json!({ "between": [{ "var": "payload.v" }, [1, 10]] }), payload(json!(1))));
        assert!(check(json!({ "between": [{ "var": "payload.v" }, [1, 10]] }), payload(json!(10))));
        assert!(check(json!({ "between": [{ "var": "payload.v" }, [1, 10]] }), payload(json!(5.5))));
        assert!(!check(json!({ "between": [{ "var": "payload.v" }, [1, 10]] }), payload(json!(11))));
    }

    #[test]
    fn test_not_between() {
        assert!(check(json!({ "notBetween": [{ "var": "payload.v" }, [1, 10]] }), payload(json!(0))));
        assert!(!check(json!({ "notBetween": [{ "var": "payload.v" }, [1, 10]] }), payload(json!(10))));
    }

    #[test]
    fn test_between_malformed_is_false() {
        for rule in [
            json!({ "between": [{ "var": "payload.v" }, [1]] }),
            json!({ "between": [{ "var": "payload.v" }, [1, 2, 3]] }),
            json!({ "between": [{ "var": "payload.v" }, ["1", "10"]] }),
            json!({ "between": [{ "var": "payload.v" }, 5] }),
            json!({ "notBetween": [{ "var": "payload.v" }, [1]] }),
        ] {
            assert!(!check(rule.clone(), payload(json!(5))), "{rule}");
        }
        // Non-numeric left
        assert!(!check(json!({ "between": [{ "var": "payload.v" }, [1, 10]] }), payload(json!("5"))));
        assert!(!check(json!({ "notBetween": [{ "var": "payload.v" }, [1, 10]] }), payload(json!("50"))));
    }
}
