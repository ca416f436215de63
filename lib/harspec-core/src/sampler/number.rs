use serde_json::{Number, Value};
use tracing::debug;

use super::SamplingPolicy;
use super::decimal::{Decimal, div_ceil, div_floor, lcm};
use super::schema::{ExclusiveBound, SchemaNode};
use crate::error::SamplingError;

/// A declared bound, as written in the schema.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Bound {
    value: f64,
    exclusive: bool,
}

impl Bound {
    fn operator(self) -> &'static str {
        if self.exclusive { "<" } else { "<=" }
    }
}

fn lower_bound(node: &SchemaNode) -> Option<Bound> {
    let inclusive = node.minimum;
    match node.exclusive_minimum {
        Some(ExclusiveBound::Flag(true)) => inclusive.map(|value| Bound {
            value,
            exclusive: true,
        }),
        Some(ExclusiveBound::Bound(exclusive)) => Some(match inclusive {
            Some(minimum) if minimum > exclusive => Bound {
                value: minimum,
                exclusive: false,
            },
            _ => Bound {
                value: exclusive,
                exclusive: true,
            },
        }),
        Some(ExclusiveBound::Flag(false)) | None => inclusive.map(|value| Bound {
            value,
            exclusive: false,
        }),
    }
}

fn upper_bound(node: &SchemaNode) -> Option<Bound> {
    let inclusive = node.maximum;
    match node.exclusive_maximum {
        Some(ExclusiveBound::Flag(true)) => inclusive.map(|value| Bound {
            value,
            exclusive: true,
        }),
        Some(ExclusiveBound::Bound(exclusive)) => Some(match inclusive {
            Some(maximum) if maximum < exclusive => Bound {
                value: maximum,
                exclusive: false,
            },
            _ => Bound {
                value: exclusive,
                exclusive: true,
            },
        }),
        Some(ExclusiveBound::Flag(false)) | None => inclusive.map(|value| Bound {
            value,
            exclusive: false,
        }),
    }
}

/// Renders `<min> <op> x <op> <max>`, omitting a missing side.
fn predicate(lower: Option<Bound>, upper: Option<Bound>, multiple_of: Option<f64>) -> String {
    let mut parts = Vec::with_capacity(5);
    if let Some(lower) = lower {
        parts.push(lower.value.to_string());
        parts.push(lower.operator().to_string());
    }
    parts.push("x".to_string());
    if let Some(upper) = upper {
        parts.push(upper.operator().to_string());
        parts.push(upper.value.to_string());
    }

    let mut result = parts.join(" ");
    if let Some(multiple_of) = multiple_of {
        result.push_str(&format!(", multipleOf: {multiple_of}"));
    }
    result
}

/// The constraints of a numeric node, read once.
#[derive(Debug, Clone, Copy)]
struct NumericConstraints {
    lower: Option<Bound>,
    upper: Option<Bound>,
    multiple_of: Option<f64>,
    integer: bool,
}

impl NumericConstraints {
    fn unsatisfiable(&self, with_multiple: bool) -> SamplingError {
        let multiple_of = self.multiple_of.filter(|_| with_multiple);
        SamplingError::NumericBoundaries {
            predicate: predicate(self.lower, self.upper, multiple_of),
        }
    }
}

/// Samples an `integer` or `number` node.
pub(super) fn sample_number(
    node: &SchemaNode,
    integer: bool,
    policy: &SamplingPolicy,
) -> Result<Value, SamplingError> {
    let constraints = NumericConstraints {
        lower: lower_bound(node),
        upper: upper_bound(node),
        multiple_of: node.multiple_of.filter(|multiple| *multiple > 0.0),
        integer,
    };

    match sample_decimal(&constraints, policy) {
        Some(result) => result.map(|value| to_json(value, integer)),
        None => {
            debug!(?constraints, "numeric bounds exceed decimal precision, sampling as float");
            sample_float(&constraints, policy)
        }
    }
}

fn to_json(value: Decimal, integer: bool) -> Value {
    if let Some(integral) = value.to_i64() {
        return Value::from(integral);
    }
    let float = value.to_f64();
    let float = if integer { float.round() } else { float };
    Number::from_f64(float).map_or(Value::Null, Value::Number)
}

fn effective_lower(bound: Bound, integer: bool, step: Decimal) -> Option<Decimal> {
    let value = Decimal::from_f64(bound.value)?;
    match (integer, bound.exclusive) {
        (true, true) => value.floor()?.checked_add(Decimal::ONE),
        (true, false) => value.ceil(),
        (false, true) => value.checked_add(step),
        (false, false) => Some(value),
    }
}

fn effective_upper(bound: Bound, integer: bool, step: Decimal) -> Option<Decimal> {
    let value = Decimal::from_f64(bound.value)?;
    match (integer, bound.exclusive) {
        (true, true) => value.ceil()?.checked_sub(Decimal::ONE),
        (true, false) => value.floor(),
        (false, true) => value.checked_sub(step),
        (false, false) => Some(value),
    }
}

/// Exact sampling with decimal-scaled integers.
///
/// Returns `None` when a number does not fit the decimal representation.
fn sample_decimal(
    constraints: &NumericConstraints,
    policy: &SamplingPolicy,
) -> Option<Result<Decimal, SamplingError>> {
    let integer = constraints.integer;
    let step = if integer {
        Decimal::ONE
    } else {
        Decimal::from_f64(policy.exclusive_step)?
    };

    let lower = match constraints.lower {
        Some(bound) => Some(effective_lower(bound, integer, step)?),
        None => None,
    };
    let upper = match constraints.upper {
        Some(bound) => Some(effective_upper(bound, integer, step)?),
        None => None,
    };

    if let (Some(lower), Some(upper)) = (lower, upper)
        && lower > upper
    {
        return Some(Err(constraints.unsatisfiable(false)));
    }

    let Some(multiple_of) = constraints.multiple_of else {
        let fallback = Decimal::from_f64(policy.default_number)?;
        let fallback = if integer { fallback.ceil()? } else { fallback };
        return Some(Ok(lower.or(upper).unwrap_or(fallback)));
    };

    let multiple_of = Decimal::from_f64(multiple_of)?;
    if !multiple_of.is_positive() {
        return None;
    }

    let scale = [Some(multiple_of), lower, upper]
        .into_iter()
        .flatten()
        .map(Decimal::scale)
        .max()
        .unwrap_or_default();
    let mut unit = multiple_of.units_at(scale)?;
    if integer {
        // integral multiples only
        unit = lcm(unit, 10_i128.checked_pow(scale)?)?;
    }

    let units = if let Some(lower) = lower {
        let units = div_ceil(lower.units_at(scale)?, unit).checked_mul(unit)?;
        if let Some(upper) = upper
            && units > upper.units_at(scale)?
        {
            return Some(Err(constraints.unsatisfiable(true)));
        }
        units
    } else if let Some(upper) = upper {
        div_floor(upper.units_at(scale)?, unit).checked_mul(unit)?
    } else {
        unit
    };

    Some(Ok(Decimal::new(units, scale)))
}

/// Float sampling for magnitudes beyond the decimal representation.
fn sample_float(
    constraints: &NumericConstraints,
    policy: &SamplingPolicy,
) -> Result<Value, SamplingError> {
    let integer = constraints.integer;
    let step = if integer { 1.0 } else { policy.exclusive_step };

    let lower = constraints.lower.map(|bound| match (integer, bound.exclusive) {
        (true, true) => bound.value.floor() + 1.0,
        (true, false) => bound.value.ceil(),
        (false, true) => bound.value + step,
        (false, false) => bound.value,
    });
    let upper = constraints.upper.map(|bound| match (integer, bound.exclusive) {
        (true, true) => bound.value.ceil() - 1.0,
        (true, false) => bound.value.floor(),
        (false, true) => bound.value - step,
        (false, false) => bound.value,
    });

    if let (Some(lower), Some(upper)) = (lower, upper)
        && lower > upper
    {
        return Err(constraints.unsatisfiable(false));
    }

    let value = match (constraints.multiple_of, lower, upper) {
        (Some(multiple), Some(lower), upper) => {
            let value = (lower / multiple).ceil() * multiple;
            if upper.is_some_and(|upper| value > upper) {
                return Err(constraints.unsatisfiable(true));
            }
            value
        }
        (Some(multiple), None, Some(upper)) => (upper / multiple).floor() * multiple,
        (Some(multiple), None, None) => multiple,
        (None, lower, upper) => lower.or(upper).unwrap_or(policy.default_number),
    };

    let value = if integer { value.round() } else { value };
    Ok(Number::from_f64(value).map_or(Value::Null, Value::Number))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample(schema: Value) -> Result<Value, SamplingError> {
        let node = SchemaNode::from_value(&schema).expect("a schema");
        let integer = node.schema_type == Some(super::super::SchemaType::Single("integer".to_string()));
        sample_number(&node, integer, &SamplingPolicy::default())
    }

    #[test]
    fn should_sample_default_number() {
        assert_eq!(sample(json!({ "type": "number" })), Ok(json!(42)));
    }

    #[test]
    fn should_bump_exclusive_integer_minimum() {
        assert_eq!(
            sample(json!({ "type": "integer", "minimum": 10, "exclusiveMinimum": true })),
            Ok(json!(11))
        );
    }

    #[test]
    fn should_use_decimal_step_for_exclusive_number() {
        assert_eq!(
            sample(json!({ "type": "number", "minimum": 10, "exclusiveMinimum": true })),
            Ok(json!(10.001))
        );
        assert_eq!(
            sample(json!({ "type": "number", "maximum": 10, "exclusiveMaximum": true })),
            Ok(json!(9.999))
        );
    }

    #[test]
    fn should_keep_multiplier_precision() {
        assert_eq!(
            sample(json!({ "type": "number", "minimum": 135, "multipleOf": 13.3 })),
            Ok(json!(146.3))
        );
        assert_eq!(
            sample(json!({ "type": "number", "minimum": -20, "multipleOf": 13.3 })),
            Ok(json!(-13.3))
        );
    }

    #[test]
    fn should_use_largest_multiple_below_maximum() {
        assert_eq!(
            sample(json!({ "type": "number", "maximum": 20, "multipleOf": 3.5 })),
            Ok(json!(17.5))
        );
    }

    #[test]
    fn should_only_pick_integral_multiples_for_integers() {
        assert_eq!(
            sample(json!({ "type": "integer", "minimum": 1, "multipleOf": 2.5 })),
            Ok(json!(5))
        );
    }

    #[test]
    fn should_read_numeric_exclusive_bounds() {
        assert_eq!(
            sample(json!({ "type": "integer", "exclusiveMinimum": 5 })),
            Ok(json!(6))
        );
        assert_eq!(
            sample(json!({ "type": "integer", "minimum": 7, "exclusiveMinimum": 5 })),
            Ok(json!(7))
        );
    }

    #[test]
    fn should_render_conflicting_predicate() {
        let error = sample(json!({ "type": "number", "minimum": 5, "maximum": 3 }))
            .expect_err("unsatisfiable");

        insta::assert_snapshot!(error, @"Cannot sample numeric by boundaries: 5 <= x <= 3");
    }

    #[test]
    fn should_render_multiple_of_in_predicate() {
        let error = sample(json!({
            "type": "number",
            "minimum": 5,
            "exclusiveMinimum": true,
            "maximum": 13,
            "multipleOf": 15
        }))
        .expect_err("unsatisfiable");

        insta::assert_snapshot!(error, @"Cannot sample numeric by boundaries: 5 < x <= 13, multipleOf: 15");
    }

    #[test]
    fn should_fall_back_to_float_for_huge_bounds() {
        assert_eq!(
            sample(json!({ "type": "number", "minimum": 1e300 })),
            Ok(json!(1e300))
        );
    }
}
