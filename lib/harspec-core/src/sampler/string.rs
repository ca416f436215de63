use serde_json::Value;
use tracing::debug;

use super::SamplingPolicy;
use super::pattern::sample_pattern;
use super::schema::SchemaNode;
use crate::error::SamplingError;

/// Samples a `string` node: pattern, then known format, then the placeholder.
pub(super) fn sample_string(
    node: &SchemaNode,
    policy: &SamplingPolicy,
) -> Result<Value, SamplingError> {
    if let (Some(min_length), Some(max_length)) = (node.min_length, node.max_length)
        && min_length > max_length
    {
        return Err(SamplingError::StringLength {
            min_length,
            max_length,
        });
    }

    if let Some(pattern) = &node.pattern {
        let value = sample_pattern(pattern).unwrap_or_else(|| {
            debug!(%pattern, "using pattern fallback");
            policy.pattern_fallback.clone()
        });
        return Ok(Value::String(value));
    }

    if let Some(example) = node
        .format
        .as_deref()
        .and_then(|format| policy.format_example(format))
    {
        return Ok(Value::String(example.to_string()));
    }

    let value = fit_length(&policy.default_string, node.min_length, node.max_length);
    Ok(Value::String(value))
}

/// Repeats the placeholder up to `min_length`, then truncates to `max_length`.
fn fit_length(placeholder: &str, min_length: Option<u64>, max_length: Option<u64>) -> String {
    let length = placeholder.chars().count();
    let min_length = min_length.and_then(|min| usize::try_from(min).ok()).unwrap_or(0);
    let target = length.max(min_length);
    let target = max_length
        .and_then(|max| usize::try_from(max).ok())
        .map_or(target, |max| target.min(max));

    if length == 0 {
        return "x".repeat(target);
    }
    placeholder.chars().cycle().take(target).collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample(schema: Value) -> Result<Value, SamplingError> {
        let node = SchemaNode::from_value(&schema).expect("a schema");
        sample_string(&node, &SamplingPolicy::default())
    }

    #[test]
    fn should_sample_placeholder() {
        assert_eq!(sample(json!({ "type": "string" })), Ok(json!("string")));
    }

    #[test]
    fn should_fit_length_bounds() {
        assert_eq!(
            sample(json!({ "type": "string", "minLength": 10 })),
            Ok(json!("stringstri"))
        );
        assert_eq!(
            sample(json!({ "type": "string", "maxLength": 3 })),
            Ok(json!("str"))
        );
    }

    #[test]
    fn should_sample_known_format() {
        assert_eq!(
            sample(json!({ "type": "string", "format": "date-time" })),
            Ok(json!("2019-08-24T14:15:22Z"))
        );
        assert_eq!(
            sample(json!({ "type": "string", "format": "custom" })),
            Ok(json!("string"))
        );
    }

    #[test]
    fn should_sample_pattern() {
        assert_eq!(
            sample(json!({ "type": "string", "pattern": "^[0-9]{3}$" })),
            Ok(json!("000"))
        );
    }

    #[test]
    fn should_fall_back_for_infeasible_pattern() {
        assert_eq!(
            sample(json!({ "type": "string", "pattern": "^(?=a)a$" })),
            Ok(json!("sample"))
        );
    }

    #[test]
    fn should_reject_conflicting_lengths() {
        let error = sample(json!({ "type": "string", "minLength": 5, "maxLength": 2 }))
            .expect_err("unsatisfiable");

        insta::assert_snapshot!(error, @"Cannot sample string by length: 5 <= length <= 2");
    }
}
