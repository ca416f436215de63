use indexmap::IndexMap;

/// Which optional (non-`required`) object properties end up in a sampled object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptionalProperties {
    /// Every declared property is sampled (default).
    #[default]
    All,
    /// Only properties listed in `required` are sampled.
    RequiredOnly,
}

/// Constants and switches driving the [`Sampler`](super::Sampler).
///
/// All the literal fallbacks of the sampler live here, so an alternate policy
/// can be plugged in without touching the boundary resolution logic.
///
/// # Default Configuration
///
/// - **Numbers**: `42` when the schema has no bound
/// - **Exclusive step**: `0.001` for `number` exclusive bounds (integers use `1`)
/// - **Strings**: `"string"`, padded or truncated to the length bounds
/// - **Patterns**: `"sample"` when a pattern cannot be expanded
/// - **Booleans**: `true`
/// - **Arrays**: one item unless `minItems` says otherwise
/// - **Objects**: every declared property, `readOnly` ones skipped
///
/// # Example
///
/// ```rust
/// use harspec_core::{OptionalProperties, Sampler, SamplingPolicy};
///
/// let policy = SamplingPolicy::default()
///     .with_default_number(7.0)
///     .with_optional_properties(OptionalProperties::RequiredOnly);
/// let sampler = Sampler::new(policy);
///
/// let value = sampler.sample(&serde_json::json!({ "type": "integer" })).unwrap();
/// assert_eq!(value, serde_json::json!(7));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingPolicy {
    pub(crate) default_number: f64,
    pub(crate) exclusive_step: f64,
    pub(crate) default_string: String,
    pub(crate) pattern_fallback: String,
    pub(crate) default_boolean: bool,
    pub(crate) min_items: u64,
    pub(crate) optional_properties: OptionalProperties,
    pub(crate) skip_read_only: bool,
    pub(crate) skip_write_only: bool,
    pub(crate) formats: IndexMap<String, String>,
}

impl Default for SamplingPolicy {
    fn default() -> Self {
        let formats = [
            ("date-time", "2019-08-24T14:15:22Z"),
            ("date", "2019-08-24"),
            ("time", "14:15:22Z"),
            ("duration", "P3D"),
            ("email", "user@example.com"),
            ("idn-email", "user@example.com"),
            ("hostname", "example.com"),
            ("idn-hostname", "example.com"),
            ("ipv4", "192.168.0.1"),
            ("ipv6", "2001:0db8:85a3:0000:0000:8a2e:0370:7334"),
            ("uri", "http://example.com"),
            ("iri", "http://example.com"),
            ("uri-reference", "../dictionary"),
            ("iri-reference", "../dictionary"),
            ("uri-template", "http://example.com/{endpoint}"),
            ("uuid", "497f6eca-6276-4993-bfeb-53cbbbba6f08"),
            ("byte", "U3dhZ2dlciByb2Nrcw=="),
            ("binary", "binary"),
            ("password", "pa$$word"),
            ("json-pointer", "/json/pointer"),
            ("relative-json-pointer", "1/relative/json/pointer"),
            ("regex", "/regex/"),
        ]
        .into_iter()
        .map(|(format, example)| (format.to_string(), example.to_string()))
        .collect();

        Self {
            default_number: 42.0,
            exclusive_step: 0.001,
            default_string: "string".to_string(),
            pattern_fallback: "sample".to_string(),
            default_boolean: true,
            min_items: 1,
            optional_properties: OptionalProperties::default(),
            skip_read_only: true,
            skip_write_only: false,
            formats,
        }
    }
}

impl SamplingPolicy {
    /// Sets the value used for numeric schemas without any bound.
    pub fn with_default_number(mut self, value: f64) -> Self {
        self.default_number = value;
        self
    }

    /// Sets the increment applied to exclusive bounds of `number` schemas.
    ///
    /// Non-positive steps are ignored.
    pub fn with_exclusive_step(mut self, step: f64) -> Self {
        if step > 0.0 {
            self.exclusive_step = step;
        }
        self
    }

    /// Sets the placeholder used for unconstrained strings.
    pub fn with_default_string(mut self, value: impl Into<String>) -> Self {
        self.default_string = value.into();
        self
    }

    /// Sets the string returned when a `pattern` cannot be expanded.
    pub fn with_pattern_fallback(mut self, value: impl Into<String>) -> Self {
        self.pattern_fallback = value.into();
        self
    }

    /// Sets the value used for `boolean` schemas.
    pub fn with_default_boolean(mut self, value: bool) -> Self {
        self.default_boolean = value;
        self
    }

    /// Sets the array length used when `minItems` is absent.
    pub fn with_min_items(mut self, min_items: u64) -> Self {
        self.min_items = min_items;
        self
    }

    /// Chooses which optional object properties are sampled.
    pub fn with_optional_properties(mut self, optional_properties: OptionalProperties) -> Self {
        self.optional_properties = optional_properties;
        self
    }

    /// Skips (`true`, default) or keeps `readOnly` properties.
    pub fn with_skip_read_only(mut self, skip: bool) -> Self {
        self.skip_read_only = skip;
        self
    }

    /// Skips or keeps (`false`, default) `writeOnly` properties.
    pub fn with_skip_write_only(mut self, skip: bool) -> Self {
        self.skip_write_only = skip;
        self
    }

    /// Registers (or replaces) the canonical example of a string `format`.
    pub fn with_format(mut self, format: impl Into<String>, example: impl Into<String>) -> Self {
        self.formats.insert(format.into(), example.into());
        self
    }

    /// Returns the canonical example for a string `format`, if known.
    pub fn format_example(&self, format: &str) -> Option<&str> {
        self.formats.get(format).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_provide_canonical_formats() {
        let policy = SamplingPolicy::default();

        assert_eq!(
            policy.format_example("date-time"),
            Some("2019-08-24T14:15:22Z")
        );
        assert_eq!(
            policy.format_example("uuid"),
            Some("497f6eca-6276-4993-bfeb-53cbbbba6f08")
        );
        assert_eq!(policy.format_example("unknown"), None);
    }

    #[test]
    fn should_override_format() {
        let policy = SamplingPolicy::default().with_format("uuid", "00000000-0000-0000-0000-000000000000");

        assert_eq!(
            policy.format_example("uuid"),
            Some("00000000-0000-0000-0000-000000000000")
        );
    }

    #[test]
    fn should_ignore_non_positive_exclusive_step() {
        let policy = SamplingPolicy::default().with_exclusive_step(-1.0);

        assert!((policy.exclusive_step - 0.001).abs() < f64::EPSILON);
    }
}
