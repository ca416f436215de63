//! Example-value sampling from JSON schemas.
//!
//! The [`Sampler`] produces exactly one value per schema node, honoring:
//!
//! - numeric bounds, exclusivity and `multipleOf` (exact decimal arithmetic)
//! - string `pattern`, `format`, `minLength`/`maxLength`
//! - array `minItems`/`maxItems`/`items`
//! - object `properties`/`required`
//! - `allOf` (merged), `oneOf`/`anyOf` (first alternative)
//!
//! Explicit values win over generation: `const`, `example`, `default`,
//! `examples`, then `enum`.
//!
//! ```rust
//! use harspec_core::sample;
//! use serde_json::json;
//!
//! let value = sample(&json!({ "type": "integer", "minimum": 10, "exclusiveMinimum": true }));
//! assert_eq!(value.unwrap(), json!(11));
//!
//! let error = sample(&json!({ "type": "number", "minimum": 5, "maximum": 3 })).unwrap_err();
//! assert_eq!(error.to_string(), "Cannot sample numeric by boundaries: 5 <= x <= 3");
//! ```

use serde_json::{Map, Value};

use crate::error::SamplingError;

mod decimal;
mod number;
mod pattern;
mod string;

mod policy;
pub use self::policy::{OptionalProperties, SamplingPolicy};

mod schema;
use self::schema::Kind;
pub use self::schema::{AdditionalProperties, ExclusiveBound, Items, SchemaNode, SchemaType};

/// Deterministic schema sampler.
///
/// Sampling the same schema twice with the same policy yields the same value.
#[derive(Debug, Clone, Default)]
pub struct Sampler {
    policy: SamplingPolicy,
}

/// Samples a schema with the default [`SamplingPolicy`].
///
/// # Errors
///
/// Fails with a [`SamplingError`] when the constraints admit no value.
pub fn sample(schema: &Value) -> Result<Value, SamplingError> {
    Sampler::default().sample(schema)
}

impl Sampler {
    /// Creates a sampler driven by `policy`.
    pub fn new(policy: SamplingPolicy) -> Self {
        Self { policy }
    }

    /// The policy in use.
    pub fn policy(&self) -> &SamplingPolicy {
        &self.policy
    }

    /// Samples a schema given as JSON.
    ///
    /// # Errors
    ///
    /// Fails when the value is not a schema, or when its constraints admit no value.
    pub fn sample(&self, schema: &Value) -> Result<Value, SamplingError> {
        let node = SchemaNode::from_value(schema)?;
        self.sample_schema(&node)
    }

    /// Samples a typed schema node.
    ///
    /// # Errors
    ///
    /// Fails when the constraints admit no value.
    pub fn sample_schema(&self, node: &SchemaNode) -> Result<Value, SamplingError> {
        if !node.all_of.is_empty() {
            return self.sample_schema(&node.merged());
        }
        if let Some(alternative) = node.one_of.first().or(node.any_of.first()) {
            return self.sample_schema(&node.with_alternative(alternative));
        }
        if let Some(value) = node.explicit_value() {
            return Ok(value.clone());
        }

        match node.kind() {
            Some(Kind::Integer) => number::sample_number(node, true, &self.policy),
            Some(Kind::Number) => number::sample_number(node, false, &self.policy),
            Some(Kind::String) => string::sample_string(node, &self.policy),
            Some(Kind::Boolean) => Ok(Value::Bool(self.policy.default_boolean)),
            Some(Kind::Array) => self.sample_array(node),
            Some(Kind::Object) => self.sample_object(node),
            Some(Kind::Null) | None => Ok(Value::Null),
        }
    }

    fn sample_array(&self, node: &SchemaNode) -> Result<Value, SamplingError> {
        if let (Some(min_items), Some(max_items)) = (node.min_items, node.max_items)
            && min_items > max_items
        {
            return Err(SamplingError::ArrayLength {
                min_items,
                max_items,
            });
        }

        let length = node.min_items.unwrap_or(self.policy.min_items);
        let length = node.max_items.map_or(length, |max_items| length.min(max_items));

        let Some(item) = node.items.as_ref().and_then(Items::first) else {
            return Ok(Value::Array((0..length).map(|_| Value::Null).collect()));
        };

        let items = (0..length)
            .map(|_| self.sample_schema(item))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Value::Array(items))
    }

    fn sample_object(&self, node: &SchemaNode) -> Result<Value, SamplingError> {
        let mut object = Map::new();
        for (name, property) in &node.properties {
            let required = node.required.contains(name);
            if !required && self.policy.optional_properties == OptionalProperties::RequiredOnly {
                continue;
            }
            if (property.read_only && self.policy.skip_read_only)
                || (property.write_only && self.policy.skip_write_only)
            {
                continue;
            }
            object.insert(name.clone(), self.sample_schema(property)?);
        }
        Ok(Value::Object(object))
    }
}
