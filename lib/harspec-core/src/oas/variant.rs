use jsonptr::PointerBuf;
use serde_json::Value;

use super::parameter::{LocationParam, ParameterObject};
use crate::error::SamplingError;
use crate::sampler::Sampler;

/// The OpenAPI flavor of a document.
///
/// Parameter values and schemas are not found at the same place in both
/// versions: this is the only place that knows where.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecVariant {
    /// Swagger 2.0
    OasV2,
    /// OpenAPI 3.x
    OasV3,
}

impl SpecVariant {
    /// The explicit value of a parameter, if any.
    ///
    /// - OAS v2: `default`, then `items.default`
    /// - OAS v3: `example`, then the first `examples` entry, then `schema.default`
    pub fn parameter_value<'p>(self, param: &'p ParameterObject) -> Option<&'p Value> {
        match self {
            Self::OasV2 => param
                .field("default")
                .or_else(|| param.field("items").and_then(|items| items.get("default"))),
            Self::OasV3 => param
                .field("example")
                .or_else(|| {
                    param
                        .field("examples")
                        .and_then(Value::as_object)
                        .and_then(|examples| examples.values().next())
                        .and_then(|example| example.get("value"))
                })
                .or_else(|| param.schema.as_ref().and_then(|schema| schema.get("default"))),
        }
    }

    /// The schema describing a parameter value.
    ///
    /// An OAS v2 parameter object carries its schema inline (only body
    /// parameters have a `schema`). An OAS v3 parameter has a `schema`, or a
    /// `content` map whose first entry holds it.
    pub fn parameter_schema<'p>(self, param: &'p ParameterObject) -> Option<&'p Value> {
        match self {
            Self::OasV2 => param.schema.as_ref().or(Some(&param.raw)),
            Self::OasV3 => param.schema.as_ref().or_else(|| {
                param
                    .field("content")
                    .and_then(Value::as_object)
                    .and_then(|content| content.values().next())
                    .and_then(|media| media.get("schema"))
            }),
        }
    }

    /// Where the value of a parameter lives in the document.
    pub fn value_json_pointer(self, param: &ParameterObject) -> PointerBuf {
        let mut pointer = param.pointer.clone();
        let field = match self {
            Self::OasV2 => "default",
            Self::OasV3 => "example",
        };
        pointer.push_back(field);
        pointer
    }
}

/// Chooses parameter values: explicit when declared, sampled otherwise.
#[derive(Debug, Clone, Copy)]
pub struct ParamSampler<'s> {
    sampler: &'s Sampler,
    variant: SpecVariant,
}

impl<'s> ParamSampler<'s> {
    /// Creates a parameter sampler for a document variant.
    pub fn new(sampler: &'s Sampler, variant: SpecVariant) -> Self {
        Self { sampler, variant }
    }

    /// The document variant.
    pub fn variant(&self) -> SpecVariant {
        self.variant
    }

    /// The underlying schema sampler.
    pub fn sampler(&self) -> &'s Sampler {
        self.sampler
    }

    /// Picks the value of `param`.
    ///
    /// # Errors
    ///
    /// Fails when the parameter has no explicit value and its schema cannot be sampled.
    pub fn sample_param<'p>(
        &self,
        param: &'p ParameterObject,
    ) -> Result<LocationParam<&'p ParameterObject>, SamplingError> {
        let value = match self.variant.parameter_value(param) {
            Some(value) => value.clone(),
            None => match self.variant.parameter_schema(param) {
                Some(schema) => self.sampler.sample(schema)?,
                None => Value::Null,
            },
        };

        Ok(LocationParam {
            param,
            value,
            value_json_pointer: self.variant.value_json_pointer(param),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn param(raw: &Value) -> ParameterObject {
        ParameterObject::from_value(raw, PointerBuf::from_tokens(["parameters", "0"]))
            .expect("a parameter")
    }

    #[test]
    fn should_read_v2_default_then_items_default() {
        let direct = param(&json!({ "name": "a", "in": "query", "type": "string", "default": "x" }));
        let items = param(&json!({
            "name": "b", "in": "query", "type": "array",
            "items": { "type": "string", "default": "y" }
        }));

        assert_eq!(SpecVariant::OasV2.parameter_value(&direct), Some(&json!("x")));
        assert_eq!(SpecVariant::OasV2.parameter_value(&items), Some(&json!("y")));
        assert_eq!(
            SpecVariant::OasV2.value_json_pointer(&direct).as_str(),
            "/parameters/0/default"
        );
    }

    #[test]
    fn should_read_v3_example_then_schema_default() {
        let example = param(&json!({
            "name": "a", "in": "query", "example": 3,
            "schema": { "type": "integer", "default": 1 }
        }));
        let examples = param(&json!({
            "name": "b", "in": "query",
            "examples": { "first": { "value": "one" }, "second": { "value": "two" } }
        }));
        let default = param(&json!({
            "name": "c", "in": "query", "schema": { "type": "integer", "default": 1 }
        }));

        assert_eq!(SpecVariant::OasV3.parameter_value(&example), Some(&json!(3)));
        assert_eq!(SpecVariant::OasV3.parameter_value(&examples), Some(&json!("one")));
        assert_eq!(SpecVariant::OasV3.parameter_value(&default), Some(&json!(1)));
        assert_eq!(
            SpecVariant::OasV3.value_json_pointer(&example).as_str(),
            "/parameters/0/example"
        );
    }

    #[test]
    fn should_find_v3_schema_in_content() {
        let param = param(&json!({
            "name": "filter", "in": "query",
            "content": { "application/json": { "schema": { "type": "object" } } }
        }));

        assert_eq!(
            SpecVariant::OasV3.parameter_schema(&param),
            Some(&json!({ "type": "object" }))
        );
    }

    #[test]
    fn should_sample_without_explicit_value() {
        let sampler = Sampler::default();
        let v2 = param(&json!({ "name": "limit", "in": "query", "type": "integer", "minimum": 5 }));
        let v3 = param(&json!({ "name": "limit", "in": "query", "schema": { "type": "integer", "maximum": 3 } }));

        let v2 = ParamSampler::new(&sampler, SpecVariant::OasV2)
            .sample_param(&v2)
            .expect("a value");
        let v3 = ParamSampler::new(&sampler, SpecVariant::OasV3)
            .sample_param(&v3)
            .expect("a value");

        assert_eq!(v2.value, json!(5));
        assert_eq!(v3.value, json!(3));
    }

    #[test]
    fn should_propagate_sampling_error() {
        let sampler = Sampler::default();
        let param = param(&json!({
            "name": "limit", "in": "query",
            "schema": { "type": "integer", "minimum": 42, "exclusiveMinimum": true, "maximum": 42 }
        }));

        let error = ParamSampler::new(&sampler, SpecVariant::OasV3)
            .sample_param(&param)
            .expect_err("unsatisfiable");

        insta::assert_snapshot!(error, @"Cannot sample numeric by boundaries: 42 < x <= 42");
    }
}
