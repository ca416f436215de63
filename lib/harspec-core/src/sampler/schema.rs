use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::SamplingError;

/// The `type` keyword: a single type name or a list of them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SchemaType {
    /// `"type": "string"`
    Single(String),
    /// `"type": ["string", "null"]`
    Multiple(Vec<String>),
}

/// `exclusiveMinimum`/`exclusiveMaximum`: a flag (OAS 2, OAS 3.0) or a bound (OAS 3.1).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ExclusiveBound {
    /// Makes `minimum`/`maximum` exclusive.
    Flag(bool),
    /// An exclusive bound of its own.
    Bound(f64),
}

/// The `items` keyword: one schema for every item, or a tuple of schemas.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Items {
    /// Positional schemas.
    Tuple(Vec<SchemaNode>),
    /// A schema shared by every item.
    Single(Box<SchemaNode>),
}

impl Items {
    /// The schema of the first item.
    pub fn first(&self) -> Option<&SchemaNode> {
        match self {
            Self::Tuple(schemas) => schemas.first(),
            Self::Single(schema) => Some(schema),
        }
    }
}

/// The `additionalProperties` keyword.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    /// `true` or `false`.
    Allowed(bool),
    /// A schema for extra properties.
    Schema(Box<SchemaNode>),
}

/// A resolved (`$ref` free) JSON-Schema-like node, as read by the sampler.
///
/// Unknown keywords are ignored, so an OAS v2 parameter object (which carries
/// `type`, `items`, `default`... inline) reads as a schema too.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct SchemaNode {
    #[serde(rename = "type")]
    pub schema_type: Option<SchemaType>,
    pub format: Option<String>,

    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: Option<ExclusiveBound>,
    pub exclusive_maximum: Option<ExclusiveBound>,
    pub multiple_of: Option<f64>,

    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<String>,

    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub items: Option<Items>,

    #[serde(default)]
    pub properties: IndexMap<String, SchemaNode>,
    #[serde(default, deserialize_with = "required_names")]
    pub required: Vec<String>,
    pub additional_properties: Option<AdditionalProperties>,

    #[serde(rename = "enum")]
    pub enum_values: Option<Vec<Value>>,
    #[serde(rename = "const")]
    pub const_value: Option<Value>,
    pub default: Option<Value>,
    pub example: Option<Value>,
    pub examples: Option<Value>,

    #[serde(default)]
    pub all_of: Vec<SchemaNode>,
    #[serde(default)]
    pub one_of: Vec<SchemaNode>,
    #[serde(default)]
    pub any_of: Vec<SchemaNode>,

    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub write_only: bool,
    #[serde(default)]
    pub nullable: bool,
}

/// `required` is a list of names in a schema, but a boolean in a parameter object.
fn required_names<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Required {
        Names(Vec<String>),
        Flag(bool),
    }

    Ok(match Required::deserialize(deserializer)? {
        Required::Names(names) => names,
        Required::Flag(_) => Vec::new(),
    })
}

/// The sampling kind a schema node resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Kind {
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
}

impl Kind {
    fn parse(name: &str) -> Option<Self> {
        let kind = match name {
            "null" => Self::Null,
            "boolean" => Self::Boolean,
            "integer" => Self::Integer,
            "number" => Self::Number,
            "string" | "file" => Self::String,
            "array" => Self::Array,
            "object" => Self::Object,
            _ => return None,
        };
        Some(kind)
    }
}

macro_rules! absorb_options {
    ($target:ident, $other:ident, $($field:ident),+ $(,)?) => {
        $(
            if $target.$field.is_none() {
                $target.$field = $other.$field;
            }
        )+
    };
}

impl SchemaNode {
    /// Reads a schema node from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`SamplingError::InvalidSchema`] with the path of the offending
    /// keyword when the value does not have a schema shape.
    pub fn from_value(value: &Value) -> Result<Self, SamplingError> {
        serde_path_to_error::deserialize(value).map_err(|error| SamplingError::InvalidSchema {
            path: error.path().to_string(),
            message: error.inner().to_string(),
        })
    }

    /// An explicit value carried by the node, by priority:
    /// `const`, `example`, `default`, first of `examples`, first of `enum`.
    pub fn explicit_value(&self) -> Option<&Value> {
        self.const_value
            .as_ref()
            .or(self.example.as_ref())
            .or(self.default.as_ref())
            .or_else(|| match &self.examples {
                Some(Value::Array(values)) => values.first(),
                _ => None,
            })
            .or_else(|| self.enum_values.as_ref().and_then(|values| values.first()))
    }

    pub(super) fn kind(&self) -> Option<Kind> {
        match &self.schema_type {
            Some(SchemaType::Single(name)) => Kind::parse(name),
            Some(SchemaType::Multiple(names)) => names
                .iter()
                .filter(|name| *name != "null")
                .find_map(|name| Kind::parse(name))
                .or_else(|| names.iter().find_map(|name| Kind::parse(name))),
            None => self.inferred_kind(),
        }
    }

    fn inferred_kind(&self) -> Option<Kind> {
        if !self.properties.is_empty() || self.additional_properties.is_some() {
            Some(Kind::Object)
        } else if self.items.is_some() || self.min_items.is_some() || self.max_items.is_some() {
            Some(Kind::Array)
        } else if self.minimum.is_some()
            || self.maximum.is_some()
            || self.exclusive_minimum.is_some()
            || self.exclusive_maximum.is_some()
            || self.multiple_of.is_some()
        {
            Some(Kind::Number)
        } else if self.pattern.is_some()
            || self.format.is_some()
            || self.min_length.is_some()
            || self.max_length.is_some()
        {
            Some(Kind::String)
        } else {
            None
        }
    }

    /// Merges the `allOf` members into a single node.
    ///
    /// Scalar keywords keep their first value, `properties` and `required`
    /// are united.
    pub(super) fn merged(&self) -> Self {
        let mut result = self.clone();
        let members = std::mem::take(&mut result.all_of);
        for member in members {
            let member = if member.all_of.is_empty() {
                member
            } else {
                member.merged()
            };
            result.absorb(member);
        }
        result
    }

    /// Combines the node with one `oneOf`/`anyOf` alternative.
    pub(super) fn with_alternative(&self, alternative: &Self) -> Self {
        let mut result = self.clone();
        result.one_of.clear();
        result.any_of.clear();
        result.absorb(alternative.clone());
        result
    }

    fn absorb(&mut self, other: Self) {
        absorb_options!(
            self,
            other,
            schema_type,
            format,
            minimum,
            maximum,
            exclusive_minimum,
            exclusive_maximum,
            multiple_of,
            min_length,
            max_length,
            pattern,
            min_items,
            max_items,
            items,
            additional_properties,
            enum_values,
            const_value,
            default,
            example,
            examples,
        );

        for (name, property) in other.properties {
            self.properties.entry(name).or_insert(property);
        }
        for name in other.required {
            if !self.required.contains(&name) {
                self.required.push(name);
            }
        }
        self.all_of.extend(other.all_of);
        self.one_of.extend(other.one_of);
        self.any_of.extend(other.any_of);
        self.read_only |= other.read_only;
        self.write_only |= other.write_only;
        self.nullable |= other.nullable;
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn should_read_parameter_object_as_schema() {
        let node = SchemaNode::from_value(&json!({
            "name": "limit",
            "in": "query",
            "required": true,
            "type": "integer",
            "minimum": 1
        }))
        .expect("a schema");

        assert_eq!(node.kind(), Some(Kind::Integer));
        assert_eq!(node.minimum, Some(1.0));
        assert!(node.required.is_empty());
    }

    #[test]
    fn should_report_invalid_keyword_path() {
        let error = SchemaNode::from_value(&json!({
            "properties": { "age": { "minimum": "ten" } }
        }))
        .expect_err("an invalid schema");

        let SamplingError::InvalidSchema { path, .. } = error else {
            panic!("unexpected error {error:?}");
        };
        assert_eq!(path, "properties.age.minimum");
    }

    #[test]
    fn should_read_both_exclusive_bound_flavors() {
        let flag = SchemaNode::from_value(&json!({ "exclusiveMinimum": true })).expect("a schema");
        let bound = SchemaNode::from_value(&json!({ "exclusiveMinimum": 5 })).expect("a schema");

        assert_eq!(flag.exclusive_minimum, Some(ExclusiveBound::Flag(true)));
        assert_eq!(bound.exclusive_minimum, Some(ExclusiveBound::Bound(5.0)));
    }

    #[test]
    fn should_prefer_non_null_type() {
        let node = SchemaNode::from_value(&json!({ "type": ["null", "string"] })).expect("a schema");

        assert_eq!(node.kind(), Some(Kind::String));
    }

    #[test]
    fn should_infer_kind() {
        let object = SchemaNode::from_value(&json!({ "properties": {} , "additionalProperties": false }))
            .expect("a schema");
        let array = SchemaNode::from_value(&json!({ "items": { "type": "string" } })).expect("a schema");
        let unknown = SchemaNode::from_value(&json!({ "description": "anything" })).expect("a schema");

        assert_eq!(object.kind(), Some(Kind::Object));
        assert_eq!(array.kind(), Some(Kind::Array));
        assert_eq!(unknown.kind(), None);
    }

    #[test]
    fn should_merge_all_of() {
        let node = SchemaNode::from_value(&json!({
            "allOf": [
                { "type": "object", "properties": { "id": { "type": "integer" } }, "required": ["id"] },
                { "properties": { "name": { "type": "string" } }, "required": ["name"] }
            ]
        }))
        .expect("a schema");

        let merged = node.merged();

        assert_eq!(merged.kind(), Some(Kind::Object));
        assert_eq!(
            merged.properties.keys().collect::<Vec<_>>(),
            vec!["id", "name"]
        );
        assert_eq!(merged.required, vec!["id", "name"]);
        assert!(merged.all_of.is_empty());
    }

    #[test]
    fn should_pick_explicit_value_by_priority() {
        let node = SchemaNode::from_value(&json!({
            "enum": ["a", "b"],
            "default": "c",
            "example": "d"
        }))
        .expect("a schema");

        assert_eq!(node.explicit_value(), Some(&json!("d")));
    }
}
