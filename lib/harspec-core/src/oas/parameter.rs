use jsonptr::PointerBuf;
use serde::Deserialize;
use serde_json::Value;

use crate::error::ConvertError;

/// Where a parameter is sent.
///
/// `formData` (OAS v2) is part of the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    /// `in: query`
    Query,
    /// `in: header`
    Header,
    /// `in: path`
    Path,
    /// `in: cookie`
    Cookie,
    /// `in: body` or `in: formData`
    Body,
}

impl Location {
    /// Reads the `in` field of a parameter object.
    ///
    /// Unknown locations yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        let location = match name {
            "query" => Self::Query,
            "header" => Self::Header,
            "path" => Self::Path,
            "cookie" => Self::Cookie,
            "body" | "formData" => Self::Body,
            _ => return None,
        };
        Some(location)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawParameter {
    name: String,
    #[serde(rename = "in")]
    declared_in: String,
    #[serde(default)]
    required: bool,
    schema: Option<Value>,
    explode: Option<bool>,
    style: Option<String>,
    collection_format: Option<String>,
}

/// A parameter object of an operation, with its position in the document.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterObject {
    /// The parameter name.
    pub name: String,
    /// The `in` field as declared, e.g. `formData`.
    pub declared_in: String,
    /// The normalized location, `None` for unknown locations.
    pub location: Option<Location>,
    /// The `required` flag.
    pub required: bool,
    /// The `schema` field (OAS v3, or OAS v2 body parameters).
    pub schema: Option<Value>,
    /// The `explode` field (OAS v3).
    pub explode: Option<bool>,
    /// The `style` field (OAS v3).
    pub style: Option<String>,
    /// The `collectionFormat` field (OAS v2).
    pub collection_format: Option<String>,
    /// JSON pointer of the parameter object in the document.
    pub pointer: PointerBuf,
    /// The parameter object itself.
    pub raw: Value,
}

impl ParameterObject {
    /// Reads a parameter object found at `pointer`.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::InvalidDocument`] when `name` or `in` is missing.
    pub fn from_value(raw: &Value, pointer: PointerBuf) -> Result<Self, ConvertError> {
        let parsed: RawParameter =
            serde_path_to_error::deserialize(raw).map_err(|error| {
                ConvertError::InvalidDocument {
                    pointer: pointer.to_string(),
                    message: format!("{} at '{}'", error.inner(), error.path()),
                }
            })?;

        Ok(Self {
            location: Location::parse(&parsed.declared_in),
            name: parsed.name,
            declared_in: parsed.declared_in,
            required: parsed.required,
            schema: parsed.schema,
            explode: parsed.explode,
            style: parsed.style,
            collection_format: parsed.collection_format,
            pointer,
            raw: raw.clone(),
        })
    }

    /// Whether the parameter is an OAS v2 `formData` field.
    pub fn is_form_data(&self) -> bool {
        self.declared_in == "formData"
    }

    /// Reads a field of the raw parameter object.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.raw.get(name)
    }
}

/// A parameter with the value chosen for it.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationParam<T> {
    /// The parameter.
    pub param: T,
    /// The explicit or sampled value.
    pub value: Value,
    /// Where the value lives, or would live, in the document.
    pub value_json_pointer: PointerBuf,
}

/// Keeps the parameters sent at `location`, in declaration order.
pub fn filter_location_params(
    params: &[ParameterObject],
    location: Location,
) -> Vec<&ParameterObject> {
    params
        .iter()
        .filter(|param| param.location == Some(location))
        .collect()
}
