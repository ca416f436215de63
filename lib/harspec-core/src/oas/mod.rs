//! Read-only view over a dereferenced OpenAPI document.
//!
//! The document is kept as a [`serde_json::Value`]: only the fields needed to
//! build requests are read, each lookup reporting the JSON pointer of the
//! node it reads.

use indexmap::IndexMap;
use jsonptr::PointerBuf;
use serde_json::{Map, Value};

use crate::error::ConvertError;

mod parameter;
pub use self::parameter::{Location, LocationParam, ParameterObject, filter_location_params};

mod variant;
pub use self::variant::{ParamSampler, SpecVariant};

/// HTTP methods of a path item, in conversion order.
pub const METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// An OpenAPI v2 or v3 document.
#[derive(Debug, Clone, Copy)]
pub struct OasDocument<'d> {
    root: &'d Value,
    variant: SpecVariant,
}

impl<'d> OasDocument<'d> {
    /// Wraps a dereferenced document.
    pub fn new(root: &'d Value, variant: SpecVariant) -> Self {
        Self { root, variant }
    }

    /// The document root.
    pub fn root(&self) -> &'d Value {
        self.root
    }

    /// The document flavor.
    pub fn variant(&self) -> SpecVariant {
        self.variant
    }

    fn paths(&self) -> Option<&'d Map<String, Value>> {
        self.root.get("paths").and_then(Value::as_object)
    }

    /// Every `(path, method)` pair, paths in document order.
    pub fn operations(&self) -> Vec<(String, String)> {
        let Some(paths) = self.paths() else {
            return Vec::new();
        };
        paths
            .iter()
            .flat_map(|(path, item)| {
                METHODS
                    .iter()
                    .filter(|method| item.get(**method).is_some_and(Value::is_object))
                    .map(|method| (path.clone(), (*method).to_string()))
            })
            .collect()
    }

    /// The path item of `path`.
    pub fn path_item(&self, path: &str) -> Option<&'d Value> {
        self.paths().and_then(|paths| paths.get(path))
    }

    /// The operation object of `(path, method)`.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::MissingOperation`] when there is no such operation.
    pub fn operation(&self, path: &str, method: &str) -> Result<&'d Value, ConvertError> {
        self.path_item(path)
            .and_then(|item| item.get(method.to_lowercase()))
            .filter(|operation| operation.is_object())
            .ok_or_else(|| ConvertError::MissingOperation {
                path: path.to_string(),
                method: method.to_string(),
            })
    }

    /// JSON pointer of an operation object.
    pub fn operation_pointer(path: &str, method: &str) -> PointerBuf {
        PointerBuf::from_tokens(["paths", path, &method.to_lowercase()])
    }

    /// Parameters of an operation: path-level ones first, overridden by
    /// operation-level ones with the same `name` and `in`.
    ///
    /// # Errors
    ///
    /// Fails when a parameter object has no `name` or `in`.
    pub fn parameters(&self, path: &str, method: &str) -> Result<Vec<ParameterObject>, ConvertError> {
        let operation = self.operation(path, method)?;
        let path_pointer = PointerBuf::from_tokens(["paths", path]);
        let operation_pointer = Self::operation_pointer(path, method);

        let mut params: IndexMap<(String, String), ParameterObject> = IndexMap::new();
        let levels = [
            (self.path_item(path), path_pointer),
            (Some(operation), operation_pointer),
        ];
        for (node, pointer) in levels {
            let Some(list) = node
                .and_then(|node| node.get("parameters"))
                .and_then(Value::as_array)
            else {
                continue;
            };
            for (index, raw) in list.iter().enumerate() {
                let mut param_pointer = pointer.clone();
                param_pointer.push_back("parameters");
                param_pointer.push_back(index.to_string());
                let param = ParameterObject::from_value(raw, param_pointer)?;
                params.insert((param.name.clone(), param.declared_in.clone()), param);
            }
        }

        Ok(params.into_values().collect())
    }

    /// Reads a list of media types of an operation, falling back to the document.
    fn media_types(&self, operation: &Value, field: &str) -> Vec<String> {
        operation
            .get(field)
            .or_else(|| self.root.get(field))
            .and_then(Value::as_array)
            .map(|types| {
                types
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// OAS v2 `consumes` of an operation, or of the document.
    pub fn consumes(&self, operation: &Value) -> Vec<String> {
        self.media_types(operation, "consumes")
    }

    /// OAS v2 `produces` of an operation, or of the document.
    pub fn produces(&self, operation: &Value) -> Vec<String> {
        self.media_types(operation, "produces")
    }

    /// Security scheme definitions: `securityDefinitions` (v2) or
    /// `components.securitySchemes` (v3).
    pub fn security_schemes(&self) -> Option<&'d Map<String, Value>> {
        match self.variant {
            SpecVariant::OasV2 => self.root.get("securityDefinitions"),
            SpecVariant::OasV3 => self
                .root
                .get("components")
                .and_then(|components| components.get("securitySchemes")),
        }
        .and_then(Value::as_object)
    }

    /// The security requirements applying to an operation.
    pub fn security_requirements(&self, operation: &'d Value) -> Option<&'d Vec<Value>> {
        operation
            .get("security")
            .or_else(|| self.root.get("security"))
            .and_then(Value::as_array)
    }

    /// The response of the lowest numeric status code of an operation.
    pub fn first_response(&self, operation: &'d Value) -> Option<&'d Value> {
        operation
            .get("responses")
            .and_then(Value::as_object)?
            .iter()
            .filter_map(|(code, response)| code.parse::<u16>().ok().map(|code| (code, response)))
            .min_by_key(|(code, _)| *code)
            .map(|(_, response)| response)
    }
}
