use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::{Captures, Regex};
use serde_json::Value;
use tracing::warn;

use super::style::{CollectionFormat, ParamStyle};
use super::uri_template::{Operator, expand};
use super::{ConvertContext, SubConverter};
use crate::error::ConvertError;
use crate::oas::{Location, SpecVariant};

/// Regular expression for matching path parameters in the format `{param_name}`.
static RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(?<name>[^{}/]+)}").expect("a valid regex"));

/// Expands the path template of an operation with its path parameters.
///
/// ```text
/// /users/{id}          id = 5            -> /users/5
/// /users/{id}          style: label      -> /users/.5
/// /users/{id}          style: matrix     -> /users/;id=5
/// /files/{name}        name = "a b"      -> /files/a%20b
/// ```
///
/// Tokens without a matching parameter are left untouched.
#[derive(Debug, Clone, Copy)]
pub struct PathConverter<'c> {
    context: ConvertContext<'c>,
}

impl<'c> PathConverter<'c> {
    /// Creates a path converter.
    pub fn new(context: ConvertContext<'c>) -> Self {
        Self { context }
    }
}

impl SubConverter for PathConverter<'_> {
    type Output = String;

    fn convert(&self, path: &str, method: &str) -> Result<Self::Output, ConvertError> {
        let variant = self.context.document().variant();
        let params = self
            .context
            .location_params(path, method, Location::Path)?;

        let mut expansions = IndexMap::with_capacity(params.len());
        for located in params {
            let param = &located.param;
            let expanded = match variant {
                SpecVariant::OasV2 => {
                    let joined = CollectionFormat::of(param).join(&located.value);
                    expand(Operator::Simple, &param.name, &Value::String(joined), false)
                }
                SpecVariant::OasV3 => {
                    let operator = match ParamStyle::of(param, Location::Path) {
                        ParamStyle::Label => Operator::Label,
                        ParamStyle::Matrix => Operator::PathParameter,
                        _ => Operator::Simple,
                    };
                    let explode = param.explode.unwrap_or(false);
                    expand(operator, &param.name, &located.value, explode)
                }
            };
            expansions.insert(param.name.clone(), expanded);
        }

        let result = RE.replace_all(path, |captures: &Captures| {
            let token = captures.get(0).map_or("", |token| token.as_str());
            let name = captures.name("name").map_or("", |name| name.as_str());
            match expansions.get(name) {
                Some(expanded) => expanded.clone(),
                None => {
                    warn!(%path, %name, "path parameter not declared, keeping the token");
                    token.to_string()
                }
            }
        });
        Ok(result.into_owned())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::oas::OasDocument;
    use crate::sampler::Sampler;

    fn convert(root: &Value, variant: SpecVariant, path: &str) -> String {
        let sampler = Sampler::default();
        let context = ConvertContext::new(OasDocument::new(root, variant), &sampler);
        PathConverter::new(context)
            .convert(path, "get")
            .expect("a path")
    }

    #[test]
    fn should_expand_v3_styles() {
        let root = json!({
            "openapi": "3.0.0",
            "paths": {
                "/users/{id}/{label}/{matrix}/{ids}": {
                    "get": {
                        "parameters": [
                            { "name": "id", "in": "path", "required": true, "schema": { "type": "integer", "minimum": 5 } },
                            { "name": "label", "in": "path", "style": "label", "example": "a b" },
                            { "name": "matrix", "in": "path", "style": "matrix", "example": ["x", "y"], "explode": true },
                            { "name": "ids", "in": "path", "example": { "role": "admin", "name": "Alex" } }
                        ]
                    }
                }
            }
        });

        let path = convert(&root, SpecVariant::OasV3, "/users/{id}/{label}/{matrix}/{ids}");

        insta::assert_snapshot!(path, @"/users/5/.a%20b/;matrix=x;matrix=y/role,admin,name,Alex");
    }

    #[test]
    fn should_join_v2_collection() {
        let root = json!({
            "swagger": "2.0",
            "paths": {
                "/pets/{ids}": {
                    "get": {
                        "parameters": [{
                            "name": "ids", "in": "path", "required": true, "type": "array",
                            "collectionFormat": "pipes", "items": { "type": "integer" }
                        }]
                    }
                }
            }
        });

        let path = convert(&root, SpecVariant::OasV2, "/pets/{ids}");

        assert_eq!(path, "/pets/42");
    }

    #[test]
    fn should_keep_undeclared_tokens() {
        let root = json!({
            "openapi": "3.0.0",
            "paths": { "/pets/{petId}": { "get": {} } }
        });

        let path = convert(&root, SpecVariant::OasV3, "/pets/{petId}");

        assert_eq!(path, "/pets/{petId}");
    }

    #[test]
    fn should_replace_repeated_tokens() {
        let root = json!({
            "openapi": "3.0.0",
            "paths": {
                "/test/{id}/{id}": {
                    "get": { "parameters": [{ "name": "id", "in": "path", "example": 123 }] }
                }
            }
        });

        let path = convert(&root, SpecVariant::OasV3, "/test/{id}/{id}");

        assert_eq!(path, "/test/123/123");
    }
}
