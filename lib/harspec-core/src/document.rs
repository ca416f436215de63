use serde_json::Value;

use crate::error::ConvertError;
use crate::oas::SpecVariant;

const POSTMAN_SCHEMA_HOSTS: [&str; 2] = ["schema.getpostman.com", "schema.postman.com"];

/// The kind of an input document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum DocumentKind {
    /// Swagger 2.0 (`swagger: "2.0"`).
    #[display("OpenAPI v2")]
    OasV2,
    /// OpenAPI 3.x (`openapi: "3.x.y"`).
    #[display("OpenAPI v3")]
    OasV3,
    /// Postman collection v2.x.
    #[display("Postman collection")]
    Postman,
}

impl DocumentKind {
    /// Detects the kind of `document`.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::UnsupportedDocument`] for anything else.
    ///
    /// # Example
    ///
    /// ```rust
    /// use harspec_core::DocumentKind;
    /// use serde_json::json;
    ///
    /// let kind = DocumentKind::detect(&json!({ "openapi": "3.0.3", "paths": {} }));
    /// assert_eq!(kind.ok(), Some(DocumentKind::OasV3));
    ///
    /// assert!(DocumentKind::detect(&json!({ "openapi": "4.0" })).is_err());
    /// ```
    pub fn detect(document: &Value) -> Result<Self, ConvertError> {
        let version = |key: &str| document.get(key).and_then(Value::as_str);

        if version("swagger").is_some_and(|version| version.starts_with("2.")) {
            return Ok(Self::OasV2);
        }
        if version("openapi").is_some_and(|version| version.starts_with("3.")) {
            return Ok(Self::OasV3);
        }

        let postman_schema = document
            .pointer("/info/schema")
            .and_then(Value::as_str)
            .is_some_and(|schema| POSTMAN_SCHEMA_HOSTS.iter().any(|host| schema.contains(host)));
        let has_items = document.get("item").is_some_and(Value::is_array);
        let is_oas = document.get("swagger").is_some() || document.get("openapi").is_some();
        if postman_schema || (has_items && !is_oas) {
            return Ok(Self::Postman);
        }

        Err(ConvertError::UnsupportedDocument)
    }

    /// The OpenAPI flavor, `None` for Postman collections.
    pub fn spec_variant(self) -> Option<SpecVariant> {
        match self {
            Self::OasV2 => Some(SpecVariant::OasV2),
            Self::OasV3 => Some(SpecVariant::OasV3),
            Self::Postman => None,
        }
    }
}
