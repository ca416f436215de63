use std::fmt::Debug;

/// Errors raised when a schema admits no value.
///
/// Messages are user-facing diagnostics: their wording is stable.
#[derive(Debug, Clone, PartialEq, derive_more::Error, derive_more::Display)]
pub enum SamplingError {
    /// Numeric bounds (possibly combined with `multipleOf`) admit no value.
    #[display("Cannot sample numeric by boundaries: {predicate}")]
    NumericBoundaries {
        /// The conflicting predicate, e.g. `5 < x <= 13, multipleOf: 15`.
        predicate: String,
    },

    /// `minLength` is greater than `maxLength`.
    #[display("Cannot sample string by length: {min_length} <= length <= {max_length}")]
    StringLength {
        /// The declared `minLength`.
        min_length: u64,
        /// The declared `maxLength`.
        max_length: u64,
    },

    /// `minItems` is greater than `maxItems`.
    #[display("Cannot sample array by length: {min_items} <= length <= {max_items}")]
    ArrayLength {
        /// The declared `minItems`.
        min_items: u64,
        /// The declared `maxItems`.
        max_items: u64,
    },

    /// The schema node does not have a schema shape.
    #[display("Invalid schema at '{path}': {message}")]
    InvalidSchema {
        /// Path of the offending keyword inside the schema.
        path: String,
        /// Deserialization error message.
        message: String,
    },
}

/// Errors raised while substituting `{{variable}}` templates.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Error, derive_more::Display)]
pub enum VariableError {
    /// No scope of the chain binds the variable.
    #[display("Undefined variable: `{name}`")]
    UndefinedVariable {
        /// The missing token, without braces.
        name: String,
    },

    /// A variable refers to itself, directly or through other variables.
    #[display("Cyclic variable reference: {}", format_chain(chain))]
    CyclicVariable {
        /// The resolution chain, ending with the revisited token.
        chain: Vec<String>,
    },
}

fn format_chain(chain: &[String]) -> String {
    chain
        .iter()
        .map(|name| format!("`{name}`"))
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Errors that can occur when converting a document into HAR requests.
///
/// Sampling and variable errors are scoped to a single operation: the
/// [`Converter`](crate::Converter) reports them per operation and keeps going.
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum ConvertError {
    /// A schema could not be sampled.
    Sampling(SamplingError),

    /// A template variable could not be resolved.
    Variable(VariableError),

    /// JSON serialization error while encoding a body.
    JsonValueError(serde_json::Error),

    /// The server URL of the document cannot be resolved.
    #[display("Invalid base URL '{url}': {source}")]
    #[from(skip)]
    InvalidBaseUrl {
        /// The URL as resolved from the document.
        url: String,
        /// The parsing error.
        source: url::ParseError,
    },

    /// The document is neither an OpenAPI v2/v3 document nor a Postman collection.
    #[display("Unsupported document: expected an OpenAPI v2/v3 document or a Postman collection")]
    UnsupportedDocument,

    /// A node of the document does not have the expected shape.
    #[display("Invalid document at '{pointer}': {message}")]
    #[from(skip)]
    InvalidDocument {
        /// JSON pointer of the offending node.
        pointer: String,
        /// What was expected.
        message: String,
    },

    /// The requested operation does not exist.
    #[display("Missing operation: {method} {path}")]
    #[from(skip)]
    MissingOperation {
        /// The path template.
        path: String,
        /// The HTTP method.
        method: String,
    },

    /// A body value cannot be encoded for its media type.
    #[display("Cannot encode body as '{mime_type}': {message}")]
    #[from(skip)]
    BodyEncoding {
        /// The target media type.
        mime_type: String,
        /// Description of the encoding failure.
        message: String,
    },
}
