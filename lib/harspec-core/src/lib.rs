//! # Harspec Core
//!
//! Turn API descriptions into ready-to-send HTTP requests.
//!
//! This crate reads OpenAPI v2/v3 documents and Postman collections and
//! produces [HAR](http://www.softwareishard.com/blog/har-12-spec/) requests
//! filled with example values:
//!
//! - **[`Sampler`]** - deterministic example values from JSON schemas
//! - **[`Converter`]** - one HAR request per operation, with per-operation failures
//! - **[`postman`]** - `{{variable}}` scopes and dynamic generators
//!
//! ## Quick Start
//!
//! ```rust
//! use harspec_core::{Converter, SecurityPlaceholders};
//! use serde_json::json;
//!
//! let document = json!({
//!     "swagger": "2.0",
//!     "host": "petstore.test",
//!     "basePath": "/v2",
//!     "schemes": ["https"],
//!     "securityDefinitions": { "basic": { "type": "basic" } },
//!     "security": [{ "basic": [] }],
//!     "paths": {
//!         "/pets": {
//!             "get": {
//!                 "parameters": [{
//!                     "name": "tags",
//!                     "in": "query",
//!                     "type": "array",
//!                     "items": { "type": "string" },
//!                     "collectionFormat": "multi",
//!                     "default": ["cat", "dog"]
//!                 }]
//!             }
//!         }
//!     }
//! });
//!
//! let converter = Converter::builder()
//!     .with_security_placeholders(SecurityPlaceholders::default().with_username("alice"))
//!     .build();
//! let report = converter.convert(&document)?;
//!
//! let request = &report.requests[0];
//! assert_eq!(request.url, "https://petstore.test/v2/pets?tags=cat&tags=dog");
//! assert!(request.header("authorization").is_some_and(|value| value.starts_with("Basic ")));
//! # Ok::<(), harspec_core::ConvertError>(())
//! ```
//!
//! ## Sampling
//!
//! ```rust
//! use harspec_core::{OptionalProperties, Sampler, SamplingPolicy};
//! use serde_json::json;
//!
//! let sampler = Sampler::new(
//!     SamplingPolicy::default().with_optional_properties(OptionalProperties::RequiredOnly),
//! );
//! let value = sampler.sample(&json!({
//!     "type": "object",
//!     "required": ["id"],
//!     "properties": {
//!         "id": { "type": "integer", "minimum": 1 },
//!         "nickname": { "type": "string" }
//!     }
//! }))?;
//!
//! assert_eq!(value, json!({ "id": 1 }));
//! # Ok::<(), harspec_core::SamplingError>(())
//! ```
//!
//! ## Errors
//!
//! Failures are typed: [`SamplingError`] when a schema admits no value,
//! [`VariableError`] for undefined or cyclic variables, both wrapped in
//! [`ConvertError`]. A [`Converter`] never stops at the first failing
//! operation: failures are collected in the [`ConversionReport`] and logged
//! with `tracing`.

mod error;
pub use self::error::{ConvertError, SamplingError, VariableError};

pub mod sampler;
pub use self::sampler::{OptionalProperties, Sampler, SamplingPolicy, SchemaNode, sample};

pub mod oas;
pub use self::oas::{Location, SpecVariant};

pub mod convert;
pub use self::convert::{ParamStyle, SecurityPlaceholders};

pub mod postman;
pub use self::postman::DynamicGenerators;

pub mod har;

mod document;
pub use self::document::DocumentKind;

mod converter;
pub use self::converter::{
    ConversionReport, Converter, ConverterBuilder, DEFAULT_BASE_URL, OperationFailure,
};
