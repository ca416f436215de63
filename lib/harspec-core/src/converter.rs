use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::convert::uri_template::append_query;
use crate::convert::{
    BodyConverter, ConvertContext, CookiesConverter, HeadersConverter, PathConverter,
    QueryStringConverter, SecurityConverter, SecurityPlaceholders, SubConverter, post_data,
};
use crate::document::DocumentKind;
use crate::error::ConvertError;
use crate::har;
use crate::oas::OasDocument;
use crate::postman::{DynamicGenerators, PostmanConverter, Variable};
use crate::sampler::{Sampler, SamplingPolicy};

/// Base URL used when the document does not declare an absolute one.
pub const DEFAULT_BASE_URL: &str = "https://example.com";

static DEFAULT_URL: LazyLock<Url> =
    LazyLock::new(|| Url::parse(DEFAULT_BASE_URL).expect("a valid URL"));

/// `{name}` server variables.
static SERVER_VARIABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(?<name>[^{}]+)}").expect("a valid regex"));

/// An operation, or Postman request, that could not be converted.
#[derive(Debug)]
pub struct OperationFailure {
    /// The path template, or the Postman item path (`folder/request`).
    pub path: String,
    /// Upper-case HTTP method.
    pub method: String,
    /// Why the conversion failed.
    pub error: ConvertError,
}

/// Outcome of a document conversion.
#[derive(Debug, Default)]
pub struct ConversionReport {
    /// Converted requests, in document order.
    pub requests: Vec<har::Request>,
    /// Operations skipped because of an error.
    pub failures: Vec<OperationFailure>,
}

impl ConversionReport {
    /// Whether every operation was converted.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Converts OpenAPI documents and Postman collections into HAR requests.
///
/// # Example
///
/// ```rust
/// use harspec_core::Converter;
/// use serde_json::json;
///
/// let document = json!({
///     "openapi": "3.0.3",
///     "servers": [{ "url": "https://petstore.test/v1" }],
///     "paths": {
///         "/pets/{petId}": {
///             "get": {
///                 "parameters": [{
///                     "name": "petId",
///                     "in": "path",
///                     "required": true,
///                     "schema": { "type": "integer", "minimum": 1 }
///                 }]
///             }
///         }
///     }
/// });
///
/// let report = Converter::default().convert(&document)?;
/// assert!(report.is_complete());
/// assert_eq!(report.requests[0].url, "https://petstore.test/v1/pets/1");
/// # Ok::<(), harspec_core::ConvertError>(())
/// ```
#[derive(Debug)]
pub struct Converter {
    sampler: Sampler,
    generators: DynamicGenerators,
    placeholders: SecurityPlaceholders,
    environment: Vec<Variable>,
    globals: Vec<Variable>,
    base_url: Url,
}

impl Default for Converter {
    fn default() -> Self {
        ConverterBuilder::default().build()
    }
}

impl Converter {
    /// Creates a [`ConverterBuilder`].
    pub fn builder() -> ConverterBuilder {
        ConverterBuilder::default()
    }

    /// Converts every operation of `document`.
    ///
    /// Operations that fail are reported in [`ConversionReport::failures`].
    ///
    /// # Errors
    ///
    /// Fails when the document is not supported.
    pub fn convert(&self, document: &Value) -> Result<ConversionReport, ConvertError> {
        let kind = DocumentKind::detect(document)?;
        debug!(%kind, "converting document");

        let Some(variant) = kind.spec_variant() else {
            return PostmanConverter::new(&self.generators)
                .with_globals(&self.globals)
                .with_environment(&self.environment)
                .convert(document);
        };

        let document = OasDocument::new(document, variant);
        let base_url = self.base_url(document);
        let mut report = ConversionReport::default();
        for (path, method) in document.operations() {
            match self.request(document, &base_url, &path, &method) {
                Ok(request) => report.requests.push(request),
                Err(error) => {
                    let method = method.to_uppercase();
                    warn!(%path, %method, %error, "skipping operation");
                    report.failures.push(OperationFailure {
                        path,
                        method,
                        error,
                    });
                }
            }
        }
        Ok(report)
    }

    /// Converts a single OpenAPI operation.
    ///
    /// # Errors
    ///
    /// Fails when the document is not an OpenAPI document, when the
    /// operation is missing, or when it cannot be converted.
    pub fn convert_operation(
        &self,
        document: &Value,
        path: &str,
        method: &str,
    ) -> Result<har::Request, ConvertError> {
        let variant = DocumentKind::detect(document)?
            .spec_variant()
            .ok_or(ConvertError::UnsupportedDocument)?;
        let document = OasDocument::new(document, variant);
        let base_url = self.base_url(document);
        self.request(document, &base_url, path, &method.to_lowercase())
    }

    fn request(
        &self,
        document: OasDocument<'_>,
        base_url: &str,
        path: &str,
        method: &str,
    ) -> Result<har::Request, ConvertError> {
        let context = ConvertContext::new(document, &self.sampler);
        let expanded_path = PathConverter::new(context).convert(path, method)?;
        let mut query_string = QueryStringConverter::new(context).convert(path, method)?;
        let mut headers = HeadersConverter::new(context).convert(path, method)?;
        let mut cookies = CookiesConverter::new(context).convert(path, method)?;
        let security = SecurityConverter::new(context, &self.placeholders).convert(path, method)?;
        let bodies = BodyConverter::new(context).convert(path, method)?;

        headers.extend(security.headers);
        query_string.extend(security.query_string);
        cookies.extend(security.cookies);

        let post_data = bodies.first().map(post_data).transpose()?;
        if let Some(post_data) = &post_data
            && let Some(content_type) = headers
                .iter_mut()
                .find(|header| header.name.eq_ignore_ascii_case("content-type"))
        {
            content_type.value.clone_from(&post_data.mime_type);
        }

        let url = append_query(
            &format!("{base_url}{expanded_path}"),
            query_string
                .iter()
                .map(|pair| (pair.name.as_str(), pair.value.as_str())),
        );
        let mut request = har::Request::new(method, url);
        request.query_string = query_string;
        request.headers = headers;
        request.cookies = cookies;
        request.post_data = post_data;
        Ok(request)
    }

    /// The server URL, without trailing slash.
    ///
    /// A declared server URL that cannot be parsed falls back to the configured base URL.
    fn base_url(&self, document: OasDocument<'_>) -> String {
        let fallback = || self.base_url.as_str().trim_end_matches('/').to_string();
        let Some(declared) = self.declared_base_url(document) else {
            return fallback();
        };
        let resolved = match Url::parse(&declared) {
            Err(url::ParseError::RelativeUrlWithoutBase) => self.base_url.join(&declared),
            resolved => resolved,
        };
        match resolved {
            Ok(url) => url.as_str().trim_end_matches('/').to_string(),
            Err(error) => {
                warn!(url = %declared, %error, "invalid server URL, using the fallback base URL");
                fallback()
            }
        }
    }

    fn declared_base_url(&self, document: OasDocument<'_>) -> Option<String> {
        let root = document.root();
        if let Some(server) = root.pointer("/servers/0") {
            server.get("url").and_then(Value::as_str).map(|url| {
                SERVER_VARIABLE
                    .replace_all(url, |captures: &Captures| {
                        let name = captures.name("name").map_or("", |name| name.as_str());
                        server
                            .pointer(&format!("/variables/{name}/default"))
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string()
                    })
                    .into_owned()
            })
        } else if let Some(host) = root.get("host").and_then(Value::as_str) {
            let scheme = root
                .pointer("/schemes/0")
                .and_then(Value::as_str)
                .unwrap_or(self.base_url.scheme());
            let base_path = root.get("basePath").and_then(Value::as_str).unwrap_or_default();
            Some(format!("{scheme}://{host}{base_path}"))
        } else {
            root.get("basePath").and_then(Value::as_str).map(str::to_string)
        }
    }
}

/// Builder of a [`Converter`].
#[derive(Debug)]
pub struct ConverterBuilder {
    policy: SamplingPolicy,
    generators: DynamicGenerators,
    placeholders: SecurityPlaceholders,
    environment: Vec<Variable>,
    globals: Vec<Variable>,
    base_url: Url,
}

impl Default for ConverterBuilder {
    fn default() -> Self {
        Self {
            policy: SamplingPolicy::default(),
            generators: DynamicGenerators::default(),
            placeholders: SecurityPlaceholders::default(),
            environment: Vec::new(),
            globals: Vec::new(),
            base_url: DEFAULT_URL.clone(),
        }
    }
}

impl ConverterBuilder {
    /// Sets the sampling policy.
    #[must_use]
    pub fn with_policy(mut self, policy: SamplingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the dynamic variable generators of Postman collections.
    #[must_use]
    pub fn with_generators(mut self, generators: DynamicGenerators) -> Self {
        self.generators = generators;
        self
    }

    /// Sets the credentials written for security schemes.
    #[must_use]
    pub fn with_security_placeholders(mut self, placeholders: SecurityPlaceholders) -> Self {
        self.placeholders = placeholders;
        self
    }

    /// Sets the Postman environment variables.
    #[must_use]
    pub fn with_environment(mut self, environment: Vec<Variable>) -> Self {
        self.environment = environment;
        self
    }

    /// Sets the Postman global variables.
    #[must_use]
    pub fn with_globals(mut self, globals: Vec<Variable>) -> Self {
        self.globals = globals;
        self
    }

    /// Sets the base URL used when documents declare no absolute server.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::InvalidBaseUrl`] when `base_url` is not an absolute URL.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ConvertError> {
        self.base_url = Url::parse(base_url).map_err(|source| ConvertError::InvalidBaseUrl {
            url: base_url.to_string(),
            source,
        })?;
        Ok(self)
    }

    /// Builds the converter.
    pub fn build(self) -> Converter {
        let Self {
            policy,
            generators,
            placeholders,
            environment,
            globals,
            base_url,
        } = self;
        Converter {
            sampler: Sampler::new(policy),
            generators,
            placeholders,
            environment,
            globals,
            base_url,
        }
    }
}
