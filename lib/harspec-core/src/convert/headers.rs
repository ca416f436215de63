use percent_encoding::percent_decode_str;
use serde_json::Value;
use tracing::debug;

use super::style::CollectionFormat;
use super::uri_template::{Operator, expand};
use super::{ConvertContext, SubConverter};
use crate::error::ConvertError;
use crate::har::Header;
use crate::oas::{Location, SpecVariant, filter_location_params};

/// Media type of url-encoded forms.
pub(crate) const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
/// Media type of multipart forms.
pub(crate) const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// Header parameters managed by the converter itself in OpenAPI 3.
const RESERVED_HEADERS: [&str; 3] = ["accept", "content-type", "authorization"];

/// Converts an operation into its headers: `content-type`, `accept`, then the
/// header parameters.
///
/// Security headers are produced by the [`SecurityConverter`](super::SecurityConverter).
#[derive(Debug, Clone, Copy)]
pub struct HeadersConverter<'c> {
    context: ConvertContext<'c>,
}

impl<'c> HeadersConverter<'c> {
    /// Creates a headers converter.
    pub fn new(context: ConvertContext<'c>) -> Self {
        Self { context }
    }

    fn content_type(&self, path: &str, method: &str) -> Result<Option<String>, ConvertError> {
        let document = self.context.document();
        let operation = document.operation(path, method)?;

        // One content-type only, matching the single body built from the first media type.
        let content_type = match document.variant() {
            SpecVariant::OasV3 => operation
                .get("requestBody")
                .and_then(|body| body.get("content"))
                .and_then(Value::as_object)
                .and_then(|content| content.keys().next().cloned()),
            SpecVariant::OasV2 => {
                let params = document.parameters(path, method)?;
                let body = filter_location_params(&params, Location::Body);
                let consumes = document.consumes(operation);
                let fallback = match body.first() {
                    None => return Ok(None),
                    Some(param) if param.is_form_data() => FORM_URLENCODED.to_string(),
                    Some(_) => mime::APPLICATION_JSON.to_string(),
                };
                Some(consumes.into_iter().next().unwrap_or(fallback))
            }
        };
        Ok(content_type)
    }

    fn accept(&self, path: &str, method: &str) -> Result<Option<String>, ConvertError> {
        let document = self.context.document();
        let operation = document.operation(path, method)?;

        let accept = match document.variant() {
            SpecVariant::OasV3 => document
                .first_response(operation)
                .and_then(|response| response.get("content"))
                .and_then(Value::as_object)
                .and_then(|content| content.keys().next().cloned()),
            SpecVariant::OasV2 => document.produces(operation).into_iter().next(),
        };
        Ok(accept)
    }

    fn header_params(&self, path: &str, method: &str) -> Result<Vec<Header>, ConvertError> {
        let variant = self.context.document().variant();
        let params = self
            .context
            .location_params(path, method, Location::Header)?;

        let mut headers = Vec::with_capacity(params.len());
        for located in params {
            let param = &located.param;
            let value = match variant {
                SpecVariant::OasV2 => CollectionFormat::of(param).join(&located.value),
                SpecVariant::OasV3 => {
                    if RESERVED_HEADERS.contains(&param.name.to_ascii_lowercase().as_str()) {
                        debug!(name = %param.name, "ignoring reserved header parameter");
                        continue;
                    }
                    let explode = param.explode.unwrap_or(false);
                    let expanded = expand(Operator::Simple, "x", &located.value, explode);
                    percent_decode_str(&expanded).decode_utf8_lossy().into_owned()
                }
            };
            headers.push(Header::new(&param.name, value));
        }
        Ok(headers)
    }
}

impl SubConverter for HeadersConverter<'_> {
    type Output = Vec<Header>;

    fn convert(&self, path: &str, method: &str) -> Result<Self::Output, ConvertError> {
        let mut headers = Vec::new();
        if let Some(content_type) = self.content_type(path, method)? {
            headers.push(Header::new("content-type", content_type));
        }
        if let Some(accept) = self.accept(path, method)? {
            headers.push(Header::new("accept", accept));
        }
        headers.extend(self.header_params(path, method)?);
        Ok(headers)
    }
}
