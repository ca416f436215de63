//! Per-location converters of an OpenAPI operation.
//!
//! Each converter reads the parameters sent at one location and produces the
//! matching fragment of a HAR request. The [`Converter`](crate::Converter)
//! merges the fragments.

use crate::error::ConvertError;
use crate::oas::{
    Location, LocationParam, OasDocument, ParamSampler, ParameterObject, filter_location_params,
};
use crate::sampler::Sampler;

mod body;
pub use self::body::{
    BodyConverter, BodyFragment, MULTIPART_BOUNDARY, multipart_post_data, post_data,
};

mod cookies;
pub use self::cookies::CookiesConverter;

mod headers;
pub use self::headers::HeadersConverter;
pub(crate) use self::headers::{FORM_URLENCODED, MULTIPART_FORM_DATA};

mod path;
pub use self::path::PathConverter;

mod query;
pub use self::query::QueryStringConverter;

mod security;
pub use self::security::{
    ApiKeyLocation, SecurityConverter, SecurityFragment, SecurityPlaceholders, SecurityScheme,
};

mod style;
pub use self::style::{CollectionFormat, ParamStyle};

pub mod uri_template;

/// Converts one location of an operation.
pub trait SubConverter {
    /// The request fragment produced.
    type Output;

    /// Converts the operation `method` of `path`.
    ///
    /// # Errors
    ///
    /// Fails when the operation is missing, or when a value cannot be sampled or encoded.
    fn convert(&self, path: &str, method: &str) -> Result<Self::Output, ConvertError>;
}

/// What every converter reads: the document and the sampler.
#[derive(Debug, Clone, Copy)]
pub struct ConvertContext<'c> {
    document: OasDocument<'c>,
    sampler: &'c Sampler,
}

impl<'c> ConvertContext<'c> {
    /// Creates a context over a document.
    pub fn new(document: OasDocument<'c>, sampler: &'c Sampler) -> Self {
        Self { document, sampler }
    }

    /// The document.
    pub fn document(&self) -> OasDocument<'c> {
        self.document
    }

    /// The schema sampler.
    pub fn sampler(&self) -> &'c Sampler {
        self.sampler
    }

    fn param_sampler(&self) -> ParamSampler<'c> {
        ParamSampler::new(self.sampler, self.document.variant())
    }

    /// Parameters of an operation at `location`, each with its value.
    pub(crate) fn location_params(
        &self,
        path: &str,
        method: &str,
        location: Location,
    ) -> Result<Vec<LocationParam<ParameterObject>>, ConvertError> {
        let params = self.document.parameters(path, method)?;
        let sampler = self.param_sampler();

        filter_location_params(&params, location)
            .into_iter()
            .map(|param| -> Result<_, ConvertError> {
                let sampled = sampler.sample_param(param)?;
                Ok(LocationParam {
                    param: sampled.param.clone(),
                    value: sampled.value,
                    value_json_pointer: sampled.value_json_pointer,
                })
            })
            .collect()
    }
}
