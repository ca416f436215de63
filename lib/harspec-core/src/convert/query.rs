use serde_json::Value;

use super::style::{CollectionFormat, ParamStyle};
use super::uri_template::scalar_to_string;
use super::{ConvertContext, SubConverter};
use crate::error::ConvertError;
use crate::har::QueryString;
use crate::oas::{Location, LocationParam, ParameterObject, SpecVariant};

/// Converts query parameters into query string pairs.
///
/// Values are not encoded here: the pairs are encoded when appended to the URL.
#[derive(Debug, Clone, Copy)]
pub struct QueryStringConverter<'c> {
    context: ConvertContext<'c>,
}

impl<'c> QueryStringConverter<'c> {
    /// Creates a query converter.
    pub fn new(context: ConvertContext<'c>) -> Self {
        Self { context }
    }
}

impl SubConverter for QueryStringConverter<'_> {
    type Output = Vec<QueryString>;

    fn convert(&self, path: &str, method: &str) -> Result<Self::Output, ConvertError> {
        let params = self
            .context
            .location_params(path, method, Location::Query)?;
        let variant = self.context.document().variant();

        let pairs = params
            .iter()
            .flat_map(|param| match variant {
                SpecVariant::OasV2 => v2_query_param(param),
                SpecVariant::OasV3 => v3_query_param(param),
            })
            .collect();
        Ok(pairs)
    }
}

fn v2_query_param(LocationParam { param, value, .. }: &LocationParam<ParameterObject>) -> Vec<QueryString> {
    let format = CollectionFormat::of(param);
    match value {
        Value::Array(items) if format == CollectionFormat::Multi => items
            .iter()
            .map(|item| QueryString::new(&param.name, scalar_to_string(item)))
            .collect(),
        value => vec![QueryString::new(&param.name, format.join(value))],
    }
}

fn v3_query_param(LocationParam { param, value, .. }: &LocationParam<ParameterObject>) -> Vec<QueryString> {
    let name = &param.name;
    let style = ParamStyle::of(param, Location::Query);
    let explode = param.explode.unwrap_or(style.explodes_by_default());

    match value {
        Value::Array(items) if explode => items
            .iter()
            .map(|item| QueryString::new(name, scalar_to_string(item)))
            .collect(),
        Value::Array(items) => {
            let joined = items
                .iter()
                .map(scalar_to_string)
                .collect::<Vec<_>>()
                .join(style.delimiter());
            vec![QueryString::new(name, joined)]
        }
        Value::Object(entries) if style == ParamStyle::DeepObject => entries
            .iter()
            .map(|(key, value)| QueryString::new(format!("{name}[{key}]"), scalar_to_string(value)))
            .collect(),
        Value::Object(entries) if explode => entries
            .iter()
            .map(|(key, value)| QueryString::new(key, scalar_to_string(value)))
            .collect(),
        Value::Object(entries) => {
            let joined = entries
                .iter()
                .flat_map(|(key, value)| [key.clone(), scalar_to_string(value)])
                .collect::<Vec<_>>()
                .join(style.delimiter());
            vec![QueryString::new(name, joined)]
        }
        scalar => vec![QueryString::new(name, scalar_to_string(scalar))],
    }
}
