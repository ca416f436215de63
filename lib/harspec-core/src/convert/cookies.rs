use serde_json::Value;

use super::uri_template::scalar_to_string;
use super::{ConvertContext, SubConverter};
use crate::error::ConvertError;
use crate::har::Cookie;
use crate::oas::Location;

/// Converts cookie parameters, one HAR cookie per parameter.
///
/// Arrays are comma-joined, objects are flattened as `key,value` pairs
/// (the non-exploded `form` style).
#[derive(Debug, Clone, Copy)]
pub struct CookiesConverter<'c> {
    context: ConvertContext<'c>,
}

impl<'c> CookiesConverter<'c> {
    /// Creates a cookies converter.
    pub fn new(context: ConvertContext<'c>) -> Self {
        Self { context }
    }
}

fn cookie_value(value: &Value) -> String {
    match value {
        Value::Array(items) => items
            .iter()
            .map(scalar_to_string)
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(entries) => entries
            .iter()
            .flat_map(|(key, value)| [key.clone(), scalar_to_string(value)])
            .collect::<Vec<_>>()
            .join(","),
        scalar => scalar_to_string(scalar),
    }
}

impl SubConverter for CookiesConverter<'_> {
    type Output = Vec<Cookie>;

    fn convert(&self, path: &str, method: &str) -> Result<Self::Output, ConvertError> {
        let params = self
            .context
            .location_params(path, method, Location::Cookie)?;

        Ok(params
            .iter()
            .map(|located| Cookie::new(&located.param.name, cookie_value(&located.value)))
            .collect())
    }
}
