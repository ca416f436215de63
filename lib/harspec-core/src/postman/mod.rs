//! Postman collections: variable scopes, `{{variable}}` substitution and
//! request conversion.
//!
//! Variables resolve from the innermost scope outwards: request, folders,
//! collection, environment, globals. Names starting with `$` are dynamic
//! variables, generated on demand by [`DynamicGenerators`].

use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub mod collection;

mod converter;
pub use self::converter::PostmanConverter;

mod generators;
pub use self::generators::DynamicGenerators;

mod parser;
pub use self::parser::{
    DynamicValues, EnvVariableParser, ScopedParser, UrlVariableParser, VariableParser,
    VariableParserFactory,
};

mod scope;
pub use self::scope::{LexicalScope, Variable};

/// Reads a Postman scalar as a string: `8080` and `true` are valid values.
pub(crate) fn string_value<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(value)) => Some(value),
        Some(value) => Some(value.to_string()),
    })
}
