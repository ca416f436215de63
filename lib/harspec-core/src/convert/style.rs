use serde_json::Value;

use crate::oas::{Location, ParameterObject};

/// Parameter styles of OpenAPI 3.
///
/// They define how arrays and objects are serialized in a path, a query
/// string or a header.
///
/// # Examples
///
/// ```rust
/// use harspec_core::{Location, ParamStyle};
///
/// // Form style is the query default: ?tags=rust&tags=web
/// assert_eq!(ParamStyle::default_for(Location::Query), ParamStyle::Form);
///
/// // Pipe delimited arrays are joined with pipes: ?tags=rust|web
/// assert_eq!(ParamStyle::parse("pipeDelimited"), Some(ParamStyle::PipeDelimited));
/// assert_eq!(ParamStyle::PipeDelimited.delimiter(), "|");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamStyle {
    /// Form style: `param=value1&param=value2` (query and cookie default)
    Form,
    /// Simple style: `value1,value2` (path and header default)
    Simple,
    /// Space delimited: `param=value1 value2`
    SpaceDelimited,
    /// Pipe delimited: `param=value1|value2`
    PipeDelimited,
    /// Label style: `/users/.value`
    Label,
    /// Matrix style: `/users/;name=value`
    Matrix,
    /// Deep object style: `?obj[key]=value`
    DeepObject,
}

impl ParamStyle {
    /// Reads a `style` field.
    pub fn parse(name: &str) -> Option<Self> {
        let style = match name {
            "form" => Self::Form,
            "simple" => Self::Simple,
            "spaceDelimited" => Self::SpaceDelimited,
            "pipeDelimited" => Self::PipeDelimited,
            "label" => Self::Label,
            "matrix" => Self::Matrix,
            "deepObject" => Self::DeepObject,
            _ => return None,
        };
        Some(style)
    }

    /// The style used when a parameter declares none.
    pub fn default_for(location: Location) -> Self {
        match location {
            Location::Query | Location::Cookie => Self::Form,
            Location::Path | Location::Header | Location::Body => Self::Simple,
        }
    }

    /// The style of a parameter sent at `location`.
    pub fn of(param: &ParameterObject, location: Location) -> Self {
        param
            .style
            .as_deref()
            .and_then(Self::parse)
            .unwrap_or_else(|| Self::default_for(location))
    }

    /// The separator of non-exploded array items.
    pub fn delimiter(self) -> &'static str {
        match self {
            Self::SpaceDelimited => " ",
            Self::PipeDelimited => "|",
            Self::Form | Self::Simple | Self::Label | Self::Matrix | Self::DeepObject => ",",
        }
    }

    /// Whether values explode when `explode` is not declared.
    pub fn explodes_by_default(self) -> bool {
        self == Self::Form
    }
}

/// OAS v2 `collectionFormat` of array parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollectionFormat {
    /// `foo,bar` (default)
    #[default]
    Csv,
    /// `foo bar`
    Ssv,
    /// `foo\tbar`
    Tsv,
    /// `foo|bar`
    Pipes,
    /// `name=foo&name=bar`, query and form data only
    Multi,
}

impl CollectionFormat {
    /// Reads a `collectionFormat` field.
    pub fn parse(name: &str) -> Option<Self> {
        let format = match name {
            "csv" => Self::Csv,
            "ssv" => Self::Ssv,
            "tsv" => Self::Tsv,
            "pipes" => Self::Pipes,
            "multi" => Self::Multi,
            _ => return None,
        };
        Some(format)
    }

    /// The collection format of a parameter, `csv` when absent or unknown.
    pub fn of(param: &ParameterObject) -> Self {
        param
            .collection_format
            .as_deref()
            .and_then(Self::parse)
            .unwrap_or_default()
    }

    /// The separator of joined items.
    pub fn delimiter(self) -> &'static str {
        match self {
            Self::Csv | Self::Multi => ",",
            Self::Ssv => " ",
            Self::Tsv => "\t",
            Self::Pipes => "|",
        }
    }

    /// Joins a value: array items with the delimiter, scalars as they are.
    pub fn join(self, value: &Value) -> String {
        match value {
            Value::Array(items) => items
                .iter()
                .map(super::uri_template::scalar_to_string)
                .collect::<Vec<_>>()
                .join(self.delimiter()),
            value => super::uri_template::scalar_to_string(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn should_default_style_by_location() {
        assert_eq!(ParamStyle::default_for(Location::Query), ParamStyle::Form);
        assert_eq!(ParamStyle::default_for(Location::Cookie), ParamStyle::Form);
        assert_eq!(ParamStyle::default_for(Location::Path), ParamStyle::Simple);
        assert_eq!(ParamStyle::default_for(Location::Header), ParamStyle::Simple);
    }

    #[test]
    fn should_only_explode_form_by_default() {
        assert!(ParamStyle::Form.explodes_by_default());
        assert!(!ParamStyle::SpaceDelimited.explodes_by_default());
        assert!(!ParamStyle::Simple.explodes_by_default());
    }

    #[test]
    fn should_parse_unknown_style_as_none() {
        assert_eq!(ParamStyle::parse("deepObject"), Some(ParamStyle::DeepObject));
        assert_eq!(ParamStyle::parse("tabDelimited"), None);
    }

    #[test]
    fn should_join_collection_formats() {
        let value = json!(["a", 1, true]);

        assert_eq!(CollectionFormat::Csv.join(&value), "a,1,true");
        assert_eq!(CollectionFormat::Ssv.join(&value), "a 1 true");
        assert_eq!(CollectionFormat::Tsv.join(&value), "a\t1\ttrue");
        assert_eq!(CollectionFormat::Pipes.join(&value), "a|1|true");
        assert_eq!(CollectionFormat::Csv.join(&json!("single")), "single");
    }
}
