//! RFC 6570 expansion of a single variable expression.
//!
//! Only what request assembly needs: one variable per expression, operators
//! `+ # . / ; ? &`, and the explode modifier.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::Value;

/// Everything but RFC 3986 unreserved characters.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Unreserved and reserved characters are kept (`+` and `#` operators).
const RESERVED: &AsciiSet = &UNRESERVED
    .remove(b':')
    .remove(b'/')
    .remove(b'?')
    .remove(b'#')
    .remove(b'[')
    .remove(b']')
    .remove(b'@')
    .remove(b'!')
    .remove(b'$')
    .remove(b'&')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'+')
    .remove(b',')
    .remove(b';')
    .remove(b'=');

/// An expression operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `{x}`
    Simple,
    /// `{+x}`
    Reserved,
    /// `{#x}`
    Fragment,
    /// `{.x}`
    Label,
    /// `{/x}`
    PathSegment,
    /// `{;x}`
    PathParameter,
    /// `{?x}`
    Query,
    /// `{&x}`
    QueryContinuation,
}

impl Operator {
    fn prefix(self) -> &'static str {
        match self {
            Self::Simple | Self::Reserved => "",
            Self::Fragment => "#",
            Self::Label => ".",
            Self::PathSegment => "/",
            Self::PathParameter => ";",
            Self::Query => "?",
            Self::QueryContinuation => "&",
        }
    }

    fn separator(self) -> &'static str {
        match self {
            Self::Simple | Self::Reserved | Self::Fragment => ",",
            Self::Label => ".",
            Self::PathSegment => "/",
            Self::PathParameter => ";",
            Self::Query | Self::QueryContinuation => "&",
        }
    }

    fn named(self) -> bool {
        matches!(
            self,
            Self::PathParameter | Self::Query | Self::QueryContinuation
        )
    }

    /// Suffix written after a named variable with an empty value.
    fn if_empty(self) -> &'static str {
        match self {
            Self::Query | Self::QueryContinuation => "=",
            _ => "",
        }
    }

    fn encode(self, value: &str) -> String {
        let set = match self {
            Self::Reserved | Self::Fragment => RESERVED,
            _ => UNRESERVED,
        };
        utf8_percent_encode(value, set).to_string()
    }
}

/// Renders a scalar the way it appears in a URL.
pub(crate) fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(value) => value.clone(),
        Value::Null => String::new(),
        Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_) => {
            value.to_string()
        }
    }
}

/// Expands `{<operator><name><explode?>}` with `value`.
///
/// `null` values expand to an empty string, as undefined variables do.
pub fn expand(operator: Operator, name: &str, value: &Value, explode: bool) -> String {
    let prefix = operator.prefix();
    let separator = operator.separator();

    let named_pair = |key: &str, value: &str| -> String {
        if value.is_empty() {
            format!("{key}{}", operator.if_empty())
        } else {
            format!("{key}={value}")
        }
    };

    match value {
        Value::Null => String::new(),
        Value::Array(items) if items.is_empty() => String::new(),
        Value::Object(entries) if entries.is_empty() => String::new(),
        Value::Array(items) => {
            let items = items
                .iter()
                .map(|item| operator.encode(&scalar_to_string(item)));
            if explode {
                let items = items
                    .map(|item| {
                        if operator.named() {
                            named_pair(name, &item)
                        } else {
                            item
                        }
                    })
                    .collect::<Vec<_>>();
                format!("{prefix}{}", items.join(separator))
            } else {
                let joined = items.collect::<Vec<_>>().join(",");
                if operator.named() {
                    format!("{prefix}{}", named_pair(name, &joined))
                } else {
                    format!("{prefix}{joined}")
                }
            }
        }
        Value::Object(entries) => {
            let entries = entries.iter().map(|(key, value)| {
                (
                    operator.encode(key),
                    operator.encode(&scalar_to_string(value)),
                )
            });
            if explode {
                let pairs = entries
                    .map(|(key, value)| {
                        if operator.named() {
                            named_pair(&key, &value)
                        } else {
                            format!("{key}={value}")
                        }
                    })
                    .collect::<Vec<_>>();
                format!("{prefix}{}", pairs.join(separator))
            } else {
                let joined = entries
                    .flat_map(|(key, value)| [key, value])
                    .collect::<Vec<_>>()
                    .join(",");
                if operator.named() {
                    format!("{prefix}{}", named_pair(name, &joined))
                } else {
                    format!("{prefix}{joined}")
                }
            }
        }
        scalar => {
            let value = operator.encode(&scalar_to_string(scalar));
            if operator.named() {
                format!("{prefix}{}", named_pair(name, &value))
            } else {
                format!("{prefix}{value}")
            }
        }
    }
}

/// Appends percent-encoded `name=value` pairs to the query of `url`.
pub fn append_query<'q>(url: &str, pairs: impl IntoIterator<Item = (&'q str, &'q str)>) -> String {
    let mut result = url.to_string();
    let mut separator = if url.contains('?') { '&' } else { '?' };
    for (name, value) in pairs {
        result.push(separator);
        result.push_str(&utf8_percent_encode(name, UNRESERVED).to_string());
        result.push('=');
        result.push_str(&utf8_percent_encode(value, UNRESERVED).to_string());
        separator = '&';
    }
    result
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn should_expand_simple_values() {
        assert_eq!(expand(Operator::Simple, "x", &json!("a b"), false), "a%20b");
        assert_eq!(expand(Operator::Simple, "x", &json!(1024), false), "1024");
        assert_eq!(expand(Operator::Simple, "x", &json!(null), false), "");
    }

    #[test]
    fn should_expand_lists() {
        let list = json!(["red", "green", "blue"]);

        assert_eq!(expand(Operator::Simple, "list", &list, false), "red,green,blue");
        assert_eq!(expand(Operator::Label, "list", &list, true), ".red.green.blue");
        assert_eq!(
            expand(Operator::PathParameter, "list", &list, true),
            ";list=red;list=green;list=blue"
        );
        assert_eq!(
            expand(Operator::Query, "list", &list, false),
            "?list=red,green,blue"
        );
    }

    #[test]
    fn should_expand_objects() {
        let keys = json!({ "semi": ";", "dot": ".", "comma": "," });

        assert_eq!(
            expand(Operator::Simple, "keys", &keys, false),
            "semi,%3B,dot,.,comma,%2C"
        );
        assert_eq!(
            expand(Operator::Simple, "keys", &keys, true),
            "semi=%3B,dot=.,comma=%2C"
        );
        assert_eq!(
            expand(Operator::Reserved, "keys", &keys, true),
            "semi=;,dot=.,comma=,"
        );
    }

    #[test]
    fn should_keep_reserved_characters_with_plus() {
        assert_eq!(
            expand(Operator::Reserved, "path", &json!("/foo/bar"), false),
            "/foo/bar"
        );
        assert_eq!(
            expand(Operator::Simple, "path", &json!("/foo/bar"), false),
            "%2Ffoo%2Fbar"
        );
    }

    #[test]
    fn should_write_empty_named_values() {
        assert_eq!(expand(Operator::PathParameter, "x", &json!(""), false), ";x");
        assert_eq!(expand(Operator::Query, "x", &json!(""), false), "?x=");
    }

    #[test]
    fn should_append_encoded_query_pairs() {
        assert_eq!(
            append_query("https://example.com/pets", [("tags", "a b"), ("limit", "10")]),
            "https://example.com/pets?tags=a%20b&limit=10"
        );
        assert_eq!(
            append_query("https://example.com/pets?page=2", [("q", "x&y")]),
            "https://example.com/pets?page=2&q=x%26y"
        );
        assert_eq!(append_query("https://example.com", []), "https://example.com");
    }
}
