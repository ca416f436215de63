//! Serde model of a Postman collection (v2.0 and v2.1).
//!
//! Only what request conversion reads is modelled; unknown fields are ignored.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use super::scope::Variable;
use super::string_value;

/// A Postman collection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Collection {
    /// Collection metadata.
    #[serde(default)]
    pub info: Info,
    /// Top-level requests and folders.
    #[serde(default)]
    pub item: Vec<Item>,
    /// Collection variables.
    #[serde(default)]
    pub variable: Vec<Variable>,
    /// Collection-wide authentication.
    pub auth: Option<Auth>,
}

/// Collection metadata.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Info {
    /// Collection name.
    #[serde(default)]
    pub name: String,
    /// Schema URL, e.g. `https://schema.getpostman.com/json/collection/v2.1.0/collection.json`.
    pub schema: Option<String>,
}

/// A request or a folder.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Item {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Children, for folders.
    pub item: Option<Vec<Item>>,
    /// The request, for request items.
    pub request: Option<RequestDefinition>,
    /// Folder or item variables.
    #[serde(default)]
    pub variable: Vec<Variable>,
    /// Folder-wide authentication.
    pub auth: Option<Auth>,
}

/// A request, or its URL shorthand.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RequestDefinition {
    /// `"request": "https://example.com"`
    Url(String),
    /// A full request.
    Request(Box<Request>),
}

/// A Postman request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Request {
    /// HTTP method, `GET` when absent.
    pub method: Option<String>,
    /// Target URL.
    pub url: Option<UrlDefinition>,
    /// Headers.
    #[serde(default)]
    pub header: Headers,
    /// Body.
    pub body: Option<Body>,
    /// Request authentication.
    pub auth: Option<Auth>,
}

/// Headers as a list, or as a raw `Name: value` block.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Headers {
    /// Structured headers.
    List(Vec<KeyValue>),
    /// One `Name: value` per line.
    Raw(String),
}

impl Default for Headers {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl Headers {
    /// Enabled headers as `(name, value)` pairs.
    pub fn pairs(&self) -> Vec<(String, String)> {
        match self {
            Self::List(entries) => entries.iter().filter_map(KeyValue::pair).collect(),
            Self::Raw(raw) => raw
                .lines()
                .filter_map(|line| line.split_once(':'))
                .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
                .collect(),
        }
    }
}

/// A URL, raw or structured.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum UrlDefinition {
    /// The raw URL.
    Raw(String),
    /// URL parts.
    Structured(Box<Url>),
}

/// Structured URL parts.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Url {
    /// The URL as typed.
    pub raw: Option<String>,
    /// `http`, `https`...
    pub protocol: Option<String>,
    /// Host labels, or the host.
    pub host: Option<Segments>,
    /// The port, possibly a variable.
    #[serde(default, deserialize_with = "string_value")]
    pub port: Option<String>,
    /// Path segments, or the path.
    pub path: Option<Segments>,
    /// Query parameters.
    #[serde(default)]
    pub query: Vec<KeyValue>,
    /// Path variables (`:name` segments).
    #[serde(default)]
    pub variable: Vec<Variable>,
}

/// A dotted host or slashed path, split or not.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Segments {
    /// Already joined.
    Joined(String),
    /// One entry per segment.
    Split(Vec<Segment>),
}

impl Segments {
    /// Joins the segments with `separator`.
    pub fn join(&self, separator: &str) -> String {
        match self {
            Self::Joined(joined) => joined.clone(),
            Self::Split(segments) => segments
                .iter()
                .map(Segment::as_str)
                .collect::<Vec<_>>()
                .join(separator),
        }
    }
}

/// A path segment: a string, or a `{ "type": "string", "value": ... }` object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Segment {
    /// Plain segment.
    Text(String),
    /// Described segment.
    Described {
        /// The segment value.
        #[serde(default)]
        value: String,
    },
}

impl Segment {
    /// The segment text.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text(value) | Self::Described { value } => value,
        }
    }
}

/// A `key`/`value` entry: headers, query parameters, form fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyValue {
    /// The name.
    #[serde(default, deserialize_with = "string_value")]
    pub key: Option<String>,
    /// The value.
    #[serde(default, deserialize_with = "string_value")]
    pub value: Option<String>,
    /// Disabled entries are skipped.
    #[serde(default)]
    pub disabled: bool,
    /// `text` or `file`, for form fields.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// File source, for file fields.
    pub src: Option<Value>,
    /// Content type of a form field.
    pub content_type: Option<String>,
}

impl KeyValue {
    /// The enabled `(key, value)` pair, `None` for disabled or keyless entries.
    pub fn pair(&self) -> Option<(String, String)> {
        if self.disabled {
            return None;
        }
        let key = self.key.clone()?;
        Some((key, self.value.clone().unwrap_or_default()))
    }

    /// Whether the entry is a file form field.
    pub fn is_file(&self) -> bool {
        self.kind.as_deref() == Some("file")
    }
}

/// A request body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Body {
    /// `raw`, `urlencoded`, `formdata`, `graphql` or `file`.
    pub mode: Option<String>,
    /// Raw text.
    pub raw: Option<String>,
    /// Url-encoded fields.
    #[serde(default)]
    pub urlencoded: Vec<KeyValue>,
    /// Multipart fields.
    #[serde(default)]
    pub formdata: Vec<KeyValue>,
    /// GraphQL `query` and `variables`.
    pub graphql: Option<Value>,
    /// File body, `{ "src": ... }`.
    pub file: Option<Value>,
    /// Mode options, e.g. `{ "raw": { "language": "json" } }`.
    pub options: Option<Value>,
    /// Disabled bodies are not sent.
    #[serde(default)]
    pub disabled: bool,
}

/// Authentication settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Auth {
    /// `noauth`, `basic`, `bearer`, `apikey`...
    #[serde(rename = "type")]
    pub kind: String,
    /// Attributes of every auth type, by type name.
    #[serde(flatten)]
    pub attributes: IndexMap<String, AuthAttributes>,
}

impl Auth {
    /// Reads an attribute of the active auth type.
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.get(&self.kind)?.get(name)
    }
}

/// Auth attributes: a `[{ key, value }]` list (v2.1) or a map (v2.0).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AuthAttributes {
    /// v2.1 attributes.
    List(Vec<KeyValue>),
    /// v2.0 attributes.
    Map(IndexMap<String, Value>),
}

impl AuthAttributes {
    /// Finds an attribute value.
    pub fn get(&self, name: &str) -> Option<String> {
        match self {
            Self::List(entries) => entries
                .iter()
                .find(|entry| entry.key.as_deref() == Some(name))
                .and_then(|entry| entry.value.clone()),
            Self::Map(entries) => entries.get(name).map(|value| match value {
                Value::String(value) => value.clone(),
                value => value.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn should_read_both_auth_flavors() {
        let v21: Auth = serde_json::from_value(json!({
            "type": "basic",
            "basic": [{ "key": "username", "value": "alice" }, { "key": "password", "value": "secret" }]
        }))
        .expect("an auth");
        let v20: Auth = serde_json::from_value(json!({
            "type": "bearer",
            "bearer": { "token": "abc" }
        }))
        .expect("an auth");

        assert_eq!(v21.attribute("username").as_deref(), Some("alice"));
        assert_eq!(v20.attribute("token").as_deref(), Some("abc"));
        assert_eq!(v20.attribute("missing"), None);
    }

    #[test]
    fn should_join_url_segments() {
        let url: Url = serde_json::from_value(json!({
            "host": ["{{host}}", "example", "com"],
            "path": ["pets", { "type": "string", "value": ":petId" }],
            "port": 8080
        }))
        .expect("a url");

        assert_eq!(url.host.map(|host| host.join(".")).as_deref(), Some("{{host}}.example.com"));
        assert_eq!(url.path.map(|path| path.join("/")).as_deref(), Some("pets/:petId"));
        assert_eq!(url.port.as_deref(), Some("8080"));
    }

    #[test]
    fn should_read_raw_headers() {
        let headers = Headers::Raw("Accept: application/json\nX-Trace: {{trace}}\n".to_string());

        assert_eq!(
            headers.pairs(),
            vec![
                ("Accept".to_string(), "application/json".to_string()),
                ("X-Trace".to_string(), "{{trace}}".to_string()),
            ]
        );
    }

    #[test]
    fn should_skip_disabled_entries() {
        let entries: Vec<KeyValue> = serde_json::from_value(json!([
            { "key": "a", "value": "1" },
            { "key": "b", "value": "2", "disabled": true },
            { "value": "orphan" }
        ]))
        .expect("entries");

        let pairs = entries.iter().filter_map(KeyValue::pair).collect::<Vec<_>>();

        assert_eq!(pairs, vec![("a".to_string(), "1".to_string())]);
    }
}
