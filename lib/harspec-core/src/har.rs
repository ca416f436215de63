//! HAR request shapes.
//!
//! Only the request side of the HTTP Archive format is produced: each
//! converted operation becomes one [`Request`], serialized with the camelCase
//! keys HAR consumers expect.

use serde::Serialize;

/// HTTP version written in every request.
pub const HTTP_VERSION: &str = "HTTP/1.1";

/// A HAR request entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// Upper-case HTTP method.
    pub method: String,
    /// Absolute URL including the query string.
    pub url: String,
    /// Always [`HTTP_VERSION`].
    pub http_version: String,
    /// Request headers, in insertion order.
    pub headers: Vec<Header>,
    /// Query string pairs, also present in [`Request::url`].
    pub query_string: Vec<QueryString>,
    /// Request cookies.
    pub cookies: Vec<Cookie>,
    /// The request body, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_data: Option<PostData>,
    /// Unknown, `-1`.
    pub headers_size: i64,
    /// Unknown, `-1`.
    pub body_size: i64,
}

impl Request {
    /// Creates an empty request for `method` and `url`.
    pub fn new(method: &str, url: impl Into<String>) -> Self {
        Self {
            method: method.to_uppercase(),
            url: url.into(),
            http_version: HTTP_VERSION.to_string(),
            headers: Vec::new(),
            query_string: Vec::new(),
            cookies: Vec::new(),
            post_data: None,
            headers_size: -1,
            body_size: -1,
        }
    }

    /// Finds the first header named `name`, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|header| header.name.eq_ignore_ascii_case(name))
            .map(|header| header.value.as_str())
    }
}

macro_rules! name_value {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Serialize)]
        pub struct $name {
            /// The name.
            pub name: String,
            /// The value.
            pub value: String,
        }

        impl $name {
            /// Creates a new pair.
            pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
                Self {
                    name: name.into(),
                    value: value.into(),
                }
            }
        }
    };
}

name_value!(
    /// A request header.
    Header
);
name_value!(
    /// A query string pair, not encoded.
    QueryString
);
name_value!(
    /// A request cookie.
    Cookie
);

/// A posted body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostData {
    /// Media type of the body.
    pub mime_type: String,
    /// The encoded body.
    pub text: String,
    /// Form parameters, for url-encoded and multipart bodies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<Param>>,
}

/// A posted form parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Param {
    /// The field name.
    pub name: String,
    /// The field value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// The file name, for file fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// The content type, for file fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl Param {
    /// A plain value field.
    pub fn value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            file_name: None,
            content_type: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_serialize_request_in_camel_case() {
        let mut request = Request::new("post", "https://example.com/pets?limit=1");
        request.headers.push(Header::new("content-type", "application/json"));
        request.query_string.push(QueryString::new("limit", "1"));
        request.post_data = Some(PostData {
            mime_type: "application/json".to_string(),
            text: r#"{"name":"doggie"}"#.to_string(),
            params: None,
        });

        let json = serde_json::to_string(&request).expect("serializable");

        insta::assert_snapshot!(json, @r#"{"method":"POST","url":"https://example.com/pets?limit=1","httpVersion":"HTTP/1.1","headers":[{"name":"content-type","value":"application/json"}],"queryString":[{"name":"limit","value":"1"}],"cookies":[],"postData":{"mimeType":"application/json","text":"{\"name\":\"doggie\"}"},"headersSize":-1,"bodySize":-1}"#);
    }

    #[test]
    fn should_find_header_ignoring_case() {
        let mut request = Request::new("get", "https://example.com");
        request.headers.push(Header::new("Accept", "application/xml"));

        assert_eq!(request.header("accept"), Some("application/xml"));
        assert_eq!(request.header("content-type"), None);
    }
}
