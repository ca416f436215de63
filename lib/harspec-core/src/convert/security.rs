//! Security requirements turned into credentials placeholders.
//!
//! The first requirement of an operation (or of the document) is applied.
//! Each scheme it names ends up as a header, a query pair or a cookie:
//!
//! | Scheme | Output |
//! |---|---|
//! | `basic` (v2), `http`/`basic` (v3) | `Authorization: Basic base64(user:pass)` |
//! | `http`/`bearer`, `oauth2`, `openIdConnect` | `Authorization: Bearer <token>` |
//! | `apiKey` | header, query pair or cookie named by the scheme |

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;
use tracing::debug;

use super::{ConvertContext, SubConverter};
use crate::error::ConvertError;
use crate::har::{Cookie, Header, QueryString};

/// Location where an API key is passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiKeyLocation {
    /// API key in HTTP header
    Header,
    /// API key in query parameter
    Query,
    /// API key in cookie
    Cookie,
}

/// A security scheme, as declared in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecurityScheme {
    /// HTTP Basic authentication (RFC 7617).
    Basic,
    /// HTTP Bearer authentication (RFC 6750).
    Bearer,
    /// API key authentication.
    ApiKey {
        /// Name of the header, query parameter, or cookie
        name: String,
        /// Where the API key is passed
        location: ApiKeyLocation,
    },
    /// OAuth 2.0 flows, sent as a bearer token.
    OAuth2,
    /// OpenID Connect, sent as a bearer token.
    OpenIdConnect,
}

impl SecurityScheme {
    /// Reads a security scheme object.
    ///
    /// Unknown types and HTTP schemes other than `basic`/`bearer` yield `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let field = |name: &str| value.get(name).and_then(Value::as_str);

        let scheme = match field("type")? {
            "basic" => Self::Basic,
            "http" => match field("scheme")?.to_ascii_lowercase().as_str() {
                "basic" => Self::Basic,
                "bearer" => Self::Bearer,
                _ => return None,
            },
            "apiKey" => {
                let location = match field("in")? {
                    "header" => ApiKeyLocation::Header,
                    "query" => ApiKeyLocation::Query,
                    "cookie" => ApiKeyLocation::Cookie,
                    _ => return None,
                };
                Self::ApiKey {
                    name: field("name")?.to_string(),
                    location,
                }
            }
            "oauth2" => Self::OAuth2,
            "openIdConnect" => Self::OpenIdConnect,
            _ => return None,
        };
        Some(scheme)
    }
}

/// Credential values written in place of real secrets.
///
/// # Example
///
/// ```rust
/// use harspec_core::SecurityPlaceholders;
///
/// let placeholders = SecurityPlaceholders::default().with_token("{{accessToken}}");
/// assert_eq!(placeholders.token(), "{{accessToken}}");
/// assert_eq!(placeholders.username(), "user");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityPlaceholders {
    username: String,
    password: String,
    token: String,
    api_key: String,
}

impl Default for SecurityPlaceholders {
    fn default() -> Self {
        Self {
            username: "user".to_string(),
            password: "pass".to_string(),
            token: "token".to_string(),
            api_key: "api_key".to_string(),
        }
    }
}

impl SecurityPlaceholders {
    /// Sets the Basic authentication username.
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    /// Sets the Basic authentication password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Sets the bearer token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    /// Sets the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    /// The Basic authentication username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The Basic authentication password.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// The bearer token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// The API key.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

/// `Basic base64(username:password)`
pub(crate) fn basic_authorization(username: &str, password: &str) -> String {
    let credentials = STANDARD.encode(format!("{username}:{password}"));
    format!("Basic {credentials}")
}

/// `Bearer <token>`
pub(crate) fn bearer_authorization(token: &str) -> String {
    format!("Bearer {token}")
}

/// Where the credentials of a request go.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityFragment {
    /// Headers, e.g. `Authorization`.
    pub headers: Vec<Header>,
    /// Query pairs for query API keys.
    pub query_string: Vec<QueryString>,
    /// Cookies for cookie API keys.
    pub cookies: Vec<Cookie>,
}

impl SecurityFragment {
    /// Adds the credentials of `scheme`.
    pub fn apply(&mut self, scheme: &SecurityScheme, placeholders: &SecurityPlaceholders) {
        match scheme {
            SecurityScheme::Basic => self.headers.push(Header::new(
                "authorization",
                basic_authorization(placeholders.username(), placeholders.password()),
            )),
            SecurityScheme::Bearer | SecurityScheme::OAuth2 | SecurityScheme::OpenIdConnect => self
                .headers
                .push(Header::new("authorization", bearer_authorization(placeholders.token()))),
            SecurityScheme::ApiKey { name, location } => {
                let key = placeholders.api_key();
                match location {
                    ApiKeyLocation::Header => self.headers.push(Header::new(name, key)),
                    ApiKeyLocation::Query => self.query_string.push(QueryString::new(name, key)),
                    ApiKeyLocation::Cookie => self.cookies.push(Cookie::new(name, key)),
                }
            }
        }
    }
}

/// Applies the security requirement of an operation.
#[derive(Debug, Clone)]
pub struct SecurityConverter<'c> {
    context: ConvertContext<'c>,
    placeholders: &'c SecurityPlaceholders,
}

impl<'c> SecurityConverter<'c> {
    /// Creates a security converter.
    pub fn new(context: ConvertContext<'c>, placeholders: &'c SecurityPlaceholders) -> Self {
        Self {
            context,
            placeholders,
        }
    }
}

impl SubConverter for SecurityConverter<'_> {
    type Output = SecurityFragment;

    fn convert(&self, path: &str, method: &str) -> Result<Self::Output, ConvertError> {
        let document = self.context.document();
        let operation = document.operation(path, method)?;

        let mut fragment = SecurityFragment::default();
        let Some(requirement) = document
            .security_requirements(operation)
            .and_then(|requirements| requirements.first())
            .and_then(Value::as_object)
        else {
            return Ok(fragment);
        };
        let schemes = document.security_schemes();

        for name in requirement.keys() {
            let scheme = schemes
                .and_then(|schemes| schemes.get(name))
                .and_then(SecurityScheme::from_value);
            match scheme {
                Some(scheme) => fragment.apply(&scheme, self.placeholders),
                None => debug!(%name, "unsupported or undefined security scheme"),
            }
        }
        Ok(fragment)
    }
}
