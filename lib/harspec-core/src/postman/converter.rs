use std::borrow::Cow;

use serde_json::{Value, json};
use tracing::{debug, warn};

use super::collection::{
    Auth, Body, Collection, Item, KeyValue, Request, RequestDefinition, Url, UrlDefinition,
};
use super::{
    DynamicGenerators, DynamicValues, EnvVariableParser, LexicalScope, Variable, VariableParser,
    VariableParserFactory,
};
use crate::convert::uri_template::append_query;
use crate::convert::{
    ApiKeyLocation, FORM_URLENCODED, SecurityFragment, SecurityPlaceholders, SecurityScheme,
    multipart_post_data,
};
use crate::converter::{ConversionReport, OperationFailure};
use crate::error::ConvertError;
use crate::har::{self, Cookie, Header, Param, PostData, QueryString};

const DEFAULT_PROTOCOL: &str = "http";
const OCTET_STREAM: &str = "application/octet-stream";

/// Converts the requests of a Postman collection.
///
/// Every request item becomes one HAR request. Items that cannot be
/// converted, typically because of an undefined variable, are reported as
/// failures without stopping the walk.
#[derive(Debug, Clone, Copy)]
pub struct PostmanConverter<'c> {
    generators: &'c DynamicGenerators,
    globals: &'c [Variable],
    environment: &'c [Variable],
}

impl<'c> PostmanConverter<'c> {
    /// Creates a converter without globals nor environment.
    pub fn new(generators: &'c DynamicGenerators) -> Self {
        Self {
            generators,
            globals: &[],
            environment: &[],
        }
    }

    /// Sets the global variables, the outermost scope.
    #[must_use]
    pub fn with_globals(mut self, globals: &'c [Variable]) -> Self {
        self.globals = globals;
        self
    }

    /// Sets the environment variables, between globals and the collection.
    #[must_use]
    pub fn with_environment(mut self, environment: &'c [Variable]) -> Self {
        self.environment = environment;
        self
    }

    /// Converts every request of `document`.
    ///
    /// # Errors
    ///
    /// Fails only when `document` is not a collection.
    pub fn convert(&self, document: &Value) -> Result<ConversionReport, ConvertError> {
        let collection: Collection =
            serde_path_to_error::deserialize(document).map_err(|error| {
                ConvertError::InvalidDocument {
                    pointer: String::new(),
                    message: format!("{} at '{}'", error.inner(), error.path()),
                }
            })?;

        let globals = LexicalScope::new("globals", self.globals);
        let environment = LexicalScope::nested("environment", self.environment, &globals);
        let scope = LexicalScope::nested(
            collection.info.name.clone(),
            &collection.variable,
            &environment,
        );

        let mut report = ConversionReport::default();
        self.walk(
            &collection.item,
            &scope,
            collection.auth.as_ref(),
            "",
            &mut report,
        );
        Ok(report)
    }

    fn walk(
        &self,
        items: &[Item],
        parent: &LexicalScope<'_>,
        inherited_auth: Option<&Auth>,
        folder: &str,
        report: &mut ConversionReport,
    ) {
        for item in items {
            let path = if folder.is_empty() {
                item.name.clone()
            } else {
                format!("{folder}/{}", item.name)
            };
            let auth = item.auth.as_ref().or(inherited_auth);
            let scope = LexicalScope::nested(item.name.clone(), &item.variable, parent);

            if let Some(children) = &item.item {
                self.walk(children, &scope, auth, &path, report);
            }

            let Some(definition) = &item.request else {
                continue;
            };
            let request = match definition {
                RequestDefinition::Url(url) => Cow::Owned(Request {
                    url: Some(UrlDefinition::Raw(url.clone())),
                    ..Request::default()
                }),
                RequestDefinition::Request(request) => Cow::Borrowed(request.as_ref()),
            };
            let method = request
                .method
                .as_deref()
                .unwrap_or("GET")
                .to_uppercase();

            match self.convert_request(&method, &request, &scope, auth) {
                Ok(request) => report.requests.push(request),
                Err(error) => {
                    warn!(%path, %method, %error, "skipping Postman request");
                    report.failures.push(OperationFailure {
                        path,
                        method,
                        error,
                    });
                }
            }
        }
    }

    fn convert_request(
        &self,
        method: &str,
        request: &Request,
        scope: &LexicalScope<'_>,
        inherited_auth: Option<&Auth>,
    ) -> Result<har::Request, ConvertError> {
        let env = EnvVariableParser::new(self.generators);
        let mut values = DynamicValues::default();
        let (base, query) = self.url(request.url.as_ref(), scope, &mut values)?;
        let mut result = har::Request::new(method, base.clone());

        for (name, value) in query {
            result.query_string.push(QueryString::new(
                env.parse_with(&name, scope, &mut values)?,
                env.parse_with(&value, scope, &mut values)?,
            ));
        }

        for (name, value) in request.header.pairs() {
            let value = env.parse_with(&value, scope, &mut values)?;
            if name.eq_ignore_ascii_case("cookie") {
                result.cookies.extend(parse_cookies(&value));
            }
            result
                .headers
                .push(Header::new(env.parse_with(&name, scope, &mut values)?, value));
        }

        if let Some(body) = &request.body
            && let Some(post_data) = self.body(body, &result.headers, scope, &mut values)?
        {
            if result.header("content-type").is_none() {
                result
                    .headers
                    .push(Header::new("content-type", post_data.mime_type.clone()));
            }
            result.post_data = Some(post_data);
        }

        if let Some(auth) = request.auth.as_ref().or(inherited_auth) {
            let security = self.auth(auth, scope, &mut values)?;
            result.headers.extend(security.headers);
            result.query_string.extend(security.query_string);
            result.cookies.extend(security.cookies);
        }

        result.url = append_query(
            &base,
            result
                .query_string
                .iter()
                .map(|pair| (pair.name.as_str(), pair.value.as_str())),
        );
        Ok(result)
    }

    /// The URL without query, and the enabled query pairs, not yet substituted.
    fn url(
        &self,
        url: Option<&UrlDefinition>,
        scope: &LexicalScope<'_>,
        values: &mut DynamicValues,
    ) -> Result<(String, Vec<(String, String)>), ConvertError> {
        let (base, query, variables) = match url {
            None => (String::new(), Vec::new(), &[][..]),
            Some(UrlDefinition::Raw(raw)) => {
                let (base, query) = split_raw_url(raw);
                (base, query, &[][..])
            }
            Some(UrlDefinition::Structured(url)) => (
                structured_base(url),
                url.query.iter().filter_map(KeyValue::pair).collect(),
                url.variable.as_slice(),
            ),
        };

        let parser = VariableParserFactory::new(self.generators).create_url_variable_parser(variables);
        let base = parser.parse_with(&base, scope, values)?;
        let base = if base.contains("://") {
            base
        } else {
            debug!(url = %base, "no protocol, defaulting to {DEFAULT_PROTOCOL}");
            format!("{DEFAULT_PROTOCOL}://{base}")
        };
        Ok((base, query))
    }

    fn body(
        &self,
        body: &Body,
        headers: &[Header],
        scope: &LexicalScope<'_>,
        values: &mut DynamicValues,
    ) -> Result<Option<PostData>, ConvertError> {
        if body.disabled {
            return Ok(None);
        }
        let env = EnvVariableParser::new(self.generators);
        let content_type = headers
            .iter()
            .find(|header| header.name.eq_ignore_ascii_case("content-type"))
            .map(|header| header.value.clone());

        let post_data = match body.mode.as_deref() {
            Some("raw") => {
                let text =
                    env.parse_with(body.raw.as_deref().unwrap_or_default(), scope, values)?;
                if text.is_empty() {
                    return Ok(None);
                }
                let mime_type = content_type
                    .unwrap_or_else(|| raw_language_mime(body.options.as_ref()).to_string());
                PostData {
                    mime_type,
                    text,
                    params: None,
                }
            }
            Some("urlencoded") => {
                let mut fields = Vec::new();
                for (name, value) in body.urlencoded.iter().filter_map(KeyValue::pair) {
                    fields.push((
                        env.parse_with(&name, scope, values)?,
                        env.parse_with(&value, scope, values)?,
                    ));
                }
                let text = serde_urlencoded::to_string(&fields).map_err(|error| {
                    ConvertError::BodyEncoding {
                        mime_type: FORM_URLENCODED.to_string(),
                        message: error.to_string(),
                    }
                })?;
                PostData {
                    mime_type: FORM_URLENCODED.to_string(),
                    text,
                    params: Some(
                        fields
                            .into_iter()
                            .map(|(name, value)| Param::value(name, value))
                            .collect(),
                    ),
                }
            }
            Some("formdata") => {
                let mut params = Vec::new();
                for field in body.formdata.iter().filter(|field| !field.disabled) {
                    let Some(name) = &field.key else {
                        continue;
                    };
                    let name = env.parse_with(name, scope, values)?;
                    let param = if field.is_file() {
                        Param {
                            name,
                            value: None,
                            file_name: field.src.as_ref().and_then(file_name),
                            content_type: field.content_type.clone(),
                        }
                    } else {
                        Param {
                            name,
                            value: Some(env.parse_with(
                                field.value.as_deref().unwrap_or_default(),
                                scope,
                                values,
                            )?),
                            file_name: None,
                            content_type: field.content_type.clone(),
                        }
                    };
                    params.push(param);
                }
                multipart_post_data(params)
            }
            Some("graphql") => {
                let graphql = body.graphql.as_ref().unwrap_or(&Value::Null);
                let query = env.parse_with(
                    graphql.get("query").and_then(Value::as_str).unwrap_or_default(),
                    scope,
                    values,
                )?;
                let variables = match graphql.get("variables") {
                    Some(Value::String(variables)) if !variables.trim().is_empty() => {
                        serde_json::from_str(&env.parse_with(variables, scope, values)?)?
                    }
                    Some(variables @ Value::Object(_)) => variables.clone(),
                    _ => json!({}),
                };
                PostData {
                    mime_type: mime::APPLICATION_JSON.to_string(),
                    text: json!({ "query": query, "variables": variables }).to_string(),
                    params: None,
                }
            }
            Some("file") => PostData {
                mime_type: content_type.unwrap_or_else(|| OCTET_STREAM.to_string()),
                text: String::new(),
                params: None,
            },
            Some(mode) => {
                debug!(mode, "unsupported body mode skipped");
                return Ok(None);
            }
            None => return Ok(None),
        };
        Ok(Some(post_data))
    }

    fn auth(
        &self,
        auth: &Auth,
        scope: &LexicalScope<'_>,
        values: &mut DynamicValues,
    ) -> Result<SecurityFragment, ConvertError> {
        let env = EnvVariableParser::new(self.generators);
        let mut attribute = |name: &str| -> Result<String, ConvertError> {
            let value = auth.attribute(name).unwrap_or_default();
            Ok(env.parse_with(&value, scope, values)?)
        };

        let mut fragment = SecurityFragment::default();
        let placeholders = SecurityPlaceholders::default();
        match auth.kind.as_str() {
            "noauth" => {}
            "basic" => fragment.apply(
                &SecurityScheme::Basic,
                &placeholders
                    .with_username(attribute("username")?)
                    .with_password(attribute("password")?),
            ),
            "bearer" => fragment.apply(
                &SecurityScheme::Bearer,
                &placeholders.with_token(attribute("token")?),
            ),
            "apikey" => {
                let location = match auth.attribute("in").as_deref() {
                    Some("query") => ApiKeyLocation::Query,
                    _ => ApiKeyLocation::Header,
                };
                let scheme = SecurityScheme::ApiKey {
                    name: attribute("key")?,
                    location,
                };
                fragment.apply(&scheme, &placeholders.with_api_key(attribute("value")?));
            }
            kind => debug!(kind, "unsupported auth type skipped"),
        }
        Ok(fragment)
    }
}

fn split_raw_url(raw: &str) -> (String, Vec<(String, String)>) {
    let raw = raw.split_once('#').map_or(raw, |(url, _)| url);
    let Some((base, query)) = raw.split_once('?') else {
        return (raw.to_string(), Vec::new());
    };
    let pairs = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            (name.to_string(), value.to_string())
        })
        .collect();
    (base.to_string(), pairs)
}

fn structured_base(url: &Url) -> String {
    let Some(host) = &url.host else {
        let raw = url.raw.as_deref().unwrap_or_default();
        return split_raw_url(raw).0;
    };

    let mut result = String::new();
    if let Some(protocol) = &url.protocol {
        result.push_str(protocol.trim_end_matches("://"));
        result.push_str("://");
    }
    result.push_str(&host.join("."));
    if let Some(port) = &url.port {
        result.push(':');
        result.push_str(port);
    }
    if let Some(path) = &url.path {
        let path = path.join("/");
        let path = path.trim_start_matches('/');
        if !path.is_empty() {
            result.push('/');
            result.push_str(path);
        }
    }
    result
}

fn raw_language_mime(options: Option<&Value>) -> &'static str {
    let language = options
        .and_then(|options| options.pointer("/raw/language"))
        .and_then(Value::as_str);
    match language {
        Some("json") => "application/json",
        Some("xml") => "application/xml",
        Some("html") => "text/html",
        Some("javascript") => "application/javascript",
        _ => "text/plain",
    }
}

fn file_name(src: &Value) -> Option<String> {
    let src = match src {
        Value::String(src) => src.as_str(),
        Value::Array(sources) => sources.first().and_then(Value::as_str)?,
        _ => return None,
    };
    Some(src.rsplit(['/', '\\']).next().unwrap_or(src).to_string())
}

fn parse_cookies(header: &str) -> Vec<Cookie> {
    header
        .split(';')
        .filter_map(|pair| pair.split_once('='))
        .map(|(name, value)| Cookie::new(name.trim(), value.trim()))
        .collect()
}
