use indexmap::IndexMap;
use jsonptr::PointerBuf;
use mime::Mime;
use serde_json::{Map, Value};

use super::headers::{FORM_URLENCODED, MULTIPART_FORM_DATA};
use super::uri_template::scalar_to_string;
use super::{ConvertContext, SubConverter};
use crate::error::ConvertError;
use crate::har::{Param, PostData};
use crate::oas::{Location, OasDocument, ParamSampler, SpecVariant, filter_location_params};

/// Boundary of generated multipart bodies.
pub const MULTIPART_BOUNDARY: &str = "956888039105887155673143";

/// A request body candidate, for one media type.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyFragment {
    /// The media type.
    pub mime_type: String,
    /// The explicit or sampled body.
    pub value: Value,
    /// Where the value lives, or would live, in the document.
    pub value_json_pointer: PointerBuf,
    /// Per-field pointers of a body gathered from OAS v2 `formData` parameters.
    pub field_json_pointers: IndexMap<String, PointerBuf>,
}

/// Converts the request body of an operation, one fragment per media type.
#[derive(Debug, Clone, Copy)]
pub struct BodyConverter<'c> {
    context: ConvertContext<'c>,
}

impl<'c> BodyConverter<'c> {
    /// Creates a body converter.
    pub fn new(context: ConvertContext<'c>) -> Self {
        Self { context }
    }

    fn v3_fragments(&self, path: &str, method: &str) -> Result<Vec<BodyFragment>, ConvertError> {
        let operation = self.context.document().operation(path, method)?;
        let Some(content) = operation
            .get("requestBody")
            .and_then(|body| body.get("content"))
            .and_then(Value::as_object)
        else {
            return Ok(Vec::new());
        };

        let mut fragments = Vec::with_capacity(content.len());
        for (mime_type, media) in content {
            let mut pointer = OasDocument::operation_pointer(path, method);
            pointer.push_back("requestBody");
            pointer.push_back("content");
            pointer.push_back(mime_type.as_str());

            let first_example = media
                .get("examples")
                .and_then(Value::as_object)
                .and_then(|examples| examples.iter().next())
                .and_then(|(name, example)| example.get("value").map(|value| (name, value)));

            let value = if let Some(example) = media.get("example") {
                pointer.push_back("example");
                example.clone()
            } else if let Some((name, example)) = first_example {
                pointer.push_back("examples");
                pointer.push_back(name.as_str());
                pointer.push_back("value");
                example.clone()
            } else {
                pointer.push_back("schema");
                match media.get("schema") {
                    Some(schema) => self.context.sampler().sample(schema)?,
                    None => Value::Null,
                }
            };

            fragments.push(BodyFragment {
                mime_type: mime_type.clone(),
                value,
                value_json_pointer: pointer,
                field_json_pointers: IndexMap::new(),
            });
        }
        Ok(fragments)
    }

    fn v2_fragments(&self, path: &str, method: &str) -> Result<Vec<BodyFragment>, ConvertError> {
        let document = self.context.document();
        let operation = document.operation(path, method)?;
        let params = document.parameters(path, method)?;
        let consumes = document.consumes(operation);

        let body = filter_location_params(&params, Location::Body);
        let (form_data, body): (Vec<_>, Vec<_>) =
            body.into_iter().partition(|param| param.is_form_data());

        if let Some(param) = body.first() {
            let schema = param.schema.as_ref();
            let value = match schema.and_then(|schema| schema.get("default")) {
                Some(default) => default.clone(),
                None => match schema {
                    Some(schema) => self.context.sampler().sample(schema)?,
                    None => Value::Null,
                },
            };
            let mut pointer = param.pointer.clone();
            pointer.push_back("schema");
            pointer.push_back("default");

            let mime_types = if consumes.is_empty() {
                vec![mime::APPLICATION_JSON.to_string()]
            } else {
                consumes
            };
            return Ok(mime_types
                .into_iter()
                .map(|mime_type| BodyFragment {
                    mime_type,
                    value: value.clone(),
                    value_json_pointer: pointer.clone(),
                    field_json_pointers: IndexMap::new(),
                })
                .collect());
        }

        if form_data.is_empty() {
            return Ok(Vec::new());
        }

        let sampler = ParamSampler::new(self.context.sampler(), SpecVariant::OasV2);
        let mut fields = Map::new();
        let mut field_json_pointers = IndexMap::new();
        for param in form_data {
            let located = sampler.sample_param(param)?;
            fields.insert(param.name.clone(), located.value);
            field_json_pointers.insert(param.name.clone(), located.value_json_pointer);
        }
        let mime_type = if consumes.iter().any(|mime_type| mime_type == MULTIPART_FORM_DATA) {
            MULTIPART_FORM_DATA
        } else {
            FORM_URLENCODED
        };
        let mut pointer = OasDocument::operation_pointer(path, method);
        pointer.push_back("parameters");

        Ok(vec![BodyFragment {
            mime_type: mime_type.to_string(),
            value: Value::Object(fields),
            value_json_pointer: pointer,
            field_json_pointers,
        }])
    }
}

impl SubConverter for BodyConverter<'_> {
    type Output = Vec<BodyFragment>;

    fn convert(&self, path: &str, method: &str) -> Result<Self::Output, ConvertError> {
        match self.context.document().variant() {
            SpecVariant::OasV2 => self.v2_fragments(path, method),
            SpecVariant::OasV3 => self.v3_fragments(path, method),
        }
    }
}

fn form_fields(mime_type: &str, value: &Value) -> Result<Vec<(String, String)>, ConvertError> {
    match value {
        Value::Object(entries) => Ok(entries
            .iter()
            .map(|(key, value)| (key.clone(), scalar_to_string(value)))
            .collect()),
        Value::Null => Ok(Vec::new()),
        other => Err(ConvertError::BodyEncoding {
            mime_type: mime_type.to_string(),
            message: format!("expected an object, got {other}"),
        }),
    }
}

fn form_params(fields: &[(String, String)]) -> Vec<Param> {
    fields
        .iter()
        .map(|(name, value)| Param::value(name, value))
        .collect()
}

/// Encodes form fields as a `multipart/form-data` body.
///
/// File fields are written with their file name and an empty content.
pub fn multipart_post_data(params: Vec<Param>) -> PostData {
    let mut text = String::new();
    for param in &params {
        text.push_str(&format!(
            "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"{}\"",
            param.name
        ));
        if let Some(file_name) = &param.file_name {
            text.push_str(&format!("; filename=\"{file_name}\""));
        }
        if let Some(content_type) = &param.content_type {
            text.push_str(&format!("\r\nContent-Type: {content_type}"));
        }
        text.push_str("\r\n\r\n");
        text.push_str(param.value.as_deref().unwrap_or_default());
        text.push_str("\r\n");
    }
    text.push_str(&format!("--{MULTIPART_BOUNDARY}--"));
    PostData {
        mime_type: format!("{MULTIPART_FORM_DATA}; boundary={MULTIPART_BOUNDARY}"),
        text,
        params: Some(params),
    }
}

/// Encodes a body fragment as HAR post data.
///
/// - JSON media types (`application/json`, `*+json`): serialized JSON
/// - `application/x-www-form-urlencoded`: encoded pairs, plus params
/// - `multipart/form-data`: one part per field, plus params
/// - anything else: strings as they are, other values as JSON
///
/// # Errors
///
/// Fails when a form body is not an object, or when serialization fails.
pub fn post_data(fragment: &BodyFragment) -> Result<PostData, ConvertError> {
    let BodyFragment {
        mime_type, value, ..
    } = fragment;
    let parsed = mime_type.parse::<Mime>().ok();
    let essence = parsed.as_ref().map_or(mime_type.as_str(), Mime::essence_str);

    let is_json = parsed.as_ref().is_some_and(|mime| {
        mime.subtype() == mime::JSON || mime.suffix() == Some(mime::JSON)
    });

    let post_data = if is_json {
        PostData {
            mime_type: mime_type.clone(),
            text: serde_json::to_string(value)?,
            params: None,
        }
    } else if essence == FORM_URLENCODED {
        let fields = form_fields(mime_type, value)?;
        let text = serde_urlencoded::to_string(&fields).map_err(|error| {
            ConvertError::BodyEncoding {
                mime_type: mime_type.clone(),
                message: error.to_string(),
            }
        })?;
        PostData {
            mime_type: mime_type.clone(),
            text,
            params: Some(form_params(&fields)),
        }
    } else if essence == MULTIPART_FORM_DATA {
        let params = form_params(&form_fields(mime_type, value)?);
        multipart_post_data(params)
    } else {
        let text = match value {
            Value::String(text) => text.clone(),
            value => serde_json::to_string(value)?,
        };
        PostData {
            mime_type: mime_type.clone(),
            text,
            params: None,
        }
    };
    Ok(post_data)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::sampler::Sampler;

    fn convert(root: &Value, variant: SpecVariant, path: &str) -> Vec<BodyFragment> {
        let sampler = Sampler::default();
        let context = ConvertContext::new(OasDocument::new(root, variant), &sampler);
        BodyConverter::new(context)
            .convert(path, "post")
            .expect("body fragments")
    }

    fn fragment(mime_type: &str, value: Value) -> BodyFragment {
        BodyFragment {
            mime_type: mime_type.to_string(),
            value,
            value_json_pointer: PointerBuf::new(),
            field_json_pointers: IndexMap::new(),
        }
    }

    #[test]
    fn should_sample_one_fragment_per_v3_media_type() {
        let root = json!({
            "openapi": "3.0.0",
            "paths": {
                "/pets": {
                    "post": {
                        "requestBody": {
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "object",
                                        "required": ["name"],
                                        "properties": { "name": { "type": "string" }, "age": { "type": "integer", "minimum": 1 } }
                                    }
                                },
                                "text/plain": { "example": "hello" }
                            }
                        }
                    }
                }
            }
        });

        let fragments = convert(&root, SpecVariant::OasV3, "/pets");

        let summary = fragments
            .iter()
            .map(|fragment| format!("{} {} {}", fragment.mime_type, fragment.value, fragment.value_json_pointer))
            .collect::<Vec<_>>();
        assert_eq!(
            summary,
            vec![
                r#"application/json {"name":"string","age":1} /paths/~1pets/post/requestBody/content/application~1json/schema"#,
                r#"text/plain "hello" /paths/~1pets/post/requestBody/content/text~1plain/example"#,
            ]
        );
    }

    #[test]
    fn should_expand_v2_body_per_consumed_type() {
        let root = json!({
            "swagger": "2.0",
            "paths": {
                "/pets": {
                    "post": {
                        "consumes": ["application/json", "application/xml"],
                        "parameters": [
                            { "name": "body", "in": "body", "schema": { "type": "object", "default": { "name": "doggie" } } }
                        ]
                    }
                }
            }
        });

        let fragments = convert(&root, SpecVariant::OasV2, "/pets");

        assert_eq!(fragments.len(), 2);
        assert!(fragments.iter().all(|fragment| fragment.value == json!({ "name": "doggie" })));
        assert_eq!(
            fragments.first().map(|fragment| fragment.value_json_pointer.to_string()),
            Some("/paths/~1pets/post/parameters/0/schema/default".to_string())
        );
    }

    #[test]
    fn should_gather_v2_form_data() {
        let root = json!({
            "swagger": "2.0",
            "paths": {
                "/pets": {
                    "post": {
                        "consumes": ["multipart/form-data"],
                        "parameters": [
                            { "name": "name", "in": "formData", "type": "string", "default": "doggie" },
                            { "name": "age", "in": "formData", "type": "integer" }
                        ]
                    }
                }
            }
        });

        let fragments = convert(&root, SpecVariant::OasV2, "/pets");

        assert_eq!(
            fragments,
            vec![BodyFragment {
                mime_type: MULTIPART_FORM_DATA.to_string(),
                value: json!({ "name": "doggie", "age": 42 }),
                value_json_pointer: PointerBuf::from_tokens(["paths", "/pets", "post", "parameters"]),
                field_json_pointers: IndexMap::from([
                    (
                        "name".to_string(),
                        PointerBuf::from_tokens(["paths", "/pets", "post", "parameters", "0", "default"]),
                    ),
                    (
                        "age".to_string(),
                        PointerBuf::from_tokens(["paths", "/pets", "post", "parameters", "1", "default"]),
                    ),
                ]),
            }]
        );
    }

    #[test]
    fn should_encode_json_and_text() {
        let json = post_data(&fragment("application/vnd.api+json", json!({ "id": 1 }))).expect("post data");
        let text = post_data(&fragment("text/plain", json!("hello"))).expect("post data");

        assert_eq!(json.text, r#"{"id":1}"#);
        assert_eq!(text.text, "hello");
    }

    #[test]
    fn should_encode_url_encoded_form() {
        let post_data = post_data(&fragment(FORM_URLENCODED, json!({ "name": "Alex Doe", "age": 42 })))
            .expect("post data");

        assert_eq!(post_data.text, "name=Alex+Doe&age=42");
        assert_eq!(
            post_data.params,
            Some(vec![Param::value("name", "Alex Doe"), Param::value("age", "42")])
        );
    }

    #[test]
    fn should_encode_multipart_form() {
        let post_data = post_data(&fragment(MULTIPART_FORM_DATA, json!({ "name": "doggie" })))
            .expect("post data");

        insta::assert_snapshot!(post_data.mime_type, @"multipart/form-data; boundary=956888039105887155673143");
        assert_eq!(
            post_data.text,
            "--956888039105887155673143\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\ndoggie\r\n--956888039105887155673143--"
        );
    }

    #[test]
    fn should_reject_non_object_form() {
        let error = post_data(&fragment(FORM_URLENCODED, json!([1, 2]))).expect_err("not an object");

        insta::assert_snapshot!(error, @"Cannot encode body as 'application/x-www-form-urlencoded': expected an object, got [1,2]");
    }
}
