//! `{{variable}}` substitution.
//!
//! ```rust
//! use harspec_core::postman::{EnvVariableParser, LexicalScope, Variable, VariableParser};
//! use harspec_core::DynamicGenerators;
//!
//! let generators = DynamicGenerators::default();
//! let parser = EnvVariableParser::new(&generators);
//! let scope = LexicalScope::new("env", &[
//!     Variable::new("baseUrl", "https://{{host}}"),
//!     Variable::new("host", "test.com"),
//! ]);
//!
//! assert_eq!(parser.parse("{{baseUrl}}/api/v1", &scope).unwrap(), "https://test.com/api/v1");
//!
//! let error = parser.parse("{{missing}}", &scope).unwrap_err();
//! assert_eq!(error.to_string(), "Undefined variable: `missing`");
//! ```

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::generators::DynamicGenerators;
use super::scope::{LexicalScope, Variable};
use crate::error::VariableError;

/// `{{name}}`, without nested braces.
static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(?<name>[^{}]+?)}}").expect("a valid regex"));

/// `:name` path segments.
static SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?<prefix>^|/):(?<name>[A-Za-z_][A-Za-z0-9_.\-]*)").expect("a valid regex")
});

/// Dynamic values generated while resolving one template, or one request.
///
/// Sharing it between parse calls gives every occurrence of a dynamic
/// variable the same value.
#[derive(Debug, Clone, Default)]
pub struct DynamicValues {
    generated: HashMap<String, String>,
}

impl DynamicValues {
    /// The value generated for `name`, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.generated.get(name).map(String::as_str)
    }
}

/// Substitutes variables of a template with the bindings of a scope chain.
pub trait VariableParser {
    /// Substitutes every `{{name}}` of `input`, with fresh dynamic values.
    ///
    /// # Errors
    ///
    /// Fails on undefined or cyclic variables.
    fn parse(&self, input: &str, scope: &LexicalScope<'_>) -> Result<String, VariableError> {
        self.parse_with(input, scope, &mut DynamicValues::default())
    }

    /// Substitutes every `{{name}}` of `input`, reusing and recording dynamic values in `values`.
    ///
    /// # Errors
    ///
    /// Fails on undefined or cyclic variables.
    fn parse_with(
        &self,
        input: &str,
        scope: &LexicalScope<'_>,
        values: &mut DynamicValues,
    ) -> Result<String, VariableError>;
}

/// One substitution run.
struct Resolution<'r, 's> {
    generators: &'r DynamicGenerators,
    scope: &'r LexicalScope<'s>,
    values: &'r mut DynamicValues,
    visiting: Vec<String>,
}

impl Resolution<'_, '_> {
    fn substitute(&mut self, input: &str) -> Result<String, VariableError> {
        let mut result = String::with_capacity(input.len());
        let mut last = 0;
        for captures in TOKEN.captures_iter(input) {
            let (Some(token), Some(name)) = (captures.get(0), captures.name("name")) else {
                continue;
            };
            result.push_str(input.get(last..token.start()).unwrap_or_default());
            result.push_str(&self.resolve(name.as_str().trim(), token.as_str())?);
            last = token.end();
        }
        result.push_str(input.get(last..).unwrap_or_default());
        Ok(result)
    }

    fn resolve(&mut self, name: &str, token: &str) -> Result<String, VariableError> {
        if self.generators.contains(name) {
            if let Some(value) = self.values.get(name) {
                return Ok(value.to_string());
            }
            let value = self.generators.generate(name).unwrap_or_default();
            self.values.generated.insert(name.to_string(), value.clone());
            return Ok(value);
        }

        let scope = self.scope;
        match scope.find(name) {
            None => Err(VariableError::UndefinedVariable {
                name: name.to_string(),
            }),
            Some(None) => Ok(token.to_string()),
            Some(Some(value)) => {
                if self.visiting.iter().any(|visited| visited == name) {
                    let mut chain = self.visiting.clone();
                    chain.push(name.to_string());
                    return Err(VariableError::CyclicVariable { chain });
                }
                self.visiting.push(name.to_string());
                let result = self.substitute(value);
                self.visiting.pop();
                result
            }
        }
    }
}

/// Parser of environment-like strings: headers, bodies, auth values...
#[derive(Debug, Clone, Copy)]
pub struct EnvVariableParser<'g> {
    generators: &'g DynamicGenerators,
}

impl<'g> EnvVariableParser<'g> {
    /// Creates a parser with the given dynamic generators.
    pub fn new(generators: &'g DynamicGenerators) -> Self {
        Self { generators }
    }
}

impl VariableParser for EnvVariableParser<'_> {
    fn parse_with(
        &self,
        input: &str,
        scope: &LexicalScope<'_>,
        values: &mut DynamicValues,
    ) -> Result<String, VariableError> {
        if input.is_empty() {
            return Ok(String::new());
        }
        let mut resolution = Resolution {
            generators: self.generators,
            scope,
            values,
            visiting: Vec::new(),
        };
        resolution.substitute(input)
    }
}

/// Parser of URLs: `{{name}}` variables, then `:name` path segments.
///
/// Segments are only bound by the innermost scope, the URL variables.
/// Segments without binding are left untouched.
#[derive(Debug, Clone, Copy)]
pub struct UrlVariableParser<'g> {
    env: EnvVariableParser<'g>,
}

impl<'g> UrlVariableParser<'g> {
    /// Creates a parser with the given dynamic generators.
    pub fn new(generators: &'g DynamicGenerators) -> Self {
        Self {
            env: EnvVariableParser::new(generators),
        }
    }
}

impl VariableParser for UrlVariableParser<'_> {
    fn parse_with(
        &self,
        input: &str,
        scope: &LexicalScope<'_>,
        values: &mut DynamicValues,
    ) -> Result<String, VariableError> {
        let substituted = self.env.parse_with(input, scope, values)?;

        let mut error = None;
        let result = SEGMENT.replace_all(&substituted, |captures: &Captures| {
            let whole = captures.get(0).map_or("", |whole| whole.as_str()).to_string();
            let prefix = captures.name("prefix").map_or("", |prefix| prefix.as_str());
            let name = captures.name("name").map_or("", |name| name.as_str());
            match scope.find_local(name) {
                Some(Some(value)) => match self.env.parse_with(value, scope, values) {
                    Ok(value) => format!("{prefix}{value}"),
                    Err(cause) => {
                        error.get_or_insert(cause);
                        whole
                    }
                },
                _ => whole,
            }
        });
        match error {
            Some(error) => Err(error),
            None => Ok(result.into_owned()),
        }
    }
}

/// A parser bound to its own variables, nested in the scope given at parse time.
#[derive(Debug, Clone)]
pub struct ScopedParser<P> {
    parser: P,
    id: String,
    variables: Vec<Variable>,
}

impl<P: VariableParser> ScopedParser<P> {
    /// Parses `input` in a scope made of the bound variables over `parent`.
    ///
    /// # Errors
    ///
    /// Fails on undefined or cyclic variables.
    pub fn parse(&self, input: &str, parent: &LexicalScope<'_>) -> Result<String, VariableError> {
        self.parse_with(input, parent, &mut DynamicValues::default())
    }

    /// Like [`ScopedParser::parse`], sharing dynamic values with other calls.
    ///
    /// # Errors
    ///
    /// Fails on undefined or cyclic variables.
    pub fn parse_with(
        &self,
        input: &str,
        parent: &LexicalScope<'_>,
        values: &mut DynamicValues,
    ) -> Result<String, VariableError> {
        let scope = LexicalScope::nested(self.id.clone(), &self.variables, parent);
        self.parser.parse_with(input, &scope, values)
    }
}

/// Creates parsers sharing the same dynamic generators.
#[derive(Debug, Clone, Copy)]
pub struct VariableParserFactory<'g> {
    generators: &'g DynamicGenerators,
}

impl<'g> VariableParserFactory<'g> {
    /// Creates a factory.
    pub fn new(generators: &'g DynamicGenerators) -> Self {
        Self { generators }
    }

    /// An environment parser bound to `variables`.
    pub fn create_env_variable_parser(&self, variables: &[Variable]) -> ScopedParser<EnvVariableParser<'g>> {
        ScopedParser {
            parser: EnvVariableParser::new(self.generators),
            id: "env".to_string(),
            variables: variables.to_vec(),
        }
    }

    /// A URL parser bound to `variables`, typically the URL path variables.
    pub fn create_url_variable_parser(&self, variables: &[Variable]) -> ScopedParser<UrlVariableParser<'g>> {
        ScopedParser {
            parser: UrlVariableParser::new(self.generators),
            id: "url".to_string(),
            variables: variables.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_parse(input: &str, variables: &[Variable]) -> Result<String, VariableError> {
        let generators = DynamicGenerators::default();
        let scope = LexicalScope::new("", variables);
        EnvVariableParser::new(&generators).parse(input, &scope)
    }

    #[test]
    fn should_keep_declared_variable_without_value() {
        assert_eq!(
            env_parse("{{baseUrl}}", &[Variable::declared("baseUrl")]),
            Ok("{{baseUrl}}".to_string())
        );
    }

    #[test]
    fn should_return_input_without_tokens() {
        assert_eq!(env_parse("", &[]), Ok(String::new()));
        assert_eq!(env_parse("plain {text}", &[]), Ok("plain {text}".to_string()));
    }

    #[test]
    fn should_memoize_dynamic_values_per_parse() {
        let generators = DynamicGenerators::seeded(3);
        let scope = LexicalScope::new("", &[Variable::new("id", "{{$guid}}")]);
        let parser = EnvVariableParser::new(&generators);

        let value = parser.parse("{{$guid}}|{{id}}", &scope).expect("a value");
        let other = parser.parse("{{$guid}}", &scope).expect("a value");

        let (first, second) = value.split_once('|').expect("two values");
        assert_eq!(first, second);
        assert_ne!(first, other);
    }

    #[test]
    fn should_detect_cycles() {
        let error = env_parse(
            "{{a}}",
            &[Variable::new("a", "x{{b}}"), Variable::new("b", "{{a}}")],
        )
        .expect_err("a cycle");

        insta::assert_snapshot!(error, @"Cyclic variable reference: `a` -> `b` -> `a`");
    }

    #[test]
    fn should_allow_repeated_non_cyclic_references() {
        assert_eq!(
            env_parse(
                "{{a}}-{{a}}",
                &[Variable::new("a", "{{b}}{{b}}"), Variable::new("b", "x")]
            ),
            Ok("xx-xx".to_string())
        );
    }

    #[test]
    fn should_substitute_url_segments() {
        let generators = DynamicGenerators::default();
        let root = LexicalScope::new("collection", &[Variable::new("baseUrl", "https://api.test:8443")]);
        let parser = VariableParserFactory::new(&generators)
            .create_url_variable_parser(&[Variable::new("petId", "{{$randomInt}}"), Variable::declared("kind")]);

        let url = parser
            .parse("{{baseUrl}}/pets/:petId/:kind/:unknown", &root)
            .expect("a url");

        let pattern = Regex::new(r"^https://api\.test:8443/pets/\d{1,4}/:kind/:unknown$").expect("a valid regex");
        assert!(pattern.is_match(&url), "unexpected url {url}");
    }

    #[test]
    fn should_share_dynamic_values_between_url_and_segments() {
        let generators = DynamicGenerators::seeded(1);
        let parser = VariableParserFactory::new(&generators)
            .create_url_variable_parser(&[Variable::new("id", "{{$guid}}")]);

        let url = parser
            .parse("{{$guid}}/:id", &LexicalScope::default())
            .expect("a url");

        let (first, second) = url.split_once('/').expect("two segments");
        assert_eq!(first, second);
    }

    #[test]
    fn should_share_dynamic_values_between_parse_calls() {
        let generators = DynamicGenerators::seeded(5);
        let parser = EnvVariableParser::new(&generators);
        let scope = LexicalScope::default();
        let mut values = DynamicValues::default();

        let header = parser.parse_with("{{$guid}}", &scope, &mut values).expect("a value");
        let query = parser.parse_with("id={{$guid}}", &scope, &mut values).expect("a value");

        assert_eq!(query, format!("id={header}"));
        assert_eq!(values.get("$guid"), Some(header.as_str()));
    }

    #[test]
    fn should_only_bind_segments_from_url_variables() {
        let generators = DynamicGenerators::default();
        let collection = LexicalScope::new("collection", &[Variable::new("version", "v9")]);
        let parser = VariableParserFactory::new(&generators)
            .create_url_variable_parser(&[Variable::new("id", "7")]);

        let url = parser
            .parse("https://api.test/:version/items/:id?v={{version}}", &collection)
            .expect("a url");

        assert_eq!(url, "https://api.test/:version/items/7?v=v9");
    }
}
