use indexmap::IndexMap;
use serde::Deserialize;

/// A Postman variable, as found in collections, folders and environments.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Variable {
    /// The variable name (`key`, or `id` in older collections).
    #[serde(alias = "id")]
    pub key: String,
    /// The value, absent for declared-only variables.
    #[serde(default, deserialize_with = "super::string_value")]
    pub value: Option<String>,
    /// Disabled variables are not bound.
    #[serde(default)]
    pub disabled: bool,
}

impl Variable {
    /// A bound variable.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
            disabled: false,
        }
    }

    /// A declared variable without value.
    pub fn declared(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
            disabled: false,
        }
    }
}

/// A level of variable bindings: globals, environment, collection, folder...
///
/// Lookups go from the innermost scope to its parents. The parent is only
/// borrowed: scopes live on the stack of the collection walk.
#[derive(Debug, Clone, Default)]
pub struct LexicalScope<'p> {
    id: String,
    variables: IndexMap<String, Option<String>>,
    parent: Option<&'p LexicalScope<'p>>,
}

impl<'p> LexicalScope<'p> {
    /// Creates a root scope.
    pub fn new(id: impl Into<String>, variables: &[Variable]) -> Self {
        Self {
            id: id.into(),
            variables: Self::bindings(variables),
            parent: None,
        }
    }

    /// Creates a scope nested in `parent`.
    pub fn nested(id: impl Into<String>, variables: &[Variable], parent: &'p LexicalScope<'p>) -> Self {
        Self {
            id: id.into(),
            variables: Self::bindings(variables),
            parent: Some(parent),
        }
    }

    fn bindings(variables: &[Variable]) -> IndexMap<String, Option<String>> {
        variables
            .iter()
            .filter(|variable| !variable.disabled)
            .map(|variable| (variable.key.clone(), variable.value.clone()))
            .collect()
    }

    /// The scope identifier, e.g. the folder name.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The enclosing scope.
    pub fn parent(&self) -> Option<&'p LexicalScope<'p>> {
        self.parent
    }

    /// Finds the innermost binding of `name`.
    ///
    /// `Some(None)` is a declared variable without value.
    pub fn find(&self, name: &str) -> Option<Option<&str>> {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if let Some(value) = current.variables.get(name) {
                return Some(value.as_deref());
            }
            scope = current.parent;
        }
        None
    }

    /// Finds the binding of `name` in this scope only, ignoring parents.
    pub fn find_local(&self, name: &str) -> Option<Option<&str>> {
        self.variables.get(name).map(Option::as_deref)
    }

    /// Whether `name` is bound in this scope or a parent.
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }
}
