use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// A typed annotation attribute value, as produced by a language adapter.
///
/// Values built through [`AnnotationValue::single`], [`AnnotationValue::list`] or
/// deserialization carry no surrounding source quotes: `"/pets"` becomes `/pets`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AnnotationValue {
    Single(String),
    List(Vec<String>),
}

impl<'de> Deserialize<'de> for AnnotationValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Single(String),
            List(Vec<String>),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Single(value) => AnnotationValue::single(value),
            Raw::List(items) => AnnotationValue::list(items),
        })
    }
}

impl AnnotationValue {
    pub fn single(value: impl AsRef<str>) -> Self {
        AnnotationValue::Single(unquote(value.as_ref()).to_string())
    }

    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        AnnotationValue::List(
            items
                .into_iter()
                .map(|item| unquote(item.as_ref()).to_string())
                .collect(),
        )
    }

    /// The same value with source quotes removed.
    pub fn unquoted(self) -> Self {
        match self {
            AnnotationValue::Single(value) => AnnotationValue::single(value),
            AnnotationValue::List(items) => AnnotationValue::list(items),
        }
    }

    /// The value itself, or the first element of a list.
    pub fn first(&self) -> Option<&str> {
        match self {
            AnnotationValue::Single(s) => Some(s),
            AnnotationValue::List(items) => items.first().map(String::as_str),
        }
    }

    pub fn values(&self) -> Vec<&str> {
        match self {
            AnnotationValue::Single(s) => vec![s.as_str()],
            AnnotationValue::List(items) => items.iter().map(String::as_str).collect(),
        }
    }
}

/// Attribute name -> value, for one annotation.
pub type AnnotationAttributes = IndexMap<String, AnnotationValue>;

/// Annotation name -> attributes. Names may be qualified or simple.
pub type Annotations = IndexMap<String, AnnotationAttributes>;

/// What kind of code unit a symbol is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    #[default]
    Method,
    Function,
    Class,
}

/// The projection of a code unit the core works with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateSymbol {
    pub simple_name: String,
    /// Qualified name of the enclosing class, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub containing_type: Option<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub annotations: Annotations,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
    pub kind: SymbolKind,
    /// Parameter types, compared for "same signature" checks.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameter_types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl CandidateSymbol {
    pub fn method(name: impl Into<String>) -> Self {
        Self {
            simple_name: name.into(),
            kind: SymbolKind::Method,
            ..Self::default()
        }
    }

    pub fn function(name: impl Into<String>) -> Self {
        Self {
            simple_name: name.into(),
            kind: SymbolKind::Function,
            ..Self::default()
        }
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self {
            simple_name: name.into(),
            kind: SymbolKind::Class,
            ..Self::default()
        }
    }

    pub fn in_type(mut self, qualified: impl Into<String>) -> Self {
        self.containing_type = Some(qualified.into());
        self
    }

    pub fn with_annotation<I, K>(mut self, name: impl Into<String>, attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, AnnotationValue)>,
        K: Into<String>,
    {
        self.annotations.insert(
            name.into(),
            attributes
                .into_iter()
                .map(|(k, v)| (k.into(), v.unquoted()))
                .collect(),
        );
        self
    }

    pub fn with_raw_text(mut self, text: impl Into<String>) -> Self {
        self.raw_text = Some(text.into());
        self
    }

    pub fn with_parameters<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameter_types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn in_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Find an annotation by simple name; qualified names match on their last segment.
    pub fn annotation(&self, simple_name: &str) -> Option<&AnnotationAttributes> {
        self.annotations
            .iter()
            .find(|(name, _)| annotation_simple_name(name) == simple_name)
            .map(|(_, attrs)| attrs)
    }

    pub fn has_annotation(&self, simple_name: &str) -> bool {
        self.annotation(simple_name).is_some()
    }

    /// Iterate annotations as `(simple name, attributes)`.
    pub fn annotations_by_simple_name(
        &self,
    ) -> impl Iterator<Item = (&str, &AnnotationAttributes)> {
        self.annotations
            .iter()
            .map(|(name, attrs)| (annotation_simple_name(name), attrs))
    }

    pub fn same_signature(&self, other: &CandidateSymbol) -> bool {
        self.simple_name == other.simple_name && self.parameter_types == other.parameter_types
    }
}

/// `"/pets"` or `'/pets'` as written in source -> `/pets`.
fn unquote(value: &str) -> &str {
    let value = value.trim();
    for quote in ['"', '\'', '`'] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

/// `io.swagger.v3.oas.annotations.Operation` -> `Operation`.
pub fn annotation_simple_name(name: &str) -> &str {
    let name = name.trim_start_matches('@');
    name.rsplit('.').next().unwrap_or(name)
}

/// A class as seen through the adapter layer: its own symbol plus members.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateClass {
    pub qualified_name: String,
    pub symbol: CandidateSymbol,
    pub methods: Vec<CandidateSymbol>,
    /// Qualified names of directly extended or implemented types.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub supertypes: Vec<String>,
}

impl CandidateClass {
    pub fn new(qualified_name: impl Into<String>) -> Self {
        let qualified_name = qualified_name.into();
        let simple = qualified_name
            .rsplit('.')
            .next()
            .unwrap_or(&qualified_name)
            .to_string();
        Self {
            symbol: CandidateSymbol::class(simple),
            qualified_name,
            methods: Vec::new(),
            supertypes: Vec::new(),
        }
    }

    pub fn simple_name(&self) -> &str {
        &self.symbol.simple_name
    }

    /// Add a member; its `containing_type` and `file` default to this class's.
    pub fn with_method(mut self, method: CandidateSymbol) -> Self {
        let mut method = method;
        if method.containing_type.is_none() {
            method.containing_type = Some(self.qualified_name.clone());
        }
        if method.file.is_none() {
            method.file = self.symbol.file.clone();
        }
        self.methods.push(method);
        self
    }

    pub fn with_annotation<I, K>(mut self, name: impl Into<String>, attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, AnnotationValue)>,
        K: Into<String>,
    {
        self.symbol = self.symbol.with_annotation(name, attributes);
        self
    }

    pub fn extending(mut self, supertype: impl Into<String>) -> Self {
        self.supertypes.push(supertype.into());
        self
    }

    pub fn in_file(mut self, file: impl Into<PathBuf>) -> Self {
        let file = file.into();
        for method in &mut self.methods {
            if method.file.is_none() {
                method.file = Some(file.clone());
            }
        }
        self.symbol.file = Some(file);
        self
    }

    pub fn methods_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a CandidateSymbol> {
        self.methods.iter().filter(move |m| m.simple_name == name)
    }

    pub fn find_method_by_signature(&self, like: &CandidateSymbol) -> Option<&CandidateSymbol> {
        self.methods.iter().find(|m| m.same_signature(like))
    }

    /// Whether a zero-argument method named `name` exists.
    pub fn has_accessor(&self, name: &str) -> bool {
        self.methods
            .iter()
            .any(|m| m.simple_name == name && m.parameter_types.is_empty())
    }
}
