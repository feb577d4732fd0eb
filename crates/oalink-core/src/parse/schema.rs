use serde::Deserialize;

/// The `type` field can be a single type or an array of types.
///
/// Kept as strings so non-standard types (`file`) don't reject the document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TypeSet {
    Single(String),
    Multiple(Vec<String>),
}

impl TypeSet {
    /// The primary type: the single value, or the first non-`null` entry of a list.
    pub fn primary(&self) -> Option<&str> {
        match self {
            TypeSet::Single(t) => Some(t),
            TypeSet::Multiple(types) => types
                .iter()
                .map(String::as_str)
                .find(|t| *t != "null")
                .or_else(|| types.first().map(String::as_str)),
        }
    }
}

/// A reference, an inline schema, or an OpenAPI 3.1 boolean schema.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SchemaOrRef {
    Bool(bool),
    Ref {
        #[serde(rename = "$ref")]
        ref_path: String,
    },
    Schema(Box<Schema>),
}

impl SchemaOrRef {
    pub fn schema_type(&self) -> Option<&str> {
        match self {
            SchemaOrRef::Bool(_) | SchemaOrRef::Ref { .. } => None,
            SchemaOrRef::Schema(schema) => schema.schema_type.as_ref()?.primary(),
        }
    }
}

/// The schema keywords the index records.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Schema {
    #[serde(rename = "type")]
    pub schema_type: Option<TypeSet>,
}
