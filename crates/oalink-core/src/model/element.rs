use std::fmt;
use std::str::FromStr;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
    Trace,
}

impl HttpMethod {
    /// Every method, in the order path items are scanned.
    pub const ALL: [HttpMethod; 8] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Patch,
        HttpMethod::Head,
        HttpMethod::Options,
        HttpMethod::Trace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Trace => "TRACE",
        }
    }

    /// The key used for this method inside an OpenAPI path item.
    pub fn path_item_key(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Delete => "delete",
            HttpMethod::Patch => "patch",
            HttpMethod::Head => "head",
            HttpMethod::Options => "options",
            HttpMethod::Trace => "trace",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    /// Case-insensitive; `"get"`, `"Get"` and `"GET"` are all accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HttpMethod::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown HTTP method: {s}"))
    }
}

/// One HTTP method bound to one path, identified by its `operationId`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiOperation {
    #[serde(rename = "operationId")]
    pub operation_id: String,
    pub path: String,
    pub method: HttpMethod,
    #[serde(default)]
    pub tags: IndexSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl ApiOperation {
    pub fn new(path: impl Into<String>, method: HttpMethod, operation_id: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method,
            tags: IndexSet::new(),
            operation_id: operation_id.into(),
            summary: None,
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }
}

/// A reusable schema definition under `components/schemas`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiComponent {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
}

/// A tag declared at the document's top level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiTag {
    pub name: String,
}

/// An identifiable element extracted from a spec document.
///
/// Serialized tagged by `kind`, with the same discriminators as [`ElementKind`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum SpecElement {
    #[serde(rename = "operation")]
    Operation(ApiOperation),
    #[serde(rename = "component")]
    Component(ApiComponent),
    #[serde(rename = "tags")]
    Tag(ApiTag),
}

impl SpecElement {
    pub fn kind(&self) -> ElementKind {
        match self {
            SpecElement::Operation(_) => ElementKind::Operation,
            SpecElement::Component(_) => ElementKind::Component,
            SpecElement::Tag(_) => ElementKind::Tag,
        }
    }

    /// The natural key of the element within its kind.
    pub fn identifier(&self) -> &str {
        match self {
            SpecElement::Operation(op) => &op.operation_id,
            SpecElement::Component(c) => &c.name,
            SpecElement::Tag(t) => &t.name,
        }
    }
}

/// Discriminator of [`SpecElement`] and of index keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ElementKind {
    #[serde(rename = "operation")]
    Operation,
    #[serde(rename = "component")]
    Component,
    #[serde(rename = "tags")]
    Tag,
}

impl ElementKind {
    /// Namespace prefix used in index keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Operation => "operation",
            ElementKind::Component => "component",
            ElementKind::Tag => "tags",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "operation" => Ok(ElementKind::Operation),
            "component" => Ok(ElementKind::Component),
            "tags" | "tag" => Ok(ElementKind::Tag),
            other => Err(format!("unknown element kind: {other}")),
        }
    }
}
