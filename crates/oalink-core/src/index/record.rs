use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::{ElementKind, SpecElement};

/// An indexed element and the project-relative file it was extracted from.
///
/// On the wire this is one flat JSON object tagged by `kind`:
/// `{"kind":"operation","operationId":..,"path":..,"method":..,"tags":[..],"filePath":..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRecord {
    #[serde(flatten)]
    pub element: SpecElement,
    #[serde(rename = "filePath")]
    pub file_path: String,
}

impl IndexRecord {
    pub fn new(element: SpecElement, file_path: impl Into<String>) -> Self {
        Self {
            element,
            file_path: file_path.into(),
        }
    }

    pub fn key(&self) -> IndexKey {
        IndexKey::new(self.element.kind(), self.element.identifier())
    }
}

/// `kind:identifier`, the namespace records are looked up under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexKey {
    pub kind: ElementKind,
    pub identifier: String,
}

impl IndexKey {
    pub fn new(kind: ElementKind, identifier: impl Into<String>) -> Self {
        Self {
            kind,
            identifier: identifier.into(),
        }
    }

    pub fn operation(operation_id: impl Into<String>) -> Self {
        Self::new(ElementKind::Operation, operation_id)
    }

    pub fn component(name: impl Into<String>) -> Self {
        Self::new(ElementKind::Component, name)
    }

    pub fn tag(name: impl Into<String>) -> Self {
        Self::new(ElementKind::Tag, name)
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.identifier)
    }
}

impl FromStr for IndexKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, identifier) = s
            .split_once(':')
            .ok_or_else(|| format!("index key without kind: {s}"))?;
        Ok(Self::new(kind.parse()?, identifier))
    }
}
