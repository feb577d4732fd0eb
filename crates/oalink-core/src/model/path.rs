use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ResolveError;

/// Ordered key segments addressing a node inside a parsed document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentPath(Vec<String>);

impl DocumentPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Parse a JSON-pointer style fragment (`/paths/~1users/get`).
    ///
    /// A leading `/` is optional and empty segments are dropped.
    pub fn from_pointer(pointer: &str) -> Self {
        Self(
            pointer
                .split('/')
                .filter(|s| !s.is_empty())
                .map(|s| s.replace("~1", "/").replace("~0", "~"))
                .collect(),
        )
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    pub fn parent(&self) -> Option<DocumentPath> {
        if self.0.is_empty() {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].to_vec()))
    }

    pub fn child(&self, segment: impl Into<String>) -> DocumentPath {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    pub fn join(&self, other: &DocumentPath) -> DocumentPath {
        let mut segments = self.0.clone();
        segments.extend(other.0.iter().cloned());
        Self(segments)
    }
}

impl fmt::Display for DocumentPath {
    /// Renders as a JSON pointer; the root renders as an empty string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.0 {
            write!(f, "/{}", segment.replace('~', "~0").replace('/', "~1"))?;
        }
        Ok(())
    }
}

/// A parsed `$ref` value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReferencePointer {
    /// Referenced file, relative to the referencing file. `None` means the same file.
    pub file: Option<PathBuf>,
    pub fragment: DocumentPath,
}

impl ReferencePointer {
    /// Parse `file#/fragment`, `#/fragment` or a bare `file` reference.
    pub fn parse(raw: &str) -> Result<Self, ResolveError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ResolveError::InvalidRefFormat(raw.to_string()));
        }
        let (file, fragment) = match raw.split_once('#') {
            Some((file, fragment)) => (file, fragment),
            None => (raw, ""),
        };
        if fragment.contains('#') {
            return Err(ResolveError::InvalidRefFormat(raw.to_string()));
        }
        Ok(Self {
            file: (!file.is_empty()).then(|| PathBuf::from(file)),
            fragment: DocumentPath::from_pointer(fragment),
        })
    }

    pub fn is_local(&self) -> bool {
        self.file.is_none()
    }
}

impl fmt::Display for ReferencePointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(file) = &self.file {
            write!(f, "{}", file.display())?;
        }
        write!(f, "#{}", self.fragment)
    }
}
