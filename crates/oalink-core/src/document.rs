//! Generic, addressable view of a spec file.
//!
//! YAML and JSON documents are both loaded into a [`serde_yaml_ng::Value`] tree so every
//! structural walk works the same regardless of the source format. Mapping order is the
//! order of the file.

use std::ops::ControlFlow;
use std::path::{Component, Path, PathBuf};

use serde_yaml_ng::Value;
use sha2::{Digest, Sha256};

use crate::error::ParseError;
use crate::model::DocumentPath;

/// A parsed spec file.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecDocument {
    path: PathBuf,
    root: Value,
    content_hash: String,
}

impl SpecDocument {
    /// Parse `content` as if it had been read from `path`.
    pub fn parse(path: &Path, content: &str) -> Result<Self, ParseError> {
        let root: Value = if is_json(path) {
            serde_json::from_str(content)?
        } else {
            serde_yaml_ng::from_str(content)?
        };
        Ok(Self {
            path: normalize_path(path),
            root,
            content_hash: content_hash(content.as_bytes()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory that relative `$ref`s in this document are resolved against.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    /// Exact navigation: every segment must be a direct child key.
    pub fn get(&self, path: &DocumentPath) -> Option<&Value> {
        get_path(&self.root, path)
    }

    /// Exact navigation returning an owned node.
    pub fn node(&self, path: &DocumentPath) -> Option<SpecNode> {
        self.get(path).map(|value| self.node_at(path.clone(), value))
    }

    pub(crate) fn node_at(&self, path: DocumentPath, value: &Value) -> SpecNode {
        SpecNode {
            file: self.path.clone(),
            path,
            value: value.clone(),
        }
    }
}

/// A located node: which file, where in it, and what it holds.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecNode {
    pub file: PathBuf,
    pub path: DocumentPath,
    pub value: Value,
}

impl SpecNode {
    /// The key this node is stored under in its parent.
    pub fn key(&self) -> Option<&str> {
        self.path.last()
    }

    pub fn as_str(&self) -> Option<&str> {
        untag(&self.value).as_str()
    }
}

/// Text of a mapping key. Scalar keys such as `200` are rendered as strings.
pub fn key_text(key: &Value) -> Option<String> {
    match untag(key) {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Strip YAML tags (`!Ref foo`) so walks see the tagged value.
pub fn untag(value: &Value) -> &Value {
    match value {
        Value::Tagged(tagged) => untag(&tagged.value),
        other => other,
    }
}

/// Direct child of a mapping by key text.
pub fn get_key<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    untag(value)
        .as_mapping()?
        .iter()
        .find(|(k, _)| key_text(k).as_deref() == Some(key))
        .map(|(_, v)| v)
}

/// Follow `path` through direct children only. Sequence items are addressed by index.
pub fn get_path<'a>(root: &'a Value, path: &DocumentPath) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.segments() {
        current = match untag(current) {
            Value::Sequence(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => get_key(current, segment)?,
        };
    }
    Some(current)
}

/// The `$ref` string of a node, if the node is a reference object.
pub fn ref_of(value: &Value) -> Option<&str> {
    get_key(value, "$ref").and_then(|v| untag(v).as_str())
}

/// Depth-first, pre-order walk over `value` and all its descendants.
///
/// `visit` receives the path of each node (relative to the document root, starting from
/// `base`) and the node. Sequence items are addressed by index. Returning
/// `ControlFlow::Break` stops the walk and propagates the value.
pub fn walk<'a, B>(
    value: &'a Value,
    base: &DocumentPath,
    visit: &mut dyn FnMut(&DocumentPath, &'a Value) -> ControlFlow<B>,
) -> ControlFlow<B> {
    visit(base, value)?;
    match untag(value) {
        Value::Mapping(map) => {
            for (k, v) in map {
                let Some(key) = key_text(k) else { continue };
                walk(v, &base.child(key), visit)?;
            }
        }
        Value::Sequence(items) => {
            for (i, item) in items.iter().enumerate() {
                walk(item, &base.child(i.to_string()), visit)?;
            }
        }
        _ => {}
    }
    ControlFlow::Continue(())
}

/// First descendant of `value` (excluding `value` itself) satisfying `predicate`.
pub fn find_first<'a>(
    value: &'a Value,
    base: &DocumentPath,
    predicate: &dyn Fn(&DocumentPath, &Value) -> bool,
) -> Option<(DocumentPath, &'a Value)> {
    let depth = base.len();
    let found = walk(value, base, &mut |path, node| {
        if path.len() > depth && predicate(path, node) {
            ControlFlow::Break((path.clone(), node))
        } else {
            ControlFlow::Continue(())
        }
    });
    match found {
        ControlFlow::Break(hit) => Some(hit),
        ControlFlow::Continue(()) => None,
    }
}

/// Every descendant of `value` satisfying `predicate`, in walk order.
pub fn find_all<'a>(
    value: &'a Value,
    base: &DocumentPath,
    predicate: &dyn Fn(&DocumentPath, &Value) -> bool,
) -> Vec<(DocumentPath, &'a Value)> {
    let depth = base.len();
    let mut hits = Vec::new();
    let _ = walk::<()>(value, base, &mut |path, node| {
        if path.len() > depth && predicate(path, node) {
            hits.push((path.clone(), node));
        }
        ControlFlow::Continue(())
    });
    hits
}

/// SHA-256 hex digest of file content.
pub fn content_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

/// Collapse `.` and `..` components without touching the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out.iter().collect()
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}
