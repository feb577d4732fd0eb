//! Reconciles an operation identity with candidate code symbols.
//!
//! A symbol matches an operation when its operation annotation (if any) agrees with the
//! operation and its HTTP-mapping annotation routes the same method and path. On top of
//! that, [`OperationMatcher::resolve_best_method`] understands generator conventions:
//! keyword-escaped names, delegate classes and overriding implementations.

use std::collections::{HashSet, VecDeque};

use crate::config::MatcherConfig;
use crate::model::{AnnotationAttributes, ApiOperation, CandidateClass, CandidateSymbol, HttpMethod};
use crate::symbols::SymbolSource;

/// Shorthand mapping annotations and the method each implies.
const SHORTHAND_MAPPINGS: [(&str, HttpMethod); 5] = [
    ("PutMapping", HttpMethod::Put),
    ("PostMapping", HttpMethod::Post),
    ("GetMapping", HttpMethod::Get),
    ("DeleteMapping", HttpMethod::Delete),
    ("PatchMapping", HttpMethod::Patch),
];

/// The route an HTTP-mapping annotation declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpMapping {
    pub method: Option<String>,
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct OperationMatcher {
    config: MatcherConfig,
}

impl OperationMatcher {
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Whether `symbol` implements `operation`.
    pub fn matches(&self, symbol: &CandidateSymbol, operation: &ApiOperation) -> bool {
        let Some(mapping) = self.http_mapping(symbol) else {
            log::debug!("{} has no HTTP mapping annotation", symbol.simple_name);
            return false;
        };

        if let Some(annotation) = symbol.annotation(&self.config.operation_annotation) {
            if !operation_annotation_agrees(annotation, operation) {
                log::debug!(
                    "{} is annotated for another operation than {}",
                    symbol.simple_name,
                    operation.operation_id
                );
                return false;
            }
        }

        let (Some(method), Some(path)) = (mapping.method, mapping.path) else {
            log::debug!("{} maps no complete route", symbol.simple_name);
            return false;
        };
        method.eq_ignore_ascii_case(operation.method.as_str())
            && (path == operation.path || !operation.path.starts_with('/'))
    }

    /// Method and path declared by the first HTTP-mapping annotation of `symbol`.
    ///
    /// The generic mapping wins over the shorthands. Its `method` attribute may be a list and
    /// may carry a `RequestMethod.` prefix; shorthands imply their method.
    pub fn http_mapping(&self, symbol: &CandidateSymbol) -> Option<HttpMapping> {
        if let Some(attrs) = symbol.annotation(&self.config.request_mapping_annotation) {
            return Some(HttpMapping {
                method: attrs
                    .get("method")
                    .and_then(|v| v.first())
                    .map(strip_method_prefix),
                path: mapping_path(attrs),
            });
        }
        SHORTHAND_MAPPINGS.iter().find_map(|(name, method)| {
            symbol.annotation(name).map(|attrs| HttpMapping {
                method: Some(
                    attrs
                        .get("method")
                        .and_then(|v| v.first())
                        .map_or_else(|| method.as_str().to_string(), strip_method_prefix),
                ),
                path: mapping_path(attrs),
            })
        })
    }

    /// The member of `class` matching `operation`, named after the operation id or its
    /// keyword-escaped form. An escaped match is swapped for its unescaped sibling.
    pub fn find_method(
        &self,
        class: &CandidateClass,
        operation: &ApiOperation,
    ) -> Option<CandidateSymbol> {
        let id = operation.operation_id.as_str();
        let escape = self.config.escape_prefix.as_str();
        let escaped = format!("{escape}{id}");

        let found = class
            .methods
            .iter()
            .filter(|m| m.simple_name == id || (!escape.is_empty() && m.simple_name == escaped))
            .find(|m| self.matches(m, operation))?;

        let unescaped = match found.simple_name.strip_prefix(escape) {
            Some(stripped) if !escape.is_empty() => class.methods_named(stripped).next(),
            _ => None,
        };
        Some(unescaped.unwrap_or(found).clone())
    }

    /// [`OperationMatcher::find_method`], then follow the delegate class and overriding
    /// implementations known to `scope`.
    pub fn resolve_best_method(
        &self,
        class: &CandidateClass,
        operation: &ApiOperation,
        scope: &dyn SymbolSource,
    ) -> Option<CandidateSymbol> {
        log::debug!(
            "searching {} for {}",
            class.qualified_name,
            operation.operation_id
        );
        let mut method = self.find_method(class, operation)?;

        if class.has_accessor(&self.config.delegate_accessor) {
            let delegate_name = format!("{}{}", class.qualified_name, self.config.delegate_suffix);
            if let Some(delegated) = scope
                .find_class(&delegate_name)
                .and_then(|delegate| delegate.find_method_by_signature(&method).cloned())
            {
                log::debug!("{} delegates to {delegate_name}", class.qualified_name);
                method = delegated;
            }
        }

        Some(find_override(&method, scope).unwrap_or(method))
    }
}

/// First override of `method` found breadth-first through the subclasses of its owner.
pub fn find_override(method: &CandidateSymbol, scope: &dyn SymbolSource) -> Option<CandidateSymbol> {
    let owner = method.containing_type.as_deref()?;
    let mut visited = HashSet::from([owner.to_string()]);
    let mut pending = VecDeque::from([owner.to_string()]);

    while let Some(current) = pending.pop_front() {
        for subclass in scope.direct_subclasses(&current) {
            if !visited.insert(subclass.qualified_name.clone()) {
                continue;
            }
            if let Some(overriding) = subclass.find_method_by_signature(method) {
                log::debug!(
                    "{} overrides {}.{}",
                    subclass.qualified_name,
                    owner,
                    method.simple_name
                );
                return Some(overriding.clone());
            }
            pending.push_back(subclass.qualified_name);
        }
    }
    None
}

fn operation_annotation_agrees(annotation: &AnnotationAttributes, operation: &ApiOperation) -> bool {
    if let Some(id) = annotation.get("operationId").and_then(|v| v.first()) {
        if id != operation.operation_id {
            return false;
        }
    }
    if let (Some(summary), Some(expected)) = (
        annotation.get("summary").and_then(|v| v.first()),
        operation.summary.as_deref(),
    ) {
        if summary != expected {
            return false;
        }
    }
    if let Some(tags) = annotation.get("tags") {
        let declared = tags.values();
        if !operation.tags.iter().all(|t| declared.contains(&t.as_str())) {
            return false;
        }
    }
    true
}

fn mapping_path(attrs: &AnnotationAttributes) -> Option<String> {
    attrs
        .get("value")
        .or_else(|| attrs.get("path"))
        .and_then(|v| v.first())
        .map(str::to_string)
}

fn strip_method_prefix(raw: &str) -> String {
    let raw = raw.trim();
    let raw = raw.rsplit('.').next().unwrap_or(raw);
    raw.to_string()
}
