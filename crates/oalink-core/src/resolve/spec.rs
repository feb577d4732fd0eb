//! Code -> spec: derive identifiers from a symbol, look them up, pinpoint the spec node.

use std::path::Path;
use std::sync::Arc;

use heck::ToLowerCamelCase;

use crate::config::{MatcherConfig, NamingConfig};
use crate::document::{SpecDocument, SpecNode};
use crate::locate::Locator;
use crate::model::{CandidateSymbol, ElementKind, SpecElement, SymbolKind};

use super::ResolveContext;

/// Resolves one kind of spec element from a code symbol.
pub trait SpecResolver: Send + Sync {
    fn name(&self) -> &'static str;

    /// The kind of index record this resolver looks up.
    fn kind(&self) -> ElementKind;

    /// Identifiers `symbol` may correspond to, most specific first. Empty when the resolver
    /// does not apply to this kind of symbol.
    fn identifiers(&self, symbol: &CandidateSymbol) -> Vec<String>;

    /// The node declaring `element` inside `doc`.
    fn locate(
        &self,
        locator: Locator<'_>,
        doc: &Arc<SpecDocument>,
        element: &SpecElement,
    ) -> Option<SpecNode>;

    fn resolve_spec_element(
        &self,
        ctx: &ResolveContext<'_>,
        symbol: &CandidateSymbol,
    ) -> Vec<SpecNode> {
        let locator = Locator::new(ctx.index.store());
        let mut nodes = Vec::new();
        for identifier in self.identifiers(symbol) {
            for record in ctx.index.lookup(self.kind(), &identifier) {
                let path = ctx.index.absolute(Path::new(&record.file_path));
                let doc = match ctx.index.store().get(&path) {
                    Ok(doc) => doc,
                    Err(e) => {
                        log::debug!("cannot open {} for {identifier}: {e}", record.file_path);
                        continue;
                    }
                };
                if let Some(node) = self.locate(locator, &doc, &record.element) {
                    push_unique(&mut nodes, node);
                }
            }
        }
        log::debug!(
            "{} found {} spec nodes for {}",
            self.name(),
            nodes.len(),
            symbol.simple_name
        );
        nodes
    }
}

/// Operations, by annotated operation id and by symbol name.
///
/// When the annotation and the name disagree both are looked up.
#[derive(Debug, Clone)]
pub struct OperationSpecResolver {
    operation_annotation: String,
    raw_suffix: String,
}

impl OperationSpecResolver {
    pub fn new(matcher: &MatcherConfig, naming: &NamingConfig) -> Self {
        Self {
            operation_annotation: matcher.operation_annotation.clone(),
            raw_suffix: naming.raw_function_suffix.clone(),
        }
    }
}

impl SpecResolver for OperationSpecResolver {
    fn name(&self) -> &'static str {
        "operation"
    }

    fn kind(&self) -> ElementKind {
        ElementKind::Operation
    }

    fn identifiers(&self, symbol: &CandidateSymbol) -> Vec<String> {
        let mut ids = Vec::new();
        match symbol.kind {
            SymbolKind::Class => {}
            SymbolKind::Method => {
                if let Some(id) = symbol
                    .annotation(&self.operation_annotation)
                    .and_then(|attrs| attrs.get("operationId"))
                    .and_then(|v| v.first())
                {
                    push_unique(&mut ids, id.to_string());
                }
                push_unique(&mut ids, symbol.simple_name.clone());
            }
            SymbolKind::Function => {
                let name = symbol.simple_name.as_str();
                let name = if self.raw_suffix.is_empty() {
                    name
                } else {
                    name.strip_suffix(self.raw_suffix.as_str()).unwrap_or(name)
                };
                push_unique(&mut ids, name.to_string());
            }
        }
        ids.retain(|id| !id.is_empty());
        ids
    }

    fn locate(
        &self,
        locator: Locator<'_>,
        doc: &Arc<SpecDocument>,
        element: &SpecElement,
    ) -> Option<SpecNode> {
        let SpecElement::Operation(op) = element else {
            return None;
        };
        locator.find_operation(doc, &op.path, op.method, &op.operation_id)
    }
}

/// Component schemas, by class name.
#[derive(Debug, Clone, Default)]
pub struct ComponentSpecResolver;

impl SpecResolver for ComponentSpecResolver {
    fn name(&self) -> &'static str {
        "component"
    }

    fn kind(&self) -> ElementKind {
        ElementKind::Component
    }

    fn identifiers(&self, symbol: &CandidateSymbol) -> Vec<String> {
        match symbol.kind {
            SymbolKind::Class if !symbol.simple_name.is_empty() => vec![symbol.simple_name.clone()],
            _ => Vec::new(),
        }
    }

    fn locate(
        &self,
        locator: Locator<'_>,
        doc: &Arc<SpecDocument>,
        element: &SpecElement,
    ) -> Option<SpecNode> {
        let SpecElement::Component(component) = element else {
            return None;
        };
        locator.find_component(doc, &component.name)
    }
}

/// Tags, by tag annotation and by class-name heuristics.
#[derive(Debug, Clone)]
pub struct TagSpecResolver {
    tag_annotation: String,
    suffixes: Vec<String>,
    secondary_suffix: String,
}

impl TagSpecResolver {
    pub fn new(matcher: &MatcherConfig, naming: &NamingConfig) -> Self {
        Self {
            tag_annotation: matcher.tag_annotation.clone(),
            suffixes: naming.tag_suffixes.clone(),
            secondary_suffix: naming.secondary_tag_suffix.clone(),
        }
    }

    /// `PetsWsApiController` -> `PetsWs`, `Pets`, `petsWs`.
    pub fn names_from_class(&self, class_name: &str) -> Vec<String> {
        let stripped = self
            .suffixes
            .iter()
            .fold(class_name, |name, suffix| name.strip_suffix(suffix.as_str()).unwrap_or(name));

        let mut names = Vec::new();
        push_unique(&mut names, stripped.to_string());
        if !self.secondary_suffix.is_empty() {
            if let Some(secondary) = stripped.strip_suffix(self.secondary_suffix.as_str()) {
                push_unique(&mut names, secondary.to_string());
            }
        }
        push_unique(&mut names, stripped.to_lower_camel_case());
        names.retain(|n| !n.is_empty());
        names
    }
}

impl SpecResolver for TagSpecResolver {
    fn name(&self) -> &'static str {
        "tag"
    }

    fn kind(&self) -> ElementKind {
        ElementKind::Tag
    }

    fn identifiers(&self, symbol: &CandidateSymbol) -> Vec<String> {
        if symbol.kind != SymbolKind::Class {
            return Vec::new();
        }
        let mut names = Vec::new();
        if let Some(name) = symbol
            .annotation(&self.tag_annotation)
            .and_then(|attrs| attrs.get("name"))
            .and_then(|v| v.first())
        {
            push_unique(&mut names, name.to_string());
        }
        for name in self.names_from_class(&symbol.simple_name) {
            push_unique(&mut names, name);
        }
        names
    }

    fn locate(
        &self,
        _locator: Locator<'_>,
        doc: &Arc<SpecDocument>,
        element: &SpecElement,
    ) -> Option<SpecNode> {
        let SpecElement::Tag(tag) = element else {
            return None;
        };
        Locator::find_tag(doc, &tag.name)
    }
}

/// Every spec resolver, in lookup order.
pub struct SpecResolvers {
    resolvers: Vec<Box<dyn SpecResolver>>,
}

impl SpecResolvers {
    /// Operation, component and tag resolvers, in that order.
    pub fn new(matcher: &MatcherConfig, naming: &NamingConfig) -> Self {
        Self {
            resolvers: vec![
                Box::new(OperationSpecResolver::new(matcher, naming)),
                Box::new(ComponentSpecResolver),
                Box::new(TagSpecResolver::new(matcher, naming)),
            ],
        }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.resolvers.iter().map(|r| r.name()).collect()
    }

    /// Results of every resolver, concatenated; equal nodes are reported once.
    pub fn resolve(&self, ctx: &ResolveContext<'_>, symbol: &CandidateSymbol) -> Vec<SpecNode> {
        let mut nodes = Vec::new();
        for resolver in &self.resolvers {
            for node in resolver.resolve_spec_element(ctx, symbol) {
                push_unique(&mut nodes, node);
            }
        }
        nodes
    }
}

fn push_unique<T: PartialEq>(items: &mut Vec<T>, item: T) {
    if !items.contains(&item) {
        items.push(item);
    }
}
