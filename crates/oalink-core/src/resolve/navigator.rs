use std::path::Path;

use crate::config::OalinkConfig;
use crate::document::{SpecDocument, SpecNode, get_key, untag};
use crate::error::ConfigError;
use crate::index::{IndexStatus, SpecIndex};
use crate::model::{ApiOperation, CandidateSymbol, DocumentPath, HttpMethod};
use crate::symbols::SymbolSource;

use super::{ImplementationResolvers, Resolution, ResolveContext, SpecResolvers};

/// Query facade over an index, a symbol source and the configured resolvers.
///
/// Every query answers [`Resolution::NotReady`] while the index is being rebuilt.
pub struct Navigator<'a> {
    index: &'a SpecIndex,
    symbols: &'a dyn SymbolSource,
    spec_resolvers: SpecResolvers,
    implementation_resolvers: ImplementationResolvers,
}

impl<'a> Navigator<'a> {
    pub fn new(
        index: &'a SpecIndex,
        symbols: &'a dyn SymbolSource,
        config: &OalinkConfig,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            index,
            symbols,
            spec_resolvers: SpecResolvers::new(&config.matcher, &config.naming),
            implementation_resolvers: ImplementationResolvers::from_config(
                &config.resolvers,
                &config.matcher,
                &config.naming,
            )?,
        })
    }

    fn context(&self) -> ResolveContext<'a> {
        ResolveContext {
            index: self.index,
            symbols: self.symbols,
        }
    }

    fn ready<T>(&self, query: impl FnOnce() -> Vec<T>) -> Resolution<T> {
        match self.index.status() {
            IndexStatus::Building => {
                log::debug!("index is building, query deferred");
                Resolution::NotReady
            }
            IndexStatus::Ready => Resolution::Found(query()),
        }
    }

    /// Code implementing or calling `operation`.
    pub fn resolve_implementation(&self, operation: &ApiOperation) -> Resolution<CandidateSymbol> {
        self.ready(|| {
            let found = self.implementation_resolvers.resolve(&self.context(), operation);
            if found.len() > 1 {
                log::warn!(
                    "{} candidates implement {}",
                    found.len(),
                    operation.operation_id
                );
            }
            found
        })
    }

    /// Spec nodes declaring what `symbol` implements or models.
    pub fn resolve_spec_element(&self, symbol: &CandidateSymbol) -> Resolution<SpecNode> {
        self.ready(|| self.spec_resolvers.resolve(&self.context(), symbol))
    }

    /// The operation declared at `path` in `file`.
    ///
    /// `path` points at an HTTP-method key below a path item, or at the `operationId` leaf of
    /// such an operation. Nothing is found when the operation has no `operationId`.
    pub fn extract_operation_identity(
        &self,
        file: &Path,
        path: &DocumentPath,
    ) -> Resolution<ApiOperation> {
        self.ready(|| {
            let absolute = self.index.absolute(file);
            match self.index.store().get(&absolute) {
                Ok(doc) => operation_at(&doc, path).into_iter().collect(),
                Err(e) => {
                    log::debug!("cannot open {}: {e}", absolute.display());
                    Vec::new()
                }
            }
        })
    }

    /// Spec -> code from a location: the identity at `path`, then its implementations.
    pub fn resolve_implementation_at(
        &self,
        file: &Path,
        path: &DocumentPath,
    ) -> Resolution<CandidateSymbol> {
        match self.extract_operation_identity(file, path) {
            Resolution::NotReady => Resolution::NotReady,
            Resolution::Found(operations) => Resolution::Found(
                operations
                    .iter()
                    .flat_map(|op| self.resolve_implementation(op).into_items())
                    .collect(),
            ),
        }
    }
}

/// Operation identity at `path`, if it addresses a method key or an `operationId` leaf.
pub fn operation_at(doc: &SpecDocument, path: &DocumentPath) -> Option<ApiOperation> {
    let method_path = if path.last() == Some("operationId") {
        path.parent()?
    } else {
        path.clone()
    };
    let method: HttpMethod = method_path.last()?.parse().ok()?;
    let item_path = method_path.parent()?;
    let api_path = item_path.last()?;

    let operation = doc.get(&method_path)?;
    let item = doc.get(&item_path)?;
    let operation_id = get_key(operation, "operationId").and_then(|v| untag(v).as_str())?;

    let tags = string_list(get_key(operation, "tags"))
        .or_else(|| string_list(get_key(item, "tags")))
        .unwrap_or_default();
    let mut identity = ApiOperation::new(api_path, method, operation_id).with_tags(tags);
    identity.summary = get_key(operation, "summary")
        .and_then(|v| untag(v).as_str())
        .map(str::to_string);
    Some(identity)
}

fn string_list(value: Option<&serde_yaml_ng::Value>) -> Option<Vec<String>> {
    let items = untag(value?).as_sequence()?;
    Some(
        items
            .iter()
            .filter_map(|item| untag(item).as_str().map(str::to_string))
            .collect(),
    )
}
