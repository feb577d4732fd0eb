//! Spec <-> code resolution built from ordered resolver lists.

pub mod implementation;
pub mod navigator;
pub mod spec;

use crate::index::SpecIndex;
use crate::symbols::SymbolSource;

pub use implementation::{
    ImplementationResolver, ImplementationResolvers, KotlinSpringResolver, SpringCloudResolver,
    TypeScriptResolver,
};
pub use navigator::Navigator;
pub use spec::{ComponentSpecResolver, OperationSpecResolver, SpecResolver, SpecResolvers, TagSpecResolver};

/// What a query runs against: the spec index and the project's code symbols.
#[derive(Clone, Copy)]
pub struct ResolveContext<'a> {
    pub index: &'a SpecIndex,
    pub symbols: &'a dyn SymbolSource,
}

/// Query outcome. `NotReady` means the index is being rebuilt, which is not the same as
/// finding nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<T> {
    NotReady,
    Found(Vec<T>),
}

impl<T> Resolution<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }

    /// Results; empty while not ready.
    pub fn items(&self) -> &[T] {
        match self {
            Resolution::NotReady => &[],
            Resolution::Found(items) => items,
        }
    }

    pub fn into_items(self) -> Vec<T> {
        match self {
            Resolution::NotReady => Vec::new(),
            Resolution::Found(items) => items,
        }
    }

    /// The single result, when there is exactly one.
    pub fn unique(&self) -> Option<&T> {
        match self.items() {
            [only] => Some(only),
            _ => None,
        }
    }

    /// More than one candidate; the caller has to choose.
    pub fn is_ambiguous(&self) -> bool {
        self.items().len() > 1
    }
}
