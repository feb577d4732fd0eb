pub mod config;
pub mod document;
pub mod error;
pub mod index;
pub mod locate;
pub mod matcher;
pub mod model;
pub mod parse;
pub mod resolve;
pub mod store;
pub mod symbols;

pub use document::{SpecDocument, SpecNode};
pub use index::{INDEX_VERSION, IndexKey, IndexRecord, IndexStatus, SpecIndex};
pub use locate::Locator;
pub use matcher::OperationMatcher;
pub use model::{ApiOperation, CandidateClass, CandidateSymbol, DocumentPath, SpecElement};
pub use resolve::{Navigator, Resolution};
pub use store::DocumentStore;
pub use symbols::{InMemorySymbols, SymbolSource};
