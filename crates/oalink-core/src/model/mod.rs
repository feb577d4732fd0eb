pub mod element;
pub mod path;
pub mod symbol;

pub use element::{ApiComponent, ApiOperation, ApiTag, ElementKind, HttpMethod, SpecElement};
pub use path::{DocumentPath, ReferencePointer};
pub use symbol::{
    AnnotationAttributes, AnnotationValue, Annotations, CandidateClass, CandidateSymbol, SymbolKind,
    annotation_simple_name,
};
