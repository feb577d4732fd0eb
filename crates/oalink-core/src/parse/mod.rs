pub mod operation;
pub mod ref_resolve;
pub mod schema;
pub mod spec;

use std::path::Path;

use crate::error::ParseError;
use crate::locate::Locator;
use crate::model::{ApiComponent, ApiOperation, ApiTag, SpecElement};
use crate::store::DocumentStore;
use ref_resolve::RefResolver;
use spec::OpenApiSpec;

/// Parse an OpenAPI spec from YAML.
pub fn from_yaml(input: &str) -> Result<OpenApiSpec, ParseError> {
    let spec: OpenApiSpec = serde_yaml_ng::from_str(input)?;
    validate_version(&spec)?;
    Ok(spec)
}

/// Parse an OpenAPI spec from JSON.
pub fn from_json(input: &str) -> Result<OpenApiSpec, ParseError> {
    let spec: OpenApiSpec = serde_json::from_str(input)?;
    validate_version(&spec)?;
    Ok(spec)
}

fn validate_version(spec: &OpenApiSpec) -> Result<(), ParseError> {
    if !spec.openapi.starts_with("3.") {
        return Err(ParseError::UnsupportedVersion(spec.openapi.clone()));
    }
    Ok(())
}

/// Extracts [`SpecElement`]s from spec files, resolving references through a shared store.
pub struct SpecParser<'s> {
    store: &'s DocumentStore,
}

impl<'s> SpecParser<'s> {
    pub fn new(store: &'s DocumentStore) -> Self {
        Self { store }
    }

    /// Elements of the document at `path`; empty when it cannot be read or is not OpenAPI 3.x.
    pub fn parse(&self, path: &Path) -> Vec<SpecElement> {
        match self.try_parse(path) {
            Ok(elements) => elements,
            Err(e) => {
                log::debug!("no elements from {}: {e}", path.display());
                Vec::new()
            }
        }
    }

    /// [`SpecParser::parse`] reporting why a document was rejected.
    pub fn try_parse(&self, path: &Path) -> Result<Vec<SpecElement>, ParseError> {
        let doc = self.store.get(path)?;
        let resolved = RefResolver::new(Locator::new(self.store)).resolve_document(&doc);
        let spec: OpenApiSpec = serde_yaml_ng::from_value(resolved)?;
        validate_version(&spec)?;
        Ok(extract_elements(&spec))
    }
}

/// Parse a single file with a private document store.
pub fn parse_file(path: &Path) -> Vec<SpecElement> {
    SpecParser::new(&DocumentStore::new()).parse(path)
}

/// Operations in path order and method order, then top-level tags, then component schemas.
pub fn extract_elements(spec: &OpenApiSpec) -> Vec<SpecElement> {
    let mut elements = Vec::new();

    for (path, item) in &spec.paths {
        for (method, op) in item.operations() {
            let Some(operation_id) = &op.operation_id else {
                log::debug!("skipping {method} {path}: no operationId");
                continue;
            };
            let mut operation =
                ApiOperation::new(path.as_str(), method, operation_id.as_str()).with_tags(&op.tags);
            operation.summary = op.summary.clone();
            elements.push(SpecElement::Operation(operation));
        }
    }

    elements.extend(spec.tags.iter().map(|tag| {
        SpecElement::Tag(ApiTag {
            name: tag.name.clone(),
        })
    }));

    elements.extend(spec.components.schemas.iter().map(|(name, schema)| {
        SpecElement::Component(ApiComponent {
            name: name.clone(),
            schema_type: schema.schema_type().map(str::to_string),
        })
    }));

    elements
}
