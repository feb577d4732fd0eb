//! The seam between the core and language adapters.
//!
//! Adapters turn source files into [`CandidateClass`]es; the core only asks a
//! [`SymbolSource`] for them. [`InMemorySymbols`] is the bundled implementation, fed
//! directly or from a YAML/JSON symbols manifest.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::model::{CandidateClass, CandidateSymbol, SymbolKind};

/// Code symbols of a project, as far as the resolvers need them.
pub trait SymbolSource: Send + Sync {
    /// Files likely to declare code for `operation_id`.
    fn files_for_operation(&self, operation_id: &str) -> Vec<PathBuf>;

    fn classes_in_file(&self, file: &Path) -> Vec<CandidateClass>;

    fn find_class(&self, qualified_name: &str) -> Option<CandidateClass>;

    /// Classes naming `qualified_name` among their direct supertypes.
    fn direct_subclasses(&self, qualified_name: &str) -> Vec<CandidateClass>;
}

/// The symbols manifest format: files with the classes they declare.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolManifest {
    #[serde(default)]
    pub files: Vec<FileSymbols>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileSymbols {
    pub path: PathBuf,
    #[serde(default)]
    pub classes: Vec<CandidateClass>,
}

/// A [`SymbolSource`] holding every class in memory.
#[derive(Debug, Clone)]
pub struct InMemorySymbols {
    classes: IndexMap<String, CandidateClass>,
    files: IndexMap<PathBuf, Vec<String>>,
    escape_prefix: String,
    raw_suffix: String,
}

impl Default for InMemorySymbols {
    fn default() -> Self {
        Self {
            classes: IndexMap::new(),
            files: IndexMap::new(),
            escape_prefix: "_".to_string(),
            raw_suffix: "Raw".to_string(),
        }
    }
}

impl InMemorySymbols {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name conventions used when shortlisting files for an operation id.
    pub fn with_conventions(
        mut self,
        escape_prefix: impl Into<String>,
        raw_suffix: impl Into<String>,
    ) -> Self {
        self.escape_prefix = escape_prefix.into();
        self.raw_suffix = raw_suffix.into();
        self
    }

    /// Register `class` under the file it declares (if any). A class with the same
    /// qualified name replaces the previous one.
    pub fn add_class(&mut self, class: CandidateClass) {
        let name = class.qualified_name.clone();
        if let Some(previous) = self.classes.get(&name).and_then(|c| c.symbol.file.clone()) {
            if let Some(names) = self.files.get_mut(&previous) {
                names.retain(|n| n != &name);
            }
        }
        if let Some(file) = &class.symbol.file {
            self.files.entry(file.clone()).or_default().push(name.clone());
        }
        self.classes.insert(name, class);
    }

    pub fn with_class(mut self, class: CandidateClass) -> Self {
        self.add_class(class);
        self
    }

    pub fn from_manifest(manifest: SymbolManifest) -> Self {
        let mut symbols = Self::new();
        for file in manifest.files {
            for class in file.classes {
                symbols.add_class(complete_class(class, &file.path));
            }
        }
        symbols
    }

    /// Read a manifest; `.json` files are parsed as JSON, everything else as YAML.
    pub fn load_manifest(path: &Path) -> Result<Self, ParseError> {
        let content = fs::read_to_string(path).map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest: SymbolManifest = if path.extension().is_some_and(|e| e == "json") {
            serde_json::from_str(&content)?
        } else {
            serde_yaml_ng::from_str(&content)?
        };
        Ok(Self::from_manifest(manifest))
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    fn declares_operation(&self, method: &CandidateSymbol, operation_id: &str) -> bool {
        let name = method.simple_name.as_str();
        name == operation_id
            || (!self.escape_prefix.is_empty()
                && name.strip_prefix(self.escape_prefix.as_str()) == Some(operation_id))
            || (!self.raw_suffix.is_empty()
                && name.strip_suffix(self.raw_suffix.as_str()) == Some(operation_id))
            || method
                .annotations
                .values()
                .filter_map(|attrs| attrs.get("operationId"))
                .any(|value| value.first() == Some(operation_id))
    }
}

impl SymbolSource for InMemorySymbols {
    fn files_for_operation(&self, operation_id: &str) -> Vec<PathBuf> {
        self.files
            .iter()
            .filter(|(_, names)| {
                names
                    .iter()
                    .filter_map(|name| self.classes.get(name))
                    .flat_map(|class| &class.methods)
                    .any(|method| self.declares_operation(method, operation_id))
            })
            .map(|(file, _)| file.clone())
            .collect()
    }

    fn classes_in_file(&self, file: &Path) -> Vec<CandidateClass> {
        self.files
            .get(file)
            .into_iter()
            .flatten()
            .filter_map(|name| self.classes.get(name).cloned())
            .collect()
    }

    fn find_class(&self, qualified_name: &str) -> Option<CandidateClass> {
        self.classes.get(qualified_name).cloned()
    }

    fn direct_subclasses(&self, qualified_name: &str) -> Vec<CandidateClass> {
        self.classes
            .values()
            .filter(|class| class.supertypes.iter().any(|s| s == qualified_name))
            .cloned()
            .collect()
    }
}

/// Fill what a hand-written manifest entry leaves implicit: the class symbol's name,
/// kind and file, and each member's owner and file.
fn complete_class(mut class: CandidateClass, file: &Path) -> CandidateClass {
    if class.symbol.simple_name.is_empty() {
        class.symbol.simple_name = CandidateClass::new(class.qualified_name.as_str())
            .simple_name()
            .to_string();
    }
    class.symbol.kind = SymbolKind::Class;
    if class.symbol.file.is_none() {
        class.symbol.file = Some(file.to_path_buf());
    }
    for method in &mut class.methods {
        if method.containing_type.is_none() {
            method.containing_type = Some(class.qualified_name.clone());
        }
        if method.file.is_none() {
            method.file = class.symbol.file.clone();
        }
    }
    class
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AnnotationValue;

    const MANIFEST: &str = r#"
files:
  - path: src/main/kotlin/api/PetsApiController.kt
    classes:
      - qualified_name: api.PetsApiController
        symbol:
          annotations:
            RestController: {}
        methods:
          - simple_name: getPetById
            parameter_types: [Long]
            annotations:
              io.swagger.v3.oas.annotations.Operation:
                operationId: getPetById
                tags: [pets]
              GetMapping:
                value: ["/pets/{id}"]
          - simple_name: getDelegate
  - path: src/main/kotlin/api/PetsApiDelegate.kt
    classes:
      - qualified_name: api.PetsApiControllerDelegate
        methods:
          - simple_name: getPetById
            parameter_types: [Long]
      - qualified_name: app.PetsService
        supertypes: [api.PetsApiControllerDelegate]
"#;

    fn symbols() -> InMemorySymbols {
        let manifest: SymbolManifest = serde_yaml_ng::from_str(MANIFEST).unwrap();
        InMemorySymbols::from_manifest(manifest)
    }

    #[test]
    fn test_manifest_fills_implicit_fields() {
        let symbols = symbols();
        assert_eq!(symbols.len(), 3);
        let controller = symbols.find_class("api.PetsApiController").unwrap();
        assert_eq!(controller.simple_name(), "PetsApiController");
        assert_eq!(controller.symbol.kind, SymbolKind::Class);
        assert!(controller.symbol.has_annotation("RestController"));

        let method = &controller.methods[0];
        assert_eq!(method.containing_type.as_deref(), Some("api.PetsApiController"));
        assert_eq!(
            method.file.as_deref(),
            Some(Path::new("src/main/kotlin/api/PetsApiController.kt"))
        );
        let tags = method.annotation("Operation").unwrap().get("tags").unwrap();
        assert_eq!(
            tags,
            &AnnotationValue::List(vec!["pets".to_string()])
        );
    }

    #[test]
    fn test_files_for_operation_shortlists_declaring_files() {
        let symbols = symbols();
        let files = symbols.files_for_operation("getPetById");
        assert_eq!(files.len(), 2);
        assert!(symbols.files_for_operation("deletePet").is_empty());
    }

    #[test]
    fn test_escaped_and_raw_names_are_shortlisted() {
        let symbols = InMemorySymbols::new()
            .with_class(
                CandidateClass::new("api.Keywords")
                    .with_method(CandidateSymbol::method("_delete"))
                    .in_file("Keywords.kt"),
            )
            .with_class(
                CandidateClass::new("PetsApi")
                    .with_method(CandidateSymbol::function("listPetsRaw"))
                    .in_file("apis/PetsApi.ts"),
            );
        assert_eq!(
            symbols.files_for_operation("delete"),
            vec![PathBuf::from("Keywords.kt")]
        );
        assert_eq!(
            symbols.files_for_operation("listPets"),
            vec![PathBuf::from("apis/PetsApi.ts")]
        );
    }

    #[test]
    fn test_direct_subclasses() {
        let symbols = symbols();
        let subclasses = symbols.direct_subclasses("api.PetsApiControllerDelegate");
        assert_eq!(subclasses.len(), 1);
        assert_eq!(subclasses[0].qualified_name, "app.PetsService");
    }

    #[test]
    fn test_replacing_a_class_moves_it_between_files() {
        let mut symbols = InMemorySymbols::new();
        symbols.add_class(CandidateClass::new("a.A").in_file("one.kt"));
        symbols.add_class(CandidateClass::new("a.A").in_file("two.kt"));
        assert!(symbols.classes_in_file(Path::new("one.kt")).is_empty());
        assert_eq!(symbols.classes_in_file(Path::new("two.kt")).len(), 1);
    }
}
