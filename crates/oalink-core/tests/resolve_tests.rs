use std::path::{Path, PathBuf};

use oalink_core::config::{IndexConfig, MatcherConfig, OalinkConfig};
use oalink_core::model::{AnnotationValue, ElementKind, HttpMethod};
use oalink_core::symbols::SymbolSource;
use oalink_core::{
    ApiOperation, CandidateClass, CandidateSymbol, DocumentPath, InMemorySymbols, IndexStatus,
    Navigator, OperationMatcher, Resolution, SpecElement, SpecIndex,
};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn petstore() -> SpecIndex {
    let index = SpecIndex::new(fixture("petstore"), &IndexConfig::default());
    index.reindex_project();
    index
}

fn symbols() -> InMemorySymbols {
    InMemorySymbols::load_manifest(&fixture("symbols/petstore.yaml")).unwrap()
}

fn operation(index: &SpecIndex, operation_id: &str) -> ApiOperation {
    let mut records = index.lookup(ElementKind::Operation, operation_id);
    assert_eq!(records.len(), 1, "{operation_id} should be declared once");
    match records.remove(0).element {
        SpecElement::Operation(op) => op,
        other => panic!("expected an operation, got {other:?}"),
    }
}

fn owners(found: &[CandidateSymbol]) -> Vec<String> {
    let mut owners: Vec<String> = found
        .iter()
        .map(|s| {
            format!(
                "{}.{}",
                s.containing_type.as_deref().unwrap_or_default(),
                s.simple_name
            )
        })
        .collect();
    owners.sort();
    owners
}

fn single(value: &str) -> AnnotationValue {
    AnnotationValue::Single(value.to_string())
}

#[test]
fn pet_by_id_resolves_to_server_override_and_client_wrapper() {
    let index = petstore();
    let symbols = symbols();
    let navigator = Navigator::new(&index, &symbols, &OalinkConfig::default()).unwrap();

    let found = navigator.resolve_implementation(&operation(&index, "getPetById"));
    assert!(found.is_ambiguous());
    assert_eq!(
        owners(found.items()),
        vec!["app.PetsService.getPetById", "web.PetsApi.getPetById"]
    );
}

#[test]
fn kotlin_spring_alone_gives_a_unique_answer() {
    let index = petstore();
    let symbols = symbols();
    let mut config = OalinkConfig::default();
    config.resolvers.implementation = vec!["kotlin-spring".to_string()];
    let navigator = Navigator::new(&index, &symbols, &config).unwrap();

    let found = navigator.resolve_implementation(&operation(&index, "getPetById"));
    let method = found.unique().unwrap();
    assert_eq!(method.containing_type.as_deref(), Some("app.PetsService"));
    assert_eq!(
        method.file.as_deref(),
        Some(Path::new("server/src/main/kotlin/app/PetsService.kt"))
    );

    // No override of createPet exists, so the delegate method is the answer.
    let found = navigator.resolve_implementation(&operation(&index, "createPet"));
    assert_eq!(owners(found.items()), vec!["api.PetsApiControllerDelegate.createPet"]);
}

#[test]
fn mapping_to_another_path_does_not_resolve() {
    let index = petstore();
    let symbols = InMemorySymbols::new().with_class(
        CandidateClass::new("api.PetsApiController")
            .with_annotation("RestController", Vec::<(&str, AnnotationValue)>::new())
            .with_method(
                CandidateSymbol::method("getPetById")
                    .with_annotation("GetMapping", [("value", single("/other"))]),
            )
            .in_file("PetsApiController.kt"),
    );
    let navigator = Navigator::new(&index, &symbols, &OalinkConfig::default()).unwrap();

    let found = navigator.resolve_implementation(&operation(&index, "getPetById"));
    assert_eq!(found, Resolution::Found(Vec::new()));
}

#[test]
fn typed_client_resolves_through_its_api_interface() {
    let index = petstore();
    let symbols = symbols();
    let navigator = Navigator::new(&index, &symbols, &OalinkConfig::default()).unwrap();

    let found = navigator.resolve_implementation(&operation(&index, "createWidget"));
    assert_eq!(owners(found.items()), vec!["client.WidgetsApi.createWidget"]);
}

#[test]
fn post_widgets_matcher_scenario() {
    let matcher = OperationMatcher::new(MatcherConfig::default());
    let operation = ApiOperation::new("/widgets", "post".parse().unwrap(), "createWidget");

    let mapped = |path: &str| {
        CandidateSymbol::method("createWidget").with_annotation(
            "RequestMapping",
            [("method", single("POST")), ("path", single(path))],
        )
    };
    assert!(matcher.matches(&mapped("/widgets"), &operation));
    assert!(!matcher.matches(&mapped("/widgets/{id}"), &operation));
}

#[test]
fn controller_method_resolves_to_its_operation_node() {
    let index = petstore();
    let symbols = symbols();
    let navigator = Navigator::new(&index, &symbols, &OalinkConfig::default()).unwrap();

    let controller = symbols.find_class("api.PetsApiController").unwrap();
    let method = controller.methods_named("getPetById").next().unwrap();
    let found = navigator.resolve_spec_element(method);
    let node = found.unique().unwrap();
    assert!(node.file.ends_with("api.yaml"));
    assert_eq!(node.path.to_string(), "/paths/~1pets~1{id}/get/operationId");
    assert_eq!(node.as_str(), Some("getPetById"));
}

#[test]
fn classes_resolve_to_tags_and_components() {
    let index = petstore();
    let symbols = symbols();
    let navigator = Navigator::new(&index, &symbols, &OalinkConfig::default()).unwrap();

    let controller = symbols.find_class("api.PetsApiController").unwrap();
    let found = navigator.resolve_spec_element(&controller.symbol);
    let tag = found.unique().unwrap();
    assert_eq!(tag.path.to_string(), "/tags/0/name");
    assert_eq!(tag.as_str(), Some("pets"));

    let model = symbols.find_class("model.Pet").unwrap();
    let found = navigator.resolve_spec_element(&model.symbol);
    assert_eq!(found.unique().unwrap().path.to_string(), "/components/schemas/Pet");
}

#[test]
fn referenced_operation_is_found_in_the_other_file() {
    let index = petstore();
    let symbols = InMemorySymbols::new();
    let navigator = Navigator::new(&index, &symbols, &OalinkConfig::default()).unwrap();

    let found = navigator.resolve_spec_element(&CandidateSymbol::method("opX"));
    let node = found.unique().unwrap();
    assert!(node.file.ends_with("split/other.yaml"));
    assert_eq!(
        node.path,
        DocumentPath::from_segments(["opName", "get", "operationId"])
    );
}

#[test]
fn duplicate_operation_ids_surface_every_candidate() {
    let index = petstore();
    let symbols = InMemorySymbols::new();
    let navigator = Navigator::new(&index, &symbols, &OalinkConfig::default()).unwrap();

    let found = navigator.resolve_spec_element(&CandidateSymbol::method("dup"));
    assert!(found.is_ambiguous());
    let mut files: Vec<String> = found
        .items()
        .iter()
        .filter_map(|node| node.file.file_name()?.to_str().map(str::to_string))
        .collect();
    files.sort();
    assert_eq!(files, vec!["a.yaml", "b.json"]);
}

#[test]
fn location_in_the_spec_resolves_to_implementations() {
    let index = petstore();
    let symbols = symbols();
    let navigator = Navigator::new(&index, &symbols, &OalinkConfig::default()).unwrap();

    let pointer = DocumentPath::from_pointer("/paths/~1pets~1{id}/get/operationId");
    let identity = navigator.extract_operation_identity(Path::new("api.yaml"), &pointer);
    let op = identity.unique().unwrap();
    assert_eq!(op.operation_id, "getPetById");
    assert_eq!(op.method, HttpMethod::Get);
    assert_eq!(op.path, "/pets/{id}");

    let found = navigator.resolve_implementation_at(
        Path::new("api.yaml"),
        &DocumentPath::from_pointer("/paths/~1pets~1{id}/get"),
    );
    assert_eq!(found.items().len(), 2);
}

#[test]
fn queries_report_not_ready_while_building() {
    let index = petstore();
    let symbols = symbols();
    let navigator = Navigator::new(&index, &symbols, &OalinkConfig::default()).unwrap();
    let op = operation(&index, "getPetById");

    {
        let _building = index.begin_build();
        assert_eq!(index.status(), IndexStatus::Building);
        assert_eq!(navigator.resolve_implementation(&op), Resolution::NotReady);
        assert_eq!(
            navigator.resolve_spec_element(&CandidateSymbol::method("getPetById")),
            Resolution::NotReady
        );
        // The raw index stays readable.
        assert_eq!(index.lookup(ElementKind::Operation, "getPetById").len(), 1);
    }

    let found = navigator.resolve_spec_element(&CandidateSymbol::method("getPetById"));
    assert!(found.is_ready());
    assert_eq!(found.items().len(), 1);
}

#[test]
fn unknown_resolver_in_config_is_an_error() {
    let index = petstore();
    let symbols = InMemorySymbols::new();
    let mut config = OalinkConfig::default();
    config.resolvers.implementation.push("cobol".to_string());
    assert!(Navigator::new(&index, &symbols, &config).is_err());
}
