use std::sync::Arc;

use serde_yaml_ng::{Mapping, Value};

use crate::document::{SpecDocument, ref_of};
use crate::locate::Locator;
use crate::model::{HttpMethod, ReferencePointer};

/// Replaces the `$ref`s that carry element identity with their targets.
///
/// Only path items (`paths/<p>`), operations (`paths/<p>/<method>`) and component schemas
/// (`components/schemas/<name>`) are inlined; nested schemas and parameters are left alone.
/// Method keys of path items are lower-cased on the way (`GET:` reads as `get:`).
/// Each replacement follows the full reference chain across files, resolving relative
/// paths against the file the reference was found in. Cycles and broken targets leave the
/// reference in place.
pub struct RefResolver<'s> {
    locator: Locator<'s>,
}

impl<'s> RefResolver<'s> {
    pub fn new(locator: Locator<'s>) -> Self {
        Self { locator }
    }

    /// A copy of `doc`'s tree with identity-carrying references inlined.
    pub fn resolve_document(&self, doc: &Arc<SpecDocument>) -> Value {
        let mut root = doc.root().clone();

        if let Some(Value::Mapping(paths)) = root.get_mut("paths").map(untag_mut) {
            for (_, item) in paths.iter_mut() {
                let item_doc = self.inline(doc, item);
                normalize_method_keys(item);
                for method in HttpMethod::ALL {
                    if let Some(operation) = item.get_mut(method.path_item_key()) {
                        self.inline(&item_doc, operation);
                    }
                }
            }
        }

        if let Some(Value::Mapping(schemas)) = root
            .get_mut("components")
            .and_then(|c| c.get_mut("schemas"))
            .map(untag_mut)
        {
            for (_, schema) in schemas.iter_mut() {
                self.inline(doc, schema);
            }
        }

        root
    }

    /// Replace `value` by its reference target, returning the document the content now
    /// comes from (for resolving references nested inside it).
    fn inline(&self, doc: &Arc<SpecDocument>, value: &mut Value) -> Arc<SpecDocument> {
        let Some(raw) = ref_of(value) else {
            return Arc::clone(doc);
        };
        let resolved = ReferencePointer::parse(raw)
            .and_then(|pointer| self.locator.try_follow_ref(doc, &pointer));
        match resolved {
            Ok((target, node)) => {
                *value = node.value;
                target
            }
            Err(e) => {
                log::debug!("leaving reference unresolved in {}: {e}", doc.path().display());
                Arc::clone(doc)
            }
        }
    }
}

/// Lower-case HTTP method keys. The first spelling of a method wins.
fn normalize_method_keys(item: &mut Value) {
    let Value::Mapping(map) = untag_mut(item) else {
        return;
    };
    let mut normalized = Mapping::with_capacity(map.len());
    for (key, value) in std::mem::take(map) {
        let key = match key.as_str().and_then(|k| k.parse::<HttpMethod>().ok()) {
            Some(method) => Value::String(method.path_item_key().to_string()),
            None => key,
        };
        if !normalized.contains_key(&key) {
            normalized.insert(key, value);
        }
    }
    *map = normalized;
}

fn untag_mut(value: &mut Value) -> &mut Value {
    match value {
        Value::Tagged(tagged) => untag_mut(&mut tagged.value),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::document::get_path;
    use crate::model::DocumentPath;
    use crate::store::DocumentStore;

    #[test]
    fn test_inlines_external_path_item_and_operation() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("paths")).unwrap();
        fs::write(
            dir.path().join("api.yaml"),
            "paths:\n  /pets:\n    $ref: 'paths/pets.yaml#/pets'\n",
        )
        .unwrap();
        // The operation ref is relative to paths/pets.yaml, not to api.yaml.
        fs::write(
            dir.path().join("paths/pets.yaml"),
            "pets:\n  get:\n    $ref: 'ops.yaml#/listPets'\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("paths/ops.yaml"),
            "listPets:\n  operationId: listPets\n  tags: [pets]\n",
        )
        .unwrap();

        let store = DocumentStore::new();
        let doc = store.get(&dir.path().join("api.yaml")).unwrap();
        let resolved = RefResolver::new(Locator::new(&store)).resolve_document(&doc);

        let path = DocumentPath::from_segments(["paths", "/pets", "get", "operationId"]);
        assert_eq!(
            get_path(&resolved, &path).and_then(Value::as_str),
            Some("listPets")
        );
    }

    #[test]
    fn test_method_keys_are_lower_cased() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("api.yaml"),
            "paths:\n  /a:\n    GET:\n      operationId: getA\n    Post:\n      operationId: postA\n    parameters: []\n",
        )
        .unwrap();
        let store = DocumentStore::new();
        let doc = store.get(&dir.path().join("api.yaml")).unwrap();
        let resolved = RefResolver::new(Locator::new(&store)).resolve_document(&doc);

        let get = DocumentPath::from_segments(["paths", "/a", "get", "operationId"]);
        let post = DocumentPath::from_segments(["paths", "/a", "post", "operationId"]);
        let params = DocumentPath::from_segments(["paths", "/a", "parameters"]);
        assert_eq!(get_path(&resolved, &get).and_then(Value::as_str), Some("getA"));
        assert_eq!(get_path(&resolved, &post).and_then(Value::as_str), Some("postA"));
        assert!(get_path(&resolved, &params).is_some());
    }

    #[test]
    fn test_unresolvable_ref_is_left_in_place() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("api.yaml"),
            "components:\n  schemas:\n    Pet:\n      $ref: 'missing.yaml#/Pet'\n",
        )
        .unwrap();
        let store = DocumentStore::new();
        let doc = store.get(&dir.path().join("api.yaml")).unwrap();
        let resolved = RefResolver::new(Locator::new(&store)).resolve_document(&doc);

        let path = DocumentPath::from_segments(["components", "schemas", "Pet"]);
        assert_eq!(
            get_path(&resolved, &path).and_then(ref_of),
            Some("missing.yaml#/Pet")
        );
    }
}
