//! Pinpointing nodes inside spec documents, following `$ref`s across files.
//!
//! Every search here is the same depth-first walk ([`crate::document::walk`]) with a
//! different predicate. Reference chains carry a visited set of `(file, fragment)` pairs,
//! so a cycle ends the branch as "not found".

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use serde_yaml_ng::Value;

use crate::document::{
    SpecDocument, SpecNode, find_all, find_first, get_key, get_path, ref_of, untag,
};
use crate::error::ResolveError;
use crate::model::{DocumentPath, HttpMethod, ReferencePointer};
use crate::store::DocumentStore;

type Visited = HashSet<(PathBuf, String)>;

/// Resolves structural paths and references against documents loaded through a store.
#[derive(Debug, Clone, Copy)]
pub struct Locator<'s> {
    store: &'s DocumentStore,
}

impl<'s> Locator<'s> {
    pub fn new(store: &'s DocumentStore) -> Self {
        Self { store }
    }

    /// Find the node at `path`.
    ///
    /// Each segment is taken as a direct child key when one exists; otherwise the first key
    /// with that name found depth-first below the current node is used.
    pub fn find_by_path(doc: &SpecDocument, path: &DocumentPath) -> Option<SpecNode> {
        let mut current = doc.root();
        let mut at = DocumentPath::root();
        for segment in path.segments() {
            let step = DocumentPath::from_segments([segment.as_str()]);
            if let Some(child) = get_path(current, &step) {
                at = at.child(segment.as_str());
                current = child;
                continue;
            }
            let (found_at, child) =
                find_first(current, &at, &|p, _| p.last() == Some(segment.as_str()))?;
            at = found_at;
            current = child;
        }
        Some(doc.node_at(at, current))
    }

    /// Resolve `pointer` relative to `doc`, following chained references.
    ///
    /// Broken targets and cycles are "not found".
    pub fn follow_ref(
        &self,
        doc: &Arc<SpecDocument>,
        pointer: &ReferencePointer,
    ) -> Option<(Arc<SpecDocument>, SpecNode)> {
        match self.try_follow_ref(doc, pointer) {
            Ok(hit) => Some(hit),
            Err(e) => {
                log::debug!("{e} (from {})", doc.path().display());
                None
            }
        }
    }

    /// [`Locator::follow_ref`] reporting why resolution stopped.
    pub fn try_follow_ref(
        &self,
        doc: &Arc<SpecDocument>,
        pointer: &ReferencePointer,
    ) -> Result<(Arc<SpecDocument>, SpecNode), ResolveError> {
        self.follow_ref_inner(doc, pointer, &mut Visited::new())
    }

    fn follow_ref_inner(
        &self,
        doc: &Arc<SpecDocument>,
        pointer: &ReferencePointer,
        visited: &mut Visited,
    ) -> Result<(Arc<SpecDocument>, SpecNode), ResolveError> {
        let target = self
            .target_document(doc, pointer)
            .ok_or_else(|| ResolveError::RefTargetNotFound(pointer.to_string()))?;
        if !visited.insert((target.path().to_path_buf(), pointer.fragment.to_string())) {
            return Err(ResolveError::CircularRef(pointer.to_string()));
        }
        let node = Self::find_by_path(&target, &pointer.fragment)
            .ok_or_else(|| ResolveError::RefTargetNotFound(pointer.to_string()))?;
        match ref_of(&node.value) {
            Some(raw) => {
                let next = ReferencePointer::parse(raw)?;
                self.follow_ref_inner(&target, &next, visited)
            }
            None => Ok((target, node)),
        }
    }

    /// Locate the `operationId` leaf of an operation.
    ///
    /// Order: a `$ref`'d path item is followed into its file; otherwise the inline
    /// `paths/<path>/<method>/operationId` leaf; otherwise the first `operationId` leaf with
    /// the expected value anywhere in the document.
    pub fn find_operation(
        &self,
        doc: &Arc<SpecDocument>,
        path: &str,
        method: HttpMethod,
        operation_id: &str,
    ) -> Option<SpecNode> {
        let mut visited = Visited::new();
        visited.insert((doc.path().to_path_buf(), String::new()));

        let item_path = DocumentPath::from_segments(["paths", path]);
        if let Some(item) = doc.get(&item_path) {
            if let Some(raw) = ref_of(item) {
                log::debug!("{path} in {} is a reference to {raw}", doc.path().display());
                return self.operation_behind_ref(doc, raw, method, operation_id, &mut visited);
            }
            if let Some(raw) = get_key(item, method.path_item_key()).and_then(ref_of) {
                log::debug!(
                    "{method} {path} in {} is a reference to {raw}",
                    doc.path().display()
                );
                return self.operation_behind_ref(doc, raw, method, operation_id, &mut visited);
            }
            if let Some(hit) = operation_leaf(doc, &item_path, item, method, operation_id) {
                return Some(hit);
            }
        }

        let standard = item_path.child(method.path_item_key()).child("operationId");
        Self::find_by_path(doc, &standard)
            .filter(|node| node.as_str() == Some(operation_id))
            .or_else(|| Self::find_operation_id_anywhere(doc, operation_id))
    }

    fn operation_behind_ref(
        &self,
        from: &Arc<SpecDocument>,
        raw: &str,
        method: HttpMethod,
        operation_id: &str,
        visited: &mut Visited,
    ) -> Option<SpecNode> {
        let pointer = match ReferencePointer::parse(raw) {
            Ok(pointer) => pointer,
            Err(e) => {
                log::debug!("{e}");
                return None;
            }
        };
        let target = self.target_document(from, &pointer)?;
        if !visited.insert((target.path().to_path_buf(), pointer.fragment.to_string())) {
            log::debug!("reference cycle at {raw} in {}", from.path().display());
            return None;
        }

        if let Some(node) = Self::find_by_path(&target, &pointer.fragment) {
            if let Some(next) = ref_of(&node.value) {
                if let Some(hit) =
                    self.operation_behind_ref(&target, next, method, operation_id, visited)
                {
                    return Some(hit);
                }
            } else if let Some(hit) =
                operation_leaf(&target, &node.path, &node.value, method, operation_id)
                    .or_else(|| own_operation_id(&target, &node, operation_id))
            {
                return Some(hit);
            }
        }

        log::debug!(
            "{operation_id} not at {raw}, searching all of {}",
            target.path().display()
        );
        Self::find_operation_id_anywhere(&target, operation_id)
    }

    /// First `operationId` leaf whose value is `operation_id`.
    pub fn find_operation_id_anywhere(doc: &SpecDocument, operation_id: &str) -> Option<SpecNode> {
        find_first(doc.root(), &DocumentPath::root(), &|path, value| {
            path.last() == Some("operationId") && untag(value).as_str() == Some(operation_id)
        })
        .map(|(path, value)| doc.node_at(path, value))
    }

    /// Locate `components/schemas/<name>`, locally first, then in referenced files.
    pub fn find_component(&self, doc: &Arc<SpecDocument>, name: &str) -> Option<SpecNode> {
        let schema_path = DocumentPath::from_segments(["components", "schemas", name]);
        if let Some(node) = Self::find_by_path(doc, &schema_path) {
            return Some(node);
        }

        let external = self.external_targets(doc);
        external
            .iter()
            .find_map(|(target, _)| Self::find_by_path(target, &schema_path))
            .or_else(|| {
                // Split-out model files often hold schemas at arbitrary fragments.
                external.iter().find_map(|(target, fragment)| {
                    (fragment.last() == Some(name))
                        .then(|| target.node(fragment))
                        .flatten()
                })
            })
    }

    /// Locate the `name` leaf of the top-level tag named `name` (case-insensitive).
    pub fn find_tag(doc: &SpecDocument, name: &str) -> Option<SpecNode> {
        let tags_path = DocumentPath::from_segments(["tags"]);
        let tags = untag(doc.get(&tags_path)?).as_sequence()?;
        tags.iter().enumerate().find_map(|(i, item)| {
            let value = get_key(item, "name")?;
            let tag = untag(value).as_str()?;
            tag.eq_ignore_ascii_case(name)
                .then(|| doc.node_at(tags_path.child(i.to_string()).child("name"), value))
        })
    }

    /// Every file transitively referenced from `doc`, excluding `doc` itself.
    pub fn referenced_documents(&self, doc: &Arc<SpecDocument>) -> Vec<Arc<SpecDocument>> {
        let mut seen = HashSet::new();
        self.external_targets(doc)
            .into_iter()
            .filter(|(target, _)| seen.insert(target.path().to_path_buf()))
            .map(|(target, _)| target)
            .collect()
    }

    /// `(document, fragment)` for every external `$ref` reachable from `doc`.
    fn external_targets(&self, doc: &Arc<SpecDocument>) -> Vec<(Arc<SpecDocument>, DocumentPath)> {
        let mut visited_files = HashSet::from([doc.path().to_path_buf()]);
        let mut pending = vec![Arc::clone(doc)];
        let mut targets = Vec::new();

        while let Some(current) = pending.pop() {
            for pointer in external_pointers(current.root()) {
                let Some(target) = self.target_document(&current, &pointer) else {
                    continue;
                };
                if visited_files.insert(target.path().to_path_buf()) {
                    pending.push(Arc::clone(&target));
                }
                targets.push((target, pointer.fragment));
            }
        }
        targets
    }

    fn target_document(
        &self,
        from: &Arc<SpecDocument>,
        pointer: &ReferencePointer,
    ) -> Option<Arc<SpecDocument>> {
        let Some(file) = &pointer.file else {
            return Some(Arc::clone(from));
        };
        let path = if file.is_absolute() {
            file.clone()
        } else {
            from.dir().join(file)
        };
        match self.store.get(&path) {
            Ok(doc) => Some(doc),
            Err(e) => {
                log::debug!("broken reference {pointer} from {}: {e}", from.path().display());
                None
            }
        }
    }
}

/// `<item_path>/<method>/operationId` when it holds `operation_id`.
fn operation_leaf(
    doc: &SpecDocument,
    item_path: &DocumentPath,
    item: &Value,
    method: HttpMethod,
    operation_id: &str,
) -> Option<SpecNode> {
    let operation = get_key(item, method.path_item_key())?;
    let leaf = get_key(operation, "operationId")?;
    (untag(leaf).as_str() == Some(operation_id)).then(|| {
        doc.node_at(
            item_path.child(method.path_item_key()).child("operationId"),
            leaf,
        )
    })
}

/// The `operationId` leaf of `node` itself, for references that target an operation.
fn own_operation_id(doc: &SpecDocument, node: &SpecNode, operation_id: &str) -> Option<SpecNode> {
    let leaf = get_key(&node.value, "operationId")?;
    (untag(leaf).as_str() == Some(operation_id))
        .then(|| doc.node_at(node.path.child("operationId"), leaf))
}

/// Parsed `$ref` values that point into another file.
fn external_pointers(root: &Value) -> Vec<ReferencePointer> {
    find_all(root, &DocumentPath::root(), &|path, _| path.last() == Some("$ref"))
        .into_iter()
        .filter_map(|(_, value)| untag(value).as_str())
        .filter_map(|raw| ReferencePointer::parse(raw).ok())
        .filter(|pointer| !pointer.is_local())
        .collect()
}
