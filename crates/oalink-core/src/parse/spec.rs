use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_yaml_ng::Value;

use super::operation::PathItem;
use super::schema::SchemaOrRef;

/// The parts of an OpenAPI 3.x document that carry identifiable elements.
///
/// Unknown keys are ignored; only `openapi` and `info` are required. Entries of `paths` and
/// `components.schemas` are read one by one, so an extension or a malformed entry costs
/// that entry only.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OpenApiSpec {
    pub openapi: String,

    pub info: Info,

    #[serde(default, deserialize_with = "entries")]
    pub paths: IndexMap<String, PathItem>,

    #[serde(default)]
    pub components: Components,

    #[serde(default)]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Info {
    pub title: String,
    pub version: String,
}

/// Top-level tag declaration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Tag {
    pub name: String,
}

/// Only schemas are indexed; other component sections are skipped.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Components {
    #[serde(default, deserialize_with = "entries")]
    pub schemas: IndexMap<String, SchemaOrRef>,
}

/// A map whose `x-` keys, non-string keys and undecodable values are dropped.
fn entries<'de, D, T>(deserializer: D) -> Result<IndexMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let mapping = match Value::deserialize(deserializer)? {
        Value::Mapping(mapping) => mapping,
        Value::Null => return Ok(IndexMap::new()),
        other => {
            log::warn!("expected a mapping, found {other:?}; ignoring it");
            return Ok(IndexMap::new());
        }
    };

    let mut out = IndexMap::with_capacity(mapping.len());
    for (key, value) in mapping {
        let Some(key) = key.as_str() else {
            log::debug!("skipping non-string key {key:?}");
            continue;
        };
        if key.starts_with("x-") {
            continue;
        }
        match serde_yaml_ng::from_value::<T>(value) {
            Ok(entry) => {
                out.insert(key.to_string(), entry);
            }
            Err(e) => log::warn!("skipping {key}: {e}"),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "openapi: 3.1.0\ninfo: {title: t, version: '1'}\n";

    fn spec(body: &str) -> OpenApiSpec {
        serde_yaml_ng::from_str(&format!("{HEADER}{body}")).unwrap()
    }

    #[test]
    fn test_paths_extension_is_skipped() {
        let spec = spec(
            r#"
paths:
  x-internal: true
  /pets:
    get:
      operationId: listPets
"#,
        );
        assert_eq!(spec.paths.keys().collect::<Vec<_>>(), vec!["/pets"]);
    }

    #[test]
    fn test_malformed_path_item_costs_only_itself() {
        let spec = spec(
            r#"
paths:
  /broken: [not, a, path, item]
  /odd:
    get:
      operationId: [not, a, string]
  /pets:
    post:
      operationId: createPet
"#,
        );
        assert_eq!(spec.paths.keys().collect::<Vec<_>>(), vec!["/pets"]);
    }

    #[test]
    fn test_boolean_schema_is_kept() {
        let spec = spec(
            r#"
components:
  schemas:
    Anything: true
    Pet:
      type: object
"#,
        );
        assert_eq!(spec.components.schemas["Anything"], SchemaOrRef::Bool(true));
        assert_eq!(spec.components.schemas["Pet"].schema_type(), Some("object"));
    }

    #[test]
    fn test_null_sections_are_empty() {
        let spec = spec("paths:\ncomponents:\n  schemas:\n");
        assert!(spec.paths.is_empty());
        assert!(spec.components.schemas.is_empty());
    }

    #[test]
    fn test_json_paths_extension_is_skipped() {
        let spec: OpenApiSpec = serde_json::from_str(
            r#"{"openapi":"3.0.0","info":{"title":"t","version":"1"},
                "paths":{"x-internal":true,"/a":{"get":{"operationId":"getA"}}}}"#,
        )
        .unwrap();
        assert_eq!(spec.paths.len(), 1);
        assert!(spec.paths["/a"].get.is_some());
    }
}
