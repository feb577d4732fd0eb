use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

/// Top-level project configuration loaded from `.oalink.yaml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OalinkConfig {
    pub index: IndexConfig,
    pub matcher: MatcherConfig,
    pub naming: NamingConfig,
    pub resolvers: ResolversConfig,
}

/// Which files feed the spec index and where its snapshot lives.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Lower-case file extensions considered spec documents.
    pub extensions: Vec<String>,
    /// Directory names skipped anywhere in the tree (vendored modules, build output).
    pub exclude_dirs: Vec<String>,
    /// Project-relative roots holding third-party libraries.
    pub library_roots: Vec<PathBuf>,
    /// Project-relative snapshot file; `None` keeps the index in memory only.
    pub snapshot: Option<PathBuf>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["yaml".to_string(), "yml".to_string(), "json".to_string()],
            exclude_dirs: vec![
                "node_modules".to_string(),
                ".git".to_string(),
                "target".to_string(),
                ".oalink".to_string(),
            ],
            library_roots: Vec::new(),
            snapshot: None,
        }
    }
}

/// Annotation names and generator conventions used by the operation matcher.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Annotation carrying `operationId`, `summary` and `tags`.
    pub operation_annotation: String,
    /// Annotation carrying a tag `name` on a class.
    pub tag_annotation: String,
    /// Generic HTTP-mapping annotation with a `method` attribute.
    pub request_mapping_annotation: String,
    /// Prefix generators put in front of names colliding with language keywords.
    pub escape_prefix: String,
    /// Zero-argument accessor exposing the delegate implementation.
    pub delegate_accessor: String,
    /// Suffix appended to a controller's qualified name to name its delegate.
    pub delegate_suffix: String,
    /// Class annotations identifying a server controller.
    pub controller_annotations: Vec<String>,
    /// Suffix appended to an API interface's qualified name to name its typed client.
    pub client_suffix: String,
    /// Annotation identifying a typed client.
    pub client_annotation: String,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            operation_annotation: "Operation".to_string(),
            tag_annotation: "Tag".to_string(),
            request_mapping_annotation: "RequestMapping".to_string(),
            escape_prefix: "_".to_string(),
            delegate_accessor: "getDelegate".to_string(),
            delegate_suffix: "Delegate".to_string(),
            controller_annotations: vec!["RestController".to_string(), "RequestMapping".to_string()],
            client_suffix: "Client".to_string(),
            client_annotation: "FeignClient".to_string(),
        }
    }
}

/// Naming heuristics used when deriving spec identifiers from code symbols.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// Suffixes stripped, in order, from a class name to guess its tag.
    pub tag_suffixes: Vec<String>,
    /// Extra suffix stripped after `tag_suffixes` to produce a second candidate.
    pub secondary_tag_suffix: String,
    /// Suffix of the low-level function the typed TypeScript client generates per operation.
    pub raw_function_suffix: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            tag_suffixes: vec![
                "Controller".to_string(),
                "Delegate".to_string(),
                "Api".to_string(),
                "Client".to_string(),
            ],
            secondary_tag_suffix: "Ws".to_string(),
            raw_function_suffix: "Raw".to_string(),
        }
    }
}

/// Which implementation resolvers run, in order.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResolversConfig {
    pub implementation: Vec<String>,
}

impl Default for ResolversConfig {
    fn default() -> Self {
        Self {
            implementation: vec![
                "kotlin-spring".to_string(),
                "spring-cloud".to_string(),
                "typescript".to_string(),
            ],
        }
    }
}

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = ".oalink.yaml";

/// Load config from a YAML file. Returns `None` if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Option<OalinkConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: OalinkConfig =
        serde_yaml_ng::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(Some(config))
}

/// Generate the default config file content.
pub fn default_config_content() -> &'static str {
    r#"# oalink configuration
index:
  extensions: [yaml, yml, json]
  exclude_dirs: [node_modules, .git, target, .oalink]
  library_roots: []
  # snapshot: .oalink/index.json

matcher:
  operation_annotation: Operation
  tag_annotation: Tag
  request_mapping_annotation: RequestMapping
  escape_prefix: "_"
  delegate_accessor: getDelegate
  delegate_suffix: Delegate
  controller_annotations: [RestController, RequestMapping]
  client_suffix: Client
  client_annotation: FeignClient

naming:
  tag_suffixes: [Controller, Delegate, Api, Client]
  secondary_tag_suffix: Ws
  raw_function_suffix: Raw

resolvers:
  implementation: [kotlin-spring, spring-cloud, typescript]
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OalinkConfig::default();
        assert_eq!(config.index.extensions, vec!["yaml", "yml", "json"]);
        assert!(config.index.exclude_dirs.contains(&"node_modules".to_string()));
        assert!(config.index.exclude_dirs.contains(&".oalink".to_string()));
        assert!(config.index.snapshot.is_none());
        assert_eq!(config.matcher.escape_prefix, "_");
        assert_eq!(config.matcher.delegate_accessor, "getDelegate");
        assert_eq!(config.naming.raw_function_suffix, "Raw");
        assert_eq!(config.resolvers.implementation.len(), 3);
    }

    #[test]
    fn test_parse_config_yaml() {
        let yaml = r#"
index:
  extensions: [yaml]
  exclude_dirs: [vendor]
  library_roots: [third_party]
  snapshot: .oalink/index.json
matcher:
  escape_prefix: "__"
naming:
  tag_suffixes: [Resource]
resolvers:
  implementation: [typescript]
"#;
        let config: OalinkConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.index.extensions, vec!["yaml"]);
        assert_eq!(config.index.exclude_dirs, vec!["vendor"]);
        assert_eq!(config.index.library_roots, vec![PathBuf::from("third_party")]);
        assert_eq!(
            config.index.snapshot,
            Some(PathBuf::from(".oalink/index.json"))
        );
        assert_eq!(config.matcher.escape_prefix, "__");
        // Unlisted fields keep their defaults
        assert_eq!(config.matcher.delegate_accessor, "getDelegate");
        assert_eq!(config.naming.tag_suffixes, vec!["Resource"]);
        assert_eq!(config.resolvers.implementation, vec!["typescript"]);
    }

    #[test]
    fn test_default_content_parses_to_defaults() {
        let config: OalinkConfig = serde_yaml_ng::from_str(default_config_content()).unwrap();
        let defaults = OalinkConfig::default();
        assert_eq!(config.index.extensions, defaults.index.extensions);
        assert_eq!(config.matcher.client_suffix, defaults.matcher.client_suffix);
        assert_eq!(
            config.resolvers.implementation,
            defaults.resolvers.implementation
        );
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_config(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert!(loaded.is_none());
    }
}
