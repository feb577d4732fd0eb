use std::path::{Path, PathBuf};

use crate::config::IndexConfig;
use crate::document::normalize_path;

/// Decides which files under a project root are spec documents worth indexing.
#[derive(Debug, Clone)]
pub struct InputFilter {
    root: PathBuf,
    extensions: Vec<String>,
    exclude_dirs: Vec<String>,
    library_roots: Vec<PathBuf>,
}

impl InputFilter {
    /// Library roots are taken relative to `root` unless absolute.
    pub fn new(root: &Path, config: &IndexConfig) -> Self {
        let root = normalize_path(root);
        Self {
            extensions: config
                .extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            exclude_dirs: config.exclude_dirs.clone(),
            library_roots: config
                .library_roots
                .iter()
                .map(|lib| normalize_path(&root.join(lib)))
                .collect(),
            root,
        }
    }

    /// Whether `path` should feed the index.
    pub fn accepts(&self, path: &Path) -> bool {
        self.has_spec_extension(path) && !self.is_excluded(path)
    }

    pub fn has_spec_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }

    /// Under a library root or inside an excluded directory below the project root.
    ///
    /// Relative paths not already below a relative root are taken relative to the root.
    pub fn is_excluded(&self, path: &Path) -> bool {
        let path = self.resolve(path);
        let relative = path.strip_prefix(&self.root).unwrap_or(&path);
        self.library_roots.iter().any(|lib| path.starts_with(lib))
            || relative.components().any(|c| {
                c.as_os_str()
                    .to_str()
                    .is_some_and(|name| self.is_excluded_dir_name(name))
            })
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() || path.starts_with(&self.root) {
            normalize_path(path)
        } else {
            normalize_path(&self.root.join(path))
        }
    }

    pub fn is_excluded_dir_name(&self, name: &str) -> bool {
        self.exclude_dirs.iter().any(|dir| dir == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> InputFilter {
        let config = IndexConfig {
            library_roots: vec![PathBuf::from("libs/vendor")],
            ..IndexConfig::default()
        };
        InputFilter::new(Path::new("/project"), &config)
    }

    #[test]
    fn test_extension_is_case_insensitive() {
        let f = filter();
        assert!(f.accepts(Path::new("/project/api/spec.YAML")));
        assert!(f.accepts(Path::new("/project/api/spec.yml")));
        assert!(f.accepts(Path::new("/project/api/spec.json")));
        assert!(!f.accepts(Path::new("/project/api/spec.txt")));
        assert!(!f.accepts(Path::new("/project/api/Makefile")));
    }

    #[test]
    fn test_vendored_modules_are_excluded() {
        let f = filter();
        assert!(!f.accepts(Path::new("/project/web/node_modules/pkg/openapi.yaml")));
        assert!(!f.accepts(Path::new("/project/libs/vendor/api.yaml")));
        assert!(f.accepts(Path::new("/project/libs/own/api.yaml")));
    }

    #[test]
    fn test_root_itself_may_sit_in_an_excluded_name() {
        let f = InputFilter::new(Path::new("/build/target/app"), &IndexConfig::default());
        assert!(f.accepts(Path::new("/build/target/app/api.yaml")));
        assert!(!f.accepts(Path::new("/build/target/app/target/api.yaml")));
    }

    #[test]
    fn test_library_roots_under_a_relative_root() {
        let config = IndexConfig {
            library_roots: vec![PathBuf::from("third_party")],
            ..IndexConfig::default()
        };
        let f = InputFilter::new(Path::new("."), &config);
        assert!(!f.accepts(Path::new("third_party/lib.yaml")));
        assert!(!f.accepts(Path::new("./third_party/lib.yaml")));
        assert!(f.accepts(Path::new("api/spec.yaml")));

        let f = InputFilter::new(Path::new("project"), &config);
        assert!(!f.accepts(Path::new("project/third_party/lib.yaml")));
        assert!(!f.accepts(Path::new("third_party/lib.yaml")));
        assert!(f.accepts(Path::new("project/api.yaml")));
    }
}
