//! Spec -> code: find the symbols implementing or calling an operation.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::{MatcherConfig, NamingConfig, ResolversConfig};
use crate::error::ConfigError;
use crate::matcher::OperationMatcher;
use crate::model::{ApiOperation, CandidateClass, CandidateSymbol};

use super::ResolveContext;

static RAW_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"path\s*:\s*["'`](.*?)["'`]"#).expect("valid regex"));
static RAW_METHOD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"method\s*:\s*["'`](.*?)["'`]"#).expect("valid regex"));

/// Finds code for an operation following one generator's conventions.
pub trait ImplementationResolver: Send + Sync {
    /// Generator name, as listed in the `resolvers.implementation` config.
    fn name(&self) -> &'static str;

    fn resolve_implementation(
        &self,
        ctx: &ResolveContext<'_>,
        operation: &ApiOperation,
    ) -> Vec<CandidateSymbol>;
}

/// Server stubs with controllers that forward to a delegate: per shortlisted file, the
/// first controller class (or class exposing the delegate accessor) is searched.
#[derive(Debug, Clone)]
pub struct KotlinSpringResolver {
    matcher: OperationMatcher,
}

impl KotlinSpringResolver {
    pub fn new(matcher: OperationMatcher) -> Self {
        Self { matcher }
    }

    fn is_entry_point(&self, class: &CandidateClass) -> bool {
        let config = self.matcher.config();
        config
            .controller_annotations
            .iter()
            .any(|a| class.symbol.has_annotation(a))
            || class.has_accessor(&config.delegate_accessor)
    }
}

impl ImplementationResolver for KotlinSpringResolver {
    fn name(&self) -> &'static str {
        "kotlin-spring"
    }

    fn resolve_implementation(
        &self,
        ctx: &ResolveContext<'_>,
        operation: &ApiOperation,
    ) -> Vec<CandidateSymbol> {
        ctx.symbols
            .files_for_operation(&operation.operation_id)
            .iter()
            .filter_map(|file| {
                ctx.symbols
                    .classes_in_file(file)
                    .into_iter()
                    .find(|class| self.is_entry_point(class))
            })
            .filter_map(|class| {
                self.matcher
                    .resolve_best_method(&class, operation, ctx.symbols)
            })
            .collect()
    }
}

/// Typed HTTP clients: an API interface whose `<qualified name><client suffix>` sibling
/// carries the client annotation.
#[derive(Debug, Clone)]
pub struct SpringCloudResolver {
    matcher: OperationMatcher,
}

impl SpringCloudResolver {
    pub fn new(matcher: OperationMatcher) -> Self {
        Self { matcher }
    }
}

impl ImplementationResolver for SpringCloudResolver {
    fn name(&self) -> &'static str {
        "spring-cloud"
    }

    fn resolve_implementation(
        &self,
        ctx: &ResolveContext<'_>,
        operation: &ApiOperation,
    ) -> Vec<CandidateSymbol> {
        let config = self.matcher.config();
        let api = ctx
            .symbols
            .files_for_operation(&operation.operation_id)
            .iter()
            .flat_map(|file| ctx.symbols.classes_in_file(file))
            .find(|class| {
                let client_name = format!("{}{}", class.qualified_name, config.client_suffix);
                ctx.symbols
                    .find_class(&client_name)
                    .is_some_and(|client| client.symbol.has_annotation(&config.client_annotation))
            });
        let Some(api) = api else {
            return Vec::new();
        };
        log::debug!("{} has a typed client", api.qualified_name);
        self.matcher.find_method(&api, operation).into_iter().collect()
    }
}

/// Generated TypeScript clients: `<operationId>Raw` members whose body routes the
/// operation's path and method, reported through their non-raw wrapper when present.
#[derive(Debug, Clone)]
pub struct TypeScriptResolver {
    raw_suffix: String,
}

impl TypeScriptResolver {
    pub fn new(naming: &NamingConfig) -> Self {
        Self {
            raw_suffix: naming.raw_function_suffix.clone(),
        }
    }

    fn resolve_in_class(
        &self,
        class: &CandidateClass,
        operation: &ApiOperation,
    ) -> Option<CandidateSymbol> {
        let raw_name = format!("{}{}", operation.operation_id, self.raw_suffix);
        let raw = class.methods_named(&raw_name).next()?;
        let text = raw.raw_text.as_deref().unwrap_or_default();

        let path = RAW_PATH.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str());
        let method = RAW_METHOD.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str());
        let path_ok = path == Some(operation.path.as_str()) || !operation.path.starts_with('/');
        let method_ok = method.is_some_and(|m| m.eq_ignore_ascii_case(operation.method.as_str()));
        if !(path_ok && method_ok) {
            log::debug!("{raw_name} in {} routes elsewhere", class.qualified_name);
            return None;
        }

        Some(
            class
                .methods_named(&operation.operation_id)
                .next()
                .unwrap_or(raw)
                .clone(),
        )
    }
}

impl ImplementationResolver for TypeScriptResolver {
    fn name(&self) -> &'static str {
        "typescript"
    }

    fn resolve_implementation(
        &self,
        ctx: &ResolveContext<'_>,
        operation: &ApiOperation,
    ) -> Vec<CandidateSymbol> {
        ctx.symbols
            .files_for_operation(&operation.operation_id)
            .iter()
            .filter(|file| file.extension().is_some_and(|e| e == "ts"))
            .filter_map(|file| {
                ctx.symbols
                    .classes_in_file(file)
                    .iter()
                    .find_map(|class| self.resolve_in_class(class, operation))
            })
            .collect()
    }
}

/// The enabled implementation resolvers, in configured order.
pub struct ImplementationResolvers {
    resolvers: Vec<Box<dyn ImplementationResolver>>,
}

impl ImplementationResolvers {
    /// Every known resolver name, in default order.
    pub const KNOWN: [&'static str; 3] = ["kotlin-spring", "spring-cloud", "typescript"];

    pub fn from_config(
        resolvers: &ResolversConfig,
        matcher: &MatcherConfig,
        naming: &NamingConfig,
    ) -> Result<Self, ConfigError> {
        let resolvers = resolvers
            .implementation
            .iter()
            .map(|name| build_resolver(name, matcher, naming))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { resolvers })
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.resolvers.iter().map(|r| r.name()).collect()
    }

    /// Results of every resolver, concatenated.
    pub fn resolve(&self, ctx: &ResolveContext<'_>, operation: &ApiOperation) -> Vec<CandidateSymbol> {
        self.resolvers
            .iter()
            .flat_map(|resolver| {
                let found = resolver.resolve_implementation(ctx, operation);
                log::debug!(
                    "{} found {} candidates for {}",
                    resolver.name(),
                    found.len(),
                    operation.operation_id
                );
                found
            })
            .collect()
    }
}

fn build_resolver(
    name: &str,
    matcher: &MatcherConfig,
    naming: &NamingConfig,
) -> Result<Box<dyn ImplementationResolver>, ConfigError> {
    let operation_matcher = || OperationMatcher::new(matcher.clone());
    match name {
        "kotlin-spring" => Ok(Box::new(KotlinSpringResolver::new(operation_matcher()))),
        "spring-cloud" => Ok(Box::new(SpringCloudResolver::new(operation_matcher()))),
        "typescript" => Ok(Box::new(TypeScriptResolver::new(naming))),
        other => Err(ConfigError::UnknownResolver(other.to_string())),
    }
}
